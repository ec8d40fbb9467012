use std::{
    io::Write,
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
    time::Duration,
};

use pundun::{
    SessionConfig,
    protocol::{
        Multiplexer, MuxError,
        frame::{FrameReader, encode_frame},
    },
};

/// Echoes each payload back, answering a batch of frames in reverse arrival order.
fn reversing_echo(batch: usize) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = FrameReader::new(stream, 1 << 20);
        let mut held = Vec::new();
        while let Ok(Some(frame)) = reader.read_frame() {
            held.push(frame);
            if held.len() == batch {
                for frame in held.drain(..).rev() {
                    let bytes = encode_frame(frame.correlation_id, &frame.payload).unwrap();
                    writer.write_all(&bytes).unwrap();
                }
            }
        }
    });
    addr
}

#[test]
fn out_of_order_responses_reach_their_callers() {
    let addr = reversing_echo(8);
    let sock = TcpStream::connect(addr).unwrap();
    let mux = Arc::new(Multiplexer::open(sock, &SessionConfig::default()).unwrap());

    let callers = (0..8u8)
        .map(|n| {
            let mux = Arc::clone(&mux);
            thread::spawn(move || {
                let payload = vec![n; usize::from(n) + 1];
                let reply = mux.submit(payload.clone()).unwrap();
                assert_eq!(reply, payload);
            })
        })
        .collect::<Vec<_>>();

    for caller in callers {
        caller.join().unwrap();
    }
    mux.close();
    assert!(mux.is_closed());
}

#[test]
fn lone_call_expires_when_batch_never_fills() {
    let addr = reversing_echo(2);
    let sock = TcpStream::connect(addr).unwrap();
    let mux = Multiplexer::open(sock, &SessionConfig::default()).unwrap();

    let err = mux
        .submit_with_timeout(b"alone".to_vec(), Duration::from_millis(50))
        .unwrap_err();
    assert_eq!(err, MuxError::Timeout(Duration::from_millis(50)));
    assert!(!mux.is_closed());
}

#[test]
fn unbounded_timeout_leaves_other_calls_alone() {
    let addr = reversing_echo(2);
    let sock = TcpStream::connect(addr).unwrap();
    let mux = Arc::new(Multiplexer::open(sock, &SessionConfig::default()).unwrap());

    let forever = {
        let mux = Arc::clone(&mux);
        thread::spawn(move || mux.submit_with_timeout(b"forever".to_vec(), Duration::MAX))
    };
    thread::sleep(Duration::from_millis(50));
    let normal = mux
        .submit_with_timeout(b"normal".to_vec(), Duration::from_secs(5))
        .unwrap();

    assert_eq!(normal, b"normal");
    assert_eq!(forever.join().unwrap().unwrap(), b"forever");
    assert!(!mux.is_closed());
}
