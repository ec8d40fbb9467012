mod common;

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use common::FakeServer;
use pundun::{Error, TransportError, fields};

#[test]
fn concurrent_calls_over_tls() {
    let server = FakeServer::start_tls();
    let session = Arc::new(server.tls_session());

    let workers = (0..8)
        .map(|worker| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for i in 0..20 {
                    let key = fields! { "worker" => worker, "i" => i };
                    let columns = fields! { "payload" => "x".repeat(64 * (i as usize + 1)) };
                    session.write("secure", key.clone(), columns.clone()).unwrap();
                    assert_eq!(session.read("secure", key).unwrap(), columns);
                }
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(server.row_count("secure"), 8 * 20);
    assert_eq!(session.list_tables().unwrap(), vec!["secure"]);
}

#[test]
fn close_wakes_blocked_tls_reader() {
    let server = FakeServer::start_tls();
    let session = server.tls_session();
    session
        .write("t", fields! { "id" => 1 }, fields! { "v" => true })
        .unwrap();

    // The reader thread is now parked in a socket read with nothing left to arrive.
    thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    session.close();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(session.is_closed());

    let err = session.read("t", fields! { "id" => 1 }).unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Closed(_))), "got {err:?}");
}

#[test]
fn server_error_over_tls_keeps_session() {
    let server = FakeServer::start_tls();
    let session = server.tls_session();

    let err = session.read("missing", fields! { "id" => 1 }).unwrap_err();
    assert!(matches!(err, Error::Server(_)), "got {err:?}");
    assert!(!session.is_closed());
    assert!(session.list_tables().unwrap().is_empty());
}
