//! Byte streams the multiplexer can run over.
//!
//! The multiplexer needs to read and write the same connection from two threads, so a
//! [`Connection`] must be able to split itself into an independent read half and write half.
//! Plain TCP does this by cloning the socket; TLS shares one `rustls` engine between the
//! halves (see [`tls`]).
use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
};

use log::debug;
use thiserror::Error;

use crate::protocol::FrameError;

pub mod tls;

pub use tls::{TlsStream, TlsVerification};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    Io(#[from] io::Error),
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("invalid server name '{0}'")]
    InvalidServerName(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("session closed: {0}")]
    Closed(String),
}

/// A bidirectional stream that can be split for concurrent reading and writing.
pub trait Connection: Read + Write + Send + 'static {
    type ReadHalf: Read + Send + 'static;
    type WriteHalf: WriteHalf;

    fn split(self) -> io::Result<(Self::ReadHalf, Self::WriteHalf)>;

    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

pub trait WriteHalf: Write + Send + 'static {
    /// Close the connection in both directions, waking a reader blocked on the other half.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Connection for TcpStream {
    type ReadHalf = TcpStream;
    type WriteHalf = TcpStream;

    fn split(self) -> io::Result<(TcpStream, TcpStream)> {
        let reader = self.try_clone()?;
        Ok((reader, self))
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

impl WriteHalf for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        match TcpStream::shutdown(self, Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            res => res,
        }
    }
}

/// Open a TCP connection with Nagle disabled; calls are small and latency bound.
pub fn connect_tcp<A: ToSocketAddrs>(address: A) -> Result<TcpStream, TransportError> {
    let stream = TcpStream::connect(address)?;
    stream.set_nodelay(true)?;
    debug!("tcp connection established to {:?}", stream.peer_addr().ok());
    Ok(stream)
}

/// Host part of a `host:port` address, used as the TLS server name.
pub fn server_name(address: &str) -> &str {
    let host = match address.rsplit_once(':') {
        Some((host, port)) if !port.contains(']') => host,
        _ => address,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

#[cfg(test)]
mod tests {
    use std::{io::Read, net::TcpListener, thread};

    use super::*;

    #[test]
    fn server_name_strips_port() {
        assert_eq!(server_name("db.example.com:8887"), "db.example.com");
        assert_eq!(server_name("127.0.0.1:8887"), "127.0.0.1");
        assert_eq!(server_name("[::1]:8887"), "::1");
        assert_eq!(server_name("localhost"), "localhost");
    }

    #[test]
    fn tcp_shutdown_wakes_reader() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || listener.accept().unwrap().0);

        let stream = connect_tcp(addr).unwrap();
        let _peer = server.join().unwrap();
        let (mut reader, mut writer) = stream.split().unwrap();

        let blocked = thread::spawn(move || {
            let mut buf = [0u8; 8];
            reader.read(&mut buf)
        });
        WriteHalf::shutdown(&mut writer).unwrap();

        assert_eq!(blocked.join().unwrap().unwrap(), 0);
    }
}
