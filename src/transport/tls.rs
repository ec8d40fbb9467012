//! TLS over TCP with `rustls`.
//!
//! The handshake runs on a whole [`TlsStream`]. Once the session is authenticated the stream
//! is split: both halves share the `rustls` engine behind a lock, the read half owns its own
//! clone of the socket, and outbound records go through a second lock on the write socket.
//! Records are encrypted under the engine lock and handed to the socket lock before the
//! engine is released, so they reach the wire in sequence without holding the engine across
//! blocking I/O.
use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    sync::Arc,
};

use log::debug;
use parking_lot::{Mutex, MutexGuard};
use rustls::{
    ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme,
    StreamOwned,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature},
    pki_types::{CertificateDer, ServerName, UnixTime},
};

use super::{Connection, TransportError, WriteHalf};

const READ_CHUNK: usize = 16 * 1024;

/// How the server certificate is checked.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// Accept any certificate. Servers ship with self-signed certificates by default.
    #[default]
    AcceptAny,
    /// Verify the chain against these roots and the server name.
    Roots(Arc<RootCertStore>),
}

pub fn client_config(verification: &TlsVerification) -> Result<Arc<ClientConfig>, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let config = match verification {
        TlsVerification::AcceptAny => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth(),
        TlsVerification::Roots(roots) => builder
            .with_root_certificates(Arc::clone(roots))
            .with_no_client_auth(),
    };
    Ok(Arc::new(config))
}

/// Skips chain and name checks but still verifies handshake signatures.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// A client TLS stream that has completed its handshake.
pub struct TlsStream {
    inner: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsStream {
    pub fn connect(
        mut sock: TcpStream,
        server_name: &str,
        config: Arc<ClientConfig>,
    ) -> Result<Self, TransportError> {
        let name = ServerName::try_from(server_name.to_owned())
            .map_err(|_| TransportError::InvalidServerName(server_name.to_owned()))?;
        let mut conn = ClientConnection::new(config, name)?;

        while conn.is_handshaking() {
            conn.complete_io(&mut sock)?;
        }
        debug!(
            "tls handshake complete with {server_name}, version {:?}",
            conn.protocol_version()
        );

        Ok(Self {
            inner: StreamOwned::new(conn, sock),
        })
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct Shared {
    conn: Mutex<ClientConnection>,
    sock: Mutex<TcpStream>,
}

impl Shared {
    /// Drain pending records onto the socket, keeping record order.
    fn send_records(&self, mut conn: MutexGuard<'_, ClientConnection>) -> io::Result<()> {
        if !conn.wants_write() {
            return Ok(());
        }
        let mut records = Vec::new();
        while conn.wants_write() {
            conn.write_tls(&mut records)?;
        }
        let mut sock = self.sock.lock();
        drop(conn);
        sock.write_all(&records)?;
        sock.flush()
    }
}

impl Connection for TlsStream {
    type ReadHalf = TlsReadHalf;
    type WriteHalf = TlsWriteHalf;

    fn split(self) -> io::Result<(TlsReadHalf, TlsWriteHalf)> {
        let StreamOwned { conn, sock } = self.inner;
        let read_sock = sock.try_clone()?;
        let shared = Arc::new(Shared {
            conn: Mutex::new(conn),
            sock: Mutex::new(sock),
        });

        let reader = TlsReadHalf {
            shared: Arc::clone(&shared),
            sock: read_sock,
            scratch: vec![0u8; READ_CHUNK].into_boxed_slice(),
            pending: Vec::new(),
            eof: false,
        };
        Ok((reader, TlsWriteHalf { shared }))
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.sock.peer_addr()
    }
}

pub struct TlsReadHalf {
    shared: Arc<Shared>,
    sock: TcpStream,
    scratch: Box<[u8]>,
    /// Ciphertext read off the socket but not yet accepted by the engine.
    pending: Vec<u8>,
    eof: bool,
}

impl Read for TlsReadHalf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut conn = self.shared.conn.lock();
            match conn.reader().read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }
            if self.eof {
                return Ok(0);
            }

            if self.pending.is_empty() {
                drop(conn);
                let n = self.sock.read(&mut self.scratch)?;
                conn = self.shared.conn.lock();
                if n == 0 {
                    self.eof = true;
                    let mut empty: &[u8] = &[];
                    conn.read_tls(&mut empty)?;
                } else {
                    self.pending.extend_from_slice(&self.scratch[..n]);
                }
            }

            if !self.pending.is_empty() {
                let mut ciphertext = self.pending.as_slice();
                let before = ciphertext.len();
                conn.read_tls(&mut ciphertext)?;
                let used = before - ciphertext.len();
                self.pending.drain(..used);
            }

            conn.process_new_packets()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            // Alerts and key updates generated while reading.
            self.shared.send_records(conn)?;
        }
    }
}

pub struct TlsWriteHalf {
    shared: Arc<Shared>,
}

impl Write for TlsWriteHalf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut conn = self.shared.conn.lock();
        let n = conn.writer().write(buf)?;
        self.shared.send_records(conn)?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut conn = self.shared.conn.lock();
        conn.writer().flush()?;
        self.shared.send_records(conn)
    }
}

impl WriteHalf for TlsWriteHalf {
    fn shutdown(&mut self) -> io::Result<()> {
        let mut conn = self.shared.conn.lock();
        conn.send_close_notify();
        if let Err(e) = self.shared.send_records(conn) {
            debug!("failed to send close_notify: {e}");
        }
        match self.shared.sock.lock().shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            res => res,
        }
    }
}
