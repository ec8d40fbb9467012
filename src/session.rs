//! Session lifecycle.
//!
//! A [`Session`] is one authenticated connection plus the threads that multiplex it. It is
//! `Send + Sync`: share it between threads by reference or behind an `Arc`, and every call
//! made through it travels over the same socket.
use std::time::Duration;

use log::info;

use crate::{
    auth::{Authenticator, Credentials, Scram},
    config::SessionConfig,
    error::Error,
    protocol::{Multiplexer, Reply, TransactionRunner, apollo::apollo_pdu::Procedure},
    transport::{Connection, TlsStream, connect_tcp, server_name, tls},
};

pub struct Session {
    runner: TransactionRunner,
    peer: String,
}

impl Session {
    /// Connect over TLS and authenticate with the default configuration.
    pub fn connect(address: &str, username: &str, password: &str) -> Result<Self, Error> {
        Self::connect_with(
            address,
            &Credentials::new(username, password),
            SessionConfig::default(),
        )
    }

    pub fn connect_with(
        address: &str,
        credentials: &Credentials,
        config: SessionConfig,
    ) -> Result<Self, Error> {
        let sock = connect_tcp(address)?;
        let client_config = tls::client_config(&config.tls)?;
        let stream = TlsStream::connect(sock, server_name(address), client_config)?;

        let authenticator = Scram::new(config.mechanism);
        let session = Self::establish(stream, credentials, &authenticator, config)?;
        info!("connected to {address} as '{}'", credentials.username);
        Ok(session)
    }

    /// Like [`Session::connect_with`] but without TLS, for servers behind a trusted link.
    pub fn connect_plain(
        address: &str,
        credentials: &Credentials,
        config: SessionConfig,
    ) -> Result<Self, Error> {
        let sock = connect_tcp(address)?;
        let authenticator = Scram::new(config.mechanism);
        let session = Self::establish(sock, credentials, &authenticator, config)?;
        info!("connected to {address} (plaintext) as '{}'", credentials.username);
        Ok(session)
    }

    /// Authenticate `conn` and hand it to a new multiplexer.
    ///
    /// On a failed handshake the connection is dropped, which closes it.
    pub fn establish<C, A>(
        mut conn: C,
        credentials: &Credentials,
        authenticator: &A,
        config: SessionConfig,
    ) -> Result<Self, Error>
    where
        C: Connection,
        A: Authenticator,
    {
        authenticator.authenticate(&mut conn, credentials)?;
        Self::open(conn, &config)
    }

    /// Start a session over a connection that is already authenticated.
    pub fn open<C: Connection>(conn: C, config: &SessionConfig) -> Result<Self, Error> {
        let peer = conn
            .peer_addr()
            .map_or_else(|_| "server".to_string(), |addr| addr.to_string());
        let mux = Multiplexer::open(conn, config)?;
        Ok(Self {
            runner: TransactionRunner::new(mux),
            peer,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Run one procedure with the session's default call timeout.
    pub fn call(&self, procedure: Procedure) -> Result<Reply, Error> {
        self.runner.call(procedure)
    }

    pub fn call_with_timeout(&self, procedure: Procedure, timeout: Duration) -> Result<Reply, Error> {
        self.runner.call_with_timeout(procedure, timeout)
    }

    /// Send a raw envelope and wait for the raw response.
    pub fn submit(&self, payload: Vec<u8>) -> Result<Vec<u8>, Error> {
        Ok(self.runner.multiplexer().submit(payload)?)
    }

    pub fn submit_with_timeout(&self, payload: Vec<u8>, timeout: Duration) -> Result<Vec<u8>, Error> {
        Ok(self.runner.multiplexer().submit_with_timeout(payload, timeout)?)
    }

    pub fn is_closed(&self) -> bool {
        self.runner.multiplexer().is_closed()
    }

    /// Begin teardown without waiting. Pending calls fail with a transport error.
    pub fn shutdown(&self) {
        self.runner.multiplexer().shutdown();
    }

    /// Tear down and wait for the background threads to exit.
    pub fn close(&self) {
        self.runner.multiplexer().close();
        info!("disconnected from {}", self.peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn session_is_shareable() {
        assert_send_sync::<Session>();
    }
}
