//! Connection handshake.
//!
//! A fresh connection must authenticate before the multiplexer takes it over. Handshake
//! messages travel in pre-auth frames (`u32 length | payload`) on the same stream that will
//! carry post-auth frames afterwards.
use std::{
    fmt,
    io::{Read, Write},
};

use thiserror::Error;

use crate::protocol::FrameError;

pub mod scram;

pub use scram::{Mechanism, Scram};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("server rejected credentials: {0}")]
    Rejected(String),
    #[error("malformed handshake message: {0}")]
    Malformed(String),
    #[error("server nonce does not extend the client nonce")]
    NonceMismatch,
    #[error("server signature does not match")]
    ServerSignature,
    #[error("handshake transport failure: {0}")]
    Frame(#[from] FrameError),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runs the pre-auth exchange on a freshly connected stream.
pub trait Authenticator {
    fn authenticate<S: Read + Write>(
        &self,
        stream: &mut S,
        credentials: &Credentials,
    ) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("admin", "s3cret");
        let shown = format!("{creds:?}");
        assert!(shown.contains("admin"));
        assert!(!shown.contains("s3cret"));
    }
}
