//! SCRAM client (RFC 5802), without channel binding.
//!
//! ```text
//! client-first  n,,n=<user>,r=<client nonce>
//! server-first  r=<client nonce><server nonce>,s=<salt>,i=<iterations>
//! client-final  c=biws,r=<nonce>,p=<proof>
//! server-final  v=<server signature>
//! ```
//!
//! Either server message may instead be `e=<reason>`, which ends the handshake.
use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Mac, SimpleHmac, digest::core_api::BlockSizeUser};
use log::debug;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::{
    config::DEFAULT_MAX_FRAME_BYTES,
    protocol::frame::{read_preauth, write_preauth},
};

use super::{AuthError, Authenticator, Credentials};

const NONCE_BYTES: usize = 24;
const GS2_HEADER: &str = "n,,";
/// `GS2_HEADER` in base64, sent back in the client-final message.
const CHANNEL_BINDING: &str = "biws";
/// Highest iteration count accepted from a server.
pub const MAX_ITERATIONS: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mechanism {
    #[default]
    Sha1,
    Sha256,
}

#[derive(Debug, Clone)]
pub struct Scram {
    mechanism: Mechanism,
    nonce: Option<String>,
}

impl Scram {
    pub fn new(mechanism: Mechanism) -> Self {
        Self {
            mechanism,
            nonce: None,
        }
    }

    #[cfg(test)]
    fn with_nonce(mechanism: Mechanism, nonce: &str) -> Self {
        Self {
            mechanism,
            nonce: Some(nonce.to_string()),
        }
    }

    fn client_nonce(&self) -> String {
        match &self.nonce {
            Some(nonce) => nonce.clone(),
            None => {
                let mut bytes = [0u8; NONCE_BYTES];
                rand::thread_rng().fill_bytes(&mut bytes);
                BASE64.encode(bytes)
            }
        }
    }

    fn exchange<D, S>(&self, stream: &mut S, credentials: &Credentials) -> Result<(), AuthError>
    where
        D: Digest + BlockSizeUser + Clone + Sync,
        S: Read + Write,
    {
        let client_nonce = self.client_nonce();
        let client_first_bare = format!("n={},r={client_nonce}", escape_username(&credentials.username));
        write_preauth(stream, format!("{GS2_HEADER}{client_first_bare}").as_bytes())?;

        let server_first = read_message(stream)?;
        let challenge = ServerFirst::parse(&server_first)?;
        if !challenge.nonce.starts_with(&client_nonce) || challenge.nonce.len() == client_nonce.len() {
            return Err(AuthError::NonceMismatch);
        }

        let salted = hi::<D>(
            credentials.password.as_bytes(),
            &challenge.salt,
            challenge.iterations,
        )?;
        let client_final_bare = format!("c={CHANNEL_BINDING},r={}", challenge.nonce);
        let auth_message = format!("{client_first_bare},{server_first},{client_final_bare}");

        let client_key = hmac::<D>(&salted, b"Client Key")?;
        let stored_key = D::digest(&client_key);
        let client_signature = hmac::<D>(&stored_key, auth_message.as_bytes())?;
        let proof: Vec<u8> = client_key
            .iter()
            .zip(&client_signature)
            .map(|(k, s)| k ^ s)
            .collect();

        let client_final = format!("{client_final_bare},p={}", BASE64.encode(proof));
        write_preauth(stream, client_final.as_bytes())?;

        let server_final = read_message(stream)?;
        let verifier = attribute(&server_final, 'v')
            .ok_or_else(|| AuthError::Malformed(format!("server-final '{server_final}'")))?;
        let received = BASE64
            .decode(verifier)
            .map_err(|e| AuthError::Malformed(format!("server signature: {e}")))?;

        let server_key = hmac::<D>(&salted, b"Server Key")?;
        let expected = hmac::<D>(&server_key, auth_message.as_bytes())?;
        if received != expected {
            return Err(AuthError::ServerSignature);
        }

        debug!(
            "authenticated as '{}' with {:?}",
            credentials.username, self.mechanism
        );
        Ok(())
    }
}

impl Default for Scram {
    fn default() -> Self {
        Self::new(Mechanism::default())
    }
}

impl Authenticator for Scram {
    fn authenticate<S: Read + Write>(
        &self,
        stream: &mut S,
        credentials: &Credentials,
    ) -> Result<(), AuthError> {
        match self.mechanism {
            Mechanism::Sha1 => self.exchange::<Sha1, S>(stream, credentials),
            Mechanism::Sha256 => self.exchange::<Sha256, S>(stream, credentials),
        }
    }
}

/// Read one server message; `e=` messages become [`AuthError::Rejected`].
fn read_message<S: Read>(stream: &mut S) -> Result<String, AuthError> {
    let payload = read_preauth(stream, DEFAULT_MAX_FRAME_BYTES)?;
    let message = String::from_utf8(payload)
        .map_err(|_| AuthError::Malformed("server message is not utf-8".into()))?;
    match attribute(&message, 'e') {
        Some(reason) => Err(AuthError::Rejected(reason.to_string())),
        None => Ok(message),
    }
}

struct ServerFirst {
    nonce: String,
    salt: Vec<u8>,
    iterations: u32,
}

impl ServerFirst {
    fn parse(message: &str) -> Result<Self, AuthError> {
        let missing = |name: char| AuthError::Malformed(format!("server-first lacks '{name}': '{message}'"));

        let nonce = attribute(message, 'r').ok_or_else(|| missing('r'))?;
        let salt = attribute(message, 's').ok_or_else(|| missing('s'))?;
        let iterations = attribute(message, 'i').ok_or_else(|| missing('i'))?;

        let salt = BASE64
            .decode(salt)
            .map_err(|e| AuthError::Malformed(format!("salt: {e}")))?;
        let iterations = iterations
            .parse::<u32>()
            .ok()
            .filter(|i| (1..=MAX_ITERATIONS).contains(i))
            .ok_or_else(|| AuthError::Malformed(format!("iteration count '{iterations}'")))?;

        Ok(Self {
            nonce: nonce.to_string(),
            salt,
            iterations,
        })
    }
}

/// Value of the `name=` attribute in a comma separated SCRAM message.
fn attribute(message: &str, name: char) -> Option<&str> {
    message.split(',').find_map(|part| {
        let mut chars = part.chars();
        (chars.next() == Some(name) && chars.next() == Some('=')).then(|| &part[2..])
    })
}

fn escape_username(username: &str) -> String {
    username.replace('=', "=3D").replace(',', "=2C")
}

fn hmac<D: Digest + BlockSizeUser>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key)
        .map_err(|e| AuthError::Malformed(format!("hmac key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// PBKDF2 with HMAC over `D`, one output block.
fn hi<D>(password: &[u8], salt: &[u8], iterations: u32) -> Result<Vec<u8>, AuthError>
where
    D: Digest + BlockSizeUser + Clone + Sync,
{
    let mut out = vec![0u8; <D as Digest>::output_size()];
    pbkdf2::<SimpleHmac<D>>(password, salt, iterations, &mut out)
        .map_err(|e| AuthError::Malformed(format!("pbkdf2: {e}")))?;
    Ok(out)
}
