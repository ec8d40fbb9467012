use std::time::Duration;

use crate::{auth::Mechanism, transport::TlsVerification};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_QUEUE: usize = 1024;
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Tunables for one session.
///
/// ```rust
/// use std::time::Duration;
/// use pundun::SessionConfig;
///
/// let config = SessionConfig::default().with_call_timeout(Duration::from_secs(5));
/// assert_eq!(config.call_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Default time a call may wait for its response.
    pub call_timeout: Duration,
    /// Submissions buffered ahead of the dispatcher before callers block.
    pub request_queue: usize,
    /// Inbound frames above this size end the session.
    pub max_frame_bytes: usize,
    pub tls: TlsVerification,
    pub mechanism: Mechanism,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            request_queue: DEFAULT_REQUEST_QUEUE,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            tls: TlsVerification::default(),
            mechanism: Mechanism::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_request_queue(mut self, depth: usize) -> Self {
        self.request_queue = depth.max(1);
        self
    }

    pub fn with_max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = bytes;
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_mechanism(mut self, mechanism: Mechanism) -> Self {
        self.mechanism = mechanism;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.request_queue, 1024);
        assert_eq!(config.max_frame_bytes, 64 * 1024 * 1024);
        assert_eq!(config.mechanism, Mechanism::Sha1);
        assert!(matches!(config.tls, TlsVerification::AcceptAny));
    }

    #[test]
    fn request_queue_never_zero() {
        let config = SessionConfig::default().with_request_queue(0);
        assert_eq!(config.request_queue, 1);
    }
}
