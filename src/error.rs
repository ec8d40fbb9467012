use std::time::Duration;

use thiserror::Error;

use crate::{
    auth::AuthError,
    protocol::{FrameError, MAX_IN_FLIGHT, MuxError, ProtocolError, ServerError},
    transport::TransportError,
    value::ValueError,
};

/// Everything a session call can fail with.
///
/// [`Error::Transport`] and [`Error::Auth`] end the session. The others affect only the call
/// that returned them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("too many calls in flight (limit {MAX_IN_FLIGHT})")]
    Overloaded,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("invalid value: {0}")]
    Value(#[from] ValueError),
}

impl Error {
    /// True when the session that produced this error can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Auth(_))
    }
}

impl From<MuxError> for Error {
    fn from(err: MuxError) -> Self {
        match err {
            MuxError::Timeout(after) => Error::Timeout(after),
            MuxError::Overloaded => Error::Overloaded,
            MuxError::Closed(reason) => Error::Transport(TransportError::Closed(reason)),
        }
    }
}

impl From<FrameError> for Error {
    fn from(err: FrameError) -> Self {
        Error::Transport(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_errors_map_onto_call_errors() {
        let timeout = Duration::from_millis(250);
        assert!(matches!(
            Error::from(MuxError::Timeout(timeout)),
            Error::Timeout(t) if t == timeout
        ));
        assert!(matches!(Error::from(MuxError::Overloaded), Error::Overloaded));

        let closed = Error::from(MuxError::Closed("connection closed by server".into()));
        assert!(closed.is_fatal());
        assert_eq!(
            closed.to_string(),
            "session closed: connection closed by server"
        );
    }

    #[test]
    fn server_errors_leave_session_usable() {
        let err = Error::from(ServerError {
            system: "table_not_found".into(),
            ..Default::default()
        });
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "server error: system: table_not_found");
    }
}
