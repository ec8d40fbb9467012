//! Client for the Pundun structured-storage server.
//!
//! One [`Session`] holds one TLS connection. Any number of threads may issue calls through
//! it at once; the calls are interleaved on the connection and each caller gets back
//! exactly its own reply, a timeout or a transport error.
//!
//! ```no_run
//! use pundun::{Session, fields};
//!
//! let session = Session::connect("127.0.0.1:8887", "admin", "admin")?;
//! session.write("users", fields! { "id" => 1 }, fields! { "name" => "bob" })?;
//! let columns = session.read("users", fields! { "id" => 1 })?;
//! # Ok::<(), pundun::Error>(())
//! ```
pub mod auth;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod ops;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod value;

pub use auth::{AuthError, Authenticator, Credentials, Mechanism, Scram};
pub use cli::{CliError, execute, prompt};
pub use command::{Command, CommandError};
pub use config::SessionConfig;
pub use error::Error;
pub use ops::*;
pub use protocol::{ProtocolError, Reply, ServerError};
pub use session::Session;
pub use transport::{TlsVerification, TransportError};
pub use value::{Fields, Value, ValueError};
