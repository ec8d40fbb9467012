//! Client side of the apollo protocol.
//!
//! This module covers everything between a caller's procedure and the bytes on the socket:
//! the envelope schema, framing, the multiplexer that shares one connection between many
//! callers, and the transaction runner that ties a call to its reply.
//!
//! # Overview
//!
//! A call passes through three layers, each with its own identifier:
//!
//! 1. the [`TransactionRunner`] stamps the envelope with a transaction id from the session's
//!    [`TransactionIdSource`] and serializes it with `prost`;
//! 2. the [`Multiplexer`] tags the serialized envelope with a 16-bit correlation id, writes
//!    it as one frame and parks the caller until the matching frame, the call's expiry or
//!    the end of the session;
//! 3. the runner decodes the response envelope into a [`Reply`], a [`ServerError`] or a
//!    [`ProtocolError`].
//!
//! Transaction ids belong to the envelope and are never used for routing. Correlation ids
//! belong to the frame and never reach the envelope.
//!
//! # Key Components
//!
//! - [`apollo`]: hand-declared `prost` messages for the envelope.
//! - [`frame`]: pre-auth and post-auth framing, headers encoded with `bincode`.
//! - [`Multiplexer`]: dispatcher and reader threads over a split [`Connection`](crate::transport::Connection).
//! - [`TransactionRunner`]: envelope in, typed reply out.
//!
//! # Binary Format
//!
//! - Pre-auth: `u32 length | payload`.
//! - Post-auth: `u32 length | u16 correlation id | payload`, with `length = 2 + payload`.
//! - All integers are big-endian.
pub mod apollo;
pub mod frame;
mod mux;
mod tid;
mod transaction;

pub use frame::{Frame, FrameError, FrameReader, FrameWriter};
pub use mux::{MAX_IN_FLIGHT, MuxError, Multiplexer};
pub use tid::TransactionIdSource;
pub use transaction::{
    PROTOCOL_MAJOR, PROTOCOL_MINOR, ProtocolError, Reply, ServerError, TransactionRunner,
    decode_reply, encode_call,
};
