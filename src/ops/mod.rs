//! Typed calls on a [`Session`](crate::Session).
//!
//! Every apollo procedure has a method on `Session` that builds the procedure, runs it
//! through the transaction runner and converts the reply into the shape the procedure
//! promises. A reply of any other shape is a [`ProtocolError`](crate::protocol::ProtocolError).
//!
//! # Key Components
//!
//! - table administration: `create_table`, `delete_table`, `open_table`, `close_table`,
//!   `table_info`, `list_tables`;
//! - rows: `write`, `read`, `update`, `delete`, `read_range`, `read_range_n`;
//! - iteration: `first`, `last`, `seek`, `next`, `prev`;
//! - full-text indexing: `add_index`, `remove_index`, `index_read`.
mod data;
mod index;
pub mod options;
pub mod results;
mod table;

pub use options::{
    CharFilter, Comparator, DataModel, HashingMethod, IndexConfig, IndexOptions, PostingFilter,
    SizeMargin, SortBy, StorageType, TableOption, Tda, TimeMargin, TimeUnit, TokenFilter,
    TokenStats, TokenTransform, Tokenizer, UpdateInstruction, UpdateOperation, Wrapper,
};
pub use results::{Cursor, KeyColumns, KeyColumnsList, Posting};
