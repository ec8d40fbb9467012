//! Transaction runner.
//!
//! Wraps a procedure in a versioned envelope with a fresh transaction id, sends it through
//! the [`Multiplexer`] and turns what comes back into a [`Reply`] or an [`Error`].
use std::{fmt, time::Duration};

use log::{trace, warn};
use prost::Message;

use crate::{
    error::Error,
    ops::{Cursor, KeyColumns, KeyColumnsList, Posting},
    value::{Fields, decode_fields},
};

use super::{
    apollo::{self, ApolloPdu, Version, apollo_pdu::Procedure, response},
    mux::Multiplexer,
    tid::TransactionIdSource,
};

pub const PROTOCOL_MAJOR: u32 = 0;
pub const PROTOCOL_MINOR: u32 = 1;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("undecodable response envelope: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("response envelope carries no procedure")]
    EmptyEnvelope,
    #[error("response carries no result")]
    EmptyResponse,
    #[error("server returned an error with no details")]
    EmptyError,
    #[error("unexpected procedure '{0}' in response envelope")]
    UnexpectedProcedure(&'static str),
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },
}

/// Error reported by the server, split by the layer that raised it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerError {
    pub transport: String,
    pub protocol: String,
    pub system: String,
    pub misc: String,
}

impl ServerError {
    /// `None` when every part is empty: such a message is not an error report.
    pub fn from_wire(error: apollo::Error) -> Option<Self> {
        let error = Self {
            transport: error.transport,
            protocol: error.protocol,
            system: error.system,
            misc: error.misc,
        };
        (!error.message().is_empty()).then_some(error)
    }

    /// Non-empty parts as `layer: text`, joined by single spaces.
    pub fn message(&self) -> String {
        [
            ("transport", &self.transport),
            ("protocol", &self.protocol),
            ("system", &self.system),
            ("misc", &self.misc),
        ]
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(layer, text)| format!("{layer}: {text}"))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ServerError {}

/// Successful result of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(String),
    Columns(Fields),
    KeyColumns(KeyColumns),
    KeyColumnsList(KeyColumnsList),
    Proplist(Fields),
    Cursor(Cursor),
    Postings(Vec<Posting>),
    StringList(Vec<String>),
}

impl From<response::Reply> for Reply {
    fn from(reply: response::Reply) -> Self {
        match reply {
            response::Reply::Ok(ok) => Reply::Ok(ok),
            response::Reply::Columns(columns) => Reply::Columns(decode_fields(columns.fields)),
            response::Reply::KeyColumnsPair(pair) => Reply::KeyColumns(pair.into()),
            response::Reply::KeyColumnsList(list) => Reply::KeyColumnsList(list.into()),
            response::Reply::Proplist(props) => Reply::Proplist(decode_fields(props.fields)),
            response::Reply::KcpIt(kcp_it) => Reply::Cursor(kcp_it.into()),
            response::Reply::Postings(postings) => {
                Reply::Postings(postings.list.into_iter().map(Posting::from).collect())
            }
            response::Reply::StringList(names) => Reply::StringList(names.field_names),
        }
    }
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Ok(_) => "ok",
            Reply::Columns(_) => "columns",
            Reply::KeyColumns(_) => "key columns pair",
            Reply::KeyColumnsList(_) => "key columns list",
            Reply::Proplist(_) => "property list",
            Reply::Cursor(_) => "key columns iterator",
            Reply::Postings(_) => "postings",
            Reply::StringList(_) => "string list",
        }
    }

    fn unexpected(&self, expected: &'static str) -> ProtocolError {
        ProtocolError::UnexpectedReply {
            expected,
            got: self.kind(),
        }
    }

    pub fn into_ok(self) -> Result<(), ProtocolError> {
        match self {
            Reply::Ok(_) => Ok(()),
            other => Err(other.unexpected("ok")),
        }
    }

    pub fn into_columns(self) -> Result<Fields, ProtocolError> {
        match self {
            Reply::Columns(columns) => Ok(columns),
            other => Err(other.unexpected("columns")),
        }
    }

    pub fn into_proplist(self) -> Result<Fields, ProtocolError> {
        match self {
            Reply::Proplist(props) => Ok(props),
            other => Err(other.unexpected("property list")),
        }
    }

    pub fn into_key_columns_list(self) -> Result<KeyColumnsList, ProtocolError> {
        match self {
            Reply::KeyColumnsList(list) => Ok(list),
            other => Err(other.unexpected("key columns list")),
        }
    }

    pub fn into_cursor(self) -> Result<Cursor, ProtocolError> {
        match self {
            Reply::Cursor(cursor) => Ok(cursor),
            other => Err(other.unexpected("key columns iterator")),
        }
    }

    pub fn into_postings(self) -> Result<Vec<Posting>, ProtocolError> {
        match self {
            Reply::Postings(postings) => Ok(postings),
            other => Err(other.unexpected("postings")),
        }
    }

    pub fn into_string_list(self) -> Result<Vec<String>, ProtocolError> {
        match self {
            Reply::StringList(list) => Ok(list),
            other => Err(other.unexpected("string list")),
        }
    }
}

fn procedure_name(procedure: &Procedure) -> &'static str {
    match procedure {
        Procedure::CreateTable(_) => "create_table",
        Procedure::DeleteTable(_) => "delete_table",
        Procedure::OpenTable(_) => "open_table",
        Procedure::CloseTable(_) => "close_table",
        Procedure::TableInfo(_) => "table_info",
        Procedure::Write(_) => "write",
        Procedure::Delete(_) => "delete",
        Procedure::Read(_) => "read",
        Procedure::ReadRange(_) => "read_range",
        Procedure::ReadRangeN(_) => "read_range_n",
        Procedure::First(_) => "first",
        Procedure::Last(_) => "last",
        Procedure::Seek(_) => "seek",
        Procedure::Next(_) => "next",
        Procedure::Prev(_) => "prev",
        Procedure::Update(_) => "update",
        Procedure::AddIndex(_) => "add_index",
        Procedure::RemoveIndex(_) => "remove_index",
        Procedure::IndexRead(_) => "index_read",
        Procedure::ListTables(_) => "list_tables",
        Procedure::Response(_) => "response",
        Procedure::Error(_) => "error",
    }
}

/// Serialize `procedure` into a version 0.1 envelope.
pub fn encode_call(transaction_id: u32, procedure: Procedure) -> Vec<u8> {
    ApolloPdu {
        version: Some(Version {
            major: PROTOCOL_MAJOR,
            minor: PROTOCOL_MINOR,
        }),
        transaction_id,
        procedure: Some(procedure),
    }
    .encode_to_vec()
}

/// Interpret the envelope the server sent back for `transaction_id`.
pub fn decode_reply(transaction_id: u32, bytes: &[u8]) -> Result<Reply, Error> {
    let pdu = ApolloPdu::decode(bytes).map_err(ProtocolError::from)?;
    if pdu.transaction_id != transaction_id {
        warn!(
            "response transaction id {} does not match call {transaction_id}",
            pdu.transaction_id
        );
    }

    match pdu.procedure {
        Some(Procedure::Response(apollo::Response {
            result: Some(reply),
        })) => Ok(reply.into()),
        Some(Procedure::Response(_)) => Err(ProtocolError::EmptyResponse.into()),
        Some(Procedure::Error(error)) => match ServerError::from_wire(error) {
            Some(error) => Err(Error::Server(error)),
            None => Err(ProtocolError::EmptyError.into()),
        },
        Some(other) => Err(ProtocolError::UnexpectedProcedure(procedure_name(&other)).into()),
        None => Err(ProtocolError::EmptyEnvelope.into()),
    }
}

/// Drives procedures through one multiplexer, numbering them from its own id source.
pub struct TransactionRunner {
    mux: Multiplexer,
    tids: TransactionIdSource,
}

impl TransactionRunner {
    pub fn new(mux: Multiplexer) -> Self {
        Self {
            mux,
            tids: TransactionIdSource::new(),
        }
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    pub fn call(&self, procedure: Procedure) -> Result<Reply, Error> {
        self.run(procedure, None)
    }

    pub fn call_with_timeout(&self, procedure: Procedure, timeout: Duration) -> Result<Reply, Error> {
        self.run(procedure, Some(timeout))
    }

    fn run(&self, procedure: Procedure, timeout: Option<Duration>) -> Result<Reply, Error> {
        let tid = self.tids.next();
        trace!("tid={tid} {}", procedure_name(&procedure));
        let payload = encode_call(tid, procedure);

        let response = match timeout {
            Some(timeout) => self.mux.submit_with_timeout(payload, timeout)?,
            None => self.mux.submit(payload)?,
        };
        decode_reply(tid, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fields, value::encode_fields};

    fn response_pdu(tid: u32, procedure: Procedure) -> Vec<u8> {
        ApolloPdu {
            version: Some(Version { major: 0, minor: 1 }),
            transaction_id: tid,
            procedure: Some(procedure),
        }
        .encode_to_vec()
    }

    fn reply_pdu(tid: u32, reply: response::Reply) -> Vec<u8> {
        response_pdu(
            tid,
            Procedure::Response(apollo::Response {
                result: Some(reply),
            }),
        )
    }

    #[test]
    fn envelope_carries_version_and_tid() {
        let bytes = encode_call(
            7,
            Procedure::OpenTable(apollo::OpenTable {
                table_name: "subscribers".into(),
            }),
        );
        let pdu = ApolloPdu::decode(bytes.as_slice()).unwrap();
        assert_eq!(pdu.version, Some(Version { major: 0, minor: 1 }));
        assert_eq!(pdu.transaction_id, 7);
        assert!(matches!(
            pdu.procedure,
            Some(Procedure::OpenTable(ref open)) if open.table_name == "subscribers"
        ));
    }

    #[test]
    fn decodes_columns() {
        let bytes = reply_pdu(
            3,
            response::Reply::Columns(apollo::Fields {
                fields: encode_fields(fields! { "name" => "bob", "age" => 42 }),
            }),
        );
        let columns = decode_reply(3, &bytes).unwrap().into_columns().unwrap();
        assert_eq!(columns, fields! { "name" => "bob", "age" => 42 });
    }

    #[test]
    fn wrong_reply_shape_is_protocol_error() {
        let bytes = reply_pdu(1, response::Reply::Ok("ok".into()));
        let err = decode_reply(1, &bytes).unwrap().into_columns().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedReply {
                expected: "columns",
                got: "ok"
            }
        );
    }

    #[test]
    fn server_error_parts_are_joined() {
        let bytes = response_pdu(
            1,
            Procedure::Error(apollo::Error {
                transport: String::new(),
                protocol: "bad pdu".into(),
                system: "no_table".into(),
                misc: String::new(),
            }),
        );
        match decode_reply(1, &bytes) {
            Err(Error::Server(err)) => {
                assert_eq!(err.to_string(), "protocol: bad pdu system: no_table");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn empty_server_error_is_protocol_error() {
        let bytes = response_pdu(1, Procedure::Error(apollo::Error::default()));
        assert!(matches!(
            decode_reply(1, &bytes),
            Err(Error::Protocol(ProtocolError::EmptyError))
        ));
    }

    #[test]
    fn garbage_is_protocol_error() {
        assert!(matches!(
            decode_reply(1, &[0xff, 0xff, 0xff]),
            Err(Error::Protocol(ProtocolError::Decode(_)))
        ));
    }

    #[test]
    fn request_echoed_back_is_unexpected() {
        let bytes = response_pdu(1, Procedure::ListTables(apollo::ListTables {}));
        assert!(matches!(
            decode_reply(1, &bytes),
            Err(Error::Protocol(ProtocolError::UnexpectedProcedure("list_tables")))
        ));
    }

    #[test]
    fn mismatched_tid_still_decodes() {
        let bytes = reply_pdu(
            9,
            response::Reply::StringList(apollo::FieldNames {
                field_names: vec!["a".into(), "b".into()],
            }),
        );
        let tables = decode_reply(2, &bytes).unwrap().into_string_list().unwrap();
        assert_eq!(tables, vec!["a".to_string(), "b".to_string()]);
    }
}
