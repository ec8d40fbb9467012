//! Apollo envelope schema.
//!
//! Message and field layout of the protocol buffers envelope spoken by the server. Declared
//! by hand with `prost` derives so the crate needs no code generation step; keep tags in
//! sync with the server's `apollo.proto` when it changes.

use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Version {
    #[prost(uint32, tag = "1")]
    pub major: u32,
    #[prost(uint32, tag = "2")]
    pub minor: u32,
}

/// Top-level envelope carried by every post-auth frame, in both directions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApolloPdu {
    #[prost(message, optional, tag = "1")]
    pub version: Option<Version>,
    #[prost(uint32, tag = "2")]
    pub transaction_id: u32,
    #[prost(
        oneof = "apollo_pdu::Procedure",
        tags = "3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24"
    )]
    pub procedure: Option<apollo_pdu::Procedure>,
}

pub mod apollo_pdu {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Procedure {
        #[prost(message, tag = "3")]
        CreateTable(super::CreateTable),
        #[prost(message, tag = "4")]
        DeleteTable(super::DeleteTable),
        #[prost(message, tag = "5")]
        OpenTable(super::OpenTable),
        #[prost(message, tag = "6")]
        CloseTable(super::CloseTable),
        #[prost(message, tag = "7")]
        TableInfo(super::TableInfo),
        #[prost(message, tag = "8")]
        Write(super::Write),
        #[prost(message, tag = "9")]
        Delete(super::Delete),
        #[prost(message, tag = "10")]
        Read(super::Read),
        #[prost(message, tag = "11")]
        ReadRange(super::ReadRange),
        #[prost(message, tag = "12")]
        ReadRangeN(super::ReadRangeN),
        #[prost(message, tag = "13")]
        First(super::First),
        #[prost(message, tag = "14")]
        Last(super::Last),
        #[prost(message, tag = "15")]
        Seek(super::Seek),
        #[prost(message, tag = "16")]
        Next(super::Next),
        #[prost(message, tag = "17")]
        Prev(super::Prev),
        #[prost(message, tag = "18")]
        Update(super::Update),
        #[prost(message, tag = "19")]
        AddIndex(super::AddIndex),
        #[prost(message, tag = "20")]
        RemoveIndex(super::RemoveIndex),
        #[prost(message, tag = "21")]
        IndexRead(super::IndexRead),
        #[prost(message, tag = "22")]
        ListTables(super::ListTables),
        #[prost(message, tag = "23")]
        Response(super::Response),
        #[prost(message, tag = "24")]
        Error(super::Error),
    }
}

// Procedures

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTable {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(string, repeated, tag = "2")]
    pub keys: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub table_options: Vec<TableOption>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteTable {
    #[prost(string, tag = "1")]
    pub table_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenTable {
    #[prost(string, tag = "1")]
    pub table_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CloseTable {
    #[prost(string, tag = "1")]
    pub table_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableInfo {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(string, repeated, tag = "2")]
    pub attributes: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Write {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
    #[prost(message, repeated, tag = "3")]
    pub columns: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Delete {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Read {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadRange {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub start_key: Vec<Field>,
    #[prost(message, repeated, tag = "3")]
    pub end_key: Vec<Field>,
    #[prost(uint32, tag = "4")]
    pub limit: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadRangeN {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub start_key: Vec<Field>,
    #[prost(uint32, tag = "3")]
    pub n: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct First {
    #[prost(string, tag = "1")]
    pub table_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Last {
    #[prost(string, tag = "1")]
    pub table_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Seek {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Next {
    #[prost(bytes = "vec", tag = "1")]
    pub it: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Prev {
    #[prost(bytes = "vec", tag = "1")]
    pub it: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Update {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
    #[prost(message, repeated, tag = "3")]
    pub update_operation: Vec<UpdateOperation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddIndex {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(message, repeated, tag = "2")]
    pub config: Vec<IndexConfig>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoveIndex {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(string, repeated, tag = "2")]
    pub columns: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexRead {
    #[prost(string, tag = "1")]
    pub table_name: String,
    #[prost(string, tag = "2")]
    pub column_name: String,
    #[prost(string, tag = "3")]
    pub term: String,
    #[prost(message, optional, tag = "4")]
    pub filter: Option<PostingFilter>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListTables {}

// Replies

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(oneof = "response::Reply", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub result: Option<response::Reply>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Reply {
        #[prost(string, tag = "1")]
        Ok(String),
        #[prost(message, tag = "2")]
        Columns(super::Fields),
        #[prost(message, tag = "3")]
        KeyColumnsPair(super::KeyColumnsPair),
        #[prost(message, tag = "4")]
        KeyColumnsList(super::KeyColumnsList),
        #[prost(message, tag = "5")]
        Proplist(super::Fields),
        #[prost(message, tag = "6")]
        KcpIt(super::KcpIt),
        #[prost(message, tag = "7")]
        Postings(super::Postings),
        #[prost(message, tag = "8")]
        StringList(super::FieldNames),
    }
}

/// Structured server error; each part is optional.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(string, tag = "1")]
    pub transport: String,
    #[prost(string, tag = "2")]
    pub protocol: String,
    #[prost(string, tag = "3")]
    pub system: String,
    #[prost(string, tag = "4")]
    pub misc: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fields {
    #[prost(message, repeated, tag = "1")]
    pub fields: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldNames {
    #[prost(string, repeated, tag = "1")]
    pub field_names: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyColumnsPair {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Field>,
    #[prost(message, repeated, tag = "2")]
    pub columns: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyColumnsList {
    #[prost(message, repeated, tag = "1")]
    pub list: Vec<KeyColumnsPair>,
    #[prost(message, optional, tag = "2")]
    pub continuation: Option<ContinuationKey>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContinuationKey {
    #[prost(bool, tag = "1")]
    pub complete: bool,
    #[prost(message, repeated, tag = "2")]
    pub key: Vec<Field>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KcpIt {
    #[prost(message, optional, tag = "1")]
    pub key_columns_pair: Option<KeyColumnsPair>,
    #[prost(bytes = "vec", tag = "2")]
    pub it: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Posting {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Field>,
    #[prost(uint32, tag = "2")]
    pub timestamp: u32,
    #[prost(uint32, tag = "3")]
    pub frequency: u32,
    #[prost(uint32, tag = "4")]
    pub position: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Postings {
    #[prost(message, repeated, tag = "1")]
    pub list: Vec<Posting>,
}

// Values

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Field {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    #[prost(oneof = "value::Type", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub r#type: Option<value::Type>,
}

pub mod value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(int64, tag = "1")]
        Int(i64),
        #[prost(bool, tag = "2")]
        Boolean(bool),
        #[prost(bytes = "vec", tag = "3")]
        Binary(Vec<u8>),
        #[prost(bytes = "vec", tag = "4")]
        Null(Vec<u8>),
        #[prost(double, tag = "5")]
        Double(f64),
        #[prost(string, tag = "6")]
        String(String),
        #[prost(message, tag = "7")]
        List(super::ListValue),
        #[prost(message, tag = "8")]
        Map(super::MapValue),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListValue {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MapValue {
    #[prost(map = "string, message", tag = "1")]
    pub values: HashMap<String, Value>,
}

// Table options

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableOption {
    #[prost(oneof = "table_option::Opt", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub opt: Option<table_option::Opt>,
}

pub mod table_option {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Opt {
        #[prost(enumeration = "super::TableType", tag = "1")]
        Type(i32),
        #[prost(enumeration = "super::DataModel", tag = "2")]
        DataModel(i32),
        #[prost(message, tag = "3")]
        Wrapper(super::Wrapper),
        #[prost(enumeration = "super::Comparator", tag = "4")]
        Comparator(i32),
        #[prost(uint32, tag = "5")]
        NumOfShards(u32),
        #[prost(bool, tag = "6")]
        Distributed(bool),
        #[prost(enumeration = "super::HashingMethod", tag = "7")]
        HashingMethod(i32),
        #[prost(message, tag = "8")]
        Tda(super::Tda),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Wrapper {
    #[prost(uint32, tag = "1")]
    pub num_of_buckets: u32,
    #[prost(oneof = "wrapper::TimeMargin", tags = "2, 3, 4")]
    pub time_margin: Option<wrapper::TimeMargin>,
    #[prost(oneof = "wrapper::SizeMargin", tags = "5, 6")]
    pub size_margin: Option<wrapper::SizeMargin>,
}

pub mod wrapper {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum TimeMargin {
        #[prost(uint32, tag = "2")]
        Seconds(u32),
        #[prost(uint32, tag = "3")]
        Minutes(u32),
        #[prost(uint32, tag = "4")]
        Hours(u32),
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum SizeMargin {
        #[prost(uint32, tag = "5")]
        Megabytes(u32),
        #[prost(uint32, tag = "6")]
        Gigabytes(u32),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tda {
    #[prost(uint32, tag = "1")]
    pub num_of_buckets: u32,
    #[prost(oneof = "tda::TimeMargin", tags = "2, 3, 4")]
    pub time_margin: Option<tda::TimeMargin>,
    #[prost(string, tag = "5")]
    pub ts_field: String,
    #[prost(enumeration = "TimeUnit", tag = "6")]
    pub precision: i32,
}

pub mod tda {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum TimeMargin {
        #[prost(uint32, tag = "2")]
        Seconds(u32),
        #[prost(uint32, tag = "3")]
        Minutes(u32),
        #[prost(uint32, tag = "4")]
        Hours(u32),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TableType {
    Leveldb = 0,
    MemLeveldb = 1,
    LeveldbWrapped = 2,
    MemLeveldbWrapped = 3,
    LeveldbTda = 4,
    MemLeveldbTda = 5,
    Rocksdb = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataModel {
    Kv = 0,
    Array = 1,
    Map = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Comparator {
    Descending = 0,
    Ascending = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum HashingMethod {
    Virtualnodes = 0,
    Consistent = 1,
    Uniform = 2,
    Rendezvous = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TimeUnit {
    Second = 0,
    Millisecond = 1,
    Microsecond = 2,
    Nanosecond = 3,
}

// Update operations

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateOperation {
    #[prost(string, tag = "1")]
    pub field: String,
    #[prost(message, optional, tag = "2")]
    pub update_instruction: Option<UpdateInstruction>,
    #[prost(message, optional, tag = "3")]
    pub value: Option<Value>,
    #[prost(message, optional, tag = "4")]
    pub default_value: Option<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateInstruction {
    #[prost(enumeration = "Instruction", tag = "1")]
    pub instruction: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub threshold: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub set_value: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Instruction {
    Increment = 0,
    Overwrite = 1,
}

// Indexing

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexConfig {
    #[prost(string, tag = "1")]
    pub column: String,
    #[prost(message, optional, tag = "2")]
    pub options: Option<IndexOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexOptions {
    #[prost(enumeration = "CharFilter", tag = "1")]
    pub char_filter: i32,
    #[prost(enumeration = "Tokenizer", tag = "2")]
    pub tokenizer: i32,
    #[prost(message, optional, tag = "3")]
    pub token_filter: Option<TokenFilter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenFilter {
    #[prost(enumeration = "TokenTransform", tag = "1")]
    pub transform: i32,
    #[prost(string, repeated, tag = "2")]
    pub add: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub delete: Vec<String>,
    #[prost(enumeration = "TokenStats", tag = "4")]
    pub stats: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostingFilter {
    #[prost(enumeration = "SortBy", tag = "1")]
    pub sort_by: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub start_ts: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub end_ts: Vec<u8>,
    #[prost(uint32, tag = "4")]
    pub max_postings: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CharFilter {
    Nfc = 0,
    Nfd = 1,
    Nfkc = 2,
    Nfkd = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Tokenizer {
    UnicodeWordBoundaries = 0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TokenTransform {
    Lowercase = 0,
    Uppercase = 1,
    Casefold = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TokenStats {
    Nostats = 0,
    Unique = 1,
    Frequency = 2,
    Position = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SortBy {
    Relevance = 0,
    Timestamp = 1,
}
