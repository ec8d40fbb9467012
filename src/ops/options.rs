//! Options accepted by table, update and index procedures.
//!
//! Each type converts into its apollo message with `From`; enum discriminants follow the
//! server's numbering.
use crate::{
    protocol::apollo::{self as wire, table_option::Opt},
    value::Value,
};

/// Storage engine backing a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageType {
    LevelDb,
    MemLevelDb,
    LevelDbWrapped,
    MemLevelDbWrapped,
    LevelDbTda,
    MemLevelDbTda,
    #[default]
    RocksDb,
}

impl From<StorageType> for wire::TableType {
    fn from(ty: StorageType) -> Self {
        match ty {
            StorageType::LevelDb => wire::TableType::Leveldb,
            StorageType::MemLevelDb => wire::TableType::MemLeveldb,
            StorageType::LevelDbWrapped => wire::TableType::LeveldbWrapped,
            StorageType::MemLevelDbWrapped => wire::TableType::MemLeveldbWrapped,
            StorageType::LevelDbTda => wire::TableType::LeveldbTda,
            StorageType::MemLevelDbTda => wire::TableType::MemLeveldbTda,
            StorageType::RocksDb => wire::TableType::Rocksdb,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataModel {
    Kv,
    #[default]
    Array,
    Map,
}

impl From<DataModel> for wire::DataModel {
    fn from(model: DataModel) -> Self {
        match model {
            DataModel::Kv => wire::DataModel::Kv,
            DataModel::Array => wire::DataModel::Array,
            DataModel::Map => wire::DataModel::Map,
        }
    }
}

/// Key ordering within a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Comparator {
    #[default]
    Descending,
    Ascending,
}

impl From<Comparator> for wire::Comparator {
    fn from(comparator: Comparator) -> Self {
        match comparator {
            Comparator::Descending => wire::Comparator::Descending,
            Comparator::Ascending => wire::Comparator::Ascending,
        }
    }
}

/// How keys are spread across shards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashingMethod {
    VirtualNodes,
    Consistent,
    #[default]
    Uniform,
    Rendezvous,
}

impl From<HashingMethod> for wire::HashingMethod {
    fn from(method: HashingMethod) -> Self {
        match method {
            HashingMethod::VirtualNodes => wire::HashingMethod::Virtualnodes,
            HashingMethod::Consistent => wire::HashingMethod::Consistent,
            HashingMethod::Uniform => wire::HashingMethod::Uniform,
            HashingMethod::Rendezvous => wire::HashingMethod::Rendezvous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMargin {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMargin {
    Megabytes(u32),
    Gigabytes(u32),
}

/// Precision of the timestamp field in a time-divided table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    #[default]
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl From<TimeUnit> for wire::TimeUnit {
    fn from(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Second => wire::TimeUnit::Second,
            TimeUnit::Millisecond => wire::TimeUnit::Millisecond,
            TimeUnit::Microsecond => wire::TimeUnit::Microsecond,
            TimeUnit::Nanosecond => wire::TimeUnit::Nanosecond,
        }
    }
}

/// Bucket rotation for wrapped tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub num_of_buckets: u32,
    pub time_margin: Option<TimeMargin>,
    pub size_margin: Option<SizeMargin>,
}

impl From<Wrapper> for wire::Wrapper {
    fn from(wrapper: Wrapper) -> Self {
        wire::Wrapper {
            num_of_buckets: wrapper.num_of_buckets,
            time_margin: wrapper.time_margin.map(|margin| match margin {
                TimeMargin::Seconds(n) => wire::wrapper::TimeMargin::Seconds(n),
                TimeMargin::Minutes(n) => wire::wrapper::TimeMargin::Minutes(n),
                TimeMargin::Hours(n) => wire::wrapper::TimeMargin::Hours(n),
            }),
            size_margin: wrapper.size_margin.map(|margin| match margin {
                SizeMargin::Megabytes(n) => wire::wrapper::SizeMargin::Megabytes(n),
                SizeMargin::Gigabytes(n) => wire::wrapper::SizeMargin::Gigabytes(n),
            }),
        }
    }
}

/// Time-divided bucket layout, keyed on a timestamp field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tda {
    pub num_of_buckets: u32,
    pub time_margin: Option<TimeMargin>,
    pub ts_field: String,
    pub precision: TimeUnit,
}

impl From<Tda> for wire::Tda {
    fn from(tda: Tda) -> Self {
        wire::Tda {
            num_of_buckets: tda.num_of_buckets,
            time_margin: tda.time_margin.map(|margin| match margin {
                TimeMargin::Seconds(n) => wire::tda::TimeMargin::Seconds(n),
                TimeMargin::Minutes(n) => wire::tda::TimeMargin::Minutes(n),
                TimeMargin::Hours(n) => wire::tda::TimeMargin::Hours(n),
            }),
            ts_field: tda.ts_field,
            precision: wire::TimeUnit::from(tda.precision) as i32,
        }
    }
}

/// One table creation option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOption {
    Type(StorageType),
    DataModel(DataModel),
    Wrapper(Wrapper),
    Tda(Tda),
    HashingMethod(HashingMethod),
    Comparator(Comparator),
    Distributed(bool),
    NumOfShards(u32),
}

impl From<TableOption> for wire::TableOption {
    fn from(option: TableOption) -> Self {
        let opt = match option {
            TableOption::Type(ty) => Opt::Type(wire::TableType::from(ty) as i32),
            TableOption::DataModel(model) => Opt::DataModel(wire::DataModel::from(model) as i32),
            TableOption::Wrapper(wrapper) => Opt::Wrapper(wrapper.into()),
            TableOption::Tda(tda) => Opt::Tda(tda.into()),
            TableOption::HashingMethod(method) => {
                Opt::HashingMethod(wire::HashingMethod::from(method) as i32)
            }
            TableOption::Comparator(comparator) => {
                Opt::Comparator(wire::Comparator::from(comparator) as i32)
            }
            TableOption::Distributed(distributed) => Opt::Distributed(distributed),
            TableOption::NumOfShards(shards) => Opt::NumOfShards(shards),
        };
        wire::TableOption { opt: Some(opt) }
    }
}

/// What an update does to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInstruction {
    /// Add the operation's value to the field. Once `threshold` is passed the field is reset
    /// to `set_value`.
    Increment {
        threshold: Option<u32>,
        set_value: Option<u32>,
    },
    Overwrite,
}

impl UpdateInstruction {
    pub fn increment() -> Self {
        UpdateInstruction::Increment {
            threshold: None,
            set_value: None,
        }
    }
}

/// Threshold and reset values travel as 4 big-endian bytes, or no bytes when unset.
fn u32_bytes(value: Option<u32>) -> Vec<u8> {
    value.map(|v| v.to_be_bytes().to_vec()).unwrap_or_default()
}

impl From<UpdateInstruction> for wire::UpdateInstruction {
    fn from(instruction: UpdateInstruction) -> Self {
        match instruction {
            UpdateInstruction::Increment {
                threshold,
                set_value,
            } => wire::UpdateInstruction {
                instruction: wire::Instruction::Increment as i32,
                threshold: u32_bytes(threshold),
                set_value: u32_bytes(set_value),
            },
            UpdateInstruction::Overwrite => wire::UpdateInstruction {
                instruction: wire::Instruction::Overwrite as i32,
                threshold: Vec::new(),
                set_value: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOperation {
    pub field: String,
    pub instruction: UpdateInstruction,
    pub value: Value,
    /// Used when the field does not exist yet.
    pub default_value: Option<Value>,
}

impl UpdateOperation {
    pub fn overwrite(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            instruction: UpdateInstruction::Overwrite,
            value: value.into(),
            default_value: None,
        }
    }

    pub fn increment(field: impl Into<String>, by: i64) -> Self {
        Self {
            field: field.into(),
            instruction: UpdateInstruction::increment(),
            value: Value::Int(by),
            default_value: None,
        }
    }

    pub fn with_default(mut self, default_value: impl Into<Value>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

impl From<UpdateOperation> for wire::UpdateOperation {
    fn from(op: UpdateOperation) -> Self {
        wire::UpdateOperation {
            field: op.field,
            update_instruction: Some(op.instruction.into()),
            value: Some(op.value.into()),
            default_value: op.default_value.map(Into::into),
        }
    }
}

/// Unicode normalization applied before tokenizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CharFilter {
    #[default]
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tokenizer {
    #[default]
    UnicodeWordBoundaries,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenTransform {
    #[default]
    Lowercase,
    Uppercase,
    Casefold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenStats {
    #[default]
    NoStats,
    Unique,
    Frequency,
    Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenFilter {
    pub transform: TokenTransform,
    /// Extra stop words.
    pub add: Vec<String>,
    /// Stop words to drop from the default list.
    pub delete: Vec<String>,
    pub stats: TokenStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub char_filter: CharFilter,
    pub tokenizer: Tokenizer,
    pub token_filter: TokenFilter,
}

/// Full-text index on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub column: String,
    pub options: IndexOptions,
}

impl IndexConfig {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            options: IndexOptions::default(),
        }
    }
}

impl From<IndexOptions> for wire::IndexOptions {
    fn from(options: IndexOptions) -> Self {
        let char_filter = match options.char_filter {
            CharFilter::Nfc => wire::CharFilter::Nfc,
            CharFilter::Nfd => wire::CharFilter::Nfd,
            CharFilter::Nfkc => wire::CharFilter::Nfkc,
            CharFilter::Nfkd => wire::CharFilter::Nfkd,
        };
        let tokenizer = match options.tokenizer {
            Tokenizer::UnicodeWordBoundaries => wire::Tokenizer::UnicodeWordBoundaries,
        };
        let filter = options.token_filter;
        let transform = match filter.transform {
            TokenTransform::Lowercase => wire::TokenTransform::Lowercase,
            TokenTransform::Uppercase => wire::TokenTransform::Uppercase,
            TokenTransform::Casefold => wire::TokenTransform::Casefold,
        };
        let stats = match filter.stats {
            TokenStats::NoStats => wire::TokenStats::Nostats,
            TokenStats::Unique => wire::TokenStats::Unique,
            TokenStats::Frequency => wire::TokenStats::Frequency,
            TokenStats::Position => wire::TokenStats::Position,
        };

        wire::IndexOptions {
            char_filter: char_filter as i32,
            tokenizer: tokenizer as i32,
            token_filter: Some(wire::TokenFilter {
                transform: transform as i32,
                add: filter.add,
                delete: filter.delete,
                stats: stats as i32,
            }),
        }
    }
}

impl From<IndexConfig> for wire::IndexConfig {
    fn from(config: IndexConfig) -> Self {
        wire::IndexConfig {
            column: config.column,
            options: Some(config.options.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Relevance,
    Timestamp,
}

/// Narrows and orders the postings returned by an index read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostingFilter {
    pub sort_by: SortBy,
    pub start_ts: Option<u32>,
    pub end_ts: Option<u32>,
    /// Zero leaves the count to the server.
    pub max_postings: u32,
}

impl From<PostingFilter> for wire::PostingFilter {
    fn from(filter: PostingFilter) -> Self {
        let sort_by = match filter.sort_by {
            SortBy::Relevance => wire::SortBy::Relevance,
            SortBy::Timestamp => wire::SortBy::Timestamp,
        };
        // A zero timestamp means no bound, same as an absent one.
        wire::PostingFilter {
            sort_by: sort_by as i32,
            start_ts: u32_bytes(filter.start_ts.filter(|ts| *ts > 0)),
            end_ts: u32_bytes(filter.end_ts.filter(|ts| *ts > 0)),
            max_postings: filter.max_postings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_options_carry_server_discriminants() {
        let opt: wire::TableOption = TableOption::Type(StorageType::MemLevelDbTda).into();
        assert_eq!(opt.opt, Some(Opt::Type(5)));

        let opt: wire::TableOption = TableOption::HashingMethod(HashingMethod::Rendezvous).into();
        assert_eq!(opt.opt, Some(Opt::HashingMethod(3)));

        let opt: wire::TableOption = TableOption::DataModel(DataModel::Map).into();
        assert_eq!(opt.opt, Some(Opt::DataModel(2)));
    }

    #[test]
    fn tda_option_keeps_margin_and_precision() {
        let opt: wire::TableOption = TableOption::Tda(Tda {
            num_of_buckets: 10,
            time_margin: Some(TimeMargin::Hours(2)),
            ts_field: "ts".into(),
            precision: TimeUnit::Millisecond,
        })
        .into();

        let Some(Opt::Tda(tda)) = opt.opt else {
            panic!("expected tda option");
        };
        assert_eq!(tda.num_of_buckets, 10);
        assert_eq!(tda.time_margin, Some(wire::tda::TimeMargin::Hours(2)));
        assert_eq!(tda.precision, wire::TimeUnit::Millisecond as i32);
    }

    #[test]
    fn increment_threshold_is_four_bytes_big_endian() {
        let op: wire::UpdateOperation = UpdateOperation {
            field: "counter".into(),
            instruction: UpdateInstruction::Increment {
                threshold: Some(1000),
                set_value: None,
            },
            value: Value::Int(1),
            default_value: None,
        }
        .into();

        let instruction = op.update_instruction.unwrap();
        assert_eq!(instruction.instruction, wire::Instruction::Increment as i32);
        assert_eq!(instruction.threshold, vec![0, 0, 0x03, 0xe8]);
        assert!(instruction.set_value.is_empty());
        assert!(op.default_value.is_none());
    }

    #[test]
    fn overwrite_with_default() {
        let op: wire::UpdateOperation = UpdateOperation::overwrite("name", "x")
            .with_default("unset")
            .into();
        let instruction = op.update_instruction.unwrap();
        assert_eq!(instruction.instruction, wire::Instruction::Overwrite as i32);
        assert_eq!(
            op.default_value,
            Some(wire::Value::from(Value::from("unset")))
        );
    }

    #[test]
    fn posting_filter_drops_zero_timestamps() {
        let filter: wire::PostingFilter = PostingFilter {
            sort_by: SortBy::Timestamp,
            start_ts: Some(0),
            end_ts: Some(0x01020304),
            max_postings: 5,
        }
        .into();

        assert_eq!(filter.sort_by, wire::SortBy::Timestamp as i32);
        assert!(filter.start_ts.is_empty());
        assert_eq!(filter.end_ts, vec![1, 2, 3, 4]);
        assert_eq!(filter.max_postings, 5);
    }

    #[test]
    fn index_options_default_to_server_defaults() {
        let config: wire::IndexConfig = IndexConfig::new("text").into();
        let options = config.options.unwrap();
        assert_eq!(options.char_filter, wire::CharFilter::Nfc as i32);
        let filter = options.token_filter.unwrap();
        assert_eq!(filter.transform, wire::TokenTransform::Lowercase as i32);
        assert_eq!(filter.stats, wire::TokenStats::Nostats as i32);
    }
}
