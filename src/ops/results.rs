use crate::{
    protocol::apollo as wire,
    value::{Fields, decode_fields},
};

/// One row: its key and its columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyColumns {
    pub key: Fields,
    pub columns: Fields,
}

impl From<wire::KeyColumnsPair> for KeyColumns {
    fn from(pair: wire::KeyColumnsPair) -> Self {
        Self {
            key: decode_fields(pair.key),
            columns: decode_fields(pair.columns),
        }
    }
}

/// A page of a range scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyColumnsList {
    pub entries: Vec<KeyColumns>,
    /// Key to resume the scan from; `None` once the range is exhausted.
    pub continuation: Option<Fields>,
}

impl KeyColumnsList {
    pub fn is_complete(&self) -> bool {
        self.continuation.is_none()
    }
}

impl From<wire::KeyColumnsList> for KeyColumnsList {
    fn from(list: wire::KeyColumnsList) -> Self {
        let continuation = list
            .continuation
            .filter(|cont| !cont.complete && !cont.key.is_empty())
            .map(|cont| decode_fields(cont.key));
        Self {
            entries: list.list.into_iter().map(KeyColumns::from).collect(),
            continuation,
        }
    }
}

/// Row under an iterator, plus the opaque token to move it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    pub entry: KeyColumns,
    pub iterator: Vec<u8>,
}

impl From<wire::KcpIt> for Cursor {
    fn from(kcp_it: wire::KcpIt) -> Self {
        Self {
            entry: kcp_it
                .key_columns_pair
                .map(KeyColumns::from)
                .unwrap_or_default(),
            iterator: kcp_it.it,
        }
    }
}

/// A hit from an index read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posting {
    pub key: Fields,
    pub timestamp: u32,
    pub frequency: u32,
    pub position: u32,
}

impl From<wire::Posting> for Posting {
    fn from(posting: wire::Posting) -> Self {
        Self {
            key: decode_fields(posting.key),
            timestamp: posting.timestamp,
            frequency: posting.frequency,
            position: posting.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fields, value::encode_fields};

    fn wire_pair(id: i64) -> wire::KeyColumnsPair {
        wire::KeyColumnsPair {
            key: encode_fields(fields! { "id" => id }),
            columns: encode_fields(fields! { "name" => format!("row-{id}") }),
        }
    }

    #[test]
    fn continuation_present_when_incomplete() {
        let list = KeyColumnsList::from(wire::KeyColumnsList {
            list: vec![wire_pair(1), wire_pair(2)],
            continuation: Some(wire::ContinuationKey {
                complete: false,
                key: encode_fields(fields! { "id" => 3 }),
            }),
        });

        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[1].columns, fields! { "name" => "row-2" });
        assert_eq!(list.continuation, Some(fields! { "id" => 3 }));
        assert!(!list.is_complete());
    }

    #[test]
    fn complete_scan_has_no_continuation() {
        let marked_complete = KeyColumnsList::from(wire::KeyColumnsList {
            list: vec![wire_pair(1)],
            continuation: Some(wire::ContinuationKey {
                complete: true,
                key: encode_fields(fields! { "id" => 2 }),
            }),
        });
        assert!(marked_complete.is_complete());

        let empty_key = KeyColumnsList::from(wire::KeyColumnsList {
            list: vec![],
            continuation: Some(wire::ContinuationKey {
                complete: false,
                key: vec![],
            }),
        });
        assert!(empty_key.is_complete());

        let absent = KeyColumnsList::from(wire::KeyColumnsList::default());
        assert!(absent.is_complete());
    }

    #[test]
    fn cursor_without_pair_is_empty_entry() {
        let cursor = Cursor::from(wire::KcpIt {
            key_columns_pair: None,
            it: vec![1, 2, 3],
        });
        assert_eq!(cursor.entry, KeyColumns::default());
        assert_eq!(cursor.iterator, vec![1, 2, 3]);
    }
}
