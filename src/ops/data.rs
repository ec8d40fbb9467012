use crate::{
    error::Error,
    protocol::apollo::{self, apollo_pdu::Procedure},
    session::Session,
    value::{Fields, encode_fields},
};

use super::{Cursor, KeyColumnsList, UpdateOperation};

impl Session {
    pub fn write(&self, table: &str, key: Fields, columns: Fields) -> Result<(), Error> {
        let procedure = Procedure::Write(apollo::Write {
            table_name: table.to_string(),
            key: encode_fields(key),
            columns: encode_fields(columns),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    /// Columns stored under `key`.
    pub fn read(&self, table: &str, key: Fields) -> Result<Fields, Error> {
        let procedure = Procedure::Read(apollo::Read {
            table_name: table.to_string(),
            key: encode_fields(key),
        });
        Ok(self.call(procedure)?.into_columns()?)
    }

    /// Apply `operations` to the row under `key` and return its updated columns.
    pub fn update(
        &self,
        table: &str,
        key: Fields,
        operations: impl IntoIterator<Item = UpdateOperation>,
    ) -> Result<Fields, Error> {
        let procedure = Procedure::Update(apollo::Update {
            table_name: table.to_string(),
            key: encode_fields(key),
            update_operation: operations.into_iter().map(Into::into).collect(),
        });
        Ok(self.call(procedure)?.into_columns()?)
    }

    pub fn delete(&self, table: &str, key: Fields) -> Result<(), Error> {
        let procedure = Procedure::Delete(apollo::Delete {
            table_name: table.to_string(),
            key: encode_fields(key),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    /// Rows from `start` towards `end`, at most `limit` of them.
    ///
    /// When more rows remain the result carries a continuation key; pass it as the next
    /// `start` to resume.
    pub fn read_range(
        &self,
        table: &str,
        start: Fields,
        end: Fields,
        limit: u32,
    ) -> Result<KeyColumnsList, Error> {
        let procedure = Procedure::ReadRange(apollo::ReadRange {
            table_name: table.to_string(),
            start_key: encode_fields(start),
            end_key: encode_fields(end),
            limit,
        });
        Ok(self.call(procedure)?.into_key_columns_list()?)
    }

    /// The `n` rows starting at `start`.
    pub fn read_range_n(&self, table: &str, start: Fields, n: u32) -> Result<KeyColumnsList, Error> {
        let procedure = Procedure::ReadRangeN(apollo::ReadRangeN {
            table_name: table.to_string(),
            start_key: encode_fields(start),
            n,
        });
        Ok(self.call(procedure)?.into_key_columns_list()?)
    }

    pub fn first(&self, table: &str) -> Result<Cursor, Error> {
        let procedure = Procedure::First(apollo::First {
            table_name: table.to_string(),
        });
        Ok(self.call(procedure)?.into_cursor()?)
    }

    pub fn last(&self, table: &str) -> Result<Cursor, Error> {
        let procedure = Procedure::Last(apollo::Last {
            table_name: table.to_string(),
        });
        Ok(self.call(procedure)?.into_cursor()?)
    }

    /// Position an iterator at `key`, or the nearest key after it.
    pub fn seek(&self, table: &str, key: Fields) -> Result<Cursor, Error> {
        let procedure = Procedure::Seek(apollo::Seek {
            table_name: table.to_string(),
            key: encode_fields(key),
        });
        Ok(self.call(procedure)?.into_cursor()?)
    }

    pub fn next(&self, iterator: &[u8]) -> Result<Cursor, Error> {
        let procedure = Procedure::Next(apollo::Next {
            it: iterator.to_vec(),
        });
        Ok(self.call(procedure)?.into_cursor()?)
    }

    pub fn prev(&self, iterator: &[u8]) -> Result<Cursor, Error> {
        let procedure = Procedure::Prev(apollo::Prev {
            it: iterator.to_vec(),
        });
        Ok(self.call(procedure)?.into_cursor()?)
    }
}
