use crate::{
    error::Error,
    protocol::apollo::{self, apollo_pdu::Procedure},
    session::Session,
};

use super::{IndexConfig, Posting, PostingFilter};

impl Session {
    pub fn add_index(
        &self,
        table: &str,
        configs: impl IntoIterator<Item = IndexConfig>,
    ) -> Result<(), Error> {
        let procedure = Procedure::AddIndex(apollo::AddIndex {
            table_name: table.to_string(),
            config: configs.into_iter().map(Into::into).collect(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    pub fn remove_index(&self, table: &str, columns: &[&str]) -> Result<(), Error> {
        let procedure = Procedure::RemoveIndex(apollo::RemoveIndex {
            table_name: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    /// Rows whose indexed `column` contains `term`.
    pub fn index_read(
        &self,
        table: &str,
        column: &str,
        term: &str,
        filter: PostingFilter,
    ) -> Result<Vec<Posting>, Error> {
        let procedure = Procedure::IndexRead(apollo::IndexRead {
            table_name: table.to_string(),
            column_name: column.to_string(),
            term: term.to_string(),
            filter: Some(filter.into()),
        });
        Ok(self.call(procedure)?.into_postings()?)
    }
}
