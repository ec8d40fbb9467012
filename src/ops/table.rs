use crate::{
    error::Error,
    protocol::apollo::{self, apollo_pdu::Procedure},
    session::Session,
    value::Fields,
};

use super::TableOption;

impl Session {
    /// Create `name` keyed on the ordered `keys` columns.
    pub fn create_table(
        &self,
        name: &str,
        keys: &[&str],
        options: impl IntoIterator<Item = TableOption>,
    ) -> Result<(), Error> {
        let procedure = Procedure::CreateTable(apollo::CreateTable {
            table_name: name.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            table_options: options.into_iter().map(Into::into).collect(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    pub fn delete_table(&self, name: &str) -> Result<(), Error> {
        let procedure = Procedure::DeleteTable(apollo::DeleteTable {
            table_name: name.to_string(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    pub fn open_table(&self, name: &str) -> Result<(), Error> {
        let procedure = Procedure::OpenTable(apollo::OpenTable {
            table_name: name.to_string(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    pub fn close_table(&self, name: &str) -> Result<(), Error> {
        let procedure = Procedure::CloseTable(apollo::CloseTable {
            table_name: name.to_string(),
        });
        Ok(self.call(procedure)?.into_ok()?)
    }

    /// Table properties; an empty `attributes` asks for all of them.
    pub fn table_info(&self, name: &str, attributes: &[&str]) -> Result<Fields, Error> {
        let procedure = Procedure::TableInfo(apollo::TableInfo {
            table_name: name.to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        });
        Ok(self.call(procedure)?.into_proplist()?)
    }

    pub fn list_tables(&self) -> Result<Vec<String>, Error> {
        let procedure = Procedure::ListTables(apollo::ListTables {});
        Ok(self.call(procedure)?.into_string_list()?)
    }
}
