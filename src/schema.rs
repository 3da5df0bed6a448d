//! Schema metadata
//!
//! Loads the pre-generated `schema_info.json` produced by the schema
//! discovery pipeline and derives the allowed-table set the validator
//! checks referenced tables against. The loaded value is passed around
//! explicitly; nothing here is cached in process-global state.

use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub tables: HashMap<String, TableSchema>,
    /// Prompt-ready schema description for the text generator.
    #[serde(default)]
    pub llm_prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
}

impl SchemaInfo {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WardenError::Schema(format!("failed to read {}: {}", path.display(), e))
        })?;
        let info: SchemaInfo = serde_json::from_str(&raw)
            .map_err(|e| WardenError::Schema(format!("invalid schema file: {}", e)))?;
        if info.tables.is_empty() {
            return Err(WardenError::Schema("schema file lists no tables".to_string()));
        }
        Ok(info)
    }

    pub fn allowed_tables(&self) -> AllowedTables {
        self.tables.keys().cloned().collect()
    }
}

/// Case-normalized set of schema table names. Read-only input to the
/// validator; never mutated by this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedTables(BTreeSet<String>);

impl AllowedTables {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedTables {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AllowedTables(iter.into_iter().map(|n| n.into().to_lowercase()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_tables_are_case_normalized() {
        let allowed = AllowedTables::new(["Orders", "CUSTOMERS"]);
        assert!(allowed.contains("orders"));
        assert!(allowed.contains("Customers"));
        assert!(!allowed.contains("order_items"));
    }

    #[test]
    fn schema_info_parses_and_derives_allowed_set() {
        let raw = r#"{
            "tables": {
                "orders": {"columns": [{"name": "id", "data_type": "integer"}]},
                "customers": {}
            },
            "llm_prompt": "Tables: orders, customers"
        }"#;
        let info: SchemaInfo = serde_json::from_str(raw).unwrap();
        let allowed = info.allowed_tables();
        assert_eq!(allowed.len(), 2);
        assert!(allowed.contains("orders"));
        assert_eq!(info.llm_prompt, "Tables: orders, customers");
    }
}
