//! Catalog metadata attached to table-backed plan nodes.

use super::schema::StructType;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIdentifier {
    #[serde(default)]
    pub database: Option<String>,
    pub table: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStorageFormat {
    #[serde(default)]
    pub location_uri: Option<String>,
}

/// A table registered in the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub identifier: TableIdentifier,
    #[serde(default)]
    pub storage: CatalogStorageFormat,
    #[serde(default)]
    pub schema: StructType,
    #[serde(default)]
    pub provider: Option<String>,
}

impl CatalogTable {
    pub fn new(database: Option<&str>, table: &str, location: Option<&str>, schema: StructType) -> Self {
        Self {
            identifier: TableIdentifier {
                database: database.map(str::to_string),
                table: table.to_string(),
            },
            storage: CatalogStorageFormat {
                location_uri: location.map(str::to_string),
            },
            schema,
            provider: None,
        }
    }

    /// The storage location recorded for this table.
    ///
    /// Like the engine's own lookup this fails with an `AnalysisError` when the
    /// catalog has no location for the table.
    pub fn location(&self) -> Result<&str, AnalysisError> {
        match self.storage.location_uri.as_deref() {
            Some(loc) if !loc.trim().is_empty() => Ok(loc),
            _ => Err(AnalysisError::new(format!(
                "table {} did not specify locationUri",
                self.qualified_name()
            ))),
        }
    }

    /// `database.table`, or just `table` when no database is set.
    pub fn qualified_name(&self) -> String {
        match self.identifier.database.as_deref() {
            Some(db) if !db.is_empty() => format!("{}.{}", db, self.identifier.table),
            _ => self.identifier.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_missing_is_analysis_error() {
        let table = CatalogTable::new(Some("db"), "t", None, StructType::empty());
        let err = table.location().unwrap_err();
        assert!(err.message.contains("db.t"));

        let blank = CatalogTable::new(Some("db"), "t", Some("  "), StructType::empty());
        assert!(blank.location().is_err());
    }

    #[test]
    fn test_qualified_name() {
        let with_db = CatalogTable::new(Some("sales"), "orders", None, StructType::empty());
        assert_eq!(with_db.qualified_name(), "sales.orders");

        let without_db = CatalogTable::new(None, "orders", None, StructType::empty());
        assert_eq!(without_db.qualified_name(), "orders");
    }
}
