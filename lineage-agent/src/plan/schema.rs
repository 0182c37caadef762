use lineage_types::SchemaField;
use serde::{Deserialize, Serialize};

/// A column in a plan node's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructField {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
        }
    }
}

/// Ordered set of columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    #[serde(default)]
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(fields: Vec<StructField>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Concatenate two schemas, as a join's output does.
    pub fn merge(&self, other: &StructType) -> StructType {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        StructType { fields }
    }

    pub fn to_schema_fields(&self) -> Vec<SchemaField> {
        self.fields
            .iter()
            .map(|f| SchemaField::new(f.name.clone(), f.data_type.clone()))
            .collect()
    }
}
