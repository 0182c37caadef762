//! The host engine's logical plan, as handed to the listener.
//!
//! Each variant is one node shape. Nodes own their children, so a plan is
//! always a finite tree. Plans can also be loaded from a JSON dump where the
//! `node` key names the variant.

pub mod catalog;
#[cfg(test)]
pub mod fixtures;
pub mod schema;

pub use catalog::{CatalogStorageFormat, CatalogTable, TableIdentifier};
pub use schema::{StructField, StructType};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row and byte counts reported by a write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteMetrics {
    pub num_output_rows: i64,
    #[serde(default)]
    pub num_output_bytes: Option<i64>,
}

/// Storage behind a `LogicalRelation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "relation")]
pub enum BaseRelation {
    /// Files under one or more root paths (csv, parquet, json...)
    #[serde(rename_all = "camelCase")]
    HadoopFsRelation {
        root_paths: Vec<String>,
        data_schema: StructType,
        file_format: String,
    },
    /// A table read through a JDBC connection
    JdbcRelation {
        url: String,
        table: String,
        schema: StructType,
    },
    /// One or more Kafka topics read as a batch or stream
    #[serde(rename_all = "camelCase")]
    KafkaRelation {
        bootstrap_servers: String,
        topics: Vec<String>,
        schema: StructType,
    },
    Other { name: String, schema: StructType },
}

impl BaseRelation {
    pub fn schema(&self) -> &StructType {
        match self {
            BaseRelation::HadoopFsRelation { data_schema, .. } => data_schema,
            BaseRelation::JdbcRelation { schema, .. } => schema,
            BaseRelation::KafkaRelation { schema, .. } => schema,
            BaseRelation::Other { schema, .. } => schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalRelation {
    pub relation: BaseRelation,
    #[serde(default)]
    pub catalog_table: Option<CatalogTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveTableRelation {
    pub table_meta: CatalogTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRelation {
    pub output: StructType,
}

/// `INSERT INTO` a relation provided by a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertIntoDataSourceCommand {
    /// The write target. Not a child: it is not read by the query.
    pub logical_relation: Box<LogicalPlan>,
    pub query: Box<LogicalPlan>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub metrics: Option<WriteMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertIntoHadoopFsRelationCommand {
    pub output_path: String,
    pub file_format: String,
    #[serde(default)]
    pub catalog_table: Option<CatalogTable>,
    pub query: Box<LogicalPlan>,
    #[serde(default)]
    pub mode: SaveMode,
    #[serde(default)]
    pub metrics: Option<WriteMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertIntoHiveTable {
    pub table: CatalogTable,
    pub query: Box<LogicalPlan>,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDataSourceTableAsSelectCommand {
    pub table: CatalogTable,
    pub query: Box<LogicalPlan>,
    #[serde(default)]
    pub mode: SaveMode,
}

/// `df.write.format(provider).options(..).save()` for sources without a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveIntoDataSourceCommand {
    pub provider: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub query: Box<LogicalPlan>,
    #[serde(default)]
    pub mode: SaveMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveMode {
    Append,
    Overwrite,
    #[default]
    ErrorIfExists,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub output: StructType,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub condition: String,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    #[serde(default)]
    pub grouping: Vec<String>,
    pub output: StructType,
    pub child: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    pub join_type: String,
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub children: Vec<LogicalPlan>,
}

/// Any node shape this crate has no model for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownNode {
    pub node_name: String,
    #[serde(default)]
    pub output: StructType,
    #[serde(default)]
    pub children: Vec<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum LogicalPlan {
    LogicalRelation(LogicalRelation),
    HiveTableRelation(HiveTableRelation),
    LocalRelation(LocalRelation),
    InsertIntoDataSourceCommand(InsertIntoDataSourceCommand),
    InsertIntoHadoopFsRelationCommand(InsertIntoHadoopFsRelationCommand),
    InsertIntoHiveTable(InsertIntoHiveTable),
    CreateDataSourceTableAsSelectCommand(CreateDataSourceTableAsSelectCommand),
    SaveIntoDataSourceCommand(SaveIntoDataSourceCommand),
    Project(Project),
    Filter(Filter),
    Aggregate(Aggregate),
    Join(Join),
    Union(Union),
    Unknown(UnknownNode),
}

impl LogicalPlan {
    pub fn node_name(&self) -> &str {
        match self {
            LogicalPlan::LogicalRelation(_) => "LogicalRelation",
            LogicalPlan::HiveTableRelation(_) => "HiveTableRelation",
            LogicalPlan::LocalRelation(_) => "LocalRelation",
            LogicalPlan::InsertIntoDataSourceCommand(_) => "InsertIntoDataSourceCommand",
            LogicalPlan::InsertIntoHadoopFsRelationCommand(_) => "InsertIntoHadoopFsRelationCommand",
            LogicalPlan::InsertIntoHiveTable(_) => "InsertIntoHiveTable",
            LogicalPlan::CreateDataSourceTableAsSelectCommand(_) => "CreateDataSourceTableAsSelectCommand",
            LogicalPlan::SaveIntoDataSourceCommand(_) => "SaveIntoDataSourceCommand",
            LogicalPlan::Project(_) => "Project",
            LogicalPlan::Filter(_) => "Filter",
            LogicalPlan::Aggregate(_) => "Aggregate",
            LogicalPlan::Join(_) => "Join",
            LogicalPlan::Union(_) => "Union",
            LogicalPlan::Unknown(node) => &node.node_name,
        }
    }

    /// Nodes this one reads from. A write command's target is not among them.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::LogicalRelation(_)
            | LogicalPlan::HiveTableRelation(_)
            | LogicalPlan::LocalRelation(_) => Vec::new(),
            LogicalPlan::InsertIntoDataSourceCommand(cmd) => vec![cmd.query.as_ref()],
            LogicalPlan::InsertIntoHadoopFsRelationCommand(cmd) => vec![cmd.query.as_ref()],
            LogicalPlan::InsertIntoHiveTable(cmd) => vec![cmd.query.as_ref()],
            LogicalPlan::CreateDataSourceTableAsSelectCommand(cmd) => vec![cmd.query.as_ref()],
            LogicalPlan::SaveIntoDataSourceCommand(cmd) => vec![cmd.query.as_ref()],
            LogicalPlan::Project(p) => vec![p.child.as_ref()],
            LogicalPlan::Filter(f) => vec![f.child.as_ref()],
            LogicalPlan::Aggregate(a) => vec![a.child.as_ref()],
            LogicalPlan::Join(j) => vec![j.left.as_ref(), j.right.as_ref()],
            LogicalPlan::Union(u) => u.children.iter().collect(),
            LogicalPlan::Unknown(node) => node.children.iter().collect(),
        }
    }

    /// Output schema. Commands produce no rows and report an empty schema.
    pub fn schema(&self) -> StructType {
        match self {
            LogicalPlan::LogicalRelation(r) => r.relation.schema().clone(),
            LogicalPlan::HiveTableRelation(r) => r.table_meta.schema.clone(),
            LogicalPlan::LocalRelation(r) => r.output.clone(),
            LogicalPlan::InsertIntoDataSourceCommand(_)
            | LogicalPlan::InsertIntoHadoopFsRelationCommand(_)
            | LogicalPlan::InsertIntoHiveTable(_)
            | LogicalPlan::CreateDataSourceTableAsSelectCommand(_)
            | LogicalPlan::SaveIntoDataSourceCommand(_) => StructType::empty(),
            LogicalPlan::Project(p) => p.output.clone(),
            LogicalPlan::Filter(f) => f.child.schema(),
            LogicalPlan::Aggregate(a) => a.output.clone(),
            LogicalPlan::Join(j) => j.left.schema().merge(&j.right.schema()),
            LogicalPlan::Union(u) => u.children.first().map(|c| c.schema()).unwrap_or_default(),
            LogicalPlan::Unknown(node) => node.output.clone(),
        }
    }

    /// Every node of the tree in pre-order, starting with `self`.
    pub fn nodes(&self) -> Vec<&LogicalPlan> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            // reversed so the leftmost child is visited first
            stack.extend(node.children().into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn csv_scan(path: &str) -> LogicalPlan {
        LogicalPlan::LogicalRelation(LogicalRelation {
            relation: BaseRelation::HadoopFsRelation {
                root_paths: vec![path.to_string()],
                data_schema: StructType::new(vec![StructField::new("id", "integer")]),
                file_format: "csv".to_string(),
            },
            catalog_table: None,
        })
    }

    #[test]
    fn test_nodes_pre_order() {
        let plan = LogicalPlan::Join(Join {
            join_type: "inner".into(),
            left: Box::new(LogicalPlan::Filter(Filter {
                condition: "id > 1".into(),
                child: Box::new(csv_scan("/a")),
            })),
            right: Box::new(csv_scan("/b")),
        });

        let names: Vec<&str> = plan.nodes().iter().map(|n| n.node_name()).collect();
        assert_eq!(names, vec!["Join", "Filter", "LogicalRelation", "LogicalRelation"]);
    }

    #[test]
    fn test_insert_target_is_not_a_child() {
        let plan = LogicalPlan::InsertIntoDataSourceCommand(InsertIntoDataSourceCommand {
            logical_relation: Box::new(csv_scan("/out")),
            query: Box::new(csv_scan("/in")),
            overwrite: false,
            metrics: None,
        });

        let children = plan.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0], &csv_scan("/in"));
        assert_eq!(plan.nodes().len(), 2);
        assert!(plan.schema().is_empty());
    }

    #[test]
    fn test_join_schema_concatenates() {
        let plan = LogicalPlan::Join(Join {
            join_type: "inner".into(),
            left: Box::new(csv_scan("/a")),
            right: Box::new(csv_scan("/b")),
        });
        assert_eq!(plan.schema().fields.len(), 2);
    }

    #[test]
    fn test_deserialize_plan_dump() {
        let plan: LogicalPlan = serde_json::from_value(json!({
            "node": "InsertIntoHiveTable",
            "table": {
                "identifier": {"database": "default", "table": "t"},
                "storage": {"locationUri": "/warehouse/t"},
                "schema": {"fields": [{"name": "a", "dataType": "string"}]}
            },
            "query": {
                "node": "Project",
                "output": {"fields": [{"name": "a", "dataType": "string"}]},
                "child": {
                    "node": "LogicalRelation",
                    "relation": {
                        "relation": "HadoopFsRelation",
                        "rootPaths": ["/data/s.csv"],
                        "dataSchema": {"fields": [{"name": "a", "dataType": "string"}]},
                        "fileFormat": "csv"
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(plan.node_name(), "InsertIntoHiveTable");
        assert_eq!(plan.nodes().len(), 3);
        match &plan {
            LogicalPlan::InsertIntoHiveTable(cmd) => {
                assert_eq!(cmd.table.location().unwrap(), "/warehouse/t");
                assert!(cmd.query.schema().fields[0].nullable);
            }
            other => panic!("unexpected node {}", other.node_name()),
        }
    }

    #[test]
    fn test_unknown_node_keeps_children() {
        let plan: LogicalPlan = serde_json::from_value(json!({
            "node": "Unknown",
            "nodeName": "Window",
            "children": [{"node": "LocalRelation", "output": {"fields": []}}]
        }))
        .unwrap();
        assert_eq!(plan.node_name(), "Window");
        assert_eq!(plan.children().len(), 1);
    }
}
