//! Plan visitors: one recognizer per plan-node shape.
//!
//! A visitor first says whether it understands a node (`is_defined_at`), then
//! turns it into datasets (`apply`). Visitors that need datasets from a nested
//! node ask a `VisitorRegistry` for them instead of matching themselves.

mod create_table_as_select;
mod hive_table_relation;
mod insert_into_data_source;
mod insert_into_hadoop_fs_relation;
mod insert_into_hive_table;
mod kafka;
mod logical_relation;
pub mod registry;

pub use create_table_as_select::CreateDataSourceTableAsSelectVisitor;
pub use hive_table_relation::HiveTableRelationVisitor;
pub use insert_into_data_source::InsertIntoDataSourceVisitor;
pub use insert_into_hadoop_fs_relation::InsertIntoHadoopFsRelationVisitor;
pub use insert_into_hive_table::InsertIntoHiveTableVisitor;
pub use kafka::{KafkaRelationVisitor, KafkaWriteVisitor};
pub use logical_relation::LogicalRelationVisitor;
pub use registry::{apply_first, VisitorRegistry};

use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use lineage_types::Dataset;
use std::sync::Arc;

/// Recognizer for a single plan-node shape.
pub trait QueryPlanVisitor: Send + Sync {
    /// Visitor name, used in logs
    fn name(&self) -> &str;

    /// Whether this visitor handles `plan`. Must not fail or have side effects.
    fn is_defined_at(&self, plan: &LogicalPlan) -> bool;

    /// Extract the datasets `plan` describes. Nodes the visitor does not
    /// handle yield an empty list.
    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError>;
}

/// Visitors that recognize datasets being read, in precedence order.
pub fn input_dataset_visitors() -> Arc<VisitorRegistry> {
    let mut registry = VisitorRegistry::new();
    registry.register(Arc::new(LogicalRelationVisitor));
    registry.register(Arc::new(HiveTableRelationVisitor));
    registry.register(Arc::new(KafkaRelationVisitor));
    Arc::new(registry)
}

/// Visitors that recognize datasets being written, in precedence order.
///
/// `inputs` resolves the target relation of data-source inserts.
pub fn output_dataset_visitors(inputs: Arc<VisitorRegistry>) -> Arc<VisitorRegistry> {
    let mut registry = VisitorRegistry::new();
    registry.register(Arc::new(InsertIntoDataSourceVisitor::new(inputs)));
    registry.register(Arc::new(InsertIntoHadoopFsRelationVisitor));
    registry.register(Arc::new(InsertIntoHiveTableVisitor));
    registry.register(Arc::new(CreateDataSourceTableAsSelectVisitor));
    registry.register(Arc::new(KafkaWriteVisitor));
    Arc::new(registry)
}
