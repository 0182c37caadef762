use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::{dataset_from_uri, resolve_table_location};
use lineage_types::Dataset;

/// Input dataset read from a Hive catalog table.
pub struct HiveTableRelationVisitor;

impl QueryPlanVisitor for HiveTableRelationVisitor {
    fn name(&self) -> &str {
        "HiveTableRelationVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(plan, LogicalPlan::HiveTableRelation(_))
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::HiveTableRelation(relation) = plan else {
            return Ok(Vec::new());
        };
        let url = resolve_table_location(&relation.table_meta)?;
        Ok(vec![dataset_from_uri(&url, &relation.table_meta.schema)])
    }
}
