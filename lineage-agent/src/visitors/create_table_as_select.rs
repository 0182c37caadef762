use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::{dataset_from_uri, resolve_table_location};
use lineage_types::Dataset;

/// Output dataset of `CREATE TABLE ... USING ... AS SELECT`.
pub struct CreateDataSourceTableAsSelectVisitor;

impl QueryPlanVisitor for CreateDataSourceTableAsSelectVisitor {
    fn name(&self) -> &str {
        "CreateDataSourceTableAsSelectVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(plan, LogicalPlan::CreateDataSourceTableAsSelectCommand(_))
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::CreateDataSourceTableAsSelectCommand(cmd) = plan else {
            return Ok(Vec::new());
        };
        let url = resolve_table_location(&cmd.table)?;
        Ok(vec![dataset_from_uri(&url, &cmd.query.schema())])
    }
}
