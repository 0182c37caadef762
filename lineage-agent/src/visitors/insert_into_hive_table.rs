//! Output dataset of an `InsertIntoHiveTable` command.
//!
//! The dataset is identified by the table's catalog location. When the catalog
//! cannot provide one, the qualified table name is used as the path; the
//! command fails extraction only when neither works.

use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::{dataset_from_uri, resolve_table_location};
use lineage_types::Dataset;

pub struct InsertIntoHiveTableVisitor;

impl QueryPlanVisitor for InsertIntoHiveTableVisitor {
    fn name(&self) -> &str {
        "InsertIntoHiveTableVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(plan, LogicalPlan::InsertIntoHiveTable(_))
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::InsertIntoHiveTable(cmd) = plan else {
            return Ok(Vec::new());
        };
        let url = resolve_table_location(&cmd.table)?;
        Ok(vec![dataset_from_uri(&url, &cmd.query.schema())])
    }
}
