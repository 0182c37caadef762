//! Output dataset of an `InsertIntoDataSourceCommand`.
//!
//! The write target is itself a relation node, so the dataset is resolved by
//! handing that node to the input registry. The command's write metrics are then
//! merged into whatever the registry produced, as an `outputStatistics` facet.

use super::{QueryPlanVisitor, VisitorRegistry};
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::PRODUCER;
use lineage_types::{output_statistics_facet, Dataset, FacetMap};
use std::sync::Arc;

pub struct InsertIntoDataSourceVisitor {
    dataset_providers: Arc<VisitorRegistry>,
}

impl InsertIntoDataSourceVisitor {
    pub fn new(dataset_providers: Arc<VisitorRegistry>) -> Self {
        Self { dataset_providers }
    }
}

impl QueryPlanVisitor for InsertIntoDataSourceVisitor {
    fn name(&self) -> &str {
        "InsertIntoDataSourceVisitor"
    }

    fn is_defined_at(&self, plan: &LogicalPlan) -> bool {
        matches!(plan, LogicalPlan::InsertIntoDataSourceCommand(_))
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let LogicalPlan::InsertIntoDataSourceCommand(cmd) = plan else {
            return Ok(Vec::new());
        };

        let mut datasets = self.dataset_providers.resolve(&cmd.logical_relation)?;

        if let Some(metrics) = cmd.metrics {
            let mut stats = FacetMap::new();
            stats.insert(
                "outputStatistics".to_string(),
                output_statistics_facet(PRODUCER, metrics.num_output_rows, metrics.num_output_bytes),
            );
            for dataset in &mut datasets {
                dataset.merge_facets(&stats);
            }
        }

        Ok(datasets)
    }
}
