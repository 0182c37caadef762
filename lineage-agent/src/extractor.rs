//! Walks a whole plan tree through the input and output registries.

use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use crate::plan_utils::merge_datasets;
use crate::visitors::{input_dataset_visitors, output_dataset_visitors, VisitorRegistry};
use lineage_types::Dataset;
use std::sync::Arc;

/// Datasets read and written by one plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanLineage {
    pub inputs: Vec<Dataset>,
    pub outputs: Vec<Dataset>,
}

/// Extracts lineage from plan trees.
///
/// Every node of the tree is offered to both registries. Datasets that come
/// back with the same identity, from different nodes or different visitors,
/// are folded into one entry carrying the union of their facets.
pub struct PlanExtractor {
    inputs: Arc<VisitorRegistry>,
    outputs: Arc<VisitorRegistry>,
}

impl PlanExtractor {
    pub fn new(inputs: Arc<VisitorRegistry>, outputs: Arc<VisitorRegistry>) -> Self {
        Self { inputs, outputs }
    }

    /// Extractor with the built-in visitors
    pub fn standard() -> Self {
        let inputs = input_dataset_visitors();
        let outputs = output_dataset_visitors(Arc::clone(&inputs));
        Self::new(inputs, outputs)
    }

    pub fn extract(&self, plan: &LogicalPlan) -> Result<PlanLineage, ExtractionError> {
        Ok(PlanLineage {
            inputs: Self::collect(&self.inputs, plan)?,
            outputs: Self::collect(&self.outputs, plan)?,
        })
    }

    fn collect(registry: &VisitorRegistry, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        let mut datasets = Vec::new();
        for node in plan.nodes() {
            let found = registry.resolve(node)?;
            merge_datasets(&mut datasets, found);
        }
        Ok(datasets)
    }
}

impl Default for PlanExtractor {
    fn default() -> Self {
        Self::standard()
    }
}
