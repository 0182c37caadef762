//! Ordered registry of plan visitors

use super::QueryPlanVisitor;
use crate::error::ExtractionError;
use crate::plan::LogicalPlan;
use lineage_types::Dataset;
use std::sync::Arc;

/// Registry that dispatches a plan node to the first visitor that handles it.
///
/// Registration order is precedence order. After construction the registry is
/// only read, so one instance can serve concurrent traversals and visitors
/// can call back into it for nested nodes.
pub struct VisitorRegistry {
    visitors: Vec<Arc<dyn QueryPlanVisitor>>,
}

impl VisitorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Append a visitor. It takes precedence below every visitor registered before it.
    pub fn register(&mut self, visitor: Arc<dyn QueryPlanVisitor>) {
        log::debug!(
            "[VISITORS] Registered visitor '{}' at position {}",
            visitor.name(),
            self.visitors.len()
        );
        self.visitors.push(visitor);
    }

    /// Datasets described by `plan`, according to the first visitor that handles it.
    ///
    /// Unrecognized nodes are not an error; they simply yield no datasets.
    pub fn resolve(&self, plan: &LogicalPlan) -> Result<Vec<Dataset>, ExtractionError> {
        apply_first(&self.visitors, plan)
    }

    /// Get the number of registered visitors
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Visitor names in precedence order
    pub fn names(&self) -> Vec<&str> {
        self.visitors.iter().map(|v| v.name()).collect()
    }
}

impl Default for VisitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the first visitor defined at `plan`; an empty list when none is.
pub fn apply_first(
    visitors: &[Arc<dyn QueryPlanVisitor>],
    plan: &LogicalPlan,
) -> Result<Vec<Dataset>, ExtractionError> {
    match visitors.iter().find(|v| v.is_defined_at(plan)) {
        Some(visitor) => {
            log::debug!(
                "[VISITORS] '{}' handles {}",
                visitor.name(),
                plan.node_name()
            );
            visitor.apply(plan)
        }
        None => Ok(Vec::new()),
    }
}
