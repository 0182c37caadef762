//! Host-facing lifecycle callbacks.
//!
//! The host calls these synchronously on its own thread. Plan extraction runs
//! inline (the plan is only valid for the duration of the callback); the post
//! to the backend is handed to the context's worker pool.

use crate::client::EmitHandle;
use crate::context::LineageContext;
use crate::extractor::PlanExtractor;
use crate::plan::LogicalPlan;
use lineage_types::EventType;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome the host reports when a job ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Succeeded,
    Failed(String),
}

pub struct LineageListener {
    context: Arc<LineageContext>,
    extractor: PlanExtractor,
    /// Run id per host execution id, from start until end
    runs: Mutex<HashMap<u64, Uuid>>,
}

impl LineageListener {
    pub fn new(context: Arc<LineageContext>, extractor: PlanExtractor) -> Self {
        Self {
            context,
            extractor,
            runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &LineageContext {
        &self.context
    }

    /// Emit a START event for a new execution.
    pub fn on_job_start(&self, execution_id: u64, plan: &LogicalPlan) -> Option<EmitHandle> {
        let run_id = *self
            .runs
            .lock()
            .entry(execution_id)
            .or_insert_with(Uuid::new_v4);
        self.emit_for(EventType::Start, run_id, plan, None)
    }

    /// Emit COMPLETE or FAIL for an execution and forget its run.
    ///
    /// An end without a matching start still gets a fresh run id.
    pub fn on_job_end(&self, execution_id: u64, plan: &LogicalPlan, result: &JobResult) -> Option<EmitHandle> {
        let run_id = self
            .runs
            .lock()
            .remove(&execution_id)
            .unwrap_or_else(Uuid::new_v4);

        match result {
            JobResult::Succeeded => self.emit_for(EventType::Complete, run_id, plan, None),
            JobResult::Failed(message) => self.emit_for(EventType::Fail, run_id, plan, Some(message.as_str())),
        }
    }

    /// The host application is shutting down.
    pub fn on_application_end(&self) {
        let pending = self.runs.lock().len();
        if pending > 0 {
            log::warn!("[LINEAGE] Application ended with {} runs still open", pending);
        }
        self.context.close();
    }

    /// Run id assigned to an execution that has started but not ended.
    pub fn run_id(&self, execution_id: u64) -> Option<Uuid> {
        self.runs.lock().get(&execution_id).copied()
    }

    pub fn active_runs(&self) -> usize {
        self.runs.lock().len()
    }

    fn emit_for(
        &self,
        event_type: EventType,
        run_id: Uuid,
        plan: &LogicalPlan,
        error: Option<&str>,
    ) -> Option<EmitHandle> {
        let lineage = match self.extractor.extract(plan) {
            Ok(lineage) => lineage,
            Err(e) => {
                // a wrong dataset identity is worse than none: skip the event
                log::error!(
                    "[LINEAGE] Skipping {} event for run {}: {}",
                    event_type.as_str(),
                    run_id,
                    e
                );
                return None;
            }
        };

        let event = self.context.build_event(event_type, run_id, lineage, error);
        self.context.emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::plan::fixtures::file_scan;
    use crate::plan::{CatalogTable, InsertIntoHiveTable, StructType};

    fn listener() -> LineageListener {
        let config = RunConfig {
            // nothing listens here; posts fail in the background and are only logged
            host: "http://127.0.0.1:1".to_string(),
            ..RunConfig::default()
        };
        let context = LineageContext::new(&config).unwrap();
        LineageListener::new(Arc::new(context), PlanExtractor::standard())
    }

    #[test]
    fn test_run_id_tracked_between_start_and_end() {
        let listener = listener();
        let plan = file_scan("/in.csv", "csv", &[]);

        assert!(listener.on_job_start(7, &plan).is_some());
        let run_id = listener.run_id(7).unwrap();
        assert!(listener.on_job_start(7, &plan).is_some());
        assert_eq!(listener.run_id(7), Some(run_id));
        assert_eq!(listener.active_runs(), 1);

        assert!(listener.on_job_end(7, &plan, &JobResult::Succeeded).is_some());
        assert_eq!(listener.active_runs(), 0);
        listener.on_application_end();
    }

    #[test]
    fn test_extraction_failure_skips_event() {
        let listener = listener();
        let plan = LogicalPlan::InsertIntoHiveTable(InsertIntoHiveTable {
            table: CatalogTable::new(None, "", None, StructType::empty()),
            query: Box::new(file_scan("/in.csv", "csv", &[])),
            overwrite: false,
        });

        assert!(listener.on_job_start(1, &plan).is_none());
        assert!(listener
            .on_job_end(1, &plan, &JobResult::Failed("boom".into()))
            .is_none());
        listener.on_application_end();
    }

    #[test]
    fn test_transport_failure_never_reaches_caller() {
        let listener = listener();
        let handle = listener.on_job_start(3, &file_scan("/in.csv", "csv", &[])).unwrap();
        assert!(matches!(handle.wait(), Some(Err(_))));
        listener.on_application_end();
        assert!(listener.context().client().is_closed());
    }
}
