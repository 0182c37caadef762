//! Lineage agent replay binary.
//!
//! Loads a JSON plan dump, then replays a job start and a successful job end
//! through the listener, posting both events to the configured backend.
//!
//! Usage: lineage-agent <plan.json>

use lineage_agent::{
    EmitterConfig, JobResult, LineageContext, LineageListener, LogicalPlan, PlanExtractor,
    RunConfig,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let Some(plan_path) = std::env::args().nth(1) else {
        eprintln!("usage: lineage-agent <plan.json>");
        return ExitCode::from(2);
    };

    let config = match RunConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Invalid lineage configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let plan: LogicalPlan = match std::fs::read_to_string(&plan_path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
    {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to load plan from {}: {}", plan_path, e);
            return ExitCode::FAILURE;
        }
    };

    let context = match LineageContext::with_emitter(&config, &EmitterConfig::from_env()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create lineage context: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let listener = LineageListener::new(Arc::new(context), PlanExtractor::standard());

    // outcomes are already logged by the context; wait so the process does not exit mid-post
    for handle in [
        listener.on_job_start(0, &plan),
        listener.on_job_end(0, &plan, &JobResult::Succeeded),
    ]
    .into_iter()
    .flatten()
    {
        handle.wait();
    }

    listener.on_application_end();
    ExitCode::SUCCESS
}
