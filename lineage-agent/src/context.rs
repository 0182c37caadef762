//! Run-scoped state for one job submission: the backend URI, the job identity
//! and the emission client. Turns extracted lineage into run events and sends
//! them, absorbing every delivery failure into the log.

use crate::client::{EmitHandle, LineageClient};
use crate::config::{EmitterConfig, RunConfig};
use crate::error::ConfigError;
use crate::extractor::PlanLineage;
use crate::plan_utils::PRODUCER;
use lineage_types::{error_message_facet, parent_run_facet, EventType, Job, Run, RunEvent};
use url::Url;
use uuid::Uuid;

pub struct LineageContext {
    client: LineageClient,
    lineage_uri: Url,
    job_namespace: String,
    parent_job_name: String,
    parent_run_id: Option<Uuid>,
}

impl LineageContext {
    pub fn new(config: &RunConfig) -> Result<Self, ConfigError> {
        Self::with_emitter(config, &EmitterConfig::default())
    }

    /// Fails only when the backend URI cannot be built. A malformed parent
    /// run id is treated as no parent.
    pub fn with_emitter(config: &RunConfig, emitter: &EmitterConfig) -> Result<Self, ConfigError> {
        let lineage_uri = lineage_uri(&config.host, &config.version)?;
        let client = LineageClient::new(config.api_key.clone(), emitter)?;
        let parent_run_id = convert_to_uuid(config.parent_run_id.as_deref());

        log::info!(
            "[LINEAGE] Init LineageContext: {} URI: {}",
            config,
            lineage_uri
        );

        Ok(Self {
            client,
            lineage_uri,
            job_namespace: config.namespace.clone(),
            parent_job_name: config.job_name.clone(),
            parent_run_id,
        })
    }

    pub fn lineage_uri(&self) -> &Url {
        &self.lineage_uri
    }

    pub fn job_namespace(&self) -> &str {
        &self.job_namespace
    }

    pub fn parent_job_name(&self) -> &str {
        &self.parent_job_name
    }

    pub fn parent_run_id(&self) -> Option<Uuid> {
        self.parent_run_id
    }

    pub fn client(&self) -> &LineageClient {
        &self.client
    }

    /// Assemble a run event for this job.
    ///
    /// The run links to the configured parent run when there is one, and a
    /// failed run carries an `errorMessage` facet.
    pub fn build_event(
        &self,
        event_type: EventType,
        run_id: Uuid,
        lineage: PlanLineage,
        error: Option<&str>,
    ) -> RunEvent {
        let mut run = Run::new(run_id);
        if let Some(parent) = self.parent_run_id {
            run = run.with_facet(
                "parent",
                parent_run_facet(PRODUCER, parent, &self.job_namespace, &self.parent_job_name),
            );
        }
        if let Some(message) = error {
            run = run.with_facet("errorMessage", error_message_facet(PRODUCER, message, None));
        }

        RunEvent::new(
            event_type,
            run,
            Job::new(self.job_namespace.clone(), self.parent_job_name.clone()),
            PRODUCER,
        )
        .with_inputs(lineage.inputs)
        .with_outputs(lineage.outputs)
    }

    /// Send an event in the background. Never fails.
    ///
    /// Serialization failures are logged and the event is dropped. Backend
    /// rejections and transport faults are logged, with the full payload, when
    /// the post completes. The handle is only needed to observe completion.
    pub fn emit(&self, event: RunEvent) -> Option<EmitHandle> {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("[LINEAGE] Could not serialize lineage event: {}", e);
                return None;
            }
        };

        log::debug!(
            "[LINEAGE] Posting {} event for run {}",
            event.event_type.as_str(),
            event.run.run_id()
        );

        let logged = payload.clone();
        Some(self.client.submit_payload(
            self.lineage_uri.clone(),
            payload,
            move |result| match result {
                Ok(resp) if resp.completed_successfully() => {
                    log::info!("[LINEAGE] Lineage completed successfully: {} {}", resp, logged);
                }
                Ok(resp) => {
                    log::error!("[LINEAGE] Could not emit lineage: {} ({})", logged, resp);
                }
                Err(e) => {
                    log::error!("[LINEAGE] Could not emit lineage w/ exception: {} ({})", logged, e);
                }
            },
        ))
    }

    /// Release the emission client. Safe to call more than once.
    pub fn close(&self) {
        self.client.close();
    }
}

fn lineage_uri(host: &str, version: &str) -> Result<Url, ConfigError> {
    let raw = format!("{}/api/{}/lineage", host.trim_end_matches('/'), version);
    let invalid = |reason: String| ConfigError::InvalidUri {
        uri: raw.clone(),
        reason,
    };

    let uri = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
    if uri.cannot_be_a_base() || uri.host_str().is_none_or(str::is_empty) {
        return Err(invalid("host is not a valid URI authority".to_string()));
    }
    Ok(uri)
}

fn convert_to_uuid(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(e) => {
            log::debug!("[LINEAGE] Ignoring parent run id '{}': {}", raw, e);
            None
        }
    }
}
