//! HTTP client that delivers run events to the lineage backend.
//!
//! Posts run on a small dedicated tokio runtime so the host's callback thread
//! never waits on the network. Each post is independent: there is no ordering
//! between in-flight posts and no retry.

use crate::config::EmitterConfig;
use crate::error::{ConfigError, LineageHttpError};
use lineage_types::RunEvent;
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use url::Url;

/// How long `close` waits for in-flight posts when called outside async code.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Backend answer to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    pub status: u16,
    pub body: String,
}

impl ResponseMessage {
    pub fn completed_successfully(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The backend's error body for unsuccessful responses.
    pub fn error(&self) -> Option<&str> {
        if self.completed_successfully() {
            None
        } else {
            Some(&self.body)
        }
    }
}

impl fmt::Display for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "[HTTP {}]", self.status)
        } else {
            write!(f, "[HTTP {}] {}", self.status, self.body)
        }
    }
}

pub type PostResult = Result<ResponseMessage, LineageHttpError>;

/// Completion signal for a submitted post.
///
/// Production callers drop it; tests use it to wait for the outcome.
pub struct EmitHandle {
    rx: oneshot::Receiver<PostResult>,
}

impl EmitHandle {
    fn ready(result: PostResult) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block until the post finishes. `None` if the client shut down first.
    ///
    /// Must not be called from async code; use [`EmitHandle::outcome`] there.
    pub fn wait(self) -> Option<PostResult> {
        self.rx.blocking_recv().ok()
    }

    pub async fn outcome(self) -> Option<PostResult> {
        self.rx.await.ok()
    }
}

pub struct LineageClient {
    http: Client,
    api_key: Option<String>,
    runtime: Mutex<Option<Runtime>>,
}

impl LineageClient {
    pub fn new(api_key: Option<String>, config: &EmitterConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .pool_max_idle_per_host(config.worker_threads)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::ClientInit(e.to_string()))?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("lineage-emitter")
            .enable_all()
            .build()
            .map_err(|e| ConfigError::ClientInit(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Serialize and post an event, waiting for the backend's answer.
    ///
    /// Non-2xx answers are returned as an unsuccessful `ResponseMessage`; only
    /// serialization and transport faults are errors.
    pub async fn post(&self, uri: &Url, event: &RunEvent) -> PostResult {
        let payload = serde_json::to_string(event)?;
        send(&self.http, self.api_key.as_deref(), uri.clone(), payload).await
    }

    /// Post an event on the worker pool without waiting.
    pub fn submit<F>(&self, uri: Url, event: &RunEvent, on_complete: F) -> EmitHandle
    where
        F: FnOnce(&PostResult) + Send + 'static,
    {
        match serde_json::to_string(event) {
            Ok(payload) => self.submit_payload(uri, payload, on_complete),
            Err(e) => {
                let result = Err(LineageHttpError::from(e));
                on_complete(&result);
                EmitHandle::ready(result)
            }
        }
    }

    /// Post an already-serialized event on the worker pool without waiting.
    ///
    /// `on_complete` runs on a pool thread once the post finishes, or
    /// immediately if the client is closed.
    pub fn submit_payload<F>(&self, uri: Url, payload: String, on_complete: F) -> EmitHandle
    where
        F: FnOnce(&PostResult) + Send + 'static,
    {
        let guard = self.runtime.lock();
        let Some(runtime) = guard.as_ref() else {
            log::warn!("[LINEAGE_CLIENT] Client closed, not posting to {}", uri);
            let result = Err(LineageHttpError::Closed);
            on_complete(&result);
            return EmitHandle::ready(result);
        };

        let (tx, rx) = oneshot::channel();
        let http = self.http.clone();
        let api_key = self.api_key.clone();
        runtime.spawn(async move {
            let result = send(&http, api_key.as_deref(), uri, payload).await;
            on_complete(&result);
            let _ = tx.send(result);
        });
        EmitHandle { rx }
    }

    pub fn is_closed(&self) -> bool {
        self.runtime.lock().is_none()
    }

    /// Shut down the worker pool. Safe to call more than once.
    pub fn close(&self) {
        let Some(runtime) = self.runtime.lock().take() else {
            return;
        };
        // blocking on shutdown is not allowed from inside another runtime
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            runtime.shutdown_timeout(CLOSE_GRACE);
        }
        log::debug!("[LINEAGE_CLIENT] Worker pool shut down");
    }
}

impl Drop for LineageClient {
    fn drop(&mut self) {
        self.close();
    }
}

async fn send(http: &Client, api_key: Option<&str>, uri: Url, payload: String) -> PostResult {
    let mut request = http
        .post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(payload);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(ResponseMessage { status, body })
}
