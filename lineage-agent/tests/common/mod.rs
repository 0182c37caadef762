//! Shared harness: an in-process lineage collector and a capturing logger.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

/// One request seen by the collector
#[derive(Debug, Clone)]
pub struct Received {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct CollectorState {
    status: StatusCode,
    reply: String,
    received: Arc<Mutex<Vec<Received>>>,
}

/// Lineage backend stand-in answering every POST to `/api/v1/lineage` with a fixed reply.
pub struct Collector {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Collector {
    pub fn start(status: u16, reply: &str) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = CollectorState {
            status: StatusCode::from_u16(status).expect("valid status"),
            reply: reply.to_string(),
            received: Arc::clone(&received),
        };

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("collector runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind collector");
                tx.send(listener.local_addr().expect("local addr")).expect("send addr");
                let app = Router::new()
                    .route("/api/v1/lineage", post(record))
                    .with_state(state);
                axum::serve(listener, app).await.expect("collector server");
            });
        });

        let addr = rx.recv().expect("collector address");
        Self { addr, received }
    }

    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<CollectorState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.received.lock().unwrap().push(Received { authorization, body });
    (state.status, state.reply.clone())
}

static RECORDS: Lazy<Mutex<Vec<(log::Level, String)>>> = Lazy::new(|| Mutex::new(Vec::new()));

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Debug);
    });
}

/// Whether a record at `level` contains every needle.
pub fn logged(level: log::Level, needles: &[&str]) -> bool {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .any(|(l, msg)| *l == level && needles.iter().all(|n| msg.contains(n)))
}
