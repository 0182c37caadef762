//! Lineage agent: extracts the datasets a query reads and writes from the host
//! engine's plan tree and reports them to a lineage backend as run events.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod listener;
pub mod plan;
pub mod plan_utils;
pub mod visitors;

pub use client::{EmitHandle, LineageClient, ResponseMessage};
pub use config::{EmitterConfig, RunConfig};
pub use context::LineageContext;
pub use error::{AnalysisError, ConfigError, ExtractionError, LineageHttpError};
pub use extractor::{PlanExtractor, PlanLineage};
pub use listener::{JobResult, LineageListener};
pub use plan::LogicalPlan;
pub use visitors::{QueryPlanVisitor, VisitorRegistry};
