//! Shared types for the lineage agent and anything that consumes its events.
//!
//! These mirror the OpenLineage wire format: a `RunEvent` carries a `Run`, a
//! `Job` and the input/output `Dataset`s discovered for that run. Datasets and
//! runs carry open, versioned `Facet`s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Base URL of the OpenLineage JSON schema that facet `_schemaURL`s point into.
pub const OPENLINEAGE_SPEC_URL: &str = "https://openlineage.io/spec/1-0-0/OpenLineage.json";

// =====================================================
// Facets
// =====================================================

/// An open metadata fragment attached to a dataset or run.
///
/// Facets are plain JSON objects. By convention every facet carries a
/// `_producer` and a `_schemaURL` key next to its own fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facet(Map<String, Value>);

pub type DatasetFacet = Facet;
pub type RunFacet = Facet;

/// Facet name -> facet body
pub type FacetMap = BTreeMap<String, Facet>;

impl Facet {
    /// Create an empty facet stamped with its producer and schema location.
    pub fn new(producer: &str, schema_url: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("_producer".to_string(), Value::String(producer.to_string()));
        fields.insert("_schemaURL".to_string(), Value::String(schema_url.to_string()));
        Facet(fields)
    }

    /// Add or replace a field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn producer(&self) -> Option<&str> {
        self.0.get("_producer").and_then(|v| v.as_str())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Merge another facet body into a copy of this one (see [`merge_values`]).
    pub fn merged_with(&self, incoming: &Facet) -> Facet {
        Facet(merge_values(&self.0, &incoming.0))
    }
}

impl From<Map<String, Value>> for Facet {
    fn from(map: Map<String, Value>) -> Self {
        Facet(map)
    }
}

/// Merge two JSON objects into a new one.
///
/// The result holds the union of keys. On collision the incoming value wins,
/// except when both sides are objects: those are merged key by key, recursively.
/// Neither input is modified and merging a map into itself yields the same map.
pub fn merge_values(existing: &Map<String, Value>, incoming: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = existing.clone();
    for (key, value) in incoming {
        let combined = match (merged.get(key), value) {
            (Some(Value::Object(old)), Value::Object(new)) => Value::Object(merge_values(old, new)),
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

/// Merge two facet maps into a new one.
///
/// Facets present on only one side are kept. A facet present on both sides is
/// merged field by field with [`merge_values`].
pub fn merge_facets(existing: &FacetMap, incoming: &FacetMap) -> FacetMap {
    let mut merged = existing.clone();
    for (name, facet) in incoming {
        let combined = match merged.get(name) {
            Some(old) => old.merged_with(facet),
            None => facet.clone(),
        };
        merged.insert(name.clone(), combined);
    }
    merged
}

// =====================================================
// Typed facet builders
// =====================================================

/// One column of a dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

fn schema_url(definition: &str) -> String {
    format!("{}#/definitions/{}", OPENLINEAGE_SPEC_URL, definition)
}

/// `schema` dataset facet
pub fn schema_facet(producer: &str, fields: &[SchemaField]) -> DatasetFacet {
    let fields: Vec<Value> = fields
        .iter()
        .map(|f| serde_json::json!({ "name": f.name, "type": f.field_type }))
        .collect();
    Facet::new(producer, &schema_url("SchemaDatasetFacet")).with("fields", Value::Array(fields))
}

/// `dataSource` dataset facet
pub fn datasource_facet(producer: &str, name: &str, uri: &str) -> DatasetFacet {
    Facet::new(producer, &schema_url("DatasourceDatasetFacet"))
        .with("name", name)
        .with("uri", uri)
}

/// `outputStatistics` dataset facet
pub fn output_statistics_facet(producer: &str, row_count: i64, size: Option<i64>) -> DatasetFacet {
    let facet = Facet::new(producer, &schema_url("OutputStatisticsOutputDatasetFacet"))
        .with("rowCount", row_count);
    match size {
        Some(bytes) => facet.with("size", bytes),
        None => facet,
    }
}

/// `parent` run facet linking a run to the run that spawned it.
pub fn parent_run_facet(producer: &str, parent_run_id: Uuid, namespace: &str, job_name: &str) -> RunFacet {
    Facet::new(producer, &schema_url("ParentRunFacet"))
        .with("run", serde_json::json!({ "runId": parent_run_id.to_string() }))
        .with("job", serde_json::json!({ "namespace": namespace, "name": job_name }))
}

/// `errorMessage` run facet
pub fn error_message_facet(producer: &str, message: &str, stack_trace: Option<&str>) -> RunFacet {
    let facet = Facet::new(producer, &schema_url("ErrorMessageRunFacet"))
        .with("message", message)
        .with("programmingLanguage", "rust");
    match stack_trace {
        Some(trace) => facet.with("stackTrace", trace),
        None => facet,
    }
}

// =====================================================
// Domain Types
// =====================================================

/// A data resource read or written by a run.
///
/// The identity (`namespace`, `name`) is fixed at construction. Only the facet
/// map may change afterwards, and only by growing through a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    namespace: String,
    name: String,
    #[serde(default)]
    facets: FacetMap,
}

impl Dataset {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            facets: FacetMap::new(),
        }
    }

    /// Attach a facet while the dataset is being built.
    pub fn with_facet(mut self, name: &str, facet: DatasetFacet) -> Self {
        let mut incoming = FacetMap::new();
        incoming.insert(name.to_string(), facet);
        self.merge_facets(&incoming);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facets(&self) -> &FacetMap {
        &self.facets
    }

    pub fn facet(&self, name: &str) -> Option<&DatasetFacet> {
        self.facets.get(name)
    }

    /// Whether both datasets describe the same resource.
    pub fn same_identity(&self, other: &Dataset) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }

    /// Merge facets into this dataset without dropping any existing entry.
    pub fn merge_facets(&mut self, incoming: &FacetMap) {
        self.facets = merge_facets(&self.facets, incoming);
    }
}

/// The unit of work a run belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub namespace: String,
    pub name: String,
}

impl Job {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// A single execution of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    run_id: Uuid,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    facets: FacetMap,
}

impl Run {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            facets: FacetMap::new(),
        }
    }

    pub fn with_facet(mut self, name: &str, facet: RunFacet) -> Self {
        let mut incoming = FacetMap::new();
        incoming.insert(name.to_string(), facet);
        self.facets = merge_facets(&self.facets, &incoming);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn facets(&self) -> &FacetMap {
        &self.facets
    }
}

/// Lifecycle point a run event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Start,
    Complete,
    Fail,
    Abort,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Start => "START",
            EventType::Complete => "COMPLETE",
            EventType::Fail => "FAIL",
            EventType::Abort => "ABORT",
            EventType::Other => "OTHER",
        }
    }
}

/// The event posted to the lineage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub event_type: EventType,
    pub event_time: DateTime<Utc>,
    pub run: Run,
    pub job: Job,
    pub inputs: Vec<Dataset>,
    pub outputs: Vec<Dataset>,
    pub producer: String,
}

impl RunEvent {
    /// Create an event stamped with the current time and no datasets.
    pub fn new(event_type: EventType, run: Run, job: Job, producer: impl Into<String>) -> Self {
        Self {
            event_type,
            event_time: Utc::now(),
            run,
            job,
            inputs: Vec::new(),
            outputs: Vec::new(),
            producer: producer.into(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Dataset>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Dataset>) -> Self {
        self.outputs = outputs;
        self
    }
}
