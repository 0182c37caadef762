mod common;

use common::{init_logging, logged, Collector};
use lineage_agent::{JobResult, LineageContext, LineageListener, LogicalPlan, PlanExtractor, RunConfig};
use log::Level;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

const PLAN: &str = include_str!("../../demos/insert_csv_into_table.json");

fn listener(host: &str, parent_run_id: Option<&str>) -> LineageListener {
    let config = RunConfig {
        host: host.to_string(),
        namespace: "warehouse".to_string(),
        job_name: "load_people".to_string(),
        parent_run_id: parent_run_id.map(str::to_string),
        ..RunConfig::default()
    };
    let context = LineageContext::new(&config).unwrap();
    LineageListener::new(Arc::new(context), PlanExtractor::standard())
}

/// Round-trip the dump through a file the way the binary loads it.
fn load_plan() -> LogicalPlan {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PLAN.as_bytes()).unwrap();
    let raw = std::fs::read_to_string(file.path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn field_names(dataset: &Value) -> Vec<&str> {
    dataset["facets"]["schema"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect()
}

#[test]
fn test_insert_csv_into_table_emits_start_and_complete() {
    init_logging();
    let collector = Collector::start(200, "");
    let listener = listener(&collector.host(), None);
    let plan = load_plan();

    listener.on_job_start(42, &plan).unwrap().wait();
    listener.on_job_end(42, &plan, &JobResult::Succeeded).unwrap().wait();
    listener.on_application_end();

    let mut events: Vec<Value> = collector.received().into_iter().map(|r| r.body).collect();
    assert_eq!(events.len(), 2);
    events.sort_by_key(|e| e["eventType"] != "START");
    let (start, complete) = (&events[0], &events[1]);

    assert_eq!(start["eventType"], "START");
    assert_eq!(complete["eventType"], "COMPLETE");
    assert_eq!(start["run"]["runId"], complete["run"]["runId"]);
    assert!(start["run"]["facets"].get("parent").is_none());

    for event in [start, complete] {
        assert_eq!(event["job"]["namespace"], "warehouse");
        assert_eq!(event["job"]["name"], "load_people");

        let inputs = event["inputs"].as_array().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0]["namespace"], "file");
        assert_eq!(inputs[0]["name"], "/data/people.csv");
        assert_eq!(field_names(&inputs[0]), ["name", "age"]);

        let outputs = event["outputs"].as_array().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0]["namespace"], "file");
        assert_eq!(outputs[0]["name"], "/warehouse/people");
        assert_eq!(field_names(&outputs[0]), ["name", "age"]);
        assert_eq!(outputs[0]["facets"]["dataSource"]["uri"], "file://");
    }
    assert!(listener.context().client().is_closed());
}

#[test]
fn test_failed_job_reports_error_and_parent() {
    init_logging();
    let collector = Collector::start(200, "");
    let parent = "ea445b5c-22eb-457a-8007-01c7c52b6e54";
    let listener = listener(&collector.host(), Some(parent));
    let plan = load_plan();

    let outcome = listener
        .on_job_end(9, &plan, &JobResult::Failed("executor lost".to_string()))
        .unwrap()
        .wait();
    assert!(matches!(outcome, Some(Ok(_))));
    listener.on_application_end();

    let received = collector.received();
    assert_eq!(received.len(), 1);
    let facets = &received[0].body["run"]["facets"];
    assert_eq!(received[0].body["eventType"], "FAIL");
    assert_eq!(facets["errorMessage"]["message"], "executor lost");
    assert_eq!(facets["parent"]["run"]["runId"], parent);
    assert_eq!(facets["parent"]["job"]["name"], "load_people");
}

#[test]
fn test_unresolvable_target_skips_event() {
    init_logging();
    let collector = Collector::start(200, "");
    let listener = listener(&collector.host(), None);
    let mut dump: Value = serde_json::from_str(PLAN).unwrap();
    dump["table"]["identifier"]["table"] = Value::from("");
    dump["table"]["identifier"]["database"] = Value::Null;
    dump["table"]["storage"] = serde_json::json!({});
    let plan: LogicalPlan = serde_json::from_value(dump).unwrap();

    assert!(listener.on_job_start(5, &plan).is_none());
    listener.on_application_end();

    assert!(collector.received().is_empty());
    assert!(logged(Level::Error, &["Skipping START event"]));
}
