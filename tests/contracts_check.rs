mod common;

use common::TestEnv;
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).expect("read schema");
    serde_json::from_str(&raw).expect("schema json")
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let msgs: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", msgs.join(" | "));
}

#[test]
fn single_layer_report_matches_contract() {
    let env = TestEnv::new();
    let (a, c) = env.keystone_pair();
    let report = env.run_json(&[&a, &c]);
    validate("analysis.schema.json", &report);
}

#[test]
fn multilayer_report_matches_contract() {
    let env = TestEnv::new();
    let (a, c) = env.keystone_pair();
    let report = env.run_json(&[&a, &c, "--multilayer"]);
    validate("analysis.schema.json", &report);
}

#[test]
fn unreliable_report_matches_contract() {
    let env = TestEnv::new();
    let a = env.write_graph(
        "bare.json",
        &json!({"nodes": [{"id": "x"}, {"id": "y"}], "edges": []}),
    );
    let c = env.write_graph(
        "wired.json",
        &json!({
            "nodes": [{"id": "x"}, {"id": "y"}],
            "edges": [{"source": "x", "target": "y"}]
        }),
    );
    let report = env.run_json(&[&a, &c]);
    assert_eq!(report["hypotheses"][0]["id"], "no_reliable_explanation");
    assert!(!report["diagnostics"].as_array().expect("diagnostics").is_empty());
    validate("analysis.schema.json", &report);
}

#[test]
fn error_envelope_matches_contract() {
    let env = TestEnv::new();
    let (a, _) = env.keystone_pair();
    let missing = env.path("missing.json");
    let err = env.run_json_err(&[&a, missing.to_str().expect("utf8")]);
    validate("error.schema.json", &err);
}
