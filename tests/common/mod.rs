#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    pub fn write_graph(&self, name: &str, doc: &Value) -> String {
        let path = self.path(name);
        fs::write(
            &path,
            serde_json::to_string_pretty(doc).expect("serialize graph"),
        )
        .expect("write graph");
        path.to_str().expect("graph path utf8").to_string()
    }

    pub fn write_raw(&self, name: &str, raw: &str) -> String {
        let path = self.path(name);
        fs::write(&path, raw).expect("write file");
        path.to_str().expect("path utf8").to_string()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("reflow");
        cmd.env_remove("REFLOW_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_err(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json error envelope")
    }

    /// Before/after pair where a new node `w` pushes into a weak triangle.
    pub fn keystone_pair(&self) -> (String, String) {
        let a = self.write_graph("before.json", &weak_triangle());
        let c = self.write_graph("after.json", &keystone_arrival());
        (a, c)
    }
}

pub fn weak_triangle() -> Value {
    let mut edges = Vec::new();
    for s in ["x", "y", "z"] {
        for t in ["x", "y", "z"] {
            if s != t {
                edges.push(json!({"source": s, "target": t, "weight": 0.2}));
            }
        }
    }
    json!({
        "nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}],
        "edges": edges
    })
}

/// Directed ring `n0 -> n1 -> ... -> n0` with uniform weight.
pub fn ring(n: usize, weight: f64) -> Value {
    let nodes: Vec<Value> = (0..n).map(|i| json!({"id": format!("n{}", i)})).collect();
    let edges: Vec<Value> = (0..n)
        .map(|i| json!({"source": format!("n{}", i), "target": format!("n{}", (i + 1) % n), "weight": weight}))
        .collect();
    json!({"nodes": nodes, "edges": edges})
}

pub fn keystone_arrival() -> Value {
    json!({
        "nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}, {"id": "w", "type": "predator"}],
        "edges": [
            {"source": "w", "target": "x", "weight": 0.9},
            {"source": "w", "target": "y", "weight": 0.9}
        ]
    })
}
