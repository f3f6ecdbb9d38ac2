//! Graph loader and format normalizer.
//!
//! Three producer tools write slightly different graph JSON. `detect_format`
//! tags the top-level shape, `NORMALIZERS` maps the tag to a function that
//! locates the node/edge arrays, and `build_graph` applies one fixed alias
//! order to every node and edge so the result does not depend on which
//! producer wrote the file.

use crate::domain::error::InferenceError;
use crate::domain::models::{CanonicalGraph, Edge, GraphFormat, Node};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const NODE_ID_KEYS: &[&str] = &["node_id", "id", "component_id"];
const NODE_LABEL_KEYS: &[&str] = &["node_name", "name", "label"];
const NODE_TYPE_KEYS: &[&str] = &["type", "node_type"];
const NODE_TIER_KEYS: &[&str] = &["tier", "level"];
const EDGE_SOURCE_KEYS: &[&str] = &["source", "from"];
const EDGE_TARGET_KEYS: &[&str] = &["target", "to"];
const EDGE_WEIGHT_KEYS: &[&str] = &["weight", "strength"];
const EDGE_TYPE_KEYS: &[&str] = &["type", "edge_type", "relationship"];
const EDGE_LIST_KEYS: &[&str] = &["edges", "links"];

/// Node/edge arrays plus metadata, located but not yet normalized.
struct GraphParts<'a> {
    nodes: &'a [Value],
    edges: &'a [Value],
    metadata: Option<&'a Value>,
}

type Normalizer = for<'a> fn(&'a Value) -> Option<GraphParts<'a>>;

const NORMALIZERS: &[(GraphFormat, Normalizer)] = &[
    (GraphFormat::Wrapper, wrapper_parts),
    (GraphFormat::Ecosystem, ecosystem_parts),
    (GraphFormat::Direct, direct_parts),
    (GraphFormat::Architecture, architecture_parts),
];

pub fn detect_format(doc: &Value) -> GraphFormat {
    let Some(obj) = doc.as_object() else {
        return GraphFormat::Unknown;
    };
    if obj
        .get("system_of_systems_graph")
        .map(Value::is_object)
        .unwrap_or(false)
    {
        GraphFormat::Wrapper
    } else if obj.get("graph").map(Value::is_object).unwrap_or(false) {
        GraphFormat::Ecosystem
    } else if obj.get("nodes").map(Value::is_array).unwrap_or(false) {
        GraphFormat::Direct
    } else if obj.get("components").map(Value::is_array).unwrap_or(false) {
        GraphFormat::Architecture
    } else {
        GraphFormat::Unknown
    }
}

pub fn load_graph(path: &Path) -> Result<CanonicalGraph, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::FileNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&raw).map_err(|source| InferenceError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "graph".to_string());
    normalize(&doc, &stem).ok_or_else(|| InferenceError::UnknownGraphFormat {
        path: path.to_path_buf(),
    })
}

/// Normalizes an already-parsed document; `None` means the shape is unknown.
pub fn normalize(doc: &Value, fallback_name: &str) -> Option<CanonicalGraph> {
    let format = detect_format(doc);
    let (_, normalizer) = NORMALIZERS.iter().find(|(tag, _)| *tag == format)?;
    let parts = normalizer(doc)?;
    let graph = build_graph(format, parts, fallback_name);
    debug!(
        graph = %graph.name,
        format = ?graph.format,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "graph loaded"
    );
    Some(graph)
}

fn array_of<'a>(v: &'a Value, key: &str) -> Option<&'a [Value]> {
    v.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn edge_list(v: &Value) -> &[Value] {
    EDGE_LIST_KEYS
        .iter()
        .find_map(|k| array_of(v, k))
        .unwrap_or(&[])
}

fn wrapper_parts(doc: &Value) -> Option<GraphParts<'_>> {
    let inner = doc.get("system_of_systems_graph")?;
    Some(GraphParts {
        nodes: array_of(inner, "nodes")?,
        edges: edge_list(inner),
        metadata: inner.get("metadata").or_else(|| doc.get("metadata")),
    })
}

fn ecosystem_parts(doc: &Value) -> Option<GraphParts<'_>> {
    let inner = doc.get("graph")?;
    Some(GraphParts {
        nodes: array_of(inner, "nodes")?,
        edges: edge_list(inner),
        metadata: doc.get("metadata"),
    })
}

fn direct_parts(doc: &Value) -> Option<GraphParts<'_>> {
    Some(GraphParts {
        nodes: array_of(doc, "nodes")?,
        edges: edge_list(doc),
        metadata: doc
            .get("metadata")
            .or_else(|| doc.get("architecture_metadata")),
    })
}

fn architecture_parts(doc: &Value) -> Option<GraphParts<'_>> {
    Some(GraphParts {
        nodes: array_of(doc, "components")?,
        edges: edge_list(doc),
        metadata: doc
            .get("architecture_metadata")
            .or_else(|| doc.get("metadata")),
    })
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| v.get(*k).and_then(scalar_string))
}

fn edge_weight(edge: &Value, graph: &str) -> f64 {
    let Some(raw) = EDGE_WEIGHT_KEYS.iter().find_map(|k| edge.get(*k)) else {
        return 1.0;
    };
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(w) if w.is_finite() => w,
        _ => {
            warn!(graph, weight = %raw, "non-numeric edge weight, using 1.0");
            1.0
        }
    }
}

fn build_graph(format: GraphFormat, parts: GraphParts<'_>, fallback_name: &str) -> CanonicalGraph {
    let name = parts
        .metadata
        .and_then(|m| first_string(m, &["system_name", "name"]))
        .unwrap_or_else(|| fallback_name.to_string());
    let framework = parts.metadata.and_then(|m| first_string(m, &["framework"]));

    let mut nodes = Vec::with_capacity(parts.nodes.len());
    let mut node_index = HashMap::new();
    for (pos, raw) in parts.nodes.iter().enumerate() {
        let id = first_string(raw, NODE_ID_KEYS)
            .or_else(|| first_string(raw, NODE_LABEL_KEYS))
            .or_else(|| scalar_string(raw))
            .unwrap_or_else(|| format!("node_{}", pos));
        if node_index.contains_key(&id) {
            warn!(graph = %name, node = %id, "duplicate node id, keeping the first occurrence");
            continue;
        }
        let label = first_string(raw, NODE_LABEL_KEYS).unwrap_or_else(|| id.clone());
        node_index.insert(id.clone(), nodes.len());
        nodes.push(Node {
            id,
            label,
            node_type: first_string(raw, NODE_TYPE_KEYS),
            tier: first_string(raw, NODE_TIER_KEYS),
        });
    }

    let mut edges = Vec::with_capacity(parts.edges.len());
    let mut dropped_edges = 0;
    for raw in parts.edges {
        let source = first_string(raw, EDGE_SOURCE_KEYS);
        let target = first_string(raw, EDGE_TARGET_KEYS);
        let (Some(source_id), Some(target_id)) = (source, target) else {
            warn!(graph = %name, edge = %raw, "edge without source/target, dropping");
            dropped_edges += 1;
            continue;
        };
        if !node_index.contains_key(&source_id) || !node_index.contains_key(&target_id) {
            warn!(
                graph = %name,
                source = %source_id,
                target = %target_id,
                "edge references an unknown node, dropping"
            );
            dropped_edges += 1;
            continue;
        }
        edges.push(Edge {
            weight: edge_weight(raw, &name),
            edge_type: first_string(raw, EDGE_TYPE_KEYS),
            source_id,
            target_id,
        });
    }

    CanonicalGraph {
        name,
        format,
        framework,
        nodes,
        edges,
        node_index,
        dropped_edges,
    }
}
