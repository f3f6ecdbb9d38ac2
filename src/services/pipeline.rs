use crate::domain::config::EngineConfig;
use crate::domain::error::InferenceError;
use crate::domain::models::{
    AnalysisMetadata, AnalysisReport, CanonicalGraph, DecompositionSummary, SystemSummary,
};
use crate::services::decompose::decompose;
use crate::services::hypotheses::{generate, Evidence};
use crate::services::loader::load_graph;
use crate::services::matrix::build_aligned;
use crate::services::properties;
use crate::services::solver::solve;
use std::path::Path;
use tracing::info;

/// Loads both files and runs the full analysis.
pub fn analyze_files(
    system_a: &Path,
    system_c: &Path,
    multilayer: bool,
    cfg: &EngineConfig,
) -> Result<AnalysisReport, InferenceError> {
    let a = load_graph(system_a)?;
    let c = load_graph(system_c)?;
    let mut report = analyze(&a, &c, multilayer, cfg)?;
    report.metadata.system_a.path = Some(system_a.display().to_string());
    report.metadata.system_c.path = Some(system_c.display().to_string());
    Ok(report)
}

/// Loader output to report, with no I/O and no state kept between calls.
pub fn analyze(
    a: &CanonicalGraph,
    c: &CanonicalGraph,
    multilayer: bool,
    cfg: &EngineConfig,
) -> Result<AnalysisReport, InferenceError> {
    for g in [a, c] {
        if g.nodes.is_empty() {
            return Err(InferenceError::EmptyGraph(g.name.clone()));
        }
    }

    let pair = build_aligned(a, c);
    let solved = solve(&pair, cfg)?;
    let decomposition = multilayer.then(|| decompose(&solved.b, &pair.node_ids, cfg));
    let (props, prop_diagnostics) = properties::analyze(&solved.b, solved.rank, &cfg.properties);

    let evidence = Evidence {
        properties: &props,
        relative_error: solved.relative_error,
        layer_count: decomposition.as_ref().map_or(0, |d| d.layers.len()),
    };
    let hypotheses = generate(&evidence, &cfg.hypotheses);

    info!(
        a = %a.name,
        c = %c.name,
        rank = props.rank,
        hypotheses = hypotheses.len(),
        "analysis complete"
    );

    let mut diagnostics = solved.diagnostics;
    diagnostics.extend(prop_diagnostics);

    Ok(AnalysisReport {
        metadata: AnalysisMetadata {
            system_a: summarize(a),
            system_c: summarize(c),
            analysis_type: if multilayer { "multilayer" } else { "single_layer" }.to_string(),
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        node_ids: pair.node_ids,
        shared_nodes: pair.shared_nodes,
        properties: props,
        source_rank: solved.source_rank,
        reconstruction_error: solved.reconstruction_error,
        relative_error: solved.relative_error,
        confidence: solved.confidence,
        transformation_matrix: solved.b,
        hypotheses,
        decomposition: decomposition.as_ref().map(DecompositionSummary::from),
        layers: decomposition.map(|d| d.layers),
        diagnostics,
    })
}

fn summarize(g: &CanonicalGraph) -> SystemSummary {
    SystemSummary {
        name: g.name.clone(),
        path: None,
        format: g.format,
        nodes: g.nodes.len(),
        edges: g.edges.len(),
        dropped_edges: g.dropped_edges,
        framework: g.framework.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::normalize;
    use serde_json::{json, Value};

    fn graph(doc: Value, name: &str) -> CanonicalGraph {
        normalize(&doc, name).expect("valid test graph")
    }

    fn weak_triangle() -> CanonicalGraph {
        let mut edges = Vec::new();
        for s in ["x", "y", "z"] {
            for t in ["x", "y", "z"] {
                if s != t {
                    edges.push(json!({"source": s, "target": t, "weight": 0.2}));
                }
            }
        }
        graph(
            json!({"nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}], "edges": edges}),
            "before",
        )
    }

    fn with_new_node() -> CanonicalGraph {
        graph(
            json!({
                "nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}, {"id": "w"}],
                "edges": [
                    {"source": "w", "target": "x", "weight": 0.9},
                    {"source": "w", "target": "y", "weight": 0.9}
                ]
            }),
            "after",
        )
    }

    #[test]
    fn new_node_transition_is_a_targeted_mechanism() {
        let report = analyze(&weak_triangle(), &with_new_node(), false, &EngineConfig::default())
            .expect("analysis");
        assert_eq!(report.properties.rank, 1);
        assert!(report.properties.sparsity > 0.8);
        assert!(report.reconstruction_error < 1e-9);
        let top = &report.hypotheses[0];
        assert_eq!(top.id, "targeted_mechanism");
        assert!(top.confidence >= 0.5);
        assert!(report.layers.is_none());
        assert_eq!(report.metadata.analysis_type, "single_layer");
    }

    #[test]
    fn multilayer_attaches_layers_and_summary() {
        let report = analyze(&weak_triangle(), &with_new_node(), true, &EngineConfig::default())
            .expect("analysis");
        let layers = report.layers.as_ref().expect("layers");
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].dominant_nodes, vec!["w".to_string()]);
        let summary = report.decomposition.as_ref().expect("summary");
        assert_eq!(summary.layer_count, 1);
        assert_eq!(report.metadata.analysis_type, "multilayer");
    }

    #[test]
    fn repeated_runs_serialize_identically() {
        let cfg = EngineConfig::default();
        let first = analyze(&weak_triangle(), &with_new_node(), true, &cfg).expect("first");
        let second = analyze(&weak_triangle(), &with_new_node(), true, &cfg).expect("second");
        assert_eq!(
            serde_json::to_string(&first).expect("json"),
            serde_json::to_string(&second).expect("json")
        );
    }

    #[test]
    fn same_graph_twice_is_unchanged_structure() {
        let a = weak_triangle();
        let report = analyze(&a, &a, false, &EngineConfig::default()).expect("analysis");
        assert!(report.properties.is_identity);
        assert_eq!(report.hypotheses[0].id, "unchanged_structure");
    }

    #[test]
    fn unchanged_sparse_ring_is_only_unchanged_structure() {
        let edges: Vec<Value> = (0..5)
            .map(|i| json!({"source": format!("n{}", i), "target": format!("n{}", (i + 1) % 5), "weight": 0.5}))
            .collect();
        let nodes: Vec<Value> = (0..5).map(|i| json!({"id": format!("n{}", i)})).collect();
        let ring = graph(json!({"nodes": nodes, "edges": edges}), "ring");

        let report = analyze(&ring, &ring, false, &EngineConfig::default()).expect("analysis");
        assert!(report.properties.is_identity);
        assert!((report.properties.sparsity - 0.8).abs() < 1e-12);
        let ids: Vec<&str> = report.hypotheses.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["unchanged_structure"]);
    }

    #[test]
    fn disjoint_graphs_fail_without_hypotheses() {
        let a = graph(json!({"nodes": [{"id": "a"}], "edges": []}), "a");
        let c = graph(json!({"nodes": [{"id": "c"}], "edges": []}), "c");
        let err = analyze(&a, &c, false, &EngineConfig::default()).expect_err("incompatible");
        assert_eq!(err.code(), "INCOMPATIBLE_GRAPHS");
    }

    #[test]
    fn nodeless_graph_is_rejected() {
        let empty = graph(json!({"nodes": [], "edges": []}), "empty");
        let err = analyze(&weak_triangle(), &empty, false, &EngineConfig::default())
            .expect_err("empty");
        assert_eq!(err.code(), "EMPTY_GRAPH");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn edgeless_source_degrades_to_diagnostic() {
        let a = graph(
            json!({"nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}], "edges": []}),
            "bare",
        );
        let report = analyze(&a, &weak_triangle(), false, &EngineConfig::default())
            .expect("analysis");
        assert_eq!(report.properties.rank, 0);
        assert!(!report.diagnostics.is_empty());
        assert_eq!(report.hypotheses.len(), 1);
        assert_eq!(report.hypotheses[0].id, "no_reliable_explanation");
    }
}
