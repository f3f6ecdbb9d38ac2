use crate::domain::error::InferenceError;
use crate::domain::models::{AnalysisReport, ErrorBody, JsonError, JsonOut};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const RULE_WIDTH: usize = 80;

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    render: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        print!("{}", render(&data));
    }
    Ok(())
}

/// JSON failure envelope on stdout; the caller still reports on stderr.
pub fn print_error(code: &str, message: &str) -> anyhow::Result<()> {
    let body = JsonError {
        ok: false,
        error: ErrorBody {
            code: code.to_string(),
            message: message.to_string(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Writes the JSON report to `path`, creating parent directories.
pub fn write_report(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let io_err = |source| InferenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let raw = serde_json::to_string_pretty(&JsonOut {
        ok: true,
        data: report,
    })?;
    std::fs::write(path, raw + "\n").map_err(io_err)?;
    Ok(())
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

pub fn render_text(r: &AnalysisReport) -> String {
    let mut out = String::new();
    let m = &r.metadata;
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "MATRIX-BASED TRANSFORMATION ANALYSIS");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "\nAnalysis Type: {}", m.analysis_type);

    heading(&mut out, "INPUT SYSTEMS");
    for (label, s) in [("System A", &m.system_a), ("System C", &m.system_c)] {
        let _ = writeln!(out, "{}: {}", label, s.name);
        let _ = writeln!(out, "  Nodes: {}  Edges: {}", s.nodes, s.edges);
        let _ = writeln!(
            out,
            "  Type: {}",
            s.framework.as_deref().unwrap_or("unknown")
        );
        if s.dropped_edges > 0 {
            let _ = writeln!(out, "  Dropped edges: {}", s.dropped_edges);
        }
    }
    let _ = writeln!(
        out,
        "Shared nodes: {} of {}",
        r.shared_nodes,
        r.node_ids.len()
    );

    heading(&mut out, "TRANSFORMATION B = C * pinv(A)");
    let p = &r.properties;
    let _ = writeln!(out, "Rank: {} (source rank {})", p.rank, r.source_rank);
    let _ = writeln!(out, "Sparsity: {:.1}%", p.sparsity * 100.0);
    let _ = writeln!(out, "Diagonal: {}", if p.is_diagonal { "yes" } else { "no" });
    match p.dominant_eigenvalue {
        Some(v) => {
            let _ = writeln!(out, "Dominant Eigenvalue: {:.3}", v);
        }
        None => {
            let _ = writeln!(out, "Dominant Eigenvalue: n/a");
        }
    }
    let _ = writeln!(
        out,
        "Reconstruction Error: {:.4} (relative {:.1}%)",
        r.reconstruction_error,
        r.relative_error * 100.0
    );
    let _ = writeln!(
        out,
        "\nConfidence: {:.2} - {}",
        r.confidence.overall, r.confidence.interpretation
    );

    if let (Some(d), Some(layers)) = (&r.decomposition, &r.layers) {
        heading(
            &mut out,
            &format!("LAYER DECOMPOSITION: {} layer(s)", d.layer_count),
        );
        let _ = writeln!(
            out,
            "Confidence: {:.2} - {}",
            d.confidence, d.interpretation
        );
        let _ = writeln!(out, "  Singular Value Gap: {:.3}", d.singular_value_gap);
        let _ = writeln!(out, "  Cumulative Energy: {:.1}%", d.cumulative_energy * 100.0);
        for layer in layers {
            let _ = writeln!(
                out,
                "\n  [{}] strength {:.3}, importance {:.2}",
                layer.id, layer.strength, layer.importance
            );
            if !layer.dominant_nodes.is_empty() {
                let _ = writeln!(out, "      Dominant nodes: {}", layer.dominant_nodes.join(", "));
            }
            for c in &layer.characteristics {
                let _ = writeln!(out, "        - {}", c);
            }
        }
    }

    heading(&mut out, &format!("HYPOTHESES ({})", r.hypotheses.len()));
    for (i, h) in r.hypotheses.iter().enumerate() {
        let _ = writeln!(out, "{}. {} (conf: {:.2})", i + 1, h.id, h.confidence);
        let _ = writeln!(out, "   {}", h.description);
        if !h.supporting_properties.is_empty() {
            let _ = writeln!(out, "   supported by: {}", h.supporting_properties.join(", "));
        }
    }

    if !r.diagnostics.is_empty() {
        heading(&mut out, "DIAGNOSTICS");
        for d in &r.diagnostics {
            let _ = writeln!(out, "{:?}: {}", d.kind, d.message);
        }
    }

    let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::EngineConfig;
    use crate::services::loader::normalize;
    use crate::services::pipeline::analyze;
    use serde_json::json;
    use tempfile::TempDir;

    fn report(multilayer: bool) -> AnalysisReport {
        let a = normalize(
            &json!({
                "nodes": [{"id": "x"}, {"id": "y"}],
                "edges": [{"source": "x", "target": "y", "weight": 0.5}]
            }),
            "before",
        )
        .expect("graph");
        let c = normalize(
            &json!({
                "nodes": [{"id": "x"}, {"id": "y"}],
                "edges": [{"source": "x", "target": "y", "weight": 1.5}]
            }),
            "after",
        )
        .expect("graph");
        analyze(&a, &c, multilayer, &EngineConfig::default()).expect("analysis")
    }

    #[test]
    fn text_lists_hypotheses_with_support() {
        let text = render_text(&report(false));
        assert!(text.contains("System A: before"));
        assert!(text.contains("HYPOTHESES ("));
        assert!(text.contains("supported by: "));
        assert!(!text.contains("LAYER DECOMPOSITION"));
    }

    #[test]
    fn text_includes_layers_when_decomposed() {
        let text = render_text(&report(true));
        assert!(text.contains("LAYER DECOMPOSITION: 1 layer(s)"));
        assert!(text.contains("[B1]"));
    }

    #[test]
    fn written_report_is_enveloped_json() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/out.json");
        write_report(&path, &report(false)).expect("write");
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(v["ok"], true);
        assert!(v["hypotheses"].is_array());
        assert!(v["rank"].is_u64());
    }
}
