use crate::domain::config::EngineConfig;
use crate::domain::error::{Diagnostic, DiagnosticKind, InferenceError};
use crate::domain::models::{AlignedMatrixPair, SolverConfidence, TransformationResult};
use crate::linalg::{pseudoinverse, svd};
use crate::services::properties::density;
use tracing::{debug, warn};

/// Solves `B = C · A⁺` for the aligned pair.
///
/// Only zero node overlap is an error. A poor fit shows up as a large
/// `reconstruction_error` and a low confidence instead.
pub fn solve(
    pair: &AlignedMatrixPair,
    cfg: &EngineConfig,
) -> Result<TransformationResult, InferenceError> {
    if pair.shared_nodes == 0 {
        return Err(InferenceError::IncompatibleGraphs {
            a: pair.a_name.clone(),
            c: pair.c_name.clone(),
        });
    }

    let tol = cfg.solver.pinv_tolerance;
    let pinv = pseudoinverse(&pair.a, tol);
    let b = pair.c.matmul(&pinv.matrix);

    let residual = pair.c.sub(&b.matmul(&pair.a));
    let reconstruction_error = residual.frobenius_norm();
    let c_norm = pair.c.frobenius_norm();
    let relative_error = if c_norm > 0.0 {
        (reconstruction_error / c_norm).min(1.0)
    } else if reconstruction_error > 0.0 {
        1.0
    } else {
        0.0
    };

    let rank = svd(&b).rank(tol);
    let mut diagnostics = Vec::new();
    if pinv.nonzero == 0 {
        let msg = format!(
            "system `{}` has no edges; the transformation is undetermined",
            pair.a_name
        );
        warn!("{}", msg);
        diagnostics.push(Diagnostic::new(DiagnosticKind::NumericalInstability, msg));
    } else {
        let share = pinv.discarded as f64 / pinv.nonzero as f64;
        if share > cfg.solver.instability_fraction {
            let msg = format!(
                "pseudoinverse tolerance {:e} discarded {} of {} non-zero singular values of `{}`",
                tol, pinv.discarded, pinv.nonzero, pair.a_name
            );
            warn!("{}", msg);
            diagnostics.push(Diagnostic::new(DiagnosticKind::NumericalInstability, msg));
        }
    }

    let confidence = solver_confidence(
        relative_error,
        rank,
        b.rows(),
        density(&b, cfg.properties.zero_fraction),
    );

    debug!(
        rank,
        source_rank = pinv.rank,
        reconstruction_error,
        relative_error,
        confidence = confidence.overall,
        "solved B = C * pinv(A)"
    );

    Ok(TransformationResult {
        b,
        rank,
        source_rank: pinv.rank,
        reconstruction_error,
        relative_error,
        confidence,
        diagnostics,
    })
}

fn solver_confidence(relative_error: f64, rank: usize, n: usize, density: f64) -> SolverConfidence {
    let fit_quality = (1.0 - relative_error).clamp(0.0, 1.0);
    let rank_quality = if n == 0 { 0.0 } else { rank as f64 / n as f64 };
    // moderate density reads as the most interpretable structure
    let sparsity_quality = 1.0 - (density - 0.5).abs();
    let overall = (fit_quality + rank_quality + sparsity_quality) / 3.0;
    SolverConfidence {
        overall,
        fit_quality,
        rank_quality,
        sparsity_quality,
        interpretation: interpret(overall).to_string(),
    }
}

fn interpret(score: f64) -> &'static str {
    if score >= 0.8 {
        "HIGH - strong evidence for a specific missing system"
    } else if score >= 0.6 {
        "MEDIUM - likely missing system, needs validation"
    } else if score >= 0.4 {
        "LOW - weak evidence, multiple possibilities"
    } else {
        "VERY_LOW - insufficient data or poorly constrained"
    }
}
