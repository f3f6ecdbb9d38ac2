//! Multi-layer decomposition of B via SVD.
//!
//! Singular values are first cut to the significant prefix (tolerance, then
//! cumulative energy). That prefix is split into layers wherever the relative
//! drop `1 - s[i+1]/s[i]` exceeds `gap_threshold`. Each layer then gets a
//! factor such that `B_k · ... · B_1` equals the truncated SVD of B:
//!
//! - first: `D_1 · Vᵗ`
//! - middle: `D_i`
//! - last: `U · D_k`
//!
//! where `D_i` carries the singular values of layer `i` and ones elsewhere.
//! A single layer is just `U · Σ · Vᵗ`.

use crate::domain::config::{DecompositionConfig, EngineConfig};
use crate::domain::models::{Layer, LayerDecomposition};
use crate::linalg::{svd, Matrix, Svd};
use crate::services::properties::{density, diagonal_share};
use std::ops::Range;
use tracing::debug;

const DOMINANT_NODES: usize = 3;

pub fn decompose(b: &Matrix, node_ids: &[String], cfg: &EngineConfig) -> LayerDecomposition {
    let d = svd(b);
    let sigma = d.sigma.clone();
    let smax = d.max_singular_value();
    let normalized: Vec<f64> = if smax > 0.0 {
        sigma.iter().map(|s| s / smax).collect()
    } else {
        vec![0.0; sigma.len()]
    };

    let nonzero = d.rank(cfg.solver.pinv_tolerance);
    if nonzero == 0 {
        debug!("B has no non-zero singular values; nothing to decompose");
        return LayerDecomposition {
            layers: Vec::new(),
            singular_values: sigma,
            singular_values_normalized: normalized,
            significant: 0,
            cumulative_energy: 0.0,
            singular_value_gap: 0.0,
            confidence: 0.0,
            interpretation: interpret(0.0).to_string(),
        };
    }

    let total: f64 = sigma.iter().map(|s| s * s).sum();
    let significant = significant_count(&sigma[..nonzero], total, cfg.decomposition.energy_threshold);
    let groups = split_layers(&sigma[..significant], cfg.decomposition.gap_threshold);
    let captured = (sigma[..significant].iter().map(|s| s * s).sum::<f64>() / total).min(1.0);

    let gap = sharpest_drop(&sigma, significant);
    let confidence = ((gap + captured) / 2.0).clamp(0.0, 1.0);

    let mut cumulative = 0.0;
    let mut layers = Vec::with_capacity(groups.len());
    for (pos, range) in groups.iter().enumerate() {
        let values = sigma[range.clone()].to_vec();
        let energy: f64 = values.iter().map(|s| s * s).sum();
        cumulative += energy;
        let indices: Vec<usize> = range.clone().collect();
        let component = d.component(&indices);
        let dominant = dominant_nodes(&component, node_ids);
        let traits = characteristics(&component, cfg.properties.zero_fraction, &cfg.decomposition);
        let factor = if groups.len() == 1 {
            component
        } else {
            chain_factor(&d, &groups, pos, significant)
        };
        layers.push(Layer {
            id: format!("B{}", pos + 1),
            strength: energy.sqrt(),
            importance: values[0] / smax,
            cumulative_energy: (cumulative / total).min(1.0),
            singular_value_gap: drop_after(&sigma, range.end - 1),
            dominant_nodes: dominant,
            characteristics: traits,
            singular_values: values,
            factor,
        });
    }

    debug!(
        significant,
        layers = layers.len(),
        gap,
        confidence,
        "decomposed B into layers"
    );

    LayerDecomposition {
        layers,
        singular_values: sigma,
        singular_values_normalized: normalized,
        significant,
        cumulative_energy: captured,
        singular_value_gap: gap,
        confidence,
        interpretation: interpret(confidence).to_string(),
    }
}

fn significant_count(sigma: &[f64], total: f64, energy_threshold: f64) -> usize {
    let mut cum = 0.0;
    for (i, s) in sigma.iter().enumerate() {
        cum += s * s;
        if cum / total >= energy_threshold - 1e-12 {
            return i + 1;
        }
    }
    sigma.len()
}

fn relative_drop(hi: f64, lo: f64) -> f64 {
    if hi <= 0.0 {
        0.0
    } else {
        1.0 - lo / hi
    }
}

// Drop from sigma[i] to the next value; the end of the spectrum counts as 1.
fn drop_after(sigma: &[f64], i: usize) -> f64 {
    match sigma.get(i + 1) {
        Some(next) => relative_drop(sigma[i], *next),
        None => 1.0,
    }
}

fn split_layers(sigma: &[f64], gap_threshold: f64) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 0..sigma.len().saturating_sub(1) {
        if relative_drop(sigma[i], sigma[i + 1]) > gap_threshold {
            groups.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < sigma.len() {
        groups.push(start..sigma.len());
    }
    groups
}

// Largest drop inside the significant prefix or from it to the next value.
fn sharpest_drop(sigma: &[f64], significant: usize) -> f64 {
    if sigma.len() == 1 {
        return 1.0;
    }
    let last = significant.min(sigma.len() - 1);
    (0..last)
        .map(|i| relative_drop(sigma[i], sigma[i + 1]))
        .fold(0.0, f64::max)
}

fn chain_factor(d: &Svd, groups: &[Range<usize>], pos: usize, k: usize) -> Matrix {
    let mut scale = vec![1.0; k];
    for j in groups[pos].clone() {
        scale[j] = d.sigma[j];
    }

    if pos == 0 {
        // D_1 · Vᵗ
        let cols = d.v.rows();
        let mut f = Matrix::zeros(k, cols);
        for j in 0..k {
            for c in 0..cols {
                f.set(j, c, scale[j] * d.v.get(c, j));
            }
        }
        f
    } else if pos == groups.len() - 1 {
        // U · D_k
        let rows = d.u.rows();
        let mut f = Matrix::zeros(rows, k);
        for r in 0..rows {
            for j in 0..k {
                f.set(r, j, d.u.get(r, j) * scale[j]);
            }
        }
        f
    } else {
        Matrix::diagonal(&scale)
    }
}

fn dominant_nodes(component: &Matrix, node_ids: &[String]) -> Vec<String> {
    let mut mass: Vec<(usize, f64)> = (0..component.rows())
        .map(|i| (i, component.row(i).iter().map(|v| v.abs()).sum::<f64>()))
        .filter(|(_, m)| *m > 0.0)
        .collect();
    mass.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    mass.into_iter()
        .take(DOMINANT_NODES)
        .map(|(i, _)| {
            node_ids
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("component_{}", i))
        })
        .collect()
}

fn characteristics(component: &Matrix, zero_fraction: f64, cfg: &DecompositionConfig) -> Vec<String> {
    let mut out = Vec::new();

    let dens = density(component, zero_fraction);
    if dens < cfg.targeted_density {
        out.push("Targeted/selective mechanism");
    } else if dens > cfg.broad_density {
        out.push("Broad/distributed mechanism");
    } else {
        out.push("Moderate selectivity");
    }

    let peak = component.max_abs();
    if peak > cfg.amplification_peak {
        out.push("Strong amplification");
    } else if peak < cfg.dampening_peak {
        out.push("Dampening/regulation");
    }

    if diagonal_share(component) > cfg.self_regulation_share {
        out.push("Self-regulation dominant");
    } else {
        out.push("Cross-system interactions dominant");
    }

    out.into_iter().map(String::from).collect()
}

fn interpret(score: f64) -> &'static str {
    if score >= 0.8 {
        "HIGH - clear layer separation"
    } else if score >= 0.6 {
        "MEDIUM - likely multi-layer structure"
    } else if score >= 0.4 {
        "LOW - ambiguous layer boundaries, single-layer reading preferred"
    } else {
        "VERY_LOW - poorly separated layers"
    }
}
