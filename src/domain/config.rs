//! Engine thresholds.
//!
//! None of these values are calibrated against real data; they are the
//! knobs that decide what "near zero", "sparse" or "unreliable" mean and are
//! meant to be tuned per domain through a TOML file:
//!
//! ```toml
//! [solver]
//! pinv_tolerance = 1e-10
//!
//! [decomposition]
//! gap_threshold = 0.3
//! amplification_peak = 2.0
//!
//! [hypotheses]
//! unreliable_error = 0.5
//! ```

use crate::domain::error::InferenceError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub solver: SolverConfig,
    pub decomposition: DecompositionConfig,
    pub properties: PropertyConfig,
    pub hypotheses: HypothesisConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Singular values at or below `pinv_tolerance * sigma_max` count as zero.
    pub pinv_tolerance: f64,
    /// Warn when more than this fraction of A's non-zero singular values
    /// is discarded by the tolerance.
    pub instability_fraction: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pinv_tolerance: 1e-10,
            instability_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompositionConfig {
    /// Relative drop `1 - s[i+1]/s[i]` that opens a new layer.
    pub gap_threshold: f64,
    /// Cumulative share of squared singular values after which the rest is
    /// treated as noise.
    pub energy_threshold: f64,
    /// Layer density below this reads as a targeted mechanism.
    pub targeted_density: f64,
    /// Layer density above this reads as a broad mechanism.
    pub broad_density: f64,
    /// Peak `|x|` of a layer above which it amplifies.
    pub amplification_peak: f64,
    /// Peak `|x|` of a layer below which it dampens.
    pub dampening_peak: f64,
    /// Diagonal share of a layer's mass above which self-regulation dominates.
    pub self_regulation_share: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            gap_threshold: 0.3,
            energy_threshold: 0.99,
            targeted_density: 0.3,
            broad_density: 0.7,
            amplification_peak: 2.0,
            dampening_peak: 0.5,
            self_regulation_share: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyConfig {
    /// Entry is near-zero when `|x| <= zero_fraction * max|x|`.
    pub zero_fraction: f64,
    /// Diagonal when off-diagonal mass is below this share of total mass.
    pub diagonal_tolerance: f64,
    /// Eigenvalues below `eigen_floor * ||B||_F` are reported as zero.
    pub eigen_floor: f64,
    /// Max entrywise distance from I for B to count as the identity.
    pub identity_tolerance: f64,
}

impl Default for PropertyConfig {
    fn default() -> Self {
        Self {
            zero_fraction: 0.01,
            diagonal_tolerance: 0.05,
            eigen_floor: 1e-6,
            identity_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HypothesisConfig {
    pub sparse_threshold: f64,
    pub low_rank_max: usize,
    pub amplifying_above: f64,
    pub dampening_below: f64,
    /// Relative reconstruction error above which only the fallback
    /// hypothesis is emitted.
    pub unreliable_error: f64,
    pub unreliable_confidence: f64,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            sparse_threshold: 0.7,
            low_rank_max: 2,
            amplifying_above: 1.05,
            dampening_below: 0.95,
            unreliable_error: 0.5,
            unreliable_confidence: 0.1,
        }
    }
}

impl EngineConfig {
    /// Rejects values that would make the thresholds meaningless.
    pub fn validate(&self) -> Result<(), InferenceError> {
        let fractions = [
            ("solver.instability_fraction", self.solver.instability_fraction),
            ("decomposition.gap_threshold", self.decomposition.gap_threshold),
            ("decomposition.energy_threshold", self.decomposition.energy_threshold),
            ("decomposition.targeted_density", self.decomposition.targeted_density),
            ("decomposition.broad_density", self.decomposition.broad_density),
            ("decomposition.self_regulation_share", self.decomposition.self_regulation_share),
            ("properties.zero_fraction", self.properties.zero_fraction),
            ("properties.diagonal_tolerance", self.properties.diagonal_tolerance),
            ("hypotheses.sparse_threshold", self.hypotheses.sparse_threshold),
            ("hypotheses.unreliable_error", self.hypotheses.unreliable_error),
            ("hypotheses.unreliable_confidence", self.hypotheses.unreliable_confidence),
        ];
        for (key, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(InferenceError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    key, value
                )));
            }
        }

        let positive = [
            ("solver.pinv_tolerance", self.solver.pinv_tolerance),
            ("properties.eigen_floor", self.properties.eigen_floor),
            ("properties.identity_tolerance", self.properties.identity_tolerance),
            ("decomposition.amplification_peak", self.decomposition.amplification_peak),
            ("decomposition.dampening_peak", self.decomposition.dampening_peak),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(InferenceError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    key, value
                )));
            }
        }

        let d = &self.decomposition;
        let h = &self.hypotheses;
        let ordered = [
            (
                "decomposition.targeted_density",
                d.targeted_density,
                "decomposition.broad_density",
                d.broad_density,
            ),
            (
                "decomposition.dampening_peak",
                d.dampening_peak,
                "decomposition.amplification_peak",
                d.amplification_peak,
            ),
            (
                "hypotheses.dampening_below",
                h.dampening_below,
                "hypotheses.amplifying_above",
                h.amplifying_above,
            ),
        ];
        for (low_key, low, high_key, high) in ordered {
            if low > high {
                return Err(InferenceError::InvalidConfig(format!(
                    "{} ({}) exceeds {} ({})",
                    low_key, low, high_key, high
                )));
            }
        }
        Ok(())
    }
}
