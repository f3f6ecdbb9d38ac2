//! Ordered rule table mapping matrix properties to ranked hypotheses.
//!
//! Every rule whose predicate holds emits one hypothesis. Confidence is the
//! rule's base confidence scaled by `1 - relative_error`; the result is sorted
//! by confidence with table order breaking ties. Above
//! `unreliable_error` no rule is consulted at all.

use crate::domain::config::HypothesisConfig;
use crate::domain::models::{Hypothesis, MatrixProperties};
use tracing::debug;

/// Everything a rule predicate may look at.
pub struct Evidence<'a> {
    pub properties: &'a MatrixProperties,
    pub relative_error: f64,
    /// Zero when no decomposition was requested.
    pub layer_count: usize,
}

impl Evidence<'_> {
    fn sparse(&self, cfg: &HypothesisConfig) -> bool {
        self.properties.sparsity >= cfg.sparse_threshold
    }

    fn dominant(&self) -> f64 {
        self.properties.dominant_eigenvalue.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
enum Feature {
    Rank,
    FullRank,
    Sparsity,
    IsDiagonal,
    IsIdentity,
    DominantEigenvalue,
    LayerCount,
}

impl Feature {
    fn render(self, e: &Evidence) -> String {
        let p = e.properties;
        match self {
            Feature::Rank => format!("rank={}", p.rank),
            Feature::FullRank => format!("full_rank={}", p.full_rank),
            Feature::Sparsity => format!("sparsity={:.3}", p.sparsity),
            Feature::IsDiagonal => format!("is_diagonal={}", p.is_diagonal),
            Feature::IsIdentity => format!("is_identity={}", p.is_identity),
            Feature::DominantEigenvalue => match p.dominant_eigenvalue {
                Some(v) => format!("dominant_eigenvalue={:.3}", v),
                None => "dominant_eigenvalue=n/a".to_string(),
            },
            Feature::LayerCount => format!("layers={}", e.layer_count),
        }
    }
}

struct Rule {
    id: &'static str,
    description: &'static str,
    base_confidence: f64,
    supporting: &'static [Feature],
    characteristics: &'static [&'static str],
    predicate: fn(&Evidence, &HypothesisConfig) -> bool,
}

// Priority order; earlier rules win confidence ties.
const RULES: &[Rule] = &[
    Rule {
        id: "no_effective_transformation",
        description: "No effective transformation: nothing in C is explained by a mapping of A's structure",
        base_confidence: 0.6,
        supporting: &[Feature::Rank],
        characteristics: &["B is numerically zero", "C is unrelated to A's edges"],
        predicate: |e, _| e.properties.rank == 0,
    },
    Rule {
        id: "unchanged_structure",
        description: "Unchanged structure: C reproduces A, the missing system has no visible effect",
        base_confidence: 0.9,
        supporting: &[Feature::IsIdentity],
        characteristics: &["B is the identity"],
        predicate: |e, _| e.properties.is_identity,
    },
    Rule {
        id: "targeted_mechanism",
        description: "Targeted/selective mechanism: a sparse transformation acting on few nodes, keystone-style",
        base_confidence: 0.75,
        supporting: &[Feature::Sparsity, Feature::Rank, Feature::IsDiagonal],
        characteristics: &["Selective rather than broad-spectrum", "Few nodes carry the change"],
        predicate: |e, cfg| {
            e.sparse(cfg) && !e.properties.is_identity && e.properties.rank >= 1
        },
    },
    Rule {
        id: "self_regulation",
        description: "Self-regulation: each node mostly rescales its own connections",
        base_confidence: 0.65,
        supporting: &[Feature::IsDiagonal, Feature::Rank],
        characteristics: &["Near-diagonal transformation", "Little cross-node coupling"],
        predicate: |e, _| {
            e.properties.is_diagonal && !e.properties.is_identity && e.properties.rank >= 1
        },
    },
    Rule {
        id: "simple_centralized",
        description: "Simple centralized mechanism: one or two underlying factors drive a dense change",
        base_confidence: 0.8,
        supporting: &[Feature::Rank, Feature::Sparsity],
        characteristics: &["Low-rank transformation", "Single hub or controller"],
        predicate: |e, cfg| {
            e.properties.rank >= 1 && e.properties.rank <= cfg.low_rank_max && !e.sparse(cfg)
        },
    },
    Rule {
        id: "complex_distributed",
        description: "Complex distributed mechanism: a full-rank transformation touching many interactions",
        base_confidence: 0.7,
        supporting: &[Feature::FullRank, Feature::IsDiagonal],
        characteristics: &["Many independent pathways", "No single dominant driver"],
        predicate: |e, _| e.properties.full_rank && !e.properties.is_diagonal,
    },
    Rule {
        id: "amplifying_feedback",
        description: "Amplifying feedback: the dominant mode grows existing structure",
        base_confidence: 0.7,
        supporting: &[Feature::DominantEigenvalue],
        characteristics: &["Positive feedback loop", "Reinforces existing interactions"],
        predicate: |e, cfg| e.dominant() > cfg.amplifying_above,
    },
    Rule {
        id: "dampening_feedback",
        description: "Dampening/stabilizing feedback: the dominant mode shrinks existing structure",
        base_confidence: 0.7,
        supporting: &[Feature::DominantEigenvalue],
        characteristics: &["Negative feedback loop", "Attenuates existing interactions"],
        predicate: |e, cfg| e.dominant() > 0.0 && e.dominant() < cfg.dampening_below,
    },
    Rule {
        id: "sequential_cascade",
        description: "Sequential cascade: the change separates into layers applied one after another",
        base_confidence: 0.65,
        supporting: &[Feature::LayerCount],
        characteristics: &["Multi-step mechanism", "Intermediate systems may be involved"],
        predicate: |e, _| e.layer_count >= 2,
    },
];

const UNRELIABLE_ID: &str = "no_reliable_explanation";

pub fn generate(evidence: &Evidence, cfg: &HypothesisConfig) -> Vec<Hypothesis> {
    if evidence.relative_error > cfg.unreliable_error {
        debug!(
            relative_error = evidence.relative_error,
            threshold = cfg.unreliable_error,
            "fit too poor for domain hypotheses"
        );
        return vec![Hypothesis {
            id: UNRELIABLE_ID.to_string(),
            description: "No reliable single-transformation explanation: C cannot be reconstructed from A closely enough"
                .to_string(),
            confidence: cfg.unreliable_confidence.clamp(0.0, 1.0),
            supporting_properties: vec![format!("relative_error={:.3}", evidence.relative_error)],
            characteristics: vec!["Several independent changes or missing nodes likely".to_string()],
        }];
    }

    let scale = (1.0 - evidence.relative_error).clamp(0.0, 1.0);
    let mut out: Vec<Hypothesis> = RULES
        .iter()
        .filter(|rule| (rule.predicate)(evidence, cfg))
        .map(|rule| Hypothesis {
            id: rule.id.to_string(),
            description: rule.description.to_string(),
            confidence: (rule.base_confidence * scale).clamp(0.0, 1.0),
            supporting_properties: rule.supporting.iter().map(|f| f.render(evidence)).collect(),
            characteristics: rule.characteristics.iter().map(|c| c.to_string()).collect(),
        })
        .collect();
    // stable: equal confidences keep table order
    out.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    debug!(count = out.len(), "generated hypotheses");
    out
}
