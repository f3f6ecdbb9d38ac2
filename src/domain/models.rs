use crate::domain::error::Diagnostic;
use crate::linalg::Matrix;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonError {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Input schema variant, decided from the top-level JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// `{"system_of_systems_graph": {...}}`
    Wrapper,
    /// `{"graph": {"nodes": [...], "links": [...]}}`
    Ecosystem,
    /// `{"nodes": [...], "edges": [...]}`
    Direct,
    /// `{"components": [...], "edges": [...]}`
    Architecture,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CanonicalGraph {
    pub name: String,
    pub format: GraphFormat,
    pub framework: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub node_index: HashMap<String, usize>,
    /// Edges skipped because an endpoint was missing or unknown.
    pub dropped_edges: usize,
}

impl CanonicalGraph {
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }
}

/// A and C over the same ordered node set (union of both graphs).
#[derive(Debug, Clone)]
pub struct AlignedMatrixPair {
    pub node_ids: Vec<String>,
    pub a: Matrix,
    pub c: Matrix,
    pub shared_nodes: usize,
    pub a_name: String,
    pub c_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverConfidence {
    pub overall: f64,
    pub fit_quality: f64,
    pub rank_quality: f64,
    pub sparsity_quality: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone)]
pub struct TransformationResult {
    pub b: Matrix,
    pub rank: usize,
    /// Rank of A kept by the pseudoinverse.
    pub source_rank: usize,
    pub reconstruction_error: f64,
    pub relative_error: f64,
    pub confidence: SolverConfidence,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub id: String,
    pub singular_values: Vec<f64>,
    pub strength: f64,
    pub importance: f64,
    pub cumulative_energy: f64,
    pub singular_value_gap: f64,
    pub dominant_nodes: Vec<String>,
    pub characteristics: Vec<String>,
    /// Factor in the chain `B_k · ... · B_1`.
    pub factor: Matrix,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerDecomposition {
    pub layers: Vec<Layer>,
    pub singular_values: Vec<f64>,
    pub singular_values_normalized: Vec<f64>,
    pub significant: usize,
    pub cumulative_energy: f64,
    pub singular_value_gap: f64,
    pub confidence: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixProperties {
    pub rank: usize,
    pub full_rank: bool,
    pub sparsity: f64,
    pub is_diagonal: bool,
    pub is_identity: bool,
    pub dominant_eigenvalue: Option<f64>,
    pub eigenvalue_magnitudes: Vec<f64>,
    pub trace: f64,
    pub frobenius_norm: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Hypothesis {
    pub id: String,
    pub description: String,
    pub confidence: f64,
    pub supporting_properties: Vec<String>,
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub format: GraphFormat,
    pub nodes: usize,
    pub edges: usize,
    pub dropped_edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub system_a: SystemSummary,
    pub system_c: SystemSummary,
    pub analysis_type: String,
    pub tool: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    pub node_ids: Vec<String>,
    pub shared_nodes: usize,
    #[serde(flatten)]
    pub properties: MatrixProperties,
    pub source_rank: usize,
    pub reconstruction_error: f64,
    pub relative_error: f64,
    pub confidence: SolverConfidence,
    pub transformation_matrix: Matrix,
    pub hypotheses: Vec<Hypothesis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<DecompositionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decomposition fields minus the layers, which sit at the report top level.
#[derive(Debug, Clone, Serialize)]
pub struct DecompositionSummary {
    pub layer_count: usize,
    pub significant: usize,
    pub singular_values: Vec<f64>,
    pub singular_values_normalized: Vec<f64>,
    pub cumulative_energy: f64,
    pub singular_value_gap: f64,
    pub confidence: f64,
    pub interpretation: String,
}

impl From<&LayerDecomposition> for DecompositionSummary {
    fn from(d: &LayerDecomposition) -> Self {
        Self {
            layer_count: d.layers.len(),
            significant: d.significant,
            singular_values: d.singular_values.clone(),
            singular_values_normalized: d.singular_values_normalized.clone(),
            cumulative_energy: d.cumulative_energy,
            singular_value_gap: d.singular_value_gap,
            confidence: d.confidence,
            interpretation: d.interpretation.clone(),
        }
    }
}
