use crate::domain::models::{AlignedMatrixPair, CanonicalGraph};
use crate::linalg::Matrix;
use std::collections::HashMap;
use tracing::debug;

/// Builds A and C over the union of both node sets.
///
/// Ordering is first-seen in A, then first-seen in C, so the result never
/// depends on hash iteration order. Parallel edges are summed and self-loops
/// kept; a node missing from one graph is an all-zero row/column there.
pub fn build_aligned(a: &CanonicalGraph, c: &CanonicalGraph) -> AlignedMatrixPair {
    let mut node_ids: Vec<String> = Vec::with_capacity(a.nodes.len() + c.nodes.len());
    let mut index: HashMap<&str, usize> = HashMap::new();
    for id in a.node_ids().chain(c.node_ids()) {
        if !index.contains_key(id) {
            index.insert(id, node_ids.len());
            node_ids.push(id.to_string());
        }
    }

    let shared_nodes = a.node_ids().filter(|id| c.contains(id)).count();
    let n = node_ids.len();
    let a_matrix = adjacency(a, &index, n);
    let c_matrix = adjacency(c, &index, n);

    debug!(
        union = n,
        shared = shared_nodes,
        a = %a.name,
        c = %c.name,
        "aligned adjacency matrices"
    );

    AlignedMatrixPair {
        node_ids,
        a: a_matrix,
        c: c_matrix,
        shared_nodes,
        a_name: a.name.clone(),
        c_name: c.name.clone(),
    }
}

fn adjacency(g: &CanonicalGraph, index: &HashMap<&str, usize>, n: usize) -> Matrix {
    let mut m = Matrix::zeros(n, n);
    for e in &g.edges {
        // The loader only keeps edges whose endpoints exist, and every node of
        // g is in the union index.
        if let (Some(&i), Some(&j)) = (
            index.get(e.source_id.as_str()),
            index.get(e.target_id.as_str()),
        ) {
            m.add_to(i, j, e.weight);
        }
    }
    m
}
