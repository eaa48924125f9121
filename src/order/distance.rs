use std::collections::HashMap;

use ndarray::Array2;

use crate::error::DensiTreeError;
use crate::tree::{NodeId, Tree};

/// Edge weighting used when measuring tip-to-tip path lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Every edge counts 1, branch lengths are ignored.
    Topological,
    /// Sum of real branch lengths; fails if any edge lacks one.
    Patristic,
}

/// Pairwise tip-to-tip distance matrix, indexed by the supplied label order.
///
/// Distances are accumulated by one traversal of the undirected tree per
/// tip; paths in a tree are unique, so no shortest-path machinery is
/// needed. The result is symmetric with a zero diagonal.
pub fn tip_distance_matrix(
    tree: &Tree,
    labels: &[String],
    metric: DistanceMetric,
) -> Result<Array2<f64>, DensiTreeError> {
    let n = labels.len();
    let column: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| (label.as_str(), index))
        .collect();

    // Tip node ids in label order.
    let mut tip_nodes = vec![usize::MAX; n];
    for node in tree.nodes.iter().filter(|node| node.is_leaf()) {
        let name = node.name.as_deref().ok_or(DensiTreeError::UnlabeledTip {
            tree: tree.id,
            node: node.id,
        })?;
        let index = *column
            .get(name)
            .ok_or_else(|| DensiTreeError::UnknownTipLabel {
                tree: tree.id,
                label: name.to_owned(),
            })?;
        tip_nodes[index] = node.id;
    }
    if let Some(index) = tip_nodes.iter().position(|&tip| tip == usize::MAX) {
        return Err(DensiTreeError::InconsistentTipSet {
            tree: tree.id,
            label: labels[index].clone(),
        });
    }

    let weights = edge_weights(tree, metric)?;

    let mut matrix = Array2::<f64>::zeros((n, n));
    for (row, &tip) in tip_nodes.iter().enumerate() {
        let distances = distances_from(tree, tip, &weights);
        for (col, &other) in tip_nodes.iter().enumerate() {
            matrix[[row, col]] = distances[other];
        }
    }
    Ok(matrix)
}

/// Weight of the edge above each node (unused slot for the root).
fn edge_weights(tree: &Tree, metric: DistanceMetric) -> Result<Vec<f64>, DensiTreeError> {
    let mut weights = vec![0.0; tree.nodes.len()];
    for node in &tree.nodes {
        if node.parent.is_none() {
            continue;
        }
        weights[node.id] = match metric {
            DistanceMetric::Topological => 1.0,
            DistanceMetric::Patristic => node
                .length
                .ok_or(DensiTreeError::MissingBranchLength { tree: tree.id })?,
        };
    }
    Ok(weights)
}

/// Path distance from `source` to every node, via an iterative traversal
/// over the parent/children adjacency.
fn distances_from(tree: &Tree, source: NodeId, weights: &[f64]) -> Vec<f64> {
    let mut distances = vec![f64::NAN; tree.nodes.len()];
    let mut stack = vec![source];
    distances[source] = 0.0;

    while let Some(node_id) = stack.pop() {
        let here = distances[node_id];
        let node = &tree.nodes[node_id];

        let mut neighbors: Vec<(NodeId, f64)> = node
            .children
            .iter()
            .map(|&child| (child, weights[child]))
            .collect();
        if let Some(parent) = node.parent {
            neighbors.push((parent, weights[node_id]));
        }

        for (next, weight) in neighbors {
            if distances[next].is_nan() {
                distances[next] = here + weight;
                stack.push(next);
            }
        }
    }

    distances
}
