use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use log::debug;
use ndarray::Array2;

use crate::error::DensiTreeError;
use crate::layout::LaidOutTree;
use crate::tree::Tree;

pub mod distance;
pub mod mds;

use self::distance::DistanceMetric;

/// Strategy for deriving the single consensus tip order shared by every
/// tree in the plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipOrder {
    /// Use the given label sequence verbatim (validated as a permutation of
    /// the shared tip set).
    Explicit(Vec<String>),
    /// Borrow the y-sorted tip order of the n-th input tree, 1-based.
    Tree(usize),
    /// Most frequent tip arrangement across all trees.
    Mode,
    /// 1-D MDS over topological path-length profiles.
    Mds,
    /// 1-D MDS over patristic-distance profiles; requires branch lengths.
    MdsDist,
}

impl FromStr for TipOrder {
    type Err = DensiTreeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim() {
            "mode" => Ok(TipOrder::Mode),
            "mds" => Ok(TipOrder::Mds),
            "mds_dist" => Ok(TipOrder::MdsDist),
            other => match other.parse::<usize>() {
                Ok(index) => Ok(TipOrder::Tree(index)),
                Err(_) => Err(DensiTreeError::InvalidStrategy(other.to_owned())),
            },
        }
    }
}

/// Compute the consensus tip order for a collection of laid-out trees.
///
/// The caller must have validated the shared-tip-set invariant already;
/// `trees` and `layouts` run parallel to each other in input order.
pub fn resolve(
    trees: &[Tree],
    layouts: &[LaidOutTree],
    strategy: &TipOrder,
) -> Result<Vec<String>, DensiTreeError> {
    if trees.is_empty() || layouts.is_empty() {
        return Err(DensiTreeError::Empty);
    }

    match strategy {
        TipOrder::Explicit(labels) => {
            validate_explicit(trees, labels)?;
            Ok(labels.clone())
        }
        TipOrder::Tree(index) => {
            if *index == 0 || *index > layouts.len() {
                return Err(DensiTreeError::InvalidStrategy(format!(
                    "tree index {index} out of range 1..={}",
                    layouts.len()
                )));
            }
            Ok(layouts[index - 1].tip_labels_by_y())
        }
        TipOrder::Mode => mode_order(layouts),
        TipOrder::Mds => mds_order(trees, layouts, DistanceMetric::Topological),
        TipOrder::MdsDist => mds_order(trees, layouts, DistanceMetric::Patristic),
    }
}

fn validate_explicit(trees: &[Tree], labels: &[String]) -> Result<(), DensiTreeError> {
    let shared: BTreeSet<String> = trees[0].tip_labels()?.into_iter().collect();
    let given: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    if given.len() != labels.len() || labels.len() != shared.len() {
        return Err(DensiTreeError::InvalidStrategy(format!(
            "explicit order has {} labels, expected a permutation of {} tips",
            labels.len(),
            shared.len()
        )));
    }
    for label in labels {
        if !shared.contains(label) {
            return Err(DensiTreeError::InvalidStrategy(format!(
                "explicit order contains unknown tip {label:?}"
            )));
        }
    }
    Ok(())
}

/// Majority-vote tip order.
///
/// For every tree, build the permutation vector mapping tree 1's y-sorted
/// order onto that tree's own y-sorted order, then pick the most frequent
/// vector. Ties are broken by first-seen order, so with a single tree (or
/// an even split) the earliest arrangement wins.
fn mode_order(layouts: &[LaidOutTree]) -> Result<Vec<String>, DensiTreeError> {
    let base = layouts[0].tip_labels_by_y();

    let mut seen: Vec<(Vec<usize>, usize)> = Vec::new();
    for layout in layouts {
        let order = layout.tip_labels_by_y();
        let rank: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(position, label)| (label.as_str(), position))
            .collect();

        let mut perm = Vec::with_capacity(base.len());
        for label in &base {
            match rank.get(label.as_str()) {
                Some(&position) => perm.push(position),
                None => {
                    // Shared-set invariant was enforced upstream.
                    return Err(DensiTreeError::UnknownTipLabel {
                        tree: layout.tree,
                        label: label.clone(),
                    });
                }
            }
        }

        match seen.iter_mut().find(|(vector, _)| *vector == perm) {
            Some((_, count)) => *count += 1,
            None => seen.push((perm, 1)),
        }
    }

    // Strict comparison keeps the first-seen vector on ties.
    let mut winner = 0;
    for (index, (_, count)) in seen.iter().enumerate() {
        if *count > seen[winner].1 {
            winner = index;
        }
    }
    debug!(
        "mode tip order: {} distinct arrangements over {} trees, winner count {}",
        seen.len(),
        layouts.len(),
        seen[winner].1
    );

    let perm = &seen[winner].0;
    let mut order = vec![String::new(); base.len()];
    for (i, label) in base.iter().enumerate() {
        order[perm[i]] = label.clone();
    }
    Ok(order)
}

/// MDS-based tip order.
///
/// Every tree contributes its full tip-distance matrix, reindexed into
/// tree 1's label order; the matrices are stacked column-wise so each tip
/// carries its across-tree distance profile, and tips are embedded on a
/// line by classical MDS of the profile distances.
fn mds_order(
    trees: &[Tree],
    layouts: &[LaidOutTree],
    metric: DistanceMetric,
) -> Result<Vec<String>, DensiTreeError> {
    let base = layouts[0].tip_labels_by_y();
    let n = base.len();
    if n < 3 {
        return Ok(base);
    }

    let mut stacked = Array2::<f64>::zeros((n, n * trees.len()));
    for (t, tree) in trees.iter().enumerate() {
        let matrix = distance::tip_distance_matrix(tree, &base, metric)?;
        for i in 0..n {
            for j in 0..n {
                stacked[[i, t * n + j]] = matrix[[i, j]];
            }
        }
    }

    let mut profile_dist = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let mut sum = 0.0;
            for k in 0..stacked.ncols() {
                let diff = stacked[[i, k]] - stacked[[j, k]];
                sum += diff * diff;
            }
            let value = sum.sqrt();
            profile_dist[[i, j]] = value;
            profile_dist[[j, i]] = value;
        }
    }

    let embedding = mds::embed_1d(&profile_dist);
    debug!("mds embedding range: {:?}", {
        let lo = embedding.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = embedding.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    });

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| embedding[a].total_cmp(&embedding[b]));
    Ok(indices.into_iter().map(|i| base[i].clone()).collect())
}
