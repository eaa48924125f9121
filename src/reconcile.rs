//! Coordinate reconciliation: rewrite every tree's coordinates so tips
//! follow the shared consensus order.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::DensiTreeError;
use crate::layout::LaidOutTree;
use crate::tree::NodeId;

/// Re-lay-out every table against the consensus tip order.
///
/// Per tree, independently: the k-th label of `tip_order` takes the k-th
/// of the tree's existing tip y slots (a pure rebinning, the adapter's
/// scale is preserved), internal y values are recomputed bottom-up as the
/// midpoint of each node's extreme children, and, when requested, x is
/// shifted so tip ends land on x = 0 and tips of trees 2..N get Gaussian
/// y-jitter. The first tree is never jittered; it is the stable visual
/// reference.
pub fn reconcile(
    layouts: &mut [LaidOutTree],
    tip_order: &[String],
    align_tips: bool,
    jitter_sd: f64,
    rng: &mut StdRng,
) -> Result<(), DensiTreeError> {
    if !(jitter_sd >= 0.0 && jitter_sd.is_finite()) {
        return Err(DensiTreeError::InvalidJitter(jitter_sd));
    }
    let jitter = if jitter_sd > 0.0 {
        Some(Normal::new(0.0, jitter_sd).map_err(|_| DensiTreeError::InvalidJitter(jitter_sd))?)
    } else {
        None
    };

    let rank: HashMap<&str, usize> = tip_order
        .iter()
        .enumerate()
        .map(|(position, label)| (label.as_str(), position))
        .collect();

    for (position, layout) in layouts.iter_mut().enumerate() {
        rebin_tips(layout, &rank)?;
        propagate_internal(layout);

        if align_tips {
            let max_x = layout.max_x();
            if max_x.is_finite() {
                for row in &mut layout.rows {
                    row.x -= max_x;
                }
            }
        }

        if let Some(normal) = &jitter {
            if position > 0 {
                for row in layout.rows.iter_mut().filter(|row| row.is_tip) {
                    row.y += normal.sample(rng);
                }
            }
        }
    }

    Ok(())
}

/// Reassign tip y values: sorted existing tip positions become rank slots,
/// consumed in consensus order.
fn rebin_tips(
    layout: &mut LaidOutTree,
    rank: &HashMap<&str, usize>,
) -> Result<(), DensiTreeError> {
    let mut slots: Vec<f64> = layout
        .rows
        .iter()
        .filter(|row| row.is_tip)
        .map(|row| row.y)
        .collect();
    slots.sort_by(f64::total_cmp);

    let tree = layout.tree;
    for row in layout.rows.iter_mut().filter(|row| row.is_tip) {
        let label = row.label.as_deref().ok_or(DensiTreeError::UnlabeledTip {
            tree,
            node: row.node_id,
        })?;
        let position = *rank
            .get(label)
            .ok_or_else(|| DensiTreeError::UnknownTipLabel {
                tree,
                label: label.to_owned(),
            })?;
        if position >= slots.len() {
            return Err(DensiTreeError::UnknownTipLabel {
                tree,
                label: label.to_owned(),
            });
        }
        row.y = slots[position];
    }
    Ok(())
}

/// Recompute internal node y values bottom-up, matching the layout
/// engine's aggregation rule (midpoint of extreme children).
fn propagate_internal(layout: &mut LaidOutTree) {
    let children = layout.children_index();
    let root = layout.root;
    visit(layout, &children, root);
}

fn visit(layout: &mut LaidOutTree, children: &[Vec<NodeId>], node: NodeId) -> f64 {
    let kids = &children[node];
    if kids.is_empty() {
        return layout.rows[node].y;
    }

    let mut first_y = f64::INFINITY;
    let mut last_y = f64::NEG_INFINITY;
    for &kid in kids {
        let y = visit(layout, children, kid);
        first_y = first_y.min(y);
        last_y = last_y.max(y);
    }
    let y = (first_y + last_y) / 2.0;
    layout.rows[node].y = y;
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BasicLayout, LayoutEngine, LayoutOptions, LayoutStyle};
    use crate::tree::Tree;
    use rand::SeedableRng;

    fn layouts_for(newicks: &[&str]) -> Vec<LaidOutTree> {
        newicks
            .iter()
            .enumerate()
            .map(|(id, nw)| {
                let tree = Tree::from_newick(id, nw).expect("valid test newick");
                BasicLayout
                    .layout(&tree, LayoutStyle::Slanted, &LayoutOptions::default())
                    .expect("layout")
            })
            .collect()
    }

    fn order(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn tip_y(layout: &LaidOutTree, label: &str) -> f64 {
        layout
            .rows
            .iter()
            .find(|row| row.label.as_deref() == Some(label))
            .map(|row| row.y)
            .expect("tip present")
    }

    #[test]
    fn tips_land_on_consensus_ranks() {
        let mut layouts = layouts_for(&["((a,b),c);", "((a,c),b);"]);
        let mut rng = StdRng::seed_from_u64(0);
        reconcile(&mut layouts, &order(&["c", "a", "b"]), false, 0.0, &mut rng).unwrap();

        for layout in &layouts {
            assert_eq!(tip_y(layout, "c"), 0.0);
            assert_eq!(tip_y(layout, "a"), 1.0);
            assert_eq!(tip_y(layout, "b"), 2.0);
        }
    }

    #[test]
    fn internal_nodes_follow_their_children() {
        let mut layouts = layouts_for(&["((a,b),c);"]);
        let mut rng = StdRng::seed_from_u64(0);
        reconcile(&mut layouts, &order(&["c", "a", "b"]), false, 0.0, &mut rng).unwrap();

        // The (a,b) ancestor must sit midway between ranks 1 and 2.
        let layout = &layouts[0];
        let children = layout.children_index();
        let parent_of_a = layout
            .rows
            .iter()
            .find(|row| row.label.as_deref() == Some("a"))
            .and_then(|row| row.parent_id)
            .unwrap();
        assert!((layout.rows[parent_of_a].y - 1.5).abs() < 1e-12);
        assert_eq!(children[parent_of_a].len(), 2);
    }

    #[test]
    fn alignment_puts_every_tree_max_x_at_zero() {
        let mut layouts = layouts_for(&["((a:1,b:2):3,c:1);", "((a:5,c:5):5,b:5);"]);
        let mut rng = StdRng::seed_from_u64(0);
        reconcile(&mut layouts, &order(&["a", "b", "c"]), true, 0.0, &mut rng).unwrap();
        for layout in &layouts {
            assert!(layout.max_x().abs() < 1e-12);
        }
    }

    #[test]
    fn zero_jitter_is_idempotent() {
        let mut once = layouts_for(&["((a:1,b:2):3,c:1);", "((a:5,c:5):5,b:5);"]);
        let mut rng = StdRng::seed_from_u64(9);
        reconcile(&mut once, &order(&["b", "c", "a"]), true, 0.0, &mut rng).unwrap();
        let mut twice = once.clone();
        reconcile(&mut twice, &order(&["b", "c", "a"]), true, 0.0, &mut rng).unwrap();

        for (a, b) in once.iter().zip(&twice) {
            for (ra, rb) in a.rows.iter().zip(&b.rows) {
                assert_eq!(ra.x.to_bits(), rb.x.to_bits());
                assert_eq!(ra.y.to_bits(), rb.y.to_bits());
            }
        }
    }

    #[test]
    fn jitter_skips_the_first_tree() {
        let newicks = ["((a,b),c);", "((a,c),b);", "((b,c),a);"];
        let tip_order = order(&["a", "b", "c"]);

        let mut plain = layouts_for(&newicks);
        let mut rng = StdRng::seed_from_u64(3);
        reconcile(&mut plain, &tip_order, false, 0.0, &mut rng).unwrap();

        let mut jittered = layouts_for(&newicks);
        let mut rng = StdRng::seed_from_u64(3);
        reconcile(&mut jittered, &tip_order, false, 0.25, &mut rng).unwrap();

        for label in ["a", "b", "c"] {
            assert_eq!(tip_y(&plain[0], label), tip_y(&jittered[0], label));
        }
        for tree in 1..3 {
            let moved = ["a", "b", "c"]
                .iter()
                .any(|label| tip_y(&plain[tree], label) != tip_y(&jittered[tree], label));
            assert!(moved, "tree {tree} tips unchanged by jitter");
        }
    }

    #[test]
    fn jitter_is_reproducible_for_a_seed() {
        let newicks = ["((a,b),c);", "((a,c),b);"];
        let tip_order = order(&["a", "b", "c"]);

        let mut first = layouts_for(&newicks);
        let mut rng = StdRng::seed_from_u64(11);
        reconcile(&mut first, &tip_order, false, 0.5, &mut rng).unwrap();

        let mut second = layouts_for(&newicks);
        let mut rng = StdRng::seed_from_u64(11);
        reconcile(&mut second, &tip_order, false, 0.5, &mut rng).unwrap();

        for (a, b) in first.iter().zip(&second) {
            for (ra, rb) in a.rows.iter().zip(&b.rows) {
                assert_eq!(ra.y.to_bits(), rb.y.to_bits());
            }
        }
    }

    #[test]
    fn unknown_tip_label_is_rejected() {
        let mut layouts = layouts_for(&["((a,b),c);"]);
        let mut rng = StdRng::seed_from_u64(0);
        let result = reconcile(&mut layouts, &order(&["a", "b", "z"]), false, 0.0, &mut rng);
        assert!(matches!(
            result,
            Err(DensiTreeError::UnknownTipLabel { tree: 0, label }) if label == "c"
        ));
    }

    #[test]
    fn negative_jitter_is_rejected() {
        let mut layouts = layouts_for(&["((a,b),c);"]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            reconcile(&mut layouts, &order(&["a", "b", "c"]), false, -1.0, &mut rng),
            Err(DensiTreeError::InvalidJitter(_))
        ));
    }
}
