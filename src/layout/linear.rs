use super::DEFAULT_BRANCH_LENGTH;
use crate::tree::{NodeId, Tree};

/// Assign linear coordinates: tips at consecutive integer y ranks in
/// traversal order, internal nodes at the midpoint of their extreme
/// children, x as cumulative branch length from the root.
///
/// Both the slanted and the rectangular styles share these positions; they
/// differ only in the branch paths drawn between them.
pub(super) fn assign(tree: &Tree) -> Option<Vec<(f64, f64)>> {
    let root_id = tree.root?;
    if tree.leaf_count() == 0 {
        return None;
    }

    let mut positions = vec![(0.0f64, 0.0f64); tree.nodes.len()];
    let mut tip_index = 0usize;
    assign_positions(tree, root_id, 0.0, &mut positions, &mut tip_index);
    Some(positions)
}

fn assign_positions(
    tree: &Tree,
    node_id: NodeId,
    x_pos: f64,
    positions: &mut [(f64, f64)],
    tip_index: &mut usize,
) -> f64 {
    let node = &tree.nodes[node_id];
    let y_pos = if node.children.is_empty() {
        let y = *tip_index as f64;
        *tip_index += 1;
        y
    } else {
        let mut first_y = f64::INFINITY;
        let mut last_y = f64::NEG_INFINITY;
        for &child_id in &node.children {
            let branch_length = tree.nodes[child_id]
                .length
                .unwrap_or(DEFAULT_BRANCH_LENGTH);
            let child_y = assign_positions(
                tree,
                child_id,
                x_pos + branch_length,
                positions,
                tip_index,
            );
            first_y = first_y.min(child_y);
            last_y = last_y.max(child_y);
        }
        if first_y.is_finite() && last_y.is_finite() {
            (first_y + last_y) / 2.0
        } else {
            *tip_index as f64
        }
    };

    positions[node_id] = (x_pos, y_pos);
    y_pos
}
