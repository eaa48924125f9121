use crate::error::DensiTreeError;
use crate::tree::{NodeId, Tree};

mod linear;

pub mod polar;

pub(crate) const DEFAULT_BRANCH_LENGTH: f64 = 1.0;

/// Supported densitree layout styles.
///
/// Coordinates are always assigned in linear space; the polar styles are
/// projections of those coordinates applied when branch paths are
/// produced. This keeps tip reordering a pure operation on the linear y
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStyle {
    Slanted,
    Rectangular,
    Fan,
    Circular,
    Radial,
}

impl LayoutStyle {
    /// The linear coordinate basis this style is built on.
    pub(crate) fn basis(self) -> Basis {
        match self {
            LayoutStyle::Slanted | LayoutStyle::Radial => Basis::Slanted,
            LayoutStyle::Rectangular | LayoutStyle::Fan | LayoutStyle::Circular => {
                Basis::Rectangular
            }
        }
    }

    pub fn is_polar(self) -> bool {
        matches!(
            self,
            LayoutStyle::Fan | LayoutStyle::Circular | LayoutStyle::Radial
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Basis {
    Slanted,
    Rectangular,
}

/// Pass-through layout knobs not interpreted by the ordering or
/// reconciliation steps.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Angular span, as a fraction of a full turn, used by the polar styles.
    pub angular_fraction: f64,
    /// Number of straight segments used to approximate one arc.
    pub arc_steps: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            // Leave a gap so the first and last tip do not meet.
            angular_fraction: 0.9,
            arc_steps: 16,
        }
    }
}

/// One row of a laid-out tree table.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub is_tip: bool,
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Flat per-node coordinate table for one tree, indexed by node id.
///
/// Produced by a [`LayoutEngine`]; the x/y columns are later rewritten by
/// the reconciler, everything else stays fixed.
#[derive(Debug, Clone)]
pub struct LaidOutTree {
    /// Position of the source tree in the input collection.
    pub tree: usize,
    pub style: LayoutStyle,
    pub root: NodeId,
    pub rows: Vec<NodeRow>,
}

impl LaidOutTree {
    pub fn tip_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_tip).count()
    }

    pub fn max_x(&self) -> f64 {
        self.rows
            .iter()
            .map(|row| row.x)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Tip labels sorted by their current y coordinate, ascending.
    pub fn tip_labels_by_y(&self) -> Vec<String> {
        let mut tips: Vec<(&NodeRow, &str)> = self
            .rows
            .iter()
            .filter(|row| row.is_tip)
            .filter_map(|row| row.label.as_deref().map(|label| (row, label)))
            .collect();
        tips.sort_by(|a, b| a.0.y.total_cmp(&b.0.y));
        tips.into_iter().map(|(_, label)| label.to_owned()).collect()
    }

    /// Children of every node, derived from the parent column.
    pub(crate) fn children_index(&self) -> Vec<Vec<NodeId>> {
        let mut children = vec![Vec::new(); self.rows.len()];
        for row in &self.rows {
            if let Some(parent) = row.parent_id {
                children[parent].push(row.node_id);
            }
        }
        children
    }

    /// Drawable branch paths in final (possibly polar-projected) space.
    ///
    /// Slanted basis: one straight parent-to-child segment per edge.
    /// Rectangular basis: the elbow scheme, a horizontal run at the child's
    /// y plus, per internal node, a vertical connector spanning its extreme
    /// children.
    pub fn branch_paths(&self, opts: &LayoutOptions) -> Vec<Vec<(f64, f64)>> {
        let mut paths = Vec::new();
        match self.style.basis() {
            Basis::Slanted => {
                for row in &self.rows {
                    if let Some(parent) = row.parent_id {
                        let p = &self.rows[parent];
                        paths.push(vec![(p.x, p.y), (row.x, row.y)]);
                    }
                }
            }
            Basis::Rectangular => {
                for row in &self.rows {
                    if let Some(parent) = row.parent_id {
                        let p = &self.rows[parent];
                        paths.push(vec![(p.x, row.y), (row.x, row.y)]);
                    }
                }
                let children = self.children_index();
                for (node, kids) in children.iter().enumerate() {
                    if kids.len() > 1 {
                        let x = self.rows[node].x;
                        let mut first_y = f64::INFINITY;
                        let mut last_y = f64::NEG_INFINITY;
                        for &kid in kids {
                            first_y = first_y.min(self.rows[kid].y);
                            last_y = last_y.max(self.rows[kid].y);
                        }
                        paths.push(vec![(x, first_y), (x, last_y)]);
                    }
                }
            }
        }

        if self.style.is_polar() {
            polar::project_paths(self, paths, opts)
        } else {
            paths
        }
    }
}

/// Narrow adapter interface turning a tree into a coordinate table.
///
/// The resolver and reconciler only ever see [`LaidOutTree`], so a different
/// layout backend can be substituted without touching them.
pub trait LayoutEngine {
    fn layout(
        &self,
        tree: &Tree,
        style: LayoutStyle,
        opts: &LayoutOptions,
    ) -> Result<LaidOutTree, DensiTreeError>;
}

/// Built-in layout engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicLayout;

impl LayoutEngine for BasicLayout {
    fn layout(
        &self,
        tree: &Tree,
        style: LayoutStyle,
        _opts: &LayoutOptions,
    ) -> Result<LaidOutTree, DensiTreeError> {
        let positions =
            linear::assign(tree).ok_or(DensiTreeError::EmptyTree { tree: tree.id })?;

        let root = tree.root.ok_or(DensiTreeError::EmptyTree { tree: tree.id })?;
        let rows = tree
            .nodes
            .iter()
            .map(|node| NodeRow {
                node_id: node.id,
                parent_id: node.parent,
                is_tip: node.is_leaf(),
                label: node.name.clone(),
                x: positions[node.id].0,
                y: positions[node.id].1,
            })
            .collect();

        Ok(LaidOutTree {
            tree: tree.id,
            style,
            root,
            rows,
        })
    }
}
