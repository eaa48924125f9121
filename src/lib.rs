//! Overlaid phylogenetic tree ("densitree") plotting.
//!
//! A densitree stacks many trees over the same taxa in one coordinate
//! space so topological variation and branch-length uncertainty become
//! visible as cloud-like disagreement around a consensus shape. The crate
//! computes a single consensus tip order for the whole tree set, rewrites
//! every tree's coordinates to follow it, and hands the resulting layers
//! to a pluggable compositor.
//!
//! Modules:
//! - `tree`: tree model wrapping `phylotree`, shared-tip-set validation.
//! - `io`: Newick / Nexus tree-set loading.
//! - `layout`: coordinate tables, layout styles, the layout-engine seam.
//! - `order`: consensus tip-order strategies (mode, MDS, by-tree, explicit).
//! - `reconcile`: per-tree coordinate reconciliation, alignment and jitter.
//! - `render`: layers and the compositor seam, with an SVG implementation.
//! - `plot`: the top-level operation tying the pipeline together.

pub mod error;
pub mod io;
pub mod layout;
pub mod order;
pub mod plot;
pub mod reconcile;
pub mod render;
pub mod tree;

pub use plot::{densitree, densitree_with, DensiTreeOptions, DensiTreePlot};
pub use error::DensiTreeError;
pub use layout::{BasicLayout, LaidOutTree, LayoutEngine, LayoutOptions, LayoutStyle, NodeRow};
pub use order::TipOrder;
pub use render::{Compositor, Layer, LayerStyle, SvgCompositor};
pub use tree::{Tree, TreeNode};
