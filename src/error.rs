use crate::tree::NodeId;

/// Errors surfaced by the densitree pipeline.
///
/// All of these are fatal: a failing call returns nothing rather than a
/// partially reconciled plot. Variants carry the offending tree index
/// (position in the input collection, 0-based) and label where applicable.
#[derive(thiserror::Error, Debug)]
pub enum DensiTreeError {
    #[error("no input trees supplied")]
    Empty,

    #[error("tree {tree} has no root or no tips")]
    EmptyTree { tree: usize },

    #[error("tree {tree} is not valid Newick: {message}")]
    InvalidNewick { tree: usize, message: String },

    #[error("tree {tree} contains an unlabeled tip (node {node})")]
    UnlabeledTip { tree: usize, node: NodeId },

    #[error("tree {tree} tip set differs from tree 0 (label {label:?} not shared)")]
    InconsistentTipSet { tree: usize, label: String },

    #[error("invalid tip order strategy: {0}")]
    InvalidStrategy(String),

    #[error("tree {tree} lacks branch lengths required by the mds_dist strategy")]
    MissingBranchLength { tree: usize },

    #[error("tip label {label:?} of tree {tree} is absent from the tip order")]
    UnknownTipLabel { tree: usize, label: String },

    #[error("jitter standard deviation must be finite and >= 0, got {0}")]
    InvalidJitter(f64),

    #[error("composition failed: {0}")]
    Render(String),
}
