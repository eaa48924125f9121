use std::collections::BTreeSet;

use phylotree::tree::{Node as PhyloNode, Tree as PhyloTree};

use crate::error::DensiTreeError;

pub type NodeId = phylotree::tree::NodeId;

/// Representation of a phylogenetic tree with an explicit node list.
///
/// Wraps a parsed `phylotree` tree; the node list is rebuilt once at
/// construction and is the only view the rest of the crate works with.
#[derive(Debug, Clone)]
pub struct Tree {
    pub id: usize,
    pub label: Option<String>,
    pub newick: String,
    pub root: Option<NodeId>,
    pub nodes: Vec<TreeNode>,
    pub phylo: PhyloTree,
}

impl Tree {
    pub fn new(id: usize, label: Option<String>, newick: String, phylo: PhyloTree) -> Self {
        let root = phylo.get_root().ok();
        let nodes = Self::build_nodes_from_phylo(&phylo);
        Self {
            id,
            label,
            newick,
            root,
            nodes,
            phylo,
        }
    }

    /// Parse a single Newick string into a tree with the given input index.
    pub fn from_newick(id: usize, newick: &str) -> Result<Self, DensiTreeError> {
        let phylo = PhyloTree::from_newick(newick).map_err(|err| DensiTreeError::InvalidNewick {
            tree: id,
            message: err.to_string(),
        })?;
        Ok(Self::new(id, None, newick.to_owned(), phylo))
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.and_then(|id| self.nodes.get(id))
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Tip labels in node-id order. Unlabeled tips are reported as errors so
    /// no anonymous taxon can slip into an ordering.
    pub fn tip_labels(&self) -> Result<Vec<String>, DensiTreeError> {
        let mut labels = Vec::with_capacity(self.leaf_count());
        for node in self.nodes.iter().filter(|node| node.is_leaf()) {
            match &node.name {
                Some(name) => labels.push(name.clone()),
                None => {
                    return Err(DensiTreeError::UnlabeledTip {
                        tree: self.id,
                        node: node.id,
                    })
                }
            }
        }
        Ok(labels)
    }

    /// True when every non-root node carries an explicit branch length.
    pub fn has_branch_lengths(&self) -> bool {
        self.nodes
            .iter()
            .filter(|node| node.parent.is_some())
            .all(|node| node.length.is_some())
    }

    fn build_nodes_from_phylo(phylo: &PhyloTree) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(phylo.size());
        for idx in 0..phylo.size() {
            match phylo.get(&idx) {
                Ok(node) => nodes.push(TreeNode::from_phylo(node)),
                Err(_) => nodes.push(TreeNode::new(idx, None, None)),
            }
        }
        nodes
    }
}

/// Node within a phylogenetic tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub length: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(id: NodeId, name: Option<String>, length: Option<f64>) -> Self {
        Self {
            id,
            name,
            length,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn from_phylo(node: &PhyloNode) -> Self {
        let mut tree_node = TreeNode::new(node.id, node.name.clone(), node.parent_edge);
        tree_node.parent = node.parent;
        tree_node.children = node.children.clone();
        tree_node
    }
}

/// Validate that every tree carries the identical set of tip labels and
/// return that shared set.
///
/// This is the precondition for any consensus tip order to exist, so it runs
/// before layout or ordering work begins. The reported label is one from the
/// symmetric difference with the first tree's set.
pub fn shared_tip_labels(trees: &[Tree]) -> Result<BTreeSet<String>, DensiTreeError> {
    let first = match trees.first() {
        Some(tree) => tree,
        None => return Err(DensiTreeError::Empty),
    };
    let reference: BTreeSet<String> = first.tip_labels()?.into_iter().collect();

    for tree in &trees[1..] {
        let labels: BTreeSet<String> = tree.tip_labels()?.into_iter().collect();
        if labels != reference {
            let label = reference
                .symmetric_difference(&labels)
                .next()
                .cloned()
                .unwrap_or_default();
            return Err(DensiTreeError::InconsistentTipSet {
                tree: tree.id,
                label,
            });
        }
    }

    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(id: usize, newick: &str) -> Tree {
        Tree::from_newick(id, newick).expect("valid test newick")
    }

    #[test]
    fn builds_node_list_from_newick() {
        let t = tree(0, "((a:1.0,b:2.0):0.5,c:3.0);");
        assert_eq!(t.leaf_count(), 3);
        assert!(t.root.is_some());
        assert_eq!(t.nodes.len(), t.phylo.size());
        assert!(t.has_branch_lengths());
    }

    #[test]
    fn detects_missing_branch_lengths() {
        let t = tree(0, "((a,b),c);");
        assert!(!t.has_branch_lengths());
    }

    #[test]
    fn tip_labels_cover_all_leaves() {
        let t = tree(0, "((a:1,b:1):1,(c:1,d:1):1);");
        let mut labels = t.tip_labels().unwrap();
        labels.sort();
        assert_eq!(labels, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn shared_tip_labels_accepts_matching_sets() {
        let trees = vec![tree(0, "((a,b),c);"), tree(1, "((a,c),b);")];
        let shared = shared_tip_labels(&trees).unwrap();
        assert_eq!(shared.len(), 3);
    }

    #[test]
    fn shared_tip_labels_rejects_mismatch() {
        let trees = vec![tree(0, "((a,b),c);"), tree(1, "((a,b),d);")];
        match shared_tip_labels(&trees) {
            Err(DensiTreeError::InconsistentTipSet { tree: 1, label }) => {
                assert!(label == "c" || label == "d");
            }
            other => panic!("expected InconsistentTipSet, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(shared_tip_labels(&[]), Err(DensiTreeError::Empty)));
    }
}
