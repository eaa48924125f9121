//! Top-level densitree operation: lay out, order, reconcile, compose.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::DensiTreeError;
use crate::layout::{BasicLayout, LaidOutTree, LayoutEngine, LayoutOptions, LayoutStyle};
use crate::order::{self, TipOrder};
use crate::reconcile;
use crate::render::{Compositor, Layer, LayerStyle};
use crate::tree::Tree;

/// Configuration surface of the densitree operation.
///
/// Every knob is explicit; there is no ambient state, and two calls with
/// the same inputs and options produce identical plots.
#[derive(Debug, Clone)]
pub struct DensiTreeOptions {
    pub layout: LayoutStyle,
    pub tip_order: TipOrder,
    /// Shift every tree so its tip ends land on x = 0.
    pub align_tips: bool,
    /// Standard deviation of Gaussian y-jitter for trees 2..N; 0 disables.
    pub jitter: f64,
    /// Seed for the jitter noise source, so plots are reproducible.
    pub jitter_seed: u64,
    /// Forwarded to the layout engine and compositor, not interpreted here.
    pub layout_opts: LayoutOptions,
    pub base_style: LayerStyle,
    pub overlay_style: LayerStyle,
}

impl Default for DensiTreeOptions {
    fn default() -> Self {
        Self {
            layout: LayoutStyle::Slanted,
            tip_order: TipOrder::Mode,
            align_tips: true,
            jitter: 0.0,
            jitter_seed: 0,
            layout_opts: LayoutOptions::default(),
            base_style: LayerStyle::base(),
            overlay_style: LayerStyle::overlay(),
        }
    }
}

/// A fully reconciled densitree, ready for composition.
///
/// The per-tree tables are exposed so callers (and tests) can inspect the
/// reconciled coordinates without rendering anything.
#[derive(Debug, Clone)]
pub struct DensiTreePlot {
    pub layers: Vec<Layer>,
    pub tip_order: Vec<String>,
    layout_opts: LayoutOptions,
}

impl DensiTreePlot {
    pub fn render<C: Compositor>(&self, compositor: &mut C) -> Result<C::Output, DensiTreeError> {
        compositor.compose(&self.layers, &self.layout_opts)
    }
}

/// Build a densitree from a collection of trees over the same taxa.
///
/// The pipeline runs synchronously in one call: validate the shared tip
/// set, lay out every tree, resolve the consensus tip order exactly once
/// from all trees, then reconcile every tree against that single order.
/// Any failure aborts the whole call; there is no partial result.
pub fn densitree(
    trees: &[Tree],
    options: &DensiTreeOptions,
) -> Result<DensiTreePlot, DensiTreeError> {
    densitree_with(trees, options, &BasicLayout)
}

/// As [`densitree`], with a caller-supplied layout engine.
pub fn densitree_with<E: LayoutEngine>(
    trees: &[Tree],
    options: &DensiTreeOptions,
    engine: &E,
) -> Result<DensiTreePlot, DensiTreeError> {
    if trees.is_empty() {
        return Err(DensiTreeError::Empty);
    }
    if !(options.jitter >= 0.0 && options.jitter.is_finite()) {
        return Err(DensiTreeError::InvalidJitter(options.jitter));
    }

    // The shared-tip-set invariant is checked before any layout or
    // ordering work; no consensus order exists without it.
    let shared = crate::tree::shared_tip_labels(trees)?;
    debug!(
        "densitree over {} trees, {} shared tips, layout {:?}",
        trees.len(),
        shared.len(),
        options.layout
    );

    let mut layouts: Vec<LaidOutTree> = trees
        .iter()
        .map(|tree| engine.layout(tree, options.layout, &options.layout_opts))
        .collect::<Result<_, _>>()?;

    let tip_order = order::resolve(trees, &layouts, &options.tip_order)?;
    debug!("consensus tip order resolved: {tip_order:?}");

    let mut rng = StdRng::seed_from_u64(options.jitter_seed);
    reconcile::reconcile(
        &mut layouts,
        &tip_order,
        options.align_tips,
        options.jitter,
        &mut rng,
    )?;

    let layers = layouts
        .into_iter()
        .enumerate()
        .map(|(position, table)| Layer {
            table,
            style: if position == 0 {
                options.base_style
            } else {
                options.overlay_style
            },
        })
        .collect();

    Ok(DensiTreePlot {
        layers,
        tip_order,
        layout_opts: options.layout_opts.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trees(newicks: &[&str]) -> Vec<Tree> {
        newicks
            .iter()
            .enumerate()
            .map(|(id, nw)| Tree::from_newick(id, nw).expect("valid test newick"))
            .collect()
    }

    #[test]
    fn builds_one_layer_per_tree_in_input_order() {
        let input = trees(&["((a,b),c);", "((a,c),b);", "((b,c),a);"]);
        let plot = densitree(&input, &DensiTreeOptions::default()).unwrap();
        assert_eq!(plot.layers.len(), 3);
        for (position, layer) in plot.layers.iter().enumerate() {
            assert_eq!(layer.table.tree, position);
        }
    }

    #[test]
    fn inconsistent_tip_sets_fail_before_layout() {
        let input = trees(&["((a,b),c);", "((a,b),d);"]);
        assert!(matches!(
            densitree(&input, &DensiTreeOptions::default()),
            Err(DensiTreeError::InconsistentTipSet { tree: 1, .. })
        ));
    }

    #[test]
    fn default_options_align_tips() {
        let input = trees(&["((a:1,b:2):1,c:5);", "((a:3,c:1):2,b:1);"]);
        let plot = densitree(&input, &DensiTreeOptions::default()).unwrap();
        for layer in &plot.layers {
            assert!(layer.table.max_x().abs() < 1e-12);
        }
    }

    #[test]
    fn tip_order_is_shared_by_every_layer() {
        let input = trees(&["((a,b),c);", "((a,c),b);"]);
        let plot = densitree(&input, &DensiTreeOptions::default()).unwrap();
        for layer in &plot.layers {
            assert_eq!(layer.table.tip_labels_by_y(), plot.tip_order);
        }
    }

    #[test]
    fn rejects_non_finite_jitter() {
        let input = trees(&["((a,b),c);"]);
        let options = DensiTreeOptions {
            jitter: f64::NAN,
            ..DensiTreeOptions::default()
        };
        assert!(matches!(
            densitree(&input, &options),
            Err(DensiTreeError::InvalidJitter(_))
        ));
    }
}
