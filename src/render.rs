//! Layer assembly and the compositor seam.
//!
//! The core hands the compositor an ordered stack of already-reconciled
//! layers; everything drawing-related stays behind the [`Compositor`]
//! trait so the plotting backend can be swapped out.

use plotters::prelude::*;

use crate::error::DensiTreeError;
use crate::layout::{LaidOutTree, LayoutOptions};

/// Stroke styling for one tree's layer.
#[derive(Debug, Clone, Copy)]
pub struct LayerStyle {
    pub rgb: (u8, u8, u8),
    pub alpha: f64,
    pub stroke_width: u32,
}

impl LayerStyle {
    /// Opaque style for the base (reference) tree.
    pub fn base() -> Self {
        Self {
            rgb: (70, 130, 180),
            alpha: 0.9,
            stroke_width: 1,
        }
    }

    /// Translucent style for the overlaid trees.
    pub fn overlay() -> Self {
        Self {
            rgb: (70, 130, 180),
            alpha: 0.3,
            stroke_width: 1,
        }
    }
}

/// One tree's contribution to the composite plot, in input-tree order.
#[derive(Debug, Clone)]
pub struct Layer {
    pub table: LaidOutTree,
    pub style: LayerStyle,
}

/// Layered 2D plotting surface. Layer 1 is the base establishing the
/// coordinate space; the rest are drawn over it in the same space.
pub trait Compositor {
    type Output;

    fn compose(
        &mut self,
        layers: &[Layer],
        opts: &LayoutOptions,
    ) -> Result<Self::Output, DensiTreeError>;
}

/// Plotters-backed compositor producing a standalone SVG document.
#[derive(Debug, Clone)]
pub struct SvgCompositor {
    pub size: (u32, u32),
    pub margin: u32,
}

impl Default for SvgCompositor {
    fn default() -> Self {
        Self {
            size: (800, 600),
            margin: 10,
        }
    }
}

impl Compositor for SvgCompositor {
    type Output = String;

    fn compose(
        &mut self,
        layers: &[Layer],
        opts: &LayoutOptions,
    ) -> Result<String, DensiTreeError> {
        if layers.is_empty() {
            return Err(DensiTreeError::Empty);
        }

        let paths: Vec<Vec<Vec<(f64, f64)>>> = layers
            .iter()
            .map(|layer| layer.table.branch_paths(opts))
            .collect();

        let (x_range, y_range) = bounds(paths.iter().flatten());

        let mut document = String::new();
        {
            let root = SVGBackend::with_string(&mut document, self.size).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|err| DensiTreeError::Render(err.to_string()))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(self.margin)
                .build_cartesian_2d(x_range, y_range)
                .map_err(|err| DensiTreeError::Render(err.to_string()))?;

            for (layer, layer_paths) in layers.iter().zip(&paths) {
                let (r, g, b) = layer.style.rgb;
                let color = RGBColor(r, g, b).mix(layer.style.alpha);
                let style = ShapeStyle {
                    color,
                    filled: false,
                    stroke_width: layer.style.stroke_width,
                };
                for path in layer_paths {
                    chart
                        .draw_series(LineSeries::new(path.iter().cloned(), style))
                        .map_err(|err| DensiTreeError::Render(err.to_string()))?;
                }
            }

            root.present()
                .map_err(|err| DensiTreeError::Render(err.to_string()))?;
        }
        Ok(document)
    }
}

/// Padded bounding box over every path of every layer.
fn bounds<'a, I>(paths: I) -> (std::ops::Range<f64>, std::ops::Range<f64>)
where
    I: Iterator<Item = &'a Vec<(f64, f64)>>,
{
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for path in paths {
        for &(x, y) in path {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if !min_x.is_finite() || !max_x.is_finite() {
        return (0.0..1.0, 0.0..1.0);
    }

    let pad_x = ((max_x - min_x) * 0.05).max(1e-6);
    let pad_y = ((max_y - min_y) * 0.05).max(1e-6);
    (
        (min_x - pad_x)..(max_x + pad_x),
        (min_y - pad_y)..(max_y + pad_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BasicLayout, LayoutEngine, LayoutStyle};
    use crate::tree::Tree;

    fn layer(id: usize, newick: &str, style: LayerStyle) -> Layer {
        let tree = Tree::from_newick(id, newick).expect("valid test newick");
        let table = BasicLayout
            .layout(&tree, LayoutStyle::Slanted, &LayoutOptions::default())
            .expect("layout");
        Layer { table, style }
    }

    #[test]
    fn composes_layers_into_svg() {
        let layers = vec![
            layer(0, "((a:1,b:1):1,c:2);", LayerStyle::base()),
            layer(1, "((a:1,c:1):1,b:2);", LayerStyle::overlay()),
        ];
        let svg = SvgCompositor::default()
            .compose(&layers, &LayoutOptions::default())
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polyline") || svg.contains("path") || svg.contains("line"));
    }

    #[test]
    fn empty_layer_stack_is_rejected() {
        let result = SvgCompositor::default().compose(&[], &LayoutOptions::default());
        assert!(matches!(result, Err(DensiTreeError::Empty)));
    }

    #[test]
    fn bounds_are_padded() {
        let paths = vec![vec![(0.0, 0.0), (2.0, 4.0)]];
        let (xs, ys) = bounds(paths.iter());
        assert!(xs.start < 0.0 && xs.end > 2.0);
        assert!(ys.start < 0.0 && ys.end > 4.0);
    }
}
