//! Polar projection for the fan, circular and radial styles.
//!
//! Linear coordinates map to polar ones with y as angle and x as radius, so
//! segments that vary in y become arcs and are approximated by subdividing
//! them before projecting each sample point.

use super::{LaidOutTree, LayoutOptions, LayoutStyle};

pub(super) fn project_paths(
    table: &LaidOutTree,
    paths: Vec<Vec<(f64, f64)>>,
    opts: &LayoutOptions,
) -> Vec<Vec<(f64, f64)>> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for row in &table.rows {
        min_x = min_x.min(row.x);
        min_y = min_y.min(row.y);
        max_y = max_y.max(row.y);
    }
    if !min_x.is_finite() || !min_y.is_finite() || !max_y.is_finite() {
        return paths;
    }

    let fraction = match table.style {
        // A fan spreads over half the span of a full circle.
        LayoutStyle::Fan => (opts.angular_fraction * 0.5).clamp(0.05, 0.5),
        _ => opts.angular_fraction.clamp(0.05, 1.0),
    };
    let span = std::f64::consts::TAU * fraction;
    let start_angle = std::f64::consts::FRAC_PI_2;
    let y_span = (max_y - min_y).max(1e-9);
    let steps = opts.arc_steps.max(1);

    let to_polar = |x: f64, y: f64| -> (f64, f64) {
        let radius = x - min_x;
        let angle = start_angle - span * (y - min_y) / y_span;
        (radius * angle.cos(), radius * angle.sin())
    };

    paths
        .into_iter()
        .map(|path| {
            let mut projected = Vec::new();
            for pair in path.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                // Constant-angle segments stay straight after projection.
                let samples = if (y1 - y0).abs() < 1e-12 { 1 } else { steps };
                for step in 0..=samples {
                    if step == 0 && !projected.is_empty() {
                        continue;
                    }
                    let t = step as f64 / samples as f64;
                    let x = x0 + (x1 - x0) * t;
                    let y = y0 + (y1 - y0) * t;
                    projected.push(to_polar(x, y));
                }
            }
            projected
        })
        .collect()
}
