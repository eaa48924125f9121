//! Classical (metric) multidimensional scaling in one dimension.
//!
//! The squared distance matrix is double-centered into a Gram matrix whose
//! dominant eigenvector, scaled by the root of its eigenvalue, is the 1-D
//! embedding. The eigenvector is found by power iteration on a
//! Gershgorin-shifted copy of the Gram matrix so the algebraically largest
//! eigenvalue dominates regardless of negative eigenvalues.

use ndarray::Array2;

const MAX_ITERATIONS: usize = 512;
const TOLERANCE: f64 = 1e-12;

/// Embed the points of a symmetric distance matrix on a line.
///
/// The sign of the embedding is canonicalized so that it correlates
/// positively with index order, making the result deterministic for callers
/// that sort by it.
pub fn embed_1d(dist: &Array2<f64>) -> Vec<f64> {
    let n = dist.nrows();
    if n < 2 {
        return vec![0.0; n];
    }

    // B = -1/2 * J D^2 J with J = I - 11'/n.
    let mut squared = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            squared[[i, j]] = dist[[i, j]] * dist[[i, j]];
        }
    }
    let row_means: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| squared[[i, j]]).sum::<f64>() / n as f64)
        .collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    let mut gram = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            gram[[i, j]] = -0.5 * (squared[[i, j]] - row_means[i] - row_means[j] + grand_mean);
        }
    }

    // Shift so all eigenvalues are non-negative; the dominant eigenvector
    // of the shifted matrix belongs to the largest eigenvalue of B.
    let shift = (0..n)
        .map(|i| (0..n).map(|j| gram[[i, j]].abs()).sum::<f64>())
        .fold(0.0f64, f64::max);
    for i in 0..n {
        gram[[i, i]] += shift;
    }

    let (eigenvalue, eigenvector) = dominant_eigenpair(&gram);
    let lambda = (eigenvalue - shift).max(0.0);
    let scale = lambda.sqrt();

    let mut embedding: Vec<f64> = eigenvector.iter().map(|v| v * scale).collect();

    // Canonical sign: positive correlation with index order.
    let mean = embedding.iter().sum::<f64>() / n as f64;
    let correlation: f64 = embedding
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64) * (v - mean))
        .sum();
    if correlation < 0.0 {
        for value in &mut embedding {
            *value = -*value;
        }
    }
    embedding
}

fn dominant_eigenpair(matrix: &Array2<f64>) -> (f64, Vec<f64>) {
    let n = matrix.nrows();
    let mut vector: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
    normalize(&mut vector);

    let mut eigenvalue = 0.0;
    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += matrix[[i, j]] * vector[j];
            }
            next[i] = sum;
        }
        let norm = normalize(&mut next);
        let delta: f64 = next
            .iter()
            .zip(&vector)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        vector = next;
        eigenvalue = norm;
        if delta < TOLERANCE {
            break;
        }
    }
    (eigenvalue, vector)
}

fn normalize(vector: &mut [f64]) -> f64 {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn recovers_collinear_points() {
        // Points at 0, 1, 5 on a line.
        let dist = arr2(&[[0.0, 1.0, 5.0], [1.0, 0.0, 4.0], [5.0, 4.0, 0.0]]);
        let embedding = embed_1d(&dist);

        let mut order: Vec<usize> = (0..3).collect();
        order.sort_by(|&a, &b| embedding[a].total_cmp(&embedding[b]));
        assert_eq!(order, vec![0, 1, 2]);

        let d01 = (embedding[0] - embedding[1]).abs();
        let d02 = (embedding[0] - embedding[2]).abs();
        assert!((d01 - 1.0).abs() < 1e-6, "embedding {embedding:?}");
        assert!((d02 - 5.0).abs() < 1e-6, "embedding {embedding:?}");
    }

    #[test]
    fn sign_is_canonical() {
        let dist = arr2(&[[0.0, 1.0, 2.0], [1.0, 0.0, 1.0], [2.0, 1.0, 0.0]]);
        let embedding = embed_1d(&dist);
        assert!(embedding[0] < embedding[2]);
    }

    #[test]
    fn degenerate_sizes_do_not_panic() {
        assert_eq!(embed_1d(&Array2::<f64>::zeros((0, 0))).len(), 0);
        assert_eq!(embed_1d(&Array2::<f64>::zeros((1, 1))), vec![0.0]);
        let pair = embed_1d(&arr2(&[[0.0, 3.0], [3.0, 0.0]]));
        assert!(((pair[1] - pair[0]).abs() - 3.0).abs() < 1e-6);
    }
}
