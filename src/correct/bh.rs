//! Benjamini-Hochberg false discovery rate correction.

use serde::{Deserialize, Serialize};

/// Result of BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhAdjusted {
    /// Original p-values.
    pub p_values: Vec<f64>,
    /// Adjusted p-values, same order; NaN inputs stay NaN.
    pub p_adj: Vec<f64>,
    /// Number of tests entering the correction (non-NaN p-values).
    pub n_tests: usize,
}

impl BhAdjusted {
    /// Count significant results at a threshold.
    pub fn n_significant(&self, alpha: f64) -> usize {
        self.p_adj.iter().filter(|&&q| q <= alpha).count()
    }
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// For each p-value the adjusted value is
/// `q[i] = min(p[i] * n / rank[i], q[i+1])`, computed over the p-values
/// sorted ascending and capped at 1. NaN entries are excluded from the
/// correction (they contribute nothing to `n`) and remain NaN in the
/// output, so per-protein fit failures pass through unchanged. An empty or
/// all-NaN input yields an output of the same shape with no defined
/// q-values, not an error.
pub fn adjust_bh(p_values: &[f64]) -> BhAdjusted {
    let mut p_adj = vec![f64::NAN; p_values.len()];

    // Indices of defined p-values, sorted ascending.
    let mut indices: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = indices.len();
    if n == 0 {
        return BhAdjusted {
            p_values: p_values.to_vec(),
            p_adj,
            n_tests: 0,
        };
    }

    let n_f64 = n as f64;
    let mut q_sorted = vec![0.0; n];
    q_sorted[n - 1] = p_values[indices[n - 1]].min(1.0);
    for i in (0..n - 1).rev() {
        let rank = i + 1;
        let adjusted = p_values[indices[i]] * n_f64 / rank as f64;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    for (i, &orig_idx) in indices.iter().enumerate() {
        p_adj[orig_idx] = q_sorted[i];
    }

    BhAdjusted {
        p_values: p_values.to_vec(),
        p_adj,
        n_tests: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bh_known_values() {
        // 5 tests, p = [0.005, 0.01, 0.02, 0.04, 0.1]:
        // rank 1: 0.005 * 5/1 = 0.025
        // rank 2: 0.01 * 5/2 = 0.025
        // rank 3: 0.02 * 5/3 = 0.0333...
        // rank 4: 0.04 * 5/4 = 0.05
        // rank 5: 0.1  * 5/5 = 0.1
        let adjusted = adjust_bh(&[0.005, 0.01, 0.02, 0.04, 0.1]);

        assert_eq!(adjusted.n_tests, 5);
        assert_relative_eq!(adjusted.p_adj[0], 0.025, epsilon = 1e-10);
        assert_relative_eq!(adjusted.p_adj[1], 0.025, epsilon = 1e-10);
        assert_relative_eq!(adjusted.p_adj[2], 1.0 / 30.0, epsilon = 1e-10);
        assert_relative_eq!(adjusted.p_adj[3], 0.05, epsilon = 1e-10);
        assert_relative_eq!(adjusted.p_adj[4], 0.1, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_unsorted_input() {
        let adjusted = adjust_bh(&[0.04, 0.01, 0.03, 0.005]);
        // Smallest p (0.005, index 3): q = 0.005 * 4 / 1 = 0.02.
        assert_relative_eq!(adjusted.p_adj[3], 0.02, epsilon = 1e-10);
        // Second smallest (0.01, index 1): min(0.01 * 4/2, next) = 0.02.
        assert_relative_eq!(adjusted.p_adj[1], 0.02, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_monotone_and_at_least_raw() {
        let p = [0.001, 0.01, 0.02, 0.05, 0.1, 0.5];
        let adjusted = adjust_bh(&p);

        let mut prev = 0.0;
        for (raw, q) in p.iter().zip(adjusted.p_adj.iter()) {
            assert!(*q >= *raw);
            assert!(*q >= prev - 1e-12);
            prev = *q;
        }
    }

    #[test]
    fn test_bh_bounded_by_one() {
        let adjusted = adjust_bh(&[0.5, 0.6, 0.7, 0.8, 0.9]);
        assert!(adjusted.p_adj.iter().all(|q| *q <= 1.0));
    }

    #[test]
    fn test_bh_nan_passthrough() {
        let adjusted = adjust_bh(&[0.01, f64::NAN, 0.02]);
        assert_eq!(adjusted.n_tests, 2);
        assert!(adjusted.p_adj[1].is_nan());
        // n = 2, not 3: rank-1 q = 0.01 * 2 / 1 = 0.02.
        assert_relative_eq!(adjusted.p_adj[0], 0.02, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_empty_and_all_nan() {
        assert_eq!(adjust_bh(&[]).n_tests, 0);
        let adjusted = adjust_bh(&[f64::NAN, f64::NAN]);
        assert_eq!(adjusted.n_tests, 0);
        assert!(adjusted.p_adj.iter().all(|q| q.is_nan()));
    }

    #[test]
    fn test_bh_single() {
        let adjusted = adjust_bh(&[0.05]);
        assert_relative_eq!(adjusted.p_adj[0], 0.05, epsilon = 1e-10);
    }
}
