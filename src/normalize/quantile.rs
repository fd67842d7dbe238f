//! Quantile normalization across samples.

use crate::data::AbundanceMatrix;
use crate::error::{DeaError, Result};
use nalgebra::DMatrix;

/// Apply full quantile normalization.
///
/// After normalization the marginal intensity distribution is identical for
/// every sample: the value at each rank position is replaced by the
/// across-sample mean of values at that rank, and each sample's original
/// rank ordering is restored. Rank ties are broken stably, in first-seen
/// order.
///
/// Missing values are excluded from rank computation and remain missing.
/// Samples whose observed count differs from the row count are mapped onto
/// the common quantile grid by linear interpolation, so the sorted-sequence
/// equality holds exactly only for complete samples.
pub fn normalize_quantile(abundance: &AbundanceMatrix) -> Result<AbundanceMatrix> {
    let n_proteins = abundance.n_proteins();
    let n_samples = abundance.n_samples();
    if n_proteins == 0 || n_samples == 0 {
        return Err(DeaError::EmptyData(
            "Cannot quantile-normalize an empty matrix".to_string(),
        ));
    }

    // Per sample: indices of observed entries, stably sorted by value.
    let mut sorted_indices: Vec<Vec<usize>> = Vec::with_capacity(n_samples);
    for (j, sample_id) in abundance.sample_ids().iter().enumerate() {
        let col = abundance.col(j);
        let mut observed: Vec<usize> = (0..n_proteins).filter(|&i| !col[i].is_nan()).collect();
        if observed.is_empty() {
            return Err(DeaError::Numerical(format!(
                "Sample '{}' has no observed values",
                sample_id
            )));
        }
        // Stable: equal values keep their original row order.
        observed.sort_by(|&a, &b| {
            col[a]
                .partial_cmp(&col[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        sorted_indices.push(observed);
    }

    // Reference distribution over the common grid of n_proteins quantiles:
    // mean across samples of each sample's sorted values, interpolated onto
    // the grid when a sample has missing entries.
    let mut reference = vec![0.0; n_proteins];
    for (j, observed) in sorted_indices.iter().enumerate() {
        let col = abundance.col(j);
        let sorted_values: Vec<f64> = observed.iter().map(|&i| col[i]).collect();
        for (k, r) in reference.iter_mut().enumerate() {
            let q = grid_position(k, n_proteins);
            *r += interpolate_sorted(&sorted_values, q);
        }
    }
    for r in reference.iter_mut() {
        *r /= n_samples as f64;
    }

    // Write each sample's rank positions back through the reference.
    let mut data = DMatrix::from_element(n_proteins, n_samples, f64::NAN);
    for (j, observed) in sorted_indices.iter().enumerate() {
        let m = observed.len();
        for (rank, &row) in observed.iter().enumerate() {
            let q = grid_position(rank, m);
            data[(row, j)] = interpolate_sorted(&reference, q);
        }
    }

    abundance.with_data(data)
}

/// Quantile (0..=1) of rank `k` in a distribution of `n` values.
fn grid_position(k: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        k as f64 / (n - 1) as f64
    }
}

/// Linear interpolation into an ascending-sorted slice at quantile `q`.
fn interpolate_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
