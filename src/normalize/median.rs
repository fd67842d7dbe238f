//! Sample-median normalization.

use crate::data::AbundanceMatrix;
use crate::error::{DeaError, Result};
use nalgebra::DMatrix;

/// Remove per-sample median shifts.
///
/// Every sample column is scaled multiplicatively so its median protein
/// intensity equals the global median of per-sample medians. On the log
/// scale this is the usual per-sample additive shift. Missing values are
/// ignored when computing medians and stay missing.
///
/// # Failure modes
/// A sample with no observed values, or with a non-positive median, has no
/// defined scale factor and aborts the stage.
pub fn normalize_median(abundance: &AbundanceMatrix) -> Result<AbundanceMatrix> {
    let n_samples = abundance.n_samples();
    if n_samples == 0 || abundance.n_proteins() == 0 {
        return Err(DeaError::EmptyData(
            "Cannot median-normalize an empty matrix".to_string(),
        ));
    }

    let mut sample_medians = Vec::with_capacity(n_samples);
    for (j, sample_id) in abundance.sample_ids().iter().enumerate() {
        let mut observed: Vec<f64> = abundance
            .col(j)
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect();
        let median = median_in_place(&mut observed).ok_or_else(|| {
            DeaError::Numerical(format!("Sample '{}' has no observed values", sample_id))
        })?;
        if median <= 0.0 {
            return Err(DeaError::Numerical(format!(
                "Sample '{}' has non-positive median intensity {}",
                sample_id, median
            )));
        }
        sample_medians.push(median);
    }

    let mut medians_sorted = sample_medians.clone();
    // Safe: all medians are finite and positive here.
    let target = median_in_place(&mut medians_sorted).unwrap();

    let data = DMatrix::from_fn(abundance.n_proteins(), n_samples, |i, j| {
        let v = abundance.get(i, j);
        if v.is_nan() {
            f64::NAN
        } else {
            v * target / sample_medians[j]
        }
    });

    abundance.with_data(data)
}

/// Median of a slice, sorting it in place. `None` when empty.
pub(crate) fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    }
}
