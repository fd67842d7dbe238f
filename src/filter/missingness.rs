//! Missing-value filtering for abundance matrices.

use crate::data::AbundanceMatrix;
use crate::error::{DeaError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Report from a missingness filter pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingnessReport {
    /// Proteins before filtering.
    pub n_before: usize,
    /// Proteins kept.
    pub n_kept: usize,
    /// Maximum allowed missing count per protein.
    pub max_missing: usize,
    /// The threshold expressed as a fraction of available samples.
    pub max_missing_fraction: f64,
}

/// Filter proteins by missing-value count.
///
/// Keeps proteins with at most `max_missing` missing values across all
/// samples. Proteins with no observed values at all are always dropped —
/// normalization is undefined for them. The filter is order-preserving.
///
/// # Arguments
/// * `abundance` - Protein-major intensity matrix
/// * `max_missing` - Maximum missing count per protein (reference default 30)
///
/// # Returns
/// The filtered matrix and a report with kept/dropped counts.
pub fn filter_missingness(
    abundance: &AbundanceMatrix,
    max_missing: usize,
) -> Result<(AbundanceMatrix, MissingnessReport)> {
    let n_samples = abundance.n_samples();
    let n_before = abundance.n_proteins();

    let keep_indices: Vec<usize> = (0..n_before)
        .into_par_iter()
        .filter(|&row| {
            let missing = abundance.missing_count(row);
            missing <= max_missing && missing < n_samples
        })
        .collect();

    if keep_indices.is_empty() {
        return Err(DeaError::EmptyData(format!(
            "No proteins pass the missingness threshold of {} / {} samples",
            max_missing, n_samples
        )));
    }

    let filtered = abundance.subset_proteins(&keep_indices)?;
    let report = MissingnessReport {
        n_before,
        n_kept: filtered.n_proteins(),
        max_missing,
        max_missing_fraction: max_missing as f64 / n_samples as f64,
    };
    Ok((filtered, report))
}
