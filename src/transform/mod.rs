//! Elementwise transforms applied between normalization and modeling.

use crate::data::AbundanceMatrix;
use crate::error::{DeaError, Result};
use nalgebra::DMatrix;

/// Log2-transform every observed intensity.
///
/// Downstream modeling assumes approximate normality on the log scale.
/// Missing values pass through; a non-positive observed value has no
/// logarithm and aborts the stage naming the offending cell.
pub fn log2_transform(abundance: &AbundanceMatrix) -> Result<AbundanceMatrix> {
    let n = abundance.n_proteins();
    let m = abundance.n_samples();

    let mut data = DMatrix::from_element(n, m, f64::NAN);
    for i in 0..n {
        for j in 0..m {
            let v = abundance.get(i, j);
            if v.is_nan() {
                continue;
            }
            if v <= 0.0 {
                return Err(DeaError::Numerical(format!(
                    "Non-positive intensity {} for protein '{}' in sample '{}'",
                    v,
                    abundance.protein_ids()[i],
                    abundance.sample_ids()[j]
                )));
            }
            data[(i, j)] = v.log2();
        }
    }

    abundance.with_data(data)
}

/// Impute missing values with the protein's minimum observed value.
///
/// This reproduces the reference pipeline's imputation policy. It is a
/// documented limitation: the imputed values sit at the protein's observed
/// floor, which biases fold-changes upward for proteins missing
/// predominantly in one group. Proteins with no observed values at all are
/// left untouched; their fits are recorded as NA downstream rather than
/// aborting the batch.
pub fn impute_row_min(abundance: &AbundanceMatrix) -> Result<AbundanceMatrix> {
    let n = abundance.n_proteins();
    let m = abundance.n_samples();

    let mut data = abundance.matrix().clone();
    for i in 0..n {
        if let Some(row_min) = abundance.row_min_observed(i) {
            for j in 0..m {
                if data[(i, j)].is_nan() {
                    data[(i, j)] = row_min;
                }
            }
        }
    }

    abundance.with_data(data)
}
