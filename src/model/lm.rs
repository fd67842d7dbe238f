//! Per-protein linear model fitting via OLS.

use crate::data::{AbundanceMatrix, DesignMatrix};
use crate::error::{DeaError, Result};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Results from fitting a linear model to a single protein.
///
/// A failed fit (all-missing response, zero variance) carries NaN
/// coefficients and `ok = false`; it is never silently coerced to zero
/// estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmFitSingle {
    /// Protein accession.
    pub protein_id: String,
    /// Estimated coefficients, design-column order.
    pub coefficients: Vec<f64>,
    /// Standard errors of coefficients.
    pub std_errors: Vec<f64>,
    /// Residual standard error (sigma).
    pub sigma: f64,
    /// R-squared.
    pub r_squared: f64,
    /// Degrees of freedom (residual).
    pub df_residual: usize,
    /// Whether the fit produced defined estimates.
    pub ok: bool,
}

impl LmFitSingle {
    /// Get coefficient by index.
    pub fn coefficient(&self, index: usize) -> Option<f64> {
        self.coefficients.get(index).copied()
    }

    /// t-statistic for a coefficient; NaN when undefined.
    pub fn t_statistic(&self, index: usize) -> f64 {
        let coef = self.coefficients.get(index).copied().unwrap_or(f64::NAN);
        let se = self.std_errors.get(index).copied().unwrap_or(f64::NAN);
        if se > 0.0 && !se.is_nan() {
            coef / se
        } else {
            f64::NAN
        }
    }

    /// Two-sided p-value for a coefficient being non-zero (OLS t-test).
    pub fn p_value(&self, index: usize) -> f64 {
        let statistic = self.t_statistic(index);
        if statistic.is_nan() || self.df_residual == 0 {
            return f64::NAN;
        }
        let t_dist = StudentsT::new(0.0, 1.0, self.df_residual as f64).unwrap();
        2.0 * (1.0 - t_dist.cdf(statistic.abs()))
    }

    fn failed(protein_id: &str, n_coef: usize, df_residual: usize) -> Self {
        Self {
            protein_id: protein_id.to_string(),
            coefficients: vec![f64::NAN; n_coef],
            std_errors: vec![f64::NAN; n_coef],
            sigma: f64::NAN,
            r_squared: f64::NAN,
            df_residual,
            ok: false,
        }
    }
}

/// Results from fitting linear models to all proteins against one design.
#[derive(Debug, Clone)]
pub struct LmFit {
    /// Individual fits, abundance row order.
    pub fits: Vec<LmFitSingle>,
    /// Coefficient names from the design matrix.
    pub coefficient_names: Vec<String>,
    /// Number of samples.
    pub n_samples: usize,
}

impl LmFit {
    /// Get the fit for a specific protein by accession.
    pub fn get_protein(&self, protein_id: &str) -> Option<&LmFitSingle> {
        self.fits.iter().find(|f| f.protein_id == protein_id)
    }

    /// Get coefficient index by name.
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names.iter().position(|n| n == name)
    }

    /// Number of proteins.
    pub fn n_proteins(&self) -> usize {
        self.fits.len()
    }

    /// Count fits with defined estimates.
    pub fn n_ok(&self) -> usize {
        self.fits.iter().filter(|f| f.ok).count()
    }
}

/// Fit one OLS regression per protein against a shared design matrix.
///
/// The response for protein `i` is row `i` of the (log2-transformed,
/// imputed) abundance matrix; the design rows are the matrix's sample
/// columns. Sample identifiers are compared element-wise before any
/// computation — the protein-major/sample-major transpose must preserve the
/// key correspondence exactly, so a reordered design is an integrity error,
/// not a silent misjoin.
///
/// Uses a single precomputed `(XᵀX)⁻¹` shared across proteins; fitting is
/// parallel over proteins and deterministic. A singular shared design is
/// fatal; per-protein degeneracies (all-missing response, zero variance)
/// yield NaN fits and continue the batch.
pub fn model_lm(abundance: &AbundanceMatrix, design: &DesignMatrix) -> Result<LmFit> {
    let n_proteins = abundance.n_proteins();
    let n_samples = abundance.n_samples();
    let n_coef = design.n_coefficients();

    if design.n_samples() != n_samples {
        return Err(DeaError::DimensionMismatch {
            expected: n_samples,
            actual: design.n_samples(),
        });
    }
    if abundance.sample_ids() != design.sample_ids() {
        return Err(DeaError::SampleMismatch(
            "abundance columns and design rows disagree in sample order".to_string(),
        ));
    }

    let df_residual = n_samples.saturating_sub(n_coef);
    if df_residual == 0 {
        return Err(DeaError::Numerical(
            "Model is saturated (n_samples <= n_coefficients)".to_string(),
        ));
    }

    let x = design.matrix();
    let xtx = x.transpose() * x;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| {
        DeaError::Numerical("Design matrix is singular (X'X not invertible)".to_string())
    })?;

    let fits: Vec<LmFitSingle> = (0..n_proteins)
        .into_par_iter()
        .map(|i| {
            fit_single_protein(
                &abundance.row(i),
                &abundance.protein_ids()[i],
                x,
                &xtx_inv,
                n_samples,
                n_coef,
                df_residual,
            )
        })
        .collect();

    Ok(LmFit {
        fits,
        coefficient_names: design.coefficient_names().to_vec(),
        n_samples,
    })
}

/// Fit a single protein using the shared `(XᵀX)⁻¹`.
fn fit_single_protein(
    y: &[f64],
    protein_id: &str,
    x: &DMatrix<f64>,
    xtx_inv: &DMatrix<f64>,
    n_samples: usize,
    n_coef: usize,
    df_residual: usize,
) -> LmFitSingle {
    // All-missing rows survive imputation as NaN; record the failure.
    if y.iter().any(|v| v.is_nan()) {
        return LmFitSingle::failed(protein_id, n_coef, df_residual);
    }

    // A zero-variance response has no defined contrast estimates.
    let y_mean = y.iter().sum::<f64>() / n_samples as f64;
    let tss: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    if tss == 0.0 {
        return LmFitSingle::failed(protein_id, n_coef, df_residual);
    }

    let y_vec = DVector::from_column_slice(y);

    // beta = (X'X)^-1 X'y
    let xty = x.transpose() * &y_vec;
    let beta = xtx_inv * xty;
    let coefficients: Vec<f64> = beta.iter().cloned().collect();

    let y_hat = x * &beta;
    let residuals = &y_vec - &y_hat;
    let rss: f64 = residuals.iter().map(|e| e * e).sum();

    let sigma = (rss / df_residual as f64).sqrt();
    let std_errors: Vec<f64> = (0..n_coef)
        .map(|j| sigma * xtx_inv[(j, j)].sqrt())
        .collect();

    let r_squared = 1.0 - rss / tss;

    LmFitSingle {
        protein_id: protein_id.to_string(),
        coefficients,
        std_errors,
        sigma,
        r_squared,
        df_residual,
        ok: true,
    }
}
