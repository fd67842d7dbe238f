//! Design matrix construction for the per-protein linear model.

use crate::data::metadata::{Diagnosis, SampleMetadata};
use crate::error::{DeaError, Result};
use nalgebra::DMatrix;

/// A design matrix for the diagnosis model with a chosen reference level.
///
/// Columns are, in order: intercept, one dummy per non-reference diagnosis
/// level present in the data (canonical enum order), one dummy per
/// non-reference sex level (alphabetical reference), then the continuous
/// covariates `education`, `age_death`, `pmi`.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// The design matrix (samples × coefficients).
    matrix: DMatrix<f64>,
    /// Names of the coefficients (columns).
    coefficient_names: Vec<String>,
    /// Sample IDs (rows).
    sample_ids: Vec<String>,
    /// Reference level for the diagnosis factor.
    reference: Diagnosis,
}

impl DesignMatrix {
    /// Create a design matrix directly from components.
    ///
    /// Useful for reduced or hand-built designs in tests and diagnostics.
    pub fn from_parts(
        matrix: DMatrix<f64>,
        coefficient_names: Vec<String>,
        sample_ids: Vec<String>,
        reference: Diagnosis,
    ) -> Self {
        Self {
            matrix,
            coefficient_names,
            sample_ids,
            reference,
        }
    }

    /// Build the design for `log2(intensity) ~ diagnosis + sex + education +
    /// age_death + pmi` with the given diagnosis reference level.
    ///
    /// Only diagnosis levels present in the metadata get a dummy column;
    /// absent levels would produce all-zero columns and a singular model.
    /// The reference level itself must be present.
    pub fn for_diagnosis(metadata: &SampleMetadata, reference: Diagnosis) -> Result<Self> {
        let n_samples = metadata.n_samples();
        if n_samples == 0 {
            return Err(DeaError::EmptyData("No samples for design matrix".to_string()));
        }

        let present = metadata.present_diagnoses();
        if !present.contains(&reference) {
            return Err(DeaError::InvalidParameter(format!(
                "Reference level '{}' has no samples",
                reference
            )));
        }

        let mut coefficient_names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        coefficient_names.push("(Intercept)".to_string());
        columns.push(vec![1.0; n_samples]);

        // Diagnosis dummies, canonical order, reference skipped.
        for level in present.iter().copied().filter(|d| *d != reference) {
            coefficient_names.push(format!("diagnosis{}", level.label()));
            columns.push(
                metadata
                    .iter()
                    .map(|s| if s.diagnosis == level { 1.0 } else { 0.0 })
                    .collect(),
            );
        }

        // Sex dummies: alphabetically first level is the reference.
        let sex_levels = metadata.sex_levels();
        for level in sex_levels.iter().skip(1) {
            coefficient_names.push(format!("sex{}", level));
            columns.push(
                metadata
                    .iter()
                    .map(|s| if s.sex == *level { 1.0 } else { 0.0 })
                    .collect(),
            );
        }

        // Continuous covariates.
        coefficient_names.push("education".to_string());
        columns.push(metadata.iter().map(|s| s.education).collect());
        coefficient_names.push("age_death".to_string());
        columns.push(metadata.iter().map(|s| s.age_death).collect());
        coefficient_names.push("pmi".to_string());
        columns.push(metadata.iter().map(|s| s.pmi).collect());

        let n_coef = columns.len();
        let mut matrix = DMatrix::zeros(n_samples, n_coef);
        for (col_idx, col) in columns.iter().enumerate() {
            for (row_idx, &val) in col.iter().enumerate() {
                matrix[(row_idx, col_idx)] = val;
            }
        }

        Ok(Self {
            matrix,
            coefficient_names,
            sample_ids: metadata.iter().map(|s| s.sample_id.clone()).collect(),
            reference,
        })
    }

    /// Get the design matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Get coefficient names.
    pub fn coefficient_names(&self) -> &[String] {
        &self.coefficient_names
    }

    /// Get sample IDs (row order).
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of coefficients (columns).
    pub fn n_coefficients(&self) -> usize {
        self.matrix.ncols()
    }

    /// The diagnosis reference level this design encodes.
    pub fn reference(&self) -> Diagnosis {
        self.reference
    }

    /// Get the index of a coefficient by name.
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names.iter().position(|n| n == name)
    }

    /// Index of the dummy coefficient for a non-reference diagnosis level.
    pub fn diagnosis_coefficient(&self, level: Diagnosis) -> Option<usize> {
        self.coefficient_index(&format!("diagnosis{}", level.label()))
    }
}
