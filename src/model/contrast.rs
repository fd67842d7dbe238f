//! Pairwise diagnosis contrasts extracted from multiple reference-level fits.

use crate::correct::adjust_bh;
use crate::data::{
    AbundanceMatrix, DeRecord, DeResultSet, DesignMatrix, Diagnosis, Direction,
    ProteinAnnotations, SampleMetadata, SIGNIFICANCE_ALPHA,
};
use crate::error::{DeaError, Result};
use crate::model::lm::model_lm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One pairwise comparison between two diagnosis levels.
///
/// `log_fc > 0` means higher abundance in `test` than in `reference`,
/// covariates held fixed. The canonical name is `{test}_over_{reference}`
/// and is a pure function of the level pair, independent of which model fit
/// produced the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contrast {
    pub test: Diagnosis,
    pub reference: Diagnosis,
}

impl Contrast {
    pub fn new(test: Diagnosis, reference: Diagnosis) -> Self {
        Self { test, reference }
    }

    /// Canonical contrast name, e.g. `Dementia-AD_over_Normal`.
    pub fn name(&self) -> String {
        format!("{}_over_{}", self.test.label(), self.reference.label())
    }

    /// All C(4,2) = 6 pairwise contrasts among the full level set, in
    /// canonical order: the test level always follows the reference level
    /// in `Diagnosis::ALL`.
    pub fn all_pairwise() -> Vec<Contrast> {
        Self::pairwise(&Diagnosis::ALL)
    }

    /// Pairwise contrasts among a subset of levels (canonical order).
    pub fn pairwise(levels: &[Diagnosis]) -> Vec<Contrast> {
        let mut contrasts = Vec::new();
        for (i, &reference) in levels.iter().enumerate() {
            for &test in &levels[i + 1..] {
                contrasts.push(Contrast::new(test, reference));
            }
        }
        contrasts
    }
}

impl std::fmt::Display for Contrast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Estimate and raw p-value for one (protein, contrast) cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContrastCell {
    pub log_fc: f64,
    pub p_value: f64,
}

/// Per-protein contrast estimates for every pairwise diagnosis comparison.
///
/// Rows follow the abundance matrix's protein order; columns follow the
/// canonical contrast order. Each contrast appears exactly once.
#[derive(Debug, Clone)]
pub struct ContrastTable {
    protein_ids: Vec<String>,
    contrasts: Vec<Contrast>,
    /// Row-major (protein × contrast) cells.
    cells: Vec<ContrastCell>,
}

impl ContrastTable {
    pub fn protein_ids(&self) -> &[String] {
        &self.protein_ids
    }

    pub fn contrasts(&self) -> &[Contrast] {
        &self.contrasts
    }

    pub fn n_proteins(&self) -> usize {
        self.protein_ids.len()
    }

    pub fn n_contrasts(&self) -> usize {
        self.contrasts.len()
    }

    /// Cell for (protein row, contrast column).
    pub fn cell(&self, protein: usize, contrast: usize) -> ContrastCell {
        self.cells[protein * self.contrasts.len() + contrast]
    }
}

/// Fit the diagnosis model under every needed reference level and extract
/// all pairwise contrasts.
///
/// OLS with a dummy-coded factor only estimates contrasts against the
/// current reference level, so the model is refit once per reference:
/// for four levels the fit with reference Normal yields three contrasts,
/// the Dementia-AD fit two more, and the Resilient fit the last one.
/// Contrasts already obtained from an earlier fit are never re-extracted —
/// each (test, reference) pair is read from exactly one fit, the one whose
/// reference is the pair's reference level. Every fit is a pure function of
/// (data, reference); no design or factor state is mutated between fits.
///
/// The abundance matrix must be log2-transformed and imputed; the metadata
/// must already be aligned to its sample columns. At least two diagnosis
/// levels must be present.
pub fn fit_all_contrasts(
    abundance: &AbundanceMatrix,
    metadata: &SampleMetadata,
) -> Result<ContrastTable> {
    let present = metadata.present_diagnoses();
    if present.len() < 2 {
        return Err(DeaError::InvalidParameter(format!(
            "Need at least two diagnosis levels, found {}",
            present.len()
        )));
    }

    let contrasts = Contrast::pairwise(&present);
    let n_proteins = abundance.n_proteins();
    let n_contrasts = contrasts.len();

    // References that own at least one contrast: all present levels but the
    // canonically last.
    let references: BTreeSet<Diagnosis> = contrasts.iter().map(|c| c.reference).collect();

    let mut cells = vec![
        ContrastCell {
            log_fc: f64::NAN,
            p_value: f64::NAN,
        };
        n_proteins * n_contrasts
    ];

    for reference in references {
        let design = DesignMatrix::for_diagnosis(metadata, reference)?;
        let fit = model_lm(abundance, &design)?;
        debug!(
            reference = reference.label(),
            n_ok = fit.n_ok(),
            n_proteins,
            "reference-level fit complete"
        );

        for (col, contrast) in contrasts.iter().enumerate() {
            if contrast.reference != reference {
                continue;
            }
            let coef_idx = design
                .diagnosis_coefficient(contrast.test)
                .ok_or_else(|| {
                    DeaError::Numerical(format!(
                        "No coefficient for contrast '{}' in reference-{} fit",
                        contrast, reference
                    ))
                })?;
            for (row, single) in fit.fits.iter().enumerate() {
                cells[row * n_contrasts + col] = ContrastCell {
                    log_fc: single.coefficients.get(coef_idx).copied().unwrap_or(f64::NAN),
                    p_value: single.p_value(coef_idx),
                };
            }
        }
    }

    Ok(ContrastTable {
        protein_ids: abundance.protein_ids().to_vec(),
        contrasts,
        cells,
    })
}

/// Turn a contrast table into the final DE result set.
///
/// Benjamini-Hochberg runs once over the pooled (protein × contrast)
/// p-values — not per contrast, not per protein. Row order is protein order
/// × canonical contrast order, so repeated runs are byte-identical.
pub fn build_de_results(
    table: &ContrastTable,
    annotations: &ProteinAnnotations,
) -> DeResultSet {
    let n_contrasts = table.n_contrasts();
    let contrast_names: Vec<String> = table.contrasts().iter().map(|c| c.name()).collect();

    let p_values: Vec<f64> = (0..table.n_proteins())
        .flat_map(|row| (0..n_contrasts).map(move |col| table.cell(row, col).p_value))
        .collect();
    let adjusted = adjust_bh(&p_values);

    let mut records = Vec::with_capacity(p_values.len());
    for (row, accession) in table.protein_ids().iter().enumerate() {
        let gene = annotations.gene(accession).unwrap_or("").to_string();
        let description = annotations.description(accession).unwrap_or("").to_string();
        for col in 0..n_contrasts {
            let cell = table.cell(row, col);
            let p_adj = adjusted.p_adj[row * n_contrasts + col];
            records.push(DeRecord {
                accession: accession.clone(),
                gene: gene.clone(),
                description: description.clone(),
                contrast: contrast_names[col].clone(),
                log_fc: cell.log_fc,
                p_value: cell.p_value,
                p_adj,
                significant: !p_adj.is_nan() && p_adj <= SIGNIFICANCE_ALPHA,
                direction: Direction::from_log_fc(cell.log_fc),
            });
        }
    }

    DeResultSet::new(records, adjusted.n_tests)
}
