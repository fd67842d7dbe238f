//! Pipeline runner for composing and executing analysis stages.

use crate::data::{
    AbundanceMatrix, DeResultSet, IdSet, ProteinAnnotations, SampleMetadata,
};
use crate::error::{DeaError, Result};
use crate::filter::{filter_missingness, filter_panel};
use crate::model::{build_de_results, fit_all_contrasts, ContrastTable};
use crate::normalize::{normalize_median, normalize_quantile};
use crate::transform::{impute_row_min, log2_transform};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default missing-value threshold: at most 30 missing values per protein.
pub const DEFAULT_MAX_MISSING: usize = 30;

/// A step in the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Drop proteins with more than `max_missing` missing values.
    FilterMissingness { max_missing: usize },
    /// Restrict to an inclusion panel loaded from a single-column TSV.
    FilterPanel { list: String },
    /// Equalize per-sample medians.
    NormalizeMedian,
    /// Full quantile normalization across samples.
    NormalizeQuantile,
    /// Log2-transform intensities.
    Log2Transform,
    /// Impute missing values with each protein's minimum observed value.
    ImputeRowMin,
    /// Fit the diagnosis model under every reference level and extract all
    /// pairwise contrasts.
    ModelContrasts,
    /// Pool all (protein × contrast) p-values and apply Benjamini-Hochberg.
    CorrectBH,
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(DeaError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(DeaError::from)
    }
}

/// Builder for constructing and running analysis pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Add missingness filtering.
    pub fn filter_missingness(mut self, max_missing: usize) -> Self {
        self.steps
            .push(PipelineStep::FilterMissingness { max_missing });
        self
    }

    /// Add panel filtering from a single-column TSV.
    pub fn filter_panel(mut self, list: &str) -> Self {
        self.steps.push(PipelineStep::FilterPanel {
            list: list.to_string(),
        });
        self
    }

    /// Add median normalization.
    pub fn normalize_median(mut self) -> Self {
        self.steps.push(PipelineStep::NormalizeMedian);
        self
    }

    /// Add quantile normalization.
    pub fn normalize_quantile(mut self) -> Self {
        self.steps.push(PipelineStep::NormalizeQuantile);
        self
    }

    /// Add the log2 transform.
    pub fn log2_transform(mut self) -> Self {
        self.steps.push(PipelineStep::Log2Transform);
        self
    }

    /// Add minimum-value imputation.
    pub fn impute_row_min(mut self) -> Self {
        self.steps.push(PipelineStep::ImputeRowMin);
        self
    }

    /// Add the contrast model fits.
    pub fn model_contrasts(mut self) -> Self {
        self.steps.push(PipelineStep::ModelContrasts);
        self
    }

    /// Add pooled BH correction.
    pub fn correct_bh(mut self) -> Self {
        self.steps.push(PipelineStep::CorrectBH);
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on data.
    ///
    /// The metadata is aligned to the matrix's sample columns before the
    /// first step; any sample-set mismatch aborts here with the offending
    /// identifiers.
    pub fn run(
        &self,
        abundance: &AbundanceMatrix,
        annotations: &ProteinAnnotations,
        metadata: &SampleMetadata,
    ) -> Result<DeResultSet> {
        let metadata = metadata.align_to(abundance.sample_ids())?;
        let mut state = PipelineState::new(abundance.clone(), metadata);

        for (i, step) in self.steps.iter().enumerate() {
            state = state.apply(step, annotations).map_err(|e| {
                DeaError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        state.finalize()
    }
}

/// Internal state during pipeline execution.
struct PipelineState {
    abundance: AbundanceMatrix,
    metadata: SampleMetadata,
    log2_done: bool,
    imputed: bool,
    contrast_table: Option<ContrastTable>,
    de_results: Option<DeResultSet>,
}

impl PipelineState {
    fn new(abundance: AbundanceMatrix, metadata: SampleMetadata) -> Self {
        Self {
            abundance,
            metadata,
            log2_done: false,
            imputed: false,
            contrast_table: None,
            de_results: None,
        }
    }

    fn apply(mut self, step: &PipelineStep, annotations: &ProteinAnnotations) -> Result<Self> {
        match step {
            PipelineStep::FilterMissingness { max_missing } => {
                let (filtered, report) = filter_missingness(&self.abundance, *max_missing)?;
                info!(
                    n_before = report.n_before,
                    n_kept = report.n_kept,
                    max_missing = report.max_missing,
                    "missingness filter applied"
                );
                self.abundance = filtered;
            }
            PipelineStep::FilterPanel { list } => {
                let panel = IdSet::from_tsv(list)?;
                self.abundance = filter_panel(&self.abundance, annotations, &panel)?;
                info!(
                    panel = panel.name(),
                    n_kept = self.abundance.n_proteins(),
                    "panel filter applied"
                );
            }
            PipelineStep::NormalizeMedian => {
                self.abundance = normalize_median(&self.abundance)?;
            }
            PipelineStep::NormalizeQuantile => {
                self.abundance = normalize_quantile(&self.abundance)?;
            }
            PipelineStep::Log2Transform => {
                self.abundance = log2_transform(&self.abundance)?;
                self.log2_done = true;
            }
            PipelineStep::ImputeRowMin => {
                self.abundance = impute_row_min(&self.abundance)?;
                self.imputed = true;
            }
            PipelineStep::ModelContrasts => {
                if !self.log2_done {
                    return Err(DeaError::Pipeline(
                        "Must log2-transform before fitting models".to_string(),
                    ));
                }
                if !self.imputed {
                    return Err(DeaError::Pipeline(
                        "Must impute missing values before fitting models".to_string(),
                    ));
                }
                self.contrast_table =
                    Some(fit_all_contrasts(&self.abundance, &self.metadata)?);
            }
            PipelineStep::CorrectBH => {
                let table = self.contrast_table.as_ref().ok_or_else(|| {
                    DeaError::Pipeline("Must fit models before BH correction".to_string())
                })?;
                self.de_results = Some(build_de_results(table, annotations));
            }
        }
        Ok(self)
    }

    fn finalize(self) -> Result<DeResultSet> {
        self.de_results.ok_or_else(|| {
            DeaError::Pipeline("Pipeline must include a correction step".to_string())
        })
    }
}

/// Run the reference workflow: missingness filter, median and quantile
/// normalization, log2, minimum-value imputation, all-contrast model fits,
/// pooled BH correction. The optional panel restricts proteins after the
/// missingness filter.
pub fn run_standard(
    abundance: &AbundanceMatrix,
    annotations: &ProteinAnnotations,
    metadata: &SampleMetadata,
    max_missing: usize,
    panel: Option<&IdSet>,
) -> Result<DeResultSet> {
    let metadata = metadata.align_to(abundance.sample_ids())?;

    let (mut processed, report) = filter_missingness(abundance, max_missing)?;
    info!(
        n_before = report.n_before,
        n_kept = report.n_kept,
        "missingness filter applied"
    );
    if let Some(p) = panel {
        processed = filter_panel(&processed, annotations, p)?;
        info!(
            panel = p.name(),
            n_kept = processed.n_proteins(),
            "panel filter applied"
        );
    }

    let processed = normalize_median(&processed)?;
    let processed = normalize_quantile(&processed)?;
    let processed = log2_transform(&processed)?;
    let processed = impute_row_min(&processed)?;

    let table = fit_all_contrasts(&processed, &metadata)?;
    let results = build_de_results(&table, annotations);
    info!(
        n_rows = results.len(),
        n_tests = results.n_tests,
        "differential expression complete"
    );
    Ok(results)
}
