//! Differential-expression analysis core for quantitative proteomics.
//!
//! This library implements the statistical core of a TMT proteomics
//! pipeline: missingness filtering, median and quantile normalization,
//! per-protein OLS linear models across diagnosis contrasts, compartment
//! enrichment statistics, and ranked-list construction for gene-set
//! enrichment analysis.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AbundanceMatrix, SampleMetadata,
//!   DesignMatrix, result tables, reference lists)
//! - **filter**: Protein filtering (missingness, inclusion panels)
//! - **normalize**: Normalization (sample-median scaling, quantile)
//! - **transform**: Log2 transform and minimum-value imputation
//! - **model**: Per-protein linear models and pairwise diagnosis contrasts
//! - **correct**: Multiple testing correction (Benjamini-Hochberg,
//!   Bonferroni)
//! - **enrich**: Compartment enrichment via Fisher's exact test
//! - **rank**: Signed-significance ranking metric for GSEA
//! - **gsea**: Gene-set database loading and the external engine contract
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use proteo_dea::prelude::*;
//!
//! // Load data
//! let (abundance, annotations) = AbundanceMatrix::from_tsv("abundance.tsv").unwrap();
//! let metadata = SampleMetadata::from_tsv("metadata.tsv").unwrap();
//!
//! // Run the reference workflow
//! let results = run_standard(&abundance, &annotations, &metadata, 30, None).unwrap();
//! results.to_tsv("de_results.tsv").unwrap();
//! ```

pub mod correct;
pub mod data;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod gsea;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod transform;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correct::{adjust_bh, adjust_bonferroni, BhAdjusted};
    pub use crate::data::{
        AbundanceMatrix, CategoryLists, DeRecord, DeResultSet, DeSummary, DesignMatrix,
        Diagnosis, Direction, IdMap, IdSet, ProteinAnnotations, ProteinRecord, SampleInfo,
        SampleMetadata, SIGNIFICANCE_ALPHA,
    };
    pub use crate::enrich::{
        analyze_enrichment, fisher_exact_two_sided, observed_genes, significance_stars,
        EnrichmentAnalysis, EnrichmentCount, EnrichmentDirection, EnrichmentRecord,
    };
    pub use crate::error::{DeaError, Result};
    pub use crate::filter::{filter_missingness, filter_panel, MissingnessReport};
    pub use crate::gsea::{GeneSet, GeneSetCollection, GseaEngine, GseaRecord};
    pub use crate::model::{
        build_de_results, fit_all_contrasts, model_lm, Contrast, ContrastCell, ContrastTable,
        LmFit, LmFitSingle,
    };
    pub use crate::normalize::{normalize_median, normalize_quantile};
    pub use crate::pipeline::{
        run_standard, Pipeline, PipelineConfig, PipelineStep, DEFAULT_MAX_MISSING,
    };
    pub use crate::rank::{build_ranking, ranking_score, RankedGeneList};
    pub use crate::transform::{impute_row_min, log2_transform};
}
