//! Subcellular-compartment enrichment statistics.

pub mod fisher;

pub use fisher::fisher_exact_two_sided;

use crate::correct::adjust_bonferroni;
use crate::data::{AbundanceMatrix, CategoryLists, IdSet, ProteinAnnotations};
use crate::error::{DeaError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Name given to the whole-dataset pseudo-category.
pub const BACKGROUND_CATEGORY: &str = "background";

/// Raw 2×2 contingency counts for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentCount {
    pub category: String,
    /// Size of the category's reference list.
    pub n_protein: u64,
    /// Observed identifiers that are also on the list.
    pub in_set: u64,
}

/// Direction of a category's enrichment relative to background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrichmentDirection {
    Enriched,
    Depleted,
}

impl EnrichmentDirection {
    pub fn name(&self) -> &'static str {
        match self {
            EnrichmentDirection::Enriched => "Enriched",
            EnrichmentDirection::Depleted => "Depleted",
        }
    }
}

/// Significance tier from an adjusted p-value.
pub fn significance_stars(p_adj: f64) -> &'static str {
    if p_adj.is_nan() {
        ""
    } else if p_adj <= 0.0001 {
        "****"
    } else if p_adj <= 0.001 {
        "***"
    } else if p_adj <= 0.01 {
        "**"
    } else if p_adj <= 0.05 {
        "*"
    } else {
        ""
    }
}

/// Full result row for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub category: String,
    pub n_protein: u64,
    pub in_set: u64,
    /// Percentage of the reference list observed in the dataset.
    pub proportion: f64,
    /// Category proportion over background proportion.
    pub fold_enrichment: f64,
    /// Two-sided Fisher's exact p-value.
    pub p_value: f64,
    /// Bonferroni-adjusted p-value.
    pub p_adj: f64,
    pub direction: EnrichmentDirection,
    /// Star tier derived from `p_adj`.
    pub significance: String,
}

/// Enrichment results for all categories.
///
/// The background row is kept for transparency but is excluded from the
/// output table — it is the statistical denominator, not a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentAnalysis {
    pub background: EnrichmentCount,
    /// One row per category, case-insensitive name order.
    pub records: Vec<EnrichmentRecord>,
}

impl EnrichmentAnalysis {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&EnrichmentRecord> {
        self.records.iter().find(|r| r.category == category)
    }

    /// Write the category table to TSV, background excluded.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "category\tn_protein\tin_set\tproportion\tfold_enrichment\tp.value\tp.adj\tdirection\tsignificance"
        )?;
        for r in &self.records {
            writeln!(
                writer,
                "{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4e}\t{:.4e}\t{}\t{}",
                r.category,
                r.n_protein,
                r.in_set,
                r.proportion,
                r.fold_enrichment,
                r.p_value,
                r.p_adj,
                r.direction.name(),
                r.significance,
            )?;
        }
        Ok(())
    }
}

/// Gene identifiers observed in a processed abundance matrix.
///
/// Uses the gene symbol when annotated, the accession otherwise; the set is
/// unique by construction.
pub fn observed_genes(abundance: &AbundanceMatrix, annotations: &ProteinAnnotations) -> IdSet {
    let mut observed = IdSet::new("observed");
    for accession in abundance.protein_ids() {
        match annotations.gene(accession).filter(|g| !g.is_empty()) {
            Some(gene) => observed.insert(gene),
            None => observed.insert(accession),
        }
    }
    observed
}

/// Run the enrichment analysis over every category.
///
/// For each category the 2×2 table
/// `[[background.n_protein, background.in_set], [n_protein, in_set]]`
/// goes through a two-sided Fisher's exact test; the p-values are then
/// Bonferroni-corrected across categories (the background row is the
/// denominator of every fold-enrichment and is never itself tested).
pub fn analyze_enrichment(
    observed: &IdSet,
    categories: &CategoryLists,
    proteome: &IdSet,
) -> Result<EnrichmentAnalysis> {
    if proteome.is_empty() {
        return Err(DeaError::EmptyData("Empty proteome reference".to_string()));
    }
    if categories.is_empty() {
        return Err(DeaError::EmptyData("No categories to test".to_string()));
    }

    let background = EnrichmentCount {
        category: BACKGROUND_CATEGORY.to_string(),
        n_protein: proteome.len() as u64,
        in_set: observed.len() as u64,
    };
    let background_proportion =
        background.in_set as f64 / background.n_protein as f64 * 100.0;
    if background_proportion == 0.0 {
        return Err(DeaError::Numerical(
            "Background proportion is zero; fold enrichment undefined".to_string(),
        ));
    }

    // Counts and raw p-values, categories already in case-insensitive order.
    let mut counts = Vec::with_capacity(categories.len());
    let mut p_values = Vec::with_capacity(categories.len());
    for list in categories.iter() {
        let in_set = observed
            .iter()
            .filter(|id| list.contains(id.as_str()))
            .count() as u64;
        let count = EnrichmentCount {
            category: list.name().to_string(),
            n_protein: list.len() as u64,
            in_set,
        };
        let p = fisher_exact_two_sided(
            background.n_protein,
            background.in_set,
            count.n_protein,
            count.in_set,
        )?;
        debug!(category = %count.category, in_set, p, "category tested");
        counts.push(count);
        p_values.push(p);
    }

    let p_adj = adjust_bonferroni(&p_values);

    let records = counts
        .into_iter()
        .zip(p_values.iter().zip(p_adj.iter()))
        .map(|(count, (&p, &q))| {
            let proportion = if count.n_protein > 0 {
                count.in_set as f64 / count.n_protein as f64 * 100.0
            } else {
                0.0
            };
            let fold_enrichment = proportion / background_proportion;
            let direction = if fold_enrichment > 1.0 {
                EnrichmentDirection::Enriched
            } else {
                EnrichmentDirection::Depleted
            };
            EnrichmentRecord {
                category: count.category,
                n_protein: count.n_protein,
                in_set: count.in_set,
                proportion,
                fold_enrichment,
                p_value: p,
                p_adj: q,
                direction,
                significance: significance_stars(q).to_string(),
            }
        })
        .collect();

    Ok(EnrichmentAnalysis {
        background,
        records,
    })
}
