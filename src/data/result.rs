//! Result types for differential-expression analysis.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Significance threshold applied to adjusted p-values.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;

/// Direction of a differential-expression effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Direction from a log2 fold-change; `None` when the estimate is NaN.
    pub fn from_log_fc(log_fc: f64) -> Option<Self> {
        if log_fc.is_nan() {
            None
        } else if log_fc > 0.0 {
            Some(Direction::Increase)
        } else {
            Some(Direction::Decrease)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Increase => "Increase",
            Direction::Decrease => "Decrease",
        }
    }
}

/// Result for a single (protein, contrast) pair.
///
/// NaN fields record per-protein numerical failures (all-missing row, zero
/// variance); they are carried through, never silently coerced to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeRecord {
    /// Protein accession.
    pub accession: String,
    /// Gene symbol from the annotations.
    pub gene: String,
    /// Protein description.
    pub description: String,
    /// Canonical contrast name, e.g. `Dementia-AD_over_Normal`.
    pub contrast: String,
    /// Log2 fold-change (test level minus reference, covariates held fixed).
    pub log_fc: f64,
    /// Raw p-value from the OLS t-test.
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value, pooled across all rows.
    pub p_adj: f64,
    /// True when `p_adj <= 0.05`.
    pub significant: bool,
    /// Effect direction; absent when the estimate is NaN.
    pub direction: Option<Direction>,
}

/// Collection of DE results, one row per (protein × contrast).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResultSet {
    /// Individual results in deterministic order: protein order × contrast
    /// order.
    pub records: Vec<DeRecord>,
    /// Number of tests entering the pooled correction (non-NaN p-values).
    pub n_tests: usize,
}

impl DeResultSet {
    pub fn new(records: Vec<DeRecord>, n_tests: usize) -> Self {
        Self { records, n_tests }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeRecord> {
        self.records.iter()
    }

    /// Get the record for a specific (accession, contrast) pair.
    pub fn get(&self, accession: &str, contrast: &str) -> Option<&DeRecord> {
        self.records
            .iter()
            .find(|r| r.accession == accession && r.contrast == contrast)
    }

    /// Records for one contrast, in protein order.
    pub fn for_contrast<'a>(&'a self, contrast: &str) -> Vec<&'a DeRecord> {
        self.records
            .iter()
            .filter(|r| r.contrast == contrast)
            .collect()
    }

    /// Distinct contrast names, in first-seen order.
    pub fn contrast_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for r in &self.records {
            if !names.contains(&r.contrast.as_str()) {
                names.push(&r.contrast);
            }
        }
        names
    }

    /// Records sorted by raw p-value ascending; NaN sorts last.
    pub fn sorted_by_pvalue(&self) -> Vec<&DeRecord> {
        let mut sorted: Vec<_> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.p_value
                .partial_cmp(&b.p_value)
                .unwrap_or_else(|| a.p_value.is_nan().cmp(&b.p_value.is_nan()))
        });
        sorted
    }

    /// Significant records (`p_adj <= 0.05`).
    pub fn significant(&self) -> Vec<&DeRecord> {
        self.records.iter().filter(|r| r.significant).collect()
    }

    pub fn summary(&self) -> DeSummary {
        DeSummary {
            total: self.len(),
            n_tests: self.n_tests,
            significant: self.records.iter().filter(|r| r.significant).count(),
            increased: self
                .records
                .iter()
                .filter(|r| r.significant && r.direction == Some(Direction::Increase))
                .count(),
            decreased: self
                .records
                .iter()
                .filter(|r| r.significant && r.direction == Some(Direction::Decrease))
                .count(),
            failed: self.records.iter().filter(|r| r.p_value.is_nan()).count(),
        }
    }

    /// Write results to a TSV file. NaN fields are written as `NA`.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "accession\tgene\tdescription\tcontrast\tlogFC\tp.value\tpadj\tsignificant\tdirection"
        )?;
        for r in &self.records {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.accession,
                r.gene,
                r.description,
                r.contrast,
                fmt_float(r.log_fc, 6),
                fmt_sci(r.p_value),
                fmt_sci(r.p_adj),
                r.significant,
                r.direction.map(|d| d.name()).unwrap_or("NA"),
            )?;
        }
        Ok(())
    }

    /// Serialize the whole result set as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Count summary over a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeSummary {
    pub total: usize,
    pub n_tests: usize,
    pub significant: usize,
    pub increased: usize,
    pub decreased: usize,
    /// Rows with NaN p-values (per-protein numerical failures).
    pub failed: usize,
}

impl std::fmt::Display for DeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rows (protein x contrast): {}", self.total)?;
        writeln!(f, "Tests entering FDR:        {}", self.n_tests)?;
        writeln!(f, "Significant (padj <= 0.05): {}", self.significant)?;
        writeln!(f, "  increased: {}", self.increased)?;
        writeln!(f, "  decreased: {}", self.decreased)?;
        writeln!(f, "Failed fits (NA): {}", self.failed)?;
        Ok(())
    }
}

fn fmt_float(v: f64, precision: usize) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.*}", precision, v)
    }
}

fn fmt_sci(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.4e}", v)
    }
}
