//! Ranking-metric construction for gene-set enrichment analysis.

use crate::data::{DeResultSet, IdMap};
use crate::error::{DeaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// A ranked gene list: one score per gene identifier, sorted descending.
///
/// The sole interface to the external GSEA engine. Ordering is fully
/// deterministic: descending by score, ascending by gene identifier on
/// ties, so repeated runs on the same input are byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedGeneList {
    entries: Vec<(String, f64)>,
}

impl RankedGeneList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in rank order (highest score first).
    pub fn iter(&self) -> impl Iterator<Item = &(String, f64)> {
        self.entries.iter()
    }

    pub fn score(&self, gene: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(g, _)| g == gene)
            .map(|(_, s)| *s)
    }

    /// Gene identifiers in rank order.
    pub fn genes(&self) -> Vec<&str> {
        self.entries.iter().map(|(g, _)| g.as_str()).collect()
    }

    /// Write as a two-column TSV in rank order.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "gene\tscore")?;
        for (gene, score) in &self.entries {
            writeln!(writer, "{}\t{:.6}", gene, score)?;
        }
        Ok(())
    }
}

/// Signed-significance ranking score: `-log10(padj) * sign(logFC)`.
///
/// `padj` is floored at the smallest positive double before the log so a
/// zero adjusted p-value produces a large finite score, never an infinity.
pub fn ranking_score(p_adj: f64, log_fc: f64) -> f64 {
    let floored = p_adj.max(f64::MIN_POSITIVE);
    // f64::signum maps +0.0 to 1.0; the mathematical sign is wanted here.
    let sign = if log_fc > 0.0 {
        1.0
    } else if log_fc < 0.0 {
        -1.0
    } else {
        0.0
    };
    -floored.log10() * sign
}

/// Build the ranked gene list for one contrast.
///
/// Rows of the DE table are filtered to the target contrast; each row's
/// score is computed from its adjusted p-value and fold-change sign, and
/// contributed once to every gene identifier its accession maps to. Rows
/// with NaN statistics or an unmapped accession are dropped. Genes hit by
/// several accessions aggregate by arithmetic mean — conflicting signs
/// average toward zero, which is the intended behavior, not an error.
pub fn build_ranking(
    results: &DeResultSet,
    contrast: &str,
    mapping: &IdMap,
) -> Result<RankedGeneList> {
    let rows = results.for_contrast(contrast);
    if rows.is_empty() {
        return Err(DeaError::InvalidParameter(format!(
            "No rows for contrast '{}'; available: {:?}",
            contrast,
            results.contrast_names()
        )));
    }

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    let mut dropped = 0usize;
    for row in rows {
        if row.p_adj.is_nan() || row.log_fc.is_nan() {
            dropped += 1;
            continue;
        }
        let Some(targets) = mapping.targets(&row.accession) else {
            dropped += 1;
            continue;
        };
        let score = ranking_score(row.p_adj, row.log_fc);
        for gene in targets {
            let entry = sums.entry(gene.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    debug!(contrast, dropped, n_genes = sums.len(), "ranking built");

    if sums.is_empty() {
        return Err(DeaError::EmptyData(format!(
            "No mappable finite scores for contrast '{}'",
            contrast
        )));
    }

    let mut entries: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(gene, (sum, n))| (gene, sum / n as f64))
        .collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    Ok(RankedGeneList { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DeRecord, Direction};
    use approx::assert_relative_eq;

    fn record(acc: &str, contrast: &str, log_fc: f64, p_adj: f64) -> DeRecord {
        DeRecord {
            accession: acc.to_string(),
            gene: String::new(),
            description: String::new(),
            contrast: contrast.to_string(),
            log_fc,
            p_value: p_adj / 2.0,
            p_adj,
            significant: p_adj <= 0.05,
            direction: Direction::from_log_fc(log_fc),
        }
    }

    fn mapping(edges: &[(&str, &str)]) -> IdMap {
        let mut map = IdMap::new();
        for (s, t) in edges {
            map.insert(s, t);
        }
        map
    }

    #[test]
    fn test_score_worked_examples() {
        // padj 0.01, logFC +0.5 -> -log10(0.01) * 1 = 2.0.
        assert_relative_eq!(ranking_score(0.01, 0.5), 2.0, epsilon = 1e-12);
        // padj 0, logFC -0.3 -> finite large negative, not -inf.
        let s = ranking_score(0.0, -0.3);
        assert!(s.is_finite());
        assert!(s < -300.0);
    }

    #[test]
    fn test_sorted_descending() {
        let results = DeResultSet::new(
            vec![
                record("P1", "AD_over_N", 1.0, 0.1),
                record("P2", "AD_over_N", -1.0, 0.01),
                record("P3", "AD_over_N", 1.0, 0.001),
            ],
            3,
        );
        let map = mapping(&[("P1", "G1"), ("P2", "G2"), ("P3", "G3")]);
        let ranking = build_ranking(&results, "AD_over_N", &map).unwrap();

        assert_eq!(ranking.genes(), vec!["G3", "G1", "G2"]);
        let scores: Vec<f64> = ranking.iter().map(|(_, s)| *s).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_mean_aggregation_and_sign_conflict() {
        let results = DeResultSet::new(
            vec![
                record("P1", "AD_over_N", 1.0, 0.01),
                record("P2", "AD_over_N", -1.0, 0.01),
            ],
            2,
        );
        // Both accessions map to the same gene with opposite signs.
        let map = mapping(&[("P1", "G1"), ("P2", "G1")]);
        let ranking = build_ranking(&results, "AD_over_N", &map).unwrap();

        assert_eq!(ranking.len(), 1);
        assert_relative_eq!(ranking.score("G1").unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unmapped_and_nan_rows_dropped() {
        let results = DeResultSet::new(
            vec![
                record("P1", "AD_over_N", 1.0, 0.01),
                record("P2", "AD_over_N", f64::NAN, f64::NAN),
                record("P3", "AD_over_N", 1.0, 0.02),
            ],
            2,
        );
        let map = mapping(&[("P1", "G1"), ("P2", "G2")]);
        let ranking = build_ranking(&results, "AD_over_N", &map).unwrap();

        // P2 is NaN, P3 unmapped: only P1 survives.
        assert_eq!(ranking.genes(), vec!["G1"]);
    }

    #[test]
    fn test_one_to_many_contributes_to_each_target() {
        let results = DeResultSet::new(vec![record("P1", "AD_over_N", 2.0, 0.001)], 1);
        let map = mapping(&[("P1", "G1"), ("P1", "G2")]);
        let ranking = build_ranking(&results, "AD_over_N", &map).unwrap();

        assert_eq!(ranking.len(), 2);
        assert_relative_eq!(ranking.score("G1").unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(ranking.score("G2").unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic_tie_break() {
        let results = DeResultSet::new(
            vec![
                record("P1", "AD_over_N", 1.0, 0.01),
                record("P2", "AD_over_N", 1.0, 0.01),
            ],
            2,
        );
        let map = mapping(&[("P1", "GB"), ("P2", "GA")]);
        let ranking = build_ranking(&results, "AD_over_N", &map).unwrap();
        // Equal scores: ascending gene id.
        assert_eq!(ranking.genes(), vec!["GA", "GB"]);
    }

    #[test]
    fn test_unknown_contrast_is_error() {
        let results = DeResultSet::new(vec![record("P1", "AD_over_N", 1.0, 0.01)], 1);
        let map = mapping(&[("P1", "G1")]);
        assert!(build_ranking(&results, "nope", &map).is_err());
    }
}
