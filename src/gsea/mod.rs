//! Gene-set enrichment analysis boundary.
//!
//! The GSEA algorithm itself is an external collaborator; this module
//! defines only its input (a [`RankedGeneList`] plus a gene-set collection)
//! and output ([`GseaRecord`]) contract.

use crate::error::{DeaError, Result};
use crate::rank::RankedGeneList;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One gene set (pathway) from a database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneSet {
    /// Term identifier (e.g. a GO or pathway accession).
    pub id: String,
    pub description: String,
    /// Member gene identifiers, upper-cased.
    pub genes: Vec<String>,
}

impl GeneSet {
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

/// A gene-set database loaded from a GMT file.
#[derive(Debug, Clone, Default)]
pub struct GeneSetCollection {
    sets: Vec<GeneSet>,
}

impl GeneSetCollection {
    /// Load GMT format: one set per line, `id TAB description TAB gene...`.
    pub fn from_gmt<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut sets = Vec::new();
        for line_result in reader.lines() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let id = fields.next().map(str::trim).unwrap_or("").to_string();
            let description = fields.next().map(str::trim).unwrap_or("").to_string();
            let genes: Vec<String> = fields
                .map(|g| g.trim().to_ascii_uppercase())
                .filter(|g| !g.is_empty())
                .collect();
            if id.is_empty() || genes.is_empty() {
                continue;
            }
            sets.push(GeneSet {
                id,
                description,
                genes,
            });
        }

        if sets.is_empty() {
            return Err(DeaError::EmptyData("No gene sets in GMT file".to_string()));
        }
        Ok(Self { sets })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneSet> {
        self.sets.iter()
    }

    pub fn get(&self, id: &str) -> Option<&GeneSet> {
        self.sets.iter().find(|s| s.id == id)
    }
}

/// One enrichment record returned by a GSEA engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GseaRecord {
    /// Term identifier.
    pub term_id: String,
    pub description: String,
    /// Genes from the set present in the ranked list.
    pub set_size: usize,
    /// Enrichment score.
    pub es: f64,
    /// Normalized enrichment score.
    pub nes: f64,
    pub p_value: f64,
    pub p_adj: f64,
}

/// A gene-set enrichment engine consuming a ranked list.
///
/// Implementations are external; the core only hands over the sorted
/// ranking and accepts the records back opaquely.
pub trait GseaEngine {
    fn run(
        &self,
        ranking: &RankedGeneList,
        gene_sets: &GeneSetCollection,
    ) -> Result<Vec<GseaRecord>>;
}
