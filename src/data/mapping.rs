//! Accession-to-gene identifier mapping for the ranking step.

use crate::error::{DeaError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Mapping from protein accessions to gene identifiers.
///
/// Many-to-many: one accession can map to several gene identifiers and one
/// gene identifier can be the target of several accessions. Identifiers are
/// upper-cased on load so joins against reference lists are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    edges: HashMap<String, Vec<String>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a two-column mapping table (source TAB target) with a header row.
    /// Rows with an empty source or target are skipped. Repeated identical
    /// edges collapse to one.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        lines
            .next()
            .ok_or_else(|| DeaError::EmptyData("Empty mapping file".to_string()))??;

        let mut map = Self::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let source = fields.next().map(str::trim).unwrap_or("");
            let target = fields.next().map(str::trim).unwrap_or("");
            if source.is_empty() || target.is_empty() {
                continue;
            }
            map.insert(source, target);
        }

        if map.is_empty() {
            return Err(DeaError::EmptyData("No edges in mapping file".to_string()));
        }
        Ok(map)
    }

    /// Add one mapping edge.
    pub fn insert(&mut self, source: &str, target: &str) {
        let targets = self
            .edges
            .entry(source.trim().to_ascii_uppercase())
            .or_default();
        let target = target.trim().to_ascii_uppercase();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Gene identifiers mapped from an accession, if any.
    pub fn targets(&self, source: &str) -> Option<&[String]> {
        self.edges
            .get(&source.trim().to_ascii_uppercase())
            .map(|v| v.as_slice())
    }

    /// Number of source identifiers with at least one target.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
