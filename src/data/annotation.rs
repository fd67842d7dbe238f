//! Protein reference annotations loaded alongside the abundance table.

use crate::error::{DeaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable reference metadata for one protein.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProteinRecord {
    /// Stable accession, unique key for every join.
    pub accession: String,
    /// Gene symbol. Not guaranteed unique across accessions.
    pub gene: String,
    /// Free-text description.
    pub description: String,
}

/// Accession-keyed collection of [`ProteinRecord`]s.
///
/// Loaded once from the annotation columns of the abundance table and joined
/// against by accession; filtering the abundance matrix never mutates this.
#[derive(Debug, Clone, Default)]
pub struct ProteinAnnotations {
    records: Vec<ProteinRecord>,
    index: HashMap<String, usize>,
}

impl ProteinAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Duplicate accessions are a data-integrity error
    /// because every downstream join assumes accession uniqueness.
    pub fn insert(&mut self, record: ProteinRecord) -> Result<()> {
        if self.index.contains_key(&record.accession) {
            return Err(DeaError::DuplicateProtein(record.accession));
        }
        self.index
            .insert(record.accession.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, accession: &str) -> Option<&ProteinRecord> {
        self.index.get(accession).map(|&i| &self.records[i])
    }

    /// Gene symbol for an accession, if annotated.
    pub fn gene(&self, accession: &str) -> Option<&str> {
        self.get(accession).map(|r| r.gene.as_str())
    }

    pub fn description(&self, accession: &str) -> Option<&str> {
        self.get(accession).map(|r| r.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProteinRecord> {
        self.records.iter()
    }
}
