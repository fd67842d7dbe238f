//! Reference identifier lists: organelle categories, proteome background,
//! inclusion panels.

use crate::error::{DeaError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A named set of identifiers (one reference list).
///
/// Identifiers are upper-cased on load; `contains` is case-insensitive.
#[derive(Debug, Clone)]
pub struct IdSet {
    name: String,
    ids: HashSet<String>,
}

impl IdSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ids: HashSet::new(),
        }
    }

    pub fn from_ids<I: IntoIterator<Item = S>, S: AsRef<str>>(name: &str, ids: I) -> Self {
        let mut set = Self::new(name);
        for id in ids {
            set.insert(id.as_ref());
        }
        set
    }

    /// Load a single-column list. The header cell names the set.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| DeaError::EmptyData("Empty reference list".to_string()))??;
        let name = header.split('\t').next().unwrap_or("").trim().to_string();

        let mut set = Self::new(&name);
        for line_result in lines {
            let line = line_result?;
            let id = line.split('\t').next().unwrap_or("").trim();
            if !id.is_empty() {
                set.insert(id);
            }
        }

        if set.is_empty() {
            return Err(DeaError::EmptyData(format!(
                "Reference list '{}' has no identifiers",
                set.name
            )));
        }
        Ok(set)
    }

    pub fn insert(&mut self, id: &str) {
        self.ids.insert(id.trim().to_ascii_uppercase());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&id.trim().to_ascii_uppercase())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }
}

/// Named category reference lists loaded from a ragged multi-column table.
///
/// Each header cell names a category; each column below it is a
/// variable-length identifier list, padded with blanks. Categories are kept
/// sorted case-insensitively by name so downstream tables are deterministic.
#[derive(Debug, Clone, Default)]
pub struct CategoryLists {
    categories: Vec<IdSet>,
}

impl CategoryLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sets(sets: Vec<IdSet>) -> Self {
        let mut lists = Self { categories: sets };
        lists.sort();
        lists
    }

    /// Load the ragged table. Blank cells are padding, not identifiers.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DeaError::EmptyData("Empty category table".to_string()))??;
        let names: Vec<String> = header_line
            .split('\t')
            .map(|s| s.trim().to_string())
            .collect();
        if names.is_empty() || names.iter().all(|n| n.is_empty()) {
            return Err(DeaError::EmptyData("Category table has no columns".to_string()));
        }

        let mut sets: Vec<IdSet> = names.iter().map(|n| IdSet::new(n)).collect();
        for line_result in lines {
            let line = line_result?;
            for (col, cell) in line.split('\t').enumerate() {
                if col >= sets.len() {
                    break;
                }
                let id = cell.trim();
                if !id.is_empty() {
                    sets[col].insert(id);
                }
            }
        }

        sets.retain(|s| !s.name().is_empty() && !s.is_empty());
        if sets.is_empty() {
            return Err(DeaError::EmptyData(
                "Category table has no populated columns".to_string(),
            ));
        }
        Ok(Self::from_sets(sets))
    }

    fn sort(&mut self) {
        self.categories
            .sort_by_key(|s| s.name().to_ascii_lowercase());
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories in case-insensitive name order.
    pub fn iter(&self) -> impl Iterator<Item = &IdSet> {
        self.categories.iter()
    }

    pub fn get(&self, name: &str) -> Option<&IdSet> {
        self.categories.iter().find(|s| s.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_idset_case_insensitive() {
        let set = IdSet::from_ids("panel", ["Syn1", "DLG4"]);
        assert!(set.contains("SYN1"));
        assert!(set.contains("syn1"));
        assert!(!set.contains("GFAP"));
    }

    #[test]
    fn test_single_column_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "proteome").unwrap();
        writeln!(file, "SYN1").unwrap();
        writeln!(file, "GFAP").unwrap();
        writeln!(file, "").unwrap();
        writeln!(file, "DLG4").unwrap();
        file.flush().unwrap();

        let set = IdSet::from_tsv(file.path()).unwrap();
        assert_eq!(set.name(), "proteome");
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_ragged_category_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Mitochondria\tnucleus\tLysosome").unwrap();
        writeln!(file, "MT-CO1\tH2AX\tLAMP1").unwrap();
        writeln!(file, "MT-CO2\t\tLAMP2").unwrap();
        writeln!(file, "MT-CO3\t\t").unwrap();
        file.flush().unwrap();

        let lists = CategoryLists::from_tsv(file.path()).unwrap();
        assert_eq!(lists.len(), 3);
        // Case-insensitive sort: Lysosome, Mitochondria, nucleus.
        let names: Vec<&str> = lists.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Lysosome", "Mitochondria", "nucleus"]);
        assert_eq!(lists.get("Mitochondria").unwrap().len(), 3);
        assert_eq!(lists.get("nucleus").unwrap().len(), 1);
    }
}
