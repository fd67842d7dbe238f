//! Sample metadata: diagnosis categories and linear-model covariates.

use crate::error::{DeaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Diagnosis category, a fixed four-level factor.
///
/// Modeled as an enum rather than free-form string levels so contrast
/// extraction is a pure function of a level pair, with no stateful
/// "current reference level".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Diagnosis {
    Normal,
    DementiaAd,
    Resilient,
    Frail,
}

impl Diagnosis {
    /// All levels in canonical order. This order fixes dummy-column order in
    /// design matrices and the order of pairwise contrasts.
    pub const ALL: [Diagnosis; 4] = [
        Diagnosis::Normal,
        Diagnosis::DementiaAd,
        Diagnosis::Resilient,
        Diagnosis::Frail,
    ];

    /// Parse a diagnosis label (case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Diagnosis::Normal),
            "dementia-ad" | "dementia_ad" => Ok(Diagnosis::DementiaAd),
            "resilient" => Ok(Diagnosis::Resilient),
            "frail" => Ok(Diagnosis::Frail),
            _ => Err(DeaError::UnknownDiagnosis(s.to_string())),
        }
    }

    /// Display label, as written in output tables and contrast names.
    pub fn label(&self) -> &'static str {
        match self {
            Diagnosis::Normal => "Normal",
            Diagnosis::DementiaAd => "Dementia-AD",
            Diagnosis::Resilient => "Resilient",
            Diagnosis::Frail => "Frail",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One sample's metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Sample code, the join key into the abundance matrix.
    pub sample_id: String,
    pub diagnosis: Diagnosis,
    pub sex: String,
    /// Years of education.
    pub education: f64,
    /// Age at death, years.
    pub age_death: f64,
    /// Post-mortem interval, minutes.
    pub pmi: f64,
}

/// Sample metadata keyed by sample code.
#[derive(Debug, Clone, Default)]
pub struct SampleMetadata {
    samples: Vec<SampleInfo>,
    index: HashMap<String, usize>,
}

impl SampleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load metadata from a TSV file.
    ///
    /// The header must contain `sample_id`, `diagnosis`, `sex`, `education`,
    /// `age_death` and `pmi` columns (any order, extra columns ignored).
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DeaError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<String> = header_line
            .split('\t')
            .map(|s| s.trim().to_string())
            .collect();

        let col = |name: &str| -> Result<usize> {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DeaError::MissingColumn(name.to_string()))
        };
        let id_col = col("sample_id")?;
        let dx_col = col("diagnosis")?;
        let sex_col = col("sex")?;
        let edu_col = col("education")?;
        let age_col = col("age_death")?;
        let pmi_col = col("pmi")?;

        let mut meta = Self::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let field = |idx: usize| -> &str { fields.get(idx).map(|s| s.trim()).unwrap_or("") };
            let numeric = |idx: usize, name: &str| -> Result<f64> {
                field(idx).parse().map_err(|_| {
                    DeaError::InvalidParameter(format!(
                        "Metadata column '{}' has non-numeric value '{}' for sample '{}'",
                        name,
                        field(idx),
                        field(id_col)
                    ))
                })
            };

            meta.insert(SampleInfo {
                sample_id: field(id_col).to_string(),
                diagnosis: Diagnosis::parse(field(dx_col))?,
                sex: field(sex_col).to_string(),
                education: numeric(edu_col, "education")?,
                age_death: numeric(age_col, "age_death")?,
                pmi: numeric(pmi_col, "pmi")?,
            })?;
        }

        if meta.is_empty() {
            return Err(DeaError::EmptyData("No samples in metadata".to_string()));
        }
        Ok(meta)
    }

    pub fn insert(&mut self, sample: SampleInfo) -> Result<()> {
        if self.index.contains_key(&sample.sample_id) {
            return Err(DeaError::SampleMismatch(format!(
                "duplicate sample id '{}' in metadata",
                sample.sample_id
            )));
        }
        self.index
            .insert(sample.sample_id.clone(), self.samples.len());
        self.samples.push(sample);
        Ok(())
    }

    pub fn sample_ids(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.sample_id.as_str()).collect()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleInfo> {
        self.index.get(sample_id).map(|&i| &self.samples[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleInfo> {
        self.samples.iter()
    }

    /// Diagnosis levels actually present, in canonical order.
    pub fn present_diagnoses(&self) -> Vec<Diagnosis> {
        Diagnosis::ALL
            .iter()
            .copied()
            .filter(|d| self.samples.iter().any(|s| s.diagnosis == *d))
            .collect()
    }

    /// Unique sex levels, sorted. The first is the design reference level.
    pub fn sex_levels(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.samples.iter().map(|s| s.sex.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Reorder to match the abundance matrix's sample columns exactly.
    ///
    /// Fails with a data-integrity error naming every identifier present on
    /// one side only — the pipeline must not start modeling on a partial
    /// sample intersection.
    pub fn align_to(&self, sample_ids: &[String]) -> Result<Self> {
        let missing_in_meta: Vec<&str> = sample_ids
            .iter()
            .filter(|id| !self.index.contains_key(id.as_str()))
            .map(|id| id.as_str())
            .collect();
        let missing_in_matrix: Vec<&str> = self
            .samples
            .iter()
            .filter(|s| !sample_ids.contains(&s.sample_id))
            .map(|s| s.sample_id.as_str())
            .collect();

        if !missing_in_meta.is_empty() || !missing_in_matrix.is_empty() {
            return Err(DeaError::SampleMismatch(format!(
                "in abundance but not metadata: [{}]; in metadata but not abundance: [{}]",
                missing_in_meta.join(", "),
                missing_in_matrix.join(", ")
            )));
        }

        let mut aligned = Self::new();
        for id in sample_ids {
            aligned.insert(self.samples[self.index[id]].clone())?;
        }
        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tdiagnosis\tsex\teducation\tage_death\tpmi").unwrap();
        writeln!(file, "B01\tNormal\tfemale\t12\t85.2\t390").unwrap();
        writeln!(file, "B02\tDementia-AD\tmale\t8\t91.0\t420").unwrap();
        writeln!(file, "B03\tResilient\tfemale\t14\t88.7\t300").unwrap();
        writeln!(file, "B04\tFrail\tmale\t10\t94.1\t510").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_metadata() {
        let file = create_test_tsv();
        let meta = SampleMetadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.n_samples(), 4);
        let s = meta.get("B02").unwrap();
        assert_eq!(s.diagnosis, Diagnosis::DementiaAd);
        assert_eq!(s.sex, "male");
        assert_eq!(s.age_death, 91.0);
    }

    #[test]
    fn test_parse_diagnosis() {
        assert_eq!(Diagnosis::parse("normal").unwrap(), Diagnosis::Normal);
        assert_eq!(
            Diagnosis::parse("Dementia-AD").unwrap(),
            Diagnosis::DementiaAd
        );
        assert!(Diagnosis::parse("unknown").is_err());
    }

    #[test]
    fn test_present_diagnoses_order() {
        let file = create_test_tsv();
        let meta = SampleMetadata::from_tsv(file.path()).unwrap();
        assert_eq!(meta.present_diagnoses(), Diagnosis::ALL.to_vec());
    }

    #[test]
    fn test_sex_levels_sorted() {
        let file = create_test_tsv();
        let meta = SampleMetadata::from_tsv(file.path()).unwrap();
        assert_eq!(meta.sex_levels(), vec!["female", "male"]);
    }

    #[test]
    fn test_align_to_reorders() {
        let file = create_test_tsv();
        let meta = SampleMetadata::from_tsv(file.path()).unwrap();
        let order: Vec<String> = ["B03", "B01", "B04", "B02"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let aligned = meta.align_to(&order).unwrap();
        assert_eq!(aligned.sample_ids(), vec!["B03", "B01", "B04", "B02"]);
    }

    #[test]
    fn test_align_to_reports_both_sides() {
        let file = create_test_tsv();
        let meta = SampleMetadata::from_tsv(file.path()).unwrap();
        let order: Vec<String> = ["B01", "B02", "B99"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let err = meta.align_to(&order).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("B99"));
        assert!(msg.contains("B03"));
        assert!(msg.contains("B04"));
    }
}
