//! Protein abundance matrix with an explicit missing-value marker.

use crate::data::annotation::{ProteinAnnotations, ProteinRecord};
use crate::error::{DeaError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A dense intensity matrix storing protein abundances across samples.
///
/// Rows represent proteins (protein-major orientation), columns represent
/// samples. Missing values are stored as `f64::NAN`; present values are
/// non-negative intensities. Modeling consumes rows as responses against a
/// sample-major design matrix — the row/column ↔ identifier correspondence
/// is validated at that boundary rather than assumed.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    /// Dense matrix (proteins × samples); NaN marks a missing measurement.
    data: DMatrix<f64>,
    /// Protein accessions (row names).
    protein_ids: Vec<String>,
    /// Sample codes (column names).
    sample_ids: Vec<String>,
}

impl AbundanceMatrix {
    /// Create a new AbundanceMatrix from a dense matrix and identifiers.
    pub fn new(
        data: DMatrix<f64>,
        protein_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        if data.nrows() != protein_ids.len() {
            return Err(DeaError::DimensionMismatch {
                expected: data.nrows(),
                actual: protein_ids.len(),
            });
        }
        if data.ncols() != sample_ids.len() {
            return Err(DeaError::DimensionMismatch {
                expected: data.ncols(),
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            protein_ids,
            sample_ids,
        })
    }

    /// Load an abundance table from a TSV file.
    ///
    /// Expected format:
    /// - First row: `accession`, `gene`, `description`, then one column per
    ///   sample code.
    /// - Subsequent rows: annotation fields followed by intensities. Empty
    ///   cells and `NA` mark missing values; present values must be
    ///   non-negative finite numbers.
    ///
    /// Returns the matrix together with the protein annotations parsed from
    /// the leading columns. Duplicate accessions abort the load.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<(Self, ProteinAnnotations)> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DeaError::EmptyData("Empty abundance file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 4 {
            return Err(DeaError::EmptyData(
                "Abundance table must have annotation columns and at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[3..].iter().map(|s| s.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut annotations = ProteinAnnotations::new();
        let mut protein_ids: Vec<String> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for (row_idx, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(DeaError::EmptyData(format!(
                    "Row {} has no annotation fields",
                    row_idx + 1
                )));
            }

            let accession = fields[0].trim().to_string();
            annotations.insert(ProteinRecord {
                accession: accession.clone(),
                gene: fields[1].trim().to_string(),
                description: fields[2].trim().to_string(),
            })?;
            protein_ids.push(accession);

            for col_idx in 0..n_samples {
                let raw = fields.get(3 + col_idx).map(|s| s.trim()).unwrap_or("");
                values.push(parse_intensity(raw, row_idx, col_idx)?);
            }
        }

        if protein_ids.is_empty() {
            return Err(DeaError::EmptyData("No proteins in abundance table".to_string()));
        }

        let data = DMatrix::from_row_slice(protein_ids.len(), n_samples, &values);
        let matrix = Self::new(data, protein_ids, sample_ids)?;
        Ok((matrix, annotations))
    }

    /// Write the matrix to a TSV file, joining annotations back by accession.
    /// Missing values are written as `NA`.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, annotations: &ProteinAnnotations) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "accession\tgene\tdescription")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row, accession) in self.protein_ids.iter().enumerate() {
            let gene = annotations.gene(accession).unwrap_or("");
            let desc = annotations.description(accession).unwrap_or("");
            write!(writer, "{}\t{}\t{}", accession, gene, desc)?;
            for col in 0..self.n_samples() {
                let v = self.data[(row, col)];
                if v.is_nan() {
                    write!(writer, "\tNA")?;
                } else {
                    write!(writer, "\t{}", v)?;
                }
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    /// Get the value at (row, col); NaN means missing.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of proteins (rows).
    #[inline]
    pub fn n_proteins(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Protein accessions in row order.
    #[inline]
    pub fn protein_ids(&self) -> &[String] {
        &self.protein_ids
    }

    /// Sample codes in column order.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Get a row (protein) as a dense vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    /// Get a column (sample) as a dense vector.
    pub fn col(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().cloned().collect()
    }

    /// Count missing values in one protein row.
    pub fn missing_count(&self, row: usize) -> usize {
        self.data.row(row).iter().filter(|v| v.is_nan()).count()
    }

    /// Missing-value counts for every protein.
    pub fn missing_counts(&self) -> Vec<usize> {
        (0..self.n_proteins())
            .into_par_iter()
            .map(|row| self.missing_count(row))
            .collect()
    }

    /// Minimum observed (non-missing) value in one protein row.
    pub fn row_min_observed(&self, row: usize) -> Option<f64> {
        self.data
            .row(row)
            .iter()
            .filter(|v| !v.is_nan())
            .cloned()
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |m| m.min(v)))
            })
    }

    /// Subset to the given row indices, preserving their relative order.
    pub fn subset_proteins(&self, rows: &[usize]) -> Result<Self> {
        for &r in rows {
            if r >= self.n_proteins() {
                return Err(DeaError::InvalidParameter(format!(
                    "Protein index {} out of bounds ({} rows)",
                    r,
                    self.n_proteins()
                )));
            }
        }
        let data = DMatrix::from_fn(rows.len(), self.n_samples(), |i, j| {
            self.data[(rows[i], j)]
        });
        let protein_ids = rows.iter().map(|&r| self.protein_ids[r].clone()).collect();
        Self::new(data, protein_ids, self.sample_ids.clone())
    }

    /// Replace the data matrix, keeping identifiers. Dimensions must match.
    pub fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        Self::new(data, self.protein_ids.clone(), self.sample_ids.clone())
    }
}

fn parse_intensity(raw: &str, row: usize, col: usize) -> Result<f64> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    let value: f64 = raw.parse().map_err(|_| DeaError::InvalidValue {
        value: raw.to_string(),
        row,
        col,
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(DeaError::InvalidValue {
            value: raw.to_string(),
            row,
            col,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "accession\tgene\tdescription\tS1\tS2\tS3").unwrap();
        writeln!(file, "P10001\tSYN1\tSynapsin-1\t100.5\t200.0\tNA").unwrap();
        writeln!(file, "P10002\tGFAP\tGlial fibrillary acidic protein\t50.0\t\t75.0").unwrap();
        writeln!(file, "P10003\tDLG4\tPSD-95\t10.0\t20.0\t30.0").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_abundance() {
        let file = create_test_tsv();
        let (matrix, annotations) = AbundanceMatrix::from_tsv(file.path()).unwrap();

        assert_eq!(matrix.n_proteins(), 3);
        assert_eq!(matrix.n_samples(), 3);
        assert_eq!(matrix.sample_ids(), &["S1", "S2", "S3"]);
        assert_eq!(matrix.get(0, 0), 100.5);
        assert!(matrix.get(0, 2).is_nan());
        assert!(matrix.get(1, 1).is_nan());
        assert_eq!(annotations.gene("P10003"), Some("DLG4"));
    }

    #[test]
    fn test_missing_counts() {
        let file = create_test_tsv();
        let (matrix, _) = AbundanceMatrix::from_tsv(file.path()).unwrap();
        assert_eq!(matrix.missing_counts(), vec![1, 1, 0]);
    }

    #[test]
    fn test_row_min_observed() {
        let file = create_test_tsv();
        let (matrix, _) = AbundanceMatrix::from_tsv(file.path()).unwrap();
        assert_eq!(matrix.row_min_observed(0), Some(100.5));
        assert_eq!(matrix.row_min_observed(2), Some(10.0));
    }

    #[test]
    fn test_subset_preserves_order() {
        let file = create_test_tsv();
        let (matrix, _) = AbundanceMatrix::from_tsv(file.path()).unwrap();
        let subset = matrix.subset_proteins(&[0, 2]).unwrap();
        assert_eq!(subset.protein_ids(), &["P10001", "P10003"]);
        assert_eq!(subset.get(1, 2), 30.0);
    }

    #[test]
    fn test_duplicate_accession_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "accession\tgene\tdescription\tS1").unwrap();
        writeln!(file, "P10001\tSYN1\tx\t1.0").unwrap();
        writeln!(file, "P10001\tSYN1\tx\t2.0").unwrap();
        file.flush().unwrap();

        let err = AbundanceMatrix::from_tsv(file.path()).unwrap_err();
        assert!(matches!(err, DeaError::DuplicateProtein(_)));
    }

    #[test]
    fn test_negative_intensity_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "accession\tgene\tdescription\tS1").unwrap();
        writeln!(file, "P10001\tSYN1\tx\t-1.0").unwrap();
        file.flush().unwrap();

        let err = AbundanceMatrix::from_tsv(file.path()).unwrap_err();
        assert!(matches!(err, DeaError::InvalidValue { .. }));
    }
}
