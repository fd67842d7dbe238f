//! Inclusion-panel filtering (e.g. restriction to synaptic proteins).

use crate::data::{AbundanceMatrix, IdSet, ProteinAnnotations};
use crate::error::{DeaError, Result};

/// Restrict the matrix to proteins on an inclusion panel.
///
/// A protein is kept when its gene symbol is on the panel; proteins with no
/// gene annotation fall back to matching by accession. Matching is
/// case-insensitive and the filter is order-preserving.
pub fn filter_panel(
    abundance: &AbundanceMatrix,
    annotations: &ProteinAnnotations,
    panel: &IdSet,
) -> Result<AbundanceMatrix> {
    let keep_indices: Vec<usize> = abundance
        .protein_ids()
        .iter()
        .enumerate()
        .filter(|(_, accession)| {
            match annotations.gene(accession).filter(|g| !g.is_empty()) {
                Some(gene) => panel.contains(gene),
                None => panel.contains(accession),
            }
        })
        .map(|(i, _)| i)
        .collect();

    if keep_indices.is_empty() {
        return Err(DeaError::EmptyData(format!(
            "No proteins matched the '{}' panel",
            panel.name()
        )));
    }

    abundance.subset_proteins(&keep_indices)
}
