//! Bonferroni family-wise error correction.

/// Apply Bonferroni correction: `min(1, p * n)` per test.
///
/// `n` counts the defined (non-NaN) p-values; NaN entries stay NaN.
pub fn adjust_bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.iter().filter(|p| !p.is_nan()).count() as f64;
    p_values
        .iter()
        .map(|&p| if p.is_nan() { f64::NAN } else { (p * n).min(1.0) })
        .collect()
}
