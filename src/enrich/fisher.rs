//! Two-sided Fisher's exact test on 2×2 contingency tables.

use crate::error::{DeaError, Result};
use statrs::distribution::{Discrete, Hypergeometric};

/// Relative tolerance when comparing point probabilities against the
/// observed table, matching R's `fisher.test` behavior.
const REL_TOLERANCE: f64 = 1.0 + 1e-7;

/// Two-sided Fisher's exact test for the table `[[a, b], [c, d]]`.
///
/// Conditions on the margins: the top-left cell follows a hypergeometric
/// distribution, and the two-sided p-value sums the point probabilities of
/// every table at least as extreme (probability no larger than the observed
/// table's). Zero cells are fine — degenerate tables produce a defined,
/// possibly extreme, p-value rather than an error.
pub fn fisher_exact_two_sided(a: u64, b: u64, c: u64, d: u64) -> Result<f64> {
    let population = a + b + c + d;
    if population == 0 {
        return Ok(1.0);
    }
    let successes = a + b;
    let draws = a + c;

    let dist = Hypergeometric::new(population, successes, draws).map_err(|e| {
        DeaError::Numerical(format!("Invalid hypergeometric parameters: {}", e))
    })?;

    let lo = draws.saturating_sub(population - successes);
    let hi = successes.min(draws);

    let p_observed = dist.pmf(a);
    let threshold = p_observed * REL_TOLERANCE;

    let mut p = 0.0;
    for k in lo..=hi {
        let pk = dist.pmf(k);
        if pk <= threshold {
            p += pk;
        }
    }
    Ok(p.min(1.0))
}
