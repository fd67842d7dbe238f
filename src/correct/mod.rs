//! Multiple-testing correction procedures.

pub mod bh;
pub mod bonferroni;

pub use bh::{adjust_bh, BhAdjusted};
pub use bonferroni::adjust_bonferroni;
