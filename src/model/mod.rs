//! Per-protein linear modeling and contrast extraction.

pub mod contrast;
pub mod lm;

pub use contrast::{
    build_de_results, fit_all_contrasts, Contrast, ContrastCell, ContrastTable,
};
pub use lm::{model_lm, LmFit, LmFitSingle};
