//! Protein filtering stages.

pub mod missingness;
pub mod panel;

pub use missingness::{filter_missingness, MissingnessReport};
pub use panel::filter_panel;
