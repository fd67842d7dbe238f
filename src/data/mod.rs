//! Core data structures: abundance matrix, annotations, sample metadata,
//! design matrices, reference lists and result tables.

pub mod abundance;
pub mod annotation;
pub mod design;
pub mod mapping;
pub mod metadata;
pub mod reference;
pub mod result;

pub use abundance::AbundanceMatrix;
pub use annotation::{ProteinAnnotations, ProteinRecord};
pub use design::DesignMatrix;
pub use mapping::IdMap;
pub use metadata::{Diagnosis, SampleInfo, SampleMetadata};
pub use reference::{CategoryLists, IdSet};
pub use result::{DeRecord, DeResultSet, DeSummary, Direction, SIGNIFICANCE_ALPHA};
