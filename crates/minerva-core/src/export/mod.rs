//! Mappings from [`EducationalResource`](crate::EducationalResource) into other catalogs' schemas.

pub mod tess;

pub use tess::{export_tess, LearningMaterial, MaterialEnvelope, Topic};
