//! Minerva Core - record model, normalizers, source transforms and configuration.
//!
//! Every source (DALIA curation sheets, TeSS catalogs, the OERSI dump) is
//! transformed into [`EducationalResource`]. Free-text labels go through the
//! controlled vocabularies in [`vocab`] and [`license`]; anything unknown is
//! tallied in an [`UnknownValues`] collector owned by the caller.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod harvest;
pub mod identity;
pub mod jsonl;
pub mod license;
pub mod models;
pub mod similarity;
pub mod size;
pub mod sources;
pub mod vocab;

pub use config::{
    default_cache_dir, default_config_path, load_instances_config, HttpConfig, IndexConfig,
    InstanceEntry, InstancesConfig, SimilarityConfig, TessConfig, TessCredentials,
};
pub use diagnostics::UnknownValues;
pub use error::AppError;
pub use harvest::{BatchHarvestSummary, HarvestStats, RecordOutcome, SourceHarvestResult};
pub use identity::{Grounder, LexiconGrounder, NoGrounder};
pub use models::{
    Creator, EducationalResource, LangText, License, Organization, OrganizationRelation, Person,
    Reference,
};
