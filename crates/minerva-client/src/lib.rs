//! Minerva Client - HTTP collaborators for the harvest pipelines
//!
//! This crate provides clients for:
//!
//! - [`tess`] - TeSS-family catalogs (paginated listing, material upload)
//! - [`oersi`] - the OERSI NDJSON dump (cached download, gzip line reader)
//! - [`gemini`] - Google Gemini embeddings API
//!
//! Transient failures (timeouts, connect errors, 5xx, 429) are retried with
//! backoff here, so the transforms in `minerva-core` never see them.

pub mod gemini;
pub mod oersi;
mod retry;
pub mod tess;

pub use gemini::GeminiClient;
pub use oersi::{open_dump, DumpLines, OersiDump, OERSI_DUMP_URL};
pub use tess::TessClient;
