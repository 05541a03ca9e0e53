//! Minerva DB - full-text index for harvested resources
//!
//! Resources are indexed into a standalone SQLite FTS5 table and queried
//! with BM25 ranking. See [`FullTextIndex`].

pub mod fts;

pub use fts::{fts_query, FullTextIndex, SearchHit};
