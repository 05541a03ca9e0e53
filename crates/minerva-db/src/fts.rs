//! SQLite FTS5 index over harvested resources.
//!
//! # Schema
//!
//! A single standalone FTS5 table; the resource key is stored but not
//! tokenized:
//!
//! ```sql
//! CREATE VIRTUAL TABLE resources_fts USING fts5(
//!     key UNINDEXED, title, description, keywords
//! );
//! ```

use std::path::Path;

use minerva_core::{AppError, EducationalResource, IndexConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// One search result, best match first.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    /// Negated BM25 rank, so higher is better.
    pub score: f64,
}

/// Full-text index stored in a SQLite database file.
///
/// # Examples
///
/// ```no_run
/// use minerva_core::IndexConfig;
/// use minerva_db::FullTextIndex;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let index = FullTextIndex::open(Path::new("output/dalia/dalia-fts-sqlite.db"), &IndexConfig::default()).await?;
/// for hit in index.search("version control", 10).await? {
///     println!("{:.2}  {}  {}", hit.score, hit.key, hit.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FullTextIndex {
    pool: SqlitePool,
}

impl FullTextIndex {
    /// Creates a fresh index at `path`, replacing any existing file.
    pub async fn create(path: &Path, config: &IndexConfig) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    /// Opens an existing index for querying.
    pub async fn open(path: &Path, config: &IndexConfig) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::ConfigError(format!(
                "Full-text index not found: {}",
                path.display()
            )));
        }
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Creates an index that lives only as long as this value.
    pub async fn in_memory() -> Result<Self, AppError> {
        // An in-memory database belongs to a single connection, which must never be recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE VIRTUAL TABLE IF NOT EXISTS resources_fts USING fts5(
                key UNINDEXED, title, description, keywords
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Indexes all resources in one transaction. Returns the number of rows added.
    pub async fn insert_all(&self, resources: &[EducationalResource]) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;
        for resource in resources {
            sqlx::query(
                "INSERT INTO resources_fts (key, title, description, keywords) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(resource.key())
            .bind(resource.title.preferred().unwrap_or_default())
            .bind(
                resource
                    .description
                    .as_ref()
                    .and_then(|d| d.preferred())
                    .unwrap_or_default(),
            )
            .bind(resource.keywords_en().join(" "))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Indexed {} resources for full-text search", resources.len());
        Ok(resources.len())
    }

    /// Runs a BM25-ranked query. Every word of `query` must match.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let Some(match_expr) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            "SELECT key, title, bm25(resources_fts) AS rank
             FROM resources_fts
             WHERE resources_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )
        .bind(match_expr)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<SearchHit, AppError> {
                Ok(SearchHit {
                    key: row.try_get("key")?,
                    title: row.try_get("title")?,
                    score: -row.try_get::<f64, _>("rank")?,
                })
            })
            .collect()
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM resources_fts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Turns free text into an FTS5 expression of quoted terms, so user input
/// can never be parsed as FTS5 syntax. Returns `None` for blank input.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
