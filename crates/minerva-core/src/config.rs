//! Configuration types for Minerva components.
//!
//! Tunables are plain structs with `Default` impls. The one file-backed piece
//! is the TeSS instance registry, read from
//! `<config_dir>/minerva/instances.toml`:
//!
//! ```toml
//! [[instances]]
//! name = "taxila"
//! url = "https://taxila.nl"
//!
//! [[instances]]
//! name = "dresa"
//! url = "https://dresa.org.au"
//! enabled = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const APP_DIR: &str = "minerva";
const INSTANCES_FILENAME: &str = "instances.toml";

/// HTTP client configuration for the catalog and embedding APIs.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// SQLite full-text index configuration.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// SQLite serializes writers; a single connection avoids lock contention.
    pub max_connections: u32,
    pub default_search_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_connections: 1,
            default_search_limit: 10,
        }
    }
}

/// Similarity index parameters.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Neighbours kept per record.
    pub top_k: usize,
    /// Pairs scoring below this cosine similarity are dropped.
    pub min_score: f64,
    /// Highest-weighted terms written per record to the TF-IDF index file.
    pub index_terms: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_score: 0.1,
            index_terms: 10,
        }
    }
}

/// TeSS API paging.
#[derive(Debug, Clone)]
pub struct TessConfig {
    pub page_size: usize,
}

impl Default for TessConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

/// One TeSS-family catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEntry {
    /// Short key used in references (`tess.<name>:<id>`) and output file names.
    pub name: String,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl InstanceEntry {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancesConfig {
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
}

impl Default for InstancesConfig {
    fn default() -> Self {
        Self {
            instances: default_instances(),
        }
    }
}

impl InstancesConfig {
    pub fn enabled_instances(&self) -> impl Iterator<Item = &InstanceEntry> {
        self.instances.iter().filter(|i| i.enabled)
    }

    /// Finds an instance by name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&InstanceEntry> {
        self.instances
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }
}

/// The TeSS instances known out of the box.
pub fn default_instances() -> Vec<InstanceEntry> {
    vec![
        InstanceEntry::new("tess", "https://tess.elixir-europe.org"),
        InstanceEntry::new("taxila", "https://taxila.nl"),
        InstanceEntry::new("scilifelab", "https://training.scilifelab.se"),
        InstanceEntry::new("pantraining", "https://pan-training.eu"),
        InstanceEntry::new("dresa", "https://dresa.org.au"),
    ]
}

/// Default location of the instance registry, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(INSTANCES_FILENAME))
}

/// Directory where downloaded source dumps are cached.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR))
}

/// Parses an instance registry from TOML text.
pub fn parse_instances_config(text: &str) -> Result<InstancesConfig, AppError> {
    toml::from_str(text).map_err(|e| AppError::ConfigError(e.to_string()))
}

/// Loads the instance registry.
///
/// An explicit `path` must exist. Without one, the default location is
/// tried and the built-in registry is used when no file is there.
pub fn load_instances_config(path: Option<&Path>) -> Result<InstancesConfig, AppError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No instance registry found, using built-in instances");
                return Ok(InstancesConfig::default());
            }
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = parse_instances_config(&text)?;
    tracing::info!(
        "Loaded {} TeSS instances from {}",
        config.instances.len(),
        path.display()
    );
    Ok(config)
}

/// Credentials for writing to a TeSS instance.
#[derive(Clone)]
pub struct TessCredentials {
    pub email: String,
    pub api_key: String,
}

impl TessCredentials {
    /// Validates that both parts are present and non-blank.
    pub fn new(email: Option<String>, api_key: Option<String>) -> Result<Self, AppError> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::MissingCredentials("TESS_EMAIL".to_string()))?;
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::MissingCredentials("TESS_API_KEY".to_string()))?;
        Ok(Self { email, api_key })
    }
}

impl std::fmt::Debug for TessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TessCredentials")
            .field("email", &self.email)
            .field("api_key", &"***")
            .finish()
    }
}

/// Fills the `{space}` placeholder of an upload target template.
///
/// ```
/// use minerva_core::config::upload_target_url;
///
/// assert_eq!(
///     upload_target_url("https://{space}.tesshub.hzdr.de/", "dalia"),
///     "https://dalia.tesshub.hzdr.de/"
/// );
/// ```
pub fn upload_target_url(template: &str, space: &str) -> String {
    template.replace("{space}", space)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_similarity_config_defaults() {
        let config = SimilarityConfig::default();
        assert_eq!(config.top_k, 10);
        assert!((config.min_score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_instances() {
        let config = InstancesConfig::default();
        assert_eq!(config.enabled_instances().count(), 5);
        assert_eq!(
            config.find_by_name("TAXILA").map(|i| i.url.as_str()),
            Some("https://taxila.nl")
        );
        assert!(config.find_by_name("nowhere").is_none());
    }

    #[test]
    fn test_parse_instances_config() {
        let config = parse_instances_config(
            r#"
            [[instances]]
            name = "taxila"
            url = "https://taxila.nl"

            [[instances]]
            name = "dresa"
            url = "https://dresa.org.au"
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.instances.len(), 2);
        let enabled: Vec<_> = config.enabled_instances().map(|i| i.name.as_str()).collect();
        assert_eq!(enabled, vec!["taxila"]);
    }

    #[test]
    fn test_parse_instances_config_invalid() {
        let err = parse_instances_config("[[instances]]\nname = 3").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instances.toml");
        std::fs::write(&path, "[[instances]]\nname = \"tess\"\nurl = \"https://tess.elixir-europe.org\"\n").unwrap();

        let config = load_instances_config(Some(&path)).unwrap();
        assert_eq!(config.instances, vec![InstanceEntry::new("tess", "https://tess.elixir-europe.org")]);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            load_instances_config(Some(&missing)),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_credentials_required() {
        let creds = TessCredentials::new(Some("me@example.org".into()), Some("secret".into())).unwrap();
        assert_eq!(creds.email, "me@example.org");
        assert!(!format!("{:?}", creds).contains("secret"));

        assert!(matches!(
            TessCredentials::new(None, Some("secret".into())),
            Err(AppError::MissingCredentials(v)) if v == "TESS_EMAIL"
        ));
        assert!(matches!(
            TessCredentials::new(Some("me@example.org".into()), Some("  ".into())),
            Err(AppError::MissingCredentials(v)) if v == "TESS_API_KEY"
        ));
    }
}
