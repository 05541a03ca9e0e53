//! Per-source harvest steps shared by the CLI commands.
//!
//! Each step reads one source, converts it with `minerva_core::sources` and
//! returns the records plus counters; writing and reporting are left to the
//! caller.

use std::path::{Path, PathBuf};

use minerva_client::{open_dump, GeminiClient, TessClient};
use minerva_core::export::export_tess;
use minerva_core::similarity::{
    write_embedding_index, write_similarities, write_tfidf_index, EmbeddingIndex, TfIdfIndex,
};
use minerva_core::sources::{oersi, tess};
use minerva_core::{
    AppError, EducationalResource, Grounder, HarvestStats, IndexConfig, LexiconGrounder,
    NoGrounder, RecordOutcome, SimilarityConfig, TessCredentials, UnknownValues,
};
use minerva_db::FullTextIndex;
use tracing::{debug, error, info, warn};

/// File layout under the output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn source_dir(&self, source: &str) -> PathBuf {
        self.root.join(source)
    }

    /// `<root>/<source>/<source>.jsonl`
    pub fn jsonl(&self, source: &str) -> PathBuf {
        self.source_dir(source).join(format!("{}.jsonl", source))
    }

    /// `<root>/tess/<instance>.jsonl`
    pub fn tess_jsonl(&self, instance: &str) -> PathBuf {
        self.source_dir("tess").join(format!("{}.jsonl", instance))
    }

    pub fn dalia_fts(&self) -> PathBuf {
        self.dalia_file("dalia-fts-sqlite.db")
    }

    pub fn dalia_tfidf(&self) -> (PathBuf, PathBuf) {
        (
            self.dalia_file("dalia-tfidf-index.tsv"),
            self.dalia_file("dalia-tfidf-similarities.tsv"),
        )
    }

    pub fn dalia_embeddings(&self) -> (PathBuf, PathBuf) {
        (
            self.dalia_file("dalia-transformers-index.tsv"),
            self.dalia_file("dalia-transformers-similarities.tsv"),
        )
    }

    fn dalia_file(&self, name: &str) -> PathBuf {
        self.source_dir("dalia").join(name)
    }
}

/// Loads the ROR lexicon when a path is given, otherwise grounds nothing.
pub fn load_grounder(path: Option<&Path>) -> Result<Box<dyn Grounder>, AppError> {
    match path {
        Some(p) => Ok(Box::new(LexiconGrounder::from_path(p)?)),
        None => Ok(Box::new(NoGrounder)),
    }
}

/// Fetches and converts every material of one TeSS instance.
pub async fn harvest_tess(
    client: &TessClient,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<(Vec<EducationalResource>, HarvestStats), AppError> {
    let materials = client.list_materials().await?;
    Ok(convert_tess_materials(
        &materials,
        client.key(),
        client.base_url(),
        grounder,
        unknown,
    ))
}

fn convert_tess_materials(
    materials: &[tess::TessMaterial],
    key: &str,
    base_url: &str,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> (Vec<EducationalResource>, HarvestStats) {
    let mut stats = HarvestStats::new();
    let mut resources = Vec::with_capacity(materials.len());
    for material in materials {
        let converted = tess::convert_material(material, key, base_url, grounder, unknown);
        stats.record_conversion(&converted);
        resources.extend(converted);
    }
    (resources, stats)
}

/// Reads and converts a gzip NDJSON dump, stopping after `limit` records.
///
/// Lines that are not valid JSON are counted as failed and logged.
pub fn read_oersi(
    path: &Path,
    limit: Option<usize>,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<(Vec<EducationalResource>, HarvestStats), AppError> {
    let mut stats = HarvestStats::new();
    let mut resources = Vec::new();

    for (i, line) in open_dump(path)?.enumerate() {
        if limit.is_some_and(|max| resources.len() >= max) {
            debug!("Reached limit of {} OERSI records", resources.len());
            break;
        }
        match oersi::convert_line(&line?, grounder, unknown) {
            Ok(converted) => {
                stats.record_conversion(&converted);
                resources.extend(converted);
            }
            Err(e) => {
                warn!("OERSI line {}: invalid JSON: {}", i + 1, e);
                stats.record(RecordOutcome::Failed);
            }
        }
    }

    info!(
        "Converted {} OERSI records ({} skipped, {} invalid)",
        stats.processed, stats.skipped, stats.failed
    );
    Ok((resources, stats))
}

/// Writes a fresh full-text index of `resources` to `path`.
pub async fn write_fts_index(
    resources: &[EducationalResource],
    path: &Path,
    config: &IndexConfig,
) -> Result<usize, AppError> {
    let index = FullTextIndex::create(path, config).await?;
    let count = index.insert_all(resources).await?;
    index.close().await;
    Ok(count)
}

/// Writes the TF-IDF index and similarity files. Returns the number of pairs.
pub fn write_tfidf(
    resources: &[EducationalResource],
    index_path: &Path,
    similarities_path: &Path,
    config: &SimilarityConfig,
) -> Result<usize, AppError> {
    let index = TfIdfIndex::build(resources);
    write_tfidf_index(&index, index_path, config.index_terms)?;
    let pairs = index.similarities(config.top_k, config.min_score);
    write_similarities(index.keys(), &pairs, similarities_path)?;
    info!(
        "Wrote TF-IDF index of {} records and {} similarity pairs",
        index.len(),
        pairs.len()
    );
    Ok(pairs.len())
}

/// Embeds every resource with Gemini and writes the index and similarity files.
///
/// A resource whose embedding request fails is logged and left out. Returns
/// the number of embedded resources.
pub async fn write_embeddings(
    resources: &[EducationalResource],
    client: &GeminiClient,
    index_path: &Path,
    similarities_path: &Path,
    config: &SimilarityConfig,
) -> Result<usize, AppError> {
    let total = resources.len();
    let mut index = EmbeddingIndex::new();

    for (i, resource) in resources.iter().enumerate() {
        let text = embedding_text(resource);
        if text.trim().is_empty() {
            continue;
        }
        match client.get_embeddings(&text).await {
            Ok(vector) => index.push(resource.key(), vector),
            Err(e) => error!(
                "[{}/{}] Failed to generate embedding for {}: {}",
                i + 1,
                total,
                resource.key(),
                e
            ),
        }
    }

    write_embedding_index(&index, index_path)?;
    let pairs = index.similarities(config.top_k, config.min_score);
    write_similarities(index.keys(), &pairs, similarities_path)?;
    info!(
        "Embedded {}/{} records, {} similarity pairs",
        index.len(),
        total,
        pairs.len()
    );
    Ok(index.len())
}

/// Title and description joined, the text each embedding is computed from.
pub fn embedding_text(resource: &EducationalResource) -> String {
    format!(
        "{} {}",
        resource.title.preferred().unwrap_or_default(),
        resource
            .description
            .as_ref()
            .and_then(|d| d.preferred())
            .unwrap_or_default()
    )
}

/// Posts every exportable resource to one TeSS space.
///
/// Resources without an English title are skipped. A failed POST is logged
/// and counted, and the upload carries on with the next resource.
pub async fn upload_resources(
    resources: &[EducationalResource],
    client: &TessClient,
    credentials: &TessCredentials,
) -> HarvestStats {
    let mut stats = HarvestStats::new();
    let total = resources.len();

    for (i, resource) in resources.iter().enumerate() {
        let Some(material) = export_tess(resource) else {
            stats.record(RecordOutcome::Skipped);
            continue;
        };
        match client.post_material(&material, credentials).await {
            Ok(()) => {
                debug!("[{}/{}] uploaded {}", i + 1, total, material.title);
                stats.record(RecordOutcome::Processed);
            }
            Err(e) => {
                error!(
                    "[{}/{}] Failed to upload {} to {}: {}",
                    i + 1,
                    total,
                    resource.key(),
                    client.key(),
                    e
                );
                stats.record(RecordOutcome::Failed);
            }
        }
    }

    info!(
        "[{}] upload complete: {} uploaded, {} skipped, {} failed",
        client.key(),
        stats.processed,
        stats.skipped,
        stats.failed
    );
    stats
}

/// Rows of the unknown-value report: vocabulary, value, count; most common first.
pub fn unknown_value_rows(unknown: &UnknownValues) -> Vec<(&'static str, &str, usize)> {
    unknown
        .vocabularies()
        .flat_map(|vocabulary| {
            unknown
                .most_common(vocabulary)
                .into_iter()
                .map(move |(value, count)| (vocabulary, value, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use minerva_core::{LangText, Reference};
    use std::io::Write;

    fn write_gz(path: &Path, text: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    fn resource(id: &str, title: &str, description: &str) -> EducationalResource {
        EducationalResource {
            reference: Some(Reference::new("dalia.oer", id)),
            title: LangText::en(title),
            description: Some(LangText::en(description)),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_layout() {
        let layout = OutputLayout::new("out");
        assert_eq!(layout.jsonl("dalia"), PathBuf::from("out/dalia/dalia.jsonl"));
        assert_eq!(layout.jsonl("oersi"), PathBuf::from("out/oersi/oersi.jsonl"));
        assert_eq!(layout.tess_jsonl("taxila"), PathBuf::from("out/tess/taxila.jsonl"));
        assert_eq!(
            layout.dalia_fts(),
            PathBuf::from("out/dalia/dalia-fts-sqlite.db")
        );
        assert_eq!(
            layout.dalia_embeddings().1,
            PathBuf::from("out/dalia/dalia-transformers-similarities.tsv")
        );
    }

    #[test]
    fn test_load_grounder() {
        let grounder = load_grounder(None).unwrap();
        assert_eq!(grounder.ground("Anything"), None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ror.tsv");
        std::fs::write(&path, "name\tror\nTIB\t04aj4c181\n").unwrap();
        let grounder = load_grounder(Some(&path)).unwrap();
        assert_eq!(grounder.ground("TIB").as_deref(), Some("04aj4c181"));

        assert!(load_grounder(Some(&dir.path().join("missing.tsv"))).is_err());
    }

    #[test]
    fn test_read_oersi_counts_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.ndjson.gz");
        write_gz(
            &path,
            concat!(
                r#"{"id": "https://example.org/a", "name": "Alpha"}"#,
                "\n",
                r#"{"id": "https://example.org/nameless"}"#,
                "\n",
                "not json\n",
                r#"{"id": "https://example.org/b", "name": "Beta"}"#,
                "\n",
            ),
        );

        let mut unknown = UnknownValues::new();
        let (resources, stats) = read_oersi(&path, None, &NoGrounder, &mut unknown).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(
            stats,
            HarvestStats {
                processed: 2,
                skipped: 1,
                failed: 1
            }
        );

        let (limited, _) = read_oersi(&path, Some(1), &NoGrounder, &mut unknown).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].title_en(), Some("Alpha"));
    }

    #[test]
    fn test_convert_tess_materials_counts_skips() {
        let materials: Vec<tess::TessMaterial> = serde_json::from_str(
            r#"[
                {"id": 1, "attributes": {"title": "Galaxy basics", "url": "https://example.org/g"}},
                {"id": 2, "attributes": {"title": "  "}}
            ]"#,
        )
        .unwrap();
        let mut unknown = UnknownValues::new();
        let (resources, stats) = convert_tess_materials(
            &materials,
            "taxila",
            "https://taxila.nl",
            &NoGrounder,
            &mut unknown,
        );
        assert_eq!(resources.len(), 1);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(resources[0].key(), "tess.taxila:1");
    }

    #[test]
    fn test_write_tfidf_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let (index_path, similarities_path) = layout.dalia_tfidf();
        let resources = vec![
            resource("1", "Git basics", "Version control with git"),
            resource("2", "Advanced git", "Branching and rebasing in git"),
            resource("3", "Astronomy", "Stars and galaxies"),
        ];

        write_tfidf(
            &resources,
            &index_path,
            &similarities_path,
            &SimilarityConfig::default(),
        )
        .unwrap();

        let index = std::fs::read_to_string(&index_path).unwrap();
        assert!(index.starts_with("key\ttitle\tterms\n"));
        assert_eq!(index.lines().count(), 4);
        let similarities = std::fs::read_to_string(&similarities_path).unwrap();
        assert!(similarities.starts_with("source\ttarget\tscore\n"));
        assert!(similarities.contains("dalia.oer:1\tdalia.oer:2\t"));
    }

    #[tokio::test]
    async fn test_write_fts_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = OutputLayout::new(dir.path()).dalia_fts();
        let resources = vec![resource("1", "Git basics", "Version control")];

        let count = write_fts_index(&resources, &path, &IndexConfig::default())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let index = FullTextIndex::open(&path, &IndexConfig::default()).await.unwrap();
        let hits = index.search("version", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "dalia.oer:1");
    }

    #[test]
    fn test_embedding_text() {
        let text = embedding_text(&resource("1", "Git basics", "Version control"));
        assert_eq!(text, "Git basics Version control");
    }

    #[test]
    fn test_unknown_value_rows() {
        let mut unknown = UnknownValues::new();
        unknown.record("resource-type", "hologram");
        unknown.record("resource-type", "poster");
        unknown.record("resource-type", "poster");
        unknown.record("license", "weird");

        let rows = unknown_value_rows(&unknown);
        assert_eq!(
            rows,
            vec![
                ("license", "weird", 1),
                ("resource-type", "poster", 2),
                ("resource-type", "hologram", 1),
            ]
        );
    }
}
