//! Similarity indexes over harvested resources.
//!
//! Two flavours share one top-k routine: a TF-IDF index built locally from
//! title, description and keywords, and an embedding index whose vectors
//! come from an external model. Both are written as TSV files keyed by
//! [`EducationalResource::key`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::models::EducationalResource;

const STOP_WORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "how", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "what", "with", "you",
    "your",
];

/// Splits text into lowercase alphanumeric tokens of at least two characters,
/// dropping common English stop words.
///
/// # Examples
///
/// ```
/// use minerva_core::similarity::tokenize;
///
/// assert_eq!(tokenize("Intro to R: the Basics!"), vec!["intro", "basics"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// A scored link from one record to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityPair {
    pub source: usize,
    pub target: usize,
    pub score: f64,
}

/// For every record, keeps the `top_k` best-scoring other records whose score
/// is at least `min_score`. Ties are broken by target position.
pub fn top_k_pairs<F>(count: usize, top_k: usize, min_score: f64, score: F) -> Vec<SimilarityPair>
where
    F: Fn(usize, usize) -> f64,
{
    let mut pairs = Vec::new();
    for source in 0..count {
        let mut candidates: Vec<SimilarityPair> = (0..count)
            .filter(|&target| target != source)
            .map(|target| SimilarityPair {
                source,
                target,
                score: score(source, target),
            })
            .filter(|p| p.score >= min_score)
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.target.cmp(&b.target))
        });
        candidates.truncate(top_k);
        pairs.extend(candidates);
    }
    pairs
}

/// Sparse vector as `(term id, weight)` sorted by term id.
type SparseVector = Vec<(usize, f64)>;

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// TF-IDF vectors of a set of resources, L2-normalized so the dot product is
/// the cosine similarity.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    keys: Vec<String>,
    titles: Vec<String>,
    terms: Vec<String>,
    vectors: Vec<SparseVector>,
}

impl TfIdfIndex {
    /// Builds the index with smoothed idf: `ln((1 + n) / (1 + df)) + 1`.
    pub fn build(resources: &[EducationalResource]) -> Self {
        let documents: Vec<HashMap<String, usize>> = resources
            .iter()
            .map(|r| {
                let mut counts = HashMap::new();
                for token in tokenize(&r.search_text()) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for counts in &documents {
            for term in counts.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let terms: Vec<String> = document_frequency.keys().map(|t| t.to_string()).collect();
        let term_ids: HashMap<&str, usize> = terms
            .iter()
            .enumerate()
            .map(|(id, t)| (t.as_str(), id))
            .collect();

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = documents
            .iter()
            .map(|counts| {
                let mut vector: SparseVector = counts
                    .iter()
                    .map(|(term, &tf)| {
                        let id = term_ids[term.as_str()];
                        (id, tf as f64 * idf[id])
                    })
                    .collect();
                vector.sort_by_key(|&(id, _)| id);
                let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in &mut vector {
                        *w /= norm;
                    }
                }
                vector
            })
            .collect();

        Self {
            keys: resources.iter().map(EducationalResource::key).collect(),
            titles: resources
                .iter()
                .map(|r| r.title.preferred().unwrap_or_default().to_string())
                .collect(),
            terms,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        sparse_dot(&self.vectors[a], &self.vectors[b])
    }

    /// The `limit` highest-weighted terms of a record, heaviest first.
    pub fn top_terms(&self, index: usize, limit: usize) -> Vec<(&str, f64)> {
        let mut weighted: Vec<(&str, f64)> = self.vectors[index]
            .iter()
            .map(|&(id, w)| (self.terms[id].as_str(), w))
            .collect();
        weighted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(b.0))
        });
        weighted.truncate(limit);
        weighted
    }

    pub fn similarities(&self, top_k: usize, min_score: f64) -> Vec<SimilarityPair> {
        top_k_pairs(self.len(), top_k, min_score, |a, b| self.cosine(a, b))
    }
}

/// Dense embedding vectors, L2-normalized on insert.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    keys: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: String, mut vector: Vec<f32>) {
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        self.keys.push(key);
        self.vectors.push(vector);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        self.vectors[a]
            .iter()
            .zip(&self.vectors[b])
            .map(|(x, y)| f64::from(*x) * f64::from(*y))
            .sum()
    }

    pub fn similarities(&self, top_k: usize, min_score: f64) -> Vec<SimilarityPair> {
        top_k_pairs(self.len(), top_k, min_score, |a, b| self.cosine(a, b))
    }
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<fs::File>, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?)
}

/// Writes `key`, `title`, `terms` rows; terms are space-separated `term:weight`.
pub fn write_tfidf_index(
    index: &TfIdfIndex,
    path: &Path,
    terms_per_record: usize,
) -> Result<(), AppError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["key", "title", "terms"])?;
    for i in 0..index.len() {
        let terms = index
            .top_terms(i, terms_per_record)
            .iter()
            .map(|(term, weight)| format!("{}:{:.4}", term, weight))
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_record([index.keys[i].as_str(), index.titles[i].as_str(), terms.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `key` followed by one column per embedding dimension.
pub fn write_embedding_index(index: &EmbeddingIndex, path: &Path) -> Result<(), AppError> {
    let mut writer = tsv_writer(path)?;
    let dimensions = index.vectors.first().map(Vec::len).unwrap_or_default();
    let mut header = vec!["key".to_string()];
    header.extend((0..dimensions).map(|d| format!("d{}", d)));
    writer.write_record(&header)?;

    for (key, vector) in index.keys.iter().zip(&index.vectors) {
        let mut row = vec![key.clone()];
        row.extend(vector.iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `source`, `target`, `score` rows using record keys.
pub fn write_similarities(
    keys: &[String],
    pairs: &[SimilarityPair],
    path: &Path,
) -> Result<(), AppError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["source", "target", "score"])?;
    for pair in pairs {
        writer.write_record([
            keys[pair.source].as_str(),
            keys[pair.target].as_str(),
            format!("{:.4}", pair.score).as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LangText, Reference};

    fn resource(id: &str, title: &str, description: &str) -> EducationalResource {
        EducationalResource {
            reference: Some(Reference::new("dalia.oer", id)),
            title: LangText::en(title),
            description: Some(LangText::en(description)),
            ..Default::default()
        }
    }

    fn corpus() -> Vec<EducationalResource> {
        vec![
            resource("git", "Git basics", "Version control with git branches"),
            resource("git2", "Advanced git", "Rebasing git branches and history"),
            resource("pasta", "Cooking pasta", "Boil water and add salt"),
        ]
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("The FAIR principles, and how-to guides (v2)"),
            vec!["fair", "principles", "guides", "v2"]
        );
        assert!(tokenize("a I . !").is_empty());
    }

    #[test]
    fn test_vectors_are_normalized() {
        let index = TfIdfIndex::build(&corpus());
        for i in 0..index.len() {
            assert!((index.cosine(i, i) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_related_records_rank_higher() {
        let index = TfIdfIndex::build(&corpus());
        assert!(index.cosine(0, 1) > index.cosine(0, 2));
        assert_eq!(index.cosine(0, 2), 0.0);
    }

    #[test]
    fn test_similarities_respect_threshold_and_exclude_self() {
        let index = TfIdfIndex::build(&corpus());
        let pairs = index.similarities(10, 0.1);
        assert!(pairs.iter().all(|p| p.source != p.target));
        assert!(pairs.iter().all(|p| p.score >= 0.1));
        let linked: Vec<(usize, usize)> = pairs.iter().map(|p| (p.source, p.target)).collect();
        assert_eq!(linked, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_top_k_pairs_ordering() {
        let scores = [[1.0, 0.2, 0.9, 0.5], [0.2, 1.0, 0.3, 0.3], [0.9, 0.3, 1.0, 0.05], [0.5, 0.3, 0.05, 1.0]];
        let pairs = top_k_pairs(4, 2, 0.1, |a, b| scores[a][b]);

        let from_zero: Vec<usize> = pairs.iter().filter(|p| p.source == 0).map(|p| p.target).collect();
        assert_eq!(from_zero, vec![2, 3]);

        // tie between 2 and 3 is broken by position
        let from_one: Vec<usize> = pairs.iter().filter(|p| p.source == 1).map(|p| p.target).collect();
        assert_eq!(from_one, vec![2, 3]);

        let from_three: Vec<usize> = pairs.iter().filter(|p| p.source == 3).map(|p| p.target).collect();
        assert_eq!(from_three, vec![0, 1]);
    }

    #[test]
    fn test_top_terms_prefer_rare_terms() {
        let index = TfIdfIndex::build(&corpus());
        let terms = index.top_terms(1, 3);
        assert_eq!(terms.len(), 3);
        assert!(terms.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(terms[0].0, "git");
    }

    #[test]
    fn test_embedding_cosine() {
        let mut index = EmbeddingIndex::new();
        index.push("a".into(), vec![1.0, 0.0]);
        index.push("b".into(), vec![2.0, 0.1]);
        index.push("c".into(), vec![0.0, 3.0]);
        assert!((index.cosine(0, 0) - 1.0).abs() < 1e-6);
        assert!(index.cosine(0, 1) > 0.99);
        assert!(index.cosine(0, 2).abs() < 1e-6);

        let pairs = index.similarities(1, 0.1);
        assert_eq!(pairs[0].target, 1);
    }

    #[test]
    fn test_writers() {
        let dir = tempfile::tempdir().unwrap();
        let index = TfIdfIndex::build(&corpus());

        let index_path = dir.path().join("dalia-tfidf-index.tsv");
        write_tfidf_index(&index, &index_path, 5).unwrap();
        let text = std::fs::read_to_string(&index_path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("key\ttitle\tterms"));
        assert!(lines.next().unwrap().starts_with("dalia.oer:git\tGit basics\t"));

        let sim_path = dir.path().join("dalia-tfidf-similarities.tsv");
        write_similarities(index.keys(), &index.similarities(10, 0.1), &sim_path).unwrap();
        let text = std::fs::read_to_string(&sim_path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("dalia.oer:git\tdalia.oer:git2\t"));

        let mut embeddings = EmbeddingIndex::new();
        embeddings.push("x".into(), vec![3.0, 4.0]);
        let emb_path = dir.path().join("dalia-transformers-index.tsv");
        write_embedding_index(&embeddings, &emb_path).unwrap();
        let text = std::fs::read_to_string(&emb_path).unwrap();
        assert_eq!(text, "key\td0\td1\nx\t0.600000\t0.800000\n");
    }
}
