//! Unknown-value tallying for deferred vocabulary curation.
//!
//! Every value that a source emits but no mapping table knows about is
//! counted here, grouped by vocabulary. The first sighting of a value is
//! logged once; later sightings only bump the counter so a large harvest
//! does not flood the operator's terminal.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

/// Collector for unknown controlled-vocabulary values.
///
/// The collector is owned by the caller and passed by `&mut` into every
/// transform, so each run (and each test) starts from a clean slate.
///
/// # Examples
///
/// ```
/// use minerva_core::UnknownValues;
///
/// let mut unknown = UnknownValues::new();
/// assert!(unknown.record("resource-type", "hologram"));
/// assert!(!unknown.record("resource-type", "hologram"));
/// assert_eq!(unknown.count("resource-type", "hologram"), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct UnknownValues {
    by_vocabulary: BTreeMap<&'static str, HashMap<String, usize>>,
}

impl UnknownValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `value` in `vocabulary`.
    ///
    /// Returns `true` when this is the first occurrence, which is also the only
    /// time the value is reported.
    pub fn record(&mut self, vocabulary: &'static str, value: &str) -> bool {
        let count = self
            .by_vocabulary
            .entry(vocabulary)
            .or_default()
            .entry(value.to_string())
            .or_insert(0);
        *count += 1;

        let first = *count == 1;
        if first {
            warn!("Unknown {} value: {:?}", vocabulary, value);
        }
        first
    }

    /// Number of times `value` was seen in `vocabulary`.
    pub fn count(&self, vocabulary: &str, value: &str) -> usize {
        self.by_vocabulary
            .get(vocabulary)
            .and_then(|counts| counts.get(value))
            .copied()
            .unwrap_or(0)
    }

    /// Values of one vocabulary ordered most common first, ties broken alphabetically.
    pub fn most_common(&self, vocabulary: &str) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .by_vocabulary
            .get(vocabulary)
            .map(|counts| counts.iter().map(|(v, c)| (v.as_str(), *c)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Vocabularies that have at least one unknown value, in name order.
    pub fn vocabularies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_vocabulary.keys().copied()
    }

    /// Number of distinct unknown values across all vocabularies.
    pub fn distinct(&self) -> usize {
        self.by_vocabulary.values().map(HashMap::len).sum()
    }

    /// Number of unknown occurrences across all vocabularies.
    pub fn total(&self) -> usize {
        self.by_vocabulary
            .values()
            .flat_map(HashMap::values)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_vocabulary.is_empty()
    }
}
