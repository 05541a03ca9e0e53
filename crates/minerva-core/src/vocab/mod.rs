//! Controlled vocabularies and the label-to-identifier mapper.
//!
//! Source catalogs describe resources with free-text labels ("Slides",
//! "youtube video", "Intermediate"). A [`Vocabulary`] maps the normalized label
//! (trimmed, lowercased) onto a controlled identifier. A table entry can also
//! map to `None`, meaning the label is known but deliberately left unmapped;
//! only labels missing from the table are tallied as unknown.

mod tables;

use std::collections::HashMap;
use std::fmt;

use crate::diagnostics::UnknownValues;

pub use tables::{
    DALIA_LEARNING_RESOURCE_TYPES, DALIA_MEDIA_TYPES, DALIA_PROFICIENCY_LEVELS,
    DALIA_TARGET_GROUPS, LANGUAGES, TESS_DIFFICULTY_LEVELS, TESS_RESOURCE_TYPES,
};

/// Namespaces of the controlled identifiers emitted by Minerva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// schema.org types
    Schema,
    /// Hochschulcampus Ressourcentypen
    Hcrt,
    /// MoDALIA ontology
    Modalia,
    /// Bibliographic Ontology
    Bibo,
    /// SPDX license list
    SpdxLicense,
}

impl Namespace {
    pub const fn base(self) -> &'static str {
        match self {
            Namespace::Schema => "https://schema.org/",
            Namespace::Hcrt => "https://w3id.org/kim/hcrt/",
            Namespace::Modalia => "https://purl.org/ontology/modalia#",
            Namespace::Bibo => "http://purl.org/ontology/bibo/",
            Namespace::SpdxLicense => "http://spdx.org/licenses/",
        }
    }
}

/// A controlled identifier: a local name inside a [`Namespace`].
///
/// # Examples
///
/// ```
/// use minerva_core::vocab::{Namespace, Term};
///
/// let video = Term::new(Namespace::Schema, "VideoObject");
/// assert_eq!(video.uri(), "https://schema.org/VideoObject");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term {
    pub namespace: Namespace,
    pub local: &'static str,
}

impl Term {
    pub const fn new(namespace: Namespace, local: &'static str) -> Self {
        Self { namespace, local }
    }

    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace.base(), self.local)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace.base(), self.local)
    }
}

/// Result of looking a label up in a [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The label maps onto a controlled identifier.
    Mapped(T),
    /// The label is known but intentionally has no identifier.
    Unmapped,
    /// The label is not in the table.
    Unknown,
}

/// Static mapping from normalized labels to controlled identifiers.
pub struct Vocabulary<T: 'static> {
    name: &'static str,
    entries: HashMap<String, Option<T>>,
}

impl<T: Copy + 'static> Vocabulary<T> {
    /// Builds a vocabulary from `(label, identifier)` entries.
    ///
    /// Labels are normalized the same way lookups are, so tables may be
    /// written in any case. When a label appears twice the first entry wins.
    pub fn new<'a, I>(name: &'static str, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<T>)>,
    {
        let mut map = HashMap::new();
        for (label, value) in entries {
            map.entry(normalize_label(label)).or_insert(value);
        }
        Self { name, entries: map }
    }

    /// Name under which unknown values of this vocabulary are tallied.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, label: &str) -> Lookup<T> {
        match self.entries.get(&normalize_label(label)) {
            Some(Some(value)) => Lookup::Mapped(*value),
            Some(None) => Lookup::Unmapped,
            None => Lookup::Unknown,
        }
    }

    /// Maps one label, tallying it in `unknown` when it is not in the table.
    ///
    /// Blank labels are ignored without being tallied. Unknown labels are
    /// tallied with surrounding whitespace removed.
    pub fn map(&self, label: &str, unknown: &mut UnknownValues) -> Option<T> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        match self.lookup(label) {
            Lookup::Mapped(value) => Some(value),
            Lookup::Unmapped => None,
            Lookup::Unknown => {
                unknown.record(self.name, label);
                None
            }
        }
    }

    /// Maps every label, dropping unmapped and unknown ones.
    pub fn map_all<'a, I>(&self, labels: I, unknown: &mut UnknownValues) -> Vec<T>
    where
        I: IntoIterator<Item = &'a str>,
        T: PartialEq,
    {
        let mut out = Vec::new();
        for label in labels {
            if let Some(value) = self.map(label, unknown) {
                if !out.contains(&value) {
                    out.push(value);
                }
            }
        }
        out
    }
}

/// Normalization applied to every label before lookup.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
