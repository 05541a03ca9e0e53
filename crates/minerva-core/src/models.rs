//! The shared record schema every source is normalized into.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::vocab::Namespace;

/// Language code used for all English text.
pub const EN: &str = "en";

/// Text keyed by language code, with at most one entry per language.
///
/// # Examples
///
/// ```
/// use minerva_core::LangText;
///
/// let mut title = LangText::en("Intro to RDF");
/// title.insert("en", "Introduction to RDF");
/// assert_eq!(title.len(), 1);
/// assert_eq!(title.get("en"), Some("Introduction to RDF"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangText(BTreeMap<String, String>);

impl LangText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn en(text: impl Into<String>) -> Self {
        let mut rv = Self::new();
        rv.insert(EN, text);
        rv
    }

    /// Sets the text for `language`, returning the text it replaced.
    pub fn insert(&mut self, language: &str, text: impl Into<String>) -> Option<String> {
        self.0.insert(language.to_string(), text.into())
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    /// English text if present, otherwise the text of the first language.
    pub fn preferred(&self) -> Option<&str> {
        self.get(EN)
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compact identifier of a record in its source catalog, written `prefix:identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub prefix: String,
    pub identifier: String,
}

impl Reference {
    pub fn new(prefix: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.identifier)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// License of a resource.
///
/// `Unmapped` keeps the lowercased source text of a license that is not in
/// the SPDX table yet, so curators can still recover it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum License {
    Spdx(&'static str),
    Unmapped(String),
}

impl License {
    pub fn spdx_id(&self) -> Option<&'static str> {
        match self {
            License::Spdx(id) => Some(id),
            License::Unmapped(_) => None,
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            License::Spdx(id) => write!(f, "{}{}", Namespace::SpdxLicense.base(), id),
            License::Unmapped(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for License {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A natural person who authored a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

/// How an organization relates to a resource, from the `(S)`/`(R)` name markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRelation {
    Sponsor,
    ResponsibleParty,
    SponsorAndResponsibleParty,
}

impl OrganizationRelation {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "S" => Some(Self::Sponsor),
            "R" => Some(Self::ResponsibleParty),
            "SR" | "RS" => Some(Self::SponsorAndResponsibleParty),
            _ => None,
        }
    }
}

/// An organization credited on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ror: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikidata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<OrganizationRelation>,
}

/// An author entry: either a person or an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Creator {
    Person(Person),
    Organization(Organization),
}

impl Creator {
    pub fn name(&self) -> &str {
        match self {
            Creator::Person(p) => &p.name,
            Creator::Organization(o) => &o.name,
        }
    }
}

/// A normalized open educational resource.
///
/// Built once per source record and serialized straight away; nothing
/// mutates it after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EducationalResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_uris: Vec<String>,
    pub title: LangText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LangText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<LangText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Creator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disciplines: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub difficulty_levels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_formats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl EducationalResource {
    /// Stable key used in index files: the reference, else the primary URI,
    /// else the title.
    pub fn key(&self) -> String {
        if let Some(reference) = &self.reference {
            return reference.to_string();
        }
        if let Some(uri) = self.primary_uri() {
            return uri.to_string();
        }
        self.title.preferred().unwrap_or_default().to_string()
    }

    pub fn primary_uri(&self) -> Option<&str> {
        self.external_uris.first().map(String::as_str)
    }

    pub fn title_en(&self) -> Option<&str> {
        self.title.get(EN)
    }

    pub fn description_en(&self) -> Option<&str> {
        self.description.as_ref().and_then(|d| d.get(EN))
    }

    /// English keywords, in source order.
    pub fn keywords_en(&self) -> Vec<&str> {
        self.keywords.iter().filter_map(|k| k.get(EN)).collect()
    }

    /// Title, description and keywords joined into one string for indexing.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = self.title.preferred() {
            parts.push(title);
        }
        if let Some(description) = self.description.as_ref().and_then(LangText::preferred) {
            parts.push(description);
        }
        parts.extend(self.keywords.iter().filter_map(LangText::preferred));
        parts.join(" ")
    }
}
