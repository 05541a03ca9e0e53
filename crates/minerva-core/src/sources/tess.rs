//! Materials from TeSS-family training catalogs.
//!
//! The catalogs serve JSON:API documents; each entry of `data` deserializes
//! into a [`TessMaterial`]. Attribute keys are kebab-case.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::diagnostics::UnknownValues;
use crate::identity::{resolve_author, Grounder};
use crate::license::normalize_license;
use crate::models::{EducationalResource, LangText, Reference};
use crate::sources::{non_empty, parse_date};
use crate::vocab::{Term, TESS_DIFFICULTY_LEVELS, TESS_RESOURCE_TYPES};

pub const DOI_PREFIX: &str = "https://doi.org/";

/// Identifier of a material; some instances emit numbers, others strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TessId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TessId::Number(n) => write!(f, "{}", n),
            TessId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TessMaterial {
    pub id: TessId,
    #[serde(default)]
    pub attributes: TessAttributes,
    #[serde(default)]
    pub links: TessLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TessAttributes {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    pub licence: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub resource_type: Option<Vec<String>>,
    pub difficulty_level: Option<String>,
    pub authors: Option<Vec<TessAuthor>>,
    pub scientific_topics: Option<Vec<TessTopic>>,
    pub date_published: Option<String>,
    pub version: Option<String>,
}

/// An author as listed by TeSS: a bare name or a name with an ORCID.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TessAuthor {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        orcid: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TessTopic {
    pub preferred_label: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TessLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
}

/// Cleans a DOI and turns it into a `https://doi.org/` URI.
///
/// Blank DOIs and DOIs containing a space are discarded.
///
/// # Examples
///
/// ```
/// use minerva_core::sources::tess::clean_doi;
///
/// assert_eq!(
///     clean_doi("http://doi.org/10.5281/zenodo.1234").as_deref(),
///     Some("https://doi.org/10.5281/zenodo.1234")
/// );
/// assert_eq!(clean_doi("see website"), None);
/// ```
pub fn clean_doi(raw: &str) -> Option<String> {
    if raw.trim().is_empty() || raw.contains(' ') {
        return None;
    }
    let doi = raw
        .strip_prefix(DOI_PREFIX)
        .or_else(|| raw.strip_prefix("http://doi.org/"))
        .unwrap_or(raw)
        .trim();
    if doi.is_empty() {
        return None;
    }
    Some(format!("{}{}", DOI_PREFIX, doi))
}

/// Converts one TeSS material.
///
/// `platform_key` is the instance key (`tess`, `taxila`, ...) and `base_url`
/// its root URL, used to build `derived_from`. Materials without a title are
/// skipped.
pub fn convert_material(
    material: &TessMaterial,
    platform_key: &str,
    base_url: &str,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Option<EducationalResource> {
    let attributes = &material.attributes;

    let Some(title) = non_empty(attributes.title.as_deref()) else {
        debug!("[{}] skipping material {} without title", platform_key, material.id);
        return None;
    };

    let mut external_uris = Vec::new();
    if let Some(doi) = attributes.doi.as_deref().and_then(clean_doi) {
        external_uris.push(doi);
    }
    if let Some(url) = non_empty(attributes.url.as_deref()) {
        if !external_uris.contains(&url) {
            external_uris.push(url);
        }
    }

    let derived_from = material
        .links
        .self_link
        .as_deref()
        .map(|link| format!("{}{}", base_url.trim_end_matches('/'), link));

    let resource_types: Vec<Term> = TESS_RESOURCE_TYPES.map_all(
        attributes
            .resource_type
            .iter()
            .flatten()
            .map(String::as_str),
        unknown,
    );

    let difficulty_levels: Vec<Term> = attributes
        .difficulty_level
        .as_deref()
        .and_then(|level| TESS_DIFFICULTY_LEVELS.map(level, unknown))
        .into_iter()
        .collect();

    let authors = attributes
        .authors
        .iter()
        .flatten()
        .filter_map(|author| match author {
            TessAuthor::Name(name) => resolve_author(name, None, grounder),
            TessAuthor::Detailed { name, orcid } => {
                resolve_author(name, orcid.as_deref(), grounder)
            }
        })
        .collect();

    Some(EducationalResource {
        reference: Some(Reference::new(
            format!("tess.{}", platform_key),
            material.id.to_string(),
        )),
        platform: Some(platform_key.to_string()),
        derived_from,
        external_uris,
        title: LangText::en(title),
        description: non_empty(attributes.description.as_deref()).map(LangText::en),
        keywords: attributes
            .keywords
            .iter()
            .flatten()
            .filter_map(|k| non_empty(Some(k.as_str())))
            .map(LangText::en)
            .collect(),
        license: attributes
            .licence
            .as_deref()
            .and_then(|l| normalize_license(l, unknown)),
        authors,
        disciplines: attributes
            .scientific_topics
            .iter()
            .flatten()
            .filter_map(|topic| non_empty(topic.uri.as_deref()))
            .collect(),
        resource_types: resource_types.iter().map(Term::uri).collect(),
        difficulty_levels: difficulty_levels.iter().map(Term::uri).collect(),
        date_published: attributes
            .date_published
            .as_deref()
            .and_then(|d| parse_date(d, unknown)),
        version: non_empty(attributes.version.as_deref()),
        ..Default::default()
    })
}
