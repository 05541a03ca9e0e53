//! Export to TeSS learning materials.

use serde::{Deserialize, Serialize};

use crate::models::{EducationalResource, EN};

/// Difficulty level sent for every exported material.
pub const DEFAULT_DIFFICULTY_LEVEL: &str = "notspecified";

/// A scientific topic attached to a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_label: Option<String>,
    pub uri: String,
}

/// The writable subset of a TeSS material, in the shape `materials.json` accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningMaterial {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scientific_topics: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licence: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    pub difficulty_level: String,
}

/// Request body for creating a material: `{"material": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialEnvelope<'a> {
    pub material: &'a LearningMaterial,
}

impl LearningMaterial {
    pub fn envelope(&self) -> MaterialEnvelope<'_> {
        MaterialEnvelope { material: self }
    }
}

/// Maps a resource onto a TeSS material.
///
/// Returns `None` when the resource has no English title, since TeSS
/// rejects untitled materials.
///
/// # Examples
///
/// ```
/// use minerva_core::export::export_tess;
/// use minerva_core::{EducationalResource, LangText};
///
/// let resource = EducationalResource {
///     title: LangText::en("Intro to SPARQL"),
///     description: Some(LangText::en("Querying RDF graphs")),
///     ..Default::default()
/// };
/// let material = export_tess(&resource).unwrap();
/// assert_eq!(material.description.as_deref(), Some("Querying RDF graphs"));
/// assert_eq!(material.difficulty_level, "notspecified");
///
/// assert!(export_tess(&EducationalResource::default()).is_none());
/// ```
pub fn export_tess(resource: &EducationalResource) -> Option<LearningMaterial> {
    let title = resource.title.get(EN).filter(|t| !t.trim().is_empty())?;

    Some(LearningMaterial {
        title: title.to_string(),
        url: resource.primary_uri().map(str::to_string),
        description: resource.description_en().map(str::to_string),
        keywords: resource
            .keywords_en()
            .into_iter()
            .map(str::to_string)
            .collect(),
        scientific_topics: resource
            .disciplines
            .iter()
            .map(|uri| Topic {
                preferred_label: None,
                uri: uri.clone(),
            })
            .collect(),
        licence: resource
            .license
            .as_ref()
            .and_then(|l| l.spdx_id())
            .map(str::to_string),
        authors: resource
            .authors
            .iter()
            .map(|a| a.name().to_string())
            .collect(),
        difficulty_level: DEFAULT_DIFFICULTY_LEVEL.to_string(),
    })
}
