//! Records from the OERSI search index dump.
//!
//! The dump is gzip-compressed NDJSON; each line is a schema.org-flavoured
//! JSON object. Audience, subject and resource-type ids are already
//! controlled URIs and pass through unchanged.

use serde::Deserialize;
use tracing::debug;

use crate::diagnostics::UnknownValues;
use crate::identity::{normalize_orcid, normalize_ror, normalize_wikidata, resolve_organization, Grounder};
use crate::license::normalize_license_or_url;
use crate::models::{Creator, EducationalResource, LangText, Person};
use crate::sources::{non_empty, parse_date};
use crate::vocab::LANGUAGES;

pub const PLATFORM: &str = "oersi";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OersiRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub in_language: Option<Vec<String>>,
    pub audience: Option<Vec<OersiConcept>>,
    pub about: Option<Vec<OersiConcept>>,
    pub learning_resource_type: Option<Vec<OersiConcept>>,
    pub license: Option<OersiConcept>,
    pub keywords: Option<Vec<String>>,
    pub creator: Option<Vec<OersiCreator>>,
    pub date_published: Option<String>,
}

/// A `{ "id": ... }` reference to a controlled concept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OersiConcept {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OersiCreator {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
}

fn concept_ids(concepts: &Option<Vec<OersiConcept>>) -> Vec<String> {
    concepts
        .iter()
        .flatten()
        .filter_map(|c| non_empty(c.id.as_deref()))
        .collect()
}

fn convert_creator(creator: &OersiCreator, grounder: &dyn Grounder) -> Option<Creator> {
    let name = non_empty(creator.name.as_deref())?;
    let id = creator.id.as_deref();

    match creator.kind.as_deref() {
        Some("Organization") => Some(Creator::Organization(resolve_organization(
            &name,
            id.and_then(normalize_ror),
            id.and_then(normalize_wikidata),
            grounder,
        ))),
        _ => Some(Creator::Person(Person {
            name,
            orcid: id.and_then(normalize_orcid),
        })),
    }
}

/// Converts one dump record. Records without a name are skipped.
pub fn convert_record(
    record: &OersiRecord,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Option<EducationalResource> {
    let Some(title) = non_empty(record.name.as_deref()) else {
        debug!("[oersi] skipping record {:?} without name", record.id);
        return None;
    };

    Some(EducationalResource {
        platform: Some(PLATFORM.to_string()),
        external_uris: non_empty(record.id.as_deref()).into_iter().collect(),
        title: LangText::en(title),
        description: non_empty(record.description.as_deref()).map(LangText::en),
        keywords: record
            .keywords
            .iter()
            .flatten()
            .filter_map(|k| non_empty(Some(k.as_str())))
            .map(LangText::en)
            .collect(),
        license: record
            .license
            .as_ref()
            .and_then(|l| l.id.as_deref())
            .and_then(|id| normalize_license_or_url(id, unknown)),
        authors: record
            .creator
            .iter()
            .flatten()
            .filter_map(|c| convert_creator(c, grounder))
            .collect(),
        disciplines: concept_ids(&record.about),
        resource_types: concept_ids(&record.learning_resource_type),
        audience: concept_ids(&record.audience),
        languages: LANGUAGES
            .map_all(
                record.in_language.iter().flatten().map(String::as_str),
                unknown,
            )
            .into_iter()
            .map(str::to_string)
            .collect(),
        date_published: record
            .date_published
            .as_deref()
            .and_then(|d| parse_date(d, unknown)),
        ..Default::default()
    })
}

/// Parses one NDJSON line and converts it.
pub fn convert_line(
    line: &str,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<Option<EducationalResource>, serde_json::Error> {
    let record: OersiRecord = serde_json::from_str(line)?;
    Ok(convert_record(&record, grounder, unknown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::NoGrounder;
    use crate::models::{License, Organization};

    const LINE: &str = r#"{
        "@context": ["https://w3id.org/kim/amb/context.jsonld"],
        "id": "https://example.org/oer/statistics-101",
        "name": "Statistics 101",
        "description": "An open statistics course.",
        "inLanguage": ["de", "en"],
        "audience": [{"id": "http://purl.org/dcx/lrmi-vocabs/educationalAudienceRole/student"}],
        "about": [{"id": "https://w3id.org/kim/hochschulfaechersystematik/n37"}],
        "learningResourceType": [{"id": "https://w3id.org/kim/hcrt/course"}],
        "license": {"id": "https://creativecommons.org/licenses/by-sa/4.0/"},
        "keywords": ["statistics", "R"],
        "creator": [
            {"type": "Person", "name": "Max Muster", "id": "https://orcid.org/0000-0002-1825-0097"},
            {"type": "Organization", "name": "TIB", "id": "https://ror.org/04aj4c181"}
        ],
        "datePublished": "2020-09-01",
        "conditionsOfAccess": {"id": "http://w3id.org/kim/conditionsOfAccess/no_login"}
    }"#;

    #[test]
    fn test_convert_line() {
        let mut unknown = UnknownValues::new();
        let resource = convert_line(LINE, &NoGrounder, &mut unknown).unwrap().unwrap();

        assert_eq!(resource.platform.as_deref(), Some("oersi"));
        assert_eq!(resource.primary_uri(), Some("https://example.org/oer/statistics-101"));
        assert_eq!(resource.title_en(), Some("Statistics 101"));
        assert_eq!(resource.description_en(), Some("An open statistics course."));
        assert_eq!(resource.languages, vec!["deu", "eng"]);
        assert_eq!(resource.license, Some(License::Spdx("CC-BY-SA-4.0")));
        assert_eq!(
            resource.audience,
            vec!["http://purl.org/dcx/lrmi-vocabs/educationalAudienceRole/student"]
        );
        assert_eq!(
            resource.disciplines,
            vec!["https://w3id.org/kim/hochschulfaechersystematik/n37"]
        );
        assert_eq!(resource.resource_types, vec!["https://w3id.org/kim/hcrt/course"]);
        assert_eq!(resource.keywords_en(), vec!["statistics", "R"]);
        assert_eq!(resource.date_published.unwrap().to_string(), "2020-09-01");

        assert_eq!(
            resource.authors[0],
            Creator::Person(Person {
                name: "Max Muster".into(),
                orcid: Some("0000-0002-1825-0097".into()),
            })
        );
        assert_eq!(
            resource.authors[1],
            Creator::Organization(Organization {
                name: "TIB".into(),
                ror: Some("04aj4c181".into()),
                wikidata: None,
                relation: None,
            })
        );
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_record_without_name_is_skipped() {
        let mut unknown = UnknownValues::new();
        let result = convert_line(r#"{"id": "https://example.org/x"}"#, &NoGrounder, &mut unknown);
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_unknown_language_is_tallied() {
        let mut unknown = UnknownValues::new();
        let resource = convert_line(
            r#"{"name": "Klingon for beginners", "inLanguage": ["tlh-x"]}"#,
            &NoGrounder,
            &mut unknown,
        )
        .unwrap()
        .unwrap();
        assert!(resource.languages.is_empty());
        assert_eq!(unknown.count("language", "tlh-x"), 1);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut unknown = UnknownValues::new();
        assert!(convert_line("{not json", &NoGrounder, &mut unknown).is_err());
    }
}
