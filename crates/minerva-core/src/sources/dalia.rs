//! DALIA curation sheets.
//!
//! A curation sheet is a CSV (or TSV, chosen by the `.tsv` extension) file
//! whose header names the columns below. Multi-valued cells separate their
//! values with `" * "`. Author cells list people as `Name : ORCID` and
//! organizations in braces as `{Name (S)} : ROR-or-Wikidata`; the identifier
//! part is optional.
//!
//! Rows without a title, a description or a valid `uuid` are skipped. A
//! malformed size aborts the whole sheet, since the file needs fixing.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::diagnostics::UnknownValues;
use crate::error::AppError;
use crate::identity::{normalize_orcid, normalize_ror, normalize_wikidata, resolve_organization, Grounder};
use crate::license::normalize_license;
use crate::models::{Creator, EducationalResource, LangText, Person, Reference};
use crate::size::parse_file_size;
use crate::sources::{non_empty, parse_date};
use crate::vocab::{
    Term, DALIA_LEARNING_RESOURCE_TYPES, DALIA_MEDIA_TYPES, DALIA_PROFICIENCY_LEVELS,
    DALIA_TARGET_GROUPS, LANGUAGES,
};

pub const PLATFORM: &str = "dalia";
pub const REFERENCE_PREFIX: &str = "dalia.oer";
pub const MULTI_VALUE_SEPARATOR: &str = " * ";
pub const DISCIPLINE_VOCABULARY: &str = "discipline";

/// One row of a curation sheet, keyed by header name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaliaRow {
    #[serde(rename = "uuid")]
    pub uuid: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Link")]
    pub links: Option<String>,
    #[serde(rename = "Authors")]
    pub authors: Option<String>,
    #[serde(rename = "License")]
    pub license: Option<String>,
    #[serde(rename = "Keywords")]
    pub keywords: Option<String>,
    #[serde(rename = "Discipline")]
    pub disciplines: Option<String>,
    #[serde(rename = "Language")]
    pub languages: Option<String>,
    #[serde(rename = "Proficiency Level")]
    pub proficiency_levels: Option<String>,
    #[serde(rename = "Target Group")]
    pub target_groups: Option<String>,
    #[serde(rename = "Learning Resource Type")]
    pub learning_resource_types: Option<String>,
    #[serde(rename = "Media Type")]
    pub media_types: Option<String>,
    #[serde(rename = "File Format")]
    pub file_formats: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
    #[serde(rename = "Publication Date")]
    pub publication_date: Option<String>,
    #[serde(rename = "Version")]
    pub version: Option<String>,
}

/// Splits a multi-valued cell into its trimmed, non-empty values.
pub fn split_multi(cell: Option<&str>) -> Vec<&str> {
    cell.map(|c| {
        c.split(MULTI_VALUE_SEPARATOR)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Parses one entry of an `Authors` cell.
pub fn parse_creator(entry: &str, grounder: &dyn Grounder) -> Option<Creator> {
    let (name, identifier) = match entry.rsplit_once(" : ") {
        Some((name, id)) => (name.trim(), Some(id.trim()).filter(|id| !id.is_empty())),
        None => (entry.trim(), None),
    };

    if let Some(inner) = name.strip_prefix('{').and_then(|n| n.strip_suffix('}')) {
        if inner.trim().is_empty() {
            return None;
        }
        let ror = identifier.and_then(normalize_ror);
        let wikidata = identifier.and_then(normalize_wikidata);
        return Some(Creator::Organization(resolve_organization(
            inner, ror, wikidata, grounder,
        )));
    }

    if name.is_empty() {
        return None;
    }
    Some(Creator::Person(Person {
        name: name.to_string(),
        orcid: identifier.and_then(normalize_orcid),
    }))
}

fn uris(terms: Vec<Term>) -> Vec<String> {
    terms.iter().map(Term::uri).collect()
}

/// Converts one curation row, or returns `Ok(None)` if a required field is missing.
///
/// `location` is the `file:line` label used in logs and errors.
pub fn convert_row(
    row: &DaliaRow,
    location: &str,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<Option<EducationalResource>, AppError> {
    let Some(title) = non_empty(row.title.as_deref()) else {
        debug!("[{}] skipping row without title", location);
        return Ok(None);
    };
    let Some(description) = non_empty(row.description.as_deref()) else {
        debug!("[{}] skipping row without description", location);
        return Ok(None);
    };
    let Some(uuid) = row
        .uuid
        .as_deref()
        .and_then(|u| Uuid::parse_str(u.trim()).ok())
    else {
        debug!("[{}] skipping row without a valid uuid", location);
        return Ok(None);
    };

    let file_size = match non_empty(row.size.as_deref()) {
        Some(raw) => Some(parse_file_size(&raw).map_err(|e| AppError::InvalidRow {
            location: location.to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    let mut disciplines = Vec::new();
    for discipline in split_multi(row.disciplines.as_deref()) {
        if discipline.starts_with("http://") || discipline.starts_with("https://") {
            disciplines.push(discipline.to_string());
        } else {
            unknown.record(DISCIPLINE_VOCABULARY, discipline);
        }
    }

    let resource = EducationalResource {
        reference: Some(Reference::new(REFERENCE_PREFIX, uuid.to_string())),
        platform: Some(PLATFORM.to_string()),
        derived_from: None,
        external_uris: split_multi(row.links.as_deref())
            .into_iter()
            .map(str::to_string)
            .collect(),
        title: LangText::en(title),
        description: Some(LangText::en(description)),
        keywords: split_multi(row.keywords.as_deref())
            .into_iter()
            .map(LangText::en)
            .collect(),
        license: row
            .license
            .as_deref()
            .and_then(|l| normalize_license(l, unknown)),
        authors: split_multi(row.authors.as_deref())
            .into_iter()
            .filter_map(|entry| parse_creator(entry, grounder))
            .collect(),
        disciplines,
        resource_types: uris(DALIA_LEARNING_RESOURCE_TYPES.map_all(
            split_multi(row.learning_resource_types.as_deref()),
            unknown,
        )),
        audience: uris(
            DALIA_TARGET_GROUPS.map_all(split_multi(row.target_groups.as_deref()), unknown),
        ),
        difficulty_levels: uris(DALIA_PROFICIENCY_LEVELS.map_all(
            split_multi(row.proficiency_levels.as_deref()),
            unknown,
        )),
        media_types: uris(
            DALIA_MEDIA_TYPES.map_all(split_multi(row.media_types.as_deref()), unknown),
        ),
        languages: LANGUAGES
            .map_all(split_multi(row.languages.as_deref()), unknown)
            .into_iter()
            .map(str::to_string)
            .collect(),
        file_size,
        file_formats: split_multi(row.file_formats.as_deref())
            .into_iter()
            .map(str::to_string)
            .collect(),
        date_published: row
            .publication_date
            .as_deref()
            .and_then(|d| parse_date(d, unknown)),
        version: non_empty(row.version.as_deref()),
    };

    Ok(Some(resource))
}

/// Parses a whole sheet from any reader.
///
/// `source_name` labels log lines and errors (usually the file name).
pub fn parse_reader<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<Vec<EducationalResource>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut resources = Vec::new();
    let mut skipped = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let location = format!("{}:{}", source_name, line);

        let row: DaliaRow = record
            .deserialize(Some(&headers))
            .map_err(|e| AppError::InvalidRow {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        match convert_row(&row, &location, grounder, unknown)? {
            Some(resource) => resources.push(resource),
            None => skipped += 1,
        }
    }

    info!(
        "[{}] parsed {} resources ({} rows skipped)",
        source_name,
        resources.len(),
        skipped
    );
    Ok(resources)
}

/// Parses a curation sheet from disk.
pub fn parse_file(
    path: &Path,
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<Vec<EducationalResource>, AppError> {
    let delimiter = if has_extension(path, "tsv") { b'\t' } else { b',' };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path)?;
    parse_reader(file, &name, delimiter, grounder, unknown)
}

/// Expands directories into the curation sheets they contain, sorted by path.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut sheets: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| has_extension(p, "csv") || has_extension(p, "tsv"))
                .collect();
            sheets.sort();
            out.extend(sheets);
        } else {
            out.push(path.clone());
        }
    }
    Ok(out)
}

/// Parses every sheet in `paths`, stopping at the first sheet that fails.
pub fn parse_paths(
    paths: &[PathBuf],
    grounder: &dyn Grounder,
    unknown: &mut UnknownValues,
) -> Result<Vec<EducationalResource>, AppError> {
    let mut resources = Vec::new();
    for path in expand_paths(paths)? {
        resources.extend(parse_file(&path, grounder, unknown)?);
    }
    Ok(resources)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
