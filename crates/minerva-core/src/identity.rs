//! Author and organization identity resolution.
//!
//! Raw author entries are turned into [`Creator`] values. Identifiers are
//! shape-checked (ORCID, ROR, Wikidata) and dropped when malformed.
//! Organization names may carry a trailing relation marker such as
//! `"NFDI4Ing (S)"`; the marker is split off into
//! [`OrganizationRelation`]. Organizations without an explicit identifier
//! are grounded against a [`Grounder`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Creator, Organization, OrganizationRelation, Person};

pub const ORCID_URI_PREFIX: &str = "https://orcid.org/";
pub const ROR_URI_PREFIX: &str = "https://ror.org/";
pub const WIKIDATA_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

static ORCID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}(\d|X)$").expect("Invalid ORCID regex")
});

static ROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[a-z0-9]{6}[0-9]{2}$").expect("Invalid ROR regex"));

static WIKIDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\d+$").expect("Invalid Wikidata regex"));

static RELATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.*)\s\((?P<relation>S|R|SR|RS)\)$").expect("Invalid relation regex")
});

/// Returns true if `candidate` has the shape of a bare ORCID identifier.
///
/// # Examples
///
/// ```
/// use minerva_core::identity::is_orcid;
///
/// assert!(is_orcid("0000-0002-1825-0097"));
/// assert!(is_orcid("0000-0002-1694-233X"));
/// assert!(!is_orcid("0000-0002-1825"));
/// ```
pub fn is_orcid(candidate: &str) -> bool {
    ORCID_RE.is_match(candidate)
}

/// Strips an `https://orcid.org/` prefix and validates the remainder.
pub fn normalize_orcid(raw: &str) -> Option<String> {
    let text = strip_any_prefix(raw.trim(), &[ORCID_URI_PREFIX, "http://orcid.org/"]);
    is_orcid(text).then(|| text.to_string())
}

/// Strips an `https://ror.org/` prefix and validates the remainder.
pub fn normalize_ror(raw: &str) -> Option<String> {
    let text = strip_any_prefix(raw.trim(), &[ROR_URI_PREFIX, "http://ror.org/"]);
    ROR_RE.is_match(text).then(|| text.to_string())
}

/// Strips a Wikidata entity prefix and validates the remainder.
pub fn normalize_wikidata(raw: &str) -> Option<String> {
    let text = strip_any_prefix(
        raw.trim(),
        &[
            WIKIDATA_URI_PREFIX,
            "https://www.wikidata.org/entity/",
            "https://www.wikidata.org/wiki/",
        ],
    );
    WIKIDATA_RE.is_match(text).then(|| text.to_string())
}

fn strip_any_prefix<'a>(text: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .unwrap_or(text)
}

/// Splits a trailing `(S)`, `(R)`, `(SR)` or `(RS)` marker off an organization name.
///
/// Names without a marker are returned unchanged.
///
/// # Examples
///
/// ```
/// use minerva_core::identity::split_relation_marker;
/// use minerva_core::OrganizationRelation;
///
/// assert_eq!(
///     split_relation_marker("NFDI4Chem (S)"),
///     ("NFDI4Chem".to_string(), Some(OrganizationRelation::Sponsor))
/// );
/// assert_eq!(split_relation_marker("NFDI4Chem"), ("NFDI4Chem".to_string(), None));
/// ```
pub fn split_relation_marker(raw: &str) -> (String, Option<OrganizationRelation>) {
    let text = raw.trim();
    match RELATION_RE.captures(text) {
        Some(caps) => (
            caps["name"].trim().to_string(),
            OrganizationRelation::from_marker(&caps["relation"]),
        ),
        None => (text.to_string(), None),
    }
}

/// Resolves free-text organization names to ROR identifiers.
pub trait Grounder {
    /// Returns the bare ROR identifier for `name`, if the authority knows it.
    fn ground(&self, name: &str) -> Option<String>;
}

/// Grounder that never matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGrounder;

impl Grounder for NoGrounder {
    fn ground(&self, _name: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct LexiconRow {
    name: String,
    ror: String,
}

/// Grounder backed by a name → ROR lexicon, matched case-insensitively.
///
/// The lexicon file is a TSV with a `name` and a `ror` column; ROR values may
/// be bare identifiers or `https://ror.org/` URIs.
#[derive(Debug, Default, Clone)]
pub struct LexiconGrounder {
    entries: HashMap<String, String>,
}

impl LexiconGrounder {
    pub fn from_entries<I, N, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, R)>,
        N: AsRef<str>,
        R: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (name, ror) in entries {
            if let Some(ror) = normalize_ror(ror.as_ref()) {
                map.entry(lexicon_key(name.as_ref())).or_insert(ror);
            }
        }
        Self { entries: map }
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for result in reader.deserialize::<LexiconRow>() {
            let row = result?;
            rows.push((row.name, row.ror));
        }
        let grounder = Self::from_entries(rows);
        tracing::info!(
            "Loaded {} organization names from {}",
            grounder.len(),
            path.display()
        );
        Ok(grounder)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Grounder for LexiconGrounder {
    fn ground(&self, name: &str) -> Option<String> {
        self.entries.get(&lexicon_key(name)).cloned()
    }
}

fn lexicon_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Builds an organization from a raw name, grounding it when no ROR is known.
///
/// Falls back to a name-only organization when the grounder has no match.
pub fn resolve_organization(
    raw_name: &str,
    ror: Option<String>,
    wikidata: Option<String>,
    grounder: &dyn Grounder,
) -> Organization {
    let (name, relation) = split_relation_marker(raw_name);
    let ror = ror.or_else(|| {
        if wikidata.is_some() {
            None
        } else {
            grounder.ground(&name)
        }
    });
    Organization {
        name,
        ror,
        wikidata,
        relation,
    }
}

/// Resolves a bare author name whose kind is not stated by the source.
///
/// A valid ORCID makes the entry a person. Any other name is treated as an
/// organization and grounded; without a match it stays name-only.
pub fn resolve_author(name: &str, orcid: Option<&str>, grounder: &dyn Grounder) -> Option<Creator> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    if let Some(orcid) = orcid.and_then(normalize_orcid) {
        return Some(Creator::Person(Person {
            name: name.to_string(),
            orcid: Some(orcid),
        }));
    }

    Some(Creator::Organization(resolve_organization(
        name, None, None, grounder,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounder() -> LexiconGrounder {
        LexiconGrounder::from_entries([
            ("Technische Informationsbibliothek", "https://ror.org/04aj4c181"),
            ("ELIXIR", "044rwnt51"),
            ("Broken Entry", "not-a-ror"),
        ])
    }

    #[test]
    fn test_orcid_shape() {
        assert!(is_orcid("0000-0003-4423-4370"));
        assert!(is_orcid("0000-0001-9439-522X"));
        assert!(!is_orcid("0000-0001-9439-522x"));
        assert!(!is_orcid("000-0001-9439-5221"));
        assert!(!is_orcid("0000000194395221"));
        assert!(!is_orcid("https://orcid.org/0000-0003-4423-4370"));
    }

    #[test]
    fn test_only_orcid_shaped_entries_are_candidates() {
        let entries = ["0000-0002-9298-3168", "Q42"];
        let candidates: Vec<&str> = entries.iter().copied().filter(|e| is_orcid(e)).collect();
        assert_eq!(candidates, vec!["0000-0002-9298-3168"]);
    }

    #[test]
    fn test_normalize_identifiers() {
        assert_eq!(
            normalize_orcid("https://orcid.org/0000-0003-4423-4370"),
            Some("0000-0003-4423-4370".to_string())
        );
        assert_eq!(normalize_orcid("orcid me"), None);
        assert_eq!(
            normalize_ror("https://ror.org/04aj4c181"),
            Some("04aj4c181".to_string())
        );
        assert_eq!(normalize_ror("4aj4c181"), None);
        assert_eq!(
            normalize_wikidata("http://www.wikidata.org/entity/Q1420"),
            Some("Q1420".to_string())
        );
        assert_eq!(normalize_wikidata("Q"), None);
    }

    #[test]
    fn test_relation_markers_are_split() {
        for (marker, relation) in [
            ("S", OrganizationRelation::Sponsor),
            ("R", OrganizationRelation::ResponsibleParty),
            ("SR", OrganizationRelation::SponsorAndResponsibleParty),
            ("RS", OrganizationRelation::SponsorAndResponsibleParty),
        ] {
            let raw = format!("Helmholtz Association ({})", marker);
            let (name, found) = split_relation_marker(&raw);
            assert_eq!(name, "Helmholtz Association");
            assert_eq!(found, Some(relation));
        }
    }

    #[test]
    fn test_names_without_marker_are_unchanged() {
        for raw in [
            "Helmholtz Association",
            "Helmholtz Association (HGF)",
            "Helmholtz Association(S)",
            "University (Graz)",
        ] {
            assert_eq!(split_relation_marker(raw), (raw.to_string(), None));
        }
    }

    #[test]
    fn test_resolve_organization_grounds_by_name() {
        let org = resolve_organization("technische   informationsbibliothek (R)", None, None, &grounder());
        assert_eq!(org.name, "technische   informationsbibliothek");
        assert_eq!(org.ror.as_deref(), Some("04aj4c181"));
        assert_eq!(org.relation, Some(OrganizationRelation::ResponsibleParty));
    }

    #[test]
    fn test_resolve_organization_falls_back_to_name_only() {
        let org = resolve_organization("Unknown Consortium", None, None, &grounder());
        assert_eq!(
            org,
            Organization {
                name: "Unknown Consortium".to_string(),
                ror: None,
                wikidata: None,
                relation: None,
            }
        );
    }

    #[test]
    fn test_explicit_identifiers_win_over_grounding() {
        let org = resolve_organization("ELIXIR", Some("00x0x0x00".into()), None, &grounder());
        assert_eq!(org.ror.as_deref(), Some("00x0x0x00"));

        let org = resolve_organization("ELIXIR", None, Some("Q5360932".into()), &grounder());
        assert_eq!(org.ror, None);
        assert_eq!(org.wikidata.as_deref(), Some("Q5360932"));
    }

    #[test]
    fn test_malformed_lexicon_entries_are_ignored() {
        let grounder = grounder();
        assert_eq!(grounder.len(), 2);
        assert_eq!(grounder.ground("Broken Entry"), None);
    }

    #[test]
    fn test_resolve_author_variants() {
        let g = grounder();

        let person = resolve_author("Jane Doe", Some("0000-0002-1825-0097"), &g).unwrap();
        assert!(matches!(person, Creator::Person(Person { orcid: Some(_), .. })));

        let org = resolve_author("ELIXIR", None, &g).unwrap();
        assert!(matches!(org, Creator::Organization(Organization { ror: Some(_), .. })));

        let plain = resolve_author("John Smith", Some("not-an-orcid"), &g).unwrap();
        assert_eq!(
            plain,
            Creator::Organization(Organization {
                name: "John Smith".to_string(),
                ror: None,
                wikidata: None,
                relation: None,
            })
        );

        assert!(resolve_author("  ", None, &g).is_none());
    }

    #[test]
    fn test_resolve_author_without_match_is_name_only_organization() {
        let resolved = resolve_author("ELIXIR Germany (S)", None, &NoGrounder).unwrap();
        assert_eq!(
            resolved,
            Creator::Organization(Organization {
                name: "ELIXIR Germany".to_string(),
                ror: None,
                wikidata: None,
                relation: Some(OrganizationRelation::Sponsor),
            })
        );

        let grounded = resolve_author("ELIXIR (RS)", None, &grounder()).unwrap();
        assert!(matches!(
            grounded,
            Creator::Organization(Organization {
                ref name,
                ror: Some(_),
                relation: Some(OrganizationRelation::SponsorAndResponsibleParty),
                ..
            }) if name == "ELIXIR"
        ));
    }

    #[test]
    fn test_lexicon_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name\tror").unwrap();
        writeln!(file, "Leibniz Universität Hannover\thttps://ror.org/0304hq317").unwrap();
        let grounder = LexiconGrounder::from_path(file.path()).unwrap();
        assert_eq!(
            grounder.ground("leibniz universität hannover"),
            Some("0304hq317".to_string())
        );
    }
}
