//! License normalization onto SPDX identifiers.
//!
//! Normalization has three outcomes that must stay distinct:
//! a known license becomes [`License::Spdx`], an empty or `notspecified`
//! value becomes `None`, and anything else is passed through lowercased as
//! [`License::Unmapped`] and tallied so curators can extend the table.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::UnknownValues;
use crate::models::License;

/// Vocabulary name under which unknown licenses are tallied.
pub const LICENSE_VOCABULARY: &str = "license";

/// Source label (any case) to SPDX identifier.
const LICENSE_TABLE: &[(&str, &str)] = &[
    ("CC-BY-1.0", "CC-BY-1.0"),
    ("CC-BY-2.0", "CC-BY-2.0"),
    ("CC-BY-3.0", "CC-BY-3.0"),
    ("CC-BY-4.0", "CC-BY-4.0"),
    ("CC-BY-SA-3.0", "CC-BY-SA-3.0"),
    ("CC-BY-SA-4.0", "CC-BY-SA-4.0"),
    ("CC-BY-ND-2.0", "CC-BY-ND-2.0"),
    ("CC-BY-ND-4.0", "CC-BY-ND-4.0"),
    ("CC-BY-NC-2.0", "CC-BY-NC-2.0"),
    ("CC-BY-NC-4.0", "CC-BY-NC-4.0"),
    ("CC-BY-NC-SA-3.0", "CC-BY-NC-SA-3.0"),
    ("CC-BY-NC-SA-4.0", "CC-BY-NC-SA-4.0"),
    ("CC-BY-NC-ND-3.0", "CC-BY-NC-ND-3.0"),
    ("CC-BY-NC-ND-4.0", "CC-BY-NC-ND-4.0"),
    ("CC0-1.0", "CC0-1.0"),
    ("MIT", "MIT"),
    ("gpl-2.0", "GPL-2.0"),
    ("gpl-3.0-only", "GPL-3.0-only"),
    ("gpl-3.0", "GPL-3.0-or-later"),
    ("agpl-3.0-only", "AGPL-3.0-only"),
    ("unlicense", "Unlicense"),
    ("Apache-2.0", "Apache-2.0"),
    ("BSD-3-Clause", "BSD-3-Clause"),
    ("Artistic-2.0", "Artistic-2.0"),
    ("AFL-3.0", "AFL-3.0"),
    ("ODC-By-1.0", "ODC-By-1.0"),
    ("WTFPL", "WTFPL"),
];

static LICENSES: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for &(label, id) in LICENSE_TABLE {
        map.entry(label.to_lowercase()).or_insert(id);
    }
    // Every target identifier is also a valid label for itself.
    for &(_, id) in LICENSE_TABLE {
        map.entry(id.to_lowercase()).or_insert(id);
    }
    map
});

static CC_LICENSE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"creativecommons\.org/licenses/(?P<code>[a-z-]+)/(?P<version>\d+\.\d+)")
        .expect("Invalid CC license regex")
});

static CC_ZERO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"creativecommons\.org/publicdomain/zero/(?P<version>\d+\.\d+)")
        .expect("Invalid CC0 regex")
});

/// Looks up the SPDX identifier for a label, ignoring case and surrounding whitespace.
pub fn lookup_spdx(label: &str) -> Option<&'static str> {
    LICENSES.get(&label.trim().to_lowercase()).copied()
}

/// Normalizes a raw license string.
///
/// # Examples
///
/// ```
/// use minerva_core::license::normalize_license;
/// use minerva_core::{License, UnknownValues};
///
/// let mut unknown = UnknownValues::new();
/// assert_eq!(normalize_license("mit", &mut unknown), Some(License::Spdx("MIT")));
/// assert_eq!(normalize_license("notspecified", &mut unknown), None);
/// assert_eq!(
///     normalize_license("Beerware", &mut unknown),
///     Some(License::Unmapped("beerware".to_string()))
/// );
/// assert_eq!(unknown.count("license", "Beerware"), 1);
/// ```
pub fn normalize_license(raw: &str, unknown: &mut UnknownValues) -> Option<License> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() || text == "notspecified" {
        return None;
    }

    if let Some(id) = lookup_spdx(&text) {
        return Some(License::Spdx(id));
    }

    unknown.record(LICENSE_VOCABULARY, raw);
    Some(License::Unmapped(text))
}

/// Converts a Creative Commons license URL into its SPDX-style label.
///
/// Returns `None` for URLs that are not CC license deeds.
pub fn license_label_from_url(url: &str) -> Option<String> {
    let url = url.trim().to_lowercase();
    if let Some(caps) = CC_LICENSE_URL.captures(&url) {
        return Some(format!(
            "CC-{}-{}",
            caps["code"].to_uppercase(),
            &caps["version"]
        ));
    }
    CC_ZERO_URL
        .captures(&url)
        .map(|caps| format!("CC0-{}", &caps["version"]))
}

/// Normalizes a license given either as a label or as a CC deed URL.
pub fn normalize_license_or_url(raw: &str, unknown: &mut UnknownValues) -> Option<License> {
    match license_label_from_url(raw) {
        Some(label) => normalize_license(&label, unknown),
        None => normalize_license(raw, unknown),
    }
}
