//! Per-source transforms into [`EducationalResource`](crate::EducationalResource).
//!
//! - [`dalia`] - DALIA curation sheets (CSV/TSV)
//! - [`tess`] - materials from TeSS-family catalogs (JSON:API)
//! - [`oersi`] - records from the OERSI NDJSON dump

pub mod dalia;
pub mod oersi;
pub mod tess;

use chrono::NaiveDate;

use crate::diagnostics::UnknownValues;

/// Vocabulary name under which unparsable publication dates are tallied.
pub const DATE_VOCABULARY: &str = "date-published";

/// Parses a publication date given as `YYYY-MM-DD`, a longer ISO timestamp, or a bare year.
pub fn parse_date(raw: &str, unknown: &mut UnknownValues) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .or_else(|| {
            if text.len() == 4 {
                text.parse::<i32>()
                    .ok()
                    .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            } else {
                None
            }
        });

    if parsed.is_none() {
        unknown.record(DATE_VOCABULARY, raw);
    }
    parsed
}

/// Returns the trimmed text, or `None` when it is empty.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
