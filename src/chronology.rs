//! Year and era arithmetic for human-entered dates.
//!
//! Years are stored as signed common-era integers following the astronomical
//! convention: 1 BC is year 0, 2 BC is year -1, and so on. Conversion happens
//! once at input time; the sign carries the era from then on.

use chrono::Datelike;
use serde::Serialize;

/// Death-year input equal to this token means the person is living.
pub const PRESENT: &str = "present";

/// Convert a (year, era) pair into a signed common-era year.
///
/// The era tag is matched case-insensitively; anything other than "BC" is
/// treated as AD. An absent year yields an absent result regardless of era.
pub fn normalize_year(year: Option<i32>, era: &str) -> Option<i32> {
    let year = year?;
    if era.trim().eq_ignore_ascii_case("BC") {
        Some(-(year - 1))
    } else {
        Some(year)
    }
}

/// Split a signed year back into its display form: (era tag, displayed year).
pub fn display_year(normalized: i32) -> (&'static str, i32) {
    if normalized <= 0 {
        ("BC", 1 - normalized)
    } else {
        ("AD", normalized)
    }
}

/// Parse a year form field. Empty input and the "present" sentinel both mean
/// absent; anything else must be an integer.
pub fn parse_year_field(raw: &str) -> Result<Option<i32>, std::num::ParseIntError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(PRESENT) {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

/// An age (or age at death) with its human-readable label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Age {
    pub years: i32,
    pub label: String,
}

/// Compute an age from normalized birth and death years.
///
/// An absent death year means the person is living and the age is counted up
/// to `current_year`. A death year earlier than the birth year produces no
/// age at all; inconsistent data is suppressed rather than reported.
pub fn lifespan(birth: Option<i32>, death: Option<i32>, current_year: i32) -> Option<Age> {
    let birth = birth?;
    match death {
        None => {
            let years = current_year - birth;
            Some(Age {
                years,
                label: format!("Age: {}", years),
            })
        }
        Some(death) if death >= birth => {
            let years = death - birth;
            Some(Age {
                years,
                label: format!("Age at death: {}", years),
            })
        }
        Some(_) => None,
    }
}

/// The current calendar year (UTC).
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}
