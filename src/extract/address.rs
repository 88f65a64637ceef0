//! Rule-based cleanup of the raw address lines returned by the LLM.
//!
//! Each line goes through three stages, in this order:
//! 1. strip leading enumeration markers ("1. ", "- ", "・")
//! 2. keep only lines shaped like an address: an administrative division
//!    marker (都道府県市区町村) followed somewhere later by a digit
//! 3. strip parcel-count annotations ("外2")
//!
//! Order and duplicates are preserved. Repeated entries are meaningful:
//! each one is a separate transfer.

use regex::Regex;
use std::sync::LazyLock;

/// Leading "1. " style numbering or a run of bullets/whitespace, possibly repeated.
static LEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.\s*|[-・\s]+)+").unwrap());

/// Administrative division marker with a digit somewhere after it.
static ADDRESS_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[都道府県市区町村].*\d").unwrap());

/// "外N": N more parcels bundled with this one.
static PARCEL_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*外\s*\d+").unwrap());

/// Remove leading enumeration markers and surrounding whitespace.
pub fn strip_marker(line: &str) -> &str {
    match LEADING_MARKER.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

/// Whether a line looks like a Japanese address with a lot number.
pub fn has_address_shape(line: &str) -> bool {
    ADDRESS_SHAPE.is_match(line)
}

/// Remove every parcel-count annotation and trim.
pub fn strip_parcel_count(line: &str) -> String {
    PARCEL_COUNT.replace_all(line, "").trim().to_string()
}

/// Normalize one raw line, or `None` if it is not an address.
///
/// Marker and parcel stripping repeat until neither changes the line, so a
/// marker hidden behind a leading "外N" is removed too.
pub fn normalize_address(line: &str) -> Option<String> {
    let mut cleaned = strip_marker(line).to_string();
    if !has_address_shape(&cleaned) {
        return None;
    }

    loop {
        let next = strip_marker(&strip_parcel_count(&cleaned)).to_string();
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    // "…市外2" loses its only digit once the annotation is gone.
    has_address_shape(&cleaned).then_some(cleaned)
}

/// Normalize a raw LLM answer, one address per line.
pub fn normalize_addresses<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| normalize_address(line.as_ref()))
        .collect()
}
