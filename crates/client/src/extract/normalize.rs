//! Text cleanup for numbers and dates scraped from the round pages.
//!
//! Every function here is total: text it does not recognize passes through
//! unchanged.

/// Footnote references rendered inline after a value, e.g. `3,500Footnote *`.
const FOOTNOTE_MARKERS: &[&str] = &["Footnote *"];

const MONTHS: [(&str, &str); 12] = [
    ("January", "Jan"),
    ("February", "Feb"),
    ("March", "Mar"),
    ("April", "Apr"),
    ("May", "May"),
    ("June", "Jun"),
    ("July", "Jul"),
    ("August", "Aug"),
    ("September", "Sep"),
    ("October", "Oct"),
    ("November", "Nov"),
    ("December", "Dec"),
];

/// Remove thousands separators.
pub fn strip_thousands(s: &str) -> String {
    s.replace(',', "")
}

/// Remove inline footnote references.
pub fn strip_footnote_markers(s: &str) -> String {
    FOOTNOTE_MARKERS
        .iter()
        .fold(s.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Replace non-breaking spaces with ordinary spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.replace('\u{a0}', " ")
}

/// Shorten every full English month name to three letters.
pub fn abbreviate_month(s: &str) -> String {
    MONTHS
        .iter()
        .fold(s.to_string(), |acc, (full, short)| acc.replace(full, short))
}

/// Normalize a date as it is stored: `"January\u{a0}5, 2022"` -> `"Jan 5, 2022"`.
pub fn normalize_date(s: &str) -> String {
    abbreviate_month(&normalize_whitespace(s)).trim().to_string()
}

/// Clean a count such as `" 3,500Footnote *"` and parse it.
pub fn parse_count(s: &str) -> Option<u32> {
    let cleaned = strip_footnote_markers(&strip_thousands(&normalize_whitespace(s)));
    cleaned.trim().parse().ok()
}
