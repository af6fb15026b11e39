//! Draw extraction from the round-of-invitations pages.
//!
//! The pages are matched by plain substring markers over block text, not
//! by structure, so the markers and offsets below are tied to the page
//! layout they were read from. A layout change means re-deriving them.
//!
//! ### Pipeline
//! - [`extract_history`] reads the historical page into draws, oldest first.
//! - [`extract_current_round`] reads the current page into the next draw and
//!   the pool distribution. It needs the last historical round.
//! - [`combine`] appends the current draw and normalizes every date.

pub mod history;
pub mod normalize;
pub mod pool;

pub use history::extract_history;
pub use normalize::{abbreviate_month, normalize_date, normalize_whitespace, strip_footnote_markers, strip_thousands};
pub use pool::{CurrentRound, extract_current_round};

use eedraws_core::{DrawRecord, Error, PoolSnapshot, ProgramScope};
use scraper::{Html, Selector};

pub(crate) const INVITATIONS_MARKER: &str = "Number of invitations";

/// Length of the `"Number of invitations issued: "` label, used when the
/// label carries no colon to split on.
const INVITATIONS_VALUE_OFFSET: usize = 30;

/// Paragraphs naming the program a round was limited to. `rogram` matches
/// both "Program" and "program".
const PROGRAM_MARKERS: &[&str] = &["rogram", "Canadian Experience Class"];
const NO_PROGRAM_MARKER: &str = "No program";
const PLURAL_PROGRAM_MARKER: &str = "Programs";

/// Draws extracted from both pages, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedHistory {
    /// Every draw, oldest first, dates normalized.
    pub draws: Vec<DrawRecord>,
    pub pool: PoolSnapshot,
}

impl ExtractedHistory {
    pub fn newest(&self) -> Option<&DrawRecord> {
        self.draws.last()
    }
}

/// Text of every element matching `selector`, in document order.
pub(crate) fn block_texts(doc: &Html, selector: &str) -> Vec<String> {
    let selector = Selector::parse(selector).expect("invalid selector");
    doc.select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}

/// Program scopes announced by a paragraph, or None if it is not a program line.
///
/// Sentences are skipped: only the bare "Program specified:" style line counts.
/// A plural "Programs" line stands for two rounds and yields two entries.
pub(crate) fn program_scopes(text: &str) -> Option<Vec<ProgramScope>> {
    if !PROGRAM_MARKERS.iter().any(|marker| text.contains(marker)) || text.contains('.') {
        return None;
    }

    let scopes = if text.contains(NO_PROGRAM_MARKER) {
        vec![ProgramScope::General]
    } else if text.contains(PLURAL_PROGRAM_MARKER) {
        vec![ProgramScope::ProgramSpecific, ProgramScope::ProgramSpecific]
    } else {
        vec![ProgramScope::ProgramSpecific]
    };
    Some(scopes)
}

/// Score written as the last three characters of a block. A two-digit score
/// leaves a space in that window.
pub(crate) fn trailing_score(text: &str) -> Result<u32, Error> {
    let trimmed = text.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(2)
        .map(|(i, _)| i)
        .ok_or_else(|| Error::ExtractFailed(format!("no score in {trimmed:?}")))?;
    trimmed[start..]
        .trim()
        .parse()
        .map_err(|_| Error::ExtractFailed(format!("no score in {trimmed:?}")))
}

/// Score written as the first three characters of a block, e.g. `"450 points"`.
pub(crate) fn leading_score(text: &str) -> Result<u32, Error> {
    let head: String = text.trim_start().chars().take(3).collect();
    head.parse()
        .map_err(|_| Error::ExtractFailed(format!("no score in {:?}", text.trim())))
}

/// Invitation count following the invitations label.
pub(crate) fn invitations_value(text: &str) -> Result<u32, Error> {
    let from_label = text.find(INVITATIONS_MARKER).map_or(text, |i| &text[i..]);
    let value: String = match from_label.split_once(':') {
        Some((_, rest)) => rest.to_string(),
        None => from_label.chars().skip(INVITATIONS_VALUE_OFFSET).collect(),
    };
    normalize::parse_count(&value)
        .ok_or_else(|| Error::ExtractFailed(format!("no invitation count in {:?}", text.trim())))
}

/// Round identifier of the last historical draw.
pub fn last_round(draws: &[DrawRecord]) -> Result<&str, Error> {
    draws
        .last()
        .map(|draw| draw.round.as_str())
        .ok_or_else(|| Error::ExtractFailed("history page yielded no draws".into()))
}

/// Append the current round to the history and normalize every date.
pub fn combine(mut draws: Vec<DrawRecord>, current: CurrentRound) -> ExtractedHistory {
    draws.push(current.draw);
    for draw in &mut draws {
        draw.date = normalize_date(&draw.date);
    }

    let mut pool = current.pool;
    pool.date = normalize_date(&pool.date);

    ExtractedHistory { draws, pool }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_scopes() {
        assert_eq!(program_scopes("Program specified: No program specified"), Some(vec![ProgramScope::General]));
        assert_eq!(
            program_scopes("Program specified: Provincial Nominee Program"),
            Some(vec![ProgramScope::ProgramSpecific])
        );
        assert_eq!(program_scopes("Canadian Experience Class"), Some(vec![ProgramScope::ProgramSpecific]));
    }

    #[test]
    fn test_plural_programs_yield_two_placeholders() {
        let scopes = program_scopes("Programs specified: Federal Skilled Trades Program and Provincial Nominee Program");
        assert_eq!(scopes, Some(vec![ProgramScope::ProgramSpecific, ProgramScope::ProgramSpecific]));
    }

    #[test]
    fn test_program_sentences_are_ignored() {
        assert_eq!(program_scopes("This round was limited to one program."), None);
        assert_eq!(program_scopes("Tie-breaking rule: January 5, 2022"), None);
    }

    #[test]
    fn test_trailing_score() {
        assert_eq!(trailing_score("CRS score of lowest-ranked candidate invited: 471").unwrap(), 471);
        assert_eq!(trailing_score("CRS score: 808 \n").unwrap(), 808);
        assert_eq!(trailing_score("CRS score of lowest-ranked candidate invited: 75").unwrap(), 75);
        assert!(matches!(trailing_score("CRS"), Err(Error::ExtractFailed(_))));
        assert!(trailing_score("About the CRS").is_err());
    }

    #[test]
    fn test_leading_score() {
        assert_eq!(leading_score("450 points").unwrap(), 450);
        assert!(leading_score("points").is_err());
    }

    #[test]
    fn test_invitations_after_colon() {
        assert_eq!(invitations_value("Number of invitations: 3,500Footnote *").unwrap(), 3500);
        assert_eq!(invitations_value("Number of invitations issued: 1,000").unwrap(), 1000);
    }

    #[test]
    fn test_invitations_fixed_offset() {
        assert_eq!(invitations_value("Number of invitations issued  2,750").unwrap(), 2750);
    }

    #[test]
    fn test_invitations_without_number() {
        assert!(matches!(invitations_value("Number of invitations: pending"), Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_last_round() {
        assert!(last_round(&[]).is_err());
    }

    #[test]
    fn test_combine_normalizes_dates() {
        let history = vec![DrawRecord {
            round: "1".into(),
            date: "January\u{a0}31, 2015".into(),
            score: 886,
            invitations: 779,
            program_scope: ProgramScope::General,
        }];
        let current = CurrentRound {
            draw: DrawRecord {
                round: "2".into(),
                date: "February 7, 2015".into(),
                score: 818,
                invitations: 779,
                program_scope: ProgramScope::General,
            },
            pool: PoolSnapshot { date: "February 7, 2015".into(), buckets: [0; 14], total: 0 },
        };

        let combined = combine(history, current);
        let dates: Vec<_> = combined.draws.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["Jan 31, 2015", "Feb 7, 2015"]);
        assert_eq!(combined.pool.date, "Feb 7, 2015");
        assert_eq!(combined.newest().unwrap().round, "2");
    }
}
