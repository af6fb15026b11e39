//! Historical-results page extraction.
//!
//! The page lists rounds newest first and mixes two eras:
//! - paragraph era (from November 2017): one `<h3>` heading per round
//!   followed by labelled `<p>` lines for score, invitations and program;
//! - table era (before November 2017): score and invitations in `<td>`
//!   cells, with the round headings still in `<h3>`.
//!
//! Each attribute is gathered by its own scan, so the per-attribute
//! sequences only line up if the page is regular. They are checked for equal
//! length before any record is built.

use eedraws_core::{DrawRecord, Error, ProgramScope};
use scraper::Html;

use super::normalize::parse_count;
use super::{INVITATIONS_MARKER, block_texts, invitations_value, leading_score, program_scopes, trailing_score};

const SCORE_MARKER: &str = "CRS";
/// Table-era score cells read like `"450 points"`.
const POINTS_MARKER: &str = "points";
const ROUND_HEADING_MARKER: char = '#';
/// Headings read `"#123 – January 5, 2022"`, with an en dash.
const ROUND_DATE_SEPARATOR: &str = " – ";

/// Round 91 was held as two draws on one day under a single heading.
const SPLIT_ROUND: &str = "91";
const SPLIT_SUFFIXES: [&str; 2] = ["A", "B"];

#[derive(Debug, Default)]
struct Columns {
    /// (round, raw date) pairs.
    rounds: Vec<(String, String)>,
    scores: Vec<u32>,
    invitations: Vec<u32>,
    scopes: Vec<ProgramScope>,
}

impl Columns {
    fn scan_paragraph(&mut self, text: &str) -> Result<(), Error> {
        if text.contains(SCORE_MARKER) {
            self.scores.push(trailing_score(text)?);
        }
        if text.contains(INVITATIONS_MARKER) {
            self.invitations.push(invitations_value(text)?);
        }
        if let Some(scopes) = program_scopes(text) {
            self.scopes.extend(scopes);
        }
        Ok(())
    }

    fn scan_cell(&mut self, text: &str) -> Result<(), Error> {
        if text.contains(POINTS_MARKER) {
            self.scores.push(leading_score(text)?);
        } else {
            let count = parse_count(text)
                .ok_or_else(|| Error::ExtractFailed(format!("non-numeric table cell {:?}", text.trim())))?;
            self.invitations.push(count);
        }
        Ok(())
    }

    fn scan_heading(&mut self, text: &str) -> Result<(), Error> {
        let Some(hash) = text.find(ROUND_HEADING_MARKER) else {
            return Ok(());
        };
        let (round, date) = text[hash + 1..]
            .split_once(ROUND_DATE_SEPARATOR)
            .ok_or_else(|| Error::ExtractFailed(format!("round heading without date: {:?}", text.trim())))?;
        let (round, date) = (round.trim(), date.trim());

        if round == SPLIT_ROUND {
            for suffix in SPLIT_SUFFIXES {
                self.rounds.push((format!("{round}{suffix}"), date.to_string()));
            }
        } else {
            self.rounds.push((round.to_string(), date.to_string()));
        }
        Ok(())
    }

    /// Zip the columns into records, oldest first.
    fn into_records(self) -> Result<Vec<DrawRecord>, Error> {
        let rounds = self.rounds.len();
        if self.scores.len() != rounds || self.invitations.len() != rounds || self.scopes.len() != rounds {
            return Err(Error::ExtractionAlignment {
                rounds,
                scores: self.scores.len(),
                invitations: self.invitations.len(),
                scopes: self.scopes.len(),
            });
        }

        let mut records: Vec<DrawRecord> = self
            .rounds
            .into_iter()
            .zip(self.scores)
            .zip(self.invitations)
            .zip(self.scopes)
            .rev()
            .map(|((((round, date), score), invitations), program_scope)| DrawRecord {
                round,
                date,
                score,
                invitations,
                program_scope,
            })
            .collect();

        restore_split_order(&mut records);
        Ok(records)
    }
}

/// Reversing the page puts the halves of a split round in descending suffix
/// order. Swap them back, keeping each half's values.
fn restore_split_order(records: &mut [DrawRecord]) {
    let first = format!("{SPLIT_ROUND}{}", SPLIT_SUFFIXES[0]);
    let second = format!("{SPLIT_ROUND}{}", SPLIT_SUFFIXES[1]);

    let mut i = 0;
    while i + 1 < records.len() {
        if records[i].round == second && records[i + 1].round == first {
            records.swap(i, i + 1);
            i += 2;
        } else {
            i += 1;
        }
    }
}

/// Extract every past draw from the historical-results page, oldest first.
///
/// Dates are returned as printed; see [`super::combine`].
pub fn extract_history(html: &str) -> Result<Vec<DrawRecord>, Error> {
    let doc = Html::parse_document(html);
    let mut columns = Columns::default();

    for text in block_texts(&doc, "p") {
        columns.scan_paragraph(&text)?;
    }
    for text in block_texts(&doc, "td") {
        columns.scan_cell(&text)?;
    }
    for text in block_texts(&doc, "h3") {
        columns.scan_heading(&text)?;
    }

    tracing::debug!(
        rounds = columns.rounds.len(),
        scores = columns.scores.len(),
        invitations = columns.invitations.len(),
        scopes = columns.scopes.len(),
        "scanned history page"
    );

    columns.into_records()
}
