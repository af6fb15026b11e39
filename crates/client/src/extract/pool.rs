//! Current-round page extraction: the latest draw and the pool distribution.

use eedraws_core::{BUCKET_COUNT, DrawRecord, Error, PoolSnapshot, ProgramScope};
use scraper::Html;

use super::normalize::parse_count;
use super::{INVITATIONS_MARKER, block_texts, invitations_value, program_scopes, trailing_score};

const LOWEST_SCORE_MARKER: &str = "CRS score of lowest-ranked";
const DATE_MARKER: &str = "Date and time";
/// Length of the `"Date and time of round: "` label.
const DATE_VALUE_OFFSET: usize = 24;
/// Separates the date from the time of day: `"May 9, 2018 at 11:38:21 UTC"`.
const TIME_SEPARATOR: &str = " at ";

/// The distribution table repeats two subtotal rows among its cells. They are
/// dropped one after the other, so the second index is counted after the
/// first removal.
const REDUNDANT_CELLS: [usize; 2] = [2, 7];
/// Buckets plus the grand total.
const POOL_VALUE_COUNT: usize = BUCKET_COUNT + 1;

/// Draw and pool distribution read from the current-round page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRound {
    /// The round after the last historical one. Its date is as printed.
    pub draw: DrawRecord,
    pub pool: PoolSnapshot,
}

fn missing(field: &str) -> Error {
    Error::ExtractFailed(format!("current round page has no {field}"))
}

fn date_value(text: &str) -> String {
    let from_label = text.find(DATE_MARKER).map_or(text, |i| &text[i..]);
    let before_time = from_label.split(TIME_SEPARATOR).next().unwrap_or_default();
    before_time.chars().skip(DATE_VALUE_OFFSET).collect()
}

fn next_round(last_round: &str) -> Result<String, Error> {
    let last: u32 = last_round
        .trim()
        .parse()
        .map_err(|_| Error::ExtractFailed(format!("last round {last_round:?} is not numeric")))?;
    Ok((last + 1).to_string())
}

/// Split the flat cell values into buckets (lowest first) and the total.
fn pool_values(mut cells: Vec<u32>) -> Result<([u32; BUCKET_COUNT], u32), Error> {
    for index in REDUNDANT_CELLS {
        if index >= cells.len() {
            return Err(Error::ExtractFailed(format!("pool table has only {} cells", cells.len())));
        }
        cells.remove(index);
    }

    if cells.len() != POOL_VALUE_COUNT {
        return Err(Error::ExtractFailed(format!(
            "pool table has {} values, expected {POOL_VALUE_COUNT}",
            cells.len()
        )));
    }

    let total = cells.pop().ok_or_else(|| missing("pool total"))?;
    // The table lists the highest bucket first.
    cells.reverse();
    let buckets: [u32; BUCKET_COUNT] = cells
        .try_into()
        .map_err(|_| Error::ExtractFailed("pool bucket count mismatch".into()))?;

    Ok((buckets, total))
}

/// Extract the current draw and the pool distribution.
///
/// `last_round` is the newest round of the historical page; the current
/// round is the one after it.
pub fn extract_current_round(html: &str, last_round: &str) -> Result<CurrentRound, Error> {
    let doc = Html::parse_document(html);

    let mut score = None;
    let mut invitations = None;
    let mut scope: Option<ProgramScope> = None;
    let mut date = None;

    for text in block_texts(&doc, "p") {
        if score.is_none() && text.contains(LOWEST_SCORE_MARKER) {
            score = Some(trailing_score(&text)?);
        }
        if invitations.is_none() && text.contains(INVITATIONS_MARKER) {
            invitations = Some(invitations_value(&text)?);
        }
        if scope.is_none()
            && let Some(scopes) = program_scopes(&text)
        {
            scope = scopes.first().copied();
        }
        if date.is_none() && text.contains(DATE_MARKER) {
            date = Some(date_value(&text));
        }
    }

    let cells = block_texts(&doc, "td")
        .iter()
        .map(|text| {
            parse_count(text).ok_or_else(|| Error::ExtractFailed(format!("non-numeric pool cell {:?}", text.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (buckets, total) = pool_values(cells)?;

    let date = date.ok_or_else(|| missing("round date"))?;
    let draw = DrawRecord {
        round: next_round(last_round)?,
        date: date.clone(),
        score: score.ok_or_else(|| missing("lowest-ranked score"))?,
        invitations: invitations.ok_or_else(|| missing("invitation count"))?,
        program_scope: scope.ok_or_else(|| missing("program line"))?,
    };

    tracing::debug!(round = %draw.round, score = draw.score, total, "scanned current round page");

    Ok(CurrentRound { draw, pool: PoolSnapshot { date, buckets, total } })
}
