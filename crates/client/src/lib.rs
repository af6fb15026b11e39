//! Fetching and extraction for the Express Entry round pages.
//!
//! Provides the HTTP [`FetchClient`], the page extractors and the [`sync`]
//! pass that feeds a [`eedraws_core::HistoryStore`].

pub mod extract;
pub mod fetch;
pub mod sync;

pub use extract::{CurrentRound, ExtractedHistory, combine, extract_current_round, extract_history, last_round};

pub use fetch::{FetchClient, FetchConfig, FetchResponse, PageSource};

pub use sync::{SourceUrls, SyncReport};
