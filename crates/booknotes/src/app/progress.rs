//! Progress metadata embedded in saved documents.
//!
//! A saved document ends with an HTML comment holding a JSON snapshot of the
//! session so that work can resume after the file is reopened:
//!
//! ```text
//! <!-- BOOKNOTES_PROGRESS_START
//! { "timestamp": "...", "totalQuotes": 3, ... }
//! BOOKNOTES_PROGRESS_END -->
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::app::store::QuoteStore;
use crate::domain::model::{CalloutType, Quote, QuoteId};

pub const PROGRESS_START: &str = "<!-- BOOKNOTES_PROGRESS_START";
pub const PROGRESS_END: &str = "BOOKNOTES_PROGRESS_END -->";

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!-- BOOKNOTES_PROGRESS_START\n(.*?)\nBOOKNOTES_PROGRESS_END -->").unwrap()
});
static STRIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!-- BOOKNOTES_PROGRESS_START.*?BOOKNOTES_PROGRESS_END -->\n?").unwrap()
});

/// Errors raised while encoding or decoding progress metadata.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress metadata block is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to serialize progress metadata: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to format progress timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Snapshot of a session persisted at the end of a saved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// RFC 3339 UTC time the snapshot was captured.
    pub timestamp: String,
    pub total_quotes: usize,
    pub quotes_with_notes: usize,
    pub merged_quotes: usize,
    pub quotes: Vec<QuoteProgress>,
}

/// Per-quote entry of a [`ProgressSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteProgress {
    pub index: usize,
    pub id: QuoteId,
    pub has_notes: bool,
    pub callout_type: CalloutType,
    pub merged: bool,
    pub selected: bool,
}

impl ProgressSnapshot {
    /// Capture the current state of `quotes`, stamped with the current time.
    pub fn capture(quotes: &[Quote]) -> Result<Self, ProgressError> {
        Self::capture_at(quotes, OffsetDateTime::now_utc())
    }

    pub fn capture_at(quotes: &[Quote], at: OffsetDateTime) -> Result<Self, ProgressError> {
        let timestamp = at.format(&Rfc3339)?;
        let entries = quotes
            .iter()
            .enumerate()
            .map(|(index, quote)| QuoteProgress {
                index,
                id: quote.id,
                has_notes: quote.has_notes(),
                callout_type: quote.callout,
                merged: quote.is_merged(),
                selected: quote.selected,
            })
            .collect::<Vec<_>>();

        Ok(Self {
            timestamp,
            total_quotes: quotes.len(),
            quotes_with_notes: entries.iter().filter(|entry| entry.has_notes).count(),
            merged_quotes: entries.iter().filter(|entry| entry.merged).count(),
            quotes: entries,
        })
    }

    /// Re-apply selection and callout choices to a freshly parsed store.
    ///
    /// Entries are matched by position and only when the snapshot describes exactly as many
    /// quotes as the store holds. Returns the number of quotes updated.
    pub fn apply_to(&self, store: &mut QuoteStore) -> usize {
        if self.quotes.len() != store.len() {
            tracing::warn!(
                saved = self.quotes.len(),
                parsed = store.len(),
                "progress snapshot does not match parsed quotes; skipping restore"
            );
            return 0;
        }

        let mut restored = 0;
        for entry in &self.quotes {
            let updated = store
                .set_selected(entry.index, entry.selected)
                .and_then(|_| store.set_callout(entry.index, entry.callout_type));
            if updated.is_ok() {
                restored += 1;
            }
        }
        restored
    }
}

/// Serialize `snapshot` into a marker-delimited comment block.
pub fn encode(snapshot: &ProgressSnapshot) -> Result<String, ProgressError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(ProgressError::Serialize)?;
    Ok(format!("{PROGRESS_START}\n{json}\n{PROGRESS_END}"))
}

/// Locate and parse the progress block in `document`.
///
/// Returns `Ok(None)` when the document carries no block.
pub fn decode(document: &str) -> Result<Option<ProgressSnapshot>, ProgressError> {
    let Some(captures) = BLOCK_RE.captures(document) else {
        return Ok(None);
    };
    let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    serde_json::from_str(body)
        .map(Some)
        .map_err(ProgressError::InvalidJson)
}

/// Remove every progress block (and one trailing newline after each) from `document`.
pub fn strip(document: &str) -> String {
    let mut current = document.to_string();
    loop {
        let next = STRIP_RE.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Append a freshly encoded block to `body`, separated by a blank line.
pub fn embed(body: &str, snapshot: &ProgressSnapshot) -> Result<String, ProgressError> {
    Ok(format!("{body}\n\n{}", encode(snapshot)?))
}
