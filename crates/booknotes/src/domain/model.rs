//! Domain models for quotes, merged fragments, and callout types.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Identifier handed out to every quote created during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub u64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic source of [`QuoteId`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start handing out identifiers at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Seed the allocator from the wall clock (milliseconds since the epoch).
    pub fn from_clock() -> Self {
        let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self::starting_at(u64::try_from(millis).unwrap_or(1))
    }

    /// Allocate the next identifier.
    pub fn next_id(&mut self) -> QuoteId {
        let id = QuoteId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Ensure future identifiers are strictly greater than `id`.
    pub fn observe(&mut self, id: QuoteId) {
        if id.0 >= self.next {
            self.next = id.0.saturating_add(1);
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Callout flavours understood by the target Markdown dialect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum CalloutType {
    #[default]
    Note,
    Tip,
    Warning,
    Danger,
    Info,
    Success,
    Bug,
    Question,
    Abstract,
    Example,
    Quote,
}

impl CalloutType {
    /// Identifier written inside `> [!...]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalloutType::Note => "note",
            CalloutType::Tip => "tip",
            CalloutType::Warning => "warning",
            CalloutType::Danger => "danger",
            CalloutType::Info => "info",
            CalloutType::Success => "success",
            CalloutType::Bug => "bug",
            CalloutType::Question => "question",
            CalloutType::Abstract => "abstract",
            CalloutType::Example => "example",
            CalloutType::Quote => "quote",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            CalloutType::Note => "📝",
            CalloutType::Tip => "💡",
            CalloutType::Warning => "⚠️",
            CalloutType::Danger => "🚨",
            CalloutType::Info => "ℹ️",
            CalloutType::Success => "✅",
            CalloutType::Bug => "🐛",
            CalloutType::Question => "❓",
            CalloutType::Abstract => "📄",
            CalloutType::Example => "📋",
            CalloutType::Quote => "💬",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CalloutType::Note => "Note",
            CalloutType::Tip => "Tip",
            CalloutType::Warning => "Warning",
            CalloutType::Danger => "Danger",
            CalloutType::Info => "Info",
            CalloutType::Success => "Success",
            CalloutType::Bug => "Bug",
            CalloutType::Question => "Question",
            CalloutType::Abstract => "Abstract",
            CalloutType::Example => "Example",
            CalloutType::Quote => "Quote",
        }
    }

    /// Enumerate every callout type in display order.
    pub fn all() -> &'static [CalloutType] {
        &[
            CalloutType::Note,
            CalloutType::Tip,
            CalloutType::Warning,
            CalloutType::Danger,
            CalloutType::Info,
            CalloutType::Success,
            CalloutType::Bug,
            CalloutType::Question,
            CalloutType::Abstract,
            CalloutType::Example,
            CalloutType::Quote,
        ]
    }
}

impl fmt::Display for CalloutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalloutType {
    type Err = CalloutParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        CalloutType::all()
            .iter()
            .copied()
            .find(|callout| callout.as_str() == wanted)
            .ok_or(CalloutParseError::Unknown(wanted))
    }
}

/// Error returned when parsing a [`CalloutType`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CalloutParseError {
    #[error("unknown callout type '{0}'")]
    Unknown(String),
}

/// One original highlight folded into a merged quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePart {
    pub highlight: String,
    pub location_refs: Vec<String>,
}

/// A highlight plus the reader's commentary on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub highlight: String,
    pub notes: String,
    /// Empty for merged quotes; references live on [`Quote::parts`] instead.
    pub location_refs: Vec<String>,
    pub callout: CalloutType,
    pub selected: bool,
    /// Present only for quotes produced by a merge, always with two or more entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<QuotePart>>,
}

impl Quote {
    /// Build an unmerged, unselected quote.
    pub fn new(
        id: QuoteId,
        highlight: impl Into<String>,
        notes: impl Into<String>,
        location_refs: Vec<String>,
        callout: CalloutType,
    ) -> Self {
        Self {
            id,
            highlight: highlight.into(),
            notes: notes.into(),
            location_refs,
            callout,
            selected: false,
            parts: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.parts.is_some()
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }

    /// Whether this quote carries any location reference, directly or through its parts.
    pub fn has_location(&self) -> bool {
        match &self.parts {
            Some(parts) => parts.iter().any(|part| !part.location_refs.is_empty()),
            None => !self.location_refs.is_empty(),
        }
    }

    /// Highlight fragments with their own references, one per original quote.
    pub fn fragments(&self) -> Vec<QuotePart> {
        match &self.parts {
            Some(parts) => parts.clone(),
            None => vec![QuotePart {
                highlight: self.highlight.clone(),
                location_refs: self.location_refs.clone(),
            }],
        }
    }
}
