//! The loaded document and everything done to it during one session.

use thiserror::Error;

use crate::app::export::ExportFormat;
use crate::app::parser::{HighlightParser, ParseOutcome};
use crate::app::progress::{self, ProgressError, ProgressSnapshot};
use crate::app::reconstruct::{LossyLine, lossy_lines};
use crate::app::store::QuoteStore;
use crate::domain::errors::StoreError;
use crate::domain::model::IdAllocator;
use crate::infra::config::Config;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no quotes to work with; load a document and run 'parse' first")]
    NoQuotes,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// What loading a document found besides its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFound {
    None,
    Valid,
    /// A block was present but unreadable; it was dropped.
    Invalid,
}

/// Result of [`Session::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    pub outcome: ParseOutcome,
    pub restored: usize,
}

/// A document produced by [`Session::save_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub name: String,
    pub contents: String,
    /// Text lines that will not read back unchanged when the document is reopened.
    pub lossy: Vec<LossyLine>,
}

/// Owns the loaded document, its saved progress and the quote store.
#[derive(Debug, Clone)]
pub struct Session {
    parser: HighlightParser,
    embed_progress: bool,
    restore_on_parse: bool,
    fallback_name: String,
    document_name: Option<String>,
    original: String,
    progress: Option<ProgressSnapshot>,
    store: QuoteStore,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self::with_ids(config, IdAllocator::from_clock())
    }

    pub fn with_ids(config: &Config, ids: IdAllocator) -> Self {
        Self {
            parser: HighlightParser::new(config.defaults.callout()),
            embed_progress: config.progress.embed(),
            restore_on_parse: config.progress.restore(),
            fallback_name: config.export.fallback_name(),
            document_name: None,
            original: String::new(),
            progress: None,
            store: QuoteStore::with_ids(ids),
        }
    }

    /// Replace the current document. Any embedded progress block is decoded and stripped.
    ///
    /// Quotes from the previous document are discarded; call [`Session::parse`] next.
    pub fn load_text(&mut self, name: Option<&str>, contents: &str) -> ProgressFound {
        let found = match progress::decode(contents) {
            Ok(Some(snapshot)) => {
                self.progress = Some(snapshot);
                ProgressFound::Valid
            }
            Ok(None) => {
                self.progress = None;
                ProgressFound::None
            }
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable progress metadata");
                self.progress = None;
                ProgressFound::Invalid
            }
        };
        self.document_name = name.map(str::to_owned);
        self.original = progress::strip(contents);
        self.store.clear();
        found
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    /// Document text with progress metadata removed.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref()
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QuoteStore {
        &mut self.store
    }

    /// Parse the loaded document, restoring saved progress when configured to.
    pub fn parse(&mut self) -> ParseReport {
        let outcome = self.store.load(&self.original, &self.parser);
        let restored = if self.restore_on_parse {
            self.restore_progress()
        } else {
            0
        };
        ParseReport { outcome, restored }
    }

    /// Re-apply the saved progress snapshot, returning how many quotes it touched.
    pub fn restore_progress(&mut self) -> usize {
        match &self.progress {
            Some(snapshot) if !self.store.is_empty() => snapshot.apply_to(&mut self.store),
            _ => 0,
        }
    }

    /// Converted callout Markdown for the current quotes.
    pub fn generate(&self) -> Result<String, SessionError> {
        self.require_quotes()?;
        Ok(ExportFormat::Callout.render(self.store.quotes(), false)?)
    }

    /// Rebuild the document from the current quotes, with progress when configured.
    ///
    /// The rebuilt text becomes the session's document, so a later `parse` sees the saved edits.
    pub fn save_document(&mut self) -> Result<SavedDocument, SessionError> {
        self.require_quotes()?;
        let contents = ExportFormat::Original.render(self.store.quotes(), self.embed_progress)?;
        self.progress = progress::decode(&contents)?;
        self.original = progress::strip(&contents);
        let name = self
            .document_name
            .clone()
            .unwrap_or_else(|| self.fallback_name.clone());
        let lossy = lossy_lines(self.store.quotes());
        for lost in &lossy {
            tracing::warn!(
                quote = lost.quote + 1,
                line = %lost.line,
                "saved text {}",
                lost.reason.describe()
            );
        }
        tracing::debug!(%name, quotes = self.store.len(), "rebuilt document");
        Ok(SavedDocument {
            name,
            contents,
            lossy,
        })
    }

    /// Forget the document, its progress and all quotes.
    pub fn clear(&mut self) {
        self.document_name = None;
        self.original.clear();
        self.progress = None;
        self.store.clear();
    }

    fn require_quotes(&self) -> Result<(), SessionError> {
        if self.store.is_empty() {
            Err(SessionError::NoQuotes)
        } else {
            Ok(())
        }
    }
}
