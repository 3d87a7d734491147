//! Rendering quotes into output documents and delivering them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::format::format_quotes;
use crate::app::progress::{self, ProgressError, ProgressSnapshot};
use crate::app::reconstruct::reconstruct_document;
use crate::domain::model::Quote;
use crate::infra::clipboard::{Clipboard, CopyBackend};
use crate::infra::config::Config;
use crate::infra::files;

/// Supported output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Blockquotes with callout notes.
    #[default]
    Callout,
    /// The export's own layout, re-parseable, optionally carrying progress metadata.
    Original,
}

impl ExportFormat {
    /// Render `quotes`; `embed_progress` only affects [`ExportFormat::Original`].
    pub fn render(&self, quotes: &[Quote], embed_progress: bool) -> Result<String, ProgressError> {
        match self {
            ExportFormat::Callout => Ok(format_quotes(quotes)),
            ExportFormat::Original => {
                let body = reconstruct_document(quotes);
                if embed_progress {
                    progress::embed(&body, &ProgressSnapshot::capture(quotes)?)
                } else {
                    Ok(body)
                }
            }
        }
    }
}

/// Where a rendered document should go.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub output_path: Option<PathBuf>,
    pub copy_to_clipboard: bool,
}

impl ExportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_path: None,
            copy_to_clipboard: config.export.copy_to_clipboard(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub output_path: Option<PathBuf>,
    pub copied_to: Option<CopyBackend>,
}

/// Writes rendered documents to disk and the clipboard.
#[derive(Default)]
pub struct Exporter {
    clipboard: Option<Clipboard>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&mut self, rendered: &str, options: &ExportOptions) -> Result<ExportResult> {
        if let Some(path) = &options.output_path {
            files::write_document(path, rendered)?;
        }

        let copied_to = if options.copy_to_clipboard {
            Some(self.copy(rendered)?)
        } else {
            None
        };

        Ok(ExportResult {
            output_path: options.output_path.clone(),
            copied_to,
        })
    }

    pub fn copy(&mut self, rendered: &str) -> Result<CopyBackend> {
        let backend = self
            .clipboard
            .get_or_insert_with(Clipboard::new)
            .copy(rendered)
            .context("failed to copy converted notes to clipboard")?;
        tracing::info!(%backend, bytes = rendered.len(), "copied to clipboard");
        Ok(backend)
    }
}
