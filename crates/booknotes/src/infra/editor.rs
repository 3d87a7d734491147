//! `$EDITOR` integration for rewriting a single quote.
//!
//! The quote is written to a temporary Markdown file laid out as
//!
//! ```text
//! %% callout: tip %%
//! highlight text
//! %% notes %%
//! notes text
//! ```
//!
//! and read back once the editor exits. Other lines starting with `%%` are ignored.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result, bail};
use thiserror::Error;

use crate::domain::model::{CalloutParseError, CalloutType, Quote};

const CALLOUT_DIRECTIVE: &str = "callout:";
const NOTES_MARKER: &str = "%% notes %%";
const HELP_LINE: &str =
    "%% Edit the highlight above the notes marker and your notes below it. Save and quit to apply. %%";

/// Highlight, notes and callout recovered from an edited buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedQuote {
    pub highlight: String,
    pub notes: String,
    pub callout: CalloutType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditBufferError {
    #[error(transparent)]
    Callout(#[from] CalloutParseError),
    #[error("edited buffer has no highlight text")]
    EmptyHighlight,
}

/// Lay out `quote` for editing.
pub fn render_buffer(quote: &Quote) -> String {
    let mut buffer = format!("%% {CALLOUT_DIRECTIVE} {} %%\n", quote.callout);
    buffer.push_str(HELP_LINE);
    buffer.push('\n');
    buffer.push_str(&quote.highlight);
    buffer.push('\n');
    buffer.push_str(NOTES_MARKER);
    buffer.push('\n');
    if !quote.notes.is_empty() {
        buffer.push_str(&quote.notes);
        buffer.push('\n');
    }
    buffer
}

/// Read an edited buffer back. A missing callout directive keeps `fallback`.
pub fn parse_buffer(buffer: &str, fallback: CalloutType) -> Result<EditedQuote, EditBufferError> {
    let mut callout = fallback;
    let mut highlight = Vec::new();
    let mut notes = Vec::new();
    let mut in_notes = false;

    for line in buffer.lines() {
        let trimmed = line.trim();
        if trimmed == NOTES_MARKER {
            in_notes = true;
            continue;
        }
        if let Some(directive) = directive_body(trimmed) {
            if let Some(value) = directive.strip_prefix(CALLOUT_DIRECTIVE) {
                callout = value.parse()?;
            }
            continue;
        }
        if in_notes {
            notes.push(line);
        } else {
            highlight.push(line);
        }
    }

    let highlight = highlight.join("\n").trim().to_string();
    if highlight.is_empty() {
        return Err(EditBufferError::EmptyHighlight);
    }
    Ok(EditedQuote {
        highlight,
        notes: notes.join("\n").trim().to_string(),
        callout,
    })
}

fn directive_body(line: &str) -> Option<&str> {
    line.strip_prefix("%%")
        .and_then(|rest| rest.strip_suffix("%%"))
        .map(str::trim)
}

/// Open `quote` in the user's editor and return the edited values.
pub fn edit_quote(quote: &Quote) -> Result<EditedQuote> {
    let edited = edit_text(&render_buffer(quote))?;
    parse_buffer(&edited, quote.callout).context("could not apply edited quote")
}

/// Round-trip `initial` through the user's editor.
pub fn edit_text(initial: &str) -> Result<String> {
    let editor = find_editor()?;
    let mut file = tempfile::Builder::new()
        .prefix("booknotes-")
        .suffix(".md")
        .tempfile()
        .context("failed to create temporary file for editing")?;
    file.write_all(initial.as_bytes())
        .context("failed to write temporary file for editing")?;
    file.flush()?;

    tracing::debug!(%editor, path = %file.path().display(), "launching editor");
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("editor command is empty")?;
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to run editor: {editor}"))?;
    if !status.success() {
        bail!("editor '{editor}' exited with status {status}; quote left unchanged");
    }

    fs::read_to_string(file.path())
        .with_context(|| format!("failed to read edited file: {}", file.path().display()))
}

fn find_editor() -> Result<String> {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(value) = env::var(var)
            && !value.trim().is_empty()
        {
            return Ok(value);
        }
    }
    for candidate in ["nano", "vim", "vi"] {
        if command_exists(candidate) {
            return Ok(candidate.to_string());
        }
    }
    bail!("no editor found; set $EDITOR (for example `export EDITOR=nano`)")
}

fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::QuoteId;

    fn quote() -> Quote {
        Quote::new(
            QuoteId(3),
            "The highlight",
            "first note\nsecond note",
            vec!["^ref-1".into()],
            CalloutType::Tip,
        )
    }

    #[test]
    fn rendered_buffer_parses_back_unchanged() {
        let buffer = render_buffer(&quote());
        assert!(buffer.starts_with("%% callout: tip %%\n"));
        let edited = parse_buffer(&buffer, CalloutType::Note).unwrap();
        assert_eq!(edited.highlight, "The highlight");
        assert_eq!(edited.notes, "first note\nsecond note");
        assert_eq!(edited.callout, CalloutType::Tip);
    }

    #[test]
    fn edits_change_all_fields() {
        let buffer = "%% callout: Warning %%\n  New text\nspanning lines\n%% notes %%\n\nfresh\n";
        let edited = parse_buffer(buffer, CalloutType::Note).unwrap();
        assert_eq!(edited.highlight, "New text\nspanning lines");
        assert_eq!(edited.notes, "fresh");
        assert_eq!(edited.callout, CalloutType::Warning);
    }

    #[test]
    fn missing_directive_keeps_fallback_callout() {
        let edited = parse_buffer("only highlight", CalloutType::Bug).unwrap();
        assert_eq!(edited.callout, CalloutType::Bug);
        assert_eq!(edited.notes, "");
    }

    #[test]
    fn rejects_bad_callout_and_empty_highlight() {
        assert_eq!(
            parse_buffer("%% callout: shiny %%\ntext", CalloutType::Note),
            Err(EditBufferError::Callout(CalloutParseError::Unknown(
                "shiny".into()
            )))
        );
        assert_eq!(
            parse_buffer("%% notes %%\nnotes only", CalloutType::Note),
            Err(EditBufferError::EmptyHighlight)
        );
    }
}
