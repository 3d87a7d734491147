//! Splitting Kindle exports into quotes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::location::{extract_embedded, is_location_line};
use crate::domain::model::{CalloutType, IdAllocator, Quote};

static SECTION_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"---\s*").unwrap());

/// Result of parsing a document, separating "nothing to do" from "nothing found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The input was empty or whitespace only.
    Empty,
    /// The input had content but no section produced a highlight.
    NoQuotes,
    /// Number of quotes produced.
    Parsed(usize),
}

/// Turns raw export text into unmerged, unselected [`Quote`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightParser {
    default_callout: CalloutType,
}

impl HighlightParser {
    pub fn new(default_callout: CalloutType) -> Self {
        Self { default_callout }
    }

    /// Parse `text`, drawing quote identifiers from `ids`.
    pub fn parse(&self, text: &str, ids: &mut IdAllocator) -> Vec<Quote> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut quotes = Vec::new();
        let mut sections = 0usize;
        for section in split_sections(text) {
            sections += 1;
            let parsed = parse_section(section);
            if parsed.highlight.is_empty() {
                continue;
            }
            quotes.push(Quote::new(
                ids.next_id(),
                parsed.highlight,
                parsed.notes,
                parsed.location_refs,
                self.default_callout,
            ));
        }

        tracing::debug!(sections, quotes = quotes.len(), "parsed highlight export");
        quotes
    }

    /// Parse `text` and classify the outcome alongside the produced quotes.
    pub fn parse_with_outcome(
        &self,
        text: &str,
        ids: &mut IdAllocator,
    ) -> (ParseOutcome, Vec<Quote>) {
        if text.trim().is_empty() {
            return (ParseOutcome::Empty, Vec::new());
        }
        let quotes = self.parse(text, ids);
        let outcome = if quotes.is_empty() {
            ParseOutcome::NoQuotes
        } else {
            ParseOutcome::Parsed(quotes.len())
        };
        (outcome, quotes)
    }
}

/// Parse with a fresh identifier sequence starting at 1.
pub fn parse_highlights(text: &str, default_callout: CalloutType) -> Vec<Quote> {
    HighlightParser::new(default_callout).parse(text, &mut IdAllocator::default())
}

/// Non-blank sections between `---` separators.
pub fn split_sections(text: &str) -> impl Iterator<Item = &str> {
    SECTION_SEPARATOR_RE
        .split(text)
        .filter(|section| !section.trim().is_empty())
}

#[derive(Debug, Default)]
struct SectionText {
    highlight: String,
    notes: String,
    location_refs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Highlight,
    /// Entered on the first contributing line after a blank line; never left.
    Notes,
}

fn parse_section(section: &str) -> SectionText {
    let mut out = SectionText::default();
    let mut seen_blank = false;
    let mut region = Region::Highlight;

    for raw in section.trim().lines() {
        let line = raw.trim();
        if line.is_empty() {
            seen_blank = true;
            continue;
        }

        if is_location_line(line) {
            out.location_refs.push(line.to_string());
            continue;
        }

        let extraction = extract_embedded(line);
        let reference_only = extraction.is_reference_only();
        out.location_refs.extend(extraction.refs);
        if reference_only {
            continue;
        }

        if seen_blank {
            region = Region::Notes;
        }
        match region {
            Region::Highlight => append_joined(&mut out.highlight, &extraction.text, " "),
            Region::Notes => append_joined(&mut out.notes, &extraction.text, "\n"),
        }
    }

    out.highlight = out.highlight.trim().to_string();
    out.notes = out.notes.trim().to_string();
    out
}

fn append_joined(target: &mut String, text: &str, separator: &str) {
    if !target.is_empty() {
        target.push_str(separator);
    }
    target.push_str(text);
}
