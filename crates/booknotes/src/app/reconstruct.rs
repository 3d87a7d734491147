//! Rebuilding the original export shape from edited quotes.

use crate::app::location::{extract_embedded, is_location_line};
use crate::domain::model::Quote;

const SECTION_SEPARATOR: &str = "\n---\n\n";

/// Render quotes back into plain highlight + references + notes sections.
///
/// Unlike [`crate::app::format::format_quotes`] there are no blockquote markers or callout
/// headers, so the result can be fed back through the parser.
pub fn reconstruct_document(quotes: &[Quote]) -> String {
    let mut out = String::new();
    for (index, quote) in quotes.iter().enumerate() {
        if index > 0 {
            out.push_str(SECTION_SEPARATOR);
        }

        let fragments = quote.fragments();
        for (position, fragment) in fragments.iter().enumerate() {
            write_fragment(&mut out, &fragment.highlight, &fragment.location_refs);
            if position + 1 < fragments.len() {
                out.push_str("\n\n");
            }
        }

        if quote.has_notes() {
            out.push_str("\n\n");
            out.push_str(&quote.notes);
        }
        out.push('\n');
    }
    out.trim().to_string()
}

/// A line of user text that the parser would not read back as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossyLine {
    /// Position of the owning quote.
    pub quote: usize,
    pub line: String,
    pub reason: LossReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// Read back as a location reference instead of text.
    LocationReference,
    /// Contains `---`, which starts a new section.
    SectionSeparator,
}

impl LossReason {
    pub fn describe(&self) -> &'static str {
        match self {
            LossReason::LocationReference => "reads back as a location reference",
            LossReason::SectionSeparator => "contains '---' and splits the section",
        }
    }
}

/// Highlight and note lines in `quotes` that [`reconstruct_document`] cannot preserve.
pub fn lossy_lines(quotes: &[Quote]) -> Vec<LossyLine> {
    let mut found = Vec::new();
    for (index, quote) in quotes.iter().enumerate() {
        let mut lines: Vec<String> = Vec::new();
        for fragment in quote.fragments() {
            lines.extend(fragment.highlight.lines().map(str::to_owned));
        }
        lines.extend(quote.notes.lines().map(str::to_owned));
        for line in lines {
            if let Some(reason) = loss_reason(&line) {
                found.push(LossyLine {
                    quote: index,
                    line,
                    reason,
                });
            }
        }
    }
    found
}

fn loss_reason(line: &str) -> Option<LossReason> {
    let trimmed = line.trim();
    if trimmed.contains("---") {
        Some(LossReason::SectionSeparator)
    } else if is_location_line(trimmed) || !extract_embedded(trimmed).refs.is_empty() {
        Some(LossReason::LocationReference)
    } else {
        None
    }
}

fn write_fragment(out: &mut String, highlight: &str, refs: &[String]) {
    out.push_str(highlight);
    if refs.is_empty() {
        return;
    }

    let last_line = highlight.rsplit('\n').next().unwrap_or(highlight);
    let inline = format!("{last_line} {}", refs.join(" "));
    if extract_embedded(&inline).refs == refs {
        out.push(' ');
        out.push_str(&refs.join(" "));
    } else {
        // Standalone-only references (`page: 12`) are recognised solely on their own line.
        for reference in refs {
            out.push('\n');
            out.push_str(reference);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::parser::parse_highlights;
    use crate::domain::model::{CalloutType, QuoteId, QuotePart};

    const REF: &str = "— location: [1](kindle://book?action=open&asin=X&location=1) ^ref-99";

    fn quote(highlight: &str, notes: &str, refs: &[&str]) -> Quote {
        Quote::new(
            QuoteId(1),
            highlight,
            notes,
            refs.iter().map(|r| r.to_string()).collect(),
            CalloutType::Note,
        )
    }

    #[test]
    fn kindle_references_stay_on_the_highlight_line() {
        let doc = reconstruct_document(&[quote("Hello world", "My note.", &[REF])]);
        assert_eq!(doc, format!("Hello world {REF}\n\nMy note."));
    }

    #[test]
    fn sections_are_separated() {
        let doc = reconstruct_document(&[quote("one", "", &[]), quote("two", "n", &["^ref-4"])]);
        assert_eq!(doc, "one\n\n---\n\ntwo ^ref-4\n\nn");
    }

    #[test]
    fn standalone_only_references_get_their_own_lines() {
        let doc = reconstruct_document(&[quote("text", "", &["page: 12", "^ref-3"])]);
        assert_eq!(doc, "text\npage: 12\n^ref-3");
    }

    #[test]
    fn reference_like_and_separator_notes_are_reported() {
        let quotes = [
            quote("safe", "plain thoughts", &[]),
            quote("text", "intro\npage: 12 is where it starts\nsee ^ref-7", &[]),
            quote("more", "before --- after", &[]),
        ];
        let lossy = lossy_lines(&quotes);
        let summary: Vec<_> = lossy
            .iter()
            .map(|lost| (lost.quote, lost.line.as_str(), lost.reason))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "page: 12 is where it starts", LossReason::LocationReference),
                (1, "see ^ref-7", LossReason::LocationReference),
                (2, "before --- after", LossReason::SectionSeparator),
            ]
        );

        let reparsed = parse_highlights(&reconstruct_document(&quotes[1..2]), CalloutType::Note);
        assert_eq!(reparsed[0].notes, "intro\nsee");
    }

    #[test]
    fn merged_parts_are_blank_line_joined() {
        let mut merged = quote("a\n\nb", "thoughts", &[]);
        merged.parts = Some(vec![
            QuotePart {
                highlight: "a".into(),
                location_refs: vec!["^ref-1".into()],
            },
            QuotePart {
                highlight: "b".into(),
                location_refs: vec![],
            },
        ]);
        let doc = reconstruct_document(&[merged]);
        assert_eq!(doc, "a ^ref-1\n\nb\n\nthoughts");
    }

    #[test]
    fn reparsing_recovers_highlights_notes_and_references() {
        let original = vec![
            quote("Hello world", "My note.\nSecond line", &[REF]),
            quote("Plain", "", &["page: 7"]),
            quote("Anchored", "", &["^ref-5"]),
        ];
        let doc = reconstruct_document(&original);
        let reparsed = parse_highlights(&doc, CalloutType::Note);
        assert_eq!(reparsed.len(), original.len());
        for (before, after) in original.iter().zip(&reparsed) {
            assert_eq!(before.highlight, after.highlight);
            assert_eq!(before.notes, after.notes);
            assert_eq!(before.location_refs, after.location_refs);
        }
    }
}
