//! Rendering quotes into blockquote + callout Markdown.

use crate::domain::model::{Quote, QuotePart};

const QUOTE_SEPARATOR: &str = "\n---\n\n";

/// Render every quote into the callout Markdown dialect.
///
/// ```text
/// > highlight line ^ref-1
///
/// > [!tip]
/// > note line
/// ```
///
/// References are always appended to the last highlight line. References only recognised on a
/// line of their own (`page: 12`) therefore read back as highlight text; use
/// [`crate::app::reconstruct::reconstruct_document`] for output that must re-parse.
pub fn format_quotes(quotes: &[Quote]) -> String {
    let mut out = String::new();
    for (index, quote) in quotes.iter().enumerate() {
        if index > 0 {
            out.push_str(QUOTE_SEPARATOR);
        }
        write_quote(&mut out, quote);
    }
    out.trim_end().to_string()
}

fn write_quote(out: &mut String, quote: &Quote) {
    match &quote.parts {
        Some(parts) => {
            for (index, part) in parts.iter().enumerate() {
                write_blockquote(out, &part.highlight, &part.location_refs);
                if index + 1 < parts.len() {
                    out.push('\n');
                }
            }
        }
        None => write_blockquote(out, &quote.highlight, &quote.location_refs),
    }
    out.push('\n');

    if !quote.notes.is_empty() {
        out.push_str("> [!");
        out.push_str(quote.callout.as_str());
        out.push_str("]\n");
        for line in quote.notes.split('\n') {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
}

/// Emit `text` as blockquote lines, attaching `refs` to the last line only.
fn write_blockquote(out: &mut String, text: &str, refs: &[String]) {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for (index, line) in lines.iter().enumerate() {
        out.push_str("> ");
        out.push_str(line);
        if index == last && !refs.is_empty() {
            out.push(' ');
            out.push_str(&refs.join(" "));
        }
        out.push('\n');
    }
}

/// Render a single fragment; used by previews that show parts on their own.
pub fn format_part(part: &QuotePart) -> String {
    let mut out = String::new();
    write_blockquote(&mut out, &part.highlight, &part.location_refs);
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CalloutType, QuoteId};

    fn quote(highlight: &str, notes: &str, refs: &[&str], callout: CalloutType) -> Quote {
        Quote::new(
            QuoteId(1),
            highlight,
            notes,
            refs.iter().map(|r| r.to_string()).collect(),
            callout,
        )
    }

    #[test]
    fn renders_highlight_with_tip_callout() {
        let rendered = format_quotes(&[quote("A", "B", &[], CalloutType::Tip)]);
        assert_eq!(rendered, "> A\n\n> [!tip]\n> B");
    }

    #[test]
    fn references_attach_to_last_highlight_line() {
        let rendered = format_quotes(&[quote(
            "line one\nline two",
            "",
            &["^ref-1", "page: 3"],
            CalloutType::Note,
        )]);
        assert_eq!(rendered, "> line one\n> line two ^ref-1 page: 3");
    }

    #[test]
    fn quotes_are_separated_by_rules() {
        let rendered = format_quotes(&[
            quote("first", "", &[], CalloutType::Note),
            quote("second", "multi\nline", &[], CalloutType::Question),
        ]);
        assert_eq!(
            rendered,
            "> first\n\n\n---\n\n> second\n\n> [!question]\n> multi\n> line"
        );
    }

    #[test]
    fn merged_parts_keep_their_own_references() {
        let mut merged = quote("a\n\nb", "why", &[], CalloutType::Info);
        merged.parts = Some(vec![
            QuotePart {
                highlight: "a".into(),
                location_refs: vec!["^ref-1".into()],
            },
            QuotePart {
                highlight: "b".into(),
                location_refs: vec!["^ref-2".into()],
            },
        ]);
        let rendered = format_quotes(&[merged]);
        assert_eq!(rendered, "> a ^ref-1\n\n> b ^ref-2\n\n> [!info]\n> why");
    }

    #[test]
    fn empty_sequence_renders_empty_document() {
        assert_eq!(format_quotes(&[]), "");
    }

    #[test]
    fn part_preview_matches_blockquote_shape() {
        let part = QuotePart {
            highlight: "solo".into(),
            location_refs: vec!["^ref-3".into()],
        };
        assert_eq!(format_part(&part), "> solo ^ref-3");
    }
}
