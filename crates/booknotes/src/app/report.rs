//! Human-readable summaries rendered through minijinja templates.

use anyhow::{Result, anyhow};
use minijinja::Environment;
use serde::Serialize;

use crate::app::format::{format_part, format_quotes};
use crate::app::inspect::LineReport;
use crate::app::progress::ProgressSnapshot;
use crate::domain::model::Quote;

const PREVIEW_CHARS: usize = 72;

/// Renders quote listings and progress reports for the terminal.
pub struct Reporter {
    env: Environment<'static>,
}

impl Reporter {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for (name, source) in [
            ("quote_list", QUOTE_LIST_TEMPLATE),
            ("quote_detail", QUOTE_DETAIL_TEMPLATE),
            ("status", STATUS_TEMPLATE),
            ("inspect", INSPECT_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|err| anyhow!("failed to register template '{name}': {err}"))?;
        }
        Ok(Self { env })
    }

    /// One line per quote with flags and a shortened highlight.
    pub fn quote_list(&self, quotes: &[Quote]) -> Result<String> {
        let rows: Vec<QuoteRow> = quotes
            .iter()
            .enumerate()
            .map(|(index, quote)| QuoteRow::new(index, quote))
            .collect();
        self.render("quote_list", &ListContext { quotes: rows })
    }

    /// Full rendering of one quote, including each merged fragment.
    pub fn quote_detail(&self, index: usize, quote: &Quote) -> Result<String> {
        let fragments = match &quote.parts {
            Some(parts) => parts.iter().map(format_part).collect(),
            None => Vec::new(),
        };
        let context = DetailContext {
            quote: QuoteRow::new(index, quote),
            rendered: format_quotes(std::slice::from_ref(quote)),
            fragments,
        };
        self.render("quote_detail", &context)
    }

    pub fn status(&self, status: &StatusContext<'_>) -> Result<String> {
        self.render("status", status)
    }

    /// Per-line location-reference classification.
    pub fn inspect(&self, lines: &[LineReport]) -> Result<String> {
        self.render("inspect", &InspectContext { lines })
    }

    fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|err| anyhow!("missing template '{name}': {err}"))?;
        let rendered = template
            .render(context)
            .map_err(|err| anyhow!("failed to render template '{name}': {err}"))?;
        Ok(rendered.trim_end().to_string())
    }
}

/// Counts and saved progress shown by `status`.
#[derive(Debug, Serialize)]
pub struct StatusContext<'a> {
    pub document: Option<&'a str>,
    pub total: usize,
    pub with_notes: usize,
    pub merged: usize,
    pub selected: usize,
    pub progress: Option<&'a ProgressSnapshot>,
}

impl<'a> StatusContext<'a> {
    pub fn new(
        document: Option<&'a str>,
        quotes: &[Quote],
        progress: Option<&'a ProgressSnapshot>,
    ) -> Self {
        Self {
            document,
            total: quotes.len(),
            with_notes: quotes.iter().filter(|quote| quote.has_notes()).count(),
            merged: quotes.iter().filter(|quote| quote.is_merged()).count(),
            selected: quotes.iter().filter(|quote| quote.selected).count(),
            progress,
        }
    }
}

#[derive(Serialize)]
struct InspectContext<'a> {
    lines: &'a [LineReport],
}

#[derive(Serialize)]
struct ListContext {
    quotes: Vec<QuoteRow>,
}

#[derive(Serialize)]
struct DetailContext {
    quote: QuoteRow,
    rendered: String,
    fragments: Vec<String>,
}

#[derive(Serialize)]
struct QuoteRow {
    number: usize,
    emoji: &'static str,
    title: &'static str,
    selected: bool,
    /// Trailing ` | ...` markers for merged parts, notes and location.
    flags: String,
    preview: String,
}

impl QuoteRow {
    fn new(index: usize, quote: &Quote) -> Self {
        Self {
            number: index + 1,
            emoji: quote.callout.emoji(),
            title: quote.callout.title(),
            selected: quote.selected,
            flags: flags(quote),
            preview: preview(&quote.highlight),
        }
    }
}

fn flags(quote: &Quote) -> String {
    let mut flags = String::new();
    if let Some(parts) = &quote.parts {
        flags.push_str(&format!(" | merged x{}", parts.len()));
    }
    if quote.has_notes() {
        flags.push_str(" | notes");
    }
    if quote.has_location() {
        flags.push_str(" | location");
    }
    flags
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

const QUOTE_LIST_TEMPLATE: &str = r#"{% for quote in quotes %}
{{ quote.number }}. [{{ "x" if quote.selected else " " }}] {{ quote.emoji }} {{ quote.title }}{{ quote.flags }}
   {{ quote.preview }}
{% else %}
No quotes. Load a document and run 'parse'.
{% endfor %}
"#;

const QUOTE_DETAIL_TEMPLATE: &str = r#"Quote {{ quote.number }} | {{ quote.emoji }} {{ quote.title }}{{ " | selected" if quote.selected else "" }}

{{ rendered }}
{% if fragments %}

Fragments:
{% for fragment in fragments %}
  {{ loop.index }}. {{ fragment }}
{% endfor %}
{% endif %}
"#;

const STATUS_TEMPLATE: &str = r#"Document: {{ document if document else "(none)" }}

Quotes: {{ total }} ({{ with_notes }} with notes, {{ merged }} merged, {{ selected }} selected)
{% if progress %}
Saved progress: {{ progress.timestamp }}
  {{ progress.totalQuotes }} quotes, {{ progress.quotesWithNotes }} with notes, {{ progress.mergedQuotes }} merged
{% else %}
Saved progress: none
{% endif %}
"#;

const INSPECT_TEMPLATE: &str = r#"{% for line in lines %}
Line {{ line.number }}: "{{ line.text }}"
{% if line.standalone %}
  standalone reference ({{ line.standalone }})
{% endif %}
{% if line.embedded %}
  embedded: {{ line.embedded | join(", ") }}
  cleaned: "{{ line.cleaned }}"
{% endif %}
{% endfor %}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::parser::parse_highlights;
    use crate::app::store::QuoteStore;
    use crate::domain::model::CalloutType;

    fn store() -> QuoteStore {
        QuoteStore::from_quotes(parse_highlights(
            "First highlight ^ref-1\n\nthoughts\n---\nSecond highlight\n---\nThird",
            CalloutType::Tip,
        ))
    }

    #[test]
    fn list_shows_numbers_flags_and_previews() {
        let mut store = store();
        store.toggle_select(1).unwrap();
        let listing = Reporter::new().unwrap().quote_list(store.quotes()).unwrap();
        assert!(listing.starts_with(
            "1. [ ] 💡 Tip | notes | location\n   First highlight\n2. [x] 💡 Tip\n   Second highlight\n"
        ));
        assert!(listing.ends_with("3. [ ] 💡 Tip\n   Third"));
    }

    #[test]
    fn list_marks_merged_quotes_with_part_count() {
        let mut store = store();
        store.merge(&[1, 2]).unwrap();
        let listing = Reporter::new().unwrap().quote_list(store.quotes()).unwrap();
        assert!(listing.contains("2. [ ] 💡 Tip | merged x2\n"));
    }

    #[test]
    fn inspect_marks_reference_lines() {
        let lines = crate::app::inspect::inspect_lines("Words here ^ref-2\npage: 9");
        let report = Reporter::new().unwrap().inspect(&lines).unwrap();
        assert_eq!(
            report,
            "Line 1: \"Words here ^ref-2\"\n  embedded: ^ref-2\n  cleaned: \"Words here\"\nLine 2: \"page: 9\"\n  standalone reference (page)"
        );
    }

    #[test]
    fn empty_list_has_hint() {
        let listing = Reporter::new().unwrap().quote_list(&[]).unwrap();
        assert_eq!(listing, "No quotes. Load a document and run 'parse'.");
    }

    #[test]
    fn detail_lists_merged_fragments() {
        let mut store = store();
        store.merge(&[0, 1]).unwrap();
        let detail = Reporter::new()
            .unwrap()
            .quote_detail(0, &store.quotes()[0])
            .unwrap();
        assert!(detail.starts_with("Quote 1 | 💡 Tip\n\n> First highlight"));
        assert!(detail.contains("> First highlight ^ref-1\n\n> Second highlight"));
        assert!(detail.contains("  1. > First highlight ^ref-1"));
        assert!(detail.contains("  2. > Second highlight"));
    }

    #[test]
    fn status_reports_counts_and_progress() {
        let store = store();
        let snapshot = ProgressSnapshot::capture(store.quotes()).unwrap();
        let reporter = Reporter::new().unwrap();

        let with = reporter
            .status(&StatusContext::new(
                Some("book.md"),
                store.quotes(),
                Some(&snapshot),
            ))
            .unwrap();
        assert!(with.contains("Document: book.md"));
        assert!(with.contains("Quotes: 3 (1 with notes, 0 merged, 0 selected)"));
        assert!(with.contains("3 quotes, 1 with notes, 0 merged"));

        let without = reporter
            .status(&StatusContext::new(None, &[], None))
            .unwrap();
        assert!(without.contains("Document: (none)"));
        assert!(without.contains("Saved progress: none"));
    }

    #[test]
    fn previews_are_flattened_and_shortened() {
        assert_eq!(preview("a\nb   c"), "a b c");
        let long = "word ".repeat(40);
        let short = preview(&long);
        assert!(short.ends_with('…'));
        assert!(short.chars().count() <= PREVIEW_CHARS + 1);
    }
}
