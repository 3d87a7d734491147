//! Line-by-line view of how location references are recognised in a document.

use serde::Serialize;

use crate::app::location::{extract_embedded, standalone_rule};

/// How one input line is classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    /// 1-based line number.
    pub number: usize,
    pub text: String,
    /// Name of the rule that makes the whole line a reference.
    pub standalone: Option<&'static str>,
    /// References found inside the line, in extraction order.
    pub embedded: Vec<String>,
    /// The line with embedded references cut out.
    pub cleaned: String,
}

impl LineReport {
    fn new(number: usize, raw: &str) -> Self {
        let text = raw.trim();
        let extraction = extract_embedded(text);
        Self {
            number,
            text: text.to_string(),
            standalone: standalone_rule(text).map(|rule| rule.name()),
            embedded: extraction.refs,
            cleaned: extraction.text,
        }
    }
}

/// Classify every line of `text`, blank lines included.
pub fn inspect_lines(text: &str) -> Vec<LineReport> {
    text.lines()
        .enumerate()
        .map(|(index, line)| LineReport::new(index + 1, line))
        .collect()
}
