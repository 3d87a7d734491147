//! Detection and extraction of Kindle location-reference markup.
//!
//! Kindle exports attach positional markers to highlights either as lines of
//! their own (`— location: [302](kindle://...) ^ref-391`, `page: 12`) or
//! embedded at the end of a highlight line. Each pattern lives in its own
//! [`LocationRule`] so the dialect can grow without touching the parser's
//! region tracking.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named pattern recognising one flavour of location reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRule {
    /// Dash-like character followed by `location:` at the start of a line.
    DashLocation,
    /// `^ref-<digits>` at the start of a line.
    Anchor,
    /// `location: [` at the start of a line.
    BracketLocation,
    /// `page: <digits>` at the start of a line.
    Page,
    /// Full `— location: [n](kindle://...) ^ref-n` reference anywhere in a line.
    KindleLink,
    /// Bare `^ref-<digits>` token anywhere in a line.
    BareAnchor,
}

static DASH_LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\x{2013}\x{2014}\x{2015}-]\s*location:").unwrap());
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\^ref-\d+").unwrap());
static BRACKET_LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^location:\s*\[").unwrap());
static PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^page:\s*\d+").unwrap());
static KINDLE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\x{2013}\x{2014}\x{2015}-]\s*location:\s*\[.*?\]\(kindle://.*?\)\s*\^ref-\d+")
        .unwrap()
});
static BARE_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\^ref-\d+").unwrap());
static BARE_ANCHOR_WITH_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\^ref-\d+").unwrap());
static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

impl LocationRule {
    /// Rules that classify an entire line as a reference.
    pub const STANDALONE: [LocationRule; 4] = [
        LocationRule::DashLocation,
        LocationRule::Anchor,
        LocationRule::BracketLocation,
        LocationRule::Page,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LocationRule::DashLocation => "dash-location",
            LocationRule::Anchor => "anchor",
            LocationRule::BracketLocation => "bracket-location",
            LocationRule::Page => "page",
            LocationRule::KindleLink => "kindle-link",
            LocationRule::BareAnchor => "bare-anchor",
        }
    }

    pub fn regex(&self) -> &'static Regex {
        match self {
            LocationRule::DashLocation => &DASH_LOCATION_RE,
            LocationRule::Anchor => &ANCHOR_RE,
            LocationRule::BracketLocation => &BRACKET_LOCATION_RE,
            LocationRule::Page => &PAGE_RE,
            LocationRule::KindleLink => &KINDLE_LINK_RE,
            LocationRule::BareAnchor => &BARE_ANCHOR_RE,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

/// Text left over after pulling embedded references out of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// References in first-match order, full references before bare anchors.
    pub refs: Vec<String>,
    /// Remaining text, whitespace-collapsed once references are cut out. Empty when the line
    /// held only references.
    pub text: String,
}

impl Extraction {
    pub fn is_reference_only(&self) -> bool {
        self.text.is_empty()
    }
}

/// Returns the first standalone rule matching `line`, if any.
pub fn standalone_rule(line: &str) -> Option<LocationRule> {
    LocationRule::STANDALONE
        .into_iter()
        .find(|rule| rule.is_match(line))
}

/// Whether the whole (trimmed) line is a location reference.
pub fn is_location_line(line: &str) -> bool {
    standalone_rule(line).is_some()
}

/// Pull embedded location references out of `line`.
pub fn extract_embedded(line: &str) -> Extraction {
    let mut refs: Vec<String> = KINDLE_LINK_RE
        .find_iter(line)
        .map(|found| found.as_str().trim().to_string())
        .collect();

    for found in BARE_ANCHOR_RE.find_iter(line) {
        let anchor = found.as_str();
        if !refs.iter().any(|existing| existing.contains(anchor)) {
            refs.push(anchor.to_string());
        }
    }

    if refs.is_empty() {
        return Extraction {
            refs,
            text: line.trim().to_string(),
        };
    }

    let without_links = KINDLE_LINK_RE.replace_all(line, "");
    let without_anchors = BARE_ANCHOR_WITH_SPACE_RE.replace_all(&without_links, "");
    Extraction {
        refs,
        text: collapse_whitespace(&without_anchors),
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REF: &str =
        "— location: [302](kindle://book?action=open&asin=B00Z3FRYB0&location=302) ^ref-391";

    #[test]
    fn recognises_standalone_lines() {
        assert_eq!(standalone_rule(FULL_REF), Some(LocationRule::DashLocation));
        assert_eq!(standalone_rule("- Location: 12"), Some(LocationRule::DashLocation));
        assert_eq!(standalone_rule("^ref-123"), Some(LocationRule::Anchor));
        assert_eq!(standalone_rule("LOCATION: [55]"), Some(LocationRule::BracketLocation));
        assert_eq!(standalone_rule("page: 14"), Some(LocationRule::Page));
        assert_eq!(standalone_rule("― location: 9"), Some(LocationRule::DashLocation));
    }

    #[test]
    fn ordinary_text_is_not_a_location_line() {
        assert!(!is_location_line("The page: a story"));
        assert!(!is_location_line("See location: [1] below"));
        assert!(!is_location_line("page: twelve"));
        assert!(!is_location_line("ref-123"));
    }

    #[test]
    fn extracts_embedded_full_reference() {
        let line = format!("Habits compound over time. {FULL_REF}");
        let extraction = extract_embedded(&line);
        assert_eq!(extraction.refs, vec![FULL_REF.to_string()]);
        assert_eq!(extraction.text, "Habits compound over time.");
    }

    #[test]
    fn extracts_bare_anchor_and_collapses_whitespace() {
        let extraction = extract_embedded("Start   small ^ref-42   and stay consistent");
        assert_eq!(extraction.refs, vec!["^ref-42".to_string()]);
        assert_eq!(extraction.text, "Start small and stay consistent");
    }

    #[test]
    fn full_references_precede_residual_anchors() {
        let line = format!("^ref-7 text {FULL_REF} tail ^ref-8");
        let extraction = extract_embedded(&line);
        assert_eq!(
            extraction.refs,
            vec![FULL_REF.to_string(), "^ref-7".to_string(), "^ref-8".to_string()]
        );
        assert_eq!(extraction.text, "text tail");
    }

    #[test]
    fn anchor_inside_full_reference_is_not_duplicated() {
        let extraction = extract_embedded(FULL_REF);
        assert_eq!(extraction.refs.len(), 1);
        assert!(extraction.is_reference_only());
    }

    #[test]
    fn line_without_references_is_only_trimmed() {
        let extraction = extract_embedded("  plain\ttext  ");
        assert!(extraction.refs.is_empty());
        assert_eq!(extraction.text, "plain\ttext");
    }

    #[test]
    fn rule_names_are_stable() {
        assert_eq!(LocationRule::KindleLink.name(), "kindle-link");
        assert!(LocationRule::BareAnchor.is_match("x ^REF-1"));
    }
}
