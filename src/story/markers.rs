//! Every marker and pattern the prose parser recognises, in one table.
//!
//! Generator phrasing drifts between prompt versions, so matching is
//! case-insensitive and permissive about bullets and connector phrases.
//! Lines are trimmed before matching.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::story::node::Decision;

/// Literal line prefix that introduces a node in legacy plain text.
pub const NODE_ID_MARKER: &str = "Node ID:";

/// Prefixes of generated text that mean upstream generation failed.
pub const FAILURE_SENTINELS: [&str; 2] = [
    "[Content generation failed",
    "[Content generation critically failed",
];

/// What a recognised line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `Brief Title: ...` or `Title: ...`.
    Title,
    /// Structural lines that are never narrative (`Node ID:`, `Segment Summary:`, ...).
    Metadata,
    /// `1. Open the door. Go to page hallway`, `- Flee -> forest`, ...
    Decision,
    /// `Decisions:`, `What do you do?`, `Choose one:`.
    DecisionHeader,
    /// `Ending:` (optionally followed by text) or `--- THE END ---`.
    EndingMarker,
    /// A prose line containing "the end." or consisting of just "The End".
    EndingPhrase,
}

/// Ordered table of pattern -> meaning. The first matching row wins.
static TABLE: Lazy<Vec<(Marker, Regex)>> = Lazy::new(|| {
    vec![
        (Marker::Title, pattern(r"(?i)^(?:brief title|title):\s*(?P<rest>.*)$")),
        (
            Marker::Metadata,
            pattern(r"(?i)^(?:node id|brief title|title|segment summary|content):"),
        ),
        (
            Marker::Decision,
            pattern(
                r"(?i)^(?:\d+\.|-)\s*(?P<text>.+?)\s*(?:\(go to page|\(go to|\(->|go to page|go to|->)\s+(?P<target>[a-z0-9_]+)\)?\.?$",
            ),
        ),
        (
            Marker::DecisionHeader,
            pattern(r"(?i)^(?:decisions?:|what do you do\?|choose one:)"),
        ),
        (
            Marker::EndingMarker,
            pattern(r"(?i)^(?:ending:\s*(?P<rest>.*)|-{3}\s*the end\s*-{3})$"),
        ),
        (
            Marker::EndingPhrase,
            pattern(r"(?i)the end\.|^the end!?$"),
        ),
    ]
});

static NODE_ID: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z0-9_]+$"));

/// Splits a legacy blob into per-node fragments. The id may sit on the
/// line after the marker.
static NODE_BOUNDARY: Lazy<Regex> = Lazy::new(|| pattern(r"\r?\nNode ID:\s*"));

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("marker patterns are valid regex literals")
}

fn regex_for(marker: Marker) -> &'static Regex {
    TABLE
        .iter()
        .find(|(m, _)| *m == marker)
        .map(|(_, re)| re)
        .expect("every marker has a table row")
}

/// Classify a line by the first table row it matches. `None` means prose.
pub fn classify(line: &str) -> Option<Marker> {
    let line = line.trim();
    TABLE
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(marker, _)| *marker)
}

/// The heading carried by a title line, without its marker.
pub fn title(line: &str) -> Option<String> {
    regex_for(Marker::Title)
        .captures(line.trim())
        .map(|caps| caps.name("rest").map_or("", |m| m.as_str()).trim().to_string())
}

/// Parse a decision line into its choice text and target id.
pub fn decision(line: &str) -> Option<Decision> {
    let caps = regex_for(Marker::Decision).captures(line.trim())?;
    let text = caps.name("text")?.as_str().trim();
    let text = text.trim_end_matches(&['.', ',', ';', ':'][..]).trim_end();
    let target = caps.name("target")?.as_str();
    if text.is_empty() {
        return None;
    }
    Some(Decision::new(text, target))
}

/// Text that follows an `Ending:` marker on the same line, if any.
pub fn inline_ending_text(line: &str) -> Option<String> {
    regex_for(Marker::EndingMarker)
        .captures(line.trim())
        .and_then(|caps| caps.name("rest"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Node ids are restricted to ASCII letters, digits and underscores.
pub fn is_node_id(candidate: &str) -> bool {
    NODE_ID.is_match(candidate)
}

/// Split a legacy blob on `Node ID:` boundary lines. The blob must start
/// with a newline for its first node to be split uniformly.
pub fn split_node_segments(text: &str) -> Vec<&str> {
    NODE_BOUNDARY
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

/// Whether generated text is a failure placeholder.
pub fn is_failure_sentinel(text: &str) -> bool {
    let text = text.trim_start();
    FAILURE_SENTINELS.iter().any(|prefix| text.starts_with(prefix))
}
