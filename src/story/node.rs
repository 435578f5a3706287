use serde::{Deserialize, Serialize};

/// Shown when an ending node has no recoverable text of its own.
pub const FALLBACK_ENDING_TEXT: &str = "The story concludes here.";

/// A labeled choice pointing at another node's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// The text presented to the reader for this choice.
    pub text: String,
    /// Target node id. Not guaranteed to exist in the graph.
    pub next_node_id: String,
}

impl Decision {
    pub fn new(text: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
        }
    }
}

/// How a node came to be terminal. Diagnostic only, never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndingKind {
    /// Not an ending.
    #[default]
    None,
    /// Declared by the structure, or introduced by an ending marker in prose.
    Explicit,
    /// No decisions and no ending marker could be recovered from the text.
    Implicit,
    /// Upstream content generation failed for this node.
    Failed,
}

/// A single page of the interactive story.
///
/// Exactly one of `narrative_body` + `decisions` or `ending_text` is
/// meaningful, gated by `is_ending`. The constructors keep that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: String,
    pub title: String,
    pub narrative_body: String,
    pub decisions: Vec<Decision>,
    pub is_ending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_text: Option<String>,
    #[serde(skip)]
    pub ending_kind: EndingKind,
}

impl StoryNode {
    /// A non-terminal page.
    pub fn page(
        id: impl Into<String>,
        title: impl Into<String>,
        narrative_body: impl Into<String>,
        decisions: Vec<Decision>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            narrative_body: narrative_body.into(),
            decisions,
            is_ending: false,
            ending_text: None,
            ending_kind: EndingKind::None,
        }
    }

    /// A terminal page. Blank ending text is replaced by the generic closing line.
    pub fn ending(
        id: impl Into<String>,
        title: impl Into<String>,
        ending_text: impl Into<String>,
        kind: EndingKind,
    ) -> Self {
        let text: String = ending_text.into();
        let text = if text.trim().is_empty() {
            FALLBACK_ENDING_TEXT.to_string()
        } else {
            text
        };
        Self {
            id: id.into(),
            title: title.into(),
            narrative_body: String::new(),
            decisions: Vec::new(),
            is_ending: true,
            ending_text: Some(text),
            ending_kind: if kind == EndingKind::None {
                EndingKind::Explicit
            } else {
                kind
            },
        }
    }

    /// The text a reader sees on this page.
    pub fn display_text(&self) -> &str {
        match (&self.ending_text, self.is_ending) {
            (Some(text), true) => text,
            _ => &self.narrative_body,
        }
    }

    /// A non-ending page with nowhere to go.
    pub fn is_dead_end(&self) -> bool {
        !self.is_ending && self.decisions.is_empty()
    }
}

/// Synthesize a heading from a node id: underscores become spaces and the
/// first letter of every word is capitalized (`forest_path_a` -> `Forest Path A`).
pub fn title_from_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut prev_is_word = false;
    for c in id.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}
