use anyhow::{bail, Result};
use log::{debug, info, warn};
use serde_json::Value;

use crate::story::extract::extract_node;
use crate::story::graph::StoryGraph;
use crate::story::markers::{self, NODE_ID_MARKER};
use crate::story::payload;
use crate::story::structured::json_kind;

/// A graph recovered from a legacy blob, plus the id it would start at.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyStory {
    pub graph: StoryGraph,
    pub candidate_start: Option<String>,
}

/// Parse a legacy blob as a JSON object of node-id -> raw node text.
///
/// Fails when the blob is not a JSON object or yields no nodes, so the
/// caller can fall through to plain-text splitting.
pub fn from_json_map(blob: &str) -> Result<LegacyStory> {
    let map = match payload::parse_json(blob, false)? {
        Value::Object(map) => map,
        other => bail!("legacy blob is {}, not a JSON object", json_kind(&other)),
    };

    let mut graph = StoryGraph::new();
    for (id, value) in &map {
        match value {
            Value::String(text) => {
                if graph.insert(extract_node(id, text)).is_some() {
                    warn!("Duplicate legacy node '{id}'; later entry wins");
                }
            }
            other => warn!("Skipping legacy node '{id}': value is {}", json_kind(other)),
        }
    }

    if graph.is_empty() {
        bail!("legacy JSON map contains no text nodes");
    }
    let candidate_start = graph.first_id().map(str::to_string);
    info!("Parsed {} nodes from legacy JSON map", graph.len());
    Ok(LegacyStory {
        graph,
        candidate_start,
    })
}

/// Split a legacy plain-text blob into nodes on `Node ID:` lines and run
/// the prose extractor on each segment.
///
/// Text before the first marker is discarded as preamble. Segments with a
/// malformed id line are skipped with a warning rather than aborting.
pub fn from_plain_text(blob: &str) -> Result<LegacyStory> {
    let mut text = blob.trim();
    if !text.starts_with(NODE_ID_MARKER) {
        match text.find(NODE_ID_MARKER) {
            Some(offset) => {
                debug!("Discarding {offset} bytes of preamble before first '{NODE_ID_MARKER}'");
                text = &text[offset..];
            }
            None => bail!("no '{NODE_ID_MARKER}' found in the story text"),
        }
    }
    let text = format!("\n{text}");

    let segments = markers::split_node_segments(&text);
    let mut graph = StoryGraph::new();
    let mut candidate_start = None;

    for (i, segment) in segments.into_iter().enumerate() {
        let (id_line, body) = segment.split_once('\n').unwrap_or((segment, ""));
        let id = id_line.trim();
        if id.is_empty() {
            warn!("Skipping legacy segment {}: empty id line", i + 1);
            continue;
        }
        if !markers::is_node_id(id) {
            warn!("Skipping legacy segment {}: id \"{id}\" contains invalid characters", i + 1);
            continue;
        }
        if graph.insert(extract_node(id, body)).is_some() {
            warn!("Duplicate legacy node '{id}'; later segment wins");
        }
        if candidate_start.is_none() {
            candidate_start = Some(id.to_string());
        }
    }

    if graph.is_empty() {
        bail!("no valid node segments found after splitting on '{NODE_ID_MARKER}'");
    }
    info!("Parsed {} nodes from legacy story text", graph.len());
    Ok(LegacyStory {
        graph,
        candidate_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_map_keeps_key_order() {
        let story = from_json_map(r#"{"zeta": "Z.\n1. On. Go to page alpha", "alpha": "The end."}"#).unwrap();
        assert_eq!(story.graph.ids().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(story.candidate_start.as_deref(), Some("zeta"));
        assert!(story.graph.get("alpha").unwrap().is_ending);
    }

    #[test]
    fn test_json_map_skips_non_text_values() {
        let story = from_json_map(r#"{"bad": 3, "good": "Text.\n- On -> bad"}"#).unwrap();
        assert_eq!(story.graph.len(), 1);
        assert_eq!(story.candidate_start.as_deref(), Some("good"));
    }

    #[test]
    fn test_json_map_rejects_other_shapes() {
        assert!(from_json_map(r#"["a", "b"]"#).is_err());
        assert!(from_json_map(r#""Node ID: a""#).is_err());
        assert!(from_json_map(r#"{"a": 1}"#).is_err());
        assert!(from_json_map("Node ID: a\nText").is_err());
    }

    #[test]
    fn test_plain_text_discards_preamble() {
        let blob = "Here is your story!\n\nNode ID: first\nBrief Title: One\nHello.\n1. Next. Go to page second\nNode ID: second\nBye.\n--- THE END ---";
        let story = from_plain_text(blob).unwrap();
        assert_eq!(story.graph.len(), 2);
        assert_eq!(story.candidate_start.as_deref(), Some("first"));
        assert_eq!(story.graph.get("first").unwrap().title, "One");
        assert_eq!(story.graph.get("second").unwrap().ending_text.as_deref(), Some("Bye."));
    }

    #[test]
    fn test_plain_text_skips_bad_ids() {
        // The bare marker takes "Orphan." from the next line as its id.
        let blob = "Node ID: bad id!\nText.\nNode ID:\nOrphan.\nNode ID: good_one\nThe end.";
        let story = from_plain_text(blob).unwrap();
        assert_eq!(story.graph.ids().collect::<Vec<_>>(), vec!["good_one"]);
        assert_eq!(story.candidate_start.as_deref(), Some("good_one"));
    }

    #[test]
    fn test_plain_text_id_on_following_line() {
        let blob = "Node ID:\nstart\nHello.\n1. On. Go to page next\nNode ID:\r\n  next\r\nThe end.";
        let story = from_plain_text(blob).unwrap();
        assert_eq!(story.graph.ids().collect::<Vec<_>>(), vec!["start", "next"]);
        assert_eq!(story.candidate_start.as_deref(), Some("start"));
        let start = story.graph.get("start").unwrap();
        assert_eq!(start.narrative_body, "Hello.");
        assert_eq!(start.decisions[0].next_node_id, "next");
        assert!(story.graph.get("next").unwrap().is_ending);
    }

    #[test]
    fn test_plain_text_without_marker_fails() {
        assert!(from_plain_text("Once upon a time.").is_err());
        assert!(from_plain_text("   ").is_err());
        assert!(from_plain_text("Node ID: !!!").is_err());
    }

    #[test]
    fn test_plain_text_handles_crlf() {
        let blob = "Node ID: a\r\nStart.\r\n1. On. Go to page b\r\nNode ID: b\r\nThe end.";
        let story = from_plain_text(blob).unwrap();
        assert_eq!(story.graph.len(), 2);
        assert_eq!(story.graph.get("a").unwrap().decisions[0].next_node_id, "b");
    }
}
