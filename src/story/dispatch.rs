use anyhow::Result;
use log::{debug, error, info, trace, warn};

use crate::story::graph::{Format, ParsedStory, StoryGraph};
use crate::story::legacy;
use crate::story::start::resolve_start;
use crate::story::structured::{self, DeclaredStructure};

/// The raw payloads a caller has on hand. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryInputs {
    /// Generated content map JSON (node-id -> narrative text).
    pub content: Option<String>,
    /// Declared structure JSON (`{nodes, startNodeId}`).
    pub structure: Option<String>,
    /// Legacy blob: a JSON map of node-id -> raw text, or plain text.
    pub legacy: Option<String>,
    /// Start id remembered by the caller's session.
    pub stored_start_id: Option<String>,
}

impl StoryInputs {
    pub fn structured(content: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            structure: Some(structure.into()),
            ..Self::default()
        }
    }

    pub fn legacy(blob: impl Into<String>) -> Self {
        Self {
            legacy: Some(blob.into()),
            ..Self::default()
        }
    }
}

/// Strategies in the order they are tried.
const FALLBACK_CHAIN: [Format; 3] = [Format::Structured, Format::LegacyJsonMap, Format::LegacyText];

impl Format {
    /// Try this strategy. `None` means its inputs are absent; `Some(Err)`
    /// means they are present but unusable.
    fn attempt(self, inputs: &StoryInputs) -> Option<Result<(StoryGraph, Option<String>)>> {
        match self {
            Format::Structured => {
                let content = inputs.content.as_deref()?;
                let structure = inputs.structure.as_deref()?;
                Some(reconstruct_structured(content, structure))
            }
            Format::LegacyJsonMap => {
                let blob = inputs.legacy.as_deref()?;
                Some(legacy::from_json_map(blob).map(|s| (s.graph, s.candidate_start)))
            }
            Format::LegacyText => {
                let blob = inputs.legacy.as_deref()?;
                Some(legacy::from_plain_text(blob).map(|s| (s.graph, s.candidate_start)))
            }
        }
    }
}

fn reconstruct_structured(content: &str, structure: &str) -> Result<(StoryGraph, Option<String>)> {
    let structure = DeclaredStructure::from_json(structure)?;
    let content = structured::parse_content_map(content)?;
    let graph = structured::reconstruct(&structure, &content);
    Ok((graph, Some(structure.start_node_id)))
}

/// Recover a story graph from whichever payloads are present.
///
/// Strategies are tried in order (structured, legacy JSON map, legacy
/// text); a failing strategy is logged and the next one is tried. Never
/// fails: if nothing works the result is empty with no start node.
pub fn reconstruct_graph(inputs: &StoryInputs) -> ParsedStory {
    trace!("Reconstructing story from inputs: {inputs:?}");

    for format in FALLBACK_CHAIN {
        let (graph, candidate) = match format.attempt(inputs) {
            None => {
                debug!("Skipping {format} strategy: inputs not present");
                continue;
            }
            Some(Err(e)) => {
                warn!("{format} strategy failed, trying next: {e:#}");
                continue;
            }
            Some(Ok(result)) => result,
        };

        let Some(start) = resolve_start(
            candidate.as_deref(),
            &graph,
            inputs.stored_start_id.as_deref(),
        ) else {
            warn!("{format} strategy produced an empty graph, trying next");
            continue;
        };

        for (from, to) in graph.dangling_targets() {
            warn!("Node '{from}' has a decision leading to missing node '{to}'");
        }
        info!(
            "Parsed story using {format} strategy ({}), starting at '{start}'",
            graph.stats()
        );
        return ParsedStory {
            graph,
            start_node_id: Some(start),
            format: Some(format),
        };
    }

    error!("No valid story content could be parsed from the provided inputs");
    ParsedStory::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::node::{Decision, EndingKind};

    const STRUCTURE_B: &str = r#"{
        "nodes": [
            {"id": "a", "isEnding": false, "decisions": [{"text": "Go", "nextNodeId": "b"}]},
            {"id": "b", "isEnding": true}
        ],
        "startNodeId": "a"
    }"#;

    #[test]
    fn test_scenario_a_legacy_plain_text() {
        let blob = "Node ID: start\nBrief Title: Begin\nYou wake up.\n\
                    1. Go left. Go to page left_room\n2. Go right. Go to page right_room\n\
                    Node ID: left_room\nBrief Title: A Room\nEmpty room.\nEnding:\nYou found nothing.";
        let story = reconstruct_graph(&StoryInputs::legacy(blob));
        assert_eq!(story.format, Some(Format::LegacyText));
        assert_eq!(story.graph.len(), 2);
        assert_eq!(story.start_node_id.as_deref(), Some("start"));

        let start = story.graph.get("start").unwrap();
        let targets: Vec<_> = start.decisions.iter().map(|d| d.next_node_id.as_str()).collect();
        assert_eq!(targets, vec!["left_room", "right_room"]);

        let left = story.graph.get("left_room").unwrap();
        assert!(left.is_ending);
        assert_eq!(left.ending_text.as_deref(), Some("You found nothing."));
    }

    #[test]
    fn test_scenario_b_structured() {
        let story = reconstruct_graph(&StoryInputs::structured(
            r#"{"a": "Text A", "b": "Text B"}"#,
            STRUCTURE_B,
        ));
        assert_eq!(story.format, Some(Format::Structured));
        assert_eq!(story.start_node_id.as_deref(), Some("a"));
        let a = story.graph.get("a").unwrap();
        assert_eq!(a.narrative_body, "Text A");
        assert_eq!(a.decisions, vec![Decision::new("Go", "b")]);
        let b = story.graph.get("b").unwrap();
        assert_eq!(b.ending_text.as_deref(), Some("Text B"));
    }

    #[test]
    fn test_ending_with_null_decisions_stays_structured() {
        let structure = r#"{"nodes": [
            {"id": "a", "isEnding": false, "decisions": [{"text": "Go", "nextNodeId": "b"}]},
            {"id": "b", "isEnding": true, "decisions": null}
        ], "startNodeId": "a"}"#;
        let story = reconstruct_graph(&StoryInputs::structured(
            r#"{"a": "Text A", "b": "Text B"}"#,
            structure,
        ));
        assert_eq!(story.format, Some(Format::Structured));
        assert_eq!(story.graph.len(), 2);
        assert_eq!(story.start_node_id.as_deref(), Some("a"));
        assert!(story.graph.get("b").unwrap().is_ending);
    }

    #[test]
    fn test_scenario_c_missing_content() {
        let story = reconstruct_graph(&StoryInputs::structured(r#"{"a": "Text A"}"#, STRUCTURE_B));
        let b = story.graph.get("b").unwrap();
        assert!(b.is_ending);
        assert!(b.ending_text.as_deref().unwrap().contains("Content missing for node b"));
    }

    #[test]
    fn test_scenario_d_legacy_json_the_end() {
        let story = reconstruct_graph(&StoryInputs::legacy(
            r#"{"x": "Brief Title: X\nSome text.\nThe end."}"#,
        ));
        assert_eq!(story.format, Some(Format::LegacyJsonMap));
        let x = story.graph.get("x").unwrap();
        assert!(x.is_ending);
        assert_eq!(x.title, "X");
        assert_eq!(story.start_node_id.as_deref(), Some("x"));
    }

    #[test]
    fn test_failed_node_becomes_dead_end() {
        let story = reconstruct_graph(&StoryInputs::structured(
            r#"{"a": "[Content generation failed: X]", "b": "Text B"}"#,
            STRUCTURE_B,
        ));
        let a = story.graph.get("a").unwrap();
        assert!(a.is_ending);
        assert!(a.decisions.is_empty());
        assert_eq!(a.ending_kind, EndingKind::Failed);
    }

    #[test]
    fn test_structured_parse_is_repeatable() {
        let inputs = StoryInputs::structured(r#"{"a": "Text A", "b": "Text B"}"#, STRUCTURE_B);
        let first = reconstruct_graph(&inputs);
        let second = reconstruct_graph(&inputs);
        assert_eq!(first, second);
        assert_eq!(
            first.graph.ids().collect::<Vec<_>>(),
            second.graph.ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_broken_structure_falls_through_to_legacy() {
        let inputs = StoryInputs {
            content: Some(r#"{"a": "Text A"}"#.to_string()),
            structure: Some(r#"{"nodes": [], "startNodeId": "a"}"#.to_string()),
            legacy: Some("Node ID: old\nOld text.\nThe end.".to_string()),
            stored_start_id: None,
        };
        let story = reconstruct_graph(&inputs);
        assert_eq!(story.format, Some(Format::LegacyText));
        assert_eq!(story.start_node_id.as_deref(), Some("old"));
    }

    #[test]
    fn test_stored_start_overrides_candidate() {
        let mut inputs = StoryInputs::structured(r#"{"a": "Text A", "b": "Text B"}"#, STRUCTURE_B);
        inputs.stored_start_id = Some("b".to_string());
        assert_eq!(reconstruct_graph(&inputs).start_node_id.as_deref(), Some("b"));

        inputs.stored_start_id = Some("gone".to_string());
        assert_eq!(reconstruct_graph(&inputs).start_node_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_nothing_usable_yields_empty_story() {
        let empty = reconstruct_graph(&StoryInputs::default());
        assert!(empty.is_empty());
        assert_eq!(empty.start_node_id, None);
        assert_eq!(empty.format, None);

        let garbage = reconstruct_graph(&StoryInputs::legacy("no markers at all"));
        assert!(garbage.is_empty());
    }
}
