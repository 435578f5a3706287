use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::story::graph::StoryGraph;
use crate::story::markers;
use crate::story::node::{title_from_id, Decision, EndingKind, StoryNode};
use crate::story::payload;

/// One node of the outline produced by the structure-generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredNode {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<Decision>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_ending: bool,
}

/// Outline generators write `null` for fields they leave out.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The machine-readable outline: authoritative for decisions and endings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredStructure {
    pub nodes: Vec<DeclaredNode>,
    pub start_node_id: String,
}

impl DeclaredStructure {
    /// Parse an outline payload, tolerating model wrappers around the JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value = payload::parse_json(raw, true).context("story structure is not JSON")?;
        let structure: DeclaredStructure =
            serde_json::from_value(value).context("story structure has the wrong shape")?;
        structure.validate()
    }

    /// Reject empty outlines. A start id that names no declared node is
    /// repaired to the first declared node.
    pub fn validate(mut self) -> Result<Self> {
        if self.nodes.is_empty() {
            bail!("story structure declares no nodes");
        }
        if self.start_node_id.trim().is_empty() {
            bail!("story structure declares no start node");
        }
        if !self.nodes.iter().any(|n| n.id == self.start_node_id) {
            let first = self.nodes[0].id.clone();
            warn!(
                "Declared start node '{}' is not in the outline; using first node '{}'",
                self.start_node_id, first
            );
            self.start_node_id = first;
        }
        Ok(self)
    }
}

/// Parse a generated-content payload: a JSON object of node-id -> text.
pub fn parse_content_map(raw: &str) -> Result<Map<String, Value>> {
    match payload::parse_json(raw, true).context("generated content is not JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!(
            "generated content must be a JSON object, got {}",
            json_kind(&other)
        ),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Placeholder narrative for a declared node that has no generated text.
pub fn missing_content_placeholder(node: &DeclaredNode) -> String {
    format!(
        "[Content missing for node {}. Summary: {}]",
        node.id, node.summary
    )
}

/// Merge the declared outline with per-node generated text.
///
/// Decisions and ending flags come straight from the outline; generated
/// text is never parsed. A node whose text is a failure sentinel becomes a
/// dead end instead of offering choices into content that was never written.
pub fn reconstruct(structure: &DeclaredStructure, content: &Map<String, Value>) -> StoryGraph {
    let mut graph = StoryGraph::new();
    let mut seen = HashSet::new();

    for declared in &structure.nodes {
        if !seen.insert(declared.id.as_str()) {
            warn!("Duplicate declared node '{}'; later entry wins", declared.id);
        }

        let text = match content.get(&declared.id) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => {
                warn!("No generated content for node '{}'", declared.id);
                missing_content_placeholder(declared)
            }
            Some(other) => {
                warn!(
                    "Generated content for node '{}' is {}, not text",
                    declared.id,
                    json_kind(other)
                );
                missing_content_placeholder(declared)
            }
        };

        let title = if declared.title.trim().is_empty() {
            title_from_id(&declared.id)
        } else {
            declared.title.clone()
        };

        let node = if markers::is_failure_sentinel(&text) {
            warn!(
                "Content generation failed for node '{}'; treating it as an ending",
                declared.id
            );
            StoryNode::ending(&declared.id, title, text, EndingKind::Failed)
        } else if declared.is_ending {
            StoryNode::ending(&declared.id, title, text, EndingKind::Explicit)
        } else {
            StoryNode::page(&declared.id, title, text, declared.decisions.clone())
        };
        debug!(
            "Structured node '{}': ending={}, {} decisions",
            node.id,
            node.is_ending,
            node.decisions.len()
        );
        graph.insert(node);
    }

    info!(
        "Reconstructed {} nodes from declared structure",
        graph.len()
    );
    graph
}
