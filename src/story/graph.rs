use std::collections::{HashMap, HashSet};

use crate::story::node::{EndingKind, StoryNode};

/// Which reconstruction strategy produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Declared structure merged with a generated content map.
    Structured,
    /// Legacy JSON map of node-id -> raw node text.
    LegacyJsonMap,
    /// Legacy plain text split on `Node ID:` lines.
    LegacyText,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Structured => "structured",
            Format::LegacyJsonMap => "legacy-json-map",
            Format::LegacyText => "legacy-text",
        };
        f.write_str(name)
    }
}

/// The full story: a map of node-id -> StoryNode that remembers insertion
/// order, so "first node" fallbacks are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryGraph {
    nodes: HashMap<String, StoryNode>,
    order: Vec<String>,
}

impl StoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node keyed by its id. Re-inserting an id replaces the node
    /// but keeps its original position. Returns the replaced node, if any.
    pub fn insert(&mut self, node: StoryNode) -> Option<StoryNode> {
        let id = node.id.clone();
        let previous = self.nodes.insert(id.clone(), node);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<&StoryNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The first id inserted, if any.
    pub fn first_id(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StoryNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// `(from, to)` pairs for every decision whose target is not a node.
    pub fn dangling_targets(&self) -> Vec<(String, String)> {
        self.iter()
            .flat_map(|node| {
                node.decisions
                    .iter()
                    .filter(|d| !self.contains(&d.next_node_id))
                    .map(|d| (node.id.clone(), d.next_node_id.clone()))
            })
            .collect()
    }

    /// Count the number of non-ending nodes on the longest path from `start`
    /// (i.e. the maximum number of choices a reader can make). A decision
    /// leading back onto the current path counts for nothing, and each node
    /// is measured once.
    pub fn longest_path(&self, start: &str) -> usize {
        let mut on_path = HashSet::new();
        let mut memo = HashMap::new();
        self.longest_path_from(start, &mut on_path, &mut memo)
    }

    fn longest_path_from<'a>(
        &'a self,
        node_id: &'a str,
        on_path: &mut HashSet<&'a str>,
        memo: &mut HashMap<&'a str, usize>,
    ) -> usize {
        if let Some(&known) = memo.get(node_id) {
            return known;
        }
        let node = match self.nodes.get(node_id) {
            Some(n) => n,
            None => return 0,
        };
        if node.is_ending || !on_path.insert(node_id) {
            return 0;
        }
        let max_child = node
            .decisions
            .iter()
            .map(|d| self.longest_path_from(d.next_node_id.as_str(), on_path, memo))
            .max()
            .unwrap_or(0);
        on_path.remove(node_id);
        memo.insert(node_id, 1 + max_child);
        1 + max_child
    }

    pub fn stats(&self) -> ParseStats {
        let mut stats = ParseStats {
            nodes: self.len(),
            ..ParseStats::default()
        };
        for node in self.iter() {
            stats.decisions += node.decisions.len();
            match node.ending_kind {
                EndingKind::None => {}
                EndingKind::Explicit => stats.explicit_endings += 1,
                EndingKind::Implicit => stats.implicit_endings += 1,
                EndingKind::Failed => stats.failed_nodes += 1,
            }
        }
        stats.dangling_targets = self.dangling_targets().len();
        stats
    }
}

/// Quality counters for one parse, so explicit and inferred endings can be
/// told apart when monitoring generator output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub nodes: usize,
    pub decisions: usize,
    pub explicit_endings: usize,
    pub implicit_endings: usize,
    pub failed_nodes: usize,
    pub dangling_targets: usize,
}

impl std::fmt::Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} decisions, {} explicit endings, {} implicit endings, {} failed, {} dangling targets",
            self.nodes,
            self.decisions,
            self.explicit_endings,
            self.implicit_endings,
            self.failed_nodes,
            self.dangling_targets
        )
    }
}

/// Result of one parse: the graph, the validated entry point, and the
/// strategy that produced it. `start_node_id` is `None` only when the graph
/// is empty, which callers must treat as corrupted story data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStory {
    pub graph: StoryGraph,
    pub start_node_id: Option<String>,
    pub format: Option<Format>,
}

impl ParsedStory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty() || self.start_node_id.is_none()
    }

    pub fn start_node(&self) -> Option<&StoryNode> {
        self.start_node_id.as_deref().and_then(|id| self.graph.get(id))
    }
}
