use log::{debug, warn};

use crate::session::{SessionStore, START_NODE_ID};
use crate::story::graph::StoryGraph;

/// Pick the entry point of a reconstructed graph.
///
/// Precedence: an id stored by the caller's session, then the candidate
/// proposed by the reconstructor, then the first node inserted. Each is
/// used only if it names a node in `graph`. `None` means the graph is empty.
pub fn resolve_start(
    candidate: Option<&str>,
    graph: &StoryGraph,
    stored: Option<&str>,
) -> Option<String> {
    if let Some(stored) = stored {
        if graph.contains(stored) {
            debug!("Using stored start node '{stored}'");
            return Some(stored.to_string());
        }
        warn!("Stored start node '{stored}' is not in the story");
    }

    if let Some(candidate) = candidate {
        if graph.contains(candidate) {
            return Some(candidate.to_string());
        }
        warn!("Proposed start node '{candidate}' is not in the story");
    }

    let first = graph.first_id().map(str::to_string);
    if let Some(first) = &first {
        warn!("Falling back to first node '{first}' as the start");
    }
    first
}

/// [`resolve_start`] with the stored id looked up in a session store.
pub fn resolve_start_with(
    candidate: Option<&str>,
    graph: &StoryGraph,
    session: &dyn SessionStore,
) -> Option<String> {
    let stored = session.get(START_NODE_ID);
    resolve_start(candidate, graph, stored.as_deref().map(str::trim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use crate::story::node::{EndingKind, StoryNode};

    fn graph(ids: &[&str]) -> StoryGraph {
        let mut graph = StoryGraph::new();
        for id in ids {
            graph.insert(StoryNode::ending(*id, *id, "done", EndingKind::Explicit));
        }
        graph
    }

    #[test]
    fn test_stored_id_wins_when_valid() {
        let g = graph(&["a", "b", "c"]);
        assert_eq!(resolve_start(Some("b"), &g, Some("c")).as_deref(), Some("c"));
        assert_eq!(resolve_start(Some("b"), &g, Some("zzz")).as_deref(), Some("b"));
    }

    #[test]
    fn test_falls_back_to_first_inserted() {
        let g = graph(&["q", "a"]);
        assert_eq!(resolve_start(Some("missing"), &g, None).as_deref(), Some("q"));
        assert_eq!(resolve_start(None, &g, Some("nope")).as_deref(), Some("q"));
    }

    #[test]
    fn test_empty_graph_has_no_start() {
        assert_eq!(resolve_start(Some("a"), &StoryGraph::new(), Some("a")), None);
    }

    #[test]
    fn test_resolve_with_session_lookup() {
        let g = graph(&["a", "b"]);
        let mut session = MemorySession::new();
        assert_eq!(resolve_start_with(Some("a"), &g, &session).as_deref(), Some("a"));
        session.set(START_NODE_ID, " b\n".to_string()).unwrap();
        assert_eq!(resolve_start_with(Some("a"), &g, &session).as_deref(), Some("b"));
    }
}
