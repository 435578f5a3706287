use log::{debug, trace};

use crate::story::markers::{self, Marker};
use crate::story::node::{title_from_id, EndingKind, StoryNode};

/// Where the narrative stops in a node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// A decision line or decision-section header at this index.
    Decisions(usize),
    /// An `Ending:` line or `--- THE END ---` banner at this index.
    EndingMarker(usize),
    /// A prose line containing "the end." at this index.
    EndingPhrase(usize),
    /// Nothing recognisable; the whole text is narrative.
    None,
}

fn find_boundary(lines: &[&str]) -> Boundary {
    for (i, line) in lines.iter().enumerate() {
        match markers::classify(line) {
            Some(Marker::Decision) | Some(Marker::DecisionHeader) => return Boundary::Decisions(i),
            Some(Marker::EndingMarker) => return Boundary::EndingMarker(i),
            Some(Marker::EndingPhrase) => return Boundary::EndingPhrase(i),
            _ => {}
        }
    }
    Boundary::None
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

/// Recover a node from the raw text the generator produced for it.
///
/// Never fails: a missing title is synthesized from `id`, unparseable lines
/// are kept as prose, and text with neither decisions nor an ending marker
/// becomes an implicit ending.
pub fn extract_node(id: &str, raw_text: &str) -> StoryNode {
    trace!("Extracting node '{id}' from:\n{raw_text}");
    let lines: Vec<&str> = raw_text.lines().collect();

    let title_idx = lines
        .iter()
        .position(|line| markers::classify(line) == Some(Marker::Title));
    let title = title_idx
        .and_then(|i| markers::title(lines[i]))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_id(id));

    let content: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| {
            Some(*i) != title_idx
                && !matches!(
                    markers::classify(line),
                    Some(Marker::Title) | Some(Marker::Metadata)
                )
        })
        .map(|(_, line)| *line)
        .collect();

    let boundary = find_boundary(&content);
    debug!("Node '{id}': {} content lines, boundary {boundary:?}", content.len());

    match boundary {
        Boundary::EndingMarker(at) => {
            let mut ending = markers::inline_ending_text(content[at]).unwrap_or_default();
            let following = join_trimmed(&content[at + 1..]);
            if !following.is_empty() {
                if !ending.is_empty() {
                    ending.push('\n');
                }
                ending.push_str(&following);
            }
            if ending.is_empty() {
                ending = join_trimmed(&content[..at]);
            }
            StoryNode::ending(id, title, ending, EndingKind::Explicit)
        }
        Boundary::EndingPhrase(at) => {
            // Only a lone phrase line keeps itself as the ending text.
            let mut ending = join_trimmed(&content[at + 1..]);
            if ending.is_empty() {
                ending = join_trimmed(&content[..at]);
            }
            if ending.is_empty() {
                ending = content[at].trim().to_string();
            }
            StoryNode::ending(id, title, ending, EndingKind::Explicit)
        }
        Boundary::Decisions(at) => {
            let narrative = join_trimmed(&content[..at]);
            let decisions: Vec<_> = content[at..]
                .iter()
                .filter_map(|line| markers::decision(line))
                .collect();
            if decisions.is_empty() {
                debug!("Node '{id}' has a decision section but no parseable decisions");
            }
            StoryNode::page(id, title, narrative, decisions)
        }
        Boundary::None => {
            debug!("Node '{id}' has no decisions or ending marker; treating as implicit ending");
            StoryNode::ending(id, title, join_trimmed(&content), EndingKind::Implicit)
        }
    }
}
