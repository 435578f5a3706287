use std::io::Write;

use anyhow::Result;

use crate::story::structured::{DeclaredNode, DeclaredStructure};

fn badge(node: &DeclaredNode, start_node_id: &str) -> String {
    if node.id == start_node_id {
        "Start".to_string()
    } else if node.is_ending {
        "Ending".to_string()
    } else {
        let n = node.decisions.len();
        format!("{n} Choice{}", if n == 1 { "" } else { "s" })
    }
}

/// Print a declared outline for review before the narrative is generated.
pub fn render_outline(structure: &DeclaredStructure, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Story Nodes")?;
    writeln!(out, "-----------")?;
    for node in &structure.nodes {
        writeln!(
            out,
            "[{}] {} (ID: {})",
            badge(node, &structure.start_node_id),
            node.title,
            node.id
        )?;
        if !node.summary.is_empty() {
            writeln!(out, "    {}", node.summary)?;
        }
        if node.is_ending {
            writeln!(out, "    This is an ending node.")?;
        } else if node.decisions.is_empty() {
            writeln!(out, "    No choices here.")?;
        } else {
            writeln!(out, "    Decisions:")?;
            for decision in &node.decisions {
                writeln!(out, "      -> {} (To: {})", decision.text, decision.next_node_id)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_outline() {
        let structure = DeclaredStructure::from_json(
            r#"{"nodes": [
                {"id": "a", "title": "Alpha", "summary": "Begin.", "decisions": [{"text": "Go", "nextNodeId": "b"}]},
                {"id": "m", "title": "Middle", "decisions": [{"text": "On", "nextNodeId": "b"}]},
                {"id": "n", "title": "Nowhere"},
                {"id": "b", "title": "Omega", "isEnding": true}
            ], "startNodeId": "a"}"#,
        )
        .unwrap();
        let mut out = Vec::new();
        render_outline(&structure, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[Start] Alpha (ID: a)"));
        assert!(text.contains("      -> Go (To: b)"));
        assert!(text.contains("[1 Choice] Middle (ID: m)"));
        assert!(text.contains("[0 Choices] Nowhere (ID: n)\n    No choices here."));
        assert!(text.contains("[Ending] Omega (ID: b)\n    This is an ending node."));
    }
}
