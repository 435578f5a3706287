//! Session-scoped key-value storage for raw story payloads.
//!
//! The parser never reads global state: callers load the payloads from a
//! [`SessionStore`] and hand them over as [`StoryInputs`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};

use crate::story::{reconstruct_graph, ParsedStory, StoryInputs};

/// Generated content map: JSON object of node-id -> narrative text.
pub const FULL_STORY_CONTENT: &str = "full_story_content";
/// Declared outline: JSON `{nodes, startNodeId}`.
pub const STORY_STRUCTURE: &str = "story_structure";
/// Legacy single-blob story (plain text or JSON map).
pub const CURRENT_STORY: &str = "current_story";
/// Start node chosen when the story was generated.
pub const START_NODE_ID: &str = "start_node_id";

pub const STORY_KEYS: [&str; 4] = [FULL_STORY_CONTENT, STORY_STRUCTURE, CURRENT_STORY, START_NODE_ID];

/// An opaque key-value store that lives for one reading session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory session, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// A session kept in a directory, one `<key>.txt` file per key.
#[derive(Debug, Clone)]
pub struct DirSession {
    root: PathBuf,
}

impl DirSession {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("session directory '{}' does not exist", root.display());
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.txt"))
    }
}

impl SessionStore for DirSession {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read session key '{key}' from {}: {e}", path.display());
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Gather every story payload present in the session. Blank values count
/// as absent.
pub fn load_inputs(session: &dyn SessionStore) -> StoryInputs {
    let inputs = StoryInputs {
        content: non_blank(session.get(FULL_STORY_CONTENT)),
        structure: non_blank(session.get(STORY_STRUCTURE)),
        legacy: non_blank(session.get(CURRENT_STORY)),
        stored_start_id: non_blank(session.get(START_NODE_ID)).map(|s| s.trim().to_string()),
    };
    debug!(
        "Session payloads: content={}, structure={}, legacy={}, start={:?}",
        inputs.content.is_some(),
        inputs.structure.is_some(),
        inputs.legacy.is_some(),
        inputs.stored_start_id
    );
    inputs
}

/// Load and reconstruct the story held by a session.
pub fn load_story(session: &dyn SessionStore) -> ParsedStory {
    reconstruct_graph(&load_inputs(session))
}

/// Forget the current story, so the next one starts clean.
pub fn clear_story(session: &mut dyn SessionStore) -> Result<()> {
    for key in STORY_KEYS {
        session.remove(key)?;
    }
    Ok(())
}
