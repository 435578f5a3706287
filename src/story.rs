//! Recovering a navigable story graph from generator output.
//!
//! Three input conventions are supported: a declared outline plus a
//! generated content map, a legacy JSON map of node-id -> raw text, and
//! legacy plain text with `Node ID:` lines. [`reconstruct_graph`] tries them
//! in that order.

pub mod dispatch;
pub mod extract;
pub mod graph;
pub mod legacy;
pub mod markers;
pub mod node;
pub mod outline;
pub mod payload;
pub mod start;
pub mod structured;

pub use dispatch::{reconstruct_graph, StoryInputs};
pub use extract::extract_node;
pub use graph::{Format, ParseStats, ParsedStory, StoryGraph};
pub use node::{title_from_id, Decision, EndingKind, StoryNode};
pub use outline::render_outline;
pub use start::{resolve_start, resolve_start_with};
pub use structured::{DeclaredNode, DeclaredStructure};
