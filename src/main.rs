use std::io;

use anyhow::{Context, Result};
use log::{info, warn};

use tales::reader::{self, ReaderConfig};
use tales::session::{self, DirSession, SessionStore, STORY_STRUCTURE};
use tales::story::{render_outline, DeclaredStructure};

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   tales ./session   # chosen strategy + transitions
    //   RUST_LOG=debug  tales ./session   # + per-node extraction results
    //   RUST_LOG=trace  tales ./session   # + raw payloads
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ReaderConfig::from_args(&args)?;

    let session = DirSession::open(&config.session_dir).context("failed to open session")?;
    info!("Loading story from {}", config.session_dir.display());

    if config.show_outline {
        match session.get(STORY_STRUCTURE).map(|raw| DeclaredStructure::from_json(&raw)) {
            Some(Ok(structure)) => render_outline(&structure, &mut io::stdout())?,
            Some(Err(e)) => warn!("Cannot show outline: {e:#}"),
            None => warn!("Cannot show outline: session has no story structure"),
        }
    }

    let story = session::load_story(&session);
    if story.is_empty() {
        anyhow::bail!(
            "Failed to parse the story content. The story data might be corrupted or empty. \
             Please try generating it again."
        );
    }

    if config.show_stats {
        println!("Format     : {}", story.format.map_or("none".to_string(), |f| f.to_string()));
        println!("Start node : {}", story.start_node_id.as_deref().unwrap_or("-"));
        println!("Stats      : {}", story.graph.stats());
    }

    reader::run(&story)
}
