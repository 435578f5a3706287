use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::story::{ParsedStory, StoryGraph, StoryNode};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const USAGE: &str = "\
Usage: tales <session-dir> [--outline] [--stats]

The session directory holds one file per payload:
  story_structure.txt     declared outline (JSON)
  full_story_content.txt  generated content map (JSON)
  current_story.txt       legacy story (plain text or JSON map)
  start_node_id.txt       optional start node override

Logging: set RUST_LOG=debug or RUST_LOG=trace for verbose output";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Directory holding the session payload files.
    pub session_dir: PathBuf,
    /// Print the declared outline before reading.
    pub show_outline: bool,
    /// Print parse diagnostics before reading.
    pub show_stats: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            session_dir: PathBuf::from("."),
            show_outline: false,
            show_stats: false,
        }
    }
}

impl ReaderConfig {
    /// Build a config from command-line arguments (without the program name).
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Self::default();
        let mut session_dir = None;
        for arg in args {
            match arg.as_str() {
                "--outline" => config.show_outline = true,
                "--stats" => config.show_stats = true,
                flag if flag.starts_with("--") => bail!("unknown flag '{flag}'\n\n{USAGE}"),
                path if session_dir.is_none() => session_dir = Some(PathBuf::from(path)),
                extra => bail!("unexpected argument '{extra}'\n\n{USAGE}"),
            }
        }
        config.session_dir = session_dir.context(USAGE)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// What happened after a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved to a page with further choices (or none).
    Moved(String),
    /// Moved to an ending.
    Ending(String),
    /// The choice points at a page that does not exist. Position unchanged.
    NotFound(String),
    /// No such choice on the current page.
    InvalidChoice,
}

/// Page-by-page position in a parsed story.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    graph: &'a StoryGraph,
    start: String,
    current: String,
    steps_taken: usize,
}

impl<'a> Reader<'a> {
    pub fn new(story: &'a ParsedStory) -> Result<Self> {
        let start = match (&story.start_node_id, story.graph.is_empty()) {
            (Some(start), false) if story.graph.contains(start) => start.clone(),
            _ => bail!("story data corrupted or empty, please regenerate the story"),
        };
        Ok(Self {
            graph: &story.graph,
            current: start.clone(),
            start,
            steps_taken: 0,
        })
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn current_node(&self) -> Option<&'a StoryNode> {
        self.graph.get(&self.current)
    }

    pub fn start_id(&self) -> &str {
        &self.start
    }

    /// Number of choices made since the last (re)start.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Follow the decision at `index` (0-based) on the current page.
    pub fn choose(&mut self, index: usize) -> Step {
        let Some(decision) = self
            .current_node()
            .filter(|node| !node.is_ending)
            .and_then(|node| node.decisions.get(index))
        else {
            return Step::InvalidChoice;
        };

        let target = decision.next_node_id.clone();
        match self.graph.get(&target) {
            Some(next) => {
                info!("Transition: {} -> {}", self.current, target);
                self.current = target.clone();
                self.steps_taken += 1;
                if next.is_ending {
                    Step::Ending(target)
                } else {
                    Step::Moved(target)
                }
            }
            None => {
                warn!("Decision on '{}' leads to missing node '{target}'", self.current);
                Step::NotFound(target)
            }
        }
    }

    pub fn jump_to_start(&mut self) {
        info!("Jumping to start node '{}'", self.start);
        self.current = self.start.clone();
    }

    pub fn restart(&mut self) {
        self.jump_to_start();
        self.steps_taken = 0;
    }
}

// ---------------------------------------------------------------------------
// Terminal screens
// ---------------------------------------------------------------------------

/// Outcome of a single reading.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadOutcome {
    /// Reader reached an ending or a page with no choices.
    Finished {
        node_id: String,
        is_ending: bool,
        steps_taken: usize,
        longest_path: usize,
    },
    /// Reader typed quit, or input ran out.
    Quit,
}

fn show_node(out: &mut impl Write, node: &StoryNode) -> Result<()> {
    writeln!(out, "\n=== {} ===", node.title)?;
    if node.is_ending {
        writeln!(out, "This is an ending!")?;
    }
    writeln!(out, "\n{}", node.display_text())?;
    if !node.is_ending && !node.decisions.is_empty() {
        writeln!(out, "\nWhat do you do?")?;
        for (i, decision) in node.decisions.iter().enumerate() {
            writeln!(out, "  [{}] {}", i + 1, decision.text)?;
        }
    }
    Ok(())
}

fn show_game_over(out: &mut impl Write, outcome: &ReadOutcome) -> Result<()> {
    writeln!(out, "\n========================================")?;
    writeln!(out, "             THE END")?;
    writeln!(out, "========================================")?;

    match outcome {
        ReadOutcome::Finished {
            node_id,
            is_ending,
            steps_taken,
            longest_path,
        } => {
            if !is_ending {
                writeln!(out, "  No choices remain on this page.")?;
            }
            writeln!(out, "  Choices made: {steps_taken} (longest path: {longest_path})")?;
            writeln!(out, "  Ended at: {node_id}")?;
        }
        ReadOutcome::Quit => {
            writeln!(out, "  You closed the book.")?;
        }
    }

    writeln!(out, "========================================\n")?;
    writeln!(out, "  [r] Restart    [q] Quit\n")?;
    Ok(())
}

/// Read one trimmed line. `None` on end of input.
fn read_line(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Read the reader's post-story choice. Returns `true` to restart.
fn prompt_restart(input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    loop {
        let Some(answer) = read_line(input, out, "> ")? else {
            return Ok(false);
        };
        match answer.to_lowercase().as_str() {
            "r" => return Ok(true),
            "q" => return Ok(false),
            _ => writeln!(out, "  Press [r] to restart or [q] to quit.")?,
        }
    }
}

// ---------------------------------------------------------------------------
// Single reading
// ---------------------------------------------------------------------------

fn play_round(
    reader: &mut Reader<'_>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<ReadOutcome> {
    info!("Reading started at node: {}", reader.current_id());
    let mut show = true;

    loop {
        let Some(node) = reader.current_node() else {
            writeln!(out, "\nThis page ('{}') was not found. Returning to the start.", reader.current_id())?;
            reader.jump_to_start();
            continue;
        };

        if show {
            show_node(out, node)?;
        }
        show = true;

        if node.is_ending || node.is_dead_end() {
            return Ok(ReadOutcome::Finished {
                node_id: node.id.clone(),
                is_ending: node.is_ending,
                steps_taken: reader.steps_taken(),
                longest_path: reader.graph.longest_path(reader.start_id()),
            });
        }

        let Some(answer) = read_line(input, out, "\n> ")? else {
            return Ok(ReadOutcome::Quit);
        };

        if answer.is_empty() {
            writeln!(out, "(Please pick a choice.)")?;
            show = false;
            continue;
        }
        if answer.eq_ignore_ascii_case("quit") || answer.eq_ignore_ascii_case("exit") {
            return Ok(ReadOutcome::Quit);
        }
        if answer.eq_ignore_ascii_case("start") {
            reader.jump_to_start();
            continue;
        }
        if answer.eq_ignore_ascii_case("restart") {
            reader.restart();
            continue;
        }

        let count = node.decisions.len();
        let step = match answer.parse::<usize>() {
            Ok(n) if n >= 1 => reader.choose(n - 1),
            _ => Step::InvalidChoice,
        };
        match step {
            Step::Moved(_) | Step::Ending(_) => {}
            Step::NotFound(id) => {
                writeln!(
                    out,
                    "The page '{id}' was not found in this story. Pick another choice, or type 'start' to go back to the beginning."
                )?;
                show = false;
            }
            Step::InvalidChoice => {
                writeln!(out, "Please pick a number between 1 and {count}.")?;
                show = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points: read until the reader quits
// ---------------------------------------------------------------------------

/// Run the reading loop over arbitrary input and output streams.
pub fn run_with(story: &ParsedStory, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let mut reader = Reader::new(story)?;
    loop {
        let outcome = play_round(&mut reader, input, out)?;
        show_game_over(out, &outcome)?;

        if outcome == ReadOutcome::Quit || !prompt_restart(input, out)? {
            writeln!(out, "Thanks for reading!")?;
            break;
        }

        info!("Reader chose to restart");
        reader.restart();
    }
    Ok(())
}

/// Run the reading loop on stdin/stdout.
pub fn run(story: &ParsedStory) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    run_with(story, &mut input, &mut out)
}
