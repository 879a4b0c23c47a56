use std::{io::Write, sync::Arc};

use parking_lot::Mutex;

use crate::clipboard::Clipboards;
use crate::controller::{CopyOutcome, DisplayController, Key, LoadOutcome};
use crate::loader::refresh;
use crate::store::SelectionStore;
use crate::surface::{SnapshotSurface, Surface};

/// One line of input in an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Query(String),
    Key(Key),
    Copy,
    Reload,
    Quit,
}

impl SessionCommand {
    /// `n` (or an empty line) is Enter, `p`/`N` is Shift+Enter, `c` copies,
    /// `r` reloads, `q` quits. `/text` searches for `text`, and any other line
    /// is taken as the query itself.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            "" | "n" => SessionCommand::Key(Key::Enter),
            "p" | "N" => SessionCommand::Key(Key::ShiftEnter),
            "c" => SessionCommand::Copy,
            "r" => SessionCommand::Reload,
            "q" => SessionCommand::Quit,
            _ => SessionCommand::Query(line.strip_prefix('/').unwrap_or(line).to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct AppState<S: Surface> {
    pub store: Arc<dyn SelectionStore>,
    pub controller: Mutex<DisplayController<S>>,
    pub clipboards: Mutex<Clipboards>,
}

impl<S: Surface> AppState<S> {
    pub fn new(store: Arc<dyn SelectionStore>, surface: S, clipboards: Clipboards) -> Self {
        Self {
            store,
            controller: Mutex::new(DisplayController::new(surface)),
            clipboards: Mutex::new(clipboards),
        }
    }

    pub async fn reload(&self) -> LoadOutcome {
        refresh(&self.controller, self.store.clone()).await
    }

    pub fn copy(&self) -> CopyOutcome {
        let mut clipboards = self.clipboards.lock();
        self.controller.lock().copy(&mut clipboards)
    }

    pub async fn apply(&self, command: SessionCommand) -> Flow {
        match command {
            SessionCommand::Query(query) => self.controller.lock().on_query_input(&query),
            SessionCommand::Key(key) => {
                self.controller.lock().on_key(key);
            }
            SessionCommand::Copy => {
                self.copy();
            }
            SessionCommand::Reload => {
                self.reload().await;
            }
            SessionCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

impl AppState<SnapshotSurface> {
    /// Loads the stored selection, applies `query` and writes only the final screen.
    pub async fn show<W: Write>(&self, query: Option<&str>, out: &mut W) -> std::io::Result<()> {
        self.reload().await;
        let mut controller = self.controller.lock();
        if let Some(query) = query {
            controller.on_query_input(query);
        }
        controller.surface().write_to(out)
    }
}
