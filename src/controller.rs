use tracing::{debug, error, info, warn};

use crate::clipboard::{Clipboards, CopyMethod};
use crate::document::Document;
use crate::error::StorageError;
use crate::search::SearchSession;
use crate::surface::Surface;
use crate::tree::truncate;
use crate::types::{Presentation, RenderedView};

pub const PLACEHOLDER_TEXT: &str =
    "Select JSON text on a webpage and choose \"View Formatted JSON\" from the context menu.";
pub const COPY_FAILED_ALERT: &str = "Failed to copy JSON to clipboard";

const LOG_PREVIEW_CHARS: usize = 100;

/// Accelerators in the query field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    ShiftEnter,
}

/// Issued when a storage load starts; only the latest ticket may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started before this one finished.
    Stale,
    /// Retrieval failed; the display keeps its last state.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    NothingToCopy,
    Copied(CopyMethod),
    Failed,
}

/// Owns the displayed document and its search session, and drives a
/// [`Surface`] from discrete events.
pub struct DisplayController<S: Surface> {
    surface: S,
    presentation: Presentation,
    document: Option<Document>,
    session: SearchSession,
    issued: u64,
}

impl<S: Surface> DisplayController<S> {
    pub fn new(surface: S) -> Self {
        let mut controller = Self {
            surface,
            presentation: Presentation::Placeholder,
            document: None,
            session: SearchSession::new(),
            issued: 0,
        };
        controller.show_placeholder();
        controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn counter(&self) -> String {
        self.session.counter()
    }

    /// The view for the current document, query and cursor.
    pub fn view(&self) -> Option<RenderedView> {
        self.document.as_ref().map(|doc| self.session.view(doc.marked()))
    }

    /// Replaces the displayed content with `raw`. Missing or empty input shows
    /// the placeholder; invalid JSON shows the error pane.
    pub fn display(&mut self, raw: Option<&str>) {
        self.session.reset();
        self.surface.clear_query();
        self.surface.set_counter(&self.session.counter());

        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                self.show_placeholder();
                return;
            }
        };

        match Document::parse(raw) {
            Ok(doc) => {
                info!(chars = doc.pretty().chars().count(), "displaying formatted JSON");
                self.surface.show_formatted(&self.session.view(doc.marked()));
                self.surface.set_search_visible(true);
                self.surface.set_counter(&self.session.counter());
                self.document = Some(doc);
                self.presentation = Presentation::Formatted;
            }
            Err(e) => {
                warn!(error = %e, "JSON parsing error");
                let message = format!("Error: {e}");
                self.document = None;
                self.surface.set_search_visible(false);
                self.surface.show_error(&message);
                self.presentation = Presentation::Error { message };
            }
        }
    }

    fn show_placeholder(&mut self) {
        self.document = None;
        self.session.reset();
        self.surface.set_search_visible(false);
        self.surface.show_placeholder(PLACEHOLDER_TEXT);
        self.presentation = Presentation::Placeholder;
    }

    /// Recomputes matches for the edited query.
    pub fn on_query_input(&mut self, query: &str) {
        let Some(doc) = &self.document else { return };
        let view = self.session.set_query(doc.marked(), query);
        self.present(&view);
    }

    pub fn next(&mut self) -> bool {
        self.navigate(true)
    }

    pub fn previous(&mut self) -> bool {
        self.navigate(false)
    }

    pub fn on_key(&mut self, key: Key) -> bool {
        match key {
            Key::Enter => self.next(),
            Key::ShiftEnter => self.previous(),
        }
    }

    fn navigate(&mut self, forward: bool) -> bool {
        let Some(doc) = &self.document else { return false };
        let view = if forward {
            self.session.next(doc.marked())
        } else {
            self.session.previous(doc.marked())
        };
        match view {
            Some(view) => {
                self.present(&view);
                true
            }
            None => false,
        }
    }

    fn present(&mut self, view: &RenderedView) {
        self.surface.show_formatted(view);
        if let (Some(index), true) = (view.current, view.current_rendered) {
            self.surface.scroll_to_current(index);
        }
        self.surface.set_counter(&self.session.counter());
    }

    /// Copies the canonical pretty form, falling back to the secondary
    /// mechanism and alerting when both fail.
    pub fn copy(&mut self, clipboards: &mut Clipboards) -> CopyOutcome {
        let Some(doc) = &self.document else {
            error!("no JSON to copy");
            return CopyOutcome::NothingToCopy;
        };
        match clipboards.copy(doc.pretty()) {
            Ok(method) => {
                self.surface.copy_feedback(method);
                CopyOutcome::Copied(method)
            }
            Err(e) => {
                error!(error = %e, "failed to copy JSON");
                self.surface.alert(COPY_FAILED_ALERT);
                CopyOutcome::Failed
            }
        }
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        debug!(seq = self.issued, "load started");
        LoadTicket(self.issued)
    }

    /// Applies a finished load unless a newer one has been started since.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<String>, StorageError>,
    ) -> LoadOutcome {
        if ticket.0 != self.issued {
            debug!(seq = ticket.0, latest = self.issued, "discarding stale load");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(raw) => {
                match raw.as_deref() {
                    Some(raw) if !raw.is_empty() => {
                        info!(preview = %truncate(raw, LOG_PREVIEW_CHARS), "loading JSON from storage")
                    }
                    _ => info!("loading JSON from storage: empty"),
                }
                self.display(raw.as_deref());
                LoadOutcome::Applied
            }
            Err(e) => {
                error!(error = %e, "error loading JSON");
                LoadOutcome::Failed
            }
        }
    }
}
