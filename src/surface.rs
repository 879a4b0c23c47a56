use std::io::Write;

use tracing::warn;

use crate::clipboard::CopyMethod;
use crate::render::{render, Format};
use crate::types::RenderedView;

/// The display the controller drives. The three `show_*` states are mutually
/// exclusive; the rest adjust the search bar and give feedback.
pub trait Surface {
    fn show_placeholder(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
    fn show_formatted(&mut self, view: &RenderedView);
    fn set_search_visible(&mut self, visible: bool);
    fn set_counter(&mut self, counter: &str);
    fn clear_query(&mut self);
    /// Bring the current match into view, centered.
    fn scroll_to_current(&mut self, index: usize);
    fn copy_feedback(&mut self, method: CopyMethod);
    /// Blocking, user-visible notification.
    fn alert(&mut self, message: &str);
}

/// Writes every state change to a terminal stream.
pub struct TerminalSurface<W: Write> {
    out: W,
    format: Format,
    search_visible: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self { out, format, search_visible: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn show_placeholder(&mut self, message: &str) {
        self.emit(message);
    }

    fn show_error(&mut self, message: &str) {
        self.emit(message);
    }

    fn show_formatted(&mut self, view: &RenderedView) {
        let body = render(&view.root, self.format);
        self.emit(&body);
    }

    fn set_search_visible(&mut self, visible: bool) {
        self.search_visible = visible;
    }

    fn set_counter(&mut self, counter: &str) {
        if self.search_visible {
            self.emit(&format!("[{counter}]"));
        }
    }

    fn clear_query(&mut self) {}

    fn scroll_to_current(&mut self, _index: usize) {}

    fn copy_feedback(&mut self, method: CopyMethod) {
        let text = match method {
            CopyMethod::Primary => "copied",
            CopyMethod::Fallback => "copied (fallback)",
        };
        self.emit(text);
    }

    fn alert(&mut self, message: &str) {
        self.emit(&format!("!! {message}"));
    }
}

enum Screen {
    Placeholder(String),
    Error(String),
    Formatted(String),
}

/// Keeps only the latest screen, for one-shot commands that print a single
/// final state instead of streaming every transition.
pub struct SnapshotSurface {
    format: Format,
    screen: Screen,
    search_visible: bool,
    counter: String,
    with_counter: bool,
    notices: Vec<String>,
}

impl SnapshotSurface {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            screen: Screen::Placeholder(String::new()),
            search_visible: false,
            counter: String::new(),
            with_counter: false,
            notices: Vec::new(),
        }
    }

    /// Also write the match counter after a formatted screen.
    pub fn with_counter(mut self, with_counter: bool) -> Self {
        self.with_counter = with_counter;
        self
    }

    /// Copy feedback and alerts, oldest first.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match &self.screen {
            Screen::Placeholder(text) | Screen::Error(text) => writeln!(out, "{text}")?,
            Screen::Formatted(body) => {
                writeln!(out, "{body}")?;
                if self.with_counter && self.search_visible {
                    writeln!(out, "[{}]", self.counter)?;
                }
            }
        }
        out.flush()
    }
}

impl Surface for SnapshotSurface {
    fn show_placeholder(&mut self, message: &str) {
        self.screen = Screen::Placeholder(message.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.screen = Screen::Error(message.to_string());
    }

    fn show_formatted(&mut self, view: &RenderedView) {
        self.screen = Screen::Formatted(render(&view.root, self.format));
    }

    fn set_search_visible(&mut self, visible: bool) {
        self.search_visible = visible;
    }

    fn set_counter(&mut self, counter: &str) {
        self.counter = counter.to_string();
    }

    fn clear_query(&mut self) {}

    fn scroll_to_current(&mut self, _index: usize) {}

    fn copy_feedback(&mut self, method: CopyMethod) {
        let text = match method {
            CopyMethod::Primary => "copied",
            CopyMethod::Fallback => "copied (fallback)",
        };
        self.notices.push(text.to_string());
    }

    fn alert(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
