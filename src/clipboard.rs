use std::{
    io::Write,
    process::{Child, Command, Stdio},
};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ClipboardError;

/// Something that can place text on a clipboard.
pub trait ClipboardWriter {
    fn name(&self) -> &'static str;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Native clipboard through `arboard`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardWriter for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut cb = arboard::Clipboard::new().map_err(|e| ClipboardError::backend(self.name(), e))?;
        cb.set_text(text.to_string())
            .map_err(|e| ClipboardError::backend(self.name(), e))
    }
}

type Candidate = (&'static str, &'static [&'static str]);

const MACOS_COMMANDS: &[Candidate] = &[("pbcopy", &[])];
const WINDOWS_COMMANDS: &[Candidate] = &[("clip", &[])];
const UNIX_COMMANDS: &[Candidate] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Pipes text into the first platform copy command that succeeds.
#[derive(Debug)]
pub struct CommandClipboard {
    candidates: Vec<Candidate>,
}

impl Default for CommandClipboard {
    fn default() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            MACOS_COMMANDS
        } else if cfg!(windows) {
            WINDOWS_COMMANDS
        } else {
            UNIX_COMMANDS
        };
        Self::with_candidates(candidates)
    }
}

impl CommandClipboard {
    pub fn with_candidates(candidates: &[Candidate]) -> Self {
        Self { candidates: candidates.to_vec() }
    }

    fn pipe(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Self::feed(&mut child, text)
    }

    /// Writes `text` to the child's stdin and reaps it, even when the write fails.
    fn feed(child: &mut Child, text: &str) -> std::io::Result<bool> {
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                let _ = child.kill();
                child.wait()?;
                return Err(e);
            }
        }
        Ok(child.wait()?.success())
    }
}

impl ClipboardWriter for CommandClipboard {
    fn name(&self) -> &'static str {
        "command"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut failures = Vec::new();
        for (program, args) in &self.candidates {
            match Self::pipe(program, args, text) {
                Ok(true) => return Ok(()),
                Ok(false) => failures.push(format!("{program} exited with failure")),
                Err(e) => failures.push(format!("{program}: {e}")),
            }
        }
        if failures.is_empty() {
            failures.push("no copy command configured".to_string());
        }
        Err(ClipboardError::backend(self.name(), failures.join(", ")))
    }
}

/// Which mechanism ended up holding the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMethod {
    Primary,
    Fallback,
}

/// Tries `primary`, then `fallback`. Fails only when both do.
pub fn copy_with_fallback(
    text: &str,
    primary: &mut dyn ClipboardWriter,
    fallback: &mut dyn ClipboardWriter,
) -> Result<CopyMethod, ClipboardError> {
    let primary_err = match primary.write_text(text) {
        Ok(()) => {
            info!(backend = primary.name(), "copied to clipboard");
            return Ok(CopyMethod::Primary);
        }
        Err(e) => e,
    };
    warn!(error = %primary_err, "primary clipboard failed, trying fallback");

    match fallback.write_text(text) {
        Ok(()) => {
            info!(backend = fallback.name(), "copied to clipboard (fallback method)");
            Ok(CopyMethod::Fallback)
        }
        Err(fallback_err) => Err(ClipboardError::Exhausted {
            primary: Box::new(primary_err),
            fallback: Box::new(fallback_err),
        }),
    }
}

/// The primary and fallback writers used by the display controller.
pub struct Clipboards {
    primary: Box<dyn ClipboardWriter>,
    fallback: Box<dyn ClipboardWriter>,
}

impl Clipboards {
    pub fn new(primary: Box<dyn ClipboardWriter>, fallback: Box<dyn ClipboardWriter>) -> Self {
        Self { primary, fallback }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard), Box::new(CommandClipboard::default()))
    }

    pub fn copy(&mut self, text: &str) -> Result<CopyMethod, ClipboardError> {
        copy_with_fallback(text, self.primary.as_mut(), self.fallback.as_mut())
    }
}
