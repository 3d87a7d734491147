//! Clipboard boundary for copying converted notes.

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Which mechanism ended up holding the copied text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyBackend {
    /// The native system clipboard via `arboard`.
    System,
    /// A platform helper executable such as `pbcopy` or `wl-copy`.
    Command(String),
}

impl fmt::Display for CopyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyBackend::System => f.write_str("system clipboard"),
            CopyBackend::Command(program) => write!(f, "{program}"),
        }
    }
}

/// Copies text to the clipboard, falling back to helper executables on headless hosts.
pub struct Clipboard {
    native: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(%err, "system clipboard unavailable");
                None
            }
        };
        Self { native }
    }

    /// Copy `text`, returning the backend that accepted it.
    pub fn copy(&mut self, text: &str) -> Result<CopyBackend> {
        if let Some(native) = self.native.as_mut() {
            match native.set_text(text.to_owned()) {
                Ok(()) => return Ok(CopyBackend::System),
                Err(err) => tracing::debug!(%err, "system clipboard rejected text"),
            }
        }

        self.native = None;
        copy_with_helpers(text)
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_with_helpers(text: &str) -> Result<CopyBackend> {
    for command in helper_commands() {
        match pipe_into(command, text) {
            Ok(()) => return Ok(CopyBackend::Command(command[0].to_string())),
            Err(err) => tracing::debug!(program = command[0], error = %err, "clipboard helper failed"),
        }
    }

    Err(anyhow!("no clipboard backend accepted the text"))
}

fn pipe_into(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard helper: {program}"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard helper did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard helper {program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn helper_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn helper_commands() -> Vec<&'static [&'static str]> {
    vec![&["wl-copy"], &["xclip", "-selection", "clipboard"], &["xsel", "--clipboard", "--input"]]
}

#[cfg(target_os = "windows")]
fn helper_commands() -> Vec<&'static [&'static str]> {
    vec![&["clip.exe"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn helper_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}
