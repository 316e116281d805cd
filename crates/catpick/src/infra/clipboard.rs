//! Copying result documents to the system clipboard.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Which mechanism accepted the copied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopiedVia {
    System,
    Command(&'static str),
}

impl CopiedVia {
    pub fn describe(&self) -> &'static str {
        match self {
            CopiedVia::System => "system clipboard",
            CopiedVia::Command(program) => program,
        }
    }
}

/// System clipboard with shell utilities as a fallback on headless sessions.
pub struct Clipboard {
    system: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self {
            system: arboard::Clipboard::new().ok(),
        }
    }

    /// Copy `text`, trying the system clipboard first.
    pub fn copy(&mut self, text: &str) -> Result<CopiedVia> {
        if let Some(system) = self.system.as_mut()
            && system.set_text(text.to_owned()).is_ok()
        {
            return Ok(CopiedVia::System);
        }

        // A failed system clipboard stays failed for the session.
        self.system = None;
        for command in fallback_commands() {
            match pipe_to(command, text) {
                Ok(()) => return Ok(CopiedVia::Command(command[0])),
                Err(err) => tracing::debug!(program = command[0], error = %err, "clipboard command failed"),
            }
        }
        Err(anyhow!("no clipboard backend accepted the text"))
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn pipe_to(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child.wait().with_context(|| format!("{program} did not exit cleanly"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["wl-copy"], &["xclip", "-selection", "clipboard"], &["xsel", "--clipboard", "--input"]]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["clip.exe"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[]
}
