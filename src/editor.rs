// src/editor.rs
//! Handing the manifest to the user.
//!
//! Two ways to do it:
//! - [`CommandEditor`] runs an editor command (`$VISUAL`, `$EDITOR`, an explicit
//!   `--editor`, or a platform fallback) and waits for it to exit.
//! - [`DefaultApplication`] asks the OS to open the file with whatever is
//!   associated with it and returns right away; the session then waits for
//!   the operator to say they are done.

use std::path::Path;
use std::process::Command;
use crate::error::EditorError;

/// How `edit` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The editor exited; the user is done editing.
    Closed,
    /// The editor runs on its own; wait for the operator before decoding.
    Detached,
}

pub trait Editor {
    fn edit(&mut self, path: &Path) -> Result<EditOutcome, EditorError>;
}

/// An editor command line, run with the manifest path appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEditor {
    program: String,
    args: Vec<String>,
}

impl CommandEditor {
    /// Split a command line like `code --wait` into program and arguments.
    pub fn from_command_line(cmd: &str) -> Result<Self, EditorError> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(EditorError::NoEditor)?;
        Ok(Self { program, args: parts.collect() })
    }

    /// `$VISUAL`, then `$EDITOR`, then the first platform editor on `PATH`.
    pub fn detect() -> Result<Self, EditorError> {
        for var in ["VISUAL", "EDITOR"] {
            if let Ok(cmd) = std::env::var(var) {
                if !cmd.trim().is_empty() {
                    log::debug!("Using editor from ${var}: {cmd}");
                    return Self::from_command_line(&cmd);
                }
            }
        }

        for candidate in fallback_editors() {
            let program = candidate.split_whitespace().next().unwrap_or(candidate);
            if which::which(program).is_ok() {
                log::debug!("Using fallback editor: {candidate}");
                return Self::from_command_line(candidate);
            }
        }

        Err(EditorError::NoEditor)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Editor for CommandEditor {
    fn edit(&mut self, path: &Path) -> Result<EditOutcome, EditorError> {
        log::info!("Opening {} with {}", path.display(), self.program);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EditorError::EditorNotFound(self.program.clone())
                } else {
                    EditorError::SpawnFailed { program: self.program.clone(), source: e }
                }
            })?;

        if !status.success() {
            return Err(EditorError::EditorFailed(status));
        }
        Ok(EditOutcome::Closed)
    }
}

#[cfg(target_os = "windows")]
fn fallback_editors() -> &'static [&'static str] {
    &["code --wait", "notepad++ -multiInst -nosession", "notepad"]
}

#[cfg(target_os = "macos")]
fn fallback_editors() -> &'static [&'static str] {
    &["code --wait", "nvim", "vim", "nano"]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn fallback_editors() -> &'static [&'static str] {
    &["nvim", "vim", "nano", "vi", "code --wait"]
}

/// Open with the OS default application for the file type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultApplication;

impl Editor for DefaultApplication {
    fn edit(&mut self, path: &Path) -> Result<EditOutcome, EditorError> {
        log::info!("Opening {} with the default application", path.display());
        open_with_default(path)?;
        Ok(EditOutcome::Detached)
    }
}

// explorer.exe reports odd exit codes even on success, so don't wait on it.
#[cfg(target_os = "windows")]
fn open_with_default(path: &Path) -> Result<(), EditorError> {
    Command::new("explorer")
        .arg(path)
        .spawn()
        .map(drop)
        .map_err(|source| EditorError::SpawnFailed { program: "explorer".into(), source })
}

#[cfg(not(target_os = "windows"))]
fn open_with_default(path: &Path) -> Result<(), EditorError> {
    let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
    let status = Command::new(opener)
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EditorError::EditorNotFound(opener.to_string())
            } else {
                EditorError::SpawnFailed { program: opener.to_string(), source: e }
            }
        })?;
    if !status.success() {
        return Err(EditorError::EditorFailed(status));
    }
    Ok(())
}
