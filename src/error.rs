// src/error.rs
//! Error taxonomy for a renaming session.
//!
//! Fatal errors ([`SessionError`]) end the session. Everything wrapped in
//! [`RetryableError`] is reported to the operator, who fixes the cause and
//! asks the session to try again.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems found while reading an edited manifest.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open manifest {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read manifest line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: no tab between index and path")]
    MissingSeparator { line: usize },

    /// `source` is `None` when the token parsed but carried a sign.
    #[error("line {line}: failed to parse element number {token:?}")]
    InvalidIndex {
        line: usize,
        token: String,
        #[source]
        source: Option<ParseIntError>,
    },

    #[error("line {line}: element number outside of valid range: given {index}, there are {count} entries")]
    IndexOutOfRange { line: usize, index: u64, count: usize },

    #[error("element number {index} appears on line {first_line} and again on line {line}")]
    DuplicateIndex {
        index: usize,
        first_line: usize,
        line: usize,
    },

    #[error("too many lines: line {line} has no matching entry, expected {expected}")]
    TooManyLines { line: usize, expected: usize },

    #[error("wrong number of lines: got {got}, expected {expected}")]
    TooFewLines { got: usize, expected: usize },

    #[error("entries {first} and {second} both target {target:?}")]
    DuplicateTarget {
        target: String,
        first: usize,
        second: usize,
    },

    #[error("entry {entry} targets {target:?}, which entry {owner} still occupies at that point")]
    TargetInUse {
        target: String,
        entry: usize,
        owner: usize,
    },
}

/// A single rename that the filesystem refused.
#[derive(Debug, Error)]
#[error("failed to move {from:?} to {to:?}: {source}")]
pub struct MoveError {
    pub from: String,
    pub to: String,
    /// Entries renamed in this pass before the failure.
    pub applied: usize,
    #[source]
    pub source: io::Error,
}

/// Launching the external editor failed.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("editor exited with status: {0}")]
    EditorFailed(std::process::ExitStatus),

    #[error("no editor found; set $VISUAL or $EDITOR, or pass --editor")]
    NoEditor,

    #[error("editor command not found: {0}")]
    EditorNotFound(String),

    #[error("failed to spawn editor {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Failures the operator can fix before asking for another attempt.
#[derive(Debug, Error)]
pub enum RetryableError {
    #[error("Failed to read manifest: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to move file: {0}")]
    Move(#[from] MoveError),

    #[error("Failed to remove manifest {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RetryableError {
    /// What the operator has to do before retrying.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Update the manifest file and press Enter to retry (q to abandon)...",
            Self::Move(_) => "Update the manifest file or fix the file system, then press Enter to retry (q to abandon)...",
            Self::Cleanup { .. } => "Close the manifest file and press Enter to try again (q to abandon)...",
        }
    }
}

/// Where a session stopped when the operator walked away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Edit,
    Apply,
    Cleanup,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Edit => "edit",
            Stage::Apply => "apply",
            Stage::Cleanup => "cleanup",
        })
    }
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to create manifest in {dir}: {source}")]
    CreateManifest {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open manifest {path} in editor: {source}")]
    Editor {
        path: PathBuf,
        #[source]
        source: EditorError,
    },

    #[error("session abandoned during {stage}; manifest left at {manifest}")]
    Abandoned { stage: Stage, manifest: PathBuf },
}

pub type SessionResult<T> = Result<T, SessionError>;
