// src/mover.rs
//! Applies decoded targets to the filesystem.
//!
//! `move_files` is safe to call again after a failure: an entry's
//! `original_path` is advanced only after its rename succeeded, so a later
//! pass skips everything already done and retries only what is left.

use std::{
    fs,
    io,
    path::Path
};
use crate::{
    error::MoveError,
    file_entry::FileEntry
};

/// Filesystem primitives used by [`move_files`] and by the session's
/// manifest cleanup.
pub trait FileMover {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Renames on the real filesystem via [`std::fs::rename`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMover {
    /// Create missing parent directories of the target first.
    pub create_parents: bool,
    /// Fail with `AlreadyExists` instead of replacing another file.
    pub keep_existing: bool,
}

impl FsMover {
    pub fn new(create_parents: bool, keep_existing: bool) -> Self {
        Self { create_parents, keep_existing }
    }
}

/// `to` exists and is not just another spelling of `from`.
fn occupied(from: &Path, to: &Path) -> bool {
    if fs::symlink_metadata(to).is_err() {
        return false;
    }
    // case-only renames on case-insensitive filesystems
    match (fs::canonicalize(from), fs::canonicalize(to)) {
        (Ok(a), Ok(b)) => a != b,
        _ => true,
    }
}

impl FileMover for FsMover {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.keep_existing && occupied(from, to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        if self.create_parents {
            if let Some(parent) = to.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    log::debug!("Creating directory {}", parent.display());
                    fs::create_dir_all(parent)?;
                }
            }
        }
        fs::rename(from, to)
    }
}

/// Outcome of one successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveSummary {
    pub renamed: usize,
    pub unchanged: usize,
}

/// Rename every pending entry in sequence order.
///
/// Stops at the first failure. Entries before it already point at their new
/// location; the failing entry and everything after it are untouched.
pub fn move_files<M: FileMover + ?Sized>(mover: &M, entries: &mut [FileEntry]) -> Result<MoveSummary, MoveError> {
    let mut summary = MoveSummary::default();

    for entry in entries.iter_mut() {
        if !entry.is_pending() {
            summary.unchanged += 1;
            continue;
        }

        if let Err(source) = mover.rename(Path::new(&entry.original_path), Path::new(&entry.new_path)) {
            return Err(MoveError {
                from: entry.original_path.clone(),
                to: entry.new_path.clone(),
                applied: summary.renamed,
                source,
            });
        }
        log::info!("Renamed {:?} to {:?}", entry.original_path, entry.new_path);
        entry.original_path.clone_from(&entry.new_path);
        summary.renamed += 1;
    }

    Ok(summary)
}
