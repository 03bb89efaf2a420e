// src/file_entry.rs
//! One tracked file of a renaming session.
//!
//! Entries live in a single `Vec<FileEntry>` owned by the session; the
//! position in that vector is the only link between an entry and its
//! manifest line, so entries are never reordered, inserted or removed once
//! discovery is done.

use serde::Serialize;
use std::fmt;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Base name at discovery time. Informational only.
    pub name: String,
    /// Where the file is right now. Updated after every successful rename.
    pub original_path: String,
    /// Target decoded from the manifest for the current pass.
    pub new_path: String,
}

impl FileEntry {
    /// Fresh entry as produced by discovery: both paths point at `path`.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            new_path: path.clone(),
            original_path: path,
        }
    }

    /// Entry whose name is derived from the last component of `path`.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = std::path::Path::new(&path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&path)
            .to_string();
        Self::new(name, path)
    }

    /// True if the manifest asks for this file to move.
    pub fn is_pending(&self) -> bool {
        self.original_path != self.new_path
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pending() {
            write!(f, "{:?} -> {:?}", self.original_path, self.new_path)
        } else {
            write!(f, "{:?}", self.original_path)
        }
    }
}
