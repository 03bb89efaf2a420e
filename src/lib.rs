// src/lib.rs
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod util;
pub mod error;
pub mod file_entry;
pub mod version;

pub mod scan;
pub mod manifest;
pub mod mover;

pub mod editor;
pub mod prompt;
pub mod session;
pub mod report;

pub mod commands;

pub use error::{DecodeError, EditorError, MoveError, RetryableError, SessionError, Stage};
pub use file_entry::FileEntry;
pub use manifest::ManifestFormat;
pub use session::{Applied, Session, SessionConfig};
