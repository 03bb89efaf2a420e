// src/manifest.rs
//! Manifest encode/decode.
//!
//! A manifest is plain UTF-8 text with one line per entry, in one of two
//! formats:
//! - numbered: `<index>\t<path>`, index 1-based and zero-padded to the width
//!   of the entry count. Lines may be reordered freely; the index picks the
//!   entry.
//! - bare: `<path>`. Line position picks the entry, so the line count must
//!   match exactly.

use clap::ValueEnum;
use memchr::memchr;
use std::{
    collections::HashMap,
    fs,
    io::{
        self,
        BufRead,
        BufReader,
        Write
    },
    num::ParseIntError,
    path::{
        Path,
        PathBuf
    },
};
use crate::{
    error::DecodeError,
    file_entry::FileEntry,
    util
};

/// Suffix of every manifest file, so it can't be mistaken for a user file.
pub const MANIFEST_SUFFIX: &str = ".batch-rename";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ManifestFormat {
    /// `<index>\t<path>` per line.
    #[default]
    Numbered,
    /// `<path>` per line.
    Bare,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject duplicate indices, entries that share a target path, and
    /// targets another entry still occupies when the rename runs.
    pub strict: bool,
}

/// Render `entries` as manifest text.
pub fn encode(entries: &[FileEntry], format: ManifestFormat) -> String {
    let width = util::decimal_width(entries.len());
    let mut out = String::with_capacity(entries.iter().map(|e| e.original_path.len() + width + 2).sum());
    for (i, entry) in entries.iter().enumerate() {
        if format == ManifestFormat::Numbered {
            out.push_str(&format!("{:0width$}\t", i + 1));
        }
        out.push_str(&entry.original_path);
        out.push('\n');
    }
    out
}

/// Create a fresh manifest file in `dir` and return its path.
///
/// The file gets a random name ending in [`MANIFEST_SUFFIX`]. It is not
/// removed automatically; the caller deletes it once the batch is applied.
pub fn write_manifest(dir: &Path, entries: &[FileEntry], format: ManifestFormat) -> io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("")
        .suffix(MANIFEST_SUFFIX)
        .tempfile_in(dir)?;
    file.write_all(encode(entries, format).as_bytes())?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    log::debug!("Wrote {} manifest lines to {}", entries.len(), path.display());
    Ok(path)
}

/// Read the (edited) manifest at `path` back into `entries[..].new_path`.
pub fn read_manifest(
    path: &Path,
    entries: &mut [FileEntry],
    format: ManifestFormat,
    opts: DecodeOptions,
) -> Result<(), DecodeError> {
    let file = fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode(BufReader::new(file), entries, format, opts)
}

/// Decode manifest text into `entries[..].new_path`.
///
/// In the numbered format an entry without a line stays in place. Entries
/// written before an error is found keep their new value; nothing
/// is rolled back. The caller must not act on `entries` unless this
/// returns `Ok`.
pub fn decode<R: BufRead>(
    reader: R,
    entries: &mut [FileEntry],
    format: ManifestFormat,
    opts: DecodeOptions,
) -> Result<(), DecodeError> {
    match format {
        ManifestFormat::Numbered => decode_numbered(reader, entries, opts)?,
        ManifestFormat::Bare => decode_bare(reader, entries)?,
    }
    if opts.strict {
        check_targets(entries)?;
    }
    Ok(())
}

fn decode_numbered<R: BufRead>(reader: R, entries: &mut [FileEntry], opts: DecodeOptions) -> Result<(), DecodeError> {
    let count = entries.len();
    // first line each index was seen on; only tracked in strict mode
    let mut seen_on: Vec<usize> = if opts.strict { vec![0; count] } else { Vec::new() };

    // a target from an earlier decode must not survive its line being deleted
    for entry in entries.iter_mut() {
        entry.new_path.clone_from(&entry.original_path);
    }

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|source| DecodeError::Read { line: line_no, source })?;

        let tab = memchr(b'\t', line.as_bytes());
        let token = tab.map_or(line.as_str(), |t| &line[..t]);
        let index = parse_index(token).map_err(|source| DecodeError::InvalidIndex {
            line: line_no,
            token: token.to_string(),
            source,
        })?;
        let pos = match usize::try_from(index) {
            Ok(n) if n >= 1 && n <= count => n - 1,
            _ => return Err(DecodeError::IndexOutOfRange { line: line_no, index, count }),
        };
        let Some(t) = tab else {
            return Err(DecodeError::MissingSeparator { line: line_no });
        };

        if opts.strict {
            let first_line = seen_on[pos];
            if first_line != 0 {
                return Err(DecodeError::DuplicateIndex { index: pos + 1, first_line, line: line_no });
            }
            seen_on[pos] = line_no;
        }

        entries[pos].new_path = line[t + 1..].to_string();
    }
    Ok(())
}

/// Parse an element number: ASCII digits only.
fn parse_index(token: &str) -> Result<u64, Option<ParseIntError>> {
    // str::parse also takes a leading '+'
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(token.parse::<u64>().err());
    }
    token.parse().map_err(Some)
}

fn decode_bare<R: BufRead>(reader: R, entries: &mut [FileEntry]) -> Result<(), DecodeError> {
    let expected = entries.len();
    let mut got = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DecodeError::Read { line: i + 1, source })?;
        let Some(entry) = entries.get_mut(i) else {
            return Err(DecodeError::TooManyLines { line: i + 1, expected });
        };
        entry.new_path = line;
        got = i + 1;
    }

    if got < expected {
        return Err(DecodeError::TooFewLines { got, expected });
    }
    Ok(())
}

/// Make sure no rename can land on a path that is still in use.
///
/// Entries are renamed in sequence order, so a target may be another
/// entry's current path only if that entry comes earlier and moves away.
fn check_targets(entries: &[FileEntry]) -> Result<(), DecodeError> {
    let mut owners: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    for (i, e) in entries.iter().enumerate() {
        if let Some(first) = owners.insert(e.new_path.as_str(), i) {
            return Err(DecodeError::DuplicateTarget {
                target: e.new_path.clone(),
                first: first + 1,
                second: i + 1,
            });
        }
    }

    let current: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.original_path.as_str(), i))
        .collect();
    for (i, e) in entries.iter().enumerate().filter(|(_, e)| e.is_pending()) {
        // an entry staying put shares our target, which the loop above caught
        if let Some(&owner) = current.get(e.new_path.as_str()) {
            if owner > i {
                return Err(DecodeError::TargetInUse {
                    target: e.new_path.clone(),
                    entry: i + 1,
                    owner: owner + 1,
                });
            }
        }
    }
    Ok(())
}
