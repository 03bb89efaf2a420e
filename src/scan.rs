// src/scan.rs

use anyhow::{
    Context,
    Result
};
use ignore::WalkBuilder;
use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;
use crate::{
    file_entry::FileEntry,
    manifest::MANIFEST_SUFFIX
};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Keep only paths this regex matches (searched anywhere in the path).
    pub filter: Option<Regex>,
    /// Honor .gitignore/.ignore and skip hidden files.
    pub respect_ignore: bool,
}

/// Collect every file below `root`, in sorted traversal order.
///
/// Directories are not entries. Paths are relative to the working directory
/// when `root` is `.`, and joined onto `root` otherwise, so they can be fed
/// straight to `rename`. Leftover manifests and non-UTF-8 paths are skipped.
pub fn discover(root: &Path, opts: &ScanOptions) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut entries = Vec::new();
    if opts.respect_ignore {
        let walker = WalkBuilder::new(root)
            .standard_filters(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();
        for dent in walker {
            let dent = dent.with_context(|| format!("walking {}", root.display()))?;
            if dent.file_type().map_or(true, |t| t.is_dir()) {
                continue;
            }
            push_candidate(&mut entries, root, dent.path(), opts);
        }
    } else {
        for dent in WalkDir::new(root).sort_by_file_name() {
            let dent = dent.with_context(|| format!("walking {}", root.display()))?;
            if dent.file_type().is_dir() {
                continue;
            }
            push_candidate(&mut entries, root, dent.path(), opts);
        }
    }

    log::debug!("Discovered {} files below {}", entries.len(), root.display());
    Ok(entries)
}

fn push_candidate(entries: &mut Vec<FileEntry>, root: &Path, path: &Path, opts: &ScanOptions) {
    let rel = normalize_rel(root, path);
    let Some(rel) = rel.to_str() else {
        log::warn!("Skipping non-UTF-8 path {}", rel.display());
        return;
    };

    if rel.ends_with(MANIFEST_SUFFIX) {
        log::debug!("Skipping leftover manifest {rel}");
        return;
    }
    if let Some(re) = &opts.filter {
        if !re.is_match(rel) {
            log::trace!("Filtered out {rel}");
            return;
        }
    }

    entries.push(FileEntry::from_path(rel));
}

/* ----------------------------- helpers ----------------------------- */

// "./a/b.txt" -> "a/b.txt" when walking the working directory itself
fn normalize_rel<'a>(root: &Path, path: &'a Path) -> &'a Path {
    if root == Path::new(".") {
        path.strip_prefix(root).unwrap_or(path)
    } else {
        path
    }
}
