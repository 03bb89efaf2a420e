// src/session.rs
//! One renaming session: write the manifest, let the user edit it, then
//! decode and apply until it works, then remove the manifest.
//!
//! Every retryable failure goes through the [`Operator`]: it is reported,
//! and the session blocks until the operator says to continue (or gives
//! up). The same entry slice is reused for every attempt, so manifest
//! indices keep pointing at the same files no matter how often we retry.

use log::{debug, info, warn};
use std::{
    io,
    path::{
        Path,
        PathBuf
    }
};
use crate::{
    editor::{EditOutcome, Editor},
    error::{RetryableError, SessionError, SessionResult, Stage},
    file_entry::FileEntry,
    manifest::{self, DecodeOptions, ManifestFormat},
    mover::{self, FileMover},
    prompt::{Operator, Signal},
    version,
};

const EDIT_HINT: &str = "Editor opened, edit the file paths, save, and press Enter to continue (q to abandon)...";

/// Fixed settings for a session, resolved once by the caller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub format: ManifestFormat,
    /// Directory the manifest is created in.
    pub manifest_dir: PathBuf,
    pub strict: bool,
    pub version: semver::Version,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            format: ManifestFormat::default(),
            manifest_dir: PathBuf::from("."),
            strict: false,
            version: version::current(),
        }
    }
}

/// A session that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Decode/apply rounds, including failed ones.
    pub attempts: usize,
    /// Renames performed across all rounds.
    pub renamed: usize,
}

pub struct Session<'a> {
    config: SessionConfig,
    editor: &'a mut dyn Editor,
    operator: &'a mut dyn Operator,
    mover: &'a dyn FileMover,
}

impl<'a> Session<'a> {
    pub fn new(
        config: SessionConfig,
        editor: &'a mut dyn Editor,
        operator: &'a mut dyn Operator,
        mover: &'a dyn FileMover,
    ) -> Self {
        Self { config, editor, operator, mover }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the whole session over `entries`.
    ///
    /// On return (success or not) each entry's `original_path` tells where
    /// that file is now.
    pub fn run(&mut self, entries: &mut [FileEntry]) -> SessionResult<Applied> {
        if entries.is_empty() {
            debug!("No entries, nothing to edit");
            return Ok(Applied::default());
        }
        debug!(
            "Session started: batch-rename v{}, {} entries, {:?} manifest",
            self.config.version,
            entries.len(),
            self.config.format
        );

        let manifest = manifest::write_manifest(&self.config.manifest_dir, entries, self.config.format)
            .map_err(|source| SessionError::CreateManifest {
                dir: self.config.manifest_dir.clone(),
                source,
            })?;
        info!("Wrote manifest {}", manifest.display());

        match self.editor.edit(&manifest) {
            Ok(EditOutcome::Closed) => {}
            Ok(EditOutcome::Detached) => {
                if self.operator.await_continue(EDIT_HINT) == Signal::Abandon {
                    return Err(SessionError::Abandoned { stage: Stage::Edit, manifest });
                }
            }
            Err(source) => {
                // nothing was renamed yet, so the manifest is of no use to anyone
                if let Err(e) = self.mover.remove(&manifest) {
                    warn!("Failed to remove manifest {}: {e}", manifest.display());
                }
                return Err(SessionError::Editor { path: manifest, source });
            }
        }

        let applied = self.apply(&manifest, entries)?;
        self.cleanup(&manifest)?;
        Ok(applied)
    }

    /// Decode and apply until both succeed.
    fn apply(&mut self, manifest: &Path, entries: &mut [FileEntry]) -> SessionResult<Applied> {
        let opts = DecodeOptions { strict: self.config.strict };
        let mut applied = Applied::default();

        loop {
            applied.attempts += 1;
            debug!("Reading manifest, attempt {}", applied.attempts);

            let failure: RetryableError = match manifest::read_manifest(manifest, entries, self.config.format, opts) {
                Err(e) => e.into(),
                Ok(()) => match mover::move_files(self.mover, entries) {
                    Ok(summary) => {
                        applied.renamed += summary.renamed;
                        info!("Renamed {} files, {} unchanged", summary.renamed, summary.unchanged);
                        return Ok(applied);
                    }
                    Err(e) => {
                        applied.renamed += e.applied;
                        e.into()
                    }
                },
            };
            self.pause(failure, Stage::Apply, manifest)?;
        }
    }

    fn cleanup(&mut self, manifest: &Path) -> SessionResult<()> {
        info!("Deleting manifest {}", manifest.display());
        loop {
            match self.mover.remove(manifest) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Manifest {} already gone", manifest.display());
                    return Ok(());
                }
                Err(source) => {
                    let failure = RetryableError::Cleanup { path: manifest.to_path_buf(), source };
                    self.pause(failure, Stage::Cleanup, manifest)?;
                }
            }
        }
    }

    /// Report `failure` and wait for the operator.
    fn pause(&mut self, failure: RetryableError, stage: Stage, manifest: &Path) -> SessionResult<()> {
        warn!("{failure}");
        self.operator.report(&failure);
        match self.operator.await_continue(failure.hint()) {
            Signal::Continue => Ok(()),
            Signal::Abandon => Err(SessionError::Abandoned {
                stage,
                manifest: manifest.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::mover::FsMover;
    use pretty_assertions::assert_eq;
    use std::{cell::Cell, fs};

    /// Editor that writes fixed text over the manifest.
    struct Rewrite(String, EditOutcome);

    impl Editor for Rewrite {
        fn edit(&mut self, path: &Path) -> Result<EditOutcome, EditorError> {
            fs::write(path, &self.0)?;
            Ok(self.1)
        }
    }

    struct Broken;

    impl Editor for Broken {
        fn edit(&mut self, _path: &Path) -> Result<EditOutcome, EditorError> {
            Err(EditorError::NoEditor)
        }
    }

    /// Answers from a script, then abandons.
    #[derive(Default)]
    struct Scripted {
        answers: Vec<Signal>,
        reports: Vec<String>,
        waits: usize,
    }

    impl Operator for Scripted {
        fn report(&mut self, failure: &RetryableError) {
            self.reports.push(failure.to_string());
        }

        fn await_continue(&mut self, _hint: &str) -> Signal {
            self.waits += 1;
            if self.answers.is_empty() { Signal::Abandon } else { self.answers.remove(0) }
        }
    }

    fn config(dir: &Path, format: ManifestFormat) -> SessionConfig {
        SessionConfig {
            format,
            manifest_dir: dir.to_path_buf(),
            ..SessionConfig::default()
        }
    }

    fn leftover_manifests(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(manifest::MANIFEST_SUFFIX))
            .count()
    }

    #[test]
    fn empty_session_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = Broken;
        let mut operator = Scripted::default();
        let mover = FsMover::default();
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);
        assert_eq!(session.run(&mut []).unwrap(), Applied::default());
        assert_eq!(leftover_manifests(dir.path()), 0);
    }

    #[test]
    fn editor_failure_is_fatal_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![FileEntry::from_path("a.txt")];
        let mut editor = Broken;
        let mut operator = Scripted::default();
        let mover = FsMover::default();
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);

        let err = session.run(&mut entries).unwrap_err();
        assert!(matches!(err, SessionError::Editor { .. }), "{err:?}");
        assert_eq!(leftover_manifests(dir.path()), 0);
        assert_eq!(operator.waits, 0);
    }

    #[test]
    fn detached_editor_waits_for_the_operator() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![FileEntry::from_path("a.txt")];
        // unchanged manifest, so nothing is renamed
        let mut editor = Rewrite("1\ta.txt\n".into(), EditOutcome::Detached);
        let mut operator = Scripted { answers: vec![Signal::Continue], ..Default::default() };
        let mover = FsMover::default();
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);

        let applied = session.run(&mut entries).unwrap();
        assert_eq!(applied, Applied { attempts: 1, renamed: 0 });
        assert_eq!(operator.waits, 1);
        assert!(operator.reports.is_empty());
        assert_eq!(leftover_manifests(dir.path()), 0);
    }

    #[test]
    fn abandon_while_editing_keeps_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![FileEntry::from_path("a.txt")];
        let mut editor = Rewrite("1\tb.txt\n".into(), EditOutcome::Detached);
        let mut operator = Scripted::default();
        let mover = FsMover::default();
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);

        let err = session.run(&mut entries).unwrap_err();
        match err {
            SessionError::Abandoned { stage, manifest } => {
                assert_eq!(stage, Stage::Edit);
                assert!(manifest.exists());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(entries[0].original_path, "a.txt");
    }

    #[test]
    fn decode_error_is_reported_and_abandon_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![
            FileEntry::from_path("a.txt"),
            FileEntry::from_path("b.txt"),
            FileEntry::from_path("c.txt"),
        ];
        let mut editor = Rewrite("A.txt\nB.txt\n".into(), EditOutcome::Closed);
        let mut operator = Scripted::default();
        let mover = FsMover::default();
        let mut session = Session::new(config(dir.path(), ManifestFormat::Bare), &mut editor, &mut operator, &mover);

        let err = session.run(&mut entries).unwrap_err();
        assert!(matches!(err, SessionError::Abandoned { stage: Stage::Apply, .. }), "{err:?}");
        assert_eq!(operator.reports.len(), 1);
        assert!(operator.reports[0].contains("got 2, expected 3"), "{}", operator.reports[0]);
    }

    /// Real filesystem, except the first `locked` manifest removals fail.
    struct LockedManifest {
        locked: Cell<usize>,
    }

    impl FileMover for LockedManifest {
        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            FsMover::default().rename(from, to)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            if self.locked.get() > 0 {
                self.locked.set(self.locked.get() - 1);
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "file is open"));
            }
            fs::remove_file(path)
        }
    }

    #[test]
    fn cleanup_failure_is_reported_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![FileEntry::from_path("a.txt")];
        let mut editor = Rewrite("1\ta.txt\n".into(), EditOutcome::Closed);
        let mut operator = Scripted { answers: vec![Signal::Continue], ..Default::default() };
        let mover = LockedManifest { locked: Cell::new(1) };
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);

        let applied = session.run(&mut entries).unwrap();
        assert_eq!(applied, Applied { attempts: 1, renamed: 0 });
        assert_eq!(operator.reports.len(), 1);
        assert!(operator.reports[0].starts_with("Failed to remove manifest"), "{}", operator.reports[0]);
        assert!(operator.reports[0].contains("file is open"), "{}", operator.reports[0]);
        assert_eq!(operator.waits, 1);
        assert_eq!(leftover_manifests(dir.path()), 0);
    }

    #[test]
    fn abandon_during_cleanup_keeps_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = vec![FileEntry::from_path("a.txt")];
        let mut editor = Rewrite("1\ta.txt\n".into(), EditOutcome::Closed);
        let mut operator = Scripted::default();
        let mover = LockedManifest { locked: Cell::new(usize::MAX) };
        let mut session = Session::new(config(dir.path(), ManifestFormat::Numbered), &mut editor, &mut operator, &mover);

        let err = session.run(&mut entries).unwrap_err();
        match err {
            SessionError::Abandoned { stage, manifest } => {
                assert_eq!(stage, Stage::Cleanup);
                assert!(manifest.exists());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(operator.reports.len(), 1);
        assert_eq!(operator.waits, 1);
    }
}
