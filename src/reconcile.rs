//! One reconciliation pass.
//! Refreshes the ignore rules, lists the source directory and moves every
//! eligible top-level entry into the destination directory.
//!
//! Order within a pass:
//! - all files (sorted by name), then all directories (sorted by name)
//! - per entry: ignore rules, destination conflict, lock probe (files only), move

use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::errors::OrganizerError;
use crate::fs_ops::{entry_exists, is_destination_taken, list_entries, move_file, LockProbe, TreeMover};
use crate::ignore::IgnoreRules;
use crate::outcome::{DirectoryEntry, EntryKind, MoveOutcome, PassReport};

/// Owns everything a pass needs, including the cached ignore rules.
#[derive(Debug)]
pub struct Reconciler {
    source: PathBuf,
    destination: PathBuf,
    rules: IgnoreRules,
    probe: LockProbe,
    mover: TreeMover,
}

impl Reconciler {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, rules: IgnoreRules) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            rules,
            probe: LockProbe::new(),
            mover: TreeMover::new(),
        }
    }

    /// Build from validated configuration; rules come from `ignore_file` or
    /// `ignore.txt` beside the executable.
    pub fn from_config(cfg: &Config) -> std::io::Result<Self> {
        let rules = match &cfg.ignore_file {
            Some(path) => IgnoreRules::from_file(path),
            None => IgnoreRules::beside_executable()?,
        };
        Ok(Self::new(&cfg.source_directory, &cfg.destination_directory, rules))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Run one pass. Per-entry problems become outcomes; only failures that
    /// prevent the pass as a whole (unlistable source, missing destination)
    /// are returned as errors.
    pub fn run_pass(&mut self) -> Result<PassReport, OrganizerError> {
        if let Err(e) = self.rules.refresh_if_stale() {
            error!(code = e.code(), error = %e, "Could not refresh ignore rules; using last known rules");
        }

        if !self.destination.is_dir() {
            return Err(OrganizerError::UnexpectedIo {
                path: self.destination.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "destination directory is missing",
                ),
            });
        }
        let entries = list_entries(&self.source).map_err(|source| OrganizerError::UnexpectedIo {
            path: self.source.clone(),
            source,
        })?;
        let (files, dirs): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| e.kind == EntryKind::File);

        let mut report = PassReport::default();
        for entry in files {
            let outcome = self.reconcile_file(&entry);
            report.record(entry, outcome);
        }
        for entry in dirs {
            let outcome = self.reconcile_dir(&entry);
            report.record(entry, outcome);
        }

        let moved = report.count(MoveOutcome::Moved);
        let failed = report.count(MoveOutcome::FailedPartial);
        if moved > 0 || failed > 0 {
            info!(moved, failed, seen = report.entries().len(), "Pass complete");
        } else {
            debug!(seen = report.entries().len(), "Pass complete; nothing to move");
        }
        Ok(report)
    }

    fn reconcile_file(&self, entry: &DirectoryEntry) -> MoveOutcome {
        if self.rules.is_ignored(&entry.display_name()) {
            return MoveOutcome::SkippedIgnored;
        }
        let src = self.source.join(&entry.name);
        let dest = self.destination.join(&entry.name);
        if entry_exists(&dest) {
            return MoveOutcome::SkippedAlreadyExists;
        }
        match self.probe.is_locked(&src) {
            Ok(true) => return MoveOutcome::SkippedLocked,
            Ok(false) => {}
            Err(e) => {
                error!(entry = %entry.display_name(), error = %e, "Lock probe failed; skipping file");
                return MoveOutcome::FailedPartial;
            }
        }
        match move_file(&src, &dest) {
            Ok(_) => MoveOutcome::Moved,
            Err(e) if is_destination_taken(&e) => {
                info!(entry = %entry.display_name(), "Destination appeared during the pass; skipping");
                MoveOutcome::SkippedAlreadyExists
            }
            Err(e) => {
                error!(entry = %entry.display_name(), error = %e, "File move failed");
                MoveOutcome::FailedPartial
            }
        }
    }

    fn reconcile_dir(&self, entry: &DirectoryEntry) -> MoveOutcome {
        if self.rules.is_ignored(&entry.display_name()) {
            return MoveOutcome::SkippedIgnored;
        }
        let src = self.source.join(&entry.name);
        let dest = self.destination.join(&entry.name);
        if entry_exists(&dest) {
            return MoveOutcome::SkippedAlreadyExists;
        }
        self.mover.move_directory(&src, &dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf, PathBuf) {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        let rules_dir = td.path().join("rules");
        for d in [&src, &dst, &rules_dir] {
            fs::create_dir_all(d).unwrap();
        }
        (td, src, dst, rules_dir)
    }

    #[test]
    fn missing_rules_file_does_not_stop_the_pass() {
        let (_td, src, dst, rules_dir) = setup();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("desktop.ini"), "x").unwrap();
        let mut r = Reconciler::new(&src, &dst, IgnoreRules::in_dir(&rules_dir));

        let report = r.run_pass().unwrap();
        assert_eq!(report.outcome_for("a.txt"), Some(MoveOutcome::Moved));
        assert_eq!(report.outcome_for("desktop.ini"), Some(MoveOutcome::SkippedIgnored));
        assert!(src.join("desktop.ini").exists());
    }

    #[test]
    fn files_are_processed_before_directories() {
        let (_td, src, dst, rules_dir) = setup();
        fs::create_dir(src.join("a_dir")).unwrap();
        fs::write(src.join("z.txt"), "z").unwrap();
        let mut r = Reconciler::new(&src, &dst, IgnoreRules::in_dir(&rules_dir));

        let report = r.run_pass().unwrap();
        let kinds: Vec<_> = report.entries().iter().map(|(e, _)| e.kind).collect();
        assert_eq!(kinds, [EntryKind::File, EntryKind::Directory]);
    }

    #[test]
    fn same_named_directory_at_destination_blocks_file() {
        let (_td, src, dst, rules_dir) = setup();
        fs::write(src.join("report"), "file").unwrap();
        fs::create_dir(dst.join("report")).unwrap();
        let mut r = Reconciler::new(&src, &dst, IgnoreRules::in_dir(&rules_dir));

        let report = r.run_pass().unwrap();
        assert_eq!(report.outcome_for("report"), Some(MoveOutcome::SkippedAlreadyExists));
        assert!(src.join("report").is_file());
    }

    #[test]
    fn unlistable_source_is_a_pass_error() {
        let (_td, src, dst, rules_dir) = setup();
        fs::remove_dir(&src).unwrap();
        let mut r = Reconciler::new(&src, &dst, IgnoreRules::in_dir(&rules_dir));
        let err = r.run_pass().unwrap_err();
        assert!(matches!(err, OrganizerError::UnexpectedIo { .. }));
        assert!(!err.is_fatal());
    }
}
