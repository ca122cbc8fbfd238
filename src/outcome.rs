//! Structured move outcomes.
//! The reconciler never renders prose itself: every decision becomes a
//! `MoveOutcome` which is emitted as a tracing event with stable fields.

use std::ffi::{OsStr, OsString};
use std::fmt;
use tracing::{debug, error, info};

/// Kind of a top-level entry found in the source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// One immediate child of the source directory, valid for a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Name used for rule matching and logs (lossy for non UTF-8 names).
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// Severity understood by the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Information,
}

/// Result of attempting to move one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    SkippedAlreadyExists,
    SkippedLocked,
    SkippedIgnored,
    FailedPartial,
}

impl MoveOutcome {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            MoveOutcome::Moved => "moved",
            MoveOutcome::SkippedAlreadyExists => "skipped_already_exists",
            MoveOutcome::SkippedLocked => "skipped_locked",
            MoveOutcome::SkippedIgnored => "skipped_ignored",
            MoveOutcome::FailedPartial => "failed_partial",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            MoveOutcome::FailedPartial => Severity::Error,
            _ => Severity::Information,
        }
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveOutcome::Moved => "moved to destination",
            MoveOutcome::SkippedAlreadyExists => "destination already exists; not moved",
            MoveOutcome::SkippedLocked => "locked by another process; not moved",
            MoveOutcome::SkippedIgnored => "matches an ignore rule",
            MoveOutcome::FailedPartial => "move failed; source left in place",
        };
        f.write_str(s)
    }
}

/// Emit one structured event for an entry outcome.
/// Ignored entries are routine and only show up at debug level.
pub fn emit(entry: &DirectoryEntry, outcome: MoveOutcome) {
    let name = entry.display_name();
    let kind = entry.kind.as_str();
    let code = outcome.code();
    match (outcome, outcome.severity()) {
        (MoveOutcome::SkippedIgnored, _) => {
            debug!(entry = %name, kind, outcome = code, "{outcome}")
        }
        (_, Severity::Information) => info!(entry = %name, kind, outcome = code, "{outcome}"),
        (_, Severity::Error) => error!(entry = %name, kind, outcome = code, "{outcome}"),
    }
}

/// All outcomes of one reconciliation pass, in processing order.
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    entries: Vec<(DirectoryEntry, MoveOutcome)>,
}

impl PassReport {
    pub fn record(&mut self, entry: DirectoryEntry, outcome: MoveOutcome) {
        emit(&entry, outcome);
        self.entries.push((entry, outcome));
    }

    pub fn entries(&self) -> &[(DirectoryEntry, MoveOutcome)] {
        &self.entries
    }

    /// Outcome recorded for `name`, if the entry was seen this pass.
    pub fn outcome_for(&self, name: &str) -> Option<MoveOutcome> {
        self.entries
            .iter()
            .find(|(e, _)| e.name.as_os_str() == OsStr::new(name))
            .map(|(_, o)| *o)
    }

    pub fn count(&self, outcome: MoveOutcome) -> usize {
        self.entries.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failures_are_errors() {
        for o in [
            MoveOutcome::Moved,
            MoveOutcome::SkippedAlreadyExists,
            MoveOutcome::SkippedLocked,
            MoveOutcome::SkippedIgnored,
        ] {
            assert_eq!(o.severity(), Severity::Information, "{}", o.code());
        }
        assert_eq!(MoveOutcome::FailedPartial.severity(), Severity::Error);
    }

    #[test]
    fn report_lookup_and_counts() {
        let mut r = PassReport::default();
        r.record(DirectoryEntry::new("a.txt", EntryKind::File), MoveOutcome::Moved);
        r.record(DirectoryEntry::new("b.txt", EntryKind::File), MoveOutcome::SkippedLocked);
        r.record(DirectoryEntry::new("sub", EntryKind::Directory), MoveOutcome::Moved);
        assert_eq!(r.outcome_for("b.txt"), Some(MoveOutcome::SkippedLocked));
        assert_eq!(r.outcome_for("missing"), None);
        assert_eq!(r.count(MoveOutcome::Moved), 2);
        assert_eq!(r.entries()[2].0.kind, EntryKind::Directory);
    }
}
