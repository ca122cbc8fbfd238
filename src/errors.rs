//! Typed error definitions for desk_organizer.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("Ignore rules file unreadable at {path}: {source}")]
    RulesFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Partial copy of '{src}' -> '{dest}' aborted: {reason}")]
    PartialTreeCopy {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error("Moved '{src}' but failed to remove the source: {reason}")]
    SourceCleanup { src: PathBuf, reason: String },

    #[error("Unexpected I/O failure on {path}: {source}")]
    UnexpectedIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizerError {
    /// Stable numeric code for logs and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            OrganizerError::ConfigMissing(_) => 2,
            OrganizerError::ConfigInvalid(_) => 3,
            OrganizerError::RulesFileUnreadable { .. } => 10,
            OrganizerError::PartialTreeCopy { .. } => 20,
            OrganizerError::SourceCleanup { .. } => 21,
            OrganizerError::UnexpectedIo { .. } => 30,
        }
    }

    /// Only configuration errors are allowed to stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrganizerError::ConfigMissing(_) | OrganizerError::ConfigInvalid(_)
        )
    }
}
