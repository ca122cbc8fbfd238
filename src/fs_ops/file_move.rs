//! File move implementation.
//! Links the file at its destination name and unlinks the source, so an entry
//! that appeared at the destination meanwhile is never replaced. Across
//! filesystems it copies into a hidden staging name, links that into place
//! the same way, then removes the source.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::errors::OrganizerError;

use super::helpers::{io_error_with_help, io_error_with_help_io, is_cross_device};
use super::util::{copy_file, staging_path, sync_parent};

/// How a file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMove {
    Renamed,
    /// Copied across volumes; `source_removed` is false if cleanup failed.
    Copied { source_removed: bool },
}

/// Move `src` to `dest` without replacing anything already at `dest`.
/// An occupied destination fails with an `io::Error` of kind `AlreadyExists`
/// inside the returned error.
pub fn move_file(src: &Path, dest: &Path) -> Result<FileMove> {
    match place_without_replacing(src, dest) {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dest.display(), "Renamed file");
            return Ok(FileMove::Renamed);
        }
        Err(e) if is_cross_device(&e) => {
            warn!(src = %src.display(), dest = %dest.display(), "Rename crosses devices; copying instead");
        }
        Err(e) => return Err(io_error_with_help_io("move file", src)(e).into()),
    }

    let staging = staging_path(dest);
    if let Err(e) = copy_file(src, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(io_error_with_help("copy file to destination", &staging)(e));
    }
    if let Err(e) = place_without_replacing(&staging, dest) {
        let _ = fs::remove_file(&staging);
        return Err(io_error_with_help_io("move staged file into place", dest)(e).into());
    }
    sync_parent(dest);

    let source_removed = match fs::remove_file(src) {
        Ok(()) => true,
        Err(e) => {
            let err = OrganizerError::SourceCleanup {
                src: src.to_path_buf(),
                reason: io_error_with_help("remove source file", src)(e).to_string(),
            };
            error!(code = err.code(), error = %err, "Source cleanup failed");
            false
        }
    };
    info!(src = %src.display(), dest = %dest.display(), source_removed, "Copied file across devices");
    Ok(FileMove::Copied { source_removed })
}

/// Give `from` the name `to` and drop the old name. A hard link fails on an
/// existing `to`; filesystems without hard links fall back to a rename after
/// an existence check.
fn place_without_replacing(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) if links_unsupported(&e) => {
            debug!(from = %from.display(), error = %e, "Hard link refused; renaming after existence check");
            if fs::symlink_metadata(to).is_ok() {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"));
            }
            fs::rename(from, to)
        }
        Err(e) => Err(e),
    }
}

fn links_unsupported(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::Unsupported {
        return true;
    }
    #[cfg(unix)]
    {
        // EPERM covers filesystems without links and protected_hardlinks on foreign-owned files.
        matches!(
            e.raw_os_error(),
            Some(code) if code == libc::EPERM || code == libc::EOPNOTSUPP || code == libc::ENOTSUP || code == libc::EMLINK
        )
    }
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::{ERROR_INVALID_FUNCTION, ERROR_NOT_SUPPORTED, ERROR_TOO_MANY_LINKS};
        matches!(
            e.raw_os_error().map(|c| c as u32),
            Some(ERROR_INVALID_FUNCTION | ERROR_NOT_SUPPORTED | ERROR_TOO_MANY_LINKS)
        )
    }
    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// True when `err` came from a destination that was already occupied.
pub fn is_destination_taken(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::AlreadyExists)
}
