//! Lock probe.
//! Answers "is another process holding this file?" by attempting a
//! non-destructive exclusive open.
//!
//! Design:
//! - The file is opened read-write without create or truncate.
//! - Windows: the open uses share mode 0, so any other open handle yields a
//!   sharing/lock violation.
//! - Unix: opens never conflict, so the handle additionally tries a
//!   non-blocking exclusive advisory lock (flock via fs2).
//!
//! Notes:
//! - The handle is dropped before returning; the probe never holds the file.
//! - Errors other than contention (not found, permission denied) are returned
//!   as errors, never reported as "locked".
//! - Probing and moving are separate steps; a file can become locked in between.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::trace;

#[cfg(unix)]
use fs2::FileExt;

/// Stateless probe; a struct so the reconciler can own one alongside its other collaborators.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockProbe;

impl LockProbe {
    pub fn new() -> Self {
        LockProbe
    }

    /// Ok(true) if another handle holds `path` exclusively, Ok(false) if it is free.
    pub fn is_locked(&self, path: &Path) -> io::Result<bool> {
        let file = match open_exclusive(path) {
            Ok(f) => f,
            Err(e) if is_contention(&e) => {
                trace!(path = %path.display(), "exclusive open refused; file in use");
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        #[cfg(unix)]
        {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    let _ = FileExt::unlock(&file);
                }
                Err(e) if is_contention(&e) => {
                    trace!(path = %path.display(), "advisory lock held elsewhere");
                    return Ok(true);
                }
                Err(e) => return Err(e),
            }
        }

        drop(file);
        trace!(path = %path.display(), "file is free");
        Ok(false)
    }
}

#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    OpenOptions::new()
        .read(true)
        .write(true)
        .share_mode(0)
        .open(path)
}

#[cfg(not(windows))]
fn open_exclusive(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

fn is_contention(e: &io::Error) -> bool {
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, ERROR_SHARING_VIOLATION};
        matches!(
            e.raw_os_error().map(|c| c as u32),
            Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION)
        )
    }
    #[cfg(unix)]
    {
        e.kind() == io::ErrorKind::WouldBlock
            || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = e;
        false
    }
}
