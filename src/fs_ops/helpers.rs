//! I/O error helpers.
//!
//! Enrich io::Error with the operation, the path and a platform hint so that a
//! single log line is enough to diagnose a skipped entry.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Short hint for well-known OS error codes.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
            libc::EBUSY => Some("resource busy; another process is using it"),
            libc::ENOENT => Some("path not found; it may have been removed meanwhile"),
            libc::EEXIST => Some("already exists"),
            libc::EISDIR => Some("is a directory"),
            libc::ENOTEMPTY => Some("directory not empty"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ENAMETOOLONG => Some("filename or path too long"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::{
            ERROR_ACCESS_DENIED, ERROR_ALREADY_EXISTS, ERROR_DISK_FULL, ERROR_FILE_EXISTS,
            ERROR_FILE_NOT_FOUND, ERROR_LOCK_VIOLATION, ERROR_NOT_SAME_DEVICE, ERROR_PATH_NOT_FOUND,
            ERROR_SHARING_VIOLATION,
        };
        match code as u32 {
            ERROR_ACCESS_DENIED => Some("access denied; check permissions"),
            ERROR_NOT_SAME_DEVICE => Some("not same device; cross-filesystem move"),
            ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION => Some("file is in use by another process"),
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Some("path not found; it may have been removed meanwhile"),
            ERROR_FILE_EXISTS | ERROR_ALREADY_EXISTS => Some("already exists"),
            ERROR_DISK_FULL => Some("insufficient disk space"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(hint) = os_hint(code) {
                msg.push_str(" (");
                msg.push_str(hint);
                msg.push(')');
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if e.kind() == io::ErrorKind::PermissionDenied {
                msg.push_str(" (permission denied)");
            }
        }
    }
    msg
}

/// Adapter for anyhow::Result code paths.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code paths; preserves the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

/// True when a rename failed only because source and destination are on different volumes.
pub fn is_cross_device(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    #[cfg(unix)]
    {
        e.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(windows)]
    {
        e.raw_os_error() == Some(windows_sys::Win32::Foundation::ERROR_NOT_SAME_DEVICE as i32)
    }
    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_op_and_path() {
        let e = io::Error::from(io::ErrorKind::NotFound);
        let err = io_error_with_help("copy file", Path::new("/x/y"))(e);
        let msg = err.to_string();
        assert!(msg.starts_with("copy file '/x/y'"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn os_codes_get_hints() {
        let e = io::Error::from_raw_os_error(libc::EXDEV);
        assert!(is_cross_device(&e));
        let mapped = io_error_with_help_io("rename", Path::new("a"))(e);
        assert!(mapped.to_string().contains("cross-filesystem"));
        assert!(mapped.to_string().contains(&format!("[os code: {}]", libc::EXDEV)));
    }
}
