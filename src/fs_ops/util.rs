use filetime::{set_file_times, FileTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of in-progress copies inside the destination directory.
pub const STAGING_PREFIX: &str = ".organizer-partial-";

/// Hidden sibling that receives a copy before it is renamed into `dest`.
/// Named after a digest of the entry name so its length stays fixed whatever
/// the entry is called, and a later pass lands in the same place.
pub fn staging_path(dest: &Path) -> PathBuf {
    let name = dest.file_name().unwrap_or_default();
    let digest = blake3::hash(name.as_encoded_bytes());
    dest.with_file_name(format!("{STAGING_PREFIX}{}", &digest.to_hex()[..16]))
}

/// Copy one file, replacing `dst` if present, and carry over access/modify times.
pub(super) fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = fs::copy(src, dst)?;
    // Times are cosmetic; a failure here must not fail the copy.
    if let Ok(meta) = fs::metadata(src) {
        let mtime = FileTime::from_last_modification_time(&meta);
        let atime = FileTime::from_last_access_time(&meta);
        let _ = set_file_times(dst, atime, mtime);
    }
    Ok(bytes)
}

/// Flush a directory entry change to disk; failures are only traced.
pub(super) fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fsync_dir(parent) {
            debug!(dir = %parent.display(), error = %e, "fsync of directory failed");
        }
    }
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
