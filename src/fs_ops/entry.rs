use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::outcome::{DirectoryEntry, EntryKind};

use super::helpers::io_error_with_help_io;

/// List the immediate children of `dir` as files and directories, sorted by name.
/// Symlinks and special files are not moved and are left out (debug log).
pub fn list_entries(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let rd = fs::read_dir(dir).map_err(io_error_with_help_io("list directory", dir))?;
    let mut out = Vec::new();
    for ent in rd {
        let ent = ent.map_err(io_error_with_help_io("read directory entry", dir))?;
        // DirEntry::file_type does not follow symlinks.
        let ftype = match ent.file_type() {
            Ok(t) => t,
            Err(e) => {
                debug!(path = %ent.path().display(), error = %e, "entry vanished while listing");
                continue;
            }
        };
        let kind = if ftype.is_file() {
            EntryKind::File
        } else if ftype.is_dir() {
            EntryKind::Directory
        } else {
            debug!(path = %ent.path().display(), symlink = ftype.is_symlink(), "not a regular file or directory; skipped");
            continue;
        };
        out.push(DirectoryEntry::new(ent.file_name(), kind));
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// True if anything (file, directory or link) already has this path.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
