//! Directory tree move.
//! Copies the tree into a hidden staging directory next to the destination,
//! renames the staging directory into place, and only then removes the source.
//!
//! A destination directory under its final name therefore always holds a
//! complete copy; an aborted attempt leaves only the staging directory behind,
//! which the next attempt discards before copying again.

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::errors::OrganizerError;
use crate::outcome::MoveOutcome;

use super::helpers::io_error_with_help;
use super::util::{copy_file, staging_path, sync_parent};

/// Counts gathered while copying a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub dirs: u64,
    pub files: u64,
    pub links: u64,
    pub bytes: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TreeMover;

impl TreeMover {
    pub fn new() -> Self {
        TreeMover
    }

    /// Move `source` to `destination` (which must not exist yet).
    pub fn move_directory(&self, source: &Path, destination: &Path) -> MoveOutcome {
        let staging = staging_path(destination);
        if let Err(e) = discard_stale_staging(&staging) {
            error!(staging = %staging.display(), error = %e, "Cannot clear leftover staging directory; source left intact");
            return MoveOutcome::FailedPartial;
        }
        let stats = match copy_tree(source, &staging) {
            Ok(stats) => stats,
            Err(e) => {
                let err = OrganizerError::PartialTreeCopy {
                    src: source.to_path_buf(),
                    dest: staging,
                    reason: format!("{e:#}"),
                };
                error!(code = err.code(), error = %err, "Directory copy aborted; source left intact");
                return MoveOutcome::FailedPartial;
            }
        };

        if fs::symlink_metadata(destination).is_ok() {
            error!(
                dest = %destination.display(),
                staging = %staging.display(),
                "Destination appeared while copying; staged copy left in place"
            );
            return MoveOutcome::FailedPartial;
        }
        if let Err(e) = fs::rename(&staging, destination) {
            let err = io_error_with_help("rename staged directory into place", destination)(e);
            error!(error = %err, "Directory move not completed; source left intact");
            return MoveOutcome::FailedPartial;
        }
        sync_parent(destination);

        match fs::remove_dir_all(source) {
            Ok(()) => info!(
                src = %source.display(),
                dest = %destination.display(),
                files = stats.files,
                bytes = stats.bytes,
                "Copied directory and removed source"
            ),
            Err(e) => {
                let err = OrganizerError::SourceCleanup {
                    src: source.to_path_buf(),
                    reason: io_error_with_help("remove source directory", source)(e).to_string(),
                };
                error!(code = err.code(), error = %err, "Source cleanup failed; data is safe at destination");
            }
        }
        MoveOutcome::Moved
    }
}

/// A staging directory from an earlier failed attempt may hold files the
/// source no longer has; it is never the only copy of anything.
fn discard_stale_staging(staging: &Path) -> Result<()> {
    match fs::symlink_metadata(staging) {
        Ok(meta) if meta.is_dir() => {
            debug!(staging = %staging.display(), "Removing leftover staging directory");
            fs::remove_dir_all(staging).map_err(io_error_with_help("remove staging directory", staging))
        }
        Ok(_) => fs::remove_file(staging).map_err(io_error_with_help("remove staging entry", staging)),
        Err(_) => Ok(()),
    }
}

/// Mirror `source` into `target`: directories first (walk order), then files in parallel.
/// Stops at the first failure; nothing under `source` is modified.
pub fn copy_tree(source: &Path, target: &Path) -> Result<CopyStats> {
    fs::create_dir_all(target).map_err(io_error_with_help("create directory", target))?;

    let mut stats = CopyStats::default();
    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| anyhow!("walk '{}': {}", source.display(), e))?;
        let rel = entry.path().strip_prefix(source)?;
        let dst = target.join(rel);
        let ftype = entry.file_type();
        if ftype.is_dir() {
            fs::create_dir_all(&dst).map_err(io_error_with_help("create directory", &dst))?;
            stats.dirs += 1;
        } else if ftype.is_file() {
            files.push((entry.into_path(), dst));
        } else if ftype.is_symlink() {
            copy_symlink(entry.path(), &dst)?;
            stats.links += 1;
        } else {
            warn!(path = %entry.path().display(), "Skipping special file inside directory");
        }
    }

    let bytes = AtomicU64::new(0);
    files.par_iter().try_for_each(|(src, dst)| -> Result<()> {
        let n = copy_file(src, dst).map_err(io_error_with_help("copy file to destination", dst))?;
        bytes.fetch_add(n, Ordering::Relaxed);
        debug!(src = %src.display(), dst = %dst.display(), bytes = n, "copied");
        Ok(())
    })?;

    stats.files = files.len() as u64;
    stats.bytes = bytes.into_inner();
    Ok(stats)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(io_error_with_help("read symlink", src))?;
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst).map_err(io_error_with_help("replace symlink", dst))?;
    }
    std::os::unix::fs::symlink(&target, dst).map_err(io_error_with_help("create symlink", dst))?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> Result<()> {
    Err(anyhow!(
        "symlink '{}' inside directory cannot be recreated on this platform",
        src.display()
    ))
}
