//! Config validation logic.
//! Verifies the interval, directory existence, readability/writability and
//! that source and destination are disjoint. Errors are `ConfigInvalid`, which
//! is fatal at startup.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::types::Config;
use crate::errors::OrganizerError;

/// Longest accepted pause between passes (one year).
pub const MAX_COOL_DOWN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn invalid(msg: String) -> anyhow::Error {
    OrganizerError::ConfigInvalid(msg).into()
}

impl Config {
    /// Validate interval, existence, permissions and disjointness.
    pub fn validate(&self) -> Result<()> {
        if self.cool_down.is_zero() {
            return Err(invalid("cool_down_seconds must be greater than zero".into()));
        }
        if self.cool_down > MAX_COOL_DOWN {
            return Err(invalid(format!(
                "cool_down_seconds must be at most {} (got {})",
                MAX_COOL_DOWN.as_secs(),
                self.cool_down.as_secs()
            )));
        }

        let src = &self.source_directory;
        let dst = &self.destination_directory;

        // 1) Source: must exist, be a directory, and be readable.
        if !src.is_dir() {
            return Err(invalid(format!(
                "source_directory does not exist or is not a directory: {}",
                src.display()
            )));
        }
        fs::read_dir(src).map_err(|e| {
            invalid(format!("cannot read source_directory '{}': {e}", src.display()))
        })?;
        debug!("source_directory readable: {}", src.display());

        // 2) Destination: must be a directory; create if missing; ensure writable.
        ensure_dir_is_or_create(dst)?;
        ensure_writable(dst)?;

        // 3) Resolve symlinks and ensure neither contains the other.
        let src_real = dunce::canonicalize(src).unwrap_or_else(|_| src.clone());
        let dst_real = dunce::canonicalize(dst).unwrap_or_else(|_| dst.clone());
        if src_real == dst_real {
            return Err(invalid(format!(
                "source_directory and destination_directory resolve to the same path: '{}'",
                src_real.display()
            )));
        }
        if dst_real.starts_with(&src_real) {
            return Err(invalid(format!(
                "destination_directory '{}' must not be inside source_directory '{}'",
                dst_real.display(),
                src_real.display()
            )));
        }
        if src_real.starts_with(&dst_real) {
            return Err(invalid(format!(
                "source_directory '{}' must not be inside destination_directory '{}'",
                src_real.display(),
                dst_real.display()
            )));
        }

        info!(
            source = %src.display(),
            destination = %dst.display(),
            cool_down_secs = self.cool_down.as_secs(),
            "Config validated"
        );
        Ok(())
    }
}

/// Validate, then replace both directories with their canonical form.
pub fn validate_and_normalize(cfg: &mut Config) -> Result<()> {
    cfg.validate()?;
    cfg.source_directory = dunce::canonicalize(&cfg.source_directory)?;
    cfg.destination_directory = dunce::canonicalize(&cfg.destination_directory)?;
    Ok(())
}

fn ensure_dir_is_or_create(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(invalid(format!(
                "destination_directory exists but isn't a directory: {}",
                path.display()
            )));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| {
            invalid(format!(
                "failed to create destination_directory '{}': {e}",
                path.display()
            ))
        })?;
        info!("Created destination_directory: {}", path.display());
    }
    Ok(())
}

/// Create and remove a small scratch file.
fn ensure_writable(dir: &Path) -> Result<()> {
    let scratch = dir.join(format!(".desk_organizer_write_check_{}.tmp", std::process::id()));
    match fs::OpenOptions::new().create_new(true).write(true).open(&scratch) {
        Ok(_) => {
            let _ = fs::remove_file(&scratch);
            debug!("destination_directory writable: {}", dir.display());
            Ok(())
        }
        Err(e) => Err(invalid(format!(
            "cannot write to destination_directory '{}': {e}",
            dir.display()
        ))),
    }
}
