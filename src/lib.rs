//! Core library for `desk_organizer`.
//!
//! Periodically sweeps every top-level entry of a source directory into a
//! destination directory. Entries matching ignore rules, entries that already
//! exist at the destination and files locked by another process are left alone.
//!
//! Layout:
//! - `config`: XML config loading, defaults and startup validation
//! - `ignore`: ignore rules file with mtime-based reload
//! - `fs_ops`: listing, lock probing and file/tree moves
//! - `reconcile`: one pass over the source directory
//! - `scheduler`: fixed-delay loop with cooperative stop

pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod ignore;
pub mod logging;
pub mod outcome;
pub mod output;
pub mod platform;
pub mod reconcile;
pub mod scheduler;
pub mod shutdown;

pub use config::{default_config_path, path_has_symlink_ancestor, Config, LogLevel};
pub use errors::OrganizerError;
pub use ignore::IgnoreRules;
pub use outcome::{DirectoryEntry, EntryKind, MoveOutcome, PassReport};
pub use reconcile::Reconciler;
pub use scheduler::{Pass, Scheduler, SchedulerHandle, SchedulerState};
pub use shutdown::StopSignal;
