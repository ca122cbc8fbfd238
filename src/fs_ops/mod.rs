//! Filesystem operations used by the reconciler.

mod entry;
mod file_move;
mod helpers;
mod lock;
mod tree;
mod util;

pub use entry::{entry_exists, list_entries};
pub use file_move::{is_destination_taken, move_file, FileMove};
pub use helpers::{io_error_with_help, io_error_with_help_io, is_cross_device};
pub use lock::LockProbe;
pub use tree::{copy_tree, CopyStats, TreeMover};
pub use util::{staging_path, STAGING_PREFIX};
