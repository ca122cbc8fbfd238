//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel (no RUST_LOG override here).
//! - JSON/non-JSON formatting is selected via the `json` flag and applies to every sink.
//! - If `log_file` is provided and passes safety checks, a non-blocking file layer is added.
//!
//! Implementation notes:
//! - File logging uses tracing_appender::non_blocking to avoid blocking on I/O.
//! - We refuse file logging if any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use std::fmt as stdfmt;
use std::io;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry;
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{path_has_symlink_ancestor, LogLevel};
use crate::output as out;
use crate::platform::open_log_file_secure_append;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
pub struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

/// Map the configured level onto a tracing filter.
/// `Quiet` (log_trace off) keeps only errors; `Normal` (log_trace on) adds moves and skips.
pub fn to_level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn fmt_layer<W>(json: bool, ansi: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(ansi)
        .with_writer(writer);
    if json {
        base.json().boxed()
    } else {
        base.compact().boxed()
    }
}

/// Build (without installing) the subscriber used by the service.
/// `writer` receives console output; `file` is an optional extra sink.
/// Colors are used for compact console output when stdout is a terminal.
pub fn build_subscriber<W>(
    lvl: LogLevel,
    json: bool,
    writer: W,
    file: Option<NonBlocking>,
) -> impl Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(json, !json && atty::is(atty::Stream::Stdout), writer)];
    if let Some(file_writer) = file {
        layers.push(fmt_layer(json, false, file_writer));
    }
    registry()
        .with(layers)
        .with(EnvFilter::new(to_level_filter(lvl).to_string()))
}

/// Open the log file behind a non-blocking writer. Symlinked ancestors and open
/// failures are reported on stderr; the service then logs to stdout only.
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    let refused = match path_has_symlink_ancestor(path) {
        Ok(false) => None,
        Ok(true) => Some("an ancestor directory is a symlink".to_string()),
        Err(e) => Some(format!("cannot check ancestors: {e}")),
    };
    if let Some(reason) = refused {
        eprintln!("Not logging to {}: {reason}", path.display());
        return None;
    }

    open_log_file_secure_append(path)
        .map(tracing_appender::non_blocking)
        .map_err(|e| eprintln!("Not logging to {}: {e}", path.display()))
        .ok()
}

/// Initialize tracing based on LogLevel and format. Returns an optional WorkerGuard
/// if a file appender is created (must be held until shutdown to flush logs).
pub fn init_tracing(
    lvl: LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let (file_writer, guard) = match log_file.map(|p| (p, maybe_open_non_blocking_writer(p))) {
        Some((_, Some((writer, guard)))) => (Some(writer), Some(guard)),
        Some((path, None)) => {
            out::print_warn(&format!(
                "Requested file logging to '{}' was not enabled. Check that the parent directory is writable by this process and that no ancestor is a symlink. Logs will continue to stdout.",
                path.display()
            ));
            (None, None)
        }
        None => (None, None),
    };

    build_subscriber(lvl, json, io::stdout, file_writer).try_init()?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_flag_maps_to_info_or_error() {
        assert_eq!(to_level_filter(LogLevel::from_trace(true)), LevelFilter::INFO);
        assert_eq!(to_level_filter(LogLevel::from_trace(false)), LevelFilter::ERROR);
        assert_eq!(to_level_filter(LogLevel::Debug), LevelFilter::TRACE);
    }
}
