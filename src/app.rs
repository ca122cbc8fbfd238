//! Application orchestrator.
//! Loads config (or writes a template), initializes logging, validates paths,
//! starts the scheduler and waits for Ctrl-C / SIGTERM to stop it.

use anyhow::{Context, Result};
use tracing::{error, info};

use desk_organizer::config::{load_or_init, validate_and_normalize, LoadResult, CONFIG_ENV};
use desk_organizer::logging::init_tracing;
use desk_organizer::output as out;
use desk_organizer::{Reconciler, Scheduler};

/// Run the service until interrupted. Only configuration and startup
/// failures are returned; per-pass problems are logged by the worker.
pub fn run() -> Result<()> {
    // Create template config if none exists (before logging init)
    let (mut cfg, cfg_path) = match load_or_init()? {
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!(
                "A template desk_organizer config was written to: {}",
                path.display()
            ));
            out::print_info(
                "Edit the file to set `source_directory`, `destination_directory` and `cool_down_seconds`. Example:\n\n<config>\n  <cool_down_seconds>60</cool_down_seconds>\n  <source_directory>/home/me/Desktop</source_directory>\n  <destination_directory>/home/me/Desktop Archive</destination_directory>\n  <log_trace>true</log_trace>\n</config>\n",
            );
            out::print_info(&format!(
                "Then start the service again. To use a different location set {CONFIG_ENV}."
            ));
            return Ok(());
        }
        LoadResult::Loaded { config, path } => (config, path),
    };

    // Held until return so the file appender flushes on exit.
    let _guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), cfg.log_json)
        .context("Failed to initialize logging")?;

    if let Err(e) = validate_and_normalize(&mut cfg) {
        error!(config = %cfg_path.display(), error = %format!("{e:#}"), "Invalid configuration");
        return Err(e);
    }

    let reconciler = Reconciler::from_config(&cfg).context("Failed to locate the ignore rules file")?;
    let rules_path = reconciler.rules().path();
    info!(
        config = %cfg_path.display(),
        source = %reconciler.source().display(),
        destination = %reconciler.destination().display(),
        rules = %rules_path.display(),
        "Starting desk_organizer"
    );

    let handle = Scheduler::new(cfg.cool_down)
        .start(reconciler)
        .context("Failed to start the scheduler thread")?;

    let stop = handle.stop_signal();
    if let Err(e) = ctrlc::set_handler(move || {
        out::print_warn("Received interrupt; finishing the current pass and shutting down...");
        stop.request();
    }) {
        handle.stop();
        handle.join();
        return Err(e).context("Failed to install signal handler");
    }

    handle.join();
    info!("desk_organizer stopped");
    Ok(())
}
