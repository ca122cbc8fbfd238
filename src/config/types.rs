//! Core configuration types.
//! - Config holds the runtime settings of the service.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Program-defined verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    #[default]
    Quiet,
    /// Informational messages (moves, skips)
    Normal,
    /// Adds debug detail (ignored entries, unchanged rules)
    Info,
    /// Everything, including per-file copy traces
    Debug,
}

impl LogLevel {
    /// Parse common string names into a LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `log_trace = true` turns on informational messages; errors are always shown.
    pub fn from_trace(log_trace: bool) -> Self {
        if log_trace {
            LogLevel::Normal
        } else {
            LogLevel::Quiet
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration of the organizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Delay before every pass
    pub cool_down: Duration,
    /// Directory drained on every pass
    pub source_directory: PathBuf,
    /// Directory receiving moved entries
    pub destination_directory: PathBuf,
    /// Console/file verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Emit JSON log lines instead of compact text
    pub log_json: bool,
    /// Explicit rules file; default is ignore.txt beside the executable
    pub ignore_file: Option<PathBuf>,
}

impl Config {
    /// Construct a Config with the required settings; the rest use defaults.
    pub fn new(
        source_directory: impl Into<PathBuf>,
        destination_directory: impl Into<PathBuf>,
        cool_down: Duration,
    ) -> Self {
        Self {
            cool_down,
            source_directory: source_directory.into(),
            destination_directory: destination_directory.into(),
            log_level: LogLevel::default(),
            log_file: None,
            log_json: false,
            ignore_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_flag_maps_to_levels() {
        assert_eq!(LogLevel::from_trace(true), LogLevel::Normal);
        assert_eq!(LogLevel::from_trace(false), LogLevel::Quiet);
    }

    #[test]
    fn new_uses_quiet_defaults() {
        let cfg = Config::new("/a", "/b", Duration::from_secs(5));
        assert_eq!(cfg.log_level, LogLevel::Quiet);
        assert!(cfg.ignore_file.is_none());
        assert!(!cfg.log_json);
    }
}
