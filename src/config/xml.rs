//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template when the default config file is missing.
//!
//! Notes:
//! - Unknown elements are rejected so typos surface at startup.
//! - Values are read as text and trimmed before parsing.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::paths::{config_env_is_set, default_config_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::errors::OrganizerError;
use crate::platform::{set_dir_mode_0700, write_config_secure_new};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    cool_down_seconds: Option<String>,
    source_directory: Option<String>,
    destination_directory: Option<String>,
    log_trace: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    log_json: Option<String>,
    ignore_file: Option<String>,
}

/// Outcome of locating the configuration at startup.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { config: Config, path: PathBuf },
    CreatedTemplate(PathBuf),
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(field: &str, v: &Option<String>) -> Result<Option<bool>, OrganizerError> {
    match non_empty(v) {
        None => Ok(None),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(OrganizerError::ConfigInvalid(format!(
                "{field} must be true or false, got '{s}'"
            ))),
        },
    }
}

fn required_path(field: &str, v: &Option<String>) -> Result<PathBuf, OrganizerError> {
    non_empty(v)
        .map(PathBuf::from)
        .ok_or_else(|| OrganizerError::ConfigMissing(format!("<{field}> is required")))
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config, OrganizerError> {
    let secs = non_empty(&parsed.cool_down_seconds)
        .ok_or_else(|| OrganizerError::ConfigMissing("<cool_down_seconds> is required".into()))?;
    let secs: u64 = secs.parse().map_err(|_| {
        OrganizerError::ConfigInvalid(format!(
            "cool_down_seconds must be a whole number of seconds, got '{secs}'"
        ))
    })?;

    let mut cfg = Config::new(
        required_path("source_directory", &parsed.source_directory)?,
        required_path("destination_directory", &parsed.destination_directory)?,
        Duration::from_secs(secs),
    );

    let trace = parse_bool("log_trace", &parsed.log_trace)?.unwrap_or(false);
    cfg.log_level = match non_empty(&parsed.log_level) {
        Some(s) => s.parse::<LogLevel>().map_err(OrganizerError::ConfigInvalid)?,
        None => LogLevel::from_trace(trace),
    };
    cfg.log_file = non_empty(&parsed.log_file).map(PathBuf::from);
    cfg.log_json = parse_bool("log_json", &parsed.log_json)?.unwrap_or(false);
    cfg.ignore_file = non_empty(&parsed.ignore_file).map(PathBuf::from);
    Ok(cfg)
}

/// Parse config XML text.
pub fn parse_config_xml(contents: &str) -> Result<Config, OrganizerError> {
    let parsed: XmlConfig = from_xml_str(contents)
        .map_err(|e| OrganizerError::ConfigInvalid(format!("malformed config xml: {e}")))?;
    xml_to_config(parsed)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| {
        OrganizerError::ConfigMissing(format!("cannot read '{}': {e}", path.display()))
    })?;
    let cfg = parse_config_xml(&contents).with_context(|| format!("config '{}'", path.display()))?;
    Ok(cfg)
}

/// Locate and load the config. A missing explicit (`$DESK_ORGANIZER_CONFIG`)
/// file is fatal; a missing default file gets a template written instead.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path().ok_or_else(|| {
        OrganizerError::ConfigMissing("cannot determine a config location; set DESK_ORGANIZER_CONFIG".into())
    })?;
    if !path.exists() {
        if config_env_is_set() {
            return Err(OrganizerError::ConfigMissing(format!(
                "config file '{}' does not exist",
                path.display()
            ))
            .into());
        }
        create_template_config(&path)?;
        return Ok(LoadResult::CreatedTemplate(path));
    }
    let config = load_config_from_xml_path(&path)?;
    Ok(LoadResult::Loaded { config, path })
}

pub const TEMPLATE: &str = r#"<!--
  desk_organizer configuration (XML)

  cool_down_seconds      -> delay between passes (required, > 0)
  source_directory       -> directory whose entries are moved (required)
  destination_directory  -> directory receiving them (required; created if missing)
  log_trace              -> true to log every move and skip; errors are always logged
  log_level              -> optional override: quiet | normal | info | debug
  log_file               -> optional log file (stdout is always used)
  log_json               -> true for JSON log lines
  ignore_file            -> optional rules file; default is ignore.txt next to the executable

  Rules file: one name per line; lines starting with regex_ are regular expressions
  matched against the whole name.
-->
<config>
  <cool_down_seconds>60</cool_down_seconds>
  <source_directory></source_directory>
  <destination_directory></destination_directory>
  <log_trace>false</log_trace>
</config>
"#;

/// Create the template config file and its parent directory.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        anyhow::bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }
    write_config_secure_new(path, TEMPLATE.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let cfg = parse_config_xml(
            r#"<config>
  <cool_down_seconds> 15 </cool_down_seconds>
  <source_directory>/home/me/Desktop</source_directory>
  <destination_directory>/home/me/Sorted</destination_directory>
  <log_trace>true</log_trace>
  <log_json>false</log_json>
  <ignore_file>/etc/organizer/ignore.txt</ignore_file>
</config>"#,
        )
        .unwrap();
        assert_eq!(cfg.cool_down, Duration::from_secs(15));
        assert_eq!(cfg.source_directory, PathBuf::from("/home/me/Desktop"));
        assert_eq!(cfg.log_level, LogLevel::Normal);
        assert_eq!(cfg.ignore_file, Some(PathBuf::from("/etc/organizer/ignore.txt")));
    }

    #[test]
    fn log_level_overrides_trace_flag() {
        let cfg = parse_config_xml(
            "<config><cool_down_seconds>1</cool_down_seconds><source_directory>a</source_directory>\
             <destination_directory>b</destination_directory><log_trace>true</log_trace>\
             <log_level>debug</log_level></config>",
        )
        .unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn missing_required_field_is_config_missing() {
        let err = parse_config_xml(
            "<config><cool_down_seconds>5</cool_down_seconds><source_directory>a</source_directory></config>",
        )
        .unwrap_err();
        assert!(matches!(err, OrganizerError::ConfigMissing(_)), "{err}");
    }

    #[test]
    fn template_is_incomplete_until_edited() {
        let err = parse_config_xml(TEMPLATE).unwrap_err();
        assert!(matches!(err, OrganizerError::ConfigMissing(_)), "{err}");
    }

    #[test]
    fn bad_values_are_config_invalid() {
        for xml in [
            "<config><cool_down_seconds>soon</cool_down_seconds><source_directory>a</source_directory><destination_directory>b</destination_directory></config>",
            "<config><cool_down_seconds>5</cool_down_seconds><source_directory>a</source_directory><destination_directory>b</destination_directory><log_trace>maybe</log_trace></config>",
            "<config><bogus>1</bogus></config>",
        ] {
            let err = parse_config_xml(xml).unwrap_err();
            assert!(matches!(err, OrganizerError::ConfigInvalid(_)), "{xml}: {err}");
        }
    }
}
