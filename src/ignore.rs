//! Ignore rules.
//! Loads exact names and `regex_` patterns from a plain-text rules file and
//! caches them until the file's modification time changes.
//!
//! Notes:
//! - `desktop.ini` and `Desktop` are always ignored, even before the first successful load.
//! - Regex rules must match the whole name (they are anchored on compile).
//! - A failed refresh keeps the previous rule set.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info};

use crate::errors::OrganizerError;

/// Prefix marking a line as a regular-expression rule.
pub const REGEX_PREFIX: &str = "regex_";
/// Names ignored regardless of the rules file.
pub const BUILTIN_IGNORED: [&str; 2] = ["desktop.ini", "Desktop"];
/// Canonical rules file name; lookup is case-insensitive.
pub const RULES_FILE_NAME: &str = "ignore.txt";

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Reloaded,
    Unchanged,
}

/// Parsed rules: exact names plus ordered, anchored patterns.
#[derive(Debug, Clone)]
pub struct RuleSet {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            exact: BUILTIN_IGNORED.iter().map(|s| s.to_string()).collect(),
            patterns: Vec::new(),
        }
    }
}

impl RuleSet {
    /// Parse rules file content. Invalid patterns are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let mut set = RuleSet::default();
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        for (idx, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match line.strip_prefix(REGEX_PREFIX) {
                Some(pattern) => match Regex::new(&format!("^(?:{pattern})$")) {
                    Ok(re) => set.patterns.push(re),
                    Err(e) => error!(line = idx + 1, %pattern, error = %e, "Skipping invalid ignore pattern"),
                },
                None => {
                    set.exact.insert(line.to_string());
                }
            }
        }
        set
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.exact.contains(name) || self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn pattern_len(&self) -> usize {
        self.patterns.len()
    }
}

#[derive(Debug, Clone)]
enum Location {
    /// Explicit path from configuration.
    File(PathBuf),
    /// Case-insensitive `ignore.txt` inside this directory.
    Dir(PathBuf),
}

/// Cached ignore rules owned by the reconciler.
#[derive(Debug)]
pub struct IgnoreRules {
    location: Location,
    rules: RuleSet,
    loaded_mtime: Option<SystemTime>,
    loads: u64,
}

impl IgnoreRules {
    /// Rules read from an explicit file path.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Rules read from `ignore.txt` (any case) inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::Dir(dir.into()))
    }

    /// Rules read from `ignore.txt` next to the running executable.
    pub fn beside_executable() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::in_dir(dir))
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            rules: RuleSet::default(),
            loaded_mtime: None,
            loads: 0,
        }
    }

    /// Path the next refresh will read.
    pub fn path(&self) -> PathBuf {
        match &self.location {
            Location::File(p) => p.clone(),
            Location::Dir(dir) => locate_case_insensitive(dir, RULES_FILE_NAME),
        }
    }

    /// Reload the rules if the file's mtime differs from the last successful load.
    pub fn refresh_if_stale(&mut self) -> Result<Refresh, OrganizerError> {
        let path = self.path();
        let unreadable = |source| OrganizerError::RulesFileUnreadable {
            path: path.clone(),
            source,
        };

        let mtime = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(unreadable)?;
        if self.loaded_mtime == Some(mtime) {
            debug!(path = %path.display(), "Ignore rules unchanged");
            return Ok(Refresh::Unchanged);
        }

        let content = fs::read_to_string(&path).map_err(unreadable)?;
        self.rules = RuleSet::parse(&content);
        self.loaded_mtime = Some(mtime);
        self.loads += 1;
        info!(
            path = %path.display(),
            exact = self.rules.exact_len(),
            patterns = self.rules.pattern_len(),
            "Loaded ignore rules"
        );
        Ok(Refresh::Reloaded)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.rules.is_ignored(name)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Number of times the rules file was actually read and parsed.
    pub fn load_count(&self) -> u64 {
        self.loads
    }
}

/// Prefer the exact name, then the capitalised variant, then any case variant present.
fn locate_case_insensitive(dir: &Path, name: &str) -> PathBuf {
    let exact = dir.join(name);
    if exact.is_file() {
        return exact;
    }
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        let capitalised = dir.join(format!("{}{}", first.to_ascii_uppercase(), chars.as_str()));
        if capitalised.is_file() {
            return capitalised;
        }
    }
    if let Ok(rd) = fs::read_dir(dir) {
        for ent in rd.flatten() {
            if ent.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
                return ent.path();
            }
        }
    }
    exact
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn builtins_ignored_before_any_load() {
        let td = tempdir().unwrap();
        let rules = IgnoreRules::in_dir(td.path());
        for name in BUILTIN_IGNORED {
            assert!(rules.is_ignored(name), "{name} should be ignored");
        }
        assert!(!rules.is_ignored("desktop"));
    }

    #[test]
    fn regex_rules_match_whole_name() {
        let set = RuleSet::parse("regex_^a.*z$\nregex_temp\\d+\nnotes.md\n");
        assert!(set.is_ignored("abcz"));
        assert!(!set.is_ignored("xabcz"));
        assert!(set.is_ignored("temp42"));
        assert!(!set.is_ignored("mytemp42.log"));
        assert!(set.is_ignored("notes.md"));
        assert!(!set.is_ignored("notes.md.bak"));
        assert_eq!(set.pattern_len(), 2);
    }

    #[test]
    fn crlf_bom_and_blank_lines_are_tolerated() {
        let set = RuleSet::parse("\u{feff}alpha.txt\r\n\r\nregex_b.*\r\n");
        assert!(set.is_ignored("alpha.txt"));
        assert!(set.is_ignored("beta"));
        assert!(!set.is_ignored(""));
        assert_eq!(set.exact_len(), BUILTIN_IGNORED.len() + 1);
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let set = RuleSet::parse("regex_(unclosed\nregex_ok.*\n");
        assert_eq!(set.pattern_len(), 1);
        assert!(set.is_ignored("okay"));
    }

    #[test]
    fn refresh_reads_once_per_mtime() {
        let td = tempdir().unwrap();
        let path = td.path().join("ignore.txt");
        fs::write(&path, "keep.me\n").unwrap();
        let mut rules = IgnoreRules::in_dir(td.path());

        assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Reloaded);
        assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Unchanged);
        assert_eq!(rules.load_count(), 1);
        assert!(rules.is_ignored("keep.me"));

        fs::write(&path, "other.me\n").unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(later)).unwrap();
        assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Reloaded);
        assert_eq!(rules.load_count(), 2);
        assert!(!rules.is_ignored("keep.me"));
        assert!(rules.is_ignored("other.me"));
    }

    #[test]
    fn missing_file_surfaces_error_and_keeps_rules() {
        let td = tempdir().unwrap();
        let path = td.path().join("rules.txt");
        fs::write(&path, "precious\n").unwrap();
        let mut rules = IgnoreRules::from_file(&path);
        rules.refresh_if_stale().unwrap();

        fs::remove_file(&path).unwrap();
        let err = rules.refresh_if_stale().unwrap_err();
        assert!(matches!(err, OrganizerError::RulesFileUnreadable { .. }));
        assert!(rules.is_ignored("precious"), "previous rules must be retained");
    }

    #[test]
    fn capitalised_variant_is_found() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("Ignore.txt"), "x\n").unwrap();
        let mut rules = IgnoreRules::in_dir(td.path());
        rules.refresh_if_stale().unwrap();
        assert!(rules.is_ignored("x"));
    }
}
