//! Rules file loading, matching and mtime-driven reloads.

use std::fs;
use std::time::{Duration, SystemTime};

use desk_organizer::ignore::{IgnoreRules, Refresh, BUILTIN_IGNORED};
use desk_organizer::OrganizerError;
use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;

#[test]
fn exact_and_anchored_regex_matching() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("ignore.txt"), "Thumbs.db\nregex_^a.*z$\nregex_.*\\.tmp\n").unwrap();
    let mut rules = IgnoreRules::in_dir(td.path());
    assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Reloaded);

    assert!(rules.is_ignored("Thumbs.db"));
    assert!(!rules.is_ignored("thumbs.db"));
    assert!(!rules.is_ignored("Thumbs.db.bak"));
    assert!(rules.is_ignored("abcz"));
    assert!(!rules.is_ignored("xabcz"));
    assert!(!rules.is_ignored("abczx"));
    assert!(rules.is_ignored("download.tmp"));
    for name in BUILTIN_IGNORED {
        assert!(rules.is_ignored(name), "{name}");
    }
}

#[test]
fn unchanged_mtime_reads_file_once() {
    let td = tempdir().unwrap();
    let path = td.path().join("ignore.txt");
    fs::write(&path, "one.txt\n").unwrap();
    let mut rules = IgnoreRules::from_file(&path);

    assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Reloaded);
    assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Unchanged);
    assert_eq!(rules.load_count(), 1);

    fs::write(&path, "two.txt\n").unwrap();
    let later = SystemTime::now() + Duration::from_secs(5);
    set_file_mtime(&path, FileTime::from_system_time(later)).unwrap();

    assert_eq!(rules.refresh_if_stale().unwrap(), Refresh::Reloaded);
    assert_eq!(rules.load_count(), 2);
    assert!(rules.is_ignored("two.txt"));
    assert!(!rules.is_ignored("one.txt"));
}

#[test]
fn missing_file_is_reported_and_previous_rules_kept() {
    let td = tempdir().unwrap();
    let path = td.path().join("ignore.txt");
    fs::write(&path, "keep-me\n").unwrap();
    let mut rules = IgnoreRules::from_file(&path);
    rules.refresh_if_stale().unwrap();

    fs::remove_file(&path).unwrap();
    let err = rules.refresh_if_stale().unwrap_err();
    assert!(matches!(err, OrganizerError::RulesFileUnreadable { .. }), "{err}");
    assert!(!err.is_fatal());
    assert!(rules.is_ignored("keep-me"));
}

#[test]
fn never_loaded_rules_still_ignore_builtins() {
    let td = tempdir().unwrap();
    let mut rules = IgnoreRules::in_dir(td.path());
    assert!(rules.refresh_if_stale().is_err());
    assert!(rules.is_ignored("desktop.ini"));
    assert!(rules.is_ignored("Desktop"));
    assert!(!rules.is_ignored("a.txt"));
}

#[test]
fn capitalised_rules_file_is_found() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("Ignore.txt"), "draft.docx\r\n").unwrap();
    let mut rules = IgnoreRules::in_dir(td.path());
    rules.refresh_if_stale().unwrap();
    assert!(rules.is_ignored("draft.docx"));
}

#[test]
fn invalid_pattern_is_skipped_not_fatal() {
    let td = tempdir().unwrap();
    let path = td.path().join("ignore.txt");
    fs::write(&path, "regex_([unclosed\nregex_^ok$\n").unwrap();
    let mut rules = IgnoreRules::from_file(&path);
    rules.refresh_if_stale().unwrap();
    assert_eq!(rules.rules().pattern_len(), 1);
    assert!(rules.is_ignored("ok"));
}
