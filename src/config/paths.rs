//! Default path helpers and symlink checks.

use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DESK_ORGANIZER_CONFIG";

/// Config path: `$DESK_ORGANIZER_CONFIG`, else the OS config dir
/// (`<config_dir>/desk_organizer/config.xml`), else `~/.config/...`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("desk_organizer");
        base.push("config.xml");
        return Some(base);
    }
    env::var_os("HOME").map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("desk_organizer")
            .join("config.xml")
    })
}

/// True when `$DESK_ORGANIZER_CONFIG` names the config file.
pub fn config_env_is_set() -> bool {
    env::var_os(CONFIG_ENV).is_some_and(|v| !v.is_empty())
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() && fs::symlink_metadata(anc)?.file_type().is_symlink() {
            return Ok(true);
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_override_wins() {
        unsafe {
            env::set_var(CONFIG_ENV, "/tmp/custom/organizer.xml");
        }
        assert_eq!(
            default_config_path(),
            Some(PathBuf::from("/tmp/custom/organizer.xml"))
        );
        assert!(config_env_is_set());
        unsafe {
            env::remove_var(CONFIG_ENV);
        }
        assert!(!config_env_is_set());
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let real = base.join("real");
        fs::create_dir(&real).unwrap();
        let link = base.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("file.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("file.log")).unwrap());
    }
}
