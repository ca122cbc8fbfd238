//! Unique sibling names for write-then-rename.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pattern: .desk_organizer.tmp.<pid>.<nanos>.<seq>
pub fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".desk_organizer.tmp.{pid}.{nanos}.{seq}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_do_not_repeat() {
        let a = tmp_sibling_name(Path::new("/cfg/config.xml"));
        let b = tmp_sibling_name(Path::new("/cfg/config.xml"));
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/cfg")));
    }
}
