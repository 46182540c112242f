//! Per-user directory resolution for credgate state.
//!
//! The audit log is the only persistent state in the system; it lives under
//! the credgate home directory, which tests isolate via a thread-local
//! override.

use camino::Utf8PathBuf;
use std::cell::RefCell;

thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Resolve credgate home:
/// 1) thread-local override (tests use this)
/// 2) env `CREDGATE_HOME` (opt-in for users/CI)
/// 3) default `~/.credgate` (falling back to `.credgate` if HOME is unset)
#[must_use]
pub fn credgate_home() -> Utf8PathBuf {
    if let Some(tl) = THREAD_HOME.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("CREDGATE_HOME") {
        return Utf8PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return Utf8PathBuf::from(home).join(".credgate");
    }
    Utf8PathBuf::from(".credgate")
}

/// Returns `<CREDGATE_HOME>/audit`, the default audit log directory.
#[must_use]
pub fn audit_dir() -> Utf8PathBuf {
    credgate_home().join("audit")
}

/// mkdir -p; treat `AlreadyExists` as success (removes TOCTTOU races)
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard for isolated home that clears thread-local state on drop
#[cfg(any(test, feature = "test-utils"))]
pub struct HomeGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for HomeGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Test helper: give this test a unique home under the system temp dir.
///
/// Hold the `HomeGuard` for the test's duration so the directory stays alive
/// and thread-local state is cleaned up.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn with_isolated_home() -> HomeGuard {
    let td = tempfile::TempDir::new().expect("create temp home");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
    THREAD_HOME.with(|tl| *tl.borrow_mut() = Some(p));
    HomeGuard { inner: td }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_home_overrides_default() {
        let guard = with_isolated_home();
        let home = credgate_home();
        assert_eq!(home.as_std_path(), guard.path());
        assert!(audit_dir().as_str().ends_with("audit"));
    }

    #[test]
    fn guard_drop_restores_default() {
        let before = {
            let _guard = with_isolated_home();
            credgate_home()
        };
        let after = credgate_home();
        assert_ne!(before, after);
    }

    #[test]
    fn ensure_dir_all_is_idempotent() {
        let guard = with_isolated_home();
        let dir = credgate_home().join("nested").join("dir");
        ensure_dir_all(&dir).unwrap();
        ensure_dir_all(&dir).unwrap();
        assert!(dir.as_std_path().is_dir());
        drop(guard);
    }
}
