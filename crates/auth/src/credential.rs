//! Persisted session credential (the only state that survives a restart).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Storage for the single session token.
///
/// Written only by login/logout, read at bootstrap and by the HTTP client when
/// attaching the bearer header.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> io::Result<()>;
    /// Remove the token. Never fails; problems are logged.
    fn clear(&self);
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        (**self).save(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.inner.read().ok()?.clone()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        let mut slot = self
            .inner
            .write()
            .map_err(|_| io::Error::other("credential lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }
}

/// Token kept in a file under the user's data directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/<app>/session.token`, or `None` when the platform has no
    /// data directory.
    pub fn in_data_dir(app: &str) -> Option<Self> {
        let mut path = dirs::data_dir()?;
        path.push(app);
        path.push("session.token");
        Some(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read session token: {e}");
                None
            }
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove session token: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let store = InMemoryCredentialStore::new();
        assert_eq!(store.load(), None);
        store.save("tok").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok"));
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn file_store_creates_parent_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.token");

        let store = FileCredentialStore::new(&path);
        assert_eq!(store.load(), None);
        store.save("abc.def").unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.load().as_deref(), Some("abc.def"));

        reopened.clear();
        reopened.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn blank_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.token");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileCredentialStore::new(path).load(), None);
    }
}
