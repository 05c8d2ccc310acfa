//! API key lookup and persistence.
//!
//! The run client asks a `CredentialAccessor` for the key each time it connects;
//! `None` means the request goes out unauthenticated.

use crate::secret::SecretString;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait CredentialAccessor: Send + Sync {
    fn get(&self) -> Option<SecretString>;
}

/// A key supplied on the command line or via the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<SecretString>);

impl CredentialAccessor for StaticCredential {
    fn get(&self) -> Option<SecretString> {
        self.0
            .as_ref()
            .and_then(|k| SecretString::non_blank(k.expose()))
    }
}

/// Key stored as a single line in `<config_dir>/doc-indexer/api-key`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(dir.join("doc-indexer").join("api-key")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<SecretString>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => {
                let raw = SecretString::new(s);
                Ok(SecretString::non_blank(raw.expose()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_err(source)),
        }
    }

    pub fn set(&self, key: &SecretString) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let line = SecretString::new(format!("{}\n", key.expose().trim()));
        std::fs::write(&self.path, line.expose()).map_err(|e| self.io_err(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        tracing::debug!(path = %self.path.display(), "stored api key");
        Ok(())
    }

    pub fn remove(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_err(source)),
        }
    }

    fn io_err(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialAccessor for FileCredentialStore {
    fn get(&self) -> Option<SecretString> {
        match self.load() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored api key, continuing unauthenticated");
                None
            }
        }
    }
}

/// Explicit key first, stored key second.
pub struct LayeredCredentials {
    explicit: StaticCredential,
    stored: Option<FileCredentialStore>,
}

impl LayeredCredentials {
    pub fn new(explicit: Option<SecretString>, stored: Option<FileCredentialStore>) -> Self {
        Self {
            explicit: StaticCredential(explicit),
            stored,
        }
    }
}

impl CredentialAccessor for LayeredCredentials {
    fn get(&self) -> Option<SecretString> {
        self.explicit
            .get()
            .or_else(|| self.stored.as_ref().and_then(|s| s.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn exposed(k: Option<SecretString>) -> Option<String> {
        k.map(|k| k.expose().clone())
    }

    #[test]
    fn missing_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("api-key"));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.get(), None);
    }

    #[test]
    fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("api-key"));

        store.set(&key("  lsv2_secret ")).unwrap();
        assert_eq!(exposed(store.get()).as_deref(), Some("lsv2_secret"));

        store.remove().unwrap();
        assert_eq!(store.get(), None);
        // removing twice is fine
        store.remove().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn stored_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("api-key"));
        store.set(&key("k")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn blank_file_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api-key");
        std::fs::write(&path, "\n  \n").unwrap();
        assert_eq!(FileCredentialStore::new(path).get(), None);
    }

    #[test]
    fn explicit_key_wins_over_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("api-key"));
        store.set(&key("stored")).unwrap();

        let layered = LayeredCredentials::new(Some(key("flag")), Some(store.clone()));
        assert_eq!(exposed(layered.get()).as_deref(), Some("flag"));

        let layered = LayeredCredentials::new(Some(key("   ")), Some(store));
        assert_eq!(exposed(layered.get()).as_deref(), Some("stored"));

        assert_eq!(LayeredCredentials::new(None, None).get(), None);
    }

    #[test]
    fn debug_output_never_shows_the_key() {
        let cred = StaticCredential(Some(key("lsv2_hidden")));
        assert!(!format!("{cred:?}").contains("lsv2_hidden"));
    }
}
