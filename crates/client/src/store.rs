//! Durable storage for session tokens
//!
//! Tokens are kept as two named entries, `accessToken` and `refreshToken`,
//! mirroring the cookies a browser session would carry. Each entry records the
//! cookie-style attributes it was written with.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Name of a persisted token entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    pub const ALL: [Self; 2] = [Self::Access, Self::Refresh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
        }
    }
}

/// Cross-site policy of a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

/// One persisted token with the attributes it was written with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    #[serde(default = "secure_default")]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

fn secure_default() -> bool {
    true
}

impl StoredEntry {
    /// Entry written with secure transport and lax cross-site restriction
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Tokens read back from storage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

/// Persistence adapter for session tokens
pub trait TokenStore: Send + Sync {
    /// Read both entries
    fn load(&self) -> Result<PersistedTokens, ClientError>;

    /// Write one entry
    fn set(&self, key: TokenKey, value: &str) -> Result<(), ClientError>;

    /// Remove one entry; removing a missing entry is not an error
    fn remove(&self, key: TokenKey) -> Result<(), ClientError>;

    /// Remove every entry
    fn clear(&self) -> Result<(), ClientError> {
        for key in TokenKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-process token store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<Mutex<BTreeMap<TokenKey, StoredEntry>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with both tokens
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        {
            let mut entries = store.lock();
            entries.insert(TokenKey::Access, StoredEntry::new(access));
            entries.insert(TokenKey::Refresh, StoredEntry::new(refresh));
        }
        store
    }

    pub fn get(&self, key: TokenKey) -> Option<String> {
        self.lock().get(&key).map(|entry| entry.value.clone())
    }

    pub fn entry(&self, key: TokenKey) -> Option<StoredEntry> {
        self.lock().get(&key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<TokenKey, StoredEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<PersistedTokens, ClientError> {
        Ok(PersistedTokens {
            access: self.get(TokenKey::Access),
            refresh: self.get(TokenKey::Refresh),
        })
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<(), ClientError> {
        self.lock().insert(key, StoredEntry::new(value));
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), ClientError> {
        self.lock().remove(&key);
        Ok(())
    }
}

/// JSON file holding the token entries, readable only by its owner
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

type Document = BTreeMap<String, StoredEntry>;

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, ClientError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(Document::new())
            }
        }
    }

    fn write_document(&self, document: &Document) -> Result<(), ClientError> {
        if document.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = open_private(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(document)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut Document)) -> Result<(), ClientError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        f(&mut document);
        self.write_document(&document)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<PersistedTokens, ClientError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        Ok(PersistedTokens {
            access: document
                .remove(TokenKey::Access.as_str())
                .map(|entry| entry.value),
            refresh: document
                .remove(TokenKey::Refresh.as_str())
                .map(|entry| entry.value),
        })
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<(), ClientError> {
        self.modify(|document| {
            document.insert(key.as_str().to_string(), StoredEntry::new(value));
        })
    }

    fn remove(&self, key: TokenKey) -> Result<(), ClientError> {
        self.modify(|document| {
            document.remove(key.as_str());
        })
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.modify(Document::clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_and_remove() {
        let store = MemoryTokenStore::new();
        store.set(TokenKey::Access, "A1").unwrap();
        store.set(TokenKey::Refresh, "R1").unwrap();

        let tokens = store.load().unwrap();
        assert_eq!(tokens.access.as_deref(), Some("A1"));
        assert_eq!(tokens.refresh.as_deref(), Some("R1"));

        let entry = store.entry(TokenKey::Access).unwrap();
        assert!(entry.secure);
        assert_eq!(entry.same_site, SameSite::Lax);

        store.remove(TokenKey::Access).unwrap();
        assert_eq!(store.get(TokenKey::Access), None);
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileTokenStore::new(&path);

        assert_eq!(store.load().unwrap(), PersistedTokens::default());

        store.set(TokenKey::Access, "A1").unwrap();
        store.set(TokenKey::Refresh, "R1").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("accessToken"));
        assert!(raw.contains("\"same_site\": \"lax\""));

        let reopened = FileTokenStore::new(&path);
        let tokens = reopened.load().unwrap();
        assert_eq!(tokens.access.as_deref(), Some("A1"));
        assert_eq!(tokens.refresh.as_deref(), Some("R1"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        reopened.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        store.set(TokenKey::Access, "A1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.load().unwrap(), PersistedTokens::default());
    }
}
