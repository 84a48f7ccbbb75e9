use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, Result};

use super::token::TokenInfo;

/// Storage abstraction for the persisted OAuth token.
///
/// A store holds at most one token; `store` replaces whatever was there.
pub trait TokenStore: Send + Sync {
    fn store(&self, token: &TokenInfo) -> Result<()>;
    fn load(&self) -> Result<Option<TokenInfo>>;
    fn clear(&self) -> Result<()>;
}

/// Process-local token store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<TokenInfo>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: TokenInfo) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<TokenInfo>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn store(&self, token: &TokenInfo) -> Result<()> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenInfo>> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// File-backed token store writing a single JSON record.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the target, so a crash never leaves a half-written token. The file
/// is created with mode `0600` on unix.
///
/// # Example
/// ```no_run
/// use euroleague::auth::{FileTokenStore, TokenInfo, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.store(&TokenInfo::new("access", 3600))?;
/// # Ok::<(), euroleague::error::ApiError>(())
/// ```
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store at `~/.euroleague/token.json`.
    pub fn new_default() -> Self {
        Self::new(crate::config::ClientConfig::default_token_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for FileTokenStore {
    fn store(&self, token: &TokenInfo) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(token)?;
        let _guard = self.lock();
        atomic_write(&self.path, &serialized)
    }

    fn load(&self) -> Result<Option<TokenInfo>> {
        let _guard = self.lock();
        let raw = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ApiError::Io(err)),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ApiError::Io(err)),
        }
    }
}

/// Writes through a uniquely named sibling temp file and renames it over
/// `path`, so readers never see a partial token.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".token")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    #[cfg(unix)]
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o600))?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    // Dropping the temp file on an error path removes it.
    temp.persist(path).map_err(|err| ApiError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileTokenStore) {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));
        (dir, store)
    }

    fn sample_token() -> TokenInfo {
        TokenInfo::new("access", 3600)
            .with_refresh_token("refresh")
            .with_scope("euroleagueapi")
    }

    #[test]
    fn memory_store_round_trip_and_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        let token = sample_token();
        store.store(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token.clone()));
        assert_eq!(store.load().unwrap(), Some(token));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_round_trip_creates_parent_dirs() {
        let (_dir, store) = temp_store();
        let token = sample_token();
        store.store(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn file_store_replaces_previous_token() {
        let (_dir, store) = temp_store();
        store.store(&TokenInfo::new("first", 60)).unwrap();
        store.store(&TokenInfo::new("second", 60)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
    }

    #[test]
    fn file_store_leaves_no_temp_files_behind() {
        let (_dir, store) = temp_store();
        store.store(&sample_token()).unwrap();
        let parent = store.path().parent().unwrap();
        let entries: Vec<_> = fs::read_dir(parent)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["token.json".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions_to_owner() {
        let (_dir, store) = temp_store();
        store.store(&sample_token()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_clear_missing_is_noop() {
        let (_dir, store) = temp_store();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_token_file_is_an_error_not_absence() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{not json").unwrap();
        assert!(matches!(store.load(), Err(ApiError::Serialization(_))));
    }

    #[test]
    fn concurrent_stores_never_leave_partial_records() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..20 {
                        let token = TokenInfo::new(format!("token-{i}-{j}"), 60);
                        store.store(&token).unwrap();
                        assert!(store.load().unwrap().is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let last = store.load().unwrap().unwrap();
        assert!(last.access_token.starts_with("token-"));
    }

    #[test]
    fn independent_stores_on_one_path_write_without_collisions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = FileTokenStore::new(&path);
                std::thread::spawn(move || {
                    for j in 0..20 {
                        store.store(&TokenInfo::new(format!("token-{i}-{j}"), 60)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = FileTokenStore::new(&path).load().unwrap().unwrap();
        assert!(loaded.access_token.starts_with("token-"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
