//! Single-file JSON key-value store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use infograph_core::Result;
use infograph_core::error::{Error, StorageError};
use infograph_core::traits::{KeyValueStore, StorageOp};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type Entries = BTreeMap<String, String>;

fn map_io(err: std::io::Error) -> Error {
    Error::Storage(StorageError::from(err))
}

/// A [`KeyValueStore`] persisted as one JSON object on disk.
///
/// Every commit rewrites the whole file through a temporary file and an
/// atomic rename, under an exclusive lock on a sibling `.lock` file, so
/// readers never observe half of a batch. On Unix the file is created with
/// mode `0600` because it holds a bearer token.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the file at `path`. Nothing is touched until
    /// the first commit.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)
    }

    fn read_entries(&self) -> Result<Entries> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(map_io(e)),
        };

        serde_json::from_str(&json).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                message: format!("{}: {}", self.path.display(), e),
            })
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| {
            Error::Storage(StorageError::Io {
                message: e.to_string(),
            })
        })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, &json).map_err(map_io)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path).map_err(map_io)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(map_io)?;
        }

        fs::rename(&temp_path, &self.path).map_err(map_io)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock()?;
        lock.lock_shared().map_err(map_io)?;
        let entries = self.read_entries();
        let _ = lock.unlock();

        Ok(entries?.get(key).cloned())
    }

    #[instrument(skip(self, batch), fields(path = %self.path.display(), ops = batch.len()))]
    fn commit(&self, batch: &[StorageOp]) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive().map_err(map_io)?;

        let result = (|| {
            let mut entries = match self.read_entries() {
                Ok(entries) => entries,
                Err(Error::Storage(StorageError::Corrupt { message })) => {
                    warn!(%message, "Discarding unreadable store contents");
                    Entries::new()
                }
                Err(e) => return Err(e),
            };

            for op in batch {
                match op {
                    StorageOp::Put { key, value } => {
                        entries.insert(key.clone(), value.clone());
                    }
                    StorageOp::Remove { key } => {
                        entries.remove(key);
                    }
                }
            }

            self.write_entries(&entries)?;
            debug!(keys = entries.len(), "Committed store batch");
            Ok(())
        })();

        let _ = lock.unlock();
        result
    }
}
