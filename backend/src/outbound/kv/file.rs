//! Directory-backed key-value store.
//!
//! Each key lives in its own JSON file holding the key, its version and the
//! value. Writes go to a temporary file first and are renamed into place, so
//! a crash never leaves a half-written document. Version stamps continue
//! from the highest one found on disk when the store is reopened.
//!
//! All file access goes through a capability-scoped [`Dir`] and runs on the
//! blocking thread pool.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, StoredBlob};

const EXTENSION: &str = ".json";
const STAGING_PREFIX: &str = ".tmp-";

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    key: String,
    version: u64,
    value: String,
}

/// Key-value store persisting one file per key under a data directory.
pub struct FileKeyValueStore {
    dir: Arc<Dir>,
    root: PathBuf,
    last_version: Mutex<u64>,
}

impl std::fmt::Debug for FileKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyValueStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Map a key onto a file name; anything outside `[A-Za-z0-9_-]` becomes `_`.
fn file_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}{EXTENSION}")
}

fn io_error(context: &str, error: io::Error) -> KeyValueStoreError {
    KeyValueStoreError::backend(format!("{context}: {error}"))
}

fn read_record(dir: &Dir, key: &str) -> Result<Option<Record>, KeyValueStoreError> {
    let name = file_name(key);
    let raw = match dir.read_to_string(&name) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(io_error(&name, error)),
    };
    let record: Record = serde_json::from_str(&raw)
        .map_err(|error| KeyValueStoreError::backend(format!("{name} is corrupt: {error}")))?;
    Ok(Some(record))
}

fn write_record(dir: &Dir, record: &Record) -> Result<(), KeyValueStoreError> {
    let name = file_name(&record.key);
    let staged = format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple());
    let body = serde_json::to_vec(record)
        .map_err(|error| KeyValueStoreError::backend(format!("encoding {name}: {error}")))?;
    dir.write(&staged, body)
        .map_err(|error| io_error(&staged, error))?;
    if let Err(error) = dir.rename(&staged, dir, &name) {
        let _cleanup = dir.remove_file(&staged);
        return Err(io_error(&name, error));
    }
    Ok(())
}

fn remove_record(dir: &Dir, key: &str) -> Result<(), KeyValueStoreError> {
    let name = file_name(key);
    match dir.remove_file(&name) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(io_error(&name, error)),
    }
}

/// Highest version stamp among the stored documents.
fn highest_version(dir: &Dir) -> Result<u64, KeyValueStoreError> {
    let mut highest = 0;
    for entry in dir.entries().map_err(|error| io_error("listing data directory", error))? {
        let entry = entry.map_err(|error| io_error("listing data directory", error))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(STAGING_PREFIX) {
            let _cleanup = dir.remove_file(&name);
            continue;
        }
        if !name.ends_with(EXTENSION) {
            continue;
        }
        let raw = dir
            .read_to_string(&name)
            .map_err(|error| io_error(&name, error))?;
        match serde_json::from_str::<Record>(&raw) {
            Ok(record) => highest = highest.max(record.version),
            Err(error) => tracing::warn!(file = %name, %error, "ignoring unreadable document"),
        }
    }
    Ok(highest)
}

impl FileKeyValueStore {
    /// Open (creating if needed) the data directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeyValueStoreError> {
        let root = path.as_ref().to_path_buf();
        let context = root.display().to_string();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| io_error(&context, error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error(&context, error))?;
        let last_version = highest_version(&dir)?;
        tracing::info!(path = %context, last_version, "file store opened");
        Ok(Self {
            dir: Arc::new(dir),
            root,
            last_version: Mutex::new(last_version),
        })
    }

    /// Directory the documents are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, KeyValueStoreError>
    where
        F: FnOnce(&Dir) -> Result<T, KeyValueStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|error| KeyValueStoreError::backend(format!("file task failed: {error}")))?
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, KeyValueStoreError> {
        let owned = key.to_owned();
        let record = self.blocking(move |dir| read_record(dir, &owned)).await?;
        Ok(record.map(|record| StoredBlob {
            value: record.value,
            version: record.version,
        }))
    }

    async fn set(&self, key: &str, value: String) -> Result<u64, KeyValueStoreError> {
        let mut last_version = self.last_version.lock().await;
        let record = Record {
            key: key.to_owned(),
            version: *last_version + 1,
            value,
        };
        let version = record.version;
        self.blocking(move |dir| write_record(dir, &record)).await?;
        *last_version = version;
        Ok(version)
    }

    async fn delete(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let _guard = self.last_version.lock().await;
        let owned = key.to_owned();
        self.blocking(move |dir| remove_record(dir, &owned)).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Option<String>,
    ) -> Result<Option<u64>, KeyValueStoreError> {
        let mut last_version = self.last_version.lock().await;
        let next_version = *last_version + 1;
        let owned = key.to_owned();
        let outcome = self
            .blocking(move |dir| {
                let current = read_record(dir, &owned)?.map(|record| record.version);
                if current != expected {
                    return Err(KeyValueStoreError::version_mismatch(owned));
                }
                match value {
                    Some(value) => {
                        let record = Record {
                            key: owned,
                            version: next_version,
                            value,
                        };
                        write_record(dir, &record)?;
                        Ok(Some(next_version))
                    }
                    None => {
                        remove_record(dir, &owned)?;
                        Ok(None)
                    }
                }
            })
            .await?;
        if outcome.is_some() {
            *last_version = next_version;
        }
        Ok(outcome)
    }
}
