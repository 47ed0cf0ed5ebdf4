//! Key-value store persisted as one JSON object on disk.
//!
//! Every write rewrites the whole file through a temporary sibling and a
//! rename, so a crash never leaves a half-written store behind.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors raised while opening a file-backed store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The path does not name a file inside a directory.
    #[error("storage path '{path}' must name a file")]
    InvalidPath {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// The parent directory or the file could not be read.
    #[error("failed to read storage at '{path}': {source}")]
    Read {
        /// Path being read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file exists but is not a JSON object of strings.
    #[error("storage at '{path}' is not a JSON object of strings: {source}")]
    Parse {
        /// Path being parsed.
        path: Utf8PathBuf,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value store backed by a JSON file.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileKeyValueStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError`] when the path is not a file path, the
    /// parent directory cannot be opened, or an existing file is unreadable.
    pub fn open(path: &Utf8Path) -> Result<Self, FileStoreError> {
        let Some(file_name) = path.file_name() else {
            return Err(FileStoreError::InvalidPath {
                path: path.to_path_buf(),
            });
        };
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|source| {
            FileStoreError::Read {
                path: parent.to_path_buf(),
                source,
            }
        })?;

        let entries = match dir.read_to_string(file_name) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| FileStoreError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(%path, "storage file absent; starting empty");
                BTreeMap::new()
            }
            Err(source) => {
                return Err(FileStoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Ok(Self {
            dir,
            file_name: file_name.to_owned(),
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(
            ".{}.tmp.{}.{}.{}",
            self.file_name,
            std::process::id(),
            suffix,
            counter
        );

        write_to_temp_file(&self.dir, &tmp_name, contents.as_bytes())?;
        if let Err(error) = self.dir.rename(&tmp_name, &self.dir, &self.file_name) {
            if self.dir.remove_file(&tmp_name).is_err() {
                warn!(tmp = %tmp_name, "failed to remove temporary storage file");
            }
            return Err(error);
        }
        // Best-effort directory sync.
        if self.dir.open(".").and_then(|dir| dir.sync_all()).is_err() {
            debug!(path = %self.path, "storage directory sync skipped");
        }
        Ok(())
    }
}

fn write_to_temp_file(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    let written = file.write_all(contents).and_then(|()| file.sync_all());
    if written.is_err() {
        drop(file);
        drop(dir.remove_file(tmp_name));
    }
    written
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KeyValueStoreError::write(key, "store lock poisoned"))?;
        let mut next = entries.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.persist(&next)
            .map_err(|error| KeyValueStoreError::write(key, error.to_string()))?;
        *entries = next;
        Ok(())
    }
}
