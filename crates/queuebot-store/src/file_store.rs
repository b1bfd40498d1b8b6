//! JSON file store: one file per document inside a data directory.
//!
//! Each write goes to a sibling `.tmp` file that is then renamed over the
//! target, so a crash mid-write never leaves a truncated document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::{DocumentKey, DocumentStore};
use crate::error::StoreError;

/// Stores documents as pretty-printed JSON files under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataDir`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::DataDir {
            path: dir.display().to_string(),
            source,
        })?;
        debug!(dir = %dir.display(), "document store opened");
        Ok(Self { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the file backing `key`.
    pub fn path_for(&self, key: DocumentKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl DocumentStore for JsonFileStore {
    fn get_raw(&self, key: DocumentKey) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { key, source }),
        }
    }

    fn put_raw(&mut self, key: DocumentKey, json: &str) -> Result<(), StoreError> {
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Io { key, source })?;
        std::fs::rename(&tmp, &target).map_err(|source| StoreError::Io { key, source })?;
        debug!(%key, bytes = json.len(), "document written");
        Ok(())
    }
}
