//! Scratch area for downloaded image bytes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::FETCH_TIMEOUT_SECS;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to create scratch directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write staged file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-scoped scratch directory for staged downloads.
///
/// The directory is created lazily on the first `stage` call and removed
/// recursively when the store is dropped at the end of the run, no matter
/// how many items failed. A run that stages nothing never creates it.
pub struct StagingStore {
    root: PathBuf,
    client: reqwest::blocking::Client,
    created: bool,
}

impl StagingStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .expect("default TLS backend must be available");
        Self {
            root: root.as_ref().to_path_buf(),
            client,
            created: false,
        }
    }

    /// Fetch `url` and write the bytes verbatim to `<scratch>/<file_name>`.
    pub fn stage(&mut self, url: &str, file_name: &str) -> Result<PathBuf, StageError> {
        let fetch_err = |source| StageError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        let bytes = response.bytes().map_err(fetch_err)?;

        let root = self.ensure_root()?.to_path_buf();
        let path = root.join(file_name);
        fs::write(&path, &bytes).map_err(|e| StageError::Write {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    fn ensure_root(&mut self) -> Result<&Path, StageError> {
        if !self.created {
            fs::create_dir_all(&self.root).map_err(|e| StageError::CreateDir {
                path: self.root.clone(),
                source: e,
            })?;
            self.created = true;
        }
        Ok(&self.root)
    }
}

impl Drop for StagingStore {
    fn drop(&mut self) {
        if self.created {
            if let Err(e) = fs::remove_dir_all(&self.root) {
                log::warn!(
                    "failed to remove scratch directory {}: {e}",
                    self.root.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_created_lazily_and_removed_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join(".tmp");

        let mut store = StagingStore::new(&scratch);
        assert!(!scratch.exists());

        store.ensure_root().unwrap();
        assert!(scratch.is_dir());

        drop(store);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_unused_store_never_creates_scratch() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join(".tmp");
        let store = StagingStore::new(&scratch);
        drop(store);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_scratch_removed_even_with_staged_files_inside() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join(".tmp");

        let mut store = StagingStore::new(&scratch);
        let root = store.ensure_root().unwrap().to_path_buf();
        fs::write(root.join("a.jpg"), b"bytes").unwrap();
        fs::write(root.join("b.jpg"), b"more bytes").unwrap();

        drop(store);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_fetch_error_is_per_item_and_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join(".tmp");

        let mut store = StagingStore::new(&scratch);
        let err = store
            .stage("http://invalid.nonexistent.example.com/face.jpg", "face.jpg")
            .unwrap_err();
        assert!(matches!(err, StageError::Fetch { .. }));
        // Nothing was fetched, so the scratch dir was never needed
        assert!(!scratch.exists());
    }
}
