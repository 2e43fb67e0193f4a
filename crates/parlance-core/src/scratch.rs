//! Scratch storage for recorded and received audio.
//!
//! Files are allocated under a session-owned directory. Nothing is deleted
//! while the session runs: paths are queued on a shared pending-deletion
//! list and removed by `purge` at session teardown.

use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use uuid::Uuid;

/// Scratch storage errors.
#[derive(Debug, Error)]
pub enum ScratchError {
    /// Filesystem failure.
    #[error("scratch I/O error on {path}: {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Session-scoped temp-file allocator with deferred cleanup.
#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    pending: Mutex<Vec<PathBuf>>,
}

impl ScratchSpace {
    /// Creates scratch storage rooted at `root`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns `ScratchError::Io` if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScratchError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| ScratchError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Reserves a unique path such as `<root>/<prefix>-<uuid>.<extension>`.
    /// The file itself is not created.
    #[must_use]
    pub fn allocate(&self, prefix: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{prefix}-{}.{extension}", Uuid::new_v4().simple()))
    }

    /// Writes `bytes` to a freshly allocated path and returns it.
    ///
    /// # Errors
    ///
    /// Returns `ScratchError::Io` if the write fails.
    pub async fn write(
        &self,
        prefix: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ScratchError> {
        let path = self.allocate(prefix, extension);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ScratchError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Queues `path` for deletion at session teardown.
    pub fn defer_delete(&self, path: PathBuf) {
        self.lock().push(path);
    }

    /// Returns a snapshot of the pending-deletion list.
    pub fn pending(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Deletes every queued file and returns how many were removed.
    /// Files that are already gone are skipped silently.
    pub async fn purge(&self) -> usize {
        let queued = std::mem::take(&mut *self.lock());
        let mut removed = 0;
        for path in queued {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch file");
                }
            }
        }
        removed
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_returns_distinct_paths_under_root() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path()).unwrap();

        // Act
        let a = scratch.allocate("turn", "m4a");
        let b = scratch.allocate("turn", "m4a");

        // Assert
        assert_ne!(a, b);
        assert!(a.starts_with(dir.path()));
        assert_eq!(a.extension().unwrap(), "m4a");
        assert!(!a.exists());
    }

    #[tokio::test]
    async fn test_purge_removes_only_deferred_files() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path()).unwrap();
        let kept = scratch.write("reply", "mp3", b"keep").await.unwrap();
        let doomed = scratch.write("reply", "mp3", b"drop").await.unwrap();
        scratch.defer_delete(doomed.clone());
        scratch.defer_delete(dir.path().join("never-written.mp3"));

        // Act
        let removed = scratch.purge().await;

        // Assert
        assert_eq!(removed, 1);
        assert!(kept.exists());
        assert!(!doomed.exists());
        assert!(scratch.pending().is_empty());
    }
}
