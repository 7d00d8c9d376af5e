//! Advisory file lock for cross-process mutual exclusion
//!
//! Processing passes from concurrent invocations (daemon tick, manual
//! `process` command, a second daemon) must not interleave. The lock file
//! lives in the data directory's `locks` subdirectory and is held for the
//! duration of one pass; dropping the guard releases it on every exit path.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;

/// Exclusive advisory lock backed by a lock file.
///
/// The OS releases the lock if the process dies, so a crashed pass never
/// wedges future invocations.
#[derive(Debug)]
pub struct ProcessLock {
    file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Try to take the lock once, without blocking.
    ///
    /// Returns `Ok(None)` when another process currently holds it.
    pub fn try_acquire(path: &Path) -> std::io::Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Retry acquisition within a short window, then give up.
    ///
    /// The window is deliberately small: a contended lock means a pass is
    /// already running and this invocation should report that, not queue.
    pub async fn acquire(
        path: &Path,
        timeout: Duration,
        retry_delay: Duration,
    ) -> std::io::Result<Option<Self>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(Some(lock));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(retry_delay).await;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release process lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let lock = ProcessLock::try_acquire(&path).unwrap();
        assert!(lock.is_some());
        assert_eq!(lock.as_ref().unwrap().path(), path);

        // Held: a second attempt must fail fast
        assert!(ProcessLock::try_acquire(&path).unwrap().is_none());

        // Dropped: reacquisition succeeds
        drop(lock);
        assert!(ProcessLock::try_acquire(&path).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_acquire_with_timeout_contended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let _held = ProcessLock::try_acquire(&path).unwrap().unwrap();
        let result = ProcessLock::acquire(
            &path,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_acquire_with_timeout_free() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let result = ProcessLock::acquire(
            &path,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(result.is_some());
    }
}
