// src/staging.rs

//! Scratch space and locking for publish and install
//!
//! Every operation gets its own empty directory under `R/tmp/`, removed when
//! the `Staging` value is dropped. Swapping a package directory into place
//! is serialized per identity with an exclusive file lock.

use crate::error::{Error, Result};
use crate::layout::{DESCRIPTOR_FILE, Layout};
use crate::package::PackageIdentity;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A per-operation staging directory
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Create a fresh, uniquely named staging directory for `id`
    pub fn new(layout: &Layout, id: &PackageIdentity) -> Result<Self> {
        let root = layout.staging_root();
        fs::create_dir_all(&root).map_err(|e| {
            Error::IoError(format!("Failed to create staging root {}: {}", root.display(), e))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-{}-", id.name, id.version))
            .tempdir_in(&root)
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to create staging directory in {}: {}",
                    root.display(),
                    e
                ))
            })?;

        debug!("Staging {} in {}", id, dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory assembled into the new package directory
    pub fn contents(&self) -> PathBuf {
        self.dir.path().join("contents")
    }

    /// Downloaded artifacts waiting to be uploaded
    pub fn artifacts(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    /// Scratch descriptor file
    pub fn descriptor(&self) -> PathBuf {
        self.dir.path().join(DESCRIPTOR_FILE)
    }

    /// Where a replaced package directory is parked until cleanup
    pub fn previous(&self) -> PathBuf {
        self.dir.path().join("previous")
    }
}

/// Exclusive lock on one package identity, released on drop
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock for `id` is held
    pub fn acquire(layout: &Layout, id: &PackageIdentity) -> Result<Self> {
        let path = layout.lock_file(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::LockError(format!(
                    "Failed to create lock directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::LockError(format!("Failed to open {}: {}", path.display(), e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::LockError(format!("Failed to lock {}: {}", path.display(), e)))?;

        debug!("Acquired install lock {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
