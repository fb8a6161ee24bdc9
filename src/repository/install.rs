// src/repository/install.rs

//! Installing packages from the remote store
//!
//! A package is assembled completely inside a staging directory and then
//! renamed into `R/<name>/<version>`. Any failure deletes the local package
//! directory before the original error is returned, so a package is either
//! fully installed or absent.

use super::Repository;
use crate::error::{Error, Result};
use crate::layout::DESCRIPTOR_FILE;
use crate::package::PackageIdentity;
use crate::staging::{InstallLock, Staging};
use crate::transport::Transport;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

impl<T: Transport> Repository<T> {
    /// Fetch the remote descriptor and reinstall if it changed
    ///
    /// Returns whether an install happened.
    pub fn update_package(&self, id: &PackageIdentity) -> Result<bool> {
        self.sync_package(id, false)
    }

    /// Reinstall a package from the descriptor already in its local directory
    pub fn install_package(&self, id: &PackageIdentity) -> Result<()> {
        self.layout.check_identity(id)?;
        let descriptor = self.layout.local_descriptor(id);
        self.install_or_roll_back(id, || {
            let staging = Staging::new(&self.layout, id)?;
            self.stage_and_commit(id, &descriptor, &staging)
        })
    }

    /// Download the remote descriptor into staging and install from it
    ///
    /// The staged descriptor starts as a copy of the installed one, so the
    /// transport reports a fetch only when the remote content differs.
    /// `force` installs even when nothing new was fetched.
    pub(crate) fn sync_package(&self, id: &PackageIdentity, force: bool) -> Result<bool> {
        self.layout.check_identity(id)?;
        let remote = self.layout.remote_descriptor(id)?;
        let staging = Staging::new(&self.layout, id)?;
        let staged = staging.descriptor();

        let local = self.layout.local_descriptor(id);
        if self.transport.exists(&local) {
            // An unreadable descriptor counts as not installed
            if let Ok(content) = self.transport.read(&local) {
                self.transport.write(&staged, &content)?;
            }
        }

        let fetched = self.transport.download(&remote, &staged)?;
        if !fetched && !force {
            debug!("{} is up to date", id);
            return Ok(false);
        }

        self.install_or_roll_back(id, || self.stage_and_commit(id, &staged, &staging))?;
        Ok(true)
    }

    /// Run an install step, deleting the package directory if it fails
    fn install_or_roll_back<F>(&self, id: &PackageIdentity, install: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        match install() {
            Ok(()) => {
                info!("Installed {}", id);
                Ok(())
            }
            Err(e) => {
                warn!("Install of {} failed, cleaning up: {}", id, e);
                self.roll_back(id);
                Err(e)
            }
        }
    }

    /// Remove `R/<name>/<version>` under the identity lock
    ///
    /// When the lock cannot be taken the directory is removed without it.
    fn roll_back(&self, id: &PackageIdentity) {
        let dir = self.layout.local_dir(id);
        let _lock = match InstallLock::acquire(&self.layout, id) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!("Removing {} without the install lock: {}", dir.display(), e);
                None
            }
        };

        if let Err(cleanup) = self.transport.remove_directory(&dir) {
            warn!("Failed to remove {}: {}", dir.display(), cleanup);
        }
    }

    fn stage_and_commit(
        &self,
        id: &PackageIdentity,
        descriptor: &Path,
        staging: &Staging,
    ) -> Result<()> {
        let package = self.read_package_from_file(descriptor, id)?;
        let contents = staging.contents();
        self.transport.clear_directory(&contents)?;

        for archive_url in package.archive_urls() {
            let url = self.layout.resolve_artifact(id, archive_url)?;
            self.transport.download_archive(&url, &contents)?;
        }

        for resource_url in package.resource_urls() {
            let url = self.layout.resolve_artifact(id, resource_url)?;
            self.transport.download_resource(&url, &contents)?;
        }

        if !package.has_artifacts() {
            debug!("{} has no artifacts, installing descriptor only", id);
        }

        self.transport
            .write(&contents.join(DESCRIPTOR_FILE), &package.unparse())?;

        self.commit(id, staging)
    }

    /// Swap the staged contents into the package directory
    fn commit(&self, id: &PackageIdentity, staging: &Staging) -> Result<()> {
        let _lock = InstallLock::acquire(&self.layout, id)?;
        let target = self.layout.local_dir(id);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {}", parent.display(), e))
            })?;
        }

        if target.exists() {
            let previous = staging.previous();
            fs::rename(&target, &previous).map_err(|e| {
                Error::IoError(format!(
                    "Failed to move {} aside to {}: {}",
                    target.display(),
                    previous.display(),
                    e
                ))
            })?;
        }

        fs::rename(staging.contents(), &target).map_err(|e| {
            Error::IoError(format!(
                "Failed to move {} into {}: {}",
                staging.contents().display(),
                target.display(),
                e
            ))
        })?;

        debug!("Committed {} to {}", id, target.display());
        Ok(())
    }
}
