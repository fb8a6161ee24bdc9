// src/repository/mod.rs

//! Local package repository synchronized with a remote store
//!
//! This module provides:
//! - Listing and reading installed packages
//! - Loading packages (sync from the remote, then read locally)
//! - Reading descriptors straight from the remote store
//! - Publishing (`publish`) and installing with rollback (`install`)

mod install;
mod publish;

use crate::error::{Error, Result};
use crate::layout::{DESCRIPTOR_FILE, Layout, STAGING_DIR};
use crate::package::{Package, PackageIdentity, Parser};
use crate::transport::{FileTransport, Transport};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a repository lives and who publishes to it
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Local root holding installed packages
    pub local_root: PathBuf,
    /// Remote root URL or path; `None` for a purely local repository
    pub remote_url: Option<String>,
    /// Principal used for uploads
    pub remote_user: Option<String>,
}

impl RepositoryConfig {
    pub fn new(local_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_url: None,
            remote_user: None,
        }
    }

    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = Some(user.into());
        self
    }
}

/// A local package repository, optionally backed by a remote one
pub struct Repository<T: Transport = FileTransport> {
    transport: T,
    layout: Layout,
    remote_user: Option<String>,
    parser: Parser,
}

impl Repository<FileTransport> {
    /// Open a repository using the default transport
    pub fn open(config: RepositoryConfig) -> Result<Self> {
        Ok(Self::with_transport(config, FileTransport::new()?))
    }
}

impl<T: Transport> Repository<T> {
    /// Open a repository over a specific transport
    pub fn with_transport(config: RepositoryConfig, transport: T) -> Self {
        Self {
            transport,
            layout: Layout::new(config.local_root, config.remote_url),
            remote_user: config.remote_user,
            parser: Parser::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All locally installed packages as `name/version`
    ///
    /// Directory names only; descriptors are not validated.
    pub fn list_packages(&self) -> Result<Vec<String>> {
        let root = self.layout.local_root();
        let mut results = Vec::new();

        for name in self.transport.list(root)? {
            if name == STAGING_DIR {
                continue;
            }
            for version in self.transport.list(&root.join(&name))? {
                results.push(format!("{}/{}", name, version));
            }
        }

        debug!("Found {} local packages in {}", results.len(), root.display());
        Ok(results)
    }

    /// Sync a package from the remote (if configured), then read it locally
    pub fn load_package(&self, id: &PackageIdentity) -> Result<Package> {
        if self.layout.remote_root().is_some() {
            self.update_package(id)?;
        }
        self.read_local_package(id)
    }

    /// Read an installed package from `R/<name>/<version>/.fig`
    pub fn read_local_package(&self, id: &PackageIdentity) -> Result<Package> {
        self.layout.check_identity(id)?;
        let dir = self.local_dir_for_package(id);
        self.read_package_from_directory(&dir, id)
    }

    /// Read the remote descriptor without installing anything
    ///
    /// The result has no base directory.
    pub fn read_remote_package(&self, id: &PackageIdentity) -> Result<Package> {
        let url = self.layout.remote_descriptor(id)?;
        info!("Reading remote descriptor {}", url);

        let content = self.transport.read_url(&url)?;
        self.parser.parse_package(id, None, &content)
    }

    /// Read the `.fig` descriptor inside `dir`
    pub fn read_package_from_directory(&self, dir: &Path, id: &PackageIdentity) -> Result<Package> {
        self.read_package_from_file(&dir.join(DESCRIPTOR_FILE), id)
    }

    /// Read and parse a descriptor file
    pub fn read_package_from_file(&self, file: &Path, id: &PackageIdentity) -> Result<Package> {
        if !self.transport.exists(file) {
            return Err(Error::NotFound(file.to_path_buf()));
        }

        let modified = self.transport.mtime(file)?;
        debug!("Reading {} (modified {})", file.display(), modified.to_rfc3339());

        let content = self.transport.read(file)?;
        self.parser.parse_package(id, file.parent(), &content)
    }

    /// Local install directory of a package
    pub fn local_dir_for_package(&self, id: &PackageIdentity) -> PathBuf {
        self.layout.local_dir(id)
    }

    /// Delete a package's local install directory
    pub fn remove_package(&self, id: &PackageIdentity) -> Result<()> {
        self.layout.check_identity(id)?;
        let dir = self.local_dir_for_package(id);
        if !self.transport.exists(&dir) {
            return Err(Error::NotFound(dir));
        }

        self.transport.remove_directory(&dir)?;
        info!("Removed package {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn local_repo(root: &Path) -> Repository {
        Repository::open(RepositoryConfig::new(root)).unwrap()
    }

    #[test]
    fn test_list_packages_skips_staging() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("foo/1.0")).unwrap();
        fs::create_dir_all(temp.path().join("tmp/foo-1.0-abc")).unwrap();

        let packages = local_repo(temp.path()).list_packages().unwrap();
        assert_eq!(packages, vec!["foo/1.0".to_string()]);
    }

    #[test]
    fn test_list_packages_missing_root() {
        let temp = TempDir::new().unwrap();
        let repo = local_repo(&temp.path().join("never-created"));
        assert!(repo.list_packages().unwrap().is_empty());
    }

    #[test]
    fn test_load_package_without_remote_reads_locally() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("foo/1.0")).unwrap();
        fs::write(temp.path().join("foo/1.0/.fig"), "set FOO=bar\n").unwrap();

        let id = PackageIdentity::new("foo", "1.0");
        let package = local_repo(temp.path()).load_package(&id).unwrap();

        assert_eq!(package.identity, id);
        assert_eq!(package.directory, Some(temp.path().join("foo/1.0")));
        assert_eq!(package.unparse(), "set FOO=bar");
    }

    #[test]
    fn test_read_package_from_file_not_found() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("elsewhere/.fig");
        let id = PackageIdentity::new("foo", "1.0");

        match local_repo(temp.path()).read_package_from_file(&file, &id) {
            Err(Error::NotFound(path)) => assert_eq!(path, file),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_read_needs_remote() {
        let temp = TempDir::new().unwrap();
        let id = PackageIdentity::new("foo", "1.0");
        assert!(matches!(
            local_repo(temp.path()).read_remote_package(&id),
            Err(Error::NoRemoteRepository)
        ));
    }

    #[test]
    fn test_staging_identity_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("tmp/locks")).unwrap();
        let repo = local_repo(temp.path());
        let id = PackageIdentity::new("tmp", "locks");

        assert!(matches!(repo.install_package(&id), Err(Error::InvalidIdentity(_))));
        assert!(matches!(repo.remove_package(&id), Err(Error::InvalidIdentity(_))));
        assert!(matches!(repo.read_local_package(&id), Err(Error::InvalidIdentity(_))));
        assert!(matches!(repo.publish_package(&[], &id), Err(Error::InvalidIdentity(_))));
        assert!(temp.path().join("tmp/locks").is_dir());
    }

    #[test]
    fn test_remove_package() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("foo/1.0")).unwrap();
        fs::write(temp.path().join("foo/1.0/.fig"), "").unwrap();
        let repo = local_repo(temp.path());
        let id = PackageIdentity::new("foo", "1.0");

        repo.remove_package(&id).unwrap();
        assert!(!temp.path().join("foo/1.0").exists());
        assert!(matches!(repo.remove_package(&id), Err(Error::NotFound(_))));
    }
}
