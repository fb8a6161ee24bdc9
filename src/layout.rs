// src/layout.rs

//! Repository path and URL layout
//!
//! Pure arithmetic over the local root `R` and the remote root `U`:
//!
//! - `R/<name>/<version>/` holds an installed package and its `.fig`
//! - `R/tmp/` is scratch space and never part of the package set
//! - `U/<name>/<version>/.fig` and `U/<name>/<version>/<artifact>` are remote

use crate::error::{Error, Result};
use crate::package::PackageIdentity;
use std::path::{Path, PathBuf};

/// File name of a package descriptor, locally and remotely
pub const DESCRIPTOR_FILE: &str = ".fig";

/// Name of the scratch directory under the local root
pub const STAGING_DIR: &str = "tmp";

const LOCKS_DIR: &str = "locks";

/// Reference prefixes treated as absolute locations
const REMOTE_SCHEMES: [&str; 4] = ["ftp://", "http://", "file://", "ssh://"];

/// Local and remote roots of a repository
#[derive(Debug, Clone)]
pub struct Layout {
    local_root: PathBuf,
    remote_root: Option<String>,
}

impl Layout {
    /// Create a layout; trailing slashes on the remote root are dropped
    pub fn new(local_root: impl Into<PathBuf>, remote_root: Option<String>) -> Self {
        let remote_root = remote_root
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            local_root: local_root.into(),
            remote_root,
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> Option<&str> {
        self.remote_root.as_deref()
    }

    /// `R/<name>/<version>`
    pub fn local_dir(&self, id: &PackageIdentity) -> PathBuf {
        self.local_root.join(&id.name).join(&id.version)
    }

    /// `R/<name>/<version>/.fig`
    pub fn local_descriptor(&self, id: &PackageIdentity) -> PathBuf {
        self.local_dir(id).join(DESCRIPTOR_FILE)
    }

    /// `R/tmp`, parent of every per-operation staging directory
    pub fn staging_root(&self) -> PathBuf {
        self.local_root.join(STAGING_DIR)
    }

    /// Lock file serializing directory swaps for one identity
    pub fn lock_file(&self, id: &PackageIdentity) -> PathBuf {
        self.staging_root()
            .join(LOCKS_DIR)
            .join(format!("{}@{}.lock", id.name, id.version))
    }

    /// Reject identities whose local directory would land in `R/tmp`
    pub fn check_identity(&self, id: &PackageIdentity) -> Result<()> {
        if id.name == STAGING_DIR {
            return Err(Error::InvalidIdentity(format!(
                "{}: '{}' is reserved for staging",
                id, STAGING_DIR
            )));
        }
        Ok(())
    }

    /// `U/<name>/<version>`
    pub fn remote_dir(&self, id: &PackageIdentity) -> Result<String> {
        let root = self.remote_root.as_deref().ok_or(Error::NoRemoteRepository)?;
        Ok(format!("{}/{}/{}", root, id.name, id.version))
    }

    /// `U/<name>/<version>/.fig`
    pub fn remote_descriptor(&self, id: &PackageIdentity) -> Result<String> {
        Ok(format!("{}/{}", self.remote_dir(id)?, DESCRIPTOR_FILE))
    }

    /// `U/<name>/<version>/<basename>`
    pub fn remote_artifact(&self, id: &PackageIdentity, basename: &str) -> Result<String> {
        Ok(format!("{}/{}", self.remote_dir(id)?, basename))
    }

    /// Absolute location of an artifact reference found in a descriptor
    ///
    /// Recognized URLs are returned as-is; anything else is relative to the
    /// package's remote directory.
    pub fn resolve_artifact(&self, id: &PackageIdentity, reference: &str) -> Result<String> {
        if is_url(reference) {
            Ok(reference.to_string())
        } else {
            Ok(format!("{}/{}", self.remote_dir(id)?, reference))
        }
    }
}

/// Whether a reference uses one of the recognized remote schemes
pub fn is_url(reference: &str) -> bool {
    REMOTE_SCHEMES
        .iter()
        .any(|scheme| reference.starts_with(scheme))
}

/// Last `/`-separated component of a reference
pub fn basename(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> PackageIdentity {
        PackageIdentity::new("foo", "1.0")
    }

    #[test]
    fn test_local_paths() {
        let layout = Layout::new("/home/me/.fighome", None);

        assert_eq!(layout.local_dir(&foo()), PathBuf::from("/home/me/.fighome/foo/1.0"));
        assert_eq!(
            layout.local_descriptor(&foo()),
            PathBuf::from("/home/me/.fighome/foo/1.0/.fig")
        );
        assert_eq!(layout.staging_root(), PathBuf::from("/home/me/.fighome/tmp"));
        assert_eq!(
            layout.lock_file(&foo()),
            PathBuf::from("/home/me/.fighome/tmp/locks/foo@1.0.lock")
        );
    }

    #[test]
    fn test_staging_name_is_reserved() {
        let layout = Layout::new("/r", None);

        assert!(layout.check_identity(&foo()).is_ok());
        assert!(matches!(
            layout.check_identity(&PackageIdentity::new("tmp", "1.0")),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_remote_urls() {
        let layout = Layout::new("/r", Some("http://repo.example.com/fig/".to_string()));

        assert_eq!(
            layout.remote_descriptor(&foo()).unwrap(),
            "http://repo.example.com/fig/foo/1.0/.fig"
        );
        assert_eq!(
            layout.remote_artifact(&foo(), "a.tgz").unwrap(),
            "http://repo.example.com/fig/foo/1.0/a.tgz"
        );
    }

    #[test]
    fn test_remote_without_root() {
        let layout = Layout::new("/r", None);
        assert!(matches!(
            layout.remote_descriptor(&foo()),
            Err(Error::NoRemoteRepository)
        ));

        let layout = Layout::new("/r", Some(String::new()));
        assert!(layout.remote_root().is_none());
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("http://h/a.tgz"));
        assert!(is_url("ftp://h/a.tgz"));
        assert!(is_url("file:///tmp/a.tgz"));
        assert!(is_url("ssh://me@h/a.tgz"));

        assert!(!is_url("a.tgz"));
        assert!(!is_url("/abs/path/a.tgz"));
        assert!(!is_url("lib/a.tgz"));
    }

    #[test]
    fn test_resolve_artifact() {
        let layout = Layout::new("/r", Some("/srv/repo".to_string()));

        assert_eq!(
            layout.resolve_artifact(&foo(), "a.tgz").unwrap(),
            "/srv/repo/foo/1.0/a.tgz"
        );
        assert_eq!(
            layout.resolve_artifact(&foo(), "http://h/a.tgz").unwrap(),
            "http://h/a.tgz"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("http://h/dir/a.tgz"), "a.tgz");
        assert_eq!(basename("a.tgz"), "a.tgz");
        assert_eq!(basename("build/out/lib.so"), "lib.so");
    }
}
