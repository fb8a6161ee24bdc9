// src/transport/mod.rs

//! Byte movement between the local disk and remote repositories
//!
//! The repository engine only ever talks to a `Transport`. `FileTransport`
//! is the bundled implementation; tests substitute their own.

pub mod archive;
pub mod file;
pub mod location;

pub use file::FileTransport;
pub use location::Location;

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Filesystem and remote-store primitives used by the repository engine
pub trait Transport {
    /// Names of the entries directly under `dir`; empty if `dir` is absent
    fn list(&self, dir: &Path) -> Result<Vec<String>>;

    /// Whether `path` exists on local disk
    fn exists(&self, path: &Path) -> bool;

    /// Last modification time of a local file
    fn mtime(&self, path: &Path) -> Result<DateTime<Utc>>;

    /// Read a local file as text
    fn read(&self, path: &Path) -> Result<String>;

    /// Write text to a local file, creating parent directories
    fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Create `dir` if absent, empty it if present
    fn clear_directory(&self, dir: &Path) -> Result<()>;

    /// Remove `dir` and everything under it; absent directories are fine
    fn remove_directory(&self, dir: &Path) -> Result<()>;

    /// Read a remote location as text
    fn read_url(&self, url: &str) -> Result<String>;

    /// Fetch `url` to `dest`
    ///
    /// Returns `true` when new content was written to `dest`, `false` when
    /// `dest` already held the same bytes.
    fn download(&self, url: &str, dest: &Path) -> Result<bool>;

    /// Fetch an archive and expand it into `dest_dir`
    fn download_archive(&self, url: &str, dest_dir: &Path) -> Result<()>;

    /// Fetch a single file verbatim into `dest_dir`
    fn download_resource(&self, url: &str, dest_dir: &Path) -> Result<()>;

    /// Push a local file to a remote location
    fn upload(&self, local: &Path, remote: &str, user: Option<&str>) -> Result<()>;
}
