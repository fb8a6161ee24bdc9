// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for Fig
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor expected on disk is absent
    #[error("Package not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Fetching from a remote or local location failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Pushing to the remote repository failed
    #[error("Upload error: {0}")]
    UploadError(String),

    /// Malformed descriptor text
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Archive could not be unpacked
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// The location uses a scheme the transport cannot handle
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Identity that would collide with the repository's own directories
    #[error("Invalid package identity: {0}")]
    InvalidIdentity(String),

    /// Operation needs a remote repository but none is configured
    #[error("No remote repository configured")]
    NoRemoteRepository,

    /// Failed to take the per-package install lock
    #[error("Lock error: {0}")]
    LockError(String),
}

/// Result type alias using Fig's Error type
pub type Result<T> = std::result::Result<T, Error>;
