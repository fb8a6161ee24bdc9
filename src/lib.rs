// src/lib.rs

//! Fig Package Repository
//!
//! Synchronizes a local package cache with a remote artifact store:
//! publishes packages upward and installs them downward with rollback.
//!
//! # Architecture
//!
//! - Layout: `R/<name>/<version>/.fig` locally, `U/<name>/<version>/` remotely
//! - Publish: artifacts are uploaded before the descriptor that names them
//! - Install: assembled in a private staging directory, swapped in by rename
//! - Rollback: a failed install leaves no package directory behind

mod error;
pub mod layout;
pub mod package;
pub mod repository;
pub mod staging;
pub mod transport;

pub use error::{Error, Result};
pub use package::{Package, PackageIdentity, Parser, Statement};
pub use repository::{Repository, RepositoryConfig};
pub use transport::{FileTransport, Transport};
