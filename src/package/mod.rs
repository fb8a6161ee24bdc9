// src/package/mod.rs

//! Package descriptors
//!
//! A package is an ordered list of statements addressed by an exact
//! `(name, version)` pair. Values are produced by the `Parser` and never
//! mutated afterwards.

pub mod parser;
pub mod statement;

pub use parser::Parser;
pub use statement::Statement;

use crate::layout::STAGING_DIR;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Exact `(name, version)` key of a package, locally and remotely
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

impl PackageIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for PackageIdentity {
    type Err = String;

    /// Parse `name/version`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((name, _)) if name == STAGING_DIR => Err(format!(
                "Invalid package identity '{}': '{}' is reserved",
                s, STAGING_DIR
            )),
            Some((name, version))
                if !name.is_empty() && !version.is_empty() && !version.contains('/') =>
            {
                Ok(Self::new(name, version))
            }
            _ => Err(format!("Invalid package identity '{}': expected name/version", s)),
        }
    }
}

/// A parsed package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub identity: PackageIdentity,
    /// Directory the descriptor was read from, if it came from disk
    pub directory: Option<PathBuf>,
    pub statements: Vec<Statement>,
}

impl Package {
    pub fn new(
        identity: PackageIdentity,
        directory: Option<PathBuf>,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            identity,
            directory,
            statements,
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// References of top-level `archive` statements, in order
    pub fn archive_urls(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Archive { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// References of top-level `resource` statements, in order
    pub fn resource_urls(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Resource { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the package declares any archive or resource
    pub fn has_artifacts(&self) -> bool {
        self.statements
            .iter()
            .any(|s| s.artifact_reference().is_some())
    }

    /// Descriptor text, one statement per line
    pub fn unparse(&self) -> String {
        unparse_statements(&self.statements)
    }
}

/// Join statements into descriptor text
pub fn unparse_statements(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| s.unparse(""))
        .collect::<Vec<_>>()
        .join("\n")
}
