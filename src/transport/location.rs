// src/transport/location.rs

//! Classification of location strings by scheme

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Where a location string points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `http://` or `https://`
    Http(String),
    /// `ssh://[user@]host/path`
    Ssh {
        user: Option<String>,
        host: String,
        path: String,
    },
    /// `ftp://` (recognized, not served by the bundled transport)
    Ftp(String),
    /// `file://` URL or plain filesystem path
    Path(PathBuf),
}

impl Location {
    pub fn parse(location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Location::Http(location.to_string()));
        }

        if location.starts_with("ftp://") {
            return Ok(Location::Ftp(location.to_string()));
        }

        if let Some(path) = location.strip_prefix("file://") {
            return Ok(Location::Path(PathBuf::from(path)));
        }

        if let Some(rest) = location.strip_prefix("ssh://") {
            let (authority, path) = rest
                .split_once('/')
                .ok_or_else(|| Error::UnsupportedScheme(format!("ssh URL without path: {}", location)))?;
            let (user, host) = match authority.split_once('@') {
                Some((user, host)) => (Some(user.to_string()), host.to_string()),
                None => (None, authority.to_string()),
            };
            if host.is_empty() {
                return Err(Error::UnsupportedScheme(format!(
                    "ssh URL without host: {}",
                    location
                )));
            }
            return Ok(Location::Ssh {
                user,
                host,
                path: format!("/{}", path),
            });
        }

        if let Some((scheme, _)) = location.split_once("://") {
            return Err(Error::UnsupportedScheme(format!("{}:// in {}", scheme, location)));
        }

        Ok(Location::Path(PathBuf::from(location)))
    }
}
