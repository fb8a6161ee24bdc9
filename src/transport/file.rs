// src/transport/file.rs

//! Default transport: local disk, plain-path and `file://` repositories,
//! HTTP via a blocking client, and ssh via the system `ssh` command.
//!
//! Remote ssh paths reach the remote shell only as single-quoted words.

use super::archive;
use super::location::Location;
use super::Transport;
use crate::error::{Error, Result};
use crate::layout::basename;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the password for authenticated HTTP uploads
pub const PASSWORD_ENV: &str = "FIG_REMOTE_PASSWORD";

/// Transport backed by the local filesystem and a blocking HTTP client
pub struct FileTransport {
    client: Client,
}

impl FileTransport {
    /// Create a new transport
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::IoError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a URL, failing on non-success status
    fn http_get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response)
    }

    /// Copy the content at `url` into the file `dest`
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("Fetching {} to {}", url, dest.display());

        match Location::parse(url)? {
            Location::Http(url) => {
                let mut response = self.http_get(&url)?;
                let mut file = File::create(dest).map_err(|e| {
                    Error::IoError(format!("Failed to create file {}: {}", dest.display(), e))
                })?;
                io::copy(&mut response, &mut file).map_err(|e| {
                    Error::DownloadError(format!("Failed to write data from {}: {}", url, e))
                })?;
            }
            Location::Path(path) => {
                if !path.is_file() {
                    return Err(Error::DownloadError(format!(
                        "File not found: {}",
                        path.display()
                    )));
                }
                fs::copy(&path, dest).map_err(|e| {
                    Error::DownloadError(format!(
                        "Failed to copy {} to {}: {}",
                        path.display(),
                        dest.display(),
                        e
                    ))
                })?;
            }
            Location::Ssh { user, host, path } => {
                let target = ssh_target(user.as_deref(), &host);
                let content = ssh_cat(&target, &path).map_err(Error::DownloadError)?;
                fs::write(dest, content).map_err(|e| {
                    Error::IoError(format!("Failed to write {}: {}", dest.display(), e))
                })?;
            }
            Location::Ftp(url) => return Err(Error::UnsupportedScheme(url)),
        }

        Ok(())
    }
}

impl Transport for FileTransport {
    fn list(&self, dir: &Path) -> Result<Vec<String>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| {
            Error::IoError(format!("Failed to list {}: {}", dir.display(), e))
        })? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn mtime(&self, path: &Path) -> Result<DateTime<Utc>> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| path_error(path, "stat", e))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| path_error(path, "read", e))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, content)
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn clear_directory(&self, dir: &Path) -> Result<()> {
        self.remove_directory(dir)?;
        fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {}", dir.display(), e))
        })
    }

    fn remove_directory(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|e| {
                Error::IoError(format!("Failed to remove {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    fn read_url(&self, url: &str) -> Result<String> {
        debug!("Reading {}", url);

        match Location::parse(url)? {
            Location::Http(url) => self
                .http_get(&url)?
                .text()
                .map_err(|e| Error::DownloadError(format!("Failed to read {}: {}", url, e))),
            Location::Path(path) => fs::read_to_string(&path).map_err(|e| {
                Error::DownloadError(format!("Failed to read {}: {}", path.display(), e))
            }),
            Location::Ssh { user, host, path } => {
                let target = ssh_target(user.as_deref(), &host);
                let output = ssh_cat(&target, &path).map_err(Error::DownloadError)?;
                Ok(String::from_utf8_lossy(&output).to_string())
            }
            Location::Ftp(url) => Err(Error::UnsupportedScheme(url)),
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<bool> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {}", parent.display(), e))
        })?;

        // Fetch beside the destination so the final rename stays on one filesystem
        let temp = NamedTempFile::new_in(parent).map_err(|e| {
            Error::IoError(format!("Failed to create temp file in {}: {}", parent.display(), e))
        })?;
        self.fetch_to(url, temp.path())?;

        if dest.is_file() && sha256_file(dest)? == sha256_file(temp.path())? {
            debug!("{} unchanged at {}", url, dest.display());
            return Ok(false);
        }

        temp.persist(dest).map_err(|e| {
            Error::IoError(format!("Failed to move download to {}: {}", dest.display(), e))
        })?;

        info!("Downloaded {} to {}", url, dest.display());
        Ok(true)
    }

    fn download_archive(&self, url: &str, dest_dir: &Path) -> Result<()> {
        let scratch = dest_dir.parent().unwrap_or(dest_dir);
        fs::create_dir_all(scratch).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {}", scratch.display(), e))
        })?;

        let temp = NamedTempFile::new_in(scratch).map_err(|e| {
            Error::IoError(format!("Failed to create temp file in {}: {}", scratch.display(), e))
        })?;
        self.fetch_to(url, temp.path())?;
        archive::unpack(temp.path(), url, dest_dir)?;

        info!("Expanded archive {} into {}", url, dest_dir.display());
        Ok(())
    }

    fn download_resource(&self, url: &str, dest_dir: &Path) -> Result<()> {
        fs::create_dir_all(dest_dir).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {}", dest_dir.display(), e))
        })?;

        let dest = dest_dir.join(basename(url));
        self.fetch_to(url, &dest)?;

        info!("Downloaded resource {} to {}", url, dest.display());
        Ok(())
    }

    fn upload(&self, local: &Path, remote: &str, user: Option<&str>) -> Result<()> {
        if !local.is_file() {
            return Err(Error::UploadError(format!(
                "Local file not found: {}",
                local.display()
            )));
        }

        info!("Uploading {} to {}", local.display(), remote);

        match Location::parse(remote)? {
            Location::Path(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        Error::UploadError(format!(
                            "Failed to create directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                fs::copy(local, &path).map_err(|e| {
                    Error::UploadError(format!(
                        "Failed to copy {} to {}: {}",
                        local.display(),
                        path.display(),
                        e
                    ))
                })?;
            }
            Location::Http(url) => {
                let file = File::open(local).map_err(|e| {
                    Error::UploadError(format!("Failed to open {}: {}", local.display(), e))
                })?;
                let mut request = self.client.put(&url).body(file);
                if let Some(user) = user {
                    request = request.basic_auth(user, std::env::var(PASSWORD_ENV).ok());
                }
                let response = request
                    .send()
                    .map_err(|e| Error::UploadError(format!("Failed to upload to {}: {}", url, e)))?;
                if !response.status().is_success() {
                    return Err(Error::UploadError(format!(
                        "HTTP {} from {}",
                        response.status(),
                        url
                    )));
                }
            }
            Location::Ssh {
                user: url_user,
                host,
                path,
            } => {
                let target = ssh_target(user.or(url_user.as_deref()), &host);
                let file = File::open(local).map_err(|e| {
                    Error::UploadError(format!("Failed to open {}: {}", local.display(), e))
                })?;
                run(
                    Command::new("ssh")
                        .arg(&target)
                        .arg(upload_command(&path))
                        .stdin(Stdio::from(file)),
                    &format!("ssh {} upload {}", target, path),
                )
                .map_err(Error::UploadError)?;
            }
            Location::Ftp(url) => return Err(Error::UnsupportedScheme(url)),
        }

        Ok(())
    }
}

/// `user@host` or `host`
fn ssh_target(user: Option<&str>, host: &str) -> String {
    match user {
        Some(user) => format!("{}@{}", user, host),
        None => host.to_string(),
    }
}

/// `NotFound` when `path` has vanished, `IoError` for anything else
fn path_error(path: &Path, action: &str, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.to_path_buf())
    } else {
        Error::IoError(format!("Failed to {} {}: {}", action, path.display(), e))
    }
}

/// Quote `s` as a single word for a POSIX shell
fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.' | '@' | '+'))
    {
        return s.to_owned();
    }

    let mut quoted = String::from("'");
    for ch in s.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Contents of a remote file over ssh
fn ssh_cat(target: &str, path: &str) -> std::result::Result<Vec<u8>, String> {
    run(
        Command::new("ssh")
            .arg(target)
            .arg(format!("cat {}", shell_quote(path))),
        &format!("ssh {} cat {}", target, path),
    )
}

/// Remote command that writes stdin to `path`, creating its parent first
fn upload_command(path: &str) -> String {
    let dest = shell_quote(path);
    match Path::new(path).parent().and_then(Path::to_str) {
        Some(parent) if !parent.is_empty() => {
            format!("mkdir -p {} && cat > {}", shell_quote(parent), dest)
        }
        _ => format!("cat > {}", dest),
    }
}

/// Run an external command, returning its stdout or a description of the failure
fn run(command: &mut Command, description: &str) -> std::result::Result<Vec<u8>, String> {
    let output = command
        .output()
        .map_err(|e| format!("Failed to run {}: {}", description, e))?;

    if !output.status.success() {
        return Err(format!(
            "{} exited with {}: {}",
            description,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(output.stdout)
}

/// SHA-256 of a file's contents, hex encoded
fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        Error::IoError(format!("Failed to open {} for hashing: {}", path.display(), e))
    })?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| {
        Error::IoError(format!("Failed to read {} for hashing: {}", path.display(), e))
    })?;

    Ok(format!("{:x}", hasher.finalize()))
}
