// src/transport/archive.rs

//! Expansion of downloaded archives

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;

/// Archive compression format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Xz,
    Zstd,
    None,
}

impl CompressionFormat {
    /// Detect compression format from an archive name
    pub fn detect(name: &str) -> Result<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(CompressionFormat::Gzip)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Ok(CompressionFormat::Xz)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Ok(CompressionFormat::Zstd)
        } else if name.ends_with(".tar") {
            Ok(CompressionFormat::None)
        } else {
            Err(Error::ArchiveError(format!(
                "Unsupported archive format: {}. Expected .tar.gz, .tgz, .tar.xz, .tar.zst or .tar",
                name
            )))
        }
    }
}

/// Unpack the archive at `path` into `dest_dir`
///
/// `name` is the archive's original reference and decides the compression.
pub fn unpack(path: &Path, name: &str, dest_dir: &Path) -> Result<()> {
    let compression = CompressionFormat::detect(name)?;

    let file = File::open(path).map_err(|e| {
        Error::ArchiveError(format!("Failed to open archive {}: {}", path.display(), e))
    })?;

    let reader: Box<dyn Read> = match compression {
        CompressionFormat::Gzip => Box::new(GzDecoder::new(file)),
        CompressionFormat::Xz => Box::new(XzDecoder::new(file)),
        CompressionFormat::Zstd => {
            let decoder = zstd::Decoder::new(file).map_err(|e| {
                Error::ArchiveError(format!("Failed to create zstd decoder for {}: {}", name, e))
            })?;
            Box::new(decoder)
        }
        CompressionFormat::None => Box::new(file),
    };

    fs::create_dir_all(dest_dir).map_err(|e| {
        Error::IoError(format!("Failed to create directory {}: {}", dest_dir.display(), e))
    })?;

    Archive::new(reader).unpack(dest_dir).map_err(|e| {
        Error::ArchiveError(format!(
            "Failed to unpack {} into {}: {}",
            name,
            dest_dir.display(),
            e
        ))
    })?;

    debug!("Unpacked {} ({:?}) into {}", name, compression, dest_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    const FILES: &[(&str, &str)] = &[("bin/tool", "#!/bin/sh\n"), ("README", "hello")];

    /// Tar `files` into `writer` and hand the writer back for finishing
    fn append_files<W: Write>(writer: W, files: &[(&str, &str)]) -> W {
        let mut builder = tar::Builder::new(writer);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn assert_unpacked(dest: &Path) {
        assert_eq!(fs::read_to_string(dest.join("README")).unwrap(), "hello");
        assert_eq!(fs::read_to_string(dest.join("bin/tool")).unwrap(), "#!/bin/sh\n");
    }

    #[test]
    fn test_detect_compression() {
        assert_eq!(CompressionFormat::detect("a.tgz").unwrap(), CompressionFormat::Gzip);
        assert_eq!(CompressionFormat::detect("a.tar.gz").unwrap(), CompressionFormat::Gzip);
        assert_eq!(CompressionFormat::detect("a.tar.xz").unwrap(), CompressionFormat::Xz);
        assert_eq!(CompressionFormat::detect("a.txz").unwrap(), CompressionFormat::Xz);
        assert_eq!(CompressionFormat::detect("a.tar.zst").unwrap(), CompressionFormat::Zstd);
        assert_eq!(CompressionFormat::detect("a.tzst").unwrap(), CompressionFormat::Zstd);
        assert_eq!(CompressionFormat::detect("a.tar").unwrap(), CompressionFormat::None);
        assert!(CompressionFormat::detect("a.zip").is_err());
    }

    #[test]
    fn test_unpack_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
        append_files(encoder, FILES).finish().unwrap();

        let dest = temp.path().join("out");
        unpack(&archive, "http://h/tool.tgz", &dest).unwrap();
        assert_unpacked(&dest);
    }

    #[test]
    fn test_unpack_tar_xz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        let encoder = xz2::write::XzEncoder::new(File::create(&archive).unwrap(), 6);
        append_files(encoder, FILES).finish().unwrap();

        let dest = temp.path().join("out");
        unpack(&archive, "tool.tar.xz", &dest).unwrap();
        assert_unpacked(&dest);
    }

    #[test]
    fn test_unpack_tar_zst() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        let encoder = zstd::Encoder::new(File::create(&archive).unwrap(), 0).unwrap();
        append_files(encoder, FILES).finish().unwrap();

        let dest = temp.path().join("out");
        unpack(&archive, "http://h/dist/tool.tzst", &dest).unwrap();
        assert_unpacked(&dest);
    }

    #[test]
    fn test_unpack_plain_tar() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        append_files(File::create(&archive).unwrap(), FILES)
            .sync_all()
            .unwrap();

        let dest = temp.path().join("out");
        unpack(&archive, "tool.tar", &dest).unwrap();
        assert_unpacked(&dest);
    }

    #[test]
    fn test_unpack_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let result = unpack(&archive, "a.tgz", &temp.path().join("out"));
        assert!(matches!(result, Err(Error::ArchiveError(_))));
    }
}
