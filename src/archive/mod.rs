//! Extraction of the native binary from release archives.
//!
//! Release assets are `.tar.gz` (Unix) or `.zip` (Windows) archives that
//! contain the `ccline` executable, possibly under a top-level directory.
//! Only that one entry is extracted.

mod tar_gz;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::Path;

pub use self::tar_gz::TarGzExtractor;
pub use self::zip::ZipExtractor;

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive name
    fn can_handle(&self, archive_name: &str) -> bool;

    /// Write the archive entry whose file name is `binary_name` to `dest`.
    fn extract_binary<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()>;
}

/// Selects the extractor matching the archive format.
#[derive(Default)]
pub struct ArchiveExtractorImpl {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveExtractor for ArchiveExtractorImpl {
    fn can_handle(&self, archive_name: &str) -> bool {
        self.tar_gz.can_handle(archive_name) || self.zip.can_handle(archive_name)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract_binary<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        let name = archive_path.to_string_lossy();
        if self.tar_gz.can_handle(&name) {
            return self
                .tar_gz
                .extract_binary(runtime, archive_path, binary_name, dest);
        }
        if self.zip.can_handle(&name) {
            return self.zip.extract_binary(runtime, archive_path, binary_name, dest);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}

/// Whether an archive entry path names the binary we are looking for.
fn is_binary_entry(entry_path: &Path, binary_name: &str) -> bool {
    entry_path
        .file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case(binary_name))
}

#[cfg(test)]
pub(crate) mod test_support {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tar::Builder;

    pub fn tar_gz(files: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut tar_builder = Builder::new(Vec::new());
        for (name, content, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_path(name).unwrap();
            header.set_mode(*mode);
            header.set_cksum();
            tar_builder.append(&header, content.as_bytes()).unwrap();
        }
        let tar = tar_builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    pub fn zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = ::zip::write::SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated)
            .unix_permissions(0o755);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_can_handle() {
        let extractor = ArchiveExtractorImpl::new();
        assert!(extractor.can_handle("ccline-linux-x64.tar.gz"));
        assert!(extractor.can_handle("ccline-linux-x64.TGZ"));
        assert!(extractor.can_handle("ccline-windows-x64.zip"));
        assert!(!extractor.can_handle("ccline"));
        assert!(!extractor.can_handle("ccline.exe"));
    }

    #[test]
    fn test_is_binary_entry() {
        assert!(is_binary_entry(Path::new("ccline"), "ccline"));
        assert!(is_binary_entry(Path::new("ccline-v1/ccline"), "ccline"));
        assert!(is_binary_entry(Path::new("bin/CCLINE.EXE"), "ccline.exe"));
        assert!(!is_binary_entry(Path::new("ccline/README.md"), "ccline"));
        assert!(!is_binary_entry(Path::new("ccline-helper"), "ccline"));
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let extractor = ArchiveExtractorImpl::new();

        let tgz = dir.path().join("asset.tar.gz");
        fs::write(&tgz, test_support::tar_gz(&[("ccline", "tar binary", 0o755)])).unwrap();
        let zip = dir.path().join("asset.zip");
        fs::write(&zip, test_support::zip(&[("ccline.exe", "zip binary")])).unwrap();

        let out = dir.path().join("out-tar");
        extractor.extract_binary(&runtime, &tgz, "ccline", &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"tar binary");

        let out = dir.path().join("out-zip");
        extractor
            .extract_binary(&runtime, &zip, "ccline.exe", &out)
            .unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"zip binary");
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("asset.rar");
        fs::write(&path, b"whatever").unwrap();

        let result =
            ArchiveExtractorImpl::new().extract_binary(&RealRuntime, &path, "ccline", &dir.path().join("out"));
        assert!(result.unwrap_err().to_string().contains("Unsupported archive format"));
    }
}
