use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::io::{Read, Write};
use std::path::Path;
use ::zip::ZipArchive;

use super::{ArchiveExtractor, is_binary_entry};

/// Extractor for .zip archives
#[derive(Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn can_handle(&self, archive_name: &str) -> bool {
        archive_name.to_lowercase().ends_with(".zip")
    }

    fn extract_binary<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        debug!("Searching {:?} for {}...", archive_path, binary_name);
        let mut file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip needs Read + Seek, but Runtime::open returns Box<dyn Read + Send>
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .context("Failed to parse ZIP archive")?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            if entry.is_dir() {
                continue;
            }
            let Some(entry_path) = entry.enclosed_name() else {
                debug!("Skipping entry with invalid path");
                continue;
            };
            if !is_binary_entry(&entry_path, binary_name) {
                continue;
            }

            debug!("Extracting {:?} to {:?}", entry_path, dest);
            let mut out = runtime.create_file(dest)?;
            std::io::copy(&mut entry, &mut out)
                .with_context(|| format!("Failed to extract {:?}", entry_path))?;
            out.flush().context("Failed to flush extracted binary")?;
            return Ok(());
        }

        Err(anyhow!(
            "Archive {} does not contain {}",
            archive_path.display(),
            binary_name
        ))
    }
}
