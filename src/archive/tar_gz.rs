use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use log::debug;
use std::io::Write;
use std::path::Path;
use tar::Archive;

use super::{ArchiveExtractor, is_binary_entry};

/// Extractor for .tar.gz / .tgz archives
#[derive(Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_name: &str) -> bool {
        let name = archive_name.to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract_binary<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        debug!("Searching {:?} for {}...", archive_path, binary_name);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        let mut archive = Archive::new(GzDecoder::new(file));
        let entries = archive
            .entries()
            .context("Failed to read tar.gz archive")?;

        for entry in entries {
            let mut entry = entry.context("Failed to read tar entry")?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry
                .path()
                .context("Failed to read tar entry path")?
                .into_owned();
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
