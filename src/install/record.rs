use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::install::paths::staging_path;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// The native binary currently placed at the install path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstalledBinaryRecord {
    pub path: PathBuf,
    pub version: String,
    pub platform: PlatformKey,
    pub size: u64,
}

/// Why a recorded install cannot be reused.
#[derive(Debug, Clone, PartialEq)]
pub enum Staleness {
    VersionChanged { installed: String },
    PlatformChanged { installed: PlatformKey },
    PathChanged,
    BinaryMissing,
    SizeMismatch { actual: u64 },
    NotExecutable,
}

impl InstalledBinaryRecord {
    /// Load the record, treating anything unreadable as "not installed".
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, record_path: &Path) -> Option<Self> {
        if !runtime.exists(record_path) {
            return None;
        }

        let content = match runtime.read_to_string(record_path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Failed to read install record {:?}: {}", record_path, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Ignoring unreadable install record {:?}: {}", record_path, e);
                None
            }
        }
    }

    /// Write the record through a staging file and rename it into place.
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, record_path: &Path) -> Result<()> {
        let dir = record_path.parent().unwrap_or(Path::new("."));
        let tmp_path = staging_path(dir, "ccline-install", "json.tmp");

        let json = serde_json::to_string_pretty(self)?;
        runtime
            .write(&tmp_path, json.as_bytes())
            .context("Failed to write install record")?;
        if let Err(e) = runtime.rename(&tmp_path, record_path) {
            let _ = runtime.remove_file(&tmp_path);
            return Err(e.context("Failed to replace install record"));
        }
        Ok(())
    }

    /// Check the record against the expected release and the file on disk.
    pub fn staleness<R: Runtime>(
        &self,
        runtime: &R,
        expected_path: &Path,
        version: &str,
        platform: PlatformKey,
    ) -> Option<Staleness> {
        if self.platform != platform {
            return Some(Staleness::PlatformChanged {
                installed: self.platform,
            });
        }
        if self.version != version {
            return Some(Staleness::VersionChanged {
                installed: self.version.clone(),
            });
        }
        if self.path != expected_path {
            return Some(Staleness::PathChanged);
        }
        if !runtime.is_file(&self.path) {
            return Some(Staleness::BinaryMissing);
        }
        match runtime.file_len(&self.path) {
            Ok(actual) if actual == self.size => {}
            Ok(actual) => return Some(Staleness::SizeMismatch { actual }),
            Err(_) => return Some(Staleness::BinaryMissing),
        }
        if !runtime.is_executable(&self.path) {
            return Some(Staleness::NotExecutable);
        }
        None
    }
}
