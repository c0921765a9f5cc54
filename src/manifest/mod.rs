//! The release manifest describes the native binaries shipped with this
//! wrapper.
//!
//! Packaged installs carry a `ccline-dist/manifest.json` next to the wrapper
//! executable. Without one, a built-in manifest pointing at the GitHub release
//! of the version this wrapper was built for is used.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::platform::{PlatformKey, SUPPORTED};
use crate::runtime::Runtime;

/// Native release version this wrapper was built for.
pub const BUILTIN_VERSION: &str = env!("CCLINE_RELEASE_VERSION");

pub const DEFAULT_REPOSITORY: &str = "Haleclipse/CCometixLine";
pub const DEFAULT_INSTALL_COMMAND: &str = "npm update -g @cometix/ccline";

/// Payload directory names searched relative to the wrapper executable.
const PAYLOAD_DIRS: [&str; 2] = ["ccline-dist", "../share/ccline"];
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Path of a packaged binary, relative to the payload directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Download URL of a release archive or raw binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Lowercase hex SHA-256 of the binary itself (not of the archive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Where the bytes of an artifact come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    Packaged(PathBuf),
    Remote(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReleaseManifest {
    pub version: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_install_command")]
    pub install_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_check_url: Option<String>,
    pub artifacts: BTreeMap<PlatformKey, Artifact>,

    /// Directory the manifest was loaded from; `None` for the built-in one.
    #[serde(skip)]
    pub payload_dir: Option<PathBuf>,
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_string()
}

fn default_install_command() -> String {
    DEFAULT_INSTALL_COMMAND.to_string()
}

impl ReleaseManifest {
    /// Manifest for the GitHub release matching [`BUILTIN_VERSION`].
    pub fn builtin() -> Self {
        Self::for_github_release(
            BUILTIN_VERSION,
            DEFAULT_REPOSITORY,
            "https://github.com",
        )
    }

    /// Manifest whose artifacts are the release assets of `repository`.
    pub fn for_github_release(version: &str, repository: &str, base_url: &str) -> Self {
        let tag = format!("v{}", version.trim_start_matches('v'));
        let artifacts = SUPPORTED
            .iter()
            .map(|key| {
                let url = format!(
                    "{}/{}/releases/download/{}/{}",
                    base_url.trim_end_matches('/'),
                    repository,
                    tag,
                    key.release_asset_name()
                );
                (
                    *key,
                    Artifact {
                        path: None,
                        url: Some(url),
                        sha256: None,
                    },
                )
            })
            .collect();

        Self {
            version: version.trim_start_matches('v').to_string(),
            repository: repository.to_string(),
            install_command: default_install_command(),
            update_check_url: None,
            artifacts,
            payload_dir: None,
        }
    }

    /// Find the manifest bundled next to `exe`, falling back to the built-in one.
    ///
    /// A payload that exists but cannot be parsed is an error; silently
    /// downloading instead would mask a broken package.
    #[tracing::instrument(skip(runtime))]
    pub fn locate<R: Runtime>(runtime: &R, exe: &Path) -> Result<Self> {
        let exe_dir = exe.parent().unwrap_or(Path::new("."));

        for dir in PAYLOAD_DIRS {
            let payload_dir = exe_dir.join(dir);
            let manifest_path = payload_dir.join(MANIFEST_FILE);
            if !runtime.is_file(&manifest_path) {
                continue;
            }

            debug!("Using packaged manifest {:?}", manifest_path);
            return Self::load(runtime, &manifest_path);
        }

        debug!("No packaged manifest next to {:?}, using built-in release", exe);
        Ok(Self::builtin())
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let mut manifest: ReleaseManifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid release manifest {:?}", path))?;
        manifest.version = manifest.version.trim_start_matches('v').to_string();
        manifest.payload_dir = path.parent().map(Path::to_path_buf);
        Ok(manifest)
    }

    pub fn artifact(&self, key: PlatformKey) -> Option<&Artifact> {
        self.artifacts.get(&key)
    }

    /// Resolve where the artifact's bytes come from. Packaged files win over
    /// URLs, provided the packaged file is actually present.
    pub fn source_for<R: Runtime>(&self, runtime: &R, artifact: &Artifact) -> Option<ArtifactSource> {
        if let (Some(rel), Some(dir)) = (&artifact.path, &self.payload_dir) {
            let packaged = dir.join(rel);
            if runtime.is_file(&packaged) {
                return Some(ArtifactSource::Packaged(packaged));
            }
            debug!("Packaged artifact {:?} is missing", packaged);
        }

        artifact.url.clone().map(ArtifactSource::Remote)
    }

    /// URL of the GitHub "latest release" endpoint used for update checks.
    pub fn latest_release_url(&self) -> String {
        self.update_check_url.clone().unwrap_or_else(|| {
            format!(
                "https://api.github.com/repos/{}/releases/latest",
                self.repository
            )
        })
    }
}
