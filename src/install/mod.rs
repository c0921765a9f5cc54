use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::{
    archive::{ArchiveExtractor, ArchiveExtractorImpl},
    cleanup::StagedFile,
    download::download_file,
    error::WrapperError,
    http::HttpClient,
    manifest::{Artifact, ArtifactSource, ReleaseManifest},
    platform::PlatformKey,
    runtime::Runtime,
};

pub mod config;
pub mod paths;
mod record;

pub use record::{InstalledBinaryRecord, Staleness};

use paths::{record_path, staging_path};

/// Mode given to the installed binary.
const EXECUTABLE_MODE: u32 = 0o755;

/// Places the native binary at the fixed install path.
///
/// Installation is idempotent: a valid record for the packaged version and
/// host platform short-circuits without touching the filesystem. Otherwise
/// the binary is staged next to its destination and renamed over it, so a
/// racing or interrupted invocation never sees a partial executable.
pub struct Installer<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub extractor: ArchiveExtractorImpl,
    pub install_dir: PathBuf,
    pub manifest: ReleaseManifest,
}

impl<R: Runtime> Installer<R> {
    pub fn new(
        runtime: R,
        http: HttpClient,
        extractor: ArchiveExtractorImpl,
        install_dir: PathBuf,
        manifest: ReleaseManifest,
    ) -> Self {
        Self {
            runtime,
            http,
            extractor,
            install_dir,
            manifest,
        }
    }

    pub fn binary_path(&self, key: PlatformKey) -> PathBuf {
        self.install_dir.join(key.binary_name())
    }

    #[tracing::instrument(skip(self))]
    pub async fn ensure_installed(
        &self,
        key: PlatformKey,
    ) -> Result<InstalledBinaryRecord, WrapperError> {
        let binary_path = self.binary_path(key);
        let record_path = record_path(&self.install_dir);

        if let Some(record) = InstalledBinaryRecord::load(&self.runtime, &record_path) {
            match record.staleness(&self.runtime, &binary_path, &self.manifest.version, key) {
                None => {
                    debug!("ccline {} already installed at {:?}", record.version, record.path);
                    return Ok(record);
                }
                Some(reason) => info!("Reinstalling ccline: {:?}", reason),
            }
        }

        let artifact = self
            .manifest
            .artifact(key)
            .ok_or_else(|| WrapperError::UnsupportedPlatform {
                os: key.os.as_str().to_string(),
                arch: key.arch.as_str().to_string(),
            })?;

        // Polled first, so the handler is in place before staging begins.
        // Losing the race drops the install future and its staged files.
        tokio::select! {
            biased;
            Ok(()) = tokio::signal::ctrl_c() => {
                info!("Interrupted, staged files removed");
                Err(WrapperError::Interrupted)
            }
            result = self.install(key, artifact, &binary_path, &record_path) => {
                result.map_err(|e| WrapperError::installation(&binary_path, e))
            }
        }
    }

    async fn install(
        &self,
        key: PlatformKey,
        artifact: &Artifact,
        binary_path: &Path,
        record_path: &Path,
    ) -> Result<InstalledBinaryRecord> {
        let source = self
            .manifest
            .source_for(&self.runtime, artifact)
            .ok_or_else(|| anyhow!("No packaged binary or download URL for {}", key))?;

        self.runtime
            .create_dir_all(&self.install_dir)
            .with_context(|| format!("Failed to create {:?}", self.install_dir))?;

        let size = self
            .stage_and_replace(key, artifact, &source, binary_path)
            .await?;
        let record = InstalledBinaryRecord {
            path: binary_path.to_path_buf(),
            version: self.manifest.version.clone(),
            platform: key,
            size,
        };
        record.save(&self.runtime, record_path)?;

        info!(
            "Installed ccline {} ({}) to {:?}",
            record.version, key, binary_path
        );
        Ok(record)
    }

    /// Stage the binary in the install directory and rename it over the
    /// destination. Returns the installed size.
    async fn stage_and_replace(
        &self,
        key: PlatformKey,
        artifact: &Artifact,
        source: &ArtifactSource,
        binary_path: &Path,
    ) -> Result<u64> {
        let staged = StagedFile::new(staging_path(&self.install_dir, "ccline", "tmp"));

        match source {
            ArtifactSource::Packaged(path) => {
                debug!("Copying packaged binary {:?}", path);
                self.runtime
                    .copy(path, staged.path())
                    .with_context(|| format!("Failed to copy {:?}", path))?;
            }
            ArtifactSource::Remote(url) => {
                self.fetch(url, key, staged.path()).await?;
            }
        }

        if let Some(expected) = &artifact.sha256 {
            verify_sha256(&self.runtime, staged.path(), expected)?;
        }

        self.runtime
            .set_permissions(staged.path(), EXECUTABLE_MODE)
            .context("Failed to mark binary executable")?;
        let size = self.runtime.file_len(staged.path())?;

        // Copying a packaged binary never yields; check for Ctrl-C before
        // the destination is touched
        tokio::task::yield_now().await;

        self.runtime
            .rename(staged.path(), binary_path)
            .with_context(|| format!("Failed to move binary into {:?}", binary_path))?;
        staged.commit();

        Ok(size)
    }

    /// Download a release asset into `dest`, extracting it if it is an archive.
    async fn fetch(
        &self,
        url: &str,
        key: PlatformKey,
        dest: &Path,
    ) -> Result<()> {
        let asset_name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .unwrap_or(url);

        if !self.extractor.can_handle(asset_name) {
            download_file(&self.runtime, url, dest, &self.http).await?;
            return Ok(());
        }

        let archive = StagedFile::new(staging_path(&self.install_dir, "ccline", asset_name));
        download_file(&self.runtime, url, archive.path(), &self.http).await?;
        self.extractor
            .extract_binary(&self.runtime, archive.path(), key.binary_name(), dest)
    }
}

/// Compare the SHA-256 of `path` against a hex digest.
pub fn verify_sha256<R: Runtime>(runtime: &R, path: &Path, expected: &str) -> Result<()> {
    let mut reader = runtime.open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher).context("Failed to hash binary")?;
    let actual = hex::encode(hasher.finalize());

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        );
    }
    debug!("Checksum verified for {:?}", path);
    Ok(())
}
