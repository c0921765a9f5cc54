use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

use crate::archive::ArchiveExtractorImpl;
use crate::http::HttpClient;
use crate::install::Installer;
use crate::install::paths::default_install_dir;
use crate::manifest::ReleaseManifest;
use crate::runtime::Runtime;
use crate::update::{UPDATE_CHECK_TIMEOUT, VersionChecker};

/// Everything one invocation needs, resolved from the host.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    /// Wrapper executable, used to find the bundled payload.
    pub exe: PathBuf,
    pub install_dir: PathBuf,
    pub manifest: ReleaseManifest,
    pub update_check_timeout: Duration,
}

impl<R: Runtime + Clone> Config<R> {
    pub fn load(runtime: R) -> Result<Self> {
        let exe = runtime.current_exe()?;
        let install_dir = default_install_dir(&runtime)?;
        let manifest = ReleaseManifest::locate(&runtime, &exe)?;
        debug!(
            "ccline {} from {}, installing into {:?}",
            manifest.version,
            manifest
                .payload_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "GitHub releases".to_string()),
            install_dir
        );

        Ok(Self {
            runtime,
            http: HttpClient::with_defaults()?,
            exe,
            install_dir,
            manifest,
            update_check_timeout: UPDATE_CHECK_TIMEOUT,
        })
    }

    pub fn installer(&self) -> Installer<R> {
        Installer::new(
            self.runtime.clone(),
            self.http.clone(),
            ArchiveExtractorImpl::new(),
            self.install_dir.clone(),
            self.manifest.clone(),
        )
    }

    pub fn version_checker(&self) -> VersionChecker<R> {
        VersionChecker::new(
            self.runtime.clone(),
            self.http.clone(),
            self.manifest.latest_release_url(),
            self.install_dir.clone(),
            self.manifest.install_command.clone(),
        )
        .with_timeout(self.update_check_timeout)
    }
}
