//! Advisory update check.
//!
//! Looks up the latest published release at most once a day and reports a
//! notice when it is newer than the installed binary. Every failure is
//! swallowed: this must never change the outcome of an invocation.

use anyhow::{Context, Result};
use log::debug;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::http::HttpClient;
use crate::install::paths::staging_path;
use crate::runtime::Runtime;

/// Upper bound on the network lookup. No retries.
pub const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_millis(1500);

/// How long a completed lookup is reused before asking the server again.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const STATE_FILE: &str = ".update-check.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub current: String,
    pub latest: String,
    pub install_command: String,
}

impl fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ccline {} is available (installed: {}). Update with: {}",
            self.latest, self.current, self.install_command
        )
    }
}

/// Subset of the GitHub "latest release" response.
#[derive(Deserialize, Debug)]
struct LatestRelease {
    tag_name: String,
}

/// Result of the last successful lookup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct CheckState {
    checked_at: u64,
    latest: String,
}

pub struct VersionChecker<R: Runtime> {
    runtime: R,
    http: HttpClient,
    latest_url: String,
    state_path: PathBuf,
    install_command: String,
    timeout: Duration,
}

impl<R: Runtime> VersionChecker<R> {
    pub fn new(
        runtime: R,
        http: HttpClient,
        latest_url: String,
        state_dir: PathBuf,
        install_command: String,
    ) -> Self {
        Self {
            runtime,
            http,
            latest_url,
            state_path: state_dir.join(STATE_FILE),
            install_command,
            timeout: UPDATE_CHECK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Best-effort comparison of `current` against the latest release.
    #[tracing::instrument(skip(self))]
    pub async fn check_for_update(&self, current: &str) -> Option<UpdateNotice> {
        let latest = match self.latest_version().await {
            Ok(latest) => latest,
            Err(e) => {
                debug!("Update check skipped: {:#}", e);
                return None;
            }
        };

        let (Some(current_v), Some(latest_v)) = (parse_version(current), parse_version(&latest))
        else {
            debug!("Cannot compare versions {:?} and {:?}", current, latest);
            return None;
        };

        (latest_v > current_v).then(|| UpdateNotice {
            current: current_v.to_string(),
            latest: latest_v.to_string(),
            install_command: self.install_command.clone(),
        })
    }

    async fn latest_version(&self) -> Result<String> {
        let now = unix_now();

        if let Some(state) = self.load_state()
            && now.saturating_sub(state.checked_at) < CHECK_INTERVAL.as_secs()
        {
            debug!("Using cached latest version {}", state.latest);
            return Ok(state.latest);
        }

        let release: LatestRelease = self
            .http
            .get_json_once(&self.latest_url, self.timeout)
            .await?;
        let latest = release.tag_name;

        let state = CheckState {
            checked_at: now,
            latest: latest.clone(),
        };
        if let Err(e) = self.save_state(&state) {
            debug!("Failed to cache update check: {:#}", e);
        }

        Ok(latest)
    }

    fn load_state(&self) -> Option<CheckState> {
        if !self.runtime.exists(&self.state_path) {
            return None;
        }
        let content = self.runtime.read_to_string(&self.state_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn save_state(&self, state: &CheckState) -> Result<()> {
        let dir = self.state_path.parent().unwrap_or(Path::new("."));
        self.runtime.create_dir_all(dir)?;

        let tmp_path = staging_path(dir, "update-check", "json.tmp");
        let json = serde_json::to_string(state)?;
        self.runtime.write(&tmp_path, json.as_bytes())?;
        self.runtime
            .rename(&tmp_path, &self.state_path)
            .context("Failed to replace update check state")
    }
}

fn parse_version(raw: &str) -> Option<Version> {
    Version::parse(raw.trim().trim_start_matches('v')).ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
