use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// File recording which binary is installed, next to the binary itself.
pub const RECORD_FILE: &str = ".ccline-install.json";

/// Fixed install directory read by Claude Code: `~/.claude/ccline`.
pub fn default_install_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    runtime
        .home_dir()
        .map(|home| home.join(".claude").join("ccline"))
        .ok_or_else(|| anyhow!("Could not determine the home directory"))
}

pub fn record_path(install_dir: &Path) -> PathBuf {
    install_dir.join(RECORD_FILE)
}

/// A temp path in `dir` unique to this process, so concurrent installers
/// never write into each other's staging files.
pub fn staging_path(dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    dir.join(format!(".{}.{}.{}", stem, std::process::id(), suffix))
}
