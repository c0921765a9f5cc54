//! Host directories and executable location.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn current_exe_impl(&self) -> Result<PathBuf> {
        let exe = env::current_exe().context("Failed to locate the running executable")?;
        // Resolve launcher symlinks (e.g. ~/.local/bin/ccline -> install prefix)
        Ok(exe.canonicalize().unwrap_or(exe))
    }
}
