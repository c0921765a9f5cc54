use log::debug;
use std::path::{Path, PathBuf};

/// A staging file that must not outlive a failed or interrupted installation.
///
/// The file is removed when the guard is dropped, unless it was committed.
/// Dropping an in-flight install future on Ctrl-C therefore cleans up the
/// same way an early `?` return does.
pub struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed into place; nothing is left to remove.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            debug!("Removing staged file {:?}", self.path);
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
