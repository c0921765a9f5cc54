//! Wrapper-level failures and the exit codes reserved for them.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a host the native binary is not built for.
pub const EXIT_UNSUPPORTED_PLATFORM: i32 = 241;
/// Exit code when the native binary could not be installed.
pub const EXIT_INSTALLATION_FAILED: i32 = 242;
/// Exit code when the installed binary could not be executed.
pub const EXIT_DISPATCH_FAILED: i32 = 243;

/// Standard exit code for an interrupted process.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum WrapperError {
    /// No native binary exists for this OS/architecture. Terminal.
    #[error(
        "unsupported platform {os}/{arch}; prebuilt ccline binaries exist for {}",
        crate::platform::supported_list()
    )]
    UnsupportedPlatform { os: String, arch: String },

    /// The binary could not be placed at the install path. Re-running may succeed.
    #[error("failed to install ccline to {}", path.display())]
    Installation {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The installed binary could not be executed.
    #[error("failed to run {}; re-run ccline to reinstall it", path.display())]
    Dispatch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ctrl-C arrived while installing. Staged files are already removed.
    #[error("interrupted while installing ccline; nothing was replaced")]
    Interrupted,
}

impl WrapperError {
    pub fn installation(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        WrapperError::Installation {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            WrapperError::UnsupportedPlatform { .. } => EXIT_UNSUPPORTED_PLATFORM,
            WrapperError::Installation { .. } => EXIT_INSTALLATION_FAILED,
            WrapperError::Dispatch { .. } => EXIT_DISPATCH_FAILED,
            WrapperError::Interrupted => EXIT_INTERRUPTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_codes_are_distinct_and_non_zero() {
        let errors = [
            WrapperError::UnsupportedPlatform {
                os: "freebsd".into(),
                arch: "x86_64".into(),
            },
            WrapperError::installation("/tmp/ccline", anyhow!("disk full")),
            WrapperError::Dispatch {
                path: PathBuf::from("/tmp/ccline"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        ];

        let codes: Vec<i32> = errors.iter().map(WrapperError::exit_code).collect();
        assert_eq!(codes, vec![241, 242, 243]);
        assert!(!codes.contains(&EXIT_INTERRUPTED));
        assert_eq!(WrapperError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn test_unsupported_platform_message_names_combination() {
        let err = WrapperError::UnsupportedPlatform {
            os: "freebsd".into(),
            arch: "riscv64".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("freebsd/riscv64"));
        assert!(msg.contains("linux-x64"));
    }

    #[test]
    fn test_installation_error_keeps_cause_chain() {
        let cause = anyhow!("permission denied").context("Failed to create directory");
        let err = WrapperError::installation("/home/user/.claude/ccline/ccline", cause);

        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert!(rendered.contains("failed to install ccline"));
        assert!(rendered.contains("Failed to create directory"));
        assert!(rendered.contains("permission denied"));
    }
}
