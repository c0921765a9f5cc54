//! Platform detection
//!
//! Maps the host operating system and CPU architecture onto the fixed set of
//! targets that native ccline binaries are published for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WrapperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    X64,
    Arm64,
}

impl Os {
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "linux" => Some(Os::Linux),
            "macos" | "darwin" => Some(Os::Darwin),
            "windows" | "win32" => Some(Os::Windows),
            _ => None,
        }
    }
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "x86_64" | "x64" | "amd64" => Some(Arch::X64),
            "aarch64" | "arm64" => Some(Arch::Arm64),
            _ => None,
        }
    }
}

/// An (operating system, architecture) pair a native binary is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

/// Every platform with a published native binary.
pub const SUPPORTED: [PlatformKey; 5] = [
    PlatformKey::new(Os::Linux, Arch::X64),
    PlatformKey::new(Os::Linux, Arch::Arm64),
    PlatformKey::new(Os::Darwin, Arch::X64),
    PlatformKey::new(Os::Darwin, Arch::Arm64),
    PlatformKey::new(Os::Windows, Arch::X64),
];

pub(crate) fn supported_list() -> String {
    SUPPORTED
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PlatformKey {
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the platform of the running process.
    pub fn detect() -> Result<Self, WrapperError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map raw OS/arch identifiers to a supported key.
    ///
    /// Accepts Rust's `std::env::consts` names as well as the Node-style
    /// aliases (`darwin`, `win32`, `x64`) used in release asset names.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, WrapperError> {
        let unsupported = || WrapperError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let key = match (Os::parse(os), Arch::parse(arch)) {
            (Some(os), Some(arch)) => PlatformKey::new(os, arch),
            _ => return Err(unsupported()),
        };

        if SUPPORTED.contains(&key) {
            Ok(key)
        } else {
            Err(unsupported())
        }
    }

    /// File name of the native executable on this platform.
    pub fn binary_name(&self) -> &'static str {
        match self.os {
            Os::Windows => "ccline.exe",
            _ => "ccline",
        }
    }

    /// Name of the GitHub release asset for this platform.
    pub fn release_asset_name(&self) -> String {
        let os = match self.os {
            Os::Darwin => "macos",
            other => other.as_str(),
        };
        let ext = match self.os {
            Os::Windows => "zip",
            _ => "tar.gz",
        };
        format!("ccline-{}-{}.{}", os, self.arch.as_str(), ext)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = WrapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s.split_once(['-', '/']).unwrap_or((s, ""));
        Self::from_parts(os, arch)
    }
}

impl TryFrom<String> for PlatformKey {
    type Error = WrapperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlatformKey> for String {
    fn from(key: PlatformKey) -> Self {
        key.to_string()
    }
}
