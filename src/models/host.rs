use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family reported by a host
///
/// Parsed leniently from the platform strings hosts report. Anything not recognised
/// lands in [`HostPlatform::Unknown`] with the original value preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostPlatform {
    MacOs,
    Ios,
    IpadOs,
    Windows,
    Linux,
    Unknown(String),
}

/// Platform strings reported by Linux distributions
const LINUX_PLATFORMS: &[&str] = &[
    "linux",
    "ubuntu",
    "debian",
    "rhel",
    "centos",
    "sles",
    "kali",
    "gentoo",
    "amzn",
    "pop",
    "arch",
    "linuxmint",
    "void",
    "nixos",
    "endeavouros",
    "manjaro",
    "opensuse-leap",
    "opensuse-tumbleweed",
    "tuxedo",
    "neon",
    "archarm",
    "fedora",
];

impl HostPlatform {
    pub fn parse(platform: &str) -> Self {
        let normalized = platform.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "darwin" | "macos" => Self::MacOs,
            "ios" => Self::Ios,
            "ipados" => Self::IpadOs,
            "windows" => Self::Windows,
            other if LINUX_PLATFORMS.contains(&other) => Self::Linux,
            _ => Self::Unknown(platform.to_string()),
        }
    }

    pub fn is_apple(&self) -> bool {
        match self {
            Self::MacOs | Self::Ios | Self::IpadOs => true,
            Self::Windows | Self::Linux | Self::Unknown(_) => false,
        }
    }

    /// Only Apple devices enrolled through automated enrollment wait for release
    pub fn supports_device_release(&self) -> bool {
        self.is_apple()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MacOs => "darwin",
            Self::Ios => "ios",
            Self::IpadOs => "ipados",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HostPlatform {
    fn from(platform: &str) -> Self {
        Self::parse(platform)
    }
}

/// The subset of host data the setup experience needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupHost {
    pub id: u32,
    pub uuid: String,
    pub team_id: Option<u32>,
    pub platform: HostPlatform,
}

impl SetupHost {
    pub fn new(id: u32, uuid: impl Into<String>, team_id: Option<u32>, platform: HostPlatform) -> Self {
        Self {
            id,
            uuid: uuid.into(),
            team_id,
            platform,
        }
    }
}
