// Host platform detection and bundled-layout naming
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Operating system families the resolver distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    #[serde(rename = "macos", alias = "darwin")]
    MacOs,
    Windows,
    Other,
}

impl Os {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else {
            Os::Other
        }
    }

    /// Name used for the platform segment of bundled node folders
    pub fn bundle_name(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "darwin",
            Os::Windows => "win32",
            Os::Other => std::env::consts::OS,
        }
    }

    /// Whether binaries installed on the system `PATH` are considered
    pub fn supports_system_lookup(&self) -> bool {
        matches!(self, Os::Linux | Os::MacOs)
    }
}

/// Operating system plus CPU architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    /// Node-style architecture name (`x64`, `ia32`, `arm64`)
    #[serde(deserialize_with = "deserialize_arch")]
    pub arch: String,
}

impl Platform {
    pub fn new(os: Os, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: normalize_arch(&arch.into()),
        }
    }

    pub fn current() -> Self {
        Self::new(Os::current(), std::env::consts::ARCH)
    }

    /// `{platform}-{arch}` folder name, e.g. `darwin-x64`
    pub fn bundle_dir_name(&self) -> String {
        format!("{}-{}", self.os.bundle_name(), self.arch)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bundle_dir_name())
    }
}

fn deserialize_arch<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let arch = String::deserialize(deserializer)?;
    Ok(normalize_arch(&arch))
}

fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" | "amd64" => "x64".to_string(),
        "x86" | "i686" | "i386" => "ia32".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}
