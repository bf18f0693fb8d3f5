// Client types and their version-query conventions
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, NodePathError};
use crate::platform::Os;

/// A family of blockchain client binaries.
///
/// The variant name doubles as the bundled directory name and the executable
/// name looked up on the system `PATH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Geth,
    Eth,
    Parity,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [ClientType::Geth, ClientType::Eth, ClientType::Parity];

    pub fn name(&self) -> &'static str {
        match self {
            ClientType::Geth => "geth",
            ClientType::Eth => "eth",
            ClientType::Parity => "parity",
        }
    }

    /// Arguments that make the binary print its version on stdout.
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            ClientType::Geth => &["version"],
            ClientType::Eth | ClientType::Parity => &["--version"],
        }
    }

    /// Executable file name on the given OS.
    pub fn executable_name(&self, os: Os) -> String {
        match os {
            Os::Windows => format!("{}.exe", self.name()),
            _ => self.name().to_string(),
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClientType {
    type Err = NodePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientType::ALL
            .into_iter()
            .find(|client| client.name() == s)
            .ok_or_else(|| {
                NodePathError::Config(Box::new(ConfigError::UnknownClient {
                    name: s.to_string(),
                    known: ClientType::ALL.iter().map(|c| c.name().to_string()).collect(),
                }))
            })
    }
}
