// nodepath - Library module
// Locates the preferred bundled or system-installed blockchain client binary

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod platform;
pub mod probe;
pub mod process;
pub mod resolver;
pub mod scanner;
pub mod version;

// Re-export main types for easier access
pub use client::ClientType;
pub use config::ResolverConfig;
pub use error::{exit_codes, ConfigError, NodePathError, ProcessError, Result};
pub use layout::PackagingMode;
pub use logging::{ColorConfig, LogConfig, LogFormat};
pub use platform::{Os, Platform};
pub use probe::{ProbeReport, ProbeRunner};
pub use process::{ProcessConfig, ProcessManager, ProcessResult};
pub use resolver::{NodeResolver, ResolvedPaths, ScanState, VersionRecord, SETTLING_DELAY};
pub use scanner::{Candidate, CandidateMap, CandidateScanner, CandidateSource, PRE_PROBE_WINDOW};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_constant() {
        assert_eq!(NAME, "nodepath");
    }

    #[test]
    fn test_description_exists() {
        assert!(DESCRIPTION.contains("client binary"));
    }
}
