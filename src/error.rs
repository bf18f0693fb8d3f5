// Error handling framework for nodepath
use std::path::PathBuf;
use thiserror::Error;

use crate::client::ClientType;

pub type Result<T> = std::result::Result<T, NodePathError>;

/// Main error type for nodepath
#[derive(Debug, Error)]
pub enum NodePathError {
    #[error("Bundled binaries directory unavailable: {}", path.display())]
    LayoutUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process execution failed: {0}")]
    Process(#[from] Box<ProcessError>),

    #[error("No {client} binary found (bundled or system)")]
    NoCandidates { client: ClientType },

    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Process execution errors with context
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Process spawn failed: {command}")]
    SpawnFailed { command: String, error: String },

    #[error("Process exited with code {exit_code:?}: {command}")]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Process timeout after {duration:?}: {command}")]
    Timeout {
        command: String,
        duration: std::time::Duration,
    },

    #[error("Output capture failed: {message}")]
    OutputCaptureFailed { message: String, command: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
        file_path: Option<PathBuf>,
    },

    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Unknown client type: {name}")]
    UnknownClient { name: String, known: Vec<String> },
}

/// Exit codes used by the command line front end
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const CLIENT_UNAVAILABLE: i32 = 3;
}

impl NodePathError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            NodePathError::NoCandidates { .. } => exit_codes::CLIENT_UNAVAILABLE,
            NodePathError::Config(_) => exit_codes::CONFIG_ERROR,
            // Layout and probe failures degrade to "no candidate" inside a scan
            NodePathError::LayoutUnavailable { .. }
            | NodePathError::Process(_)
            | NodePathError::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }

    /// Create a user-friendly error message with a hint where one helps
    pub fn user_message(&self) -> String {
        let mut output = format!("Error: {self}");

        match self {
            NodePathError::NoCandidates { client } => {
                output.push_str(&format!(
                    "\n  Help: install {client} or ship it under the bundled nodes directory"
                ));
            }
            NodePathError::Process(process_err) => {
                if let ProcessError::NonZeroExit { stderr, .. } = process_err.as_ref() {
                    if !stderr.is_empty() {
                        output.push_str(&format!("\n  Process error: {}", stderr.trim()));
                    }
                }
            }
            NodePathError::Config(config_err) => match config_err.as_ref() {
                ConfigError::InvalidYaml {
                    file_path: Some(path),
                    line: Some(line),
                    ..
                } => {
                    output.push_str(&format!("\n  --> {}:{}", path.display(), line));
                }
                ConfigError::UnknownClient { known, .. } => {
                    output.push_str(&format!("\n  Help: expected one of {}", known.join(", ")));
                }
                _ => {}
            },
            _ => {}
        }

        output
    }
}

// Conversion from serde_yaml::Error to ConfigError
impl From<serde_yaml::Error> for Box<ConfigError> {
    fn from(error: serde_yaml::Error) -> Self {
        let location = error.location();
        Box::new(ConfigError::InvalidYaml {
            message: error.to_string(),
            line: location.as_ref().map(|l| l.line() as u32),
            column: location.as_ref().map(|l| l.column() as u32),
            file_path: None,
        })
    }
}

impl From<serde_yaml::Error> for NodePathError {
    fn from(error: serde_yaml::Error) -> Self {
        NodePathError::Config(Box::<ConfigError>::from(error))
    }
}
