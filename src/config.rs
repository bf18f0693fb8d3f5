// Configuration handling for nodepath
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, NodePathError, Result};
use crate::layout::PackagingMode;
use crate::platform::Platform;

/// Runtime settings the resolver reads once per scan.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Running from a packaged application build
    pub packaged: bool,
    /// Application root; the bundled `nodes` folder lives directly below it
    pub app_root: PathBuf,
    /// Development-mode nodes directory
    pub nodes_dir: PathBuf,
    /// Search path for system lookups, `PATH` syntax; `None` uses the process `PATH`
    pub search_path: Option<String>,
    /// Platform override, mostly useful for tests and cross-layout inspection
    pub platform: Option<Platform>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            packaged: false,
            app_root: default_app_root(),
            nodes_dir: PathBuf::from("nodes"),
            search_path: None,
            platform: None,
        }
    }
}

fn default_app_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NodePathError::Config(Box::new(ConfigError::NotFound {
                path: path.to_path_buf(),
            })));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_with_context(&content, Some(path))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_context(yaml, None)
    }

    fn from_yaml_with_context(yaml: &str, source: Option<&Path>) -> Result<Self> {
        // An empty document deserializes to unit, not a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml).map_err(|e| {
            let mut config_error = *Box::<ConfigError>::from(e);
            if let ConfigError::InvalidYaml {
                ref mut file_path, ..
            } = config_error
            {
                *file_path = source.map(Path::to_path_buf);
            }
            NodePathError::Config(Box::new(config_error))
        })
    }

    pub fn with_packaged(mut self, packaged: bool) -> Self {
        self.packaged = packaged;
        self
    }

    pub fn with_app_root(mut self, app_root: impl Into<PathBuf>) -> Self {
        self.app_root = app_root.into();
        self
    }

    pub fn with_nodes_dir(mut self, nodes_dir: impl Into<PathBuf>) -> Self {
        self.nodes_dir = nodes_dir.into();
        self
    }

    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform.clone().unwrap_or_else(Platform::current)
    }

    pub fn packaging_mode(&self) -> PackagingMode {
        if self.packaged {
            PackagingMode::Packaged {
                app_root: self.app_root.clone(),
            }
        } else {
            PackagingMode::Development {
                nodes_dir: self.nodes_dir.clone(),
            }
        }
    }

    /// Search path handed to the system lookup
    pub fn effective_search_path(&self) -> Option<OsString> {
        self.search_path
            .as_ref()
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"))
    }
}
