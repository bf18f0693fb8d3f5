// CLI interface for nodepath using clap
use clap::Parser;
use std::path::PathBuf;

use crate::client::ClientType;
use crate::config::ResolverConfig;
use crate::error::{exit_codes, NodePathError, Result};
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::resolver::NodeResolver;

#[derive(Parser, Debug)]
#[command(
    name = "nodepath",
    about = "Locate the preferred bundled or system blockchain client binary",
    version = crate::VERSION,
    long_about = "nodepath compares the client binary bundled with an application against any copy \
                  installed on the system PATH and prints the path of the newer one."
)]
pub struct Cli {
    /// Client type to resolve (geth, eth, parity)
    #[arg(required_unless_present = "all")]
    pub client: Option<String>,

    /// Print the resolved path of every client as JSON
    #[arg(long, conflicts_with = "client")]
    pub all: bool,

    /// Configuration file (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat the application as a packaged build
    #[arg(long)]
    pub packaged: bool,

    /// Application root holding the bundled nodes folder (packaged builds)
    #[arg(long, value_name = "DIR")]
    pub app_root: Option<PathBuf>,

    /// Bundled nodes directory (development builds)
    #[arg(long, value_name = "DIR")]
    pub nodes_dir: Option<PathBuf>,

    /// Search path used for system lookups instead of PATH
    #[arg(long, value_name = "PATHS")]
    pub search_path: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty", value_name = "FORMAT")]
    pub log_format: LogFormat,

    /// Control color output (auto, always, never)
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,
}

impl Cli {
    pub fn run(&self) -> Result<i32> {
        init_logging(LogConfig::from_cli(
            self.verbose,
            self.quiet,
            self.color.clone(),
            self.log_format,
        ));

        let config = self.resolver_config()?;
        let client = self.client.as_deref().map(str::parse::<ClientType>).transpose()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let resolver = NodeResolver::new(config);

        runtime.block_on(async {
            match client {
                Some(client) => {
                    let path = resolver.get_node_path(client).await?;
                    println!("{}", path.display());
                }
                None => {
                    let resolved = resolver.resolved_paths().await;
                    let json = serde_json::to_string_pretty(&resolved)
                        .map_err(|e| NodePathError::Io(e.into()))?;
                    println!("{json}");
                }
            }
            Ok::<i32, NodePathError>(exit_codes::SUCCESS)
        })
    }

    /// Config file first, then command line overrides
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_file(path)?,
            None => ResolverConfig::default(),
        };

        if self.packaged {
            config.packaged = true;
        }
        if let Some(app_root) = &self.app_root {
            config.app_root = app_root.clone();
        }
        if let Some(nodes_dir) = &self.nodes_dir {
            config.nodes_dir = nodes_dir.clone();
        }
        if let Some(search_path) = &self.search_path {
            config.search_path = Some(search_path.clone());
        }

        Ok(config)
    }
}
