use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Line-based multi-client chat server", long_about = None)]
pub struct Cli {
    /// JSON config file with `host`, `port` and `logLocation`. Defaults apply without one.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Host to listen on, overriding the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, overriding the config file. Use 0 for an ephemeral port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Chat log file, overriding the config file.
    #[arg(long)]
    pub log_location: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (if any) and applies command-line overrides.
    pub fn resolve_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(log_location) = &self.log_location {
            config.log_location = log_location.clone();
        }
        Ok(config)
    }
}
