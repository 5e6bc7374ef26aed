// CLI module for bitflix
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// bitflix - Movie catalog gateway for the upstream movie API
#[derive(Parser, Debug)]
#[command(name = "bitflix", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.bitflix/config.toml)
    #[arg(short, long, env = "BITFLIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Applies command-line overrides, which take precedence over every
    /// other configuration source.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
