//! Configuration for the fragment sender.
//!
//! Everything has a fixed default matching the usual manual test setup
//! (loopback, port 4567, built-in payload script); CLI flags exist so the
//! tool can be pointed elsewhere without editing constants.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Default listen endpoint the chat client under test connects to.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:4567";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "fragsend")]
#[command(version = "0.1.0")]
#[command(about = "Interactive TCP stream fragmentation tester", long_about = None)]
pub struct CliArgs {
    /// Address to listen on (e.g. 127.0.0.1:4567)
    #[arg(short = 'l', long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Path to a TOML script file overriding the built-in payload sequence
    #[arg(short = 's', long)]
    pub script: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub script: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Resolve configuration from CLI arguments.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let listen = cli
            .listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(cli.listen.clone()))?;

        Ok(Config {
            listen,
            script: cli.script,
            log_level: cli.log_level,
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address '{0}' (expected host:port)")]
    InvalidListen(String),
}
