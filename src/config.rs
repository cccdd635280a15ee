use std::path::PathBuf;

use clap::Parser;

use crate::domain::WatcherError;
use crate::trello::client::DEFAULT_API_URL;

/// Command line flags. Every flag falls back to its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "trello-watcher", version, about = "Keeps a Trello board's task lists in step with project checklists")]
pub struct Cli {
    /// Trello board id
    #[arg(long = "board", env = "TRELLO_BOARD_ID")]
    pub board_id: Option<String>,

    /// Trello API key
    #[arg(long, env = "TRELLO_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Trello API token
    #[arg(long, env = "TRELLO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Public host name webhooks call back to
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Scheme used in callback URLs
    #[arg(long, env = "CALLBACK_SCHEME", default_value = "https")]
    pub scheme: String,

    /// Directory for unhandled payloads and verification markers
    #[arg(long, env = "LOG_DIR", default_value = "./log")]
    pub log_dir: PathBuf,

    /// Trello API base URL
    #[arg(long, env = "TRELLO_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub board_id: String,
    pub key: String,
    pub token: String,
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub log_dir: PathBuf,
    pub api_url: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, WatcherError> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| {
            let value = value.filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let board_id = require(cli.board_id, "board id");
        let key = require(cli.key, "key");
        let token = require(cli.token, "token");
        let host = require(cli.host, "host");
        let port = cli.port.filter(|port| *port != 0);
        if port.is_none() {
            missing.push("port");
        }

        if !missing.is_empty() {
            return Err(WatcherError::Configuration(format!(
                "The board id, Trello key and token, host, and port are all required (missing: {})",
                missing.join(", ")
            )));
        }

        Ok(Self {
            board_id,
            key,
            token,
            host,
            port: port.unwrap_or_default(),
            scheme: cli.scheme,
            log_dir: cli.log_dir,
            api_url: cli.api_url,
        })
    }

    pub fn load() -> Result<Self, WatcherError> {
        Self::from_cli(Cli::parse())
    }
}
