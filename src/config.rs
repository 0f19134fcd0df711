//! Process configuration
//!
//! The listen port is the only value read from the environment (`PORT`);
//! everything else is a command-line flag. `RUST_LOG`, when set, overrides
//! `--log-level` in [`crate::telemetry::init_logging`].

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use tracing::Level;

/// GraphQL gateway over the Star Wars REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "swapi-graphql")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Base URL of the REST API
    #[arg(long, default_value = "https://swapi.dev/api")]
    pub api_base_url: String,

    /// Abandon queries running longer than this many seconds
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }

    /// Base URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
