//! Runtime configuration for the arcade server.

use clap::Parser;
use std::time::Duration;

/// Command line arguments of the `server` binary.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    pub port: u16,
    /// Tank arena tick interval in milliseconds
    #[clap(long, default_value = "50")]
    pub tank_tick_ms: u64,
    /// Snake tick interval in milliseconds
    #[clap(long, default_value = "150")]
    pub snake_tick_ms: u64,
    /// Maximum number of connected clients
    #[clap(long, default_value = "32")]
    pub max_clients: usize,
    /// Seconds of silence before a client is dropped from the broadcast list
    #[clap(long, default_value = "5")]
    pub client_timeout_secs: u64,
    /// Seed for all game randomness; entropy when omitted
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tank_tick: Duration,
    pub snake_tick: Duration,
    pub max_clients: usize,
    pub client_timeout: Duration,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            tank_tick: Duration::from_millis(50),
            snake_tick: Duration::from_millis(150),
            max_clients: 32,
            client_timeout: Duration::from_secs(5),
            seed: None,
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            // A zero interval would make tokio's interval panic
            tank_tick: Duration::from_millis(args.tank_tick_ms.max(1)),
            snake_tick: Duration::from_millis(args.snake_tick_ms.max(1)),
            max_clients: args.max_clients,
            client_timeout: Duration::from_secs(args.client_timeout_secs),
            seed: args.seed,
        }
    }
}
