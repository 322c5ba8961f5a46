//! # Arcade Server Library
//!
//! Authoritative server for a small arcade of games played over UDP. The
//! centrepiece is a tank-combat arena simulated at a fixed tick; next to it
//! run Snake (also ticked) and three turn-based games: Memory, Hangman and
//! Gobang. Clients only send intents and render the snapshots they receive.
//!
//! ## Concurrency Model
//!
//! Every game owns its state behind one `tokio::sync::Mutex`. Tick loops and
//! command handlers take that lock for one bounded step each, so a command
//! applied between two ticks is visible to the next tick and never lands in
//! the middle of one. There is no global lock; the only value shared across
//! matches is the tank high score, an atomic counter.
//!
//! Ticked games are driven by a [`scheduler::Scheduler`], an explicit
//! `stopped -> running -> stopped` state machine guaranteeing at most one
//! loop per game. Delayed reactions (a memory pair flipping back, the gobang
//! AI thinking) are one-shot tasks that re-acquire the game lock and check a
//! round token before touching anything.
//!
//! ## Module Organization
//!
//! - `arena`, `factory`, `commands`: tank simulation step, level generation
//!   and player command application
//! - `scheduler`, `session`: tick loops and the tank match lifecycle
//! - `minigames`: Snake, Memory, Hangman and Gobang
//! - `arcade`: routes inbound packets to the owning game
//! - `client_manager`, `network`: UDP transport, connection registry and
//!   snapshot fan-out
//! - `config`, `error`: command line configuration and I/O error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!
//!     // Serves until the process is stopped:
//!     // - receives packets and applies them to the owning game
//!     // - forwards every published snapshot to all connected clients
//!     // - drops clients that stop sending heartbeats
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod arcade;
pub mod arena;
pub mod client_manager;
pub mod commands;
pub mod config;
pub mod error;
pub mod factory;
pub mod minigames;
pub mod network;
pub mod scheduler;
pub mod session;
