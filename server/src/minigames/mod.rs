//! The smaller games hosted next to the tank arena.
//!
//! Snake is ticked like the arena and runs on its own [`Scheduler`]. Memory,
//! Hangman and Gobang are turn based: they only change in response to a
//! player action or a deferred follow-up, so they sit on a [`Table`] instead.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler

pub mod gobang;
pub mod hangman;
pub mod memory;
pub mod snake;

use crate::scheduler::{self, Outbox, Snapshot};
use log::trace;
use shared::Packet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub use gobang::{GobangBoard, GobangSession};
pub use hangman::{HangmanGame, HangmanSession};
pub use memory::{MemoryBoard, MemorySession};
pub use snake::{SnakeGame, SnakeSession};

/// A turn-based game behind its own lock, publishing after every change.
pub struct Table<G: Snapshot + Send + 'static> {
    state: Arc<Mutex<G>>,
    outbox: Outbox,
}

impl<G: Snapshot + Send + 'static> Table<G> {
    pub fn new(game: G, outbox: Outbox) -> Self {
        Self {
            state: Arc::new(Mutex::new(game)),
            outbox,
        }
    }

    /// Runs `f` under the game lock and publishes if it returns true.
    pub async fn act<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut G) -> bool,
    {
        let mut game = self.state.lock().await;
        let changed = f(&mut game);
        if changed {
            self.send(game.to_packet());
        }
        changed
    }

    /// Schedules `action` to run against the game after `delay`.
    pub fn defer<F>(&self, delay: Duration, action: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut G) -> bool + Send + 'static,
    {
        scheduler::defer(Arc::clone(&self.state), self.outbox.clone(), delay, action)
    }

    pub async fn snapshot(&self) -> Packet {
        self.state.lock().await.to_packet()
    }

    pub async fn with_state<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut G) -> R,
    {
        let mut game = self.state.lock().await;
        f(&mut game)
    }

    fn send(&self, packet: Packet) {
        if self.outbox.send(packet).is_err() {
            trace!("Table update dropped: no subscribers");
        }
    }
}
