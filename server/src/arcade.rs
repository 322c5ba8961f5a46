//! Routes inbound game packets to the session that owns them.

use crate::arena::HighScore;
use crate::config::ServerConfig;
use crate::minigames::gobang::MoveOutcome;
use crate::minigames::memory::FlipOutcome;
use crate::minigames::{GobangSession, HangmanSession, MemorySession, SnakeSession};
use crate::scheduler::Outbox;
use crate::session::TankSession;
use log::{debug, info};
use shared::{Packet, TankCommand};
use tokio::sync::broadcast;

/// Snapshots that may queue up per subscriber before it starts lagging.
const OUTBOX_CAPACITY: usize = 256;

/// Every game hosted by this process, one instance each.
pub struct Arcade {
    pub tank: TankSession,
    pub snake: SnakeSession,
    pub memory: MemorySession,
    pub hangman: HangmanSession,
    pub gobang: GobangSession,
    outbox: Outbox,
}

impl Arcade {
    pub fn new(config: &ServerConfig) -> Self {
        let (outbox, _) = broadcast::channel(OUTBOX_CAPACITY);
        // Distinct streams per game so seeded runs stay independent
        let seed = |offset: u64| config.seed.map(|s| s.wrapping_add(offset));

        Self {
            tank: TankSession::new(config.tank_tick, outbox.clone(), HighScore::new(), seed(0)),
            snake: SnakeSession::new(config.snake_tick, outbox.clone(), seed(1)),
            memory: MemorySession::new(outbox.clone(), seed(2)),
            hangman: HangmanSession::new(outbox.clone(), seed(3)),
            gobang: GobangSession::new(outbox.clone(), seed(4)),
            outbox,
        }
    }

    /// Receives every snapshot published by any game.
    pub fn subscribe(&self) -> broadcast::Receiver<Packet> {
        self.outbox.subscribe()
    }

    /// Applies one inbound game packet. Returns false if it was ignored.
    pub async fn dispatch(&self, packet: Packet) -> bool {
        match packet {
            Packet::TankStart => {
                self.tank.start().await;
                true
            }
            Packet::TankRestart => {
                self.tank.restart().await;
                true
            }
            Packet::TankInput { action, direction } => {
                match TankCommand::parse(&action, direction.as_deref()) {
                    Some(command) => self.tank.command(command).await,
                    None => {
                        debug!("Ignoring malformed tank input {:?} {:?}", action, direction);
                        false
                    }
                }
            }

            Packet::SnakeStart => {
                self.snake.start().await;
                true
            }
            Packet::SnakeTurn { direction } => self.snake.turn(direction).await,

            Packet::MemoryStart => {
                self.memory.start().await;
                true
            }
            Packet::MemoryFlip { card } => {
                self.memory.flip(card).await != FlipOutcome::Ignored
            }

            Packet::HangmanStart => {
                self.hangman.start().await;
                true
            }
            Packet::HangmanGuess { letter } => self.hangman.guess(&letter).await,

            Packet::GobangStart => {
                self.gobang.start().await;
                true
            }
            Packet::GobangMove { row, col } => {
                self.gobang.play(row, col).await != MoveOutcome::Ignored
            }

            other => {
                debug!("Arcade ignoring non-game packet {:?}", other);
                false
            }
        }
    }

    /// Stops the ticked games and waits for their loops to exit.
    pub async fn shutdown(&self) {
        self.tank.stop().await;
        self.snake.stop().await;
        info!("Arcade shut down");
    }
}
