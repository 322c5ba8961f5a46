//! Lifecycle of the tank match: start, restart, commands and stop.

use crate::arena::{ArenaState, HighScore};
use crate::commands::apply_command;
use crate::scheduler::{Outbox, Scheduler, Snapshot, TickedGame};
use log::{debug, trace};
use shared::{Packet, TankCommand};
use std::time::Duration;

impl Snapshot for ArenaState {
    fn to_packet(&self) -> Packet {
        Packet::TankState(self.snapshot())
    }
}

impl TickedGame for ArenaState {
    fn is_active(&self) -> bool {
        self.active
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn tick(&mut self) {
        // A finished match keeps broadcasting its final state until reset
        if !self.is_over {
            let report = self.step();
            trace!("Tank tick {}: {:?}", self.tick, report);
        }
        self.sync_high_score();
    }
}

/// The single tank arena of this process and the loop that drives it.
pub struct TankSession {
    scheduler: Scheduler<ArenaState>,
}

impl TankSession {
    pub fn new(period: Duration, outbox: Outbox, high_score: HighScore, seed: Option<u64>) -> Self {
        let arena = ArenaState::new(high_score, seed);
        Self {
            scheduler: Scheduler::new("Tank", arena, period, outbox),
        }
    }

    /// Starts a new match unless one is already ticking.
    ///
    /// A repeated start only republishes the running match, so a late joiner
    /// still gets a snapshot.
    pub async fn start(&self) -> bool {
        let started = self.scheduler.start_with(ArenaState::reset).await;
        if !started {
            self.scheduler.publish().await;
        }
        started
    }

    /// Resets to a fresh level-1 match whether or not one is in progress.
    pub async fn restart(&self) {
        self.scheduler.restart_with(ArenaState::reset).await;
    }

    /// Applies a player command under the arena lock.
    pub async fn command(&self, command: TankCommand) -> bool {
        let applied = self
            .scheduler
            .with_state(|arena| arena.active && apply_command(arena, command))
            .await;
        if !applied {
            debug!("Tank command {:?} ignored", command);
        }
        applied
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_ticking()
    }

    pub async fn snapshot(&self) -> Packet {
        self.scheduler.snapshot().await
    }

    /// Runs `f` against the arena under its lock.
    pub async fn with_arena<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut ArenaState) -> R,
    {
        self.scheduler.with_state(f).await
    }

    /// Best score of this process, as the arena last recorded it.
    pub async fn high_score(&self) -> u32 {
        self.with_arena(|arena| arena.high_score).await
    }
}
