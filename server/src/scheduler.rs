//! Fixed-interval tick loops and deferred one-shot actions.
//!
//! A [`Scheduler`] owns one game behind one mutex and at most one ticking
//! task. Its lifecycle is `stopped -> running -> stopped`:
//!
//! * [`Scheduler::start_with`] initialises the game and spawns the loop, or
//!   does nothing when a loop is already running.
//! * [`Scheduler::restart_with`] always re-initialises the game and spawns a
//!   loop only if none is running.
//! * [`Scheduler::stop`] clears the game's active flag and joins the task.
//!
//! The loop itself exits the first time it finds the game inactive, and
//! records that under the game lock so a concurrent restart can tell an
//! exiting loop from a live one.

use log::{debug, error, info, trace};
use shared::Packet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Channel every published snapshot goes through on its way to clients.
pub type Outbox = broadcast::Sender<Packet>;

/// Anything that can be rendered into an outbound state packet.
pub trait Snapshot {
    fn to_packet(&self) -> Packet;
}

/// A game advanced by a fixed-interval loop.
pub trait TickedGame: Snapshot + Send + 'static {
    fn is_active(&self) -> bool;
    fn deactivate(&mut self);
    /// Advances the game by one tick. Runs with the game lock held.
    fn tick(&mut self);
}

pub struct Scheduler<G: TickedGame> {
    name: &'static str,
    state: Arc<Mutex<G>>,
    outbox: Outbox,
    period: Duration,
    ticking: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<G: TickedGame> Scheduler<G> {
    pub fn new(name: &'static str, game: G, period: Duration, outbox: Outbox) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(game)),
            outbox,
            period,
            ticking: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// True while a loop is advancing the game.
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    /// Initialises the game with `init` and starts ticking.
    ///
    /// Returns false without touching the game when a loop is already running.
    pub async fn start_with<F>(&self, init: F) -> bool
    where
        F: FnOnce(&mut G),
    {
        self.launch(init, true).await
    }

    /// Re-initialises the game with `init`, starting a loop if none is running.
    pub async fn restart_with<F>(&self, init: F)
    where
        F: FnOnce(&mut G),
    {
        self.launch(init, false).await;
    }

    async fn launch<F>(&self, init: F, only_if_stopped: bool) -> bool
    where
        F: FnOnce(&mut G),
    {
        let mut task = self.task.lock().await;
        let mut game = self.state.lock().await;

        let running = self.ticking.load(Ordering::Acquire);
        if only_if_stopped && running {
            debug!("{} loop already running", self.name);
            return false;
        }

        init(&mut game);
        let packet = game.to_packet();
        if !running {
            self.ticking.store(true, Ordering::Release);
        }
        drop(game);

        if !running {
            // A previous loop has already decided to exit; wait for it so two
            // tasks never overlap.
            if let Some(previous) = task.take() {
                if let Err(e) = previous.await {
                    error!("{} loop task failed: {}", self.name, e);
                }
            }
            *task = Some(tokio::spawn(run_loop(
                self.name,
                Arc::clone(&self.state),
                self.outbox.clone(),
                self.period,
                Arc::clone(&self.ticking),
            )));
            info!("{} loop started ({:?} per tick)", self.name, self.period);
        }

        self.send(packet);
        true
    }

    /// Marks the game inactive and waits for the loop to exit.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        self.state.lock().await.deactivate();

        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                error!("{} loop task failed: {}", self.name, e);
            }
            info!("{} loop stopped", self.name);
        }
    }

    /// Runs `f` against the game under its lock.
    pub async fn with_state<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut G) -> R,
    {
        let mut game = self.state.lock().await;
        f(&mut game)
    }

    /// Publishes the current state immediately, outside the tick cadence.
    pub async fn publish(&self) {
        let packet = self.state.lock().await.to_packet();
        self.send(packet);
    }

    pub async fn snapshot(&self) -> Packet {
        self.state.lock().await.to_packet()
    }

    fn send(&self, packet: Packet) {
        if self.outbox.send(packet).is_err() {
            trace!("{} update dropped: no subscribers", self.name);
        }
    }
}

async fn run_loop<G: TickedGame>(
    name: &'static str,
    state: Arc<Mutex<G>>,
    outbox: Outbox,
    period: Duration,
    ticking: Arc<AtomicBool>,
) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Skip the first tick since it fires immediately
    timer.tick().await;

    loop {
        timer.tick().await;

        let mut game = state.lock().await;
        if !game.is_active() {
            ticking.store(false, Ordering::Release);
            break;
        }

        game.tick();
        if outbox.send(game.to_packet()).is_err() {
            trace!("{} update dropped: no subscribers", name);
        }
    }

    info!("{} loop exited", name);
}

/// Runs `action` against the game after `delay`, under the game's own lock.
///
/// The action returns true when it changed something worth publishing.
pub fn defer<G, F>(
    state: Arc<Mutex<G>>,
    outbox: Outbox,
    delay: Duration,
    action: F,
) -> JoinHandle<()>
where
    G: Snapshot + Send + 'static,
    F: FnOnce(&mut G) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        sleep(delay).await;
        let mut game = state.lock().await;
        if action(&mut game) && outbox.send(game.to_packet()).is_err() {
            trace!("Deferred update dropped: no subscribers");
        }
    })
}
