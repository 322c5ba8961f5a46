//! Grid snake, advanced by its own tick loop.

use crate::scheduler::{Outbox, Scheduler, Snapshot, TickedGame};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{
    Packet, SnakeDirection, SnakeSnapshot, SNAKE_CELL_SIZE, SNAKE_GRID_HEIGHT, SNAKE_GRID_WIDTH,
};
use std::collections::VecDeque;
use std::time::Duration;

type Cell = (i32, i32);

#[derive(Debug, Clone)]
pub struct SnakeGame {
    /// Head first.
    pub body: VecDeque<Cell>,
    pub food: Cell,
    pub score: u32,
    /// Requested heading, applied on the next tick.
    pub direction: SnakeDirection,
    /// Heading of the last completed move; reversals are judged against it.
    heading: SnakeDirection,
    pub is_over: bool,
    pub active: bool,
    rng: StdRng,
}

impl SnakeGame {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            body: VecDeque::from([centre()]),
            food: (0, 0),
            score: 0,
            direction: SnakeDirection::Right,
            heading: SnakeDirection::Right,
            is_over: false,
            active: false,
            rng,
        }
    }

    pub fn reset(&mut self) {
        self.body = VecDeque::from([centre()]);
        self.score = 0;
        self.direction = SnakeDirection::Right;
        self.heading = SnakeDirection::Right;
        self.is_over = false;
        self.active = true;
        self.place_food();
        info!("Snake game started");
    }

    /// Queues a new heading. Reversals and turns after game over are ignored.
    pub fn turn(&mut self, direction: SnakeDirection) -> bool {
        if self.is_over || !self.active || direction == self.heading.opposite() {
            debug!("Ignoring snake turn {:?}", direction);
            return false;
        }
        self.direction = direction;
        true
    }

    pub fn advance(&mut self) {
        if self.is_over {
            return;
        }

        let (dx, dy) = self.direction.delta();
        let (x, y) = self.body[0];
        let head = (x + dx, y + dy);
        self.heading = self.direction;

        let on_grid = (0..SNAKE_GRID_WIDTH).contains(&head.0)
            && (0..SNAKE_GRID_HEIGHT).contains(&head.1);
        if !on_grid || self.body.contains(&head) {
            self.finish();
            return;
        }

        self.body.push_front(head);
        if head == self.food {
            self.score += 1;
            self.place_food();
        } else {
            self.body.pop_back();
        }
    }

    fn place_food(&mut self) {
        let free: Vec<Cell> = (0..SNAKE_GRID_HEIGHT)
            .flat_map(|y| (0..SNAKE_GRID_WIDTH).map(move |x| (x, y)))
            .filter(|cell| !self.body.contains(cell))
            .collect();

        match free.choose(&mut self.rng) {
            Some(&cell) => self.food = cell,
            // No room left to grow
            None => self.finish(),
        }
    }

    fn finish(&mut self) {
        self.is_over = true;
        self.active = false;
        info!("Snake game over! Score: {}", self.score);
    }

    pub fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            body: self.body.iter().copied().collect(),
            food: self.food,
            score: self.score,
            direction: self.direction,
            is_over: self.is_over,
            grid_width: SNAKE_GRID_WIDTH,
            grid_height: SNAKE_GRID_HEIGHT,
            cell_size: SNAKE_CELL_SIZE,
        }
    }
}

fn centre() -> Cell {
    (SNAKE_GRID_WIDTH / 2, SNAKE_GRID_HEIGHT / 2)
}

impl Snapshot for SnakeGame {
    fn to_packet(&self) -> Packet {
        Packet::SnakeState(self.snapshot())
    }
}

impl TickedGame for SnakeGame {
    fn is_active(&self) -> bool {
        self.active
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn tick(&mut self) {
        self.advance();
    }
}

pub struct SnakeSession {
    scheduler: Scheduler<SnakeGame>,
}

impl SnakeSession {
    pub fn new(period: Duration, outbox: Outbox, seed: Option<u64>) -> Self {
        Self {
            scheduler: Scheduler::new("Snake", SnakeGame::new(seed), period, outbox),
        }
    }

    /// Starts a new game, replacing any game in progress.
    pub async fn start(&self) {
        self.scheduler.restart_with(SnakeGame::reset).await;
    }

    pub async fn turn(&self, direction: SnakeDirection) -> bool {
        self.scheduler.with_state(|game| game.turn(direction)).await
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

    pub async fn with_game<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SnakeGame) -> R,
    {
        self.scheduler.with_state(f).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;
    use tokio::time::{sleep, timeout};

    fn game() -> SnakeGame {
        let mut game = SnakeGame::new(Some(5));
        game.reset();
        game
    }

    #[test]
    fn test_reset_places_snake_and_food() {
        let game = game();
        assert_eq!(game.body, VecDeque::from([(10, 10)]));
        assert_eq!(game.direction, SnakeDirection::Right);
        assert!(!game.body.contains(&game.food));
        assert!(game.active);
    }

    #[test]
    fn test_advance_moves_head() {
        let mut game = game();
        game.food = (0, 0);
        game.advance();
        assert_eq!(game.body, VecDeque::from([(11, 10)]));
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut game = game();
        game.food = (11, 10);
        game.advance();

        assert_eq!(game.body.len(), 2);
        assert_eq!(game.score, 1);
        assert_ne!(game.food, (11, 10));
        assert!(!game.body.contains(&game.food));
    }

    #[test]
    fn test_reverse_turn_ignored() {
        let mut game = game();
        assert!(!game.turn(SnakeDirection::Left));
        assert!(game.turn(SnakeDirection::Up));
        // Still heading right until the next move, so left stays a reversal
        assert!(!game.turn(SnakeDirection::Left));
        assert_eq!(game.direction, SnakeDirection::Up);
    }

    #[test]
    fn test_wall_ends_game() {
        let mut game = game();
        game.food = (0, 0);
        game.body = VecDeque::from([(SNAKE_GRID_WIDTH - 1, 3)]);
        game.advance();

        assert!(game.is_over);
        assert!(!game.active);
        assert_eq!(game.body, VecDeque::from([(SNAKE_GRID_WIDTH - 1, 3)]));
        assert!(!game.turn(SnakeDirection::Up));
    }

    #[test]
    fn test_self_collision_ends_game() {
        let mut game = game();
        game.food = (0, 0);
        game.body = VecDeque::from([(5, 5), (5, 6), (6, 6), (6, 5), (7, 5)]);
        game.heading = SnakeDirection::Up;
        game.direction = SnakeDirection::Right;
        game.advance();
        assert!(game.is_over);
    }

    #[test]
    fn test_full_board_ends_game() {
        let mut game = game();
        game.body = (0..SNAKE_GRID_HEIGHT)
            .flat_map(|y| (0..SNAKE_GRID_WIDTH).map(move |x| (x, y)))
            .collect();
        game.place_food();
        assert!(game.is_over);
    }

    #[tokio::test]
    async fn test_loop_stops_after_death_with_final_snapshot() {
        let (outbox, mut rx) = broadcast::channel(256);
        let session = SnakeSession::new(Duration::from_millis(5), outbox, Some(9));
        session.start().await;
        session
            .with_game(|game| {
                game.body = VecDeque::from([(SNAKE_GRID_WIDTH - 1, 0)]);
                game.food = (0, SNAKE_GRID_HEIGHT - 1);
            })
            .await;

        let over = timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(Packet::SnakeState(snapshot)) = rx.recv().await {
                    if snapshot.is_over {
                        return snapshot;
                    }
                }
            }
        })
        .await
        .expect("snake never died");

        assert_eq!(over.score, 0);
        sleep(Duration::from_millis(30)).await;
        assert!(!session.is_running());
        session.stop().await;
    }
}
