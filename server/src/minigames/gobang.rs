//! Five-in-a-row against a simple neighbourhood AI.

use super::Table;
use crate::scheduler::{Outbox, Snapshot};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{GobangSnapshot, Packet, GOBANG_AI, GOBANG_BOARD_SIZE, GOBANG_EMPTY, GOBANG_PLAYER};
use std::time::Duration;

pub const AI_THINK_DELAY: Duration = Duration::from_millis(500);
const WIN_LENGTH: usize = 5;
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ignored,
    /// The move ended the game.
    Finished,
    /// The AI should answer, provided `round` is still current.
    AiToMove { round: u64 },
}

#[derive(Debug, Clone)]
pub struct GobangBoard {
    pub cells: Vec<Vec<u8>>,
    pub status_message: String,
    pub is_over: bool,
    pub is_player_turn: bool,
    round: u64,
    rng: StdRng,
}

impl GobangBoard {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut board = Self {
            cells: Vec::new(),
            status_message: String::new(),
            is_over: false,
            is_player_turn: true,
            round: 0,
            rng,
        };
        board.reset();
        board
    }

    pub fn reset(&mut self) {
        self.cells = vec![vec![GOBANG_EMPTY; GOBANG_BOARD_SIZE]; GOBANG_BOARD_SIZE];
        self.status_message = "Game started! Your move (black).".to_string();
        self.is_over = false;
        self.is_player_turn = true;
        self.round += 1;
        info!("Gobang game started");
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn player_move(&mut self, row: usize, col: usize) -> MoveOutcome {
        if self.is_over || !self.is_player_turn {
            debug!("Ignoring gobang move: not the player's turn");
            return MoveOutcome::Ignored;
        }
        if row >= GOBANG_BOARD_SIZE || col >= GOBANG_BOARD_SIZE || self.cells[row][col] != GOBANG_EMPTY
        {
            debug!("Ignoring gobang move at ({}, {})", row, col);
            return MoveOutcome::Ignored;
        }

        self.cells[row][col] = GOBANG_PLAYER;
        self.is_player_turn = false;

        if self.has_five(GOBANG_PLAYER) {
            self.finish("You win!");
            return MoveOutcome::Finished;
        }
        if self.is_full() {
            self.finish("Draw!");
            return MoveOutcome::Finished;
        }

        self.status_message = "AI is thinking...".to_string();
        MoveOutcome::AiToMove { round: self.round }
    }

    /// Plays the AI's answer. Returns false if the round has moved on.
    pub fn ai_move(&mut self, round: u64) -> bool {
        if round != self.round || self.is_over || self.is_player_turn {
            debug!("Dropping stale gobang AI move from round {}", round);
            return false;
        }

        match self.choose_ai_cell() {
            Some((row, col)) => {
                self.cells[row][col] = GOBANG_AI;
                if self.has_five(GOBANG_AI) {
                    self.finish("AI wins!");
                } else if self.is_full() {
                    self.finish("Draw!");
                } else {
                    self.status_message = "Your move.".to_string();
                    self.is_player_turn = true;
                }
            }
            None => self.finish("Draw! (AI cannot move)"),
        }
        true
    }

    /// First empty cell, in row-major order, touching any stone; otherwise a
    /// random empty cell.
    fn choose_ai_cell(&mut self) -> Option<(usize, usize)> {
        let empty: Vec<(usize, usize)> = (0..GOBANG_BOARD_SIZE)
            .flat_map(|r| (0..GOBANG_BOARD_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c] == GOBANG_EMPTY)
            .collect();

        let adjacent = empty
            .iter()
            .copied()
            .find(|&(r, c)| self.has_neighbour(r, c));
        adjacent.or_else(|| empty.choose(&mut self.rng).copied())
    }

    fn has_neighbour(&self, row: usize, col: usize) -> bool {
        (-1isize..=1)
            .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
            .filter(|&d| d != (0, 0))
            .any(|(dr, dc)| self.stone_at(row as isize + dr, col as isize + dc) != GOBANG_EMPTY)
    }

    fn stone_at(&self, row: isize, col: isize) -> u8 {
        if row < 0 || col < 0 {
            return GOBANG_EMPTY;
        }
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
            .unwrap_or(GOBANG_EMPTY)
    }

    pub fn has_five(&self, stone: u8) -> bool {
        (0..GOBANG_BOARD_SIZE as isize).any(|r| {
            (0..GOBANG_BOARD_SIZE as isize).any(|c| {
                DIRECTIONS.iter().any(|&(dr, dc)| {
                    (0..WIN_LENGTH as isize).all(|i| self.stone_at(r + dr * i, c + dc * i) == stone)
                })
            })
        })
    }

    fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|&cell| cell != GOBANG_EMPTY))
    }

    fn finish(&mut self, message: &str) {
        self.is_over = true;
        self.is_player_turn = false;
        self.status_message = message.to_string();
        info!("Gobang over: {}", message);
    }

    pub fn snapshot(&self) -> GobangSnapshot {
        GobangSnapshot {
            board: self.cells.clone(),
            status_message: self.status_message.clone(),
            is_over: self.is_over,
            is_player_turn: self.is_player_turn,
        }
    }
}

impl Snapshot for GobangBoard {
    fn to_packet(&self) -> Packet {
        Packet::GobangState(self.snapshot())
    }
}

pub struct GobangSession {
    table: Table<GobangBoard>,
    think_delay: Duration,
}

impl GobangSession {
    pub fn new(outbox: Outbox, seed: Option<u64>) -> Self {
        Self::with_delay(outbox, seed, AI_THINK_DELAY)
    }

    pub fn with_delay(outbox: Outbox, seed: Option<u64>, think_delay: Duration) -> Self {
        Self {
            table: Table::new(GobangBoard::new(seed), outbox),
            think_delay,
        }
    }

    pub async fn start(&self) {
        self.table
            .act(|board| {
                board.reset();
                true
            })
            .await;
    }

    pub async fn play(&self, row: usize, col: usize) -> MoveOutcome {
        let mut outcome = MoveOutcome::Ignored;
        self.table
            .act(|board| {
                outcome = board.player_move(row, col);
                outcome != MoveOutcome::Ignored
            })
            .await;

        if let MoveOutcome::AiToMove { round } = outcome {
            self.table
                .defer(self.think_delay, move |board| board.ai_move(round));
        }
        outcome
    }

    pub async fn snapshot(&self) -> Packet {
        self.table.snapshot().await
    }

    pub async fn with_board<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut GobangBoard) -> R,
    {
        self.table.with_state(f).await
    }
}
