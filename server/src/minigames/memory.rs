//! Pair-matching card game with a delayed flip-back on mismatches.

use super::Table;
use crate::scheduler::{Outbox, Snapshot};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{MemoryCard, MemorySnapshot, Packet, MEMORY_BOARD_SIZE, MEMORY_PAIRS, MEMORY_SYMBOLS};
use std::time::Duration;

pub const UNFLIP_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Ignored,
    /// First card of a pair turned over.
    Revealed,
    Matched,
    /// Second card did not match; both flip back once `round` is still current.
    Mismatch { first: usize, second: usize, round: u64 },
}

#[derive(Debug, Clone)]
pub struct MemoryBoard {
    pub cards: Vec<MemoryCard>,
    pub moves: u32,
    pub matches: usize,
    pub is_over: bool,
    pub lock_board: bool,
    flipped: Vec<usize>,
    /// Bumped on every reset so stale flip-backs can tell they are stale.
    round: u64,
    rng: StdRng,
}

impl MemoryBoard {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut board = Self {
            cards: Vec::new(),
            moves: 0,
            matches: 0,
            is_over: false,
            lock_board: false,
            flipped: Vec::with_capacity(2),
            round: 0,
            rng,
        };
        board.reset();
        board
    }

    pub fn reset(&mut self) {
        let mut symbols: Vec<&str> = MEMORY_SYMBOLS[..MEMORY_PAIRS]
            .iter()
            .chain(MEMORY_SYMBOLS[..MEMORY_PAIRS].iter())
            .copied()
            .collect();
        symbols.shuffle(&mut self.rng);

        self.cards = symbols
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| MemoryCard {
                id,
                symbol: symbol.to_string(),
                is_flipped: false,
                is_matched: false,
            })
            .collect();
        self.moves = 0;
        self.matches = 0;
        self.is_over = false;
        self.lock_board = false;
        self.flipped.clear();
        self.round += 1;
        info!("Memory game started");
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if self.lock_board || self.is_over || index >= MEMORY_BOARD_SIZE {
            debug!("Ignoring memory flip of card {}", index);
            return FlipOutcome::Ignored;
        }
        let card = &mut self.cards[index];
        if card.is_flipped || card.is_matched {
            debug!("Ignoring memory flip of card {}: already face up", index);
            return FlipOutcome::Ignored;
        }

        card.is_flipped = true;
        self.flipped.push(index);
        if self.flipped.len() < 2 {
            return FlipOutcome::Revealed;
        }

        self.moves += 1;
        self.lock_board = true;
        let (first, second) = (self.flipped[0], self.flipped[1]);

        if self.cards[first].symbol == self.cards[second].symbol {
            self.cards[first].is_matched = true;
            self.cards[second].is_matched = true;
            self.matches += 1;
            self.flipped.clear();
            self.lock_board = false;
            if self.matches == MEMORY_PAIRS {
                self.is_over = true;
                info!("Memory game cleared in {} moves", self.moves);
            }
            FlipOutcome::Matched
        } else {
            FlipOutcome::Mismatch {
                first,
                second,
                round: self.round,
            }
        }
    }

    /// Turns a mismatched pair face down again. Returns false if the board
    /// was reset in the meantime.
    pub fn unflip(&mut self, first: usize, second: usize, round: u64) -> bool {
        if round != self.round {
            debug!("Dropping stale memory flip-back from round {}", round);
            return false;
        }
        for index in [first, second] {
            let card = &mut self.cards[index];
            if card.is_flipped && !card.is_matched {
                card.is_flipped = false;
            }
        }
        self.flipped.clear();
        self.lock_board = false;
        true
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            board: self.cards.clone(),
            moves: self.moves,
            is_over: self.is_over,
            lock_board: self.lock_board,
        }
    }
}

impl Snapshot for MemoryBoard {
    fn to_packet(&self) -> Packet {
        Packet::MemoryState(self.snapshot())
    }
}

pub struct MemorySession {
    table: Table<MemoryBoard>,
    unflip_delay: Duration,
}

impl MemorySession {
    pub fn new(outbox: Outbox, seed: Option<u64>) -> Self {
        Self::with_delay(outbox, seed, UNFLIP_DELAY)
    }

    pub fn with_delay(outbox: Outbox, seed: Option<u64>, unflip_delay: Duration) -> Self {
        Self {
            table: Table::new(MemoryBoard::new(seed), outbox),
            unflip_delay,
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

    pub async fn flip(&self, card: usize) -> FlipOutcome {
        let mut outcome = FlipOutcome::Ignored;
        self.table
            .act(|board| {
                outcome = board.flip(card);
                outcome != FlipOutcome::Ignored
            })
            .await;

        if let FlipOutcome::Mismatch {
            first,
            second,
            round,
        } = outcome
        {
            self.table.defer(self.unflip_delay, move |board| {
                board.unflip(first, second, round)
            });
        }
        outcome
    }

    pub async fn snapshot(&self) -> Packet {
        self.table.snapshot().await
    }

    pub async fn with_board<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut MemoryBoard) -> R,
    {
        self.table.with_state(f).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    /// Indices of two cards that match and one that does not match them.
    fn pick(board: &MemoryBoard) -> (usize, usize, usize) {
        let a = 0;
        let b = (1..MEMORY_BOARD_SIZE)
            .find(|&i| board.cards[i].symbol == board.cards[a].symbol)
            .unwrap();
        let c = (1..MEMORY_BOARD_SIZE)
            .find(|&i| board.cards[i].symbol != board.cards[a].symbol)
            .unwrap();
        (a, b, c)
    }

    #[test]
    fn test_board_holds_eight_pairs() {
        let board = MemoryBoard::new(Some(1));
        assert_eq!(board.cards.len(), MEMORY_BOARD_SIZE);
        for symbol in &MEMORY_SYMBOLS[..MEMORY_PAIRS] {
            let count = board.cards.iter().filter(|c| c.symbol == *symbol).count();
            assert_eq!(count, 2);
        }
        assert!(board.cards.iter().enumerate().all(|(i, c)| c.id == i));
    }

    #[test]
    fn test_matching_pair() {
        let mut board = MemoryBoard::new(Some(2));
        let (a, b, _) = pick(&board);

        assert_eq!(board.flip(a), FlipOutcome::Revealed);
        assert_eq!(board.flip(b), FlipOutcome::Matched);
        assert!(board.cards[a].is_matched && board.cards[b].is_matched);
        assert_eq!(board.moves, 1);
        assert!(!board.lock_board);
    }

    #[test]
    fn test_mismatch_locks_until_unflip() {
        let mut board = MemoryBoard::new(Some(3));
        let (a, _, c) = pick(&board);

        board.flip(a);
        let outcome = board.flip(c);
        let round = board.round();
        assert_eq!(
            outcome,
            FlipOutcome::Mismatch {
                first: a,
                second: c,
                round
            }
        );
        assert!(board.lock_board);
        assert_eq!(board.flip(5), FlipOutcome::Ignored);

        assert!(board.unflip(a, c, round));
        assert!(!board.cards[a].is_flipped && !board.cards[c].is_flipped);
        assert!(!board.lock_board);
    }

    #[test]
    fn test_invalid_flips_ignored() {
        let mut board = MemoryBoard::new(Some(4));
        assert_eq!(board.flip(MEMORY_BOARD_SIZE), FlipOutcome::Ignored);
        board.flip(0);
        assert_eq!(board.flip(0), FlipOutcome::Ignored);
        assert_eq!(board.moves, 0);
    }

    #[test]
    fn test_stale_unflip_dropped_after_reset() {
        let mut board = MemoryBoard::new(Some(5));
        let (a, _, c) = pick(&board);
        board.flip(a);
        board.flip(c);
        let round = board.round();

        board.reset();
        board.flip(a);
        assert!(!board.unflip(a, c, round));
        assert!(board.cards[a].is_flipped);
    }

    #[test]
    fn test_clearing_board_ends_game() {
        let mut board = MemoryBoard::new(Some(6));
        for symbol in MEMORY_SYMBOLS[..MEMORY_PAIRS].iter() {
            let pair: Vec<usize> = board
                .cards
                .iter()
                .filter(|c| c.symbol == *symbol)
                .map(|c| c.id)
                .collect();
            board.flip(pair[0]);
            assert_eq!(board.flip(pair[1]), FlipOutcome::Matched);
        }
        assert!(board.is_over);
        assert_eq!(board.moves, MEMORY_PAIRS as u32);
        assert_eq!(board.flip(0), FlipOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_session_flips_back_after_delay() {
        let (outbox, _rx) = broadcast::channel(32);
        let session = MemorySession::with_delay(outbox, Some(7), Duration::from_millis(20));
        session.start().await;
        let (a, _, c) = session.with_board(|board| pick(board)).await;

        session.flip(a).await;
        assert!(matches!(
            session.flip(c).await,
            FlipOutcome::Mismatch { .. }
        ));
        assert!(session.with_board(|board| board.lock_board).await);

        sleep(Duration::from_millis(80)).await;
        let (locked, face_up) = session
            .with_board(|board| {
                (
                    board.lock_board,
                    board.cards[a].is_flipped || board.cards[c].is_flipped,
                )
            })
            .await;
        assert!(!locked);
        assert!(!face_up);
    }

    #[tokio::test]
    async fn test_restart_cancels_pending_flip_back() {
        let (outbox, _rx) = broadcast::channel(32);
        let session = MemorySession::with_delay(outbox, Some(8), Duration::from_millis(30));
        session.start().await;
        let (a, _, c) = session.with_board(|board| pick(board)).await;
        session.flip(a).await;
        session.flip(c).await;

        session.start().await;
        session.flip(a).await;
        sleep(Duration::from_millis(80)).await;

        assert!(session.with_board(|board| board.cards[a].is_flipped).await);
    }
}
