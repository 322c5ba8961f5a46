//! Word guessing, one letter at a time.

use super::Table;
use crate::scheduler::{Outbox, Snapshot};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{HangmanSnapshot, HangmanStatus, Packet, HANGMAN_MAX_WRONG_GUESSES, HANGMAN_WORDS};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct HangmanGame {
    secret: String,
    pub display: Vec<char>,
    pub guessed: BTreeSet<char>,
    pub wrong_guesses: u32,
    pub status: HangmanStatus,
    rng: StdRng,
}

impl HangmanGame {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Self {
            secret: String::new(),
            display: Vec::new(),
            guessed: BTreeSet::new(),
            wrong_guesses: 0,
            status: HangmanStatus::Playing,
            rng,
        };
        game.reset();
        game
    }

    pub fn reset(&mut self) {
        let word = HANGMAN_WORDS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(HANGMAN_WORDS[0]);
        self.set_word(word);
        info!("Hangman game started ({} letters)", self.secret.len());
    }

    /// Starts a round with a known word.
    pub fn set_word(&mut self, word: &str) {
        self.secret = word.to_ascii_uppercase();
        self.display = vec!['_'; self.secret.chars().count()];
        self.guessed.clear();
        self.wrong_guesses = 0;
        self.status = HangmanStatus::Playing;
    }

    /// Applies a guess. Anything but a single untried ASCII letter is ignored.
    pub fn guess(&mut self, input: &str) -> bool {
        if self.status != HangmanStatus::Playing {
            return false;
        }
        let mut chars = input.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            _ => {
                debug!("Ignoring hangman guess {:?}", input);
                return false;
            }
        };
        if !self.guessed.insert(letter) {
            return false;
        }

        let mut hit = false;
        for (slot, c) in self.display.iter_mut().zip(self.secret.chars()) {
            if c == letter {
                *slot = letter;
                hit = true;
            }
        }

        if hit {
            if !self.display.contains(&'_') {
                self.status = HangmanStatus::Won;
                info!("Hangman won");
            }
        } else {
            self.wrong_guesses += 1;
            if self.wrong_guesses >= HANGMAN_MAX_WRONG_GUESSES {
                self.status = HangmanStatus::Lost;
                info!("Hangman lost, word was {}", self.secret);
            }
        }
        true
    }

    pub fn snapshot(&self) -> HangmanSnapshot {
        HangmanSnapshot {
            display_word: self.display.clone(),
            guessed_letters: self.guessed.iter().copied().collect(),
            wrong_guesses: self.wrong_guesses,
            max_wrong_guesses: HANGMAN_MAX_WRONG_GUESSES,
            status: self.status,
            secret_word: (self.status == HangmanStatus::Lost).then(|| self.secret.clone()),
        }
    }
}

impl Snapshot for HangmanGame {
    fn to_packet(&self) -> Packet {
        Packet::HangmanState(self.snapshot())
    }
}

pub struct HangmanSession {
    table: Table<HangmanGame>,
}

impl HangmanSession {
    pub fn new(outbox: Outbox, seed: Option<u64>) -> Self {
        Self {
            table: Table::new(HangmanGame::new(seed), outbox),
        }
    }

    pub async fn start(&self) {
        self.table
            .act(|game| {
                game.reset();
                true
            })
            .await;
    }

    pub async fn guess(&self, letter: &str) -> bool {
        self.table.act(|game| game.guess(letter)).await
    }

    pub async fn snapshot(&self) -> Packet {
        self.table.snapshot().await
    }

    pub async fn with_game<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut HangmanGame) -> R,
    {
        self.table.with_state(f).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    fn game(word: &str) -> HangmanGame {
        let mut game = HangmanGame::new(Some(1));
        game.set_word(word);
        game
    }

    #[test]
    fn test_reset_picks_listed_word() {
        let game = HangmanGame::new(Some(11));
        assert!(HANGMAN_WORDS.contains(&game.secret.as_str()));
        assert!(game.display.iter().all(|&c| c == '_'));
        assert_eq!(game.snapshot().secret_word, None);
    }

    #[test]
    fn test_correct_guess_reveals_all_positions() {
        let mut game = game("FLASK");
        assert!(game.guess("s"));
        assert!(game.guess("a"));
        assert_eq!(game.display, vec!['_', '_', 'A', 'S', '_']);
        assert_eq!(game.wrong_guesses, 0);
    }

    #[test]
    fn test_invalid_guesses_ignored() {
        let mut game = game("HTML");
        assert!(!game.guess(""));
        assert!(!game.guess("ab"));
        assert!(!game.guess("4"));
        assert!(game.guess("z"));
        assert!(!game.guess("Z"));
        assert_eq!(game.wrong_guesses, 1);
    }

    #[test]
    fn test_win() {
        let mut game = game("HTML");
        for letter in ["h", "t", "m", "l"] {
            game.guess(letter);
        }
        assert_eq!(game.status, HangmanStatus::Won);
        assert_eq!(game.snapshot().secret_word, None);
        assert!(!game.guess("q"));
    }

    #[test]
    fn test_loss_reveals_secret() {
        let mut game = game("HTML");
        for letter in ["a", "b", "c", "d", "e", "f"] {
            game.guess(letter);
        }
        assert_eq!(game.status, HangmanStatus::Lost);
        assert_eq!(game.snapshot().secret_word.as_deref(), Some("HTML"));
    }

    #[tokio::test]
    async fn test_session_publishes_valid_guesses() {
        let (outbox, mut rx) = broadcast::channel(8);
        let session = HangmanSession::new(outbox, Some(2));
        session.start().await;
        session.with_game(|game| game.set_word("JULES")).await;
        while rx.try_recv().is_ok() {}

        assert!(!session.guess("!").await);
        assert!(rx.try_recv().is_err());

        assert!(session.guess("u").await);
        match rx.try_recv().unwrap() {
            Packet::HangmanState(snapshot) => {
                assert_eq!(snapshot.display_word, vec!['_', 'U', '_', '_', '_']);
                assert_eq!(snapshot.guessed_letters, vec!['U']);
            }
            other => panic!("Unexpected packet: {:?}", other),
        }
    }
}
