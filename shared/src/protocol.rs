use crate::entities::{Bullet, Obstacle, Tank, Target};
use serde::{Deserialize, Serialize};

/// Datagram payload exchanged between clients and the server.
///
/// Every variant is encoded on its own with bincode; one packet per datagram.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Connection management
    Connect {
        client_version: u32,
    },
    Heartbeat,
    Disconnect,
    Connected {
        client_id: u32,
    },
    Disconnected {
        reason: String,
    },

    // Tank arena
    TankStart,
    TankInput {
        action: String,
        direction: Option<String>,
    },
    TankRestart,
    TankState(TankSnapshot),

    // Snake
    SnakeStart,
    SnakeTurn {
        direction: SnakeDirection,
    },
    SnakeState(SnakeSnapshot),

    // Memory
    MemoryStart,
    MemoryFlip {
        card: usize,
    },
    MemoryState(MemorySnapshot),

    // Hangman
    HangmanStart,
    HangmanGuess {
        letter: String,
    },
    HangmanState(HangmanSnapshot),

    // Gobang
    GobangStart,
    GobangMove {
        row: usize,
        col: usize,
    },
    GobangState(GobangSnapshot),
}

/// Full view of the tank arena published after every tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TankSnapshot {
    pub player: Tank,
    pub ai_tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
    pub targets: Vec<Target>,
    pub score: u32,
    pub level: u32,
    pub is_over: bool,
    pub high_score: u32,
    /// Newest first.
    pub events: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Player intent for the tank arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankCommand {
    Move(MoveDirection),
    Rotate(RotateDirection),
    Shoot,
}

impl TankCommand {
    /// Parses the loosely typed `TankInput` payload.
    ///
    /// Returns `None` for unknown actions and for move/rotate without a
    /// recognised direction.
    pub fn parse(action: &str, direction: Option<&str>) -> Option<Self> {
        match action {
            "move" => match direction? {
                "forward" => Some(TankCommand::Move(MoveDirection::Forward)),
                "backward" => Some(TankCommand::Move(MoveDirection::Backward)),
                _ => None,
            },
            "rotate" => match direction? {
                "left" => Some(TankCommand::Rotate(RotateDirection::Left)),
                "right" => Some(TankCommand::Rotate(RotateDirection::Right)),
                _ => None,
            },
            "shoot" => Some(TankCommand::Shoot),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SnakeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SnakeDirection {
    pub fn opposite(self) -> Self {
        match self {
            SnakeDirection::Up => SnakeDirection::Down,
            SnakeDirection::Down => SnakeDirection::Up,
            SnakeDirection::Left => SnakeDirection::Right,
            SnakeDirection::Right => SnakeDirection::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            SnakeDirection::Up => (0, -1),
            SnakeDirection::Down => (0, 1),
            SnakeDirection::Left => (-1, 0),
            SnakeDirection::Right => (1, 0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SnakeSnapshot {
    /// Head first.
    pub body: Vec<(i32, i32)>,
    pub food: (i32, i32),
    pub score: u32,
    pub direction: SnakeDirection,
    pub is_over: bool,
    pub grid_width: i32,
    pub grid_height: i32,
    pub cell_size: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MemoryCard {
    pub id: usize,
    pub symbol: String,
    pub is_flipped: bool,
    pub is_matched: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MemorySnapshot {
    pub board: Vec<MemoryCard>,
    pub moves: u32,
    pub is_over: bool,
    pub lock_board: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum HangmanStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HangmanSnapshot {
    pub display_word: Vec<char>,
    pub guessed_letters: Vec<char>,
    pub wrong_guesses: u32,
    pub max_wrong_guesses: u32,
    pub status: HangmanStatus,
    /// Only revealed once the round is lost.
    pub secret_word: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GobangSnapshot {
    pub board: Vec<Vec<u8>>,
    pub status_message: String,
    pub is_over: bool,
    pub is_player_turn: bool,
}
