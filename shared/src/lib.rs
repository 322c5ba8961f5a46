//! Types and tuning shared between the arcade server and its clients.
//!
//! Everything that crosses the wire lives here: entity shapes, per-game
//! snapshots, the [`Packet`] enum and the typed [`TankCommand`] parsed out of
//! loosely typed player input.

pub mod entities;
pub mod geometry;
pub mod protocol;

pub use entities::{
    wrap_angle, AiBrain, Bullet, BulletOwner, Obstacle, Tank, TankStatus, Target, TargetStatus,
};
pub use geometry::{intersects, Rect};
pub use protocol::{
    GobangSnapshot, HangmanSnapshot, HangmanStatus, MemoryCard, MemorySnapshot, MoveDirection,
    Packet, RotateDirection, SnakeDirection, SnakeSnapshot, TankCommand, TankSnapshot,
};

pub const PROTOCOL_VERSION: u32 = 1;

// Tank arena
pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const TANK_SPEED: f32 = 3.0;
pub const TANK_ROTATION_SPEED: f32 = 0.1;
pub const TANK_COLLISION_RADIUS: f32 = 15.0;
pub const TANK_BODY_WIDTH: f32 = 20.0;
pub const TANK_BODY_HEIGHT: f32 = 30.0;
pub const TANK_TURRET_LENGTH: f32 = 20.0;
pub const BULLET_SPEED: f32 = 7.0;
pub const BULLET_RADIUS: f32 = 3.0;
/// Extra AI bullet speed per level.
pub const AI_BULLET_SPEED_PER_LEVEL: f32 = 0.15;
pub const TARGET_HIT_SCORE: u32 = 10;
pub const AI_DESTROYED_SCORE_BASE: u32 = 50;
pub const AI_DESTROYED_SCORE_PER_LEVEL: u32 = 10;
pub const MAX_GAME_EVENTS: usize = 4;
/// Player shells allowed in flight at once; keeps a snapshot inside one datagram.
pub const MAX_PLAYER_BULLETS: usize = 64;

// AI scaling, clamped per level
pub const BASE_AI_TANKS: u32 = 1;
pub const MAX_AI_TANKS: u32 = 5;
pub const BASE_AI_SPEED: f32 = 1.0;
pub const MAX_AI_SPEED: f32 = 2.5;
pub const BASE_AI_SHOOT_COOLDOWN: u32 = 200;
pub const MIN_AI_SHOOT_COOLDOWN: u32 = 70;
pub const BASE_AI_MOVE_TIMER: u32 = 120;
pub const MIN_AI_MOVE_TIMER: u32 = 50;
pub const NUM_TARGETS: usize = 3;
pub const TARGET_SIZE: f32 = 30.0;
pub const BASE_OBSTACLES: u32 = 5;
pub const MAX_OBSTACLES: u32 = 10;
pub const MAX_OBSTACLE_SIZE: u32 = 120;

pub const PLAYER_COLOR: &str = "green";
pub const PLAYER_BULLET_COLOR: &str = "#00FFFF";
pub const AI_COLORS: [&str; 3] = ["#B22222", "#8B4513", "#A0522D"];

// Snake
pub const SNAKE_GRID_WIDTH: i32 = 20;
pub const SNAKE_GRID_HEIGHT: i32 = 20;
pub const SNAKE_CELL_SIZE: u32 = 20;

// Memory
pub const MEMORY_SYMBOLS: [&str; 12] = [
    "🐱", "🐶", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🦁", "🐯", "🐨", "🐷",
];
pub const MEMORY_PAIRS: usize = 8;
pub const MEMORY_BOARD_SIZE: usize = MEMORY_PAIRS * 2;

// Hangman
pub const HANGMAN_WORDS: [&str; 12] = [
    "PYTHON",
    "FLASK",
    "JAVASCRIPT",
    "HTML",
    "SOCKETIO",
    "DEVELOPER",
    "ENGINEER",
    "JULES",
    "TERMINAL",
    "KEYBOARD",
    "MONITOR",
    "SOFTWARE",
];
pub const HANGMAN_MAX_WRONG_GUESSES: u32 = 6;

// Gobang
pub const GOBANG_BOARD_SIZE: usize = 15;
pub const GOBANG_EMPTY: u8 = 0;
pub const GOBANG_PLAYER: u8 = 1;
pub const GOBANG_AI: u8 = 2;
