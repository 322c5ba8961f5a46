use crate::geometry::Rect;
use crate::{BULLET_RADIUS, TANK_COLLISION_RADIUS, TANK_TURRET_LENGTH};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TankStatus {
    Active,
    Destroyed,
}

/// Autonomous behaviour carried by AI tanks only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AiBrain {
    pub speed: f32,
    /// Turn allowance per tick, reported to clients for turret animation.
    pub rotation_speed: f32,
    pub shoot_cooldown: u32,
    pub max_shoot_cooldown: u32,
    pub move_timer: u32,
    pub max_move_timer: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tank {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Heading in radians, kept in `[0, 2π)`.
    pub angle: f32,
    pub status: TankStatus,
    pub color: String,
    pub ai: Option<AiBrain>,
}

impl Tank {
    pub fn new(id: u32, x: f32, y: f32, angle: f32, color: &str) -> Self {
        Self {
            id,
            x,
            y,
            angle: wrap_angle(angle),
            status: TankStatus::Active,
            color: color.to_string(),
            ai: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TankStatus::Active
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, TANK_COLLISION_RADIUS)
    }

    /// Point at the end of the barrel where shells spawn.
    pub fn turret_tip(&self) -> (f32, f32) {
        (
            self.x + TANK_TURRET_LENGTH * self.angle.cos(),
            self.y + TANK_TURRET_LENGTH * self.angle.sin(),
        )
    }

    pub fn turn(&mut self, delta: f32) {
        self.angle = wrap_angle(self.angle + delta);
    }

    pub fn advance(&mut self, distance: f32) {
        self.x += distance * self.angle.cos();
        self.y += distance * self.angle.sin();
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BulletOwner {
    Player,
    Ai,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Bullet {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub speed: f32,
    pub owner: BulletOwner,
    pub color: String,
}

impl Bullet {
    pub fn advance(&mut self) {
        self.x += self.speed * self.angle.cos();
        self.y += self.speed * self.angle.sin();
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, BULLET_RADIUS)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub bounds: Rect,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Active,
    Hit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Target {
    pub id: u32,
    pub bounds: Rect,
    pub status: TargetStatus,
}

impl Target {
    pub fn is_active(&self) -> bool {
        self.status == TargetStatus::Active
    }
}

/// Wraps an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
