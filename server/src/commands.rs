//! Player commands applied directly to the arena.
//!
//! Commands are applied as soon as they arrive, under the same lock the tick
//! takes. They never correct the resulting position; the next tick's
//! boundary and obstacle phases reconcile it.

use crate::arena::ArenaState;
use log::debug;
use shared::{
    Bullet, BulletOwner, MoveDirection, RotateDirection, TankCommand, BULLET_SPEED,
    MAX_PLAYER_BULLETS, PLAYER_BULLET_COLOR, TANK_ROTATION_SPEED, TANK_SPEED,
};

/// Applies `command` to the player tank. Returns false when it was ignored.
pub fn apply_command(arena: &mut ArenaState, command: TankCommand) -> bool {
    if arena.is_over || !arena.player.is_active() {
        debug!("Ignoring {:?}: match is over", command);
        return false;
    }

    match command {
        TankCommand::Move(direction) => {
            let distance = match direction {
                MoveDirection::Forward => TANK_SPEED,
                MoveDirection::Backward => -TANK_SPEED,
            };
            arena.player.advance(distance);
        }
        TankCommand::Rotate(direction) => {
            let delta = match direction {
                RotateDirection::Left => -TANK_ROTATION_SPEED,
                RotateDirection::Right => TANK_ROTATION_SPEED,
            };
            arena.player.turn(delta);
        }
        TankCommand::Shoot => {
            let in_flight = arena
                .bullets
                .iter()
                .filter(|b| b.owner == BulletOwner::Player)
                .count();
            if in_flight >= MAX_PLAYER_BULLETS {
                debug!("Ignoring shot: {} player bullets in flight", in_flight);
                return false;
            }
            let (x, y) = arena.player.turret_tip();
            let angle = arena.player.angle;
            let id = arena.next_id();
            arena.bullets.push(Bullet {
                id,
                x,
                y,
                angle,
                speed: BULLET_SPEED,
                owner: BulletOwner::Player,
                color: PLAYER_BULLET_COLOR.to_string(),
            });
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HighScore;
    use assert_approx_eq::assert_approx_eq;
    use shared::{TankStatus, TANK_TURRET_LENGTH};
    use std::f32::consts::{PI, TAU};

    fn arena() -> ArenaState {
        let mut arena = ArenaState::new(HighScore::new(), Some(17));
        arena.reset();
        arena
    }

    #[test]
    fn test_move_forward_and_backward() {
        let mut arena = arena();
        arena.player.angle = 0.0;
        let x = arena.player.x;

        assert!(apply_command(
            &mut arena,
            TankCommand::Move(MoveDirection::Forward)
        ));
        assert_approx_eq!(arena.player.x, x + TANK_SPEED, 1e-4);

        assert!(apply_command(
            &mut arena,
            TankCommand::Move(MoveDirection::Backward)
        ));
        assert_approx_eq!(arena.player.x, x, 1e-4);
    }

    #[test]
    fn test_rotate_right_wraps() {
        let mut arena = arena();
        arena.player.angle = TAU - 0.05;

        apply_command(&mut arena, TankCommand::Rotate(RotateDirection::Right));

        assert_approx_eq!(arena.player.angle, 0.05, 1e-4);
    }

    #[test]
    fn test_shoot_spawns_player_bullet_at_turret() {
        let mut arena = arena();
        arena.bullets.clear();
        arena.player.angle = PI;
        let (x, y) = (arena.player.x, arena.player.y);

        assert!(apply_command(&mut arena, TankCommand::Shoot));

        assert_eq!(arena.bullets.len(), 1);
        let bullet = &arena.bullets[0];
        assert_eq!(bullet.owner, BulletOwner::Player);
        assert_eq!(bullet.speed, BULLET_SPEED);
        assert_eq!(bullet.angle, PI);
        assert_approx_eq!(bullet.x, x - TANK_TURRET_LENGTH, 1e-3);
        assert_approx_eq!(bullet.y, y, 1e-3);
    }

    #[test]
    fn test_level_does_not_scale_player_bullets() {
        let mut arena = arena();
        arena.level = 7;
        apply_command(&mut arena, TankCommand::Shoot);
        assert_eq!(arena.bullets.last().unwrap().speed, BULLET_SPEED);
    }

    #[test]
    fn test_commands_ignored_after_match_over() {
        let mut arena = arena();
        arena.player.status = TankStatus::Destroyed;
        arena.is_over = true;
        let before = arena.player.clone();
        let bullets = arena.bullets.len();

        assert!(!apply_command(
            &mut arena,
            TankCommand::Move(MoveDirection::Forward)
        ));
        assert!(!apply_command(
            &mut arena,
            TankCommand::Rotate(RotateDirection::Left)
        ));
        assert!(!apply_command(&mut arena, TankCommand::Shoot));

        assert_eq!(arena.player, before);
        assert_eq!(arena.bullets.len(), bullets);
    }

    #[test]
    fn test_shots_capped_while_bullets_in_flight() {
        let mut arena = arena();
        arena.bullets.clear();

        for _ in 0..MAX_PLAYER_BULLETS {
            assert!(apply_command(&mut arena, TankCommand::Shoot));
        }
        assert!(!apply_command(&mut arena, TankCommand::Shoot));
        assert_eq!(arena.bullets.len(), MAX_PLAYER_BULLETS);

        arena.bullets.pop();
        assert!(apply_command(&mut arena, TankCommand::Shoot));
    }

    #[test]
    fn test_destroyed_player_ignores_commands() {
        let mut arena = arena();
        arena.player.status = TankStatus::Destroyed;
        assert!(!apply_command(&mut arena, TankCommand::Shoot));
    }
}
