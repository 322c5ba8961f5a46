//! Procedural placement of obstacles, targets and AI tanks.
//!
//! Every generator uses rejection sampling: propose a random rectangle inside
//! the arena, throw it away if it overlaps something it must not, and give up
//! on that entity after a fixed number of attempts. Running out of attempts
//! simply yields fewer entities.

use log::debug;
use rand::Rng;
use shared::{
    intersects, AiBrain, Obstacle, Rect, Tank, Target, TargetStatus, AI_COLORS, ARENA_HEIGHT,
    ARENA_WIDTH, BASE_AI_MOVE_TIMER, BASE_AI_SHOOT_COOLDOWN, BASE_AI_SPEED, BASE_AI_TANKS,
    BASE_OBSTACLES, MAX_AI_SPEED, MAX_AI_TANKS, MAX_OBSTACLES, MAX_OBSTACLE_SIZE,
    MIN_AI_MOVE_TIMER, MIN_AI_SHOOT_COOLDOWN, NUM_TARGETS, PLAYER_COLOR, TANK_BODY_HEIGHT,
    TANK_BODY_WIDTH, TANK_COLLISION_RADIUS, TARGET_SIZE,
};
use std::f32::consts::{FRAC_PI_2, TAU};

const OBSTACLE_ATTEMPTS: usize = 10;
const TARGET_ATTEMPTS: usize = 20;
const AI_ATTEMPTS: usize = 20;
/// Half side of the square kept clear of obstacles and targets around the player.
const PLAYER_SAFE_HALF_EXTENT: f32 = 50.0;

/// Hands out ids that are never reused within one arena.
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Difficulty knobs derived from the current level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelParams {
    pub ai_count: u32,
    pub ai_speed: f32,
    pub ai_rotation_speed: f32,
    pub max_shoot_cooldown: u32,
    pub max_move_timer: u32,
    pub obstacle_count: u32,
    pub obstacle_min_side: u32,
    pub obstacle_max_side: u32,
}

impl LevelParams {
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let step = level - 1;

        Self {
            ai_count: (BASE_AI_TANKS + step).clamp(BASE_AI_TANKS, MAX_AI_TANKS),
            ai_speed: (BASE_AI_SPEED + step as f32 * 0.2).clamp(BASE_AI_SPEED, MAX_AI_SPEED),
            ai_rotation_speed: 0.05 + step as f32 * 0.005,
            max_shoot_cooldown: BASE_AI_SHOOT_COOLDOWN
                .saturating_sub(step.saturating_mul(10))
                .max(MIN_AI_SHOOT_COOLDOWN),
            max_move_timer: BASE_AI_MOVE_TIMER
                .saturating_sub(step.saturating_mul(7))
                .max(MIN_AI_MOVE_TIMER),
            obstacle_count: (BASE_OBSTACLES + level / 2).min(MAX_OBSTACLES),
            obstacle_min_side: 30 + level.saturating_mul(2),
            obstacle_max_side: 70 + level.saturating_mul(5),
        }
    }
}

/// Player tank at its spawn point, bottom centre facing up.
pub fn spawn_player(id: u32) -> Tank {
    Tank::new(
        id,
        ARENA_WIDTH / 2.0,
        ARENA_HEIGHT - TANK_BODY_HEIGHT * 2.0,
        -FRAC_PI_2,
        PLAYER_COLOR,
    )
}

fn player_safe_zone(player: &Tank) -> Rect {
    Rect::centered(player.x, player.y, PLAYER_SAFE_HALF_EXTENT)
}

pub fn generate_obstacles<R: Rng>(
    rng: &mut R,
    ids: &mut IdGen,
    level: u32,
    player: &Tank,
) -> Vec<Obstacle> {
    let params = LevelParams::for_level(level);
    let safe_zone = player_safe_zone(player);
    let mut obstacles: Vec<Obstacle> = Vec::new();

    for _ in 0..params.obstacle_count {
        for _ in 0..OBSTACLE_ATTEMPTS {
            let width = rng
                .gen_range(params.obstacle_min_side..=params.obstacle_max_side)
                .min(MAX_OBSTACLE_SIZE) as f32;
            let height = rng
                .gen_range(params.obstacle_min_side..=params.obstacle_max_side)
                .min(MAX_OBSTACLE_SIZE) as f32;
            let bounds = Rect::new(
                rng.gen_range(0.0..=ARENA_WIDTH - width),
                rng.gen_range(0.0..=ARENA_HEIGHT - height),
                width,
                height,
            );

            if intersects(&bounds, &safe_zone)
                || obstacles.iter().any(|o| intersects(&bounds, &o.bounds))
            {
                continue;
            }

            obstacles.push(Obstacle {
                id: ids.next_id(),
                bounds,
            });
            break;
        }
    }

    debug!(
        "Placed {}/{} obstacles for level {}",
        obstacles.len(),
        params.obstacle_count,
        level
    );
    obstacles
}

pub fn generate_targets<R: Rng>(
    rng: &mut R,
    ids: &mut IdGen,
    player: &Tank,
    obstacles: &[Obstacle],
) -> Vec<Target> {
    let safe_zone = player_safe_zone(player);
    let mut targets: Vec<Target> = Vec::with_capacity(NUM_TARGETS);

    for _ in 0..NUM_TARGETS {
        for _ in 0..TARGET_ATTEMPTS {
            let bounds = Rect::new(
                rng.gen_range(0.0..=ARENA_WIDTH - TARGET_SIZE),
                rng.gen_range(0.0..=ARENA_HEIGHT - TARGET_SIZE),
                TARGET_SIZE,
                TARGET_SIZE,
            );

            if obstacles.iter().any(|o| intersects(&bounds, &o.bounds))
                || intersects(&bounds, &safe_zone)
                || targets.iter().any(|t| intersects(&bounds, &t.bounds))
            {
                continue;
            }

            targets.push(Target {
                id: ids.next_id(),
                bounds,
                status: TargetStatus::Active,
            });
            break;
        }
    }

    debug!("Placed {}/{} targets", targets.len(), NUM_TARGETS);
    targets
}

pub fn generate_ai_tanks<R: Rng>(
    rng: &mut R,
    ids: &mut IdGen,
    level: u32,
    player: &Tank,
    obstacles: &[Obstacle],
) -> Vec<Tank> {
    let params = LevelParams::for_level(level);
    let player_zone = Rect::centered(player.x, player.y, TANK_COLLISION_RADIUS * 2.0);
    let mut tanks: Vec<Tank> = Vec::new();

    for _ in 0..params.ai_count {
        for _ in 0..AI_ATTEMPTS {
            let x = rng.gen_range(TANK_BODY_WIDTH..=ARENA_WIDTH - TANK_BODY_WIDTH);
            let y = rng.gen_range(TANK_BODY_HEIGHT..=ARENA_HEIGHT * 0.6);
            let bounds = Rect::centered(x, y, TANK_COLLISION_RADIUS);

            if intersects(&bounds, &player_zone)
                || obstacles.iter().any(|o| intersects(&bounds, &o.bounds))
                || tanks.iter().any(|t| intersects(&bounds, &t.bounds()))
            {
                continue;
            }

            let color = AI_COLORS[rng.gen_range(0..AI_COLORS.len())];
            let mut tank = Tank::new(ids.next_id(), x, y, rng.gen_range(0.0..TAU), color);
            tank.ai = Some(AiBrain {
                speed: params.ai_speed,
                rotation_speed: params.ai_rotation_speed,
                shoot_cooldown: rng
                    .gen_range(params.max_shoot_cooldown / 2..=params.max_shoot_cooldown),
                max_shoot_cooldown: params.max_shoot_cooldown,
                move_timer: rng.gen_range(params.max_move_timer / 2..=params.max_move_timer),
                max_move_timer: params.max_move_timer,
            });
            tanks.push(tank);
            break;
        }
    }

    debug!(
        "Placed {}/{} AI tanks for level {}",
        tanks.len(),
        params.ai_count,
        level
    );
    tanks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_level_params_scale_and_clamp() {
        let first = LevelParams::for_level(1);
        assert_eq!(first.ai_count, 1);
        assert_eq!(first.ai_speed, 1.0);
        assert_eq!(first.max_shoot_cooldown, 200);
        assert_eq!(first.max_move_timer, 120);
        assert_eq!(first.obstacle_count, 5);

        let third = LevelParams::for_level(3);
        assert_eq!(third.ai_count, 3);
        assert!((third.ai_speed - 1.4).abs() < 1e-5);
        assert_eq!(third.max_shoot_cooldown, 180);
        assert_eq!(third.max_move_timer, 106);

        let late = LevelParams::for_level(50);
        assert_eq!(late.ai_count, MAX_AI_TANKS);
        assert_eq!(late.ai_speed, MAX_AI_SPEED);
        assert_eq!(late.max_shoot_cooldown, MIN_AI_SHOOT_COOLDOWN);
        assert_eq!(late.max_move_timer, MIN_AI_MOVE_TIMER);
        assert_eq!(late.obstacle_count, MAX_OBSTACLES);
    }

    #[test]
    fn test_level_params_monotonic() {
        let mut previous = LevelParams::for_level(1);
        for level in 2..30 {
            let params = LevelParams::for_level(level);
            assert!(params.ai_count >= previous.ai_count);
            assert!(params.ai_speed >= previous.ai_speed);
            assert!(params.max_shoot_cooldown <= previous.max_shoot_cooldown);
            assert!(params.max_move_timer <= previous.max_move_timer);
            previous = params;
        }
    }

    #[test]
    fn test_obstacles_avoid_player_and_each_other() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids = IdGen::new();
        let player = spawn_player(ids.next_id());

        for level in 1..8 {
            let obstacles = generate_obstacles(&mut rng, &mut ids, level, &player);
            assert!(obstacles.len() as u32 <= LevelParams::for_level(level).obstacle_count);

            let safe_zone = player_safe_zone(&player);
            for (i, a) in obstacles.iter().enumerate() {
                assert!(!intersects(&a.bounds, &safe_zone));
                assert!(a.bounds.x >= 0.0 && a.bounds.right() <= ARENA_WIDTH);
                assert!(a.bounds.y >= 0.0 && a.bounds.bottom() <= ARENA_HEIGHT);
                assert!(a.bounds.width <= MAX_OBSTACLE_SIZE as f32);
                for b in &obstacles[i + 1..] {
                    assert!(!intersects(&a.bounds, &b.bounds));
                }
            }
        }
    }

    #[test]
    fn test_targets_avoid_obstacles() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut ids = IdGen::new();
        let player = spawn_player(ids.next_id());
        let obstacles = generate_obstacles(&mut rng, &mut ids, 1, &player);
        let targets = generate_targets(&mut rng, &mut ids, &player, &obstacles);

        assert!(targets.len() <= NUM_TARGETS);
        for target in &targets {
            assert!(target.is_active());
            assert!(obstacles
                .iter()
                .all(|o| !intersects(&target.bounds, &o.bounds)));
        }
    }

    #[test]
    fn test_ai_tanks_are_configured_for_level() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ids = IdGen::new();
        let player = spawn_player(ids.next_id());
        let tanks = generate_ai_tanks(&mut rng, &mut ids, 4, &player, &[]);
        let params = LevelParams::for_level(4);

        assert_eq!(tanks.len() as u32, params.ai_count);
        for tank in &tanks {
            let brain = tank.ai.as_ref().expect("AI tank without brain");
            assert_eq!(brain.speed, params.ai_speed);
            assert!(brain.shoot_cooldown >= params.max_shoot_cooldown / 2);
            assert!(brain.shoot_cooldown <= params.max_shoot_cooldown);
            assert!(brain.move_timer >= params.max_move_timer / 2);
            assert!(brain.move_timer <= params.max_move_timer);
            assert!(tank.y <= ARENA_HEIGHT * 0.6);
            assert!(AI_COLORS.contains(&tank.color.as_str()));
        }
    }

    #[test]
    fn test_exhausted_placement_degrades_gracefully() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ids = IdGen::new();
        let player = spawn_player(ids.next_id());
        // One obstacle covering the whole arena leaves no free slot
        let wall = Obstacle {
            id: ids.next_id(),
            bounds: Rect::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT),
        };

        let tanks = generate_ai_tanks(&mut rng, &mut ids, 5, &player, &[wall.clone()]);
        let targets = generate_targets(&mut rng, &mut ids, &player, &[wall]);

        assert!(tanks.is_empty());
        assert!(targets.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut ids = IdGen::new();
        let player = spawn_player(ids.next_id());
        let mut seen = HashSet::new();
        seen.insert(player.id);

        for level in 1..5 {
            let obstacles = generate_obstacles(&mut rng, &mut ids, level, &player);
            let targets = generate_targets(&mut rng, &mut ids, &player, &obstacles);
            let tanks = generate_ai_tanks(&mut rng, &mut ids, level, &player, &obstacles);

            for id in obstacles
                .iter()
                .map(|o| o.id)
                .chain(targets.iter().map(|t| t.id))
                .chain(tanks.iter().map(|t| t.id))
            {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
    }
}
