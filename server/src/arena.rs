//! Authoritative state of the tank arena and the per-tick simulation step.
//!
//! One tick runs these phases in order, always under the arena lock:
//!
//! 1. tank movement (AI wander, player already moved by commands)
//! 2. boundary correction
//! 3. obstacle correction
//! 4. AI shooting
//! 5. bullet advance and collision resolution
//! 6. roster cleanup
//! 7. level-up check
//! 8. high-score recompute
//!
//! Publishing the snapshot (phase 9) belongs to the scheduler.
//!
//! Bullet collisions are resolved with a fixed precedence, first match wins:
//! out of bounds, obstacle, target, enemy tank, player tank.

use crate::factory::{self, IdGen};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    intersects, Bullet, BulletOwner, Obstacle, Tank, TankSnapshot, TankStatus, Target,
    TargetStatus, AI_BULLET_SPEED_PER_LEVEL, AI_DESTROYED_SCORE_BASE,
    AI_DESTROYED_SCORE_PER_LEVEL, ARENA_HEIGHT, ARENA_WIDTH, BULLET_SPEED, MAX_GAME_EVENTS,
    TANK_COLLISION_RADIUS, TARGET_HIT_SCORE,
};
use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const WANDER_TURN_LIMIT: f32 = PI / 1.5;
const BOUNDARY_JITTER: f32 = 0.1;
const OBSTACLE_JITTER: f32 = 0.3;

/// Best tank score seen by this process, shared across matches.
#[derive(Debug, Clone, Default)]
pub struct HighScore(Arc<AtomicU32>);

impl HighScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Records `score` and returns true if it beat the stored value.
    pub fn offer(&self, score: u32) -> bool {
        self.0.fetch_max(score, Ordering::AcqRel) < score
    }
}

/// What happened to a bullet during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletFate {
    Live,
    OutOfBounds,
    HitObstacle,
    HitTarget(u32),
    DestroyedAi(u32),
    DestroyedPlayer,
}

/// Summary of a single simulation step, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub shots_fired: usize,
    pub bullets_removed: usize,
    pub targets_hit: usize,
    pub ai_destroyed: usize,
    pub player_destroyed: bool,
    pub leveled_up: bool,
}

#[derive(Debug, Clone)]
pub struct ArenaState {
    pub player: Tank,
    pub ai_tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
    pub targets: Vec<Target>,
    pub score: u32,
    pub level: u32,
    pub is_over: bool,
    /// Cleared to make the tick loop exit on its next iteration.
    pub active: bool,
    pub high_score: u32,
    pub events: VecDeque<String>,
    pub tick: u64,
    /// Player position at the end of the previous tick.
    ///
    /// Commands move the player between ticks, so this is the pre-move
    /// position that boundary and obstacle corrections revert to.
    settled: (f32, f32),
    /// High score at the start of the match, used for the new-record event.
    record_to_beat: u32,
    global_high_score: HighScore,
    ids: IdGen,
    rng: StdRng,
}

impl ArenaState {
    /// Creates an inactive, empty arena. Call [`ArenaState::reset`] to seed a match.
    pub fn new(high_score: HighScore, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ids = IdGen::new();
        let player = factory::spawn_player(ids.next_id());
        let settled = (player.x, player.y);

        Self {
            player,
            ai_tanks: Vec::new(),
            bullets: Vec::new(),
            obstacles: Vec::new(),
            targets: Vec::new(),
            score: 0,
            level: 0,
            is_over: false,
            active: false,
            high_score: high_score.get(),
            events: VecDeque::with_capacity(MAX_GAME_EVENTS + 1),
            tick: 0,
            settled,
            record_to_beat: high_score.get(),
            global_high_score: high_score,
            ids,
            rng,
        }
    }

    /// Starts a fresh match at level 1, keeping the process-wide high score.
    pub fn reset(&mut self) {
        self.player = factory::spawn_player(self.ids.next_id());
        self.settled = (self.player.x, self.player.y);
        self.bullets.clear();
        self.score = 0;
        self.level = 1;
        self.is_over = false;
        self.active = true;
        self.tick = 0;
        self.high_score = self.global_high_score.get();
        self.record_to_beat = self.high_score;
        self.events.clear();
        self.generate_level();
        self.push_event(format!("Tank Game Started! Level {}", self.level));
        info!("Tank match started (high score {})", self.high_score);
    }

    fn generate_level(&mut self) {
        self.obstacles =
            factory::generate_obstacles(&mut self.rng, &mut self.ids, self.level, &self.player);
        self.targets =
            factory::generate_targets(&mut self.rng, &mut self.ids, &self.player, &self.obstacles);
        self.ai_tanks = factory::generate_ai_tanks(
            &mut self.rng,
            &mut self.ids,
            self.level,
            &self.player,
            &self.obstacles,
        );
    }

    pub fn push_event(&mut self, message: String) {
        debug!("Arena event: {}", message);
        self.events.push_front(message);
        self.events.truncate(MAX_GAME_EVENTS);
    }

    pub fn next_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    /// Runs one full simulation tick. Does nothing once the match is over.
    pub fn step(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.is_over {
            return report;
        }
        self.tick += 1;

        self.move_player();
        self.move_ai_tanks();
        report.shots_fired = self.fire_ai_guns();
        self.resolve_bullets(&mut report);
        self.ai_tanks.retain(Tank::is_active);

        if !self.is_over && self.ai_tanks.is_empty() {
            self.level_up();
            report.leveled_up = true;
        }

        self.sync_high_score();
        report
    }

    fn move_player(&mut self) {
        if !self.player.is_active() {
            return;
        }
        let (px, py) = self.settled;
        let tank = &mut self.player;

        if !in_bounds(tank.x, ARENA_WIDTH) {
            tank.x = px;
        }
        if !in_bounds(tank.y, ARENA_HEIGHT) {
            tank.y = py;
        }
        if hits_obstacle(tank, &self.obstacles) {
            tank.x = px;
            tank.y = py;
        }
        self.settled = (tank.x, tank.y);
    }

    fn move_ai_tanks(&mut self) {
        let rng = &mut self.rng;
        let obstacles = &self.obstacles;

        for tank in self.ai_tanks.iter_mut().filter(|t| t.is_active()) {
            let (px, py) = (tank.x, tank.y);
            let Some(brain) = tank.ai.as_mut() else {
                continue;
            };

            brain.move_timer = brain.move_timer.saturating_sub(1);
            let wander = if brain.move_timer == 0 {
                brain.move_timer = brain.max_move_timer;
                Some(rng.gen_range(-WANDER_TURN_LIMIT..=WANDER_TURN_LIMIT))
            } else {
                None
            };
            let speed = brain.speed;

            if let Some(offset) = wander {
                tank.turn(offset);
            }
            tank.advance(speed);

            let mut bounced = false;
            if !in_bounds(tank.x, ARENA_WIDTH) {
                tank.x = px;
                bounced = true;
            }
            if !in_bounds(tank.y, ARENA_HEIGHT) {
                tank.y = py;
                bounced = true;
            }
            // One reflection per tick; two would cancel out in a corner
            if bounced {
                tank.turn(PI + rng.gen_range(-BOUNDARY_JITTER..=BOUNDARY_JITTER));
            }

            if hits_obstacle(tank, obstacles) {
                tank.x = px;
                tank.y = py;
                tank.turn(FRAC_PI_2 + rng.gen_range(-OBSTACLE_JITTER..=OBSTACLE_JITTER));
                if let Some(brain) = tank.ai.as_mut() {
                    brain.move_timer = brain.max_move_timer / 2;
                }
            }
        }
    }

    fn fire_ai_guns(&mut self) -> usize {
        let speed = BULLET_SPEED + self.level as f32 * AI_BULLET_SPEED_PER_LEVEL;
        let mut shots = Vec::new();

        for tank in self.ai_tanks.iter_mut().filter(|t| t.is_active()) {
            let Some(brain) = tank.ai.as_mut() else {
                continue;
            };
            brain.shoot_cooldown = brain.shoot_cooldown.saturating_sub(1);
            if brain.shoot_cooldown == 0 {
                brain.shoot_cooldown = brain.max_shoot_cooldown;
                let (x, y) = tank.turret_tip();
                shots.push((x, y, tank.angle, tank.color.clone()));
            }
        }

        let fired = shots.len();
        for (x, y, angle, color) in shots {
            let id = self.ids.next_id();
            self.bullets.push(Bullet {
                id,
                x,
                y,
                angle,
                speed,
                owner: BulletOwner::Ai,
                color,
            });
        }
        fired
    }

    fn resolve_bullets(&mut self, report: &mut TickReport) {
        let bullets = std::mem::take(&mut self.bullets);
        let mut survivors = Vec::with_capacity(bullets.len());

        for mut bullet in bullets {
            bullet.advance();
            match self.resolve_bullet(&bullet) {
                BulletFate::Live => survivors.push(bullet),
                fate => {
                    report.bullets_removed += 1;
                    match fate {
                        BulletFate::HitTarget(_) => report.targets_hit += 1,
                        BulletFate::DestroyedAi(_) => report.ai_destroyed += 1,
                        BulletFate::DestroyedPlayer => report.player_destroyed = true,
                        _ => {}
                    }
                }
            }
        }

        self.bullets = survivors;
    }

    /// Applies the first collision that matches `bullet` and reports it.
    fn resolve_bullet(&mut self, bullet: &Bullet) -> BulletFate {
        if !(bullet.x > 0.0 && bullet.x < ARENA_WIDTH && bullet.y > 0.0 && bullet.y < ARENA_HEIGHT)
        {
            return BulletFate::OutOfBounds;
        }

        let bounds = bullet.bounds();

        if self.obstacles.iter().any(|o| intersects(&bounds, &o.bounds)) {
            return BulletFate::HitObstacle;
        }

        if let Some(target) = self
            .targets
            .iter_mut()
            .find(|t| t.is_active() && intersects(&bounds, &t.bounds))
        {
            target.status = TargetStatus::Hit;
            let id = target.id;
            if bullet.owner == BulletOwner::Player {
                self.score += TARGET_HIT_SCORE;
                self.push_event(format!("Target Hit! +{}", TARGET_HIT_SCORE));
            }
            return BulletFate::HitTarget(id);
        }

        match bullet.owner {
            BulletOwner::Player => {
                if let Some(tank) = self
                    .ai_tanks
                    .iter_mut()
                    .find(|t| t.is_active() && intersects(&bounds, &t.bounds()))
                {
                    tank.status = TankStatus::Destroyed;
                    let id = tank.id;
                    let points = AI_DESTROYED_SCORE_BASE
                        + self.level.saturating_sub(1) * AI_DESTROYED_SCORE_PER_LEVEL;
                    self.score += points;
                    self.push_event(format!("Enemy Down! +{}", points));
                    return BulletFate::DestroyedAi(id);
                }
            }
            BulletOwner::Ai => {
                if self.player.is_active() && intersects(&bounds, &self.player.bounds()) {
                    self.destroy_player();
                    return BulletFate::DestroyedPlayer;
                }
            }
        }

        BulletFate::Live
    }

    fn destroy_player(&mut self) {
        self.player.status = TankStatus::Destroyed;
        self.is_over = true;
        self.push_event("Tank Destroyed!".to_string());
        self.global_high_score.offer(self.score);
        if self.score > self.record_to_beat {
            self.high_score = self.score;
            self.push_event(format!("New Tank High Score: {}!", self.score));
        }
        info!(
            "Tank match over at level {} with score {}",
            self.level, self.score
        );
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.push_event(format!("Reached Level {}!", self.level));
        self.generate_level();
        info!(
            "Tank arena reached level {} ({} AI tanks)",
            self.level,
            self.ai_tanks.len()
        );
    }

    /// Raises the stored high scores to the current score if it is higher.
    pub fn sync_high_score(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
        }
        self.global_high_score.offer(self.high_score);
    }

    pub fn snapshot(&self) -> TankSnapshot {
        TankSnapshot {
            player: self.player.clone(),
            ai_tanks: self.ai_tanks.clone(),
            bullets: self.bullets.clone(),
            obstacles: self.obstacles.clone(),
            targets: self.targets.clone(),
            score: self.score,
            level: self.level,
            is_over: self.is_over,
            high_score: self.high_score,
            events: self.events.iter().cloned().collect(),
        }
    }
}

fn in_bounds(value: f32, dimension: f32) -> bool {
    (TANK_COLLISION_RADIUS..=dimension - TANK_COLLISION_RADIUS).contains(&value)
}

fn hits_obstacle(tank: &Tank, obstacles: &[Obstacle]) -> bool {
    let bounds = tank.bounds();
    obstacles.iter().any(|o| intersects(&bounds, &o.bounds))
}
