//! Game state and entity types
//!
//! State is split along the two session locks: `Battlefield` holds the enemy
//! side (enemies, score, wave, flags), `Armory` holds the player side
//! (player, projectiles, pause, fire cooldown).

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::clamp_soft;
use crate::consts::*;
use crate::error::{Error, Result};

/// Playable surface, dimensions supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    /// Validate and create an arena
    pub fn new(width: f32, height: f32) -> Result<Self> {
        let valid = width.is_finite()
            && height.is_finite()
            && width >= MIN_ARENA_WIDTH
            && height >= MIN_ARENA_HEIGHT;
        if !valid {
            return Err(Error::InvalidArena { width, height });
        }
        Ok(Self { width, height })
    }

    /// Vertical center of the player's box
    #[inline]
    pub fn player_y(&self) -> f32 {
        self.height - PLAYER_CENTER_FROM_BOTTOM
    }

    /// Height at which new projectiles appear
    #[inline]
    pub fn projectile_spawn_y(&self) -> f32 {
        self.height - PROJECTILE_SPAWN_FROM_BOTTOM
    }

    /// Horizontal range an enemy center may occupy
    #[inline]
    pub fn enemy_x_bounds(&self) -> (f32, f32) {
        (ENEMY_HALF_SIZE, self.width - ENEMY_HALF_SIZE)
    }

    /// Vertical band outside of which enemies bounce
    #[inline]
    pub fn enemy_y_band(&self) -> (f32, f32) {
        (ENEMY_BAND_TOP, self.height - ENEMY_BAND_BOTTOM_MARGIN)
    }
}

/// The player's ship. Only the horizontal position moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
}

impl Player {
    /// Player centered in the arena
    pub fn centered(arena: &Arena) -> Self {
        Self {
            x: arena.width / 2.0,
        }
    }

    /// Move to `x`, keeping the whole ship inside the arena
    pub fn move_to(&mut self, x: f32, arena: &Arena) {
        self.x = clamp_soft(x, PLAYER_HALF_WIDTH, arena.width - PLAYER_HALF_WIDTH);
    }

    pub fn hitbox(&self, arena: &Arena) -> Aabb {
        Aabb::new(
            Vec2::new(self.x, arena.player_y()),
            Vec2::new(PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT),
        )
    }
}

/// A shot travelling straight up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
}

impl Projectile {
    /// Fire from the player's current position
    pub fn fired_by(player: &Player, arena: &Arena) -> Self {
        Self {
            pos: Vec2::new(player.x, arena.projectile_spawn_y()),
        }
    }

    /// Advance one tick
    #[inline]
    pub fn step(&mut self) {
        self.pos.y -= PROJECTILE_STEP;
    }

    /// Left through the top edge
    #[inline]
    pub fn is_off_arena(&self) -> bool {
        self.pos.y < 0.0
    }

    pub fn hits(&self, enemy: &Enemy) -> bool {
        enemy.hitbox().contains_point(self.pos)
    }
}

/// A drifting enemy ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Horizontal bounds for the center
    pub min_x: f32,
    pub max_x: f32,
}

impl Enemy {
    pub fn new(pos: Vec2, vel: Vec2, arena: &Arena) -> Self {
        let (min_x, max_x) = arena.enemy_x_bounds();
        Self {
            pos,
            vel,
            min_x,
            max_x,
        }
    }

    /// Enemy with a random starting velocity
    pub fn with_random_velocity(pos: Vec2, arena: &Arena, rng: &mut impl Rng) -> Self {
        let vel = Vec2::new(
            rng.random_range(-ENEMY_MAX_START_SPEED..ENEMY_MAX_START_SPEED),
            rng.random_range(-ENEMY_MAX_START_SPEED..ENEMY_MAX_START_SPEED),
        );
        Self::new(pos, vel, arena)
    }

    /// Advance one tick: drift, clamp-and-bounce horizontally, bounce vertically.
    ///
    /// The vertical bounce only flips the velocity, so a fast enemy can sit
    /// outside the band for a tick before it comes back.
    pub fn step(&mut self, arena: &Arena) {
        self.pos += self.vel;

        if self.pos.x < self.min_x {
            self.pos.x = self.min_x;
            self.vel.x = -self.vel.x;
        } else if self.pos.x > self.max_x {
            self.pos.x = self.max_x;
            self.vel.x = -self.vel.x;
        }

        let (top, bottom) = arena.enemy_y_band();
        if self.pos.y < top || self.pos.y > bottom {
            self.vel.y = -self.vel.y;
        }
    }

    /// Scale both velocity components, then lift any axis that became too slow
    pub fn increase_speed(&mut self, multiplier: f32) {
        self.vel *= multiplier;
        self.vel.x = lift_slow_axis(self.vel.x);
        self.vel.y = lift_slow_axis(self.vel.y);
    }

    /// Re-derive horizontal bounds after an arena resize
    pub fn rebind(&mut self, arena: &Arena) {
        let (min_x, max_x) = arena.enemy_x_bounds();
        self.min_x = min_x;
        self.max_x = max_x;
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::square(self.pos, ENEMY_HALF_SIZE)
    }
}

fn lift_slow_axis(v: f32) -> f32 {
    if (-SLOW_SPEED_LIMIT..=SLOW_SPEED_LIMIT).contains(&v) {
        if v < 0.0 {
            SLOW_NEGATIVE_SPEED
        } else {
            SLOW_POSITIVE_SPEED
        }
    } else {
        v
    }
}

/// Short-lived effect left behind by a destroyed enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub ticks_left: u32,
}

impl Explosion {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ticks_left: EXPLOSION_TICKS,
        }
    }

    /// Age one tick; returns false once expired
    pub fn age(&mut self) -> bool {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left > 0
    }

    /// Remaining life in [0, 1] for fading
    pub fn life(&self) -> f32 {
        self.ticks_left as f32 / EXPLOSION_TICKS as f32
    }
}

/// Something notable that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A new batch of enemies entered the arena
    WaveSpawned { wave: u32, enemies: usize },
    /// The first batch was thrown away before it became interactive
    WarmUpWaveDiscarded,
    /// An enemy was shot down
    EnemyDestroyed { pos: Vec2 },
    /// All live enemies sped up
    SpeedEscalated { score: u32 },
    /// The player collided with an enemy
    GameOver { score: u32 },
}

/// Enemy side of the game: guarded by the outer session lock
#[derive(Debug, Clone)]
pub struct Battlefield {
    pub arena: Arena,
    /// Live enemies
    pub enemies: Vec<Enemy>,
    /// Visual effects only
    pub explosions: Vec<Explosion>,
    pub score: u32,
    /// Number of spawns so far (plus the warm-up bump)
    pub wave_count: u32,
    pub game_over: bool,
    /// Simulation tick counter (active ticks only)
    pub time_ticks: u64,
    /// Last score multiple that triggered an escalation
    score_checkpoint: u32,
    rng: Pcg32,
}

impl Battlefield {
    pub fn new(arena: Arena, seed: u64) -> Self {
        Self {
            arena,
            enemies: Vec::new(),
            explosions: Vec::new(),
            score: 0,
            wave_count: 0,
            game_over: false,
            time_ticks: 0,
            score_checkpoint: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Start a fresh run in the same arena. The RNG keeps its stream.
    pub fn restart(&mut self) {
        self.enemies.clear();
        self.explosions.clear();
        self.score = 0;
        self.wave_count = 0;
        self.game_over = false;
        self.time_ticks = 0;
        self.score_checkpoint = 0;
    }

    pub fn score_checkpoint(&self) -> u32 {
        self.score_checkpoint
    }

    pub(crate) fn set_score_checkpoint(&mut self, checkpoint: u32) {
        self.score_checkpoint = checkpoint;
    }

    pub(crate) fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Apply new arena dimensions; live enemies pick up the new bounds
    pub fn resize(&mut self, arena: Arena) {
        self.arena = arena;
        for enemy in &mut self.enemies {
            enemy.rebind(&arena);
        }
    }
}

/// Player side of the game: guarded by the inner session lock
#[derive(Debug, Clone)]
pub struct Armory {
    pub player: Player,
    /// Live projectiles
    pub projectiles: Vec<Projectile>,
    pub paused: bool,
    /// Timestamp of the last accepted shot
    pub last_shot_ms: Option<u64>,
    pub fire_cooldown_ms: u64,
}

impl Armory {
    pub fn new(arena: &Arena, fire_cooldown_ms: u64) -> Self {
        Self {
            player: Player::centered(arena),
            projectiles: Vec::new(),
            paused: false,
            last_shot_ms: None,
            fire_cooldown_ms,
        }
    }

    /// Start a fresh run: player back to center, no shots in flight
    pub fn restart(&mut self, arena: &Arena) {
        self.player = Player::centered(arena);
        self.projectiles.clear();
        self.paused = false;
        self.last_shot_ms = None;
    }

    /// Fire if the cooldown has elapsed. Returns true when a shot was added.
    pub fn try_fire(&mut self, at_ms: u64, arena: &Arena) -> bool {
        let ready = self
            .last_shot_ms
            .map(|last| at_ms.saturating_sub(last) >= self.fire_cooldown_ms)
            .unwrap_or(true);
        if !ready {
            return false;
        }
        self.projectiles
            .push(Projectile::fired_by(&self.player, arena));
        self.last_shot_ms = Some(at_ms);
        true
    }

    pub fn resize(&mut self, arena: &Arena) {
        let x = self.player.x;
        self.player.move_to(x, arena);
    }
}
