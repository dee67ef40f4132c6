//! Star Swarm - a single-screen arcade shooter
//!
//! Core modules:
//! - `sim`: Simulation (entities, collisions, waves, score, input)
//! - `runtime`: Shared session, fixed-tick update driver, render driver
//! - `highscores`: Score record on top of a key-value store
//! - `settings`: Runtime configuration
//! - `error`: Error taxonomy for initialization failures

pub mod error;
pub mod highscores;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use highscores::{HighScoreRecord, ScoreGateway};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed update interval (~62.5 Hz)
    pub const TICK_MS: u64 = 16;
    /// Minimum time between two shots
    pub const FIRE_COOLDOWN_MS: u64 = 400;

    /// Smallest arena the spawn and clamp math accepts
    pub const MIN_ARENA_WIDTH: f32 = 200.0;
    pub const MIN_ARENA_HEIGHT: f32 = 300.0;

    /// Player box (100x50), centered 125 units above the bottom edge
    pub const PLAYER_HALF_WIDTH: f32 = 50.0;
    pub const PLAYER_HALF_HEIGHT: f32 = 25.0;
    pub const PLAYER_CENTER_FROM_BOTTOM: f32 = 125.0;

    /// Projectiles appear this far above the bottom edge
    pub const PROJECTILE_SPAWN_FROM_BOTTOM: f32 = 200.0;
    /// Upward travel per tick
    pub const PROJECTILE_STEP: f32 = 20.0;

    /// Enemy box (100x100)
    pub const ENEMY_SIZE: f32 = 100.0;
    pub const ENEMY_HALF_SIZE: f32 = ENEMY_SIZE / 2.0;
    /// Initial velocity per axis is drawn from [-MAX, MAX)
    pub const ENEMY_MAX_START_SPEED: f32 = 5.0;
    /// Vertical bounce band: [BAND_TOP, height - BAND_BOTTOM_MARGIN]
    pub const ENEMY_BAND_TOP: f32 = 50.0;
    pub const ENEMY_BAND_BOTTOM_MARGIN: f32 = 150.0;
    /// Spawn height: uniform in [SPAWN_Y_OFFSET, height/3 - SPAWN_Y_MARGIN + SPAWN_Y_OFFSET)
    pub const SPAWN_Y_OFFSET: f32 = 75.0;
    pub const SPAWN_Y_MARGIN: f32 = 150.0;

    /// Speed floor applied after a rescale leaves an axis inside [-1, 1]
    pub const SLOW_SPEED_LIMIT: f32 = 1.0;
    pub const SLOW_POSITIVE_SPEED: f32 = 3.0;
    pub const SLOW_NEGATIVE_SPEED: f32 = -1.1;

    /// Centers closer than this push each other apart
    pub const SEPARATION_DISTANCE: f32 = 100.0;
    /// Velocity reflection factors for the first and second enemy of a pair
    pub const FIRST_COLLIDER_KICK: f32 = 1.05;
    pub const SECOND_COLLIDER_KICK: f32 = 1.1;

    /// Global speed multiplier per escalation
    pub const ESCALATION_MULTIPLIER: f32 = 1.5;
    /// Score step between escalations
    pub const ESCALATION_SCORE_STEP: u32 = 5;

    /// Wave population: BASE + (wave - 1), never below MIN
    pub const BASE_WAVE_POPULATION: i64 = 5;
    pub const MIN_WAVE_POPULATION: usize = 2;

    /// Pause button is a square in the top-right corner
    pub const PAUSE_BUTTON_SIZE: f32 = 100.0;

    /// Lifetime of an explosion effect
    pub const EXPLOSION_TICKS: u32 = 20;
}

/// Clamp without panicking when `lo > hi` (tiny arenas); `lo` wins.
#[inline]
pub fn clamp_soft(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}

/// Euclidean distance and angle from `a` to `b`
#[inline]
pub fn distance_and_angle(a: Vec2, b: Vec2) -> (f32, f32) {
    let d = b - a;
    (d.length(), d.y.atan2(d.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_soft() {
        assert_eq!(clamp_soft(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_soft(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_soft(50.0, 0.0, 10.0), 10.0);
        // Inverted bounds do not panic
        assert_eq!(clamp_soft(5.0, 10.0, 0.0), 10.0);
    }

    #[test]
    fn test_distance_and_angle() {
        let (d, a) = distance_and_angle(Vec2::ZERO, Vec2::new(0.0, 2.0));
        assert!((d - 2.0).abs() < 1e-6);
        assert!((a - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
