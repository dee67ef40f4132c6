//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module locks, sleeps or
//! touches I/O:
//! - Fixed tick only
//! - Seeded RNG only
//! - Arena dimensions passed in explicitly

pub mod collision;
pub mod input;
pub mod state;
pub mod tick;

pub use collision::{Aabb, resolve_enemy_separation, separate_pair};
pub use input::{HitRegions, InputOutcome, PointerEvent, apply_pointer};
pub use state::{Arena, Armory, Battlefield, Enemy, Explosion, GameEvent, Player, Projectile};
pub use tick::{spawn_enemies, tick, wave_population};
