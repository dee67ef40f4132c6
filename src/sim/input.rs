//! Pointer input
//!
//! A single tap/click drives everything: on the game-over screen it is
//! tested against the reset text, otherwise it moves the ship and either
//! toggles pause (top-right button) or fires.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{Arena, Armory, Battlefield};
use crate::consts::PAUSE_BUTTON_SIZE;

/// Label drawn under the final score on the game-over screen
pub const RESET_LABEL: &str = "-tap here to reset-";
/// Text size used for the reset label
pub const RESET_TEXT_SIZE: f32 = 50.0;
/// Baseline offset of the reset label below the arena center
pub const RESET_BASELINE_OFFSET: f32 = 200.0;
/// Estimated glyph advance as a fraction of the text size
pub const GLYPH_ADVANCE: f32 = 0.55;

/// A pointer-down event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    /// Milliseconds since the session started
    pub at_ms: u64,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, at_ms: u64) -> Self {
        Self { x, y, at_ms }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// What a pointer event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Nothing happened (game-over tap outside the reset text)
    Ignored,
    /// The ship moved; no shot (cooldown or paused)
    Moved,
    /// The ship moved and fired
    Fired,
    /// The pause button was hit; carries the new paused state
    PauseToggled(bool),
    /// The reset text was hit on the game-over screen
    ReturnToStart,
}

/// Tappable regions of the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRegions {
    pub pause: Aabb,
    pub reset: Aabb,
}

impl HitRegions {
    /// Regions for an arena, with the reset text measured by estimate
    pub fn for_arena(arena: &Arena) -> Self {
        Self {
            pause: pause_region(arena),
            reset: estimated_text_bounds(
                arena,
                RESET_LABEL,
                RESET_TEXT_SIZE,
                arena.height / 2.0 + RESET_BASELINE_OFFSET,
            ),
        }
    }
}

/// Fixed square in the top-right corner
pub fn pause_region(arena: &Arena) -> Aabb {
    Aabb::from_corner(
        Vec2::new(arena.width - PAUSE_BUTTON_SIZE, 0.0),
        Vec2::splat(PAUSE_BUTTON_SIZE),
    )
}

/// Bounds of a horizontally centered line of text sitting on `baseline`
pub fn estimated_text_bounds(arena: &Arena, text: &str, text_size: f32, baseline: f32) -> Aabb {
    let width = text.chars().count() as f32 * text_size * GLYPH_ADVANCE;
    Aabb::from_corner(
        Vec2::new((arena.width - width) / 2.0, baseline - text_size),
        Vec2::new(width, text_size),
    )
}

/// Apply one pointer event to the game
pub fn apply_pointer(
    field: &Battlefield,
    armory: &mut Armory,
    regions: &HitRegions,
    event: PointerEvent,
) -> InputOutcome {
    let pos = event.pos();

    if field.game_over {
        return if regions.reset.contains_point(pos) {
            InputOutcome::ReturnToStart
        } else {
            InputOutcome::Ignored
        };
    }

    armory.player.move_to(event.x, &field.arena);

    if regions.pause.contains_point(pos) {
        armory.paused = !armory.paused;
        log::info!("Pause {}", if armory.paused { "on" } else { "off" });
        return InputOutcome::PauseToggled(armory.paused);
    }

    // Taps while paused only move the ship; the shot is dropped
    if !armory.paused && armory.try_fire(event.at_ms, &field.arena) {
        InputOutcome::Fired
    } else {
        InputOutcome::Moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIRE_COOLDOWN_MS;

    fn setup() -> (Battlefield, Armory, HitRegions) {
        let arena = Arena::new(1000.0, 2000.0).unwrap();
        (
            Battlefield::new(arena, 1),
            Armory::new(&arena, FIRE_COOLDOWN_MS),
            HitRegions::for_arena(&arena),
        )
    }

    #[test]
    fn test_tap_moves_and_fires() {
        let (field, mut armory, regions) = setup();
        let outcome = apply_pointer(
            &field,
            &mut armory,
            &regions,
            PointerEvent::new(300.0, 1500.0, 0),
        );
        assert_eq!(outcome, InputOutcome::Fired);
        assert_eq!(armory.player.x, 300.0);
        assert_eq!(armory.projectiles.len(), 1);
        assert_eq!(armory.projectiles[0].pos, Vec2::new(300.0, 1800.0));
    }

    #[test]
    fn test_cooldown_blocks_second_shot() {
        let (field, mut armory, regions) = setup();
        apply_pointer(
            &field,
            &mut armory,
            &regions,
            PointerEvent::new(300.0, 1500.0, 0),
        );
        let outcome = apply_pointer(
            &field,
            &mut armory,
            &regions,
            PointerEvent::new(400.0, 1500.0, 300),
        );
        assert_eq!(outcome, InputOutcome::Moved);
        assert_eq!(armory.player.x, 400.0);
        assert_eq!(armory.projectiles.len(), 1);
    }

    #[test]
    fn test_pause_button_toggles() {
        let (field, mut armory, regions) = setup();
        let tap = PointerEvent::new(950.0, 50.0, 0);
        assert_eq!(
            apply_pointer(&field, &mut armory, &regions, tap),
            InputOutcome::PauseToggled(true)
        );
        assert!(armory.projectiles.is_empty());
        // The ship still follows the tap, clamped to the arena
        assert_eq!(armory.player.x, 950.0);

        // Fire is dropped while paused
        let fire = PointerEvent::new(500.0, 1500.0, 1000);
        assert_eq!(
            apply_pointer(&field, &mut armory, &regions, fire),
            InputOutcome::Moved
        );
        assert!(armory.projectiles.is_empty());

        assert_eq!(
            apply_pointer(&field, &mut armory, &regions, tap),
            InputOutcome::PauseToggled(false)
        );
    }

    #[test]
    fn test_game_over_reset_region() {
        let (mut field, mut armory, regions) = setup();
        field.game_over = true;

        let miss = PointerEvent::new(100.0, 100.0, 0);
        assert_eq!(
            apply_pointer(&field, &mut armory, &regions, miss),
            InputOutcome::Ignored
        );
        assert_eq!(armory.player.x, 500.0);

        let center = regions.reset.center;
        let hit = PointerEvent::new(center.x, center.y, 0);
        assert_eq!(
            apply_pointer(&field, &mut armory, &regions, hit),
            InputOutcome::ReturnToStart
        );
        assert!(armory.projectiles.is_empty());
    }

    #[test]
    fn test_reset_region_sits_on_baseline() {
        let arena = Arena::new(1000.0, 2000.0).unwrap();
        let regions = HitRegions::for_arena(&arena);
        assert_eq!(regions.reset.max().y, 1200.0);
        assert_eq!(regions.reset.min().y, 1150.0);
        assert!((regions.reset.center.x - 500.0).abs() < 1e-3);
    }
}
