//! Shared game session
//!
//! Lock order is always battlefield (outer) then armory (inner). Pointer
//! events never take a lock: they are queued and applied at the start of
//! the next update step.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use parking_lot::Mutex;

use super::render::RenderSnapshot;
use crate::settings::Settings;
use crate::sim::collision::Aabb;
use crate::sim::{
    Arena, Armory, Battlefield, GameEvent, HitRegions, InputOutcome, PointerEvent, apply_pointer,
    tick,
};

/// Notable things the host may react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    WaveSpawned { wave: u32, enemies: usize },
    PauseToggled(bool),
    GameOver { score: u32 },
    /// The reset text was tapped on the game-over screen
    ReturnToStart,
}

pub struct Session {
    battlefield: Mutex<Battlefield>,
    armory: Mutex<Armory>,
    regions: Mutex<HitRegions>,
    /// Host-measured reset text bounds; survives resizes
    reset_override: Mutex<Option<Aabb>>,
    input_tx: Sender<PointerEvent>,
    input_rx: Mutex<Receiver<PointerEvent>>,
    started: Instant,
}

impl Session {
    pub fn new(arena: Arena, settings: &Settings) -> Self {
        Self::with_seed(arena, settings.resolve_seed(), settings.fire_cooldown_ms)
    }

    pub fn with_seed(arena: Arena, seed: u64, fire_cooldown_ms: u64) -> Self {
        let (input_tx, input_rx) = mpsc::channel();
        log::info!(
            "Session created: arena {}x{}, seed {}",
            arena.width,
            arena.height,
            seed
        );
        Self {
            battlefield: Mutex::new(Battlefield::new(arena, seed)),
            armory: Mutex::new(Armory::new(&arena, fire_cooldown_ms)),
            regions: Mutex::new(HitRegions::for_arena(&arena)),
            reset_override: Mutex::new(None),
            input_tx,
            input_rx: Mutex::new(input_rx),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the session was created
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Queue a pointer-down stamped with the current session time
    pub fn pointer_down(&self, x: f32, y: f32) {
        self.queue_pointer(PointerEvent::new(x, y, self.now_ms()));
    }

    /// Queue a pointer-down with an explicit timestamp
    pub fn queue_pointer(&self, event: PointerEvent) {
        // The receiver lives as long as the session
        let _ = self.input_tx.send(event);
    }

    /// One update step: drain queued input, then advance the simulation
    pub fn step(&self) -> Vec<SessionEvent> {
        let mut field = self.battlefield.lock();
        let mut armory = self.armory.lock();
        let mut out = Vec::new();

        let regions = *self.regions.lock();
        for event in self.input_rx.lock().try_iter() {
            match apply_pointer(&field, &mut armory, &regions, event) {
                InputOutcome::PauseToggled(paused) => out.push(SessionEvent::PauseToggled(paused)),
                InputOutcome::ReturnToStart => out.push(SessionEvent::ReturnToStart),
                InputOutcome::Ignored | InputOutcome::Moved | InputOutcome::Fired => {}
            }
        }

        for event in tick(&mut field, &mut armory) {
            match event {
                GameEvent::WaveSpawned { wave, enemies } => {
                    out.push(SessionEvent::WaveSpawned { wave, enemies })
                }
                GameEvent::GameOver { score } => out.push(SessionEvent::GameOver { score }),
                _ => {}
            }
        }
        out
    }

    /// Copy everything a frame needs under both locks
    pub fn snapshot(&self) -> RenderSnapshot {
        let field = self.battlefield.lock();
        let armory = self.armory.lock();
        let regions = *self.regions.lock();
        RenderSnapshot::capture(&field, &armory, &regions)
    }

    /// Apply new dimensions; invalid sizes are ignored
    pub fn resize(&self, width: f32, height: f32) -> bool {
        let arena = match Arena::new(width, height) {
            Ok(arena) => arena,
            Err(e) => {
                log::warn!("Ignoring resize: {}", e);
                return false;
            }
        };

        let mut field = self.battlefield.lock();
        let mut armory = self.armory.lock();
        field.resize(arena);
        armory.resize(&arena);
        let mut regions = HitRegions::for_arena(&arena);
        if let Some(reset) = *self.reset_override.lock() {
            regions.reset = reset;
        }
        *self.regions.lock() = regions;
        log::debug!("Arena resized to {}x{}", width, height);
        true
    }

    /// Start a fresh run; queued input from the old run is dropped
    pub fn restart(&self) {
        let mut field = self.battlefield.lock();
        let mut armory = self.armory.lock();
        let stale = self.input_rx.lock().try_iter().count();
        if stale > 0 {
            log::debug!("Dropped {} queued pointer events", stale);
        }
        field.restart();
        armory.restart(&field.arena);
        log::info!("New run started");
    }

    /// Replace the estimated reset-text region with measured bounds.
    ///
    /// The override is kept across resizes; a host whose text moves with
    /// the arena sets it again after resizing.
    pub fn set_reset_region(&self, region: Aabb) {
        *self.reset_override.lock() = Some(region);
        self.regions.lock().reset = region;
    }

    /// Go back to the estimated reset-text region
    pub fn clear_reset_region(&self) {
        let field = self.battlefield.lock();
        *self.reset_override.lock() = None;
        self.regions.lock().reset = HitRegions::for_arena(&field.arena).reset;
    }

    pub fn regions(&self) -> HitRegions {
        *self.regions.lock()
    }

    pub fn score(&self) -> u32 {
        self.battlefield.lock().score
    }

    pub fn is_game_over(&self) -> bool {
        self.battlefield.lock().game_over
    }

    pub fn is_paused(&self) -> bool {
        let _field = self.battlefield.lock();
        self.armory.lock().paused
    }

    pub fn arena(&self) -> Arena {
        self.battlefield.lock().arena
    }

    /// Run `f` with both locks held, in order
    pub fn with_state<R>(&self, f: impl FnOnce(&mut Battlefield, &mut Armory) -> R) -> R {
        let mut field = self.battlefield.lock();
        let mut armory = self.armory.lock();
        f(&mut field, &mut armory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn session() -> Session {
        Session::with_seed(Arena::new(1000.0, 2000.0).unwrap(), 5, 400)
    }

    /// Spawn the warm-up batch, discard it, spawn the first playable wave
    fn to_first_wave(session: &Session) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..3 {
            events.extend(session.step());
        }
        events
    }

    #[test]
    fn test_first_playable_wave() {
        let session = session();
        let events = to_first_wave(&session);
        assert_eq!(
            events,
            vec![
                SessionEvent::WaveSpawned { wave: 1, enemies: 4 },
                SessionEvent::WaveSpawned { wave: 2, enemies: 6 },
            ]
        );
        assert_eq!(session.snapshot().enemies.len(), 6);
    }

    #[test]
    fn test_queued_fire_respects_cooldown() {
        let session = session();
        session.queue_pointer(PointerEvent::new(300.0, 1500.0, 0));
        session.queue_pointer(PointerEvent::new(300.0, 1500.0, 300));
        session.step();
        assert_eq!(session.snapshot().projectiles.len(), 1);

        session.queue_pointer(PointerEvent::new(300.0, 1500.0, 450));
        session.step();
        assert_eq!(session.snapshot().projectiles.len(), 2);
    }

    #[test]
    fn test_pause_is_drained_while_paused() {
        let session = session();
        to_first_wave(&session);

        session.queue_pointer(PointerEvent::new(950.0, 50.0, 0));
        assert_eq!(session.step(), vec![SessionEvent::PauseToggled(true)]);
        let frozen = session.snapshot();

        for _ in 0..10 {
            assert!(session.step().is_empty());
        }
        assert_eq!(session.snapshot().enemies, frozen.enemies);

        session.queue_pointer(PointerEvent::new(950.0, 50.0, 100));
        assert_eq!(session.step(), vec![SessionEvent::PauseToggled(false)]);
        assert!(!session.is_paused());
    }

    #[test]
    fn test_game_over_then_reset_tap() {
        let session = session();
        to_first_wave(&session);
        session.with_state(|field, armory| {
            let y = field.arena.player_y() - 74.0;
            field.enemies.truncate(1);
            field.enemies[0].pos = Vec2::new(armory.player.x, y);
            field.enemies[0].vel = Vec2::new(1.0, 0.0);
        });

        assert!(
            session
                .step()
                .contains(&SessionEvent::GameOver { score: 0 })
        );
        assert!(session.is_game_over());

        let reset = session.regions().reset.center;
        session.queue_pointer(PointerEvent::new(reset.x, reset.y, 0));
        assert_eq!(session.step(), vec![SessionEvent::ReturnToStart]);

        session.restart();
        assert!(!session.is_game_over());
        assert_eq!(session.score(), 0);
        assert!(session.snapshot().enemies.is_empty());
    }

    #[test]
    fn test_resize_rejects_invalid() {
        let session = session();
        assert!(!session.resize(0.0, 100.0));
        assert_eq!(session.arena(), Arena::new(1000.0, 2000.0).unwrap());

        to_first_wave(&session);
        assert!(session.resize(800.0, 1600.0));
        session.with_state(|field, armory| {
            assert!(field.enemies.iter().all(|e| e.max_x == 750.0));
            assert!(armory.player.x <= 750.0);
        });
        assert_eq!(session.regions().pause.max().x, 800.0);
    }

    #[test]
    fn test_set_reset_region_override() {
        let session = session();
        let region = Aabb::new(Vec2::new(500.0, 1175.0), Vec2::new(100.0, 25.0));
        session.set_reset_region(region);
        assert_eq!(session.regions().reset, region);
    }

    #[test]
    fn test_reset_region_override_survives_resize() {
        let session = session();
        let region = Aabb::new(Vec2::new(500.0, 1175.0), Vec2::new(100.0, 25.0));
        session.set_reset_region(region);

        assert!(session.resize(800.0, 1600.0));
        let regions = session.regions();
        assert_eq!(regions.reset, region);
        assert_eq!(regions.pause.max().x, 800.0);

        session.clear_reset_region();
        let estimated = HitRegions::for_arena(&Arena::new(800.0, 1600.0).unwrap());
        assert_eq!(session.regions().reset, estimated.reset);
    }
}
