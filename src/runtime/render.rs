//! Render driver
//!
//! The render thread copies a snapshot under both session locks and hands
//! it to a `FrameSink`. Pacing belongs to the sink: a sink that blocks until
//! the next display refresh gives vsync-like behaviour.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::session::Session;
use crate::error::Result;
use crate::sim::collision::Aabb;
use crate::sim::{Arena, Armory, Battlefield, Explosion, HitRegions};

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub arena: Arena,
    pub player: Aabb,
    pub enemies: Vec<Aabb>,
    pub projectiles: Vec<Vec2>,
    pub explosions: Vec<Explosion>,
    pub pause_button: Aabb,
    pub reset_region: Aabb,
    pub score: u32,
    pub wave: u32,
    pub paused: bool,
    pub game_over: bool,
}

impl RenderSnapshot {
    pub fn capture(field: &Battlefield, armory: &Armory, regions: &HitRegions) -> Self {
        Self {
            arena: field.arena,
            player: armory.player.hitbox(&field.arena),
            enemies: field.enemies.iter().map(|e| e.hitbox()).collect(),
            projectiles: armory.projectiles.iter().map(|p| p.pos).collect(),
            explosions: field.explosions.clone(),
            pause_button: regions.pause,
            reset_region: regions.reset,
            score: field.score,
            wave: field.wave_count,
            paused: armory.paused,
            game_over: field.game_over,
        }
    }
}

/// Destination for rendered frames
pub trait FrameSink: Send {
    fn present(&mut self, frame: &RenderSnapshot) -> Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&RenderSnapshot) -> Result<()> + Send,
{
    fn present(&mut self, frame: &RenderSnapshot) -> Result<()> {
        self(frame)
    }
}

/// Background thread feeding snapshots to a sink
pub struct RenderLoop {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RenderLoop {
    pub fn spawn<S: FrameSink + 'static>(session: Arc<Session>, mut sink: S) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                log::debug!("Render loop started");
                let mut frames: u64 = 0;
                while !flag.load(Ordering::Acquire) {
                    let frame = session.snapshot();
                    match sink.present(&frame) {
                        Ok(()) => frames += 1,
                        Err(e) => log::error!("Frame skipped: {}", e),
                    }
                }
                log::debug!("Render loop stopped after {} frames", frames);
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to finish its current frame
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Render thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
