//! Threaded runtime
//!
//! The update loop and the render loop run on their own threads and meet
//! only at the session locks. The update thread also owns the score write
//! that follows a game over.

pub mod render;
pub mod scheduler;
pub mod session;

pub use render::{FrameSink, RenderLoop, RenderSnapshot};
pub use scheduler::Scheduler;
pub use session::{Session, SessionEvent};

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::highscores::{HighScoreRecord, ScoreGateway};
use crate::settings::Settings;

/// A running game: session, both loops and the score gateway
pub struct Game {
    session: Arc<Session>,
    gateway: Arc<Mutex<ScoreGateway>>,
    events: Receiver<SessionEvent>,
    update: Scheduler,
    render: Option<RenderLoop>,
}

impl Game {
    /// Start the update loop, and the render loop if a sink is given
    pub fn start<S: FrameSink + 'static>(
        session: Arc<Session>,
        gateway: Arc<Mutex<ScoreGateway>>,
        settings: &Settings,
        sink: Option<S>,
    ) -> Result<Self> {
        settings.validate()?;
        let (tx, events) = mpsc::channel();

        let step_session = Arc::clone(&session);
        let step_gateway = Arc::clone(&gateway);
        let update = Scheduler::spawn(
            "update",
            Duration::from_millis(settings.tick_interval_ms),
            move || {
                for event in step_session.step() {
                    if let SessionEvent::GameOver { score } = event {
                        log::info!("Game over with score {}", score);
                        step_gateway.lock().on_game_over(score);
                    }
                    // Nobody listening is fine
                    let _ = tx.send(event);
                }
            },
        )?;

        let render = match sink {
            Some(sink) => Some(RenderLoop::spawn(Arc::clone(&session), sink)?),
            None => None,
        };

        gateway.lock().mark_run_started();

        Ok(Self {
            session,
            gateway,
            events,
            update,
            render,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Events raised by the update thread
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Begin a new run after returning to the start screen
    pub fn new_run(&self) {
        self.session.restart();
        self.gateway.lock().mark_run_started();
    }

    pub fn record(&self) -> HighScoreRecord {
        self.gateway.lock().record()
    }

    /// Remember that the app went to the background
    pub fn set_minimized(&self, minimized: bool) {
        self.gateway.lock().set_was_minimized(minimized);
    }

    /// Stop both loops; the render loop first so it never outlives updates
    pub fn stop(&mut self) {
        if let Some(mut render) = self.render.take() {
            render.stop();
        }
        self.update.stop();
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.stop();
    }
}
