//! Fixed-interval update driver
//!
//! Runs a step function on its own thread at a fixed period. Deadlines
//! advance by whole intervals on a monotonic clock, so a slow step is made
//! up on the next one. If the thread falls further behind than
//! `MAX_BACKLOG_TICKS`, the backlog is dropped and the schedule restarts
//! from now.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Intervals of lag tolerated before resyncing
pub const MAX_BACKLOG_TICKS: u32 = 4;

/// Next deadline after a step that finished at `now`
fn next_deadline(deadline: Instant, now: Instant, interval: Duration) -> Instant {
    let next = deadline + interval;
    if now > next + interval * MAX_BACKLOG_TICKS {
        log::debug!(
            "Update loop {:?} behind, dropping backlog",
            now.duration_since(next)
        );
        now + interval
    } else {
        next
    }
}

pub struct Scheduler {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn a named thread calling `step` every `interval`
    pub fn spawn<F>(name: &str, interval: Duration, mut step: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            log::debug!("Update loop started ({:?} interval)", interval);
            let mut deadline = Instant::now();
            let mut ticks: u64 = 0;

            while !flag.load(Ordering::Acquire) {
                step();
                ticks += 1;

                let now = Instant::now();
                deadline = next_deadline(deadline, now, interval);
                if deadline > now {
                    thread::sleep(deadline - now);
                }
            }
            log::debug!("Update loop stopped after {} ticks", ticks);
        })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for the step in progress to finish
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Update thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
