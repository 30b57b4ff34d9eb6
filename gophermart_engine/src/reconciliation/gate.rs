use std::sync::{Arc, Mutex};

use log::*;
use tokio::time::{sleep_until, Duration, Instant};

/// A pause shared by every worker.
///
/// The gate is either open, or closed until some instant. Closing it for a shorter period than it is already closed
/// for has no effect.
#[derive(Clone, Default)]
pub struct BackpressureGate {
    resume_at: Arc<Mutex<Option<Instant>>>,
}

impl BackpressureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep everyone waiting for at least `delay` from now.
    pub fn close_for(&self, delay: Duration) {
        let until = Instant::now() + delay;
        let mut resume_at = self.resume_at.lock().unwrap_or_else(|p| p.into_inner());
        if resume_at.map_or(true, |t| t < until) {
            debug!("🚦️ Accrual requests paused for {}ms", delay.as_millis());
            *resume_at = Some(until);
        }
    }

    /// The instant the gate opens again, if it is currently closed.
    pub fn resume_at(&self) -> Option<Instant> {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|p| p.into_inner());
        resume_at.filter(|t| *t > Instant::now())
    }

    pub fn is_open(&self) -> bool {
        self.resume_at().is_none()
    }

    /// Returns once the gate is open. If somebody extends the pause while we sleep, we sleep again.
    pub async fn wait_until_open(&self) {
        while let Some(t) = self.resume_at() {
            trace!("🚦️ Waiting for the accrual gate to open");
            sleep_until(t).await;
        }
    }
}
