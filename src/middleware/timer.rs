use tokio::time::Instant;

/// Monotonic per-request timer.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    started: Instant,
}

impl RequestTimer {
    // ---
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Seconds since [`start`](Self::start). Never negative.
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
