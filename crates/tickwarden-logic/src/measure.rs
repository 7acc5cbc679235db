//! Scope timer for occasional slow-path diagnostics.

use std::time::Instant;

/// Logs the scope's wall time at debug level on drop, if enabled and at
/// least `threshold_ms` elapsed.
#[derive(Debug)]
pub struct Measure {
    name: &'static str,
    threshold_ms: u128,
    enabled: bool,
    started: Instant,
}

impl Measure {
    pub fn start(name: &'static str, threshold_ms: u128, enabled: bool) -> Self {
        Self {
            name,
            threshold_ms,
            enabled,
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

impl Drop for Measure {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let ms = self.elapsed_ms();
        if ms >= self.threshold_ms {
            log::debug!("{} took {} ms", self.name, ms);
        }
    }
}
