//! Systems - per-tick passes that run the governor's gates over the world

mod pawns;
mod plants;
mod turrets;

pub use pawns::*;
pub use plants::*;
pub use turrets::*;

use serde::Serialize;

/// Work done (and avoided) in one or more steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    pub full_updates: u64,
    pub skipped_updates: u64,
    /// Pawn updates decided by a throttle registry rather than an override.
    pub throttled_updates: u64,
    pub scans_run: u64,
    pub scans_skipped: u64,
    pub targets_reused: u64,
    pub plant_updates: u64,
    pub plant_replays: u64,
    pub plant_failures: u64,
    pub danger_changes: u64,
}

impl std::ops::AddAssign for StepStats {
    fn add_assign(&mut self, o: Self) {
        self.full_updates += o.full_updates;
        self.skipped_updates += o.skipped_updates;
        self.throttled_updates += o.throttled_updates;
        self.scans_run += o.scans_run;
        self.scans_skipped += o.scans_skipped;
        self.targets_reused += o.targets_reused;
        self.plant_updates += o.plant_updates;
        self.plant_replays += o.plant_replays;
        self.plant_failures += o.plant_failures;
        self.danger_changes += o.danger_changes;
    }
}

impl StepStats {
    /// Share of pawn updates that were skipped, 0.0 when none ran.
    pub fn skip_ratio(&self) -> f64 {
        let total = self.full_updates + self.skipped_updates;
        if total == 0 {
            0.0
        } else {
            self.skipped_updates as f64 / total as f64
        }
    }
}
