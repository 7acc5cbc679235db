//! Single-slot memo for a recently computed scalar.
//!
//! Quest selection computes threat points; a quest generation request that
//! arrives a few ticks later with missing points can reuse them instead of
//! recomputing. This is a best-effort memo: one slot, last writer wins, and
//! unrelated computations that overlap in time will see each other's value.

use crate::constants::quest::MIN_POINTS;
use crate::Tick;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecentValueCache {
    slot: Option<(f32, Tick)>,
}

impl RecentValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: f32, now: Tick) {
        self.slot = Some((value, now));
    }

    /// The recorded value if it is still within `window` ticks and usable.
    pub fn try_get(&self, now: Tick, window: Tick) -> Option<f32> {
        let (value, at) = self.slot?;
        if now < at || now - at > window {
            return None;
        }
        (value > MIN_POINTS).then_some(value)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
