//! Deferred plant long-ticks with batched compensation.
//!
//! The host fires a plant's long-tick on a fixed native cadence. Most
//! firings are skipped; when one is allowed, a still-growing plant replays
//! every firing it missed in one batch so its growth does not fall behind.
//! A fully grown plant runs exactly once and is never compensated: its
//! growth is capped so nothing visible is lost, at the cost of delaying
//! side effects such as blight or fire spread for that plant. That lossy
//! trade is where the savings come from.
//!
//! Replays run under [`ExecutionMode::Replaying`]; a gate call in that mode
//! returns "run" without touching any schedule, so the compensator can
//! never recurse into itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{round_up_to_multiple, MAX_PLANT_INTERVAL, MAX_REPLAY_STEPS, TICKS_PER_DAY};
use crate::settings::{clamp_multiplier, PlantSettings};
use crate::{EntityId, Tick};

/// Whether an update call comes from the host cadence or from a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    Normal,
    Replaying,
}

/// A host update that failed while running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UpdateError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantTickState {
    pub last_allowed_tick: Tick,
    pub next_allowed_tick: Tick,
}

/// What the host knows about a plant at a long-tick firing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantFacts {
    pub id: EntityId,
    /// Growth in `[0, 1]`; `>= 1` means fully grown.
    pub growth: f32,
    pub burning: bool,
    pub blighted: bool,
    pub in_home_or_growing_zone: bool,
    /// Shown in warnings.
    pub label: String,
}

impl PlantFacts {
    /// Burning and blighted plants keep native cadence.
    pub fn is_exception(&self) -> bool {
        self.burning || self.blighted
    }

    pub fn is_capped(&self) -> bool {
        self.growth >= 1.0
    }
}

/// Gate result: run the real update now, then replay it `replay_count`
/// more times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredUpdate {
    pub run_now: bool,
    pub replay_count: u32,
}

impl DeferredUpdate {
    const SKIP: Self = Self {
        run_now: false,
        replay_count: 0,
    };
    const ONCE: Self = Self {
        run_now: true,
        replay_count: 0,
    };
}

/// How one plant's firing played out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompensationReport {
    /// Real updates executed (initial run plus successful replays).
    pub updates: u32,
    pub replays: u32,
    pub failed: bool,
}

/// Interval a plant should be deferred to, as a multiple of `native`.
pub fn desired_interval(facts: &PlantFacts, settings: &PlantSettings, native: Tick) -> Tick {
    let target = if facts.is_capped() {
        settings.fully_grown_interval_ticks
    } else {
        let mul = if facts.in_home_or_growing_zone {
            clamp_multiplier(settings.home_area_growing_multiplier, 8.0)
        } else {
            clamp_multiplier(settings.wild_growing_multiplier, 16.0)
        };
        (native as f64 * f64::from(mul)).round() as Tick
    };
    let upper = MAX_PLANT_INTERVAL.max(native);
    round_up_to_multiple(target.clamp(native, upper), native)
}

/// Per-plant deferral state. Persisted with the save, so firings missed
/// across a reload are still replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCompensator {
    state_by_plant: HashMap<EntityId, PlantTickState>,
    #[serde(default)]
    next_cleanup_tick: Tick,
}

impl PlantCompensator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what one cadence firing does.
    ///
    /// `desired` is rounded up to a multiple of `native` so deferred plants
    /// are only ever re-evaluated on cadence boundaries.
    #[allow(clippy::too_many_arguments)]
    pub fn gate(
        &mut self,
        id: EntityId,
        now: Tick,
        native: Tick,
        mode: ExecutionMode,
        is_exception: bool,
        is_capped: bool,
        desired: Tick,
    ) -> DeferredUpdate {
        if mode == ExecutionMode::Replaying {
            return DeferredUpdate::ONCE;
        }
        let native = native.max(1);
        self.maintain(now);

        if is_exception {
            self.touch(id, now, native);
            return DeferredUpdate::ONCE;
        }

        let st = self.state_by_plant.entry(id).or_insert(PlantTickState {
            last_allowed_tick: now,
            next_allowed_tick: now,
        });

        if now < st.next_allowed_tick {
            return DeferredUpdate::SKIP;
        }

        let interval = round_up_to_multiple(desired.max(native), native);
        st.next_allowed_tick = now.saturating_add(interval);

        let replay_count = if is_capped {
            0
        } else {
            let missed = (now.saturating_sub(st.last_allowed_tick) / native).max(1);
            let extra = missed - 1;
            extra.min(Tick::from(MAX_REPLAY_STEPS)) as u32
        };

        st.last_allowed_tick = now;
        DeferredUpdate {
            run_now: true,
            replay_count,
        }
    }

    /// Gate one firing and drive the host update through it.
    ///
    /// `update` is the real long-tick; it receives the execution mode so a
    /// re-entrant call can be recognised. A failing replay stops this
    /// plant's batch and is logged; the caller moves on to the next plant.
    pub fn run<F>(
        &mut self,
        facts: &PlantFacts,
        now: Tick,
        native: Tick,
        settings: &PlantSettings,
        mut update: F,
    ) -> CompensationReport
    where
        F: FnMut(ExecutionMode) -> Result<(), UpdateError>,
    {
        let decision = if settings.enabled {
            let desired = desired_interval(facts, settings, native);
            self.gate(
                facts.id,
                now,
                native,
                ExecutionMode::Normal,
                facts.is_exception(),
                facts.is_capped(),
                desired,
            )
        } else {
            DeferredUpdate::ONCE
        };

        let mut report = CompensationReport::default();
        if !decision.run_now {
            return report;
        }

        if let Err(e) = update(ExecutionMode::Normal) {
            log::warn!("plant long-tick failed for '{}': {}", facts.label, e);
            report.failed = true;
            return report;
        }
        report.updates = 1;

        for _ in 0..decision.replay_count {
            match update(ExecutionMode::Replaying) {
                Ok(()) => {
                    report.updates += 1;
                    report.replays += 1;
                }
                Err(e) => {
                    log::warn!("plant long-tick compensation failed for '{}': {}", facts.label, e);
                    report.failed = true;
                    break;
                }
            }
        }
        report
    }

    fn touch(&mut self, id: EntityId, now: Tick, native: Tick) {
        self.state_by_plant.insert(
            id,
            PlantTickState {
                last_allowed_tick: now,
                next_allowed_tick: now.saturating_add(native),
            },
        );
    }

    pub fn maintain(&mut self, now: Tick) -> usize {
        if now < self.next_cleanup_tick {
            return 0;
        }
        self.next_cleanup_tick = now.saturating_add(TICKS_PER_DAY);
        let cutoff = now.saturating_sub(TICKS_PER_DAY);
        let before = self.state_by_plant.len();
        self.state_by_plant.retain(|_, st| st.next_allowed_tick >= cutoff);
        before - self.state_by_plant.len()
    }

    pub fn state(&self, id: EntityId) -> Option<PlantTickState> {
        self.state_by_plant.get(&id).copied()
    }

    pub fn remove(&mut self, id: EntityId) {
        self.state_by_plant.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.state_by_plant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_by_plant.is_empty()
    }
}
