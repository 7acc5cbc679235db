//! Idle-scan caching for player turrets.
//!
//! Target acquisition is the expensive part of a turret tick. While a
//! region has no active threat, a turret keeps a still-valid target without
//! scanning and otherwise scans at most once per idle interval. The
//! region's danger flag is recomputed on its own, slower cadence so that
//! every gate check reads it for free.
//!
//! | Condition | Full scan? |
//! |-----------|------------|
//! | Not a player turret / optimisation off | yes |
//! | Forced target | yes |
//! | No region state | yes (fail open) |
//! | Danger present | yes |
//! | Current target still valid | no, reuse it |
//! | Idle interval elapsed since last scan | yes, and record `now` |
//! | Otherwise | no |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{turret, TICKS_PER_DAY};
use crate::settings::TurretSettings;
use crate::{EntityId, RegionId, Tick};

/// Region-wide "an active threat exists" flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerState {
    pub danger_present: bool,
    pub next_danger_check_tick: Tick,
}

/// Result of a danger refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    NotDue,
    Refreshed { changed: bool },
}

impl DangerState {
    /// Recompute the flag if due, at most once per `interval` ticks.
    ///
    /// `scan` is the expensive hostile-threat query and only runs when a
    /// refresh is due; calling this twice inside one window is a no-op.
    pub fn refresh<F>(&mut self, now: Tick, interval: Tick, scan: F) -> RefreshOutcome
    where
        F: FnOnce() -> bool,
    {
        if now < self.next_danger_check_tick {
            return RefreshOutcome::NotDue;
        }
        self.next_danger_check_tick = now.saturating_add(interval);
        let danger = scan();
        let changed = danger != self.danger_present;
        self.danger_present = danger;
        RefreshOutcome::Refreshed { changed }
    }
}

/// Per-region turret id → last full scan tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCache {
    last_full_scan_tick_by_turret: HashMap<EntityId, Tick>,
    #[serde(default)]
    next_cleanup_tick: Tick,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last allowed full scan; zero for turrets never seen.
    pub fn last_full_scan_tick(&self, turret: EntityId) -> Tick {
        self.last_full_scan_tick_by_turret
            .get(&turret)
            .copied()
            .unwrap_or(0)
    }

    /// Only called right after a genuine full scan has been allowed.
    fn record_full_scan(&mut self, turret: EntityId, now: Tick) {
        self.last_full_scan_tick_by_turret.insert(turret, now);
    }

    pub fn maintain(&mut self, now: Tick) -> usize {
        if now < self.next_cleanup_tick {
            return 0;
        }
        self.next_cleanup_tick = now.saturating_add(TICKS_PER_DAY);
        self.compact(now)
    }

    pub fn compact(&mut self, now: Tick) -> usize {
        let cutoff = now.saturating_sub(TICKS_PER_DAY);
        let before = self.last_full_scan_tick_by_turret.len();
        self.last_full_scan_tick_by_turret
            .retain(|_, last| *last >= cutoff);
        before - self.last_full_scan_tick_by_turret.len()
    }

    pub fn len(&self) -> usize {
        self.last_full_scan_tick_by_turret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_full_scan_tick_by_turret.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Tick)> + '_ {
        self.last_full_scan_tick_by_turret
            .iter()
            .map(|(&id, &tick)| (id, tick))
    }
}

/// All turret state owned by one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTurretState {
    pub region: RegionId,
    pub danger: DangerState,
    pub scans: ScanCache,
}

impl RegionTurretState {
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    /// Per-tick upkeep: danger refresh and scan-cache compaction.
    pub fn tick<F>(&mut self, now: Tick, settings: &TurretSettings, any_active_threat: F)
    where
        F: FnOnce() -> bool,
    {
        if !settings.enabled {
            return;
        }

        let interval = settings
            .danger_refresh_interval_ticks
            .clamp(turret::MIN_INTERVAL, turret::MAX_INTERVAL);
        let was = self.danger.danger_present;
        if let RefreshOutcome::Refreshed { changed: true } =
            self.danger.refresh(now, interval, any_active_threat)
        {
            if settings.verbose_logging {
                log::info!(
                    "region {} danger_present: {} -> {}",
                    self.region,
                    was,
                    self.danger.danger_present
                );
            }
        }

        let evicted = self.scans.maintain(now);
        if evicted > 0 {
            log::debug!("region {} scan cache evicted {} turrets", self.region, evicted);
        }
    }
}

/// What the host knows about a turret's current target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetFacts {
    /// Not destroyed and still spawned.
    pub alive: bool,
    pub same_region: bool,
    /// The attack verb is available and can hit the target from the
    /// turret's position (range and line of fire).
    pub can_hit: bool,
    /// Still an active threat / hostile to the turret's faction.
    pub hostile: bool,
    pub incendiary_weapon: bool,
    pub target_burning: bool,
    /// Mortar-style projectile that flies overhead.
    pub overhead_weapon: bool,
    pub target_under_thick_roof: bool,
}

/// A turret as seen on one target-acquisition call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurretFacts {
    pub id: EntityId,
    pub player_owned: bool,
    pub has_forced_target: bool,
    pub current_target: Option<TargetFacts>,
}

/// Whether the current target may be kept without a fresh scan.
pub fn is_target_still_valid(target: Option<&TargetFacts>) -> bool {
    let Some(t) = target else {
        return false;
    };
    if !t.alive || !t.same_region || !t.can_hit || !t.hostile {
        return false;
    }
    // no incendiary spam on a burning target
    if t.incendiary_weapon && t.target_burning {
        return false;
    }
    if t.overhead_weapon && t.target_under_thick_roof {
        return false;
    }
    true
}

/// Outcome of one target-acquisition gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    NotGoverned,
    ForcedTarget,
    MissingState,
    Danger,
    /// Keep the current target, no scan.
    ReuseTarget,
    /// Idle interval elapsed; scan allowed and recorded.
    FullScan,
    /// Idle interval not elapsed; report no target.
    Throttled,
}

impl ScanDecision {
    pub fn runs_full_scan(self) -> bool {
        !matches!(self, Self::ReuseTarget | Self::Throttled)
    }
}

/// Decide whether the turret runs its real target scan now.
pub fn should_run_full_scan(
    state: Option<&mut RegionTurretState>,
    turret_facts: &TurretFacts,
    now: Tick,
    settings: &TurretSettings,
) -> ScanDecision {
    if !settings.enabled || !turret_facts.player_owned {
        return ScanDecision::NotGoverned;
    }
    if turret_facts.has_forced_target {
        return ScanDecision::ForcedTarget;
    }
    let Some(state) = state else {
        return ScanDecision::MissingState;
    };
    if state.danger.danger_present {
        return ScanDecision::Danger;
    }

    let id = turret_facts.id;
    let chatty = settings.verbose_logging
        && (now + Tick::from(id)) % turret::LOG_EVERY_TICKS == 0;

    if is_target_still_valid(turret_facts.current_target.as_ref()) {
        if chatty {
            log::debug!("turret {id} reusing target (idle mode)");
        }
        return ScanDecision::ReuseTarget;
    }

    let interval = settings
        .idle_scan_interval_ticks
        .clamp(turret::MIN_INTERVAL, turret::MAX_INTERVAL);
    if gate_full_scan(&mut state.scans, id, now, interval, false, false) {
        ScanDecision::FullScan
    } else {
        if chatty {
            log::debug!("turret {id} full scan skipped (idle throttle)");
        }
        ScanDecision::Throttled
    }
}

/// Flat form of the gate for hosts that compute the danger flag and target
/// validity themselves.
///
/// Returns true when a full scan should run. The cache is written only when
/// the idle interval decides (neither danger nor a reusable target), and
/// only on allowance.
pub fn gate_full_scan(
    cache: &mut ScanCache,
    turret_id: EntityId,
    now: Tick,
    interval: Tick,
    danger_present: bool,
    has_valid_target: bool,
) -> bool {
    if danger_present {
        return true;
    }
    if has_valid_target {
        return false;
    }
    let interval = interval.clamp(turret::MIN_INTERVAL, turret::MAX_INTERVAL);
    if now.saturating_sub(cache.last_full_scan_tick(turret_id)) < interval {
        return false;
    }
    cache.record_full_scan(turret_id, now);
    true
}
