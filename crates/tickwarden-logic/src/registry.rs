//! Bounded map from entity identity to "next eligible tick".
//!
//! One registry is constructed per throttled population (wildlife,
//! prisoners) and owned by the session. An entity absent from the map is
//! eligible now; entries are created lazily by [`ThrottleRegistry::record_deferral`]
//! and compacted once per in-game day, so the map stays bounded over an
//! arbitrarily long session. Entity ids are never reused while the entity
//! exists, so dropping an entry whose tick is a day stale can never cause a
//! wrong decision: at worst the entity gets one extra full update.
//!
//! ```
//! use tickwarden_logic::registry::ThrottleRegistry;
//!
//! let mut registry = ThrottleRegistry::new();
//! assert!(registry.can_proceed(7, 1000));
//! registry.record_deferral(7, 1000, 100);
//! assert!(!registry.can_proceed(7, 1099));
//! assert!(registry.can_proceed(7, 1100));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::TICKS_PER_DAY;
use crate::{EntityId, Tick};

/// Per-population throttle state. Persisted verbatim across save/load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleRegistry {
    next_tick_by_entity: HashMap<EntityId, Tick>,
    #[serde(default)]
    next_cleanup_tick: Tick,
}

impl ThrottleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the entity has no entry or `now` has reached its next
    /// eligible tick.
    pub fn can_proceed(&self, id: EntityId, now: Tick) -> bool {
        match self.next_tick_by_entity.get(&id) {
            Some(&next) => now >= next,
            None => true,
        }
    }

    /// Defer the entity's next full update to `now + interval`.
    ///
    /// Must follow a [`can_proceed`](Self::can_proceed) check in the same
    /// decision.
    pub fn record_deferral(&mut self, id: EntityId, now: Tick, interval: Tick) {
        self.next_tick_by_entity.insert(id, now.saturating_add(interval));
    }

    /// Compact if the daily cleanup is due. Returns the number of evicted
    /// entries. Safe to call every tick; a late call simply evicts more.
    pub fn maintain(&mut self, now: Tick) -> usize {
        if now < self.next_cleanup_tick {
            return 0;
        }
        self.next_cleanup_tick = now.saturating_add(TICKS_PER_DAY);
        self.compact(now)
    }

    /// Drop every entry whose next eligible tick is more than a day old.
    pub fn compact(&mut self, now: Tick) -> usize {
        let cutoff = now.saturating_sub(TICKS_PER_DAY);
        let before = self.next_tick_by_entity.len();
        self.next_tick_by_entity.retain(|_, next| *next >= cutoff);
        before - self.next_tick_by_entity.len()
    }

    /// Forget an entity, e.g. when the host destroys it.
    pub fn remove(&mut self, id: EntityId) -> Option<Tick> {
        self.next_tick_by_entity.remove(&id)
    }

    pub fn next_eligible(&self, id: EntityId) -> Option<Tick> {
        self.next_tick_by_entity.get(&id).copied()
    }

    pub fn next_cleanup_tick(&self) -> Tick {
        self.next_cleanup_tick
    }

    pub fn len(&self) -> usize {
        self.next_tick_by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_tick_by_entity.is_empty()
    }

    /// Iterate `(entity, next eligible tick)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Tick)> + '_ {
        self.next_tick_by_entity.iter().map(|(&id, &tick)| (id, tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_entity_can_proceed() {
        let registry = ThrottleRegistry::new();
        for id in [0, 1, 42, u32::MAX] {
            assert!(registry.can_proceed(id, 0));
            assert!(registry.can_proceed(id, 123_456));
        }
    }

    #[test]
    fn deferral_blocks_until_interval_elapses() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(5, 1000, 100);
        assert!(!registry.can_proceed(5, 1000));
        assert!(!registry.can_proceed(5, 1099));
        assert!(registry.can_proceed(5, 1100));
        assert!(registry.can_proceed(5, 5000));
    }

    #[test]
    fn deferral_property_over_range() {
        let mut registry = ThrottleRegistry::new();
        for (id, now, interval) in [(1, 0, 1), (2, 59, 60), (3, 10_000, 300), (4, 1, 7_200)] {
            registry.record_deferral(id, now, interval);
            assert!(!registry.can_proceed(id, now + interval - 1));
            assert!(registry.can_proceed(id, now + interval));
        }
    }

    #[test]
    fn deferral_overwrites_previous_entry() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(9, 0, 1_000);
        registry.record_deferral(9, 10, 5);
        assert_eq!(registry.next_eligible(9), Some(15));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn deferral_saturates_instead_of_wrapping() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(1, Tick::MAX - 1, 100);
        assert_eq!(registry.next_eligible(1), Some(Tick::MAX));
    }

    #[test]
    fn compact_removes_only_stale_entries() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(1, 0, 100); // next = 100
        registry.record_deferral(2, 70_000, 100); // next = 70_100
        let removed = registry.compact(100_000); // cutoff 40_000
        assert_eq!(removed, 1);
        assert_eq!(registry.next_eligible(1), None);
        assert_eq!(registry.next_eligible(2), Some(70_100));
    }

    #[test]
    fn compact_early_in_session_keeps_everything() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(1, 0, 0);
        assert_eq!(registry.compact(500), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn maintain_runs_once_per_day() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(1, 0, 10);
        assert_eq!(registry.maintain(0), 0);
        assert_eq!(registry.next_cleanup_tick(), TICKS_PER_DAY);

        // Stale now, but cleanup not yet due.
        assert_eq!(registry.maintain(TICKS_PER_DAY - 1), 0);
        assert_eq!(registry.len(), 1);

        // Due (late): evicts, reschedules from the observed tick.
        assert_eq!(registry.maintain(TICKS_PER_DAY + 500), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.next_cleanup_tick(), 2 * TICKS_PER_DAY + 500);
    }

    #[test]
    fn remove_forgets_entity() {
        let mut registry = ThrottleRegistry::new();
        registry.record_deferral(3, 0, 1_000);
        assert_eq!(registry.remove(3), Some(1_000));
        assert!(registry.can_proceed(3, 1));
    }
}
