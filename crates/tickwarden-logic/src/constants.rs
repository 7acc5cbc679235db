//! Tick cadences, retention windows and clamp ranges.
//!
//! Every interval in this crate is measured in ticks. At normal speed the
//! host runs 60 ticks per real second.

use crate::Tick;

/// Ticks per real second at normal game speed.
pub const TICKS_PER_SECOND: Tick = 60;

/// One in-game day. Also the retention window for every per-entity map and
/// the period between compactions.
pub const TICKS_PER_DAY: Tick = 60_000;

/// Native cadence of the plant long-tick.
pub const TICK_LONG_INTERVAL: Tick = 2_000;

/// Upper bound for any deferred plant interval.
pub const MAX_PLANT_INTERVAL: Tick = 60_000;

/// Hard cap on replayed plant updates in a single firing.
pub const MAX_REPLAY_STEPS: u32 = 64;

pub mod wildlife {
    use crate::Tick;

    /// Skipping a whole pawn tick for longer than this is unsafe.
    pub const MIN_INTERVAL: Tick = 60;
    pub const MAX_INTERVAL: Tick = 300;
    /// Deferral written while an animal is close to colonists.
    pub const NEAR_COLONIST_DEFERRAL: Tick = 60;
    /// Food level below which throttling is disabled outright.
    pub const HUNGER_EMERGENCY: f32 = 0.20;
    /// Food level below which the interval drops to [`MIN_INTERVAL`].
    pub const HUNGER_LOW: f32 = 0.35;
}

pub mod prisoner {
    use crate::Tick;

    pub const MIN_INTERVAL: Tick = 15;
    pub const MAX_INTERVAL: Tick = 600;
    pub const NEAR_COLONIST_DEFERRAL: Tick = 15;
}

pub mod turret {
    use crate::Tick;

    pub const MIN_INTERVAL: Tick = 60;
    pub const MAX_INTERVAL: Tick = 2_000;
    /// Rate limit for verbose per-turret log lines.
    pub const LOG_EVERY_TICKS: Tick = 250;
}

pub mod quest {
    /// Points at or below this are treated as "not provided".
    pub const MIN_POINTS: f32 = 0.01;
    /// Hard ceiling on validations per selection, before the pool-size cap.
    pub const MAX_CHECKS_CEILING: usize = 200;
    /// How long a freshly computed points value may be reused.
    pub const POINTS_FRESH_TICKS: crate::Tick = 120;
    /// Selection slower than this is reported in verbose mode.
    pub const SLOW_SELECTION_MS: u128 = 10;
}

/// Round `value` up to the next multiple of `multiple`.
///
/// A `multiple` of zero leaves the value unchanged.
pub fn round_up_to_multiple(value: Tick, multiple: Tick) -> Tick {
    if multiple == 0 {
        return value;
    }
    match value % multiple {
        0 => value,
        rem => value + (multiple - rem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_exact_multiple_unchanged() {
        assert_eq!(round_up_to_multiple(4_000, TICK_LONG_INTERVAL), 4_000);
    }

    #[test]
    fn round_up_partial_multiple() {
        assert_eq!(round_up_to_multiple(4_001, TICK_LONG_INTERVAL), 6_000);
        assert_eq!(round_up_to_multiple(1, TICK_LONG_INTERVAL), 2_000);
    }

    #[test]
    fn round_up_zero_multiple() {
        assert_eq!(round_up_to_multiple(1234, 0), 1234);
    }
}
