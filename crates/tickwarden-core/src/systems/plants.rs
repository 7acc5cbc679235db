//! Plant system - long-tick cadence through the deferred-update compensator

use hecs::World;
use tickwarden_logic::compensator::{PlantCompensator, UpdateError};
use tickwarden_logic::constants::TICK_LONG_INTERVAL;
use tickwarden_logic::settings::PlantSettings;
use tickwarden_logic::Tick;

use super::StepStats;
use crate::components::Plant;

/// Whether the plant long-tick cadence fires on `now`.
pub fn is_long_tick(now: Tick) -> bool {
    now % TICK_LONG_INTERVAL == 0
}

/// Fire every plant's long-tick for `now`.
///
/// The real update grows the plant; the compensator decides whether it
/// runs and how many missed long-ticks it replays.
pub fn plant_system(
    world: &mut World,
    compensator: &mut PlantCompensator,
    now: Tick,
    settings: &PlantSettings,
    stats: &mut StepStats,
) {
    for (_, plant) in world.query_mut::<&mut Plant>() {
        let facts = plant.facts.clone();
        let report = compensator.run(&facts, now, TICK_LONG_INTERVAL, settings, |_| {
            if plant.facts.growth.is_nan() {
                return Err(UpdateError(format!("growth of plant {} is not a number", facts.id)));
            }
            plant.grow();
            Ok(())
        });
        stats.plant_updates += u64::from(report.updates);
        stats.plant_replays += u64::from(report.replays);
        if report.failed {
            stats.plant_failures += 1;
        }
    }
}
