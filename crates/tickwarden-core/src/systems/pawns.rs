//! Pawn gate system - routes each pawn through the wildlife or prisoner gate

use std::collections::HashMap;

use hecs::World;
use tickwarden_logic::policy::{self, any_within_radius, GroundPos};
use tickwarden_logic::registry::ThrottleRegistry;
use tickwarden_logic::settings::GovernorSettings;
use tickwarden_logic::throttle::{gate_prisoner, gate_wildlife};
use tickwarden_logic::{RegionId, Tick};

use super::StepStats;
use crate::components::{Colonist, InRegion, Pawn, UpdateCounters};

/// Food used per tick, applied in bulk on each full update.
const FOOD_PER_TICK: f32 = 0.000_002;

/// Free colonist positions, per region.
fn colonist_positions(world: &World) -> HashMap<RegionId, Vec<GroundPos>> {
    let mut out: HashMap<RegionId, Vec<GroundPos>> = HashMap::new();
    for (_, (pawn, region, _)) in world.query::<(&Pawn, &InRegion, &Colonist)>().iter() {
        if pawn.facts.spawned && !pawn.facts.dead {
            out.entry(region.0).or_default().push(pawn.facts.position);
        }
    }
    out
}

/// A full update catches the pawn's needs up to `now`.
fn full_update(pawn: &mut Pawn, counters: &mut UpdateCounters, now: Tick) {
    let elapsed = now.saturating_sub(counters.last_full_tick).max(1);
    if let Some(food) = pawn.facts.food.as_mut() {
        *food = (*food - FOOD_PER_TICK * elapsed as f32).max(0.0);
    }
    counters.full_updates += 1;
    counters.last_full_tick = now;
}

/// Gate every pawn for tick `now`.
///
/// Colony prisoners go through the prisoner gate; everything else goes
/// through the wildlife gate, which lets non-wildlife through untouched.
pub fn pawn_gate_system(
    world: &mut World,
    wildlife: &mut ThrottleRegistry,
    prisoners: &mut ThrottleRegistry,
    now: Tick,
    settings: &GovernorSettings,
    stats: &mut StepStats,
) {
    let colonists = colonist_positions(world);

    for (_, (pawn, region, counters)) in
        world.query_mut::<(&mut Pawn, &InRegion, &mut UpdateCounters)>()
    {
        let nearby = colonists.get(&region.0).map(Vec::as_slice).unwrap_or(&[]);
        let pos = pawn.facts.position;
        let near = |radius| any_within_radius(pos, nearby.iter().copied(), radius);

        let decision = if policy::is_prisoner_target(&pawn.facts) {
            gate_prisoner(Some(&mut *prisoners), Some(now), &pawn.facts, &settings.prisoners, near)
        } else {
            gate_wildlife(Some(&mut *wildlife), Some(now), &pawn.facts, &settings.wildlife, near)
        };

        if decision.is_throttled() {
            stats.throttled_updates += 1;
        }
        if decision.runs_full_update() {
            full_update(pawn, counters, now);
            stats.full_updates += 1;
        } else {
            counters.skipped_updates += 1;
            stats.skipped_updates += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwarden_logic::policy::PawnFacts;

    fn spawn(world: &mut World, facts: PawnFacts, colonist: bool) -> hecs::Entity {
        let e = world.spawn((Pawn { facts }, InRegion(0), UpdateCounters::default()));
        if colonist {
            let _ = world.insert_one(e, Colonist);
        }
        e
    }

    fn animal(id: u32, x: i32) -> PawnFacts {
        PawnFacts {
            id,
            spawned: true,
            is_animal: true,
            food: Some(0.9),
            position: GroundPos::new(x, 0),
            ..PawnFacts::default()
        }
    }

    fn colonist(id: u32) -> PawnFacts {
        PawnFacts { id, spawned: true, ..PawnFacts::default() }
    }

    fn run(world: &mut World, ticks: Tick) -> StepStats {
        let mut wildlife = ThrottleRegistry::new();
        let mut prisoners = ThrottleRegistry::new();
        let settings = GovernorSettings::default();
        let mut stats = StepStats::default();
        for now in 0..ticks {
            pawn_gate_system(world, &mut wildlife, &mut prisoners, now, &settings, &mut stats);
        }
        stats
    }

    #[test]
    fn far_animal_is_throttled() {
        let mut world = World::new();
        let e = spawn(&mut world, animal(1, 200), false);
        let _ = spawn(&mut world, colonist(2), true);
        let stats = run(&mut world, 600);

        let counters = *world.get::<&UpdateCounters>(e).unwrap();
        assert_eq!(counters.full_updates, 2);
        assert_eq!(counters.skipped_updates, 598);
        // Every animal decision came from the registry; none of the colonist's did.
        assert_eq!(stats.throttled_updates, 600);
        assert_eq!(stats.full_updates, 602);
    }

    #[test]
    fn animal_near_colonist_never_skips() {
        let mut world = World::new();
        let e = spawn(&mut world, animal(1, 10), false);
        let _ = spawn(&mut world, colonist(2), true);
        let _ = run(&mut world, 600);

        let counters = *world.get::<&UpdateCounters>(e).unwrap();
        assert_eq!(counters.full_updates, 600);
        assert_eq!(counters.skipped_updates, 0);
    }

    #[test]
    fn colonists_never_skip() {
        let mut world = World::new();
        let c = spawn(&mut world, colonist(2), true);
        let stats = run(&mut world, 100);
        assert_eq!(stats.full_updates, 100);
        assert_eq!(stats.throttled_updates, 0);
        assert_eq!(world.get::<&UpdateCounters>(c).unwrap().skipped_updates, 0);
    }

    #[test]
    fn full_update_catches_food_up() {
        let mut pawn = Pawn { facts: animal(1, 0) };
        let mut counters = UpdateCounters { last_full_tick: 0, ..UpdateCounters::default() };
        full_update(&mut pawn, &mut counters, 50_000);
        let food = pawn.facts.food.unwrap();
        assert!((food - 0.8).abs() < 1e-4, "food = {food}");
        assert_eq!(counters.last_full_tick, 50_000);
    }
}
