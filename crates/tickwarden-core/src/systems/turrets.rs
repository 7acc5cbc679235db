//! Turret systems - region danger upkeep and gated target acquisition

use std::collections::BTreeMap;

use hecs::{Entity, World};
use tickwarden_logic::settings::TurretSettings;
use tickwarden_logic::turret::{should_run_full_scan, RegionTurretState, ScanDecision, TargetFacts};
use tickwarden_logic::{RegionId, Tick};

use super::StepStats;
use crate::components::{Hostile, InRegion, Pawn, Turret};

fn is_active_threat(pawn: &Pawn) -> bool {
    pawn.facts.spawned && !pawn.facts.dead && !pawn.facts.downed
}

/// The expensive query the danger refresh throttles.
pub fn region_has_active_threat(world: &World, region: RegionId) -> bool {
    world
        .query::<(&Pawn, &InRegion, &Hostile)>()
        .iter()
        .any(|(_, (pawn, r, _))| r.0 == region && is_active_threat(pawn))
}

/// Refresh every region's danger flag if due and compact its scan cache.
pub fn danger_refresh_system(
    world: &World,
    regions: &mut BTreeMap<RegionId, RegionTurretState>,
    now: Tick,
    settings: &TurretSettings,
    stats: &mut StepStats,
) {
    for (&region, state) in regions.iter_mut() {
        let before = state.danger.danger_present;
        state.tick(now, settings, || region_has_active_threat(world, region));
        if state.danger.danger_present != before {
            stats.danger_changes += 1;
        }
    }
}

/// Describe `target` as seen from a turret.
fn target_facts(world: &World, turret: &Turret, region: RegionId, target: Entity) -> TargetFacts {
    let Ok(pawn) = world.get::<&Pawn>(target) else {
        return TargetFacts::default();
    };
    let same_region = world
        .get::<&InRegion>(target)
        .map(|r| r.0 == region)
        .unwrap_or(false);
    TargetFacts {
        alive: pawn.facts.spawned && !pawn.facts.dead,
        same_region,
        can_hit: turret.can_reach(pawn.facts.position),
        hostile: world.get::<&Hostile>(target).is_ok() && !pawn.facts.downed,
        ..TargetFacts::default()
    }
}

/// The real target scan: nearest reachable active threat in the region.
fn acquire_target(world: &World, turret: &Turret, region: RegionId) -> Option<Entity> {
    world
        .query::<(&Pawn, &InRegion, &Hostile)>()
        .iter()
        .filter(|(_, (pawn, r, _))| r.0 == region && is_active_threat(pawn))
        .filter(|(_, (pawn, _, _))| turret.can_reach(pawn.facts.position))
        .min_by_key(|(_, (pawn, _, _))| turret.position.distance_sq(pawn.facts.position))
        .map(|(e, _)| e)
}

/// Run target acquisition for every turret on tick `now`.
///
/// Turrets in a region without turret state fail open and always scan.
pub fn turret_system(
    world: &mut World,
    regions: &mut BTreeMap<RegionId, RegionTurretState>,
    now: Tick,
    settings: &TurretSettings,
    stats: &mut StepStats,
) {
    let mut outcomes: Vec<(Entity, Option<Entity>, ScanDecision)> = Vec::new();

    {
        let world_ref: &World = world;
        for (entity, (turret, region)) in world_ref.query::<(&Turret, &InRegion)>().iter() {
            let mut facts = turret.facts;
            facts.current_target = turret
                .target
                .map(|t| target_facts(world_ref, turret, region.0, t));

            let decision = should_run_full_scan(regions.get_mut(&region.0), &facts, now, settings);
            let target = match decision {
                ScanDecision::ReuseTarget => turret.target,
                ScanDecision::Throttled => None,
                _ => acquire_target(world_ref, turret, region.0),
            };
            outcomes.push((entity, target, decision));
        }
    }

    for (entity, target, decision) in outcomes {
        let Ok(mut turret) = world.get::<&mut Turret>(entity) else {
            continue;
        };
        turret.target = target;
        match decision {
            ScanDecision::ReuseTarget => stats.targets_reused += 1,
            ScanDecision::Throttled => stats.scans_skipped += 1,
            _ => {
                turret.full_scans += 1;
                stats.scans_run += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwarden_logic::policy::{GroundPos, PawnFacts};
    use tickwarden_logic::turret::TurretFacts;

    fn turret(id: u32) -> Turret {
        Turret {
            facts: TurretFacts { id, player_owned: true, ..TurretFacts::default() },
            position: GroundPos::new(0, 0),
            range: 20,
            target: None,
            full_scans: 0,
        }
    }

    fn raider(world: &mut World, x: i32) -> Entity {
        let facts = PawnFacts {
            id: 99,
            spawned: true,
            position: GroundPos::new(x, 0),
            ..PawnFacts::default()
        };
        world.spawn((Pawn { facts }, InRegion(0), Hostile))
    }

    fn settings() -> TurretSettings {
        TurretSettings::default()
    }

    fn run(
        world: &mut World,
        regions: &mut BTreeMap<RegionId, RegionTurretState>,
        from: Tick,
        to: Tick,
    ) -> StepStats {
        let s = settings();
        let mut stats = StepStats::default();
        for now in from..to {
            danger_refresh_system(world, regions, now, &s, &mut stats);
            turret_system(world, regions, now, &s, &mut stats);
        }
        stats
    }

    #[test]
    fn idle_turret_scans_once_per_interval() {
        let mut world = World::new();
        let t = world.spawn((turret(1), InRegion(0)));
        let mut regions = BTreeMap::from([(0, RegionTurretState::new(0))]);

        // Tick 0 reads a default-zero scan tick, so the first scan is at 500.
        let stats = run(&mut world, &mut regions, 0, 1_000);
        assert_eq!(stats.scans_run, 1);
        assert_eq!(stats.scans_skipped, 999);
        assert_eq!(world.get::<&Turret>(t).unwrap().full_scans, 1);
    }

    #[test]
    fn danger_forces_scans_and_acquires() {
        let mut world = World::new();
        let t = world.spawn((turret(1), InRegion(0)));
        let r = raider(&mut world, 10);
        let mut regions = BTreeMap::from([(0, RegionTurretState::new(0))]);

        let stats = run(&mut world, &mut regions, 0, 10);
        assert_eq!(stats.danger_changes, 1);
        assert_eq!(stats.scans_run, 10);
        assert_eq!(world.get::<&Turret>(t).unwrap().target, Some(r));
    }

    #[test]
    fn valid_target_is_reused_without_scan() {
        let mut world = World::new();
        let t = world.spawn((turret(1), InRegion(0)));
        let r = raider(&mut world, 10);
        let mut regions = BTreeMap::from([(0, RegionTurretState::new(0))]);
        let _ = run(&mut world, &mut regions, 0, 1);

        // Danger flag dropped by hand; the raider is still a valid target.
        regions.get_mut(&0).unwrap().danger.danger_present = false;
        let s = settings();
        let mut stats = StepStats::default();
        turret_system(&mut world, &mut regions, 5, &s, &mut stats);
        assert_eq!(stats.targets_reused, 1);
        assert_eq!(world.get::<&Turret>(t).unwrap().target, Some(r));
        assert!(regions[&0].scans.is_empty());
    }

    #[test]
    fn missing_region_state_fails_open() {
        let mut world = World::new();
        let _ = world.spawn((turret(1), InRegion(7)));
        let mut regions = BTreeMap::new();
        let stats = run(&mut world, &mut regions, 0, 50);
        assert_eq!(stats.scans_run, 50);
    }

    #[test]
    fn dead_target_is_dropped() {
        let mut world = World::new();
        let t = world.spawn((turret(1), InRegion(0)));
        let r = raider(&mut world, 10);
        let mut regions = BTreeMap::from([(0, RegionTurretState::new(0))]);
        let _ = run(&mut world, &mut regions, 0, 1);
        world.get::<&mut Pawn>(r).unwrap().facts.dead = true;

        regions.get_mut(&0).unwrap().danger.danger_present = false;
        let s = settings();
        let mut stats = StepStats::default();
        turret_system(&mut world, &mut regions, 600, &s, &mut stats);
        assert_eq!(stats.scans_run, 1);
        assert_eq!(world.get::<&Turret>(t).unwrap().target, None);
    }
}
