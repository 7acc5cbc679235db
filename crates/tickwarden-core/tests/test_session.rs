//! Session-level behavior: a generated colony run through every system.

use tickwarden_core::generation::ColonyConfig;
use tickwarden_core::persistence::{SaveError, SAVE_VERSION};
use tickwarden_core::prelude::*;
use tickwarden_logic::constants::TICKS_PER_DAY;

// ── Helpers ─────────────────────────────────────────────────────────────

fn session(seed: u64) -> GovernorSession {
    let mut s = GovernorSession::new(GovernorSettings::default(), seed);
    let _ = s.generate(&ColonyConfig {
        regions: 2,
        wild_animals: 60,
        predator_fraction: 0.0,
        crops: 30,
        wild_plants: 60,
        world_pawns: 24,
        ..ColonyConfig::default()
    });
    s
}

// ── Tests ───────────────────────────────────────────────────────────────

#[test]
fn same_seed_same_stats() {
    let a = session(11).run(2_000);
    let b = session(11).run(2_000);
    assert_eq!(a, b);
}

#[test]
fn governed_day_skips_most_work() {
    let mut s = session(12);
    let stats = s.run(TICKS_PER_DAY);

    assert!(stats.skip_ratio() > 0.5, "skip ratio {}", stats.skip_ratio());
    assert!(stats.scans_skipped > stats.scans_run);
    assert_eq!(stats.danger_changes, 0);
    assert_eq!(stats.plant_failures, 0);
    assert!(stats.plant_updates > 0);
}

#[test]
fn registries_stay_bounded_over_many_days() {
    let mut s = session(13);
    let _ = s.run(3 * TICKS_PER_DAY);

    // Every wildlife entry belongs to a live animal; nothing accumulates.
    assert!(s.wildlife_registry().len() <= 120);
    assert!(s.prisoner_registry().len() <= 8);
}

#[test]
fn raid_in_one_region_leaves_the_other_idle() {
    let mut s = session(14);
    let _ = s.run(100);
    let _ = s.spawn_raider(1);
    let _ = s.run(1_000);

    assert!(s.region(1).unwrap().danger.danger_present);
    assert!(!s.region(0).unwrap().danger.danger_present);
}

#[test]
fn restored_session_continues_identically() {
    let mut original = session(15);
    let _ = original.run(1_500);
    let mut buf = Vec::new();
    original.save(&mut buf).expect("save");

    // Same world, same seed, restored governor state.
    let mut restored = session(15);
    let _ = restored.run(1_500);
    restored.load(&buf[..]).expect("load");

    assert_eq!(restored.tick(), original.tick());
    assert_eq!(restored.wildlife_registry(), original.wildlife_registry());

    // Pawn gates and turrets only depend on persisted state, so the next
    // short stretch (before any long-tick) matches.
    let a = original.run(100);
    let b = restored.run(100);
    assert_eq!(a.full_updates, b.full_updates);
    assert_eq!(a.skipped_updates, b.skipped_updates);
    assert_eq!(a.scans_run, b.scans_run);
}

#[test]
fn plants_catch_up_after_reload() {
    let config = ColonyConfig {
        colonists: 0,
        wild_animals: 0,
        prisoners: 0,
        turrets: 0,
        crops: 0,
        wild_plants: 50,
        world_pawns: 0,
        ..ColonyConfig::default()
    };
    let fresh = || {
        let mut s = GovernorSession::new(GovernorSettings::default(), 77);
        let _ = s.generate(&config);
        s
    };

    let mut original = fresh();
    let _ = original.run(7_000);
    let mut buf = Vec::new();
    original.save(&mut buf).expect("save");

    // The host restores its own world; the governor restores the rest.
    let mut restored = fresh();
    for (entity, plant) in original.world.query::<&Plant>().iter() {
        *restored.world.get::<&mut Plant>(entity).unwrap() = plant.clone();
    }
    restored.load(&buf[..]).expect("load");
    assert_eq!(restored.plant_compensator(), original.plant_compensator());

    let _ = original.run(27_001);
    let _ = restored.run(27_001);
    let long_ticks = |s: &GovernorSession| -> u64 {
        s.world.query::<&Plant>().iter().map(|(_, p)| p.long_ticks).sum()
    };
    assert_eq!(long_ticks(&restored), long_ticks(&original));
}

#[test]
fn loading_a_newer_save_is_rejected() {
    let mut buf = Vec::new();
    session(16).save(&mut buf).expect("save");
    // Version is the leading little-endian u32.
    buf[..4].copy_from_slice(&(SAVE_VERSION + 1).to_le_bytes());

    let mut s = session(16);
    match s.load(&buf[..]) {
        Err(SaveError::VersionMismatch { found, .. }) => assert_eq!(found, SAVE_VERSION + 1),
        other => panic!("expected version mismatch, got {other:?}"),
    }
    assert_eq!(s.tick(), 0);
}

#[test]
fn settings_are_sanitized() {
    let mut settings = GovernorSettings::default();
    settings.wildlife.interval_ticks = 5;
    let s = GovernorSession::new(settings, 1);
    assert_eq!(s.settings().wildlife.interval_ticks, 60);
}
