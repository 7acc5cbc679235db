//! Tickwarden Headless Simulation Harness
//!
//! Runs a synthetic colony through a governor session and checks the
//! guarantees the governor makes: bounded deferrals, fail-open turrets,
//! plants that never lose growth, quest picks that always validate.
//!
//! Usage:
//!   cargo run -p tickwarden-simtest
//!   cargo run -p tickwarden-simtest -- --verbose --ticks 120000
//!   cargo run -p tickwarden-simtest -- --settings governor.json --json

use std::cell::Cell;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tickwarden_core::generation::ColonyConfig;
use tickwarden_core::prelude::*;
use tickwarden_logic::constants::{prisoner, wildlife, TICK_LONG_INTERVAL};
use tickwarden_logic::mapclean::MapCleanup;
use tickwarden_logic::quest::{LayerDef, QuestChoice, QuestDef, QuestHost, ANCIENT_COMPLEX_NAMES};
use tickwarden_logic::sampler::Validation;
use tickwarden_logic::Tick;

#[derive(Parser, Debug)]
#[command(name = "tickwarden-simtest")]
#[command(about = "Headless governor harness")]
struct Cli {
    /// Print every check, not just failures
    #[arg(long)]
    verbose: bool,
    /// JSON governor settings; missing fields keep their defaults
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Emit the results as JSON after the summary
    #[arg(long)]
    json: bool,
    /// Ticks to simulate for the long-running checks
    #[arg(long, default_value_t = 60_000)]
    ticks: u64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    seed: u64,
    ticks: u64,
    passed: usize,
    failed: usize,
    results: &'a [TestResult],
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<GovernorSettings, String> {
    let Some(path) = path else {
        return Ok(GovernorSettings::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let settings = match load_settings(cli.settings.as_ref()) {
        Ok(s) => s.sanitized(),
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            std::process::exit(2);
        }
    };
    let verbose = cli.verbose;
    let ticks = cli.ticks.max(TICK_LONG_INTERVAL * 4);
    println!("=== Tickwarden Simulation Harness ===\n");
    log::info!("seed {}, {} ticks", cli.seed, ticks);

    let mut results = Vec::new();

    // 1. Settings
    results.extend(validate_settings(&settings, verbose));

    // 2. Wildlife & prisoner gates
    results.extend(validate_pawn_gates(&settings, cli.seed, ticks, verbose));

    // 3. Turret scan cache
    results.extend(validate_turrets(&settings, cli.seed, verbose));

    // 4. Plant compensation
    results.extend(validate_plants(&settings, cli.seed, ticks, verbose));

    // 5. Quest selection
    results.extend(validate_quests(&settings, cli.seed, verbose));

    // 6. World pawn and map cleanup
    results.extend(validate_cleanup(&settings, cli.seed, verbose));

    // 7. Save/load
    results.extend(validate_persistence(&settings, cli.seed, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if cli.json {
        let report = Report {
            seed: cli.seed,
            ticks,
            passed,
            failed,
            results: &results,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to encode report: {e}"),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn colony() -> ColonyConfig {
    ColonyConfig {
        regions: 2,
        ..ColonyConfig::default()
    }
}

fn session(settings: &GovernorSettings, seed: u64) -> GovernorSession {
    let mut s = GovernorSession::new(settings.clone(), seed);
    let _ = s.generate(&colony());
    s
}

// ── 1. Settings ─────────────────────────────────────────────────────────

fn validate_settings(settings: &GovernorSettings, verbose: bool) -> Vec<TestResult> {
    println!("--- Settings ---");
    let mut results = Vec::new();

    results.push(check(
        "settings_idempotent",
        settings.sanitized() == *settings,
        "sanitizing twice changes nothing",
    ));

    let json = serde_json::to_string(settings).unwrap_or_default();
    let back: Option<GovernorSettings> = serde_json::from_str(&json).ok();
    results.push(check(
        "settings_json_roundtrip",
        back.as_ref() == Some(settings),
        format!("{} bytes of JSON", json.len()),
    ));

    let w = &settings.wildlife;
    results.push(check(
        "settings_wildlife_interval",
        (wildlife::MIN_INTERVAL..=7_200).contains(&w.interval_ticks),
        format!("{} ticks (effective cap {})", w.interval_ticks, wildlife::MAX_INTERVAL),
    ));

    if verbose {
        println!("  wildlife: {:?}", settings.wildlife);
        println!("  prisoners: {:?}", settings.prisoners);
        println!("  turrets: {:?}", settings.turrets);
        println!("  plants: {:?}", settings.plants);
        println!("  quests: {:?}", settings.quests);
    }

    results
}

// ── 2. Pawn Gates ───────────────────────────────────────────────────────

fn validate_pawn_gates(
    settings: &GovernorSettings,
    seed: u64,
    ticks: u64,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Wildlife & Prisoner Gates ---");
    let mut results = Vec::new();

    let mut s = session(settings, seed);
    let stats = s.run(ticks);
    let now = s.tick();

    if settings.wildlife.enabled {
        results.push(check(
            "pawn_updates_skipped",
            stats.skip_ratio() > 0.3,
            format!("{:.1}% of pawn updates skipped", stats.skip_ratio() * 100.0),
        ));
    } else {
        results.push(check(
            "pawn_updates_skipped",
            s.wildlife_registry().is_empty(),
            "wildlife gating disabled, registry untouched",
        ));
    }

    // A deferral is never longer than the effective interval cap.
    let too_far: Vec<_> = s
        .wildlife_registry()
        .iter()
        .filter(|&(_, next)| next > now + wildlife::MAX_INTERVAL)
        .collect();
    results.push(check(
        "wildlife_deferral_bounded",
        too_far.is_empty(),
        format!("{} entries, {} beyond cap", s.wildlife_registry().len(), too_far.len()),
    ));

    let prisoners_too_far = s
        .prisoner_registry()
        .iter()
        .filter(|&(_, next)| next > now + prisoner::MAX_INTERVAL)
        .count();
    results.push(check(
        "prisoner_deferral_bounded",
        prisoners_too_far == 0,
        format!("{} entries, {} beyond cap", s.prisoner_registry().len(), prisoners_too_far),
    ));

    let colonist_skips: u64 = s
        .world
        .query::<(&Colonist, &UpdateCounters)>()
        .iter()
        .map(|(_, (_, c))| c.skipped_updates)
        .sum();
    results.push(check(
        "colonists_never_skipped",
        colonist_skips == 0,
        format!("{} colonist skips", colonist_skips),
    ));

    let animals = s
        .world
        .query::<&Pawn>()
        .iter()
        .filter(|(_, p)| p.facts.is_animal)
        .count();
    results.push(check(
        "wildlife_registry_bounded",
        s.wildlife_registry().len() <= animals,
        format!("{} entries for {} animals", s.wildlife_registry().len(), animals),
    ));

    // Every far, well-fed animal still updates at least once per cap.
    let worst_gap = s
        .world
        .query::<(&Pawn, &UpdateCounters)>()
        .iter()
        .filter(|(_, (p, _))| p.facts.is_animal)
        .map(|(_, (_, c))| now.saturating_sub(c.last_full_tick))
        .max()
        .unwrap_or(0);
    results.push(check(
        "wildlife_update_gap",
        worst_gap <= wildlife::MAX_INTERVAL,
        format!("longest gap since last full update: {} ticks", worst_gap),
    ));

    if verbose {
        println!(
            "  {} full updates, {} skipped over {} ticks",
            stats.full_updates, stats.skipped_updates, ticks
        );
    }

    results
}

// ── 3. Turrets ──────────────────────────────────────────────────────────

fn validate_turrets(settings: &GovernorSettings, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Turret Scan Cache ---");
    let mut results = Vec::new();
    let t = &settings.turrets;

    let mut s = session(settings, seed);
    let idle_ticks = t.idle_scan_interval_ticks * 4;
    let idle = s.run(idle_ticks);
    let turrets = s.world.query::<&Turret>().iter().count() as u64;

    if t.enabled {
        let cap = turrets * (idle_ticks / t.idle_scan_interval_ticks + 1);
        results.push(check(
            "turret_idle_scans_bounded",
            idle.scans_run <= cap,
            format!(
                "{} scans for {} turrets over {} ticks (cap {})",
                idle.scans_run, turrets, idle_ticks, cap
            ),
        ));
    } else {
        results.push(check(
            "turret_idle_scans_bounded",
            idle.scans_run == turrets * idle_ticks,
            "turret gating disabled, every turret scans every tick",
        ));
    }

    let _ = s.spawn_raider(0);
    let _ = s.run(t.danger_refresh_interval_ticks + 1);
    let danger = s.region(0).map(|r| r.danger.danger_present).unwrap_or(false);
    results.push(check(
        "turret_danger_detected",
        !t.enabled || danger,
        format!("region 0 danger flag {} within one refresh interval", danger),
    ));

    let region_turrets = s
        .world
        .query::<(&Turret, &InRegion)>()
        .iter()
        .filter(|(_, (_, r))| r.0 == 0)
        .count() as u64;
    let mut under_threat = StepStats::default();
    for _ in 0..10 {
        under_threat += s.step();
    }
    // Region 1 stays idle, so only region 0's turrets are accounted for here.
    let region_zero_work = under_threat.scans_run + under_threat.targets_reused;
    results.push(check(
        "turret_never_throttled_in_danger",
        region_zero_work >= 10 * region_turrets,
        format!(
            "{} scans + {} reuses over 10 ticks",
            under_threat.scans_run, under_threat.targets_reused
        ),
    ));

    let _ = s.remove_region(1);
    let full_scans = |s: &GovernorSession| -> u64 {
        s.world.query::<&Turret>().iter().map(|(_, turret)| turret.full_scans).sum()
    };
    let before = full_scans(&s);
    let _ = s.step();
    let after = full_scans(&s);
    results.push(check(
        "turret_missing_state_fails_open",
        after - before >= turrets - region_turrets,
        format!("{} scans on the tick after region 1 lost its state", after - before),
    ));

    if verbose {
        println!("  idle: {} scans run, {} skipped", idle.scans_run, idle.scans_skipped);
    }

    results
}

// ── 4. Plants ───────────────────────────────────────────────────────────

fn validate_plants(
    settings: &GovernorSettings,
    seed: u64,
    ticks: u64,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Plant Compensation ---");
    let mut results = Vec::new();

    let mut s = session(settings, seed);
    let stats = s.run(ticks);
    let firings = ticks / TICK_LONG_INTERVAL;

    // A growing plant may be waiting on at most one deferral window.
    let p = &settings.plants;
    let slowest = p.wild_growing_multiplier.max(p.home_area_growing_multiplier);
    let max_pending = (slowest.ceil() as u64).max(1);
    let mut behind = 0;
    let mut growing = 0;
    for (_, plant) in s.world.query::<&Plant>().iter() {
        if plant.facts.is_capped() {
            continue;
        }
        growing += 1;
        if plant.long_ticks + max_pending < firings {
            behind += 1;
        }
    }
    results.push(check(
        "plant_growth_not_lost",
        behind == 0,
        format!(
            "{} of {} growing plants behind by more than {} long-ticks",
            behind, growing, max_pending
        ),
    ));

    results.push(check(
        "plant_no_failures",
        stats.plant_failures == 0,
        format!("{} failures", stats.plant_failures),
    ));

    let plants = s.world.query::<&Plant>().iter().count() as u64;
    if settings.plants.enabled {
        results.push(check(
            "plant_updates_batched",
            stats.plant_updates < plants * firings,
            format!(
                "{} real updates + {} replays for {} plants x {} firings",
                stats.plant_updates, stats.plant_replays, plants, firings
            ),
        ));
    }

    results.push(check(
        "plant_state_bounded",
        s.plant_compensator().len() as u64 <= plants,
        format!("{} compensator entries", s.plant_compensator().len()),
    ));

    if verbose {
        println!("  {} growing plants checked over {} firings", growing, firings);
    }

    results
}

// ── 5. Quests ───────────────────────────────────────────────────────────

/// Synthetic storyteller: every fifth regular quest can run.
struct SimHost {
    defs: Vec<QuestDef>,
    layer: LayerDef,
    now: Cell<Tick>,
    threat: Cell<f32>,
    regular_runnable: bool,
    can_run_calls: Cell<usize>,
}

impl SimHost {
    fn new(regular_runnable: bool) -> Self {
        let mut defs = Vec::new();
        for i in 0..40 {
            defs.push(QuestDef {
                name: format!("Quest_{i}"),
                root_random_selected: true,
                increases_population: i % 8 == 0,
                can_occur_on_all_layers: true,
                layer_whitelist: Vec::new(),
            });
        }
        defs.push(QuestDef {
            name: ANCIENT_COMPLEX_NAMES[0].into(),
            ..QuestDef::default()
        });
        Self {
            defs,
            layer: LayerDef { name: "Surface".into(), ..LayerDef::default() },
            now: Cell::new(1_000),
            threat: Cell::new(350.0),
            regular_runnable,
            can_run_calls: Cell::new(0),
        }
    }

    fn runnable(&self, index: usize) -> bool {
        let quest = &self.defs[index];
        if quest.name.starts_with("Quest_") {
            self.regular_runnable && index % 5 == 0
        } else {
            true
        }
    }
}

impl QuestHost for SimHost {
    fn quest_defs(&self) -> &[QuestDef] {
        &self.defs
    }

    fn layer(&self) -> Option<&LayerDef> {
        Some(&self.layer)
    }

    fn now(&self) -> Tick {
        self.now.get()
    }

    fn selection_weight(&self, quest: &QuestDef, _points: f32) -> f32 {
        1.0 + quest.name.len() as f32 % 3.0
    }

    fn can_run(&self, quest: &QuestDef, _points: f32) -> Validation {
        self.can_run_calls.set(self.can_run_calls.get() + 1);
        match self.defs.iter().position(|q| q.name == quest.name) {
            Some(i) if self.runnable(i) => Validation::Valid,
            Some(_) => Validation::Invalid,
            None => Validation::Error(format!("unknown quest {}", quest.name)),
        }
    }

    fn threat_points(&self) -> Option<f32> {
        Some(self.threat.get())
    }

    fn population_increasing_chance(&self) -> f32 {
        0.2
    }
}

fn validate_quests(settings: &GovernorSettings, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Quest Selection ---");
    let mut results = Vec::new();
    let q = &settings.quests;
    if !q.enabled || !q.use_fast_chooser {
        results.push(check("quest_fast_chooser", true, "fast chooser disabled, host chooser used"));
        return results;
    }

    let mut s = GovernorSession::new(settings.clone(), seed);
    let host = SimHost::new(true);
    let rounds = 200;
    let mut chosen = 0;
    let mut invalid = 0;
    for _ in 0..rounds {
        if let QuestChoice::Chosen { index, .. } = s.choose_quest(&host, 500.0) {
            chosen += 1;
            if !host.runnable(index) {
                invalid += 1;
            }
        }
    }
    results.push(check(
        "quest_picks_validate",
        invalid == 0,
        format!("{} of {} selections chose a quest, {} invalid", chosen, rounds, invalid),
    ));

    // Each selection pays for at most two pools of checks plus the fallback.
    let budget = rounds * (2 * q.max_checks_per_selection + host.defs.len());
    results.push(check(
        "quest_checks_bounded",
        host.can_run_calls.get() <= budget,
        format!("{} can-run checks for {} selections", host.can_run_calls.get(), rounds),
    ));

    let blocked = SimHost::new(false);
    let fallback = s.choose_quest(&blocked, 500.0);
    let expected = blocked.defs.len() - 1;
    results.push(check(
        "quest_ancient_complex_fallback",
        !q.use_ancient_complex_fallback
            || fallback == QuestChoice::Chosen { index: expected, points: 500.0 },
        format!("{:?}", fallback),
    ));

    let repaired = s.choose_quest(&host, 0.0);
    results.push(check(
        "quest_zero_points_repaired",
        (repaired.points() - 350.0).abs() < f32::EPSILON,
        format!("selection at 0 points ran with {:.1}", repaired.points()),
    ));

    if q.normalize_zero_points {
        // Threat moves, but a request right after the selection reuses
        // the remembered value.
        host.threat.set(900.0);
        host.now.set(host.now.get() + 60);
        let reused = s.normalize_generation_points(&host, None);
        host.now.set(host.now.get() + 600);
        let fresh = s.normalize_generation_points(&host, Some(0.0));
        let untouched = s.normalize_generation_points(&host, Some(120.0));
        results.push(check(
            "quest_generation_points",
            reused == Some(350.0) && fresh == Some(900.0) && untouched.is_none(),
            format!("reused {:?}, fresh {:?}, valid request {:?}", reused, fresh, untouched),
        ));
    }

    if verbose {
        println!("  {} can-run checks total", host.can_run_calls.get());
    }

    results
}

// ── 6. Cleanup ──────────────────────────────────────────────────────────

fn validate_cleanup(settings: &GovernorSettings, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- World Pawn Cleanup ---");
    let mut results = Vec::new();

    let mut s = session(settings, seed);
    let before = s.world_pawn_count();
    let report = s.clean_world_pawns(false);
    let kept = s.world_pawn_count();
    results.push(check(
        "cleanup_keeps_blocked",
        report.failed == 0 && kept == before - report.removed && kept > 0,
        format!("removed {} of {}, kept {}", report.removed, before, kept),
    ));

    let family = s.clean_world_pawns(true);
    results.push(check(
        "cleanup_include_family",
        family.removed > 0 && s.world_pawn_count() < kept,
        format!("family pass removed {}", family.removed),
    ));

    let again = s.clean_world_pawns(true);
    results.push(check(
        "cleanup_idempotent",
        again.removed == 0,
        format!("second family pass removed {}", again.removed),
    ));

    let picked = s.world_pawn_labels().into_iter().find(|(_, label)| label.contains('['));
    let picked_ok = match picked {
        Some((entity, _)) => s.clean_world_pawn(entity).is_ok(),
        None => false,
    };
    results.push(check(
        "cleanup_selected_pawn",
        picked_ok,
        format!("{} world pawns left after removing one by hand", s.world_pawn_count()),
    ));

    let categories = [
        MapCleanup::ChunksAndSlag,
        MapCleanup::ForeignCorpses,
        MapCleanup::Filth,
        MapCleanup::RaidTrash,
    ];
    let on_map = s.map_thing_count(0);
    let mut deleted = 0;
    let mut failed = 0;
    for category in categories {
        let report = s.clean_map(0, category);
        deleted += report.removed();
        failed += report.failed;
    }
    let left = s.map_thing_count(0);
    let repeat: usize = categories.iter().map(|&c| s.clean_map(0, c).removed()).sum();
    results.push(check(
        "map_cleanup_keeps_protected",
        failed == 0 && deleted > 0 && left == on_map - deleted && left > 0 && repeat == 0,
        format!("deleted {} of {} things, {} kept", deleted, on_map, left),
    ));
    results.push(check(
        "map_cleanup_region_scoped",
        s.map_thing_count(1) == on_map,
        format!("{} things untouched in region 1", s.map_thing_count(1)),
    ));

    if verbose {
        println!("  {} world pawns left", s.world_pawn_count());
    }

    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(settings: &GovernorSettings, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Save/Load ---");
    let mut results = Vec::new();

    let mut s = session(settings, seed);
    let _ = s.run(5_000);
    let mut buf = Vec::new();
    if let Err(e) = s.save(&mut buf) {
        results.push(check("save_governor", false, e.to_string()));
        return results;
    }

    let mut restored = session(settings, seed);
    let loaded = restored.load(&buf[..]);
    let same = loaded.is_ok()
        && restored.tick() == s.tick()
        && restored.wildlife_registry() == s.wildlife_registry()
        && restored.prisoner_registry() == s.prisoner_registry()
        && restored.plant_compensator() == s.plant_compensator()
        && restored.region(0) == s.region(0)
        && restored.region(1) == s.region(1);
    results.push(check(
        "save_load_roundtrip",
        same,
        match loaded {
            Ok(()) => format!("{} bytes", buf.len()),
            Err(e) => e.to_string(),
        },
    ));

    let truncated = &buf[..buf.len() / 2];
    let mut scratch = GovernorSession::new(settings.clone(), seed);
    results.push(check(
        "load_rejects_truncated",
        scratch.load(truncated).is_err() && scratch.tick() == 0,
        "half a save file is refused and leaves the session untouched",
    ));

    if verbose {
        println!("  save file: {} bytes", buf.len());
    }

    results
}
