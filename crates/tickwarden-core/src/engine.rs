//! Governor session - owns every governor object and drives them per tick

use std::collections::{BTreeMap, HashMap};

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tickwarden_logic::cleanup::{self, CleanupReport, RemovalError};
use tickwarden_logic::compensator::PlantCompensator;
use tickwarden_logic::mapclean::{self, MapCleanup, MapCleanupReport};
use tickwarden_logic::quest::{QuestChoice, QuestChooser, QuestHost};
use tickwarden_logic::registry::ThrottleRegistry;
use tickwarden_logic::settings::GovernorSettings;
use tickwarden_logic::turret::RegionTurretState;
use tickwarden_logic::{RegionId, Tick};

use crate::components::*;
use crate::generation::{populate, ColonyConfig, ColonyLayout};
use crate::persistence::{self, SaveError};
use crate::systems::*;

/// One running session.
///
/// There is no process-wide governor state: every registry and cache lives
/// here and is handed to the systems explicitly.
pub struct GovernorSession {
    /// ECS world containing all host entities
    pub world: World,
    tick: Tick,
    settings: GovernorSettings,
    ids: IdAllocator,
    wildlife: ThrottleRegistry,
    prisoners: ThrottleRegistry,
    regions: BTreeMap<RegionId, RegionTurretState>,
    plants: PlantCompensator,
    quests: QuestChooser,
    rng: StdRng,
}

impl GovernorSession {
    /// Create an empty session. Settings are sanitized on the way in.
    pub fn new(settings: GovernorSettings, seed: u64) -> Self {
        Self {
            world: World::new(),
            tick: 0,
            settings: settings.sanitized(),
            ids: IdAllocator::new(),
            wildlife: ThrottleRegistry::new(),
            prisoners: ThrottleRegistry::new(),
            regions: BTreeMap::new(),
            plants: PlantCompensator::new(),
            quests: QuestChooser::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Populate the world with a synthetic colony and register its regions.
    pub fn generate(&mut self, config: &ColonyConfig) -> ColonyLayout {
        let layout = populate(&mut self.world, config, &mut self.ids, &mut self.rng);
        for &region in &layout.regions {
            self.add_region(region);
        }
        layout
    }

    /// Start tracking turret state for `region`. No-op if already tracked.
    pub fn add_region(&mut self, region: RegionId) {
        self.regions
            .entry(region)
            .or_insert_with(|| RegionTurretState::new(region));
    }

    /// Stop tracking `region`; its turrets fail open from now on.
    pub fn remove_region(&mut self, region: RegionId) -> Option<RegionTurretState> {
        self.regions.remove(&region)
    }

    /// Advance one tick and run every governed system for it.
    pub fn step(&mut self) -> StepStats {
        self.tick = self.tick.saturating_add(1);
        let now = self.tick;
        let mut stats = StepStats::default();

        let settings = &self.settings;

        danger_refresh_system(&self.world, &mut self.regions, now, &settings.turrets, &mut stats);
        pawn_gate_system(
            &mut self.world,
            &mut self.wildlife,
            &mut self.prisoners,
            now,
            settings,
            &mut stats,
        );
        turret_system(&mut self.world, &mut self.regions, now, &settings.turrets, &mut stats);
        if is_long_tick(now) {
            plant_system(&mut self.world, &mut self.plants, now, &settings.plants, &mut stats);
        }

        stats
    }

    /// Run `ticks` steps and return the summed stats.
    pub fn run(&mut self, ticks: u64) -> StepStats {
        let mut total = StepStats::default();
        for _ in 0..ticks {
            total += self.step();
        }
        total
    }

    /// Despawn an entity and forget any per-entity governor state for it.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let pawn_id = self.world.get::<&Pawn>(entity).ok().map(|p| p.facts.id);
        let plant_id = self.world.get::<&Plant>(entity).ok().map(|p| p.facts.id);
        if self.world.despawn(entity).is_err() {
            return false;
        }
        if let Some(id) = pawn_id {
            self.wildlife.remove(id);
            self.prisoners.remove(id);
        }
        if let Some(id) = plant_id {
            self.plants.remove(id);
        }
        true
    }

    /// Spawn a hostile raider in `region`.
    pub fn spawn_raider(&mut self, region: RegionId) -> Entity {
        crate::generation::spawn_raider(&mut self.world, region, &mut self.ids, &mut self.rng)
    }

    /// Pick a natural random quest with the session's random stream.
    pub fn choose_quest<H: QuestHost + ?Sized>(&mut self, host: &H, points: f32) -> QuestChoice {
        self.quests.choose(host, points, &self.settings.quests, &mut self.rng)
    }

    /// Replacement points for a quest generation request, if it needs any.
    pub fn normalize_generation_points<H: QuestHost + ?Sized>(
        &mut self,
        host: &H,
        points: Option<f32>,
    ) -> Option<f32> {
        self.quests
            .normalize_generation_points(host, points, &self.settings.quests)
    }

    /// Remove every world pawn that nothing depends on.
    pub fn clean_world_pawns(&mut self, include_family: bool) -> CleanupReport {
        let mut by_id: HashMap<u32, Entity> = HashMap::new();
        let mut pawns = Vec::new();
        for (entity, wp) in self.world.query::<&WorldPawn>().iter() {
            by_id.insert(wp.facts.id, entity);
            pawns.push(wp.facts.clone());
        }

        let world = &mut self.world;
        cleanup::clean_world_pawns(&pawns, include_family, |p| {
            let entity = by_id
                .get(&p.id)
                .copied()
                .ok_or_else(|| RemovalError(format!("no entity for world pawn {}", p.id)))?;
            world
                .despawn(entity)
                .map_err(|e| RemovalError(e.to_string()))
        })
    }

    /// Every world pawn with its label, annotated with the reason it would
    /// be kept by [`clean_world_pawns`](Self::clean_world_pawns).
    pub fn world_pawn_labels(&self) -> Vec<(Entity, String)> {
        let mut labels: Vec<(u32, Entity, String)> = self
            .world
            .query::<&WorldPawn>()
            .iter()
            .map(|(entity, wp)| (wp.facts.id, entity, cleanup::annotated_label(&wp.facts)))
            .collect();
        labels.sort_by_key(|(id, _, _)| *id);
        labels.into_iter().map(|(_, entity, label)| (entity, label)).collect()
    }

    /// Remove one chosen world pawn, even one something still depends on.
    pub fn clean_world_pawn(&mut self, entity: Entity) -> Result<(), RemovalError> {
        let facts = self
            .world
            .get::<&WorldPawn>(entity)
            .map(|wp| wp.facts.clone())
            .map_err(|e| RemovalError(e.to_string()))?;
        if let Err(reason) = cleanup::can_safely_clean(&facts) {
            log::warn!("removing world pawn '{}' although it is kept for: {}", facts.label, reason);
        }
        self.world
            .despawn(entity)
            .map_err(|e| RemovalError(e.to_string()))
    }

    /// Delete the loose things `category` selects in `region`.
    pub fn clean_map(&mut self, region: RegionId, category: MapCleanup) -> MapCleanupReport {
        let mut by_id: HashMap<u32, Entity> = HashMap::new();
        let mut things = Vec::new();
        for (entity, (thing, in_region)) in self.world.query::<(&MapThing, &InRegion)>().iter() {
            if in_region.0 == region {
                by_id.insert(thing.facts.id, entity);
                things.push(thing.facts.clone());
            }
        }

        let world = &mut self.world;
        mapclean::clean_map_things(&things, category, |t| {
            let entity = by_id
                .get(&t.id)
                .copied()
                .ok_or_else(|| RemovalError(format!("no entity for map thing {}", t.id)))?;
            world
                .despawn(entity)
                .map_err(|e| RemovalError(e.to_string()))
        })
    }

    /// Save governor state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_governor(
            writer,
            self.tick,
            &self.wildlife,
            &self.prisoners,
            &self.plants,
            self.regions.values().cloned(),
        )
    }

    /// Load governor state from a reader
    ///
    /// The host world is left as it is. Remembered quest points are dropped
    /// and the quest caches rebuild on the next selection.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_governor(reader)?;

        self.tick = loaded.tick;
        self.wildlife = loaded.wildlife;
        self.prisoners = loaded.prisoners;
        self.regions = loaded
            .regions
            .into_iter()
            .map(|r| (r.region, r))
            .collect();
        self.plants = loaded.plants;
        self.quests.reset();

        log::info!(
            "loaded governor state at tick {}: {} wildlife, {} prisoner, {} plant, {} regions",
            self.tick,
            self.wildlife.len(),
            self.prisoners.len(),
            self.plants.len(),
            self.regions.len()
        );
        Ok(())
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn settings(&self) -> &GovernorSettings {
        &self.settings
    }

    pub fn wildlife_registry(&self) -> &ThrottleRegistry {
        &self.wildlife
    }

    pub fn prisoner_registry(&self) -> &ThrottleRegistry {
        &self.prisoners
    }

    pub fn region(&self, region: RegionId) -> Option<&RegionTurretState> {
        self.regions.get(&region)
    }

    pub fn plant_compensator(&self) -> &PlantCompensator {
        &self.plants
    }

    /// Count pawns in the world
    pub fn pawn_count(&self) -> usize {
        self.world.query::<&Pawn>().iter().count()
    }

    /// Count loose things in `region`
    pub fn map_thing_count(&self, region: RegionId) -> usize {
        self.world
            .query::<(&MapThing, &InRegion)>()
            .iter()
            .filter(|(_, (_, r))| r.0 == region)
            .count()
    }

    /// Count world pawns awaiting cleanup
    pub fn world_pawn_count(&self) -> usize {
        self.world.query::<&WorldPawn>().iter().count()
    }
}
