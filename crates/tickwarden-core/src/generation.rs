//! Synthetic colony generation for the harness and benchmarks.
//!
//! Each region is a square map with a small walled base in the middle:
//! colonists, prisoners, and turrets inside the base, wildlife and wild
//! plants scattered over the whole map, and crops in the base's growing
//! zone. Loose things (chunks, filth, corpses, dropped gear) follow a fixed
//! ten-item pattern so cleanup counts are predictable.

use hecs::World;
use rand::Rng;
use tickwarden_logic::cleanup::WorldPawnFacts;
use tickwarden_logic::compensator::PlantFacts;
use tickwarden_logic::mapclean::{MapThingFacts, Quality, TechLevel, ThingKind, STEEL_SLAG_DEF};
use tickwarden_logic::policy::{GroundPos, PawnFacts};
use tickwarden_logic::turret::TurretFacts;
use tickwarden_logic::RegionId;

use crate::components::*;

/// Map edge length in cells.
pub const MAP_SIZE: i32 = 250;
const BASE_MIN: i32 = 110;
const BASE_MAX: i32 = 140;

/// Population per region.
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyConfig {
    pub regions: u32,
    pub colonists: u32,
    pub wild_animals: u32,
    /// Share of wild animals that are predators.
    pub predator_fraction: f32,
    pub prisoners: u32,
    pub turrets: u32,
    pub crops: u32,
    pub wild_plants: u32,
    pub world_pawns: u32,
    pub map_things: u32,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            regions: 1,
            colonists: 8,
            wild_animals: 120,
            predator_fraction: 0.1,
            prisoners: 4,
            turrets: 6,
            crops: 150,
            wild_plants: 400,
            world_pawns: 60,
            map_things: 40,
        }
    }
}

/// What [`populate`] created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColonyLayout {
    pub regions: Vec<RegionId>,
    pub pawns: usize,
    pub turrets: usize,
    pub plants: usize,
    pub world_pawns: usize,
    pub map_things: usize,
}

fn base_cell(rng: &mut impl Rng) -> GroundPos {
    GroundPos::new(rng.gen_range(BASE_MIN..BASE_MAX), rng.gen_range(BASE_MIN..BASE_MAX))
}

fn any_cell(rng: &mut impl Rng) -> GroundPos {
    GroundPos::new(rng.gen_range(0..MAP_SIZE), rng.gen_range(0..MAP_SIZE))
}

/// Wildlife spawns outside the base so most of it is eligible for
/// throttling from the first tick.
fn wild_cell(rng: &mut impl Rng) -> GroundPos {
    loop {
        let cell = any_cell(rng);
        let in_base = (BASE_MIN - 40..BASE_MAX + 40).contains(&cell.x)
            && (BASE_MIN - 40..BASE_MAX + 40).contains(&cell.z);
        if !in_base {
            return cell;
        }
    }
}

/// The `n`th loose thing of a region's repeating pattern.
fn loose_thing(id: u32, n: u32) -> MapThingFacts {
    let gear = |def_name: &str, kind, quality, tech_level| MapThingFacts {
        id,
        def_name: def_name.into(),
        kind,
        quality: Some(quality),
        tech_level,
        ..MapThingFacts::default()
    };
    let debris = |def_name: &str, kind| MapThingFacts {
        id,
        def_name: def_name.into(),
        kind,
        ..MapThingFacts::default()
    };
    match n % 10 {
        0 | 9 => debris("ChunkGranite", ThingKind::Chunk),
        1 => debris(STEEL_SLAG_DEF, ThingKind::Other),
        2 => debris("Filth_Blood", ThingKind::Filth),
        3 => debris("Corpse_Raider", ThingKind::Corpse { inner_of_player: false }),
        4 => debris("Corpse_Colonist", ThingKind::Corpse { inner_of_player: true }),
        5 => gear("Apparel_FlakVest", ThingKind::Apparel, Quality::Poor, TechLevel::Industrial),
        6 => gear("Bow_Short", ThingKind::Weapon, Quality::Normal, TechLevel::Neolithic),
        7 => gear("Gun_Revolver", ThingKind::Weapon, Quality::Normal, TechLevel::Industrial),
        _ => MapThingFacts {
            quest_tagged: true,
            ..debris("Filth_Vomit", ThingKind::Filth)
        },
    }
}

fn spawned_pawn(id: u32, position: GroundPos) -> PawnFacts {
    PawnFacts {
        id,
        spawned: true,
        position,
        ..PawnFacts::default()
    }
}

/// Fill `world` with a synthetic colony. Region ids start at 0.
pub fn populate(
    world: &mut World,
    config: &ColonyConfig,
    ids: &mut IdAllocator,
    rng: &mut impl Rng,
) -> ColonyLayout {
    let mut layout = ColonyLayout::default();

    for region in 0..config.regions {
        layout.regions.push(region);

        for _ in 0..config.colonists {
            let facts = PawnFacts {
                has_faction: true,
                moving: rng.gen_bool(0.5),
                food: Some(rng.gen_range(0.5..1.0)),
                ..spawned_pawn(ids.allocate(), base_cell(rng))
            };
            world.spawn((Pawn { facts }, InRegion(region), Colonist, UpdateCounters::default()));
            layout.pawns += 1;
        }

        for _ in 0..config.wild_animals {
            let facts = PawnFacts {
                is_animal: true,
                predator: rng.gen::<f32>() < config.predator_fraction,
                food: Some(rng.gen_range(0.4..1.0)),
                ..spawned_pawn(ids.allocate(), wild_cell(rng))
            };
            world.spawn((Pawn { facts }, InRegion(region), UpdateCounters::default()));
            layout.pawns += 1;
        }

        for _ in 0..config.prisoners {
            let facts = PawnFacts {
                has_faction: true,
                prisoner_of_colony: true,
                food: Some(0.8),
                ..spawned_pawn(ids.allocate(), base_cell(rng))
            };
            world.spawn((Pawn { facts }, InRegion(region), UpdateCounters::default()));
            layout.pawns += 1;
        }

        for _ in 0..config.turrets {
            let turret = Turret {
                facts: TurretFacts {
                    id: ids.allocate(),
                    player_owned: true,
                    ..TurretFacts::default()
                },
                position: base_cell(rng),
                range: 30,
                target: None,
                full_scans: 0,
            };
            world.spawn((turret, InRegion(region)));
            layout.turrets += 1;
        }

        for i in 0..config.crops + config.wild_plants {
            let crop = i < config.crops;
            let facts = PlantFacts {
                id: ids.allocate(),
                growth: rng.gen_range(0.0..1.0),
                in_home_or_growing_zone: crop,
                label: if crop { "rice plant".into() } else { "wild grass".into() },
                ..PlantFacts::default()
            };
            let plant = Plant {
                facts,
                growth_per_update: if crop { 0.01 } else { 0.004 },
                long_ticks: 0,
            };
            world.spawn((plant, InRegion(region)));
            layout.plants += 1;
        }

        for n in 0..config.map_things {
            let facts = loose_thing(ids.allocate(), n);
            world.spawn((MapThing { facts }, InRegion(region)));
            layout.map_things += 1;
        }
    }

    for n in 0..config.world_pawns {
        let id = ids.allocate();
        let facts = WorldPawnFacts {
            id,
            label: format!("traveler {id}"),
            // Roughly one in four is kept for some reason.
            quest_reserved: n % 8 == 1,
            colonist_family: n % 8 == 3,
            ..WorldPawnFacts::default()
        };
        world.spawn((WorldPawn { facts },));
        layout.world_pawns += 1;
    }

    layout
}

/// Spawn a hostile raider in `region` inside turret range of the base.
pub fn spawn_raider(
    world: &mut World,
    region: RegionId,
    ids: &mut IdAllocator,
    rng: &mut impl Rng,
) -> hecs::Entity {
    let facts = PawnFacts {
        has_faction: true,
        moving: true,
        ..spawned_pawn(ids.allocate(), base_cell(rng))
    };
    world.spawn((Pawn { facts }, InRegion(region), Hostile, UpdateCounters::default()))
}
