//! Map cleanup: bulk removal of leftover things on one region.
//!
//! Raids and long play leave rock chunks, slag, corpses, filth, and cheap
//! dropped gear lying around; every one of them is ticked, hauled, or
//! rendered. Each [`MapCleanup`] category names what it removes. Anything
//! carrying a quest tag is always kept.

use crate::cleanup::RemovalError;
use crate::EntityId;

/// Def name of steel slag, which is deleted with the chunks.
pub const STEEL_SLAG_DEF: &str = "ChunkSlagSteel";

const NEOLITHIC_TAG_MARKERS: [&str; 2] = ["Neolithic", "Tribal"];
const NEOLITHIC_DEF_MARKERS: [&str; 9] = [
    "Bow", "ShortBow", "GreatBow", "Club", "Spear", "Pila", "Knife", "Mace", "Hammer",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThingKind {
    Chunk,
    Filth,
    Corpse {
        /// The dead pawn belonged to the player faction.
        inner_of_player: bool,
    },
    Weapon,
    Apparel,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quality {
    Awful,
    Poor,
    Normal,
    Good,
    Excellent,
    Masterwork,
    Legendary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum TechLevel {
    #[default]
    Undefined,
    Animal,
    Neolithic,
    Medieval,
    Industrial,
    Spacer,
    Ultra,
    Archotech,
}

/// What the host knows about one thing lying on a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapThingFacts {
    pub id: EntityId,
    pub def_name: String,
    pub kind: ThingKind,
    pub quest_tagged: bool,
    pub spawned: bool,
    pub destroyed: bool,
    pub of_player_faction: bool,
    /// `None` for things without a quality rating.
    pub quality: Option<Quality>,
    pub tech_level: TechLevel,
    pub weapon_tags: Vec<String>,
}

impl Default for MapThingFacts {
    fn default() -> Self {
        Self {
            id: 0,
            def_name: String::new(),
            kind: ThingKind::Other,
            quest_tagged: false,
            spawned: true,
            destroyed: false,
            of_player_faction: false,
            quality: None,
            tech_level: TechLevel::Undefined,
            weapon_tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapCleanup {
    /// Rock chunks of any kind plus steel slag.
    ChunksAndSlag,
    /// Corpses of anyone outside the player faction.
    ForeignCorpses,
    Filth,
    /// Non-player weapons and apparel of awful or poor quality, and
    /// primitive weapons.
    RaidTrash,
}

/// Why a thing is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    Debris,
    LowQuality,
    Neolithic,
}

/// Whether `category` deletes `t`, and why.
pub fn can_delete(t: &MapThingFacts, category: MapCleanup) -> Option<DeleteReason> {
    if t.destroyed || t.quest_tagged {
        return None;
    }
    match category {
        MapCleanup::ChunksAndSlag => {
            let debris = t.kind == ThingKind::Chunk || t.def_name == STEEL_SLAG_DEF;
            debris.then_some(DeleteReason::Debris)
        }
        MapCleanup::ForeignCorpses => match t.kind {
            ThingKind::Corpse { inner_of_player: false } => Some(DeleteReason::Debris),
            _ => None,
        },
        MapCleanup::Filth => (t.kind == ThingKind::Filth).then_some(DeleteReason::Debris),
        MapCleanup::RaidTrash => raid_trash_reason(t),
    }
}

fn raid_trash_reason(t: &MapThingFacts) -> Option<DeleteReason> {
    if !t.spawned || t.of_player_faction {
        return None;
    }
    if !matches!(t.kind, ThingKind::Weapon | ThingKind::Apparel) {
        return None;
    }
    if matches!(t.quality, Some(Quality::Awful | Quality::Poor)) {
        return Some(DeleteReason::LowQuality);
    }
    is_neolithic_weapon(t).then_some(DeleteReason::Neolithic)
}

/// Primitive weapon by tech level, weapon tag, or def name.
pub fn is_neolithic_weapon(t: &MapThingFacts) -> bool {
    if t.kind != ThingKind::Weapon {
        return false;
    }
    if t.tech_level <= TechLevel::Neolithic {
        return true;
    }
    let tagged = t
        .weapon_tags
        .iter()
        .any(|tag| NEOLITHIC_TAG_MARKERS.iter().any(|m| tag.contains(m)));
    tagged || NEOLITHIC_DEF_MARKERS.iter().any(|m| t.def_name.contains(m))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapCleanupReport {
    /// Chunks, slag, corpses, or filth.
    pub debris: usize,
    pub low_quality: usize,
    pub neolithic: usize,
    pub failed: usize,
}

impl MapCleanupReport {
    pub fn removed(&self) -> usize {
        self.debris + self.low_quality + self.neolithic
    }
}

/// Delete every thing `category` selects through the host's `remove`.
///
/// Selection happens before any removal. A failed removal is logged and
/// the batch continues.
pub fn clean_map_things<F>(
    things: &[MapThingFacts],
    category: MapCleanup,
    mut remove: F,
) -> MapCleanupReport
where
    F: FnMut(&MapThingFacts) -> Result<(), RemovalError>,
{
    let selected: Vec<(&MapThingFacts, DeleteReason)> = things
        .iter()
        .filter_map(|t| can_delete(t, category).map(|reason| (t, reason)))
        .collect();

    let mut report = MapCleanupReport::default();
    for (t, reason) in selected {
        if let Err(e) = remove(t) {
            log::warn!("failed to delete {} ({}): {}", t.def_name, t.id, e);
            report.failed += 1;
            continue;
        }
        match reason {
            DeleteReason::Debris => report.debris += 1,
            DeleteReason::LowQuality => report.low_quality += 1,
            DeleteReason::Neolithic => report.neolithic += 1,
        }
    }

    log::info!(
        "map cleanup {:?}: deleted {} (low quality {}, neolithic {}), {} failed",
        category,
        report.removed(),
        report.low_quality,
        report.neolithic,
        report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thing(id: EntityId, def_name: &str, kind: ThingKind) -> MapThingFacts {
        MapThingFacts {
            id,
            def_name: def_name.into(),
            kind,
            ..MapThingFacts::default()
        }
    }

    fn rifle(id: EntityId) -> MapThingFacts {
        MapThingFacts {
            tech_level: TechLevel::Industrial,
            quality: Some(Quality::Normal),
            ..thing(id, "Gun_BoltActionRifle", ThingKind::Weapon)
        }
    }

    #[test]
    fn chunks_and_steel_slag_are_debris() {
        let granite = thing(1, "ChunkGranite", ThingKind::Chunk);
        let slag = thing(2, STEEL_SLAG_DEF, ThingKind::Other);
        let steel = thing(3, "Steel", ThingKind::Other);
        let cat = MapCleanup::ChunksAndSlag;
        assert_eq!(can_delete(&granite, cat), Some(DeleteReason::Debris));
        assert_eq!(can_delete(&slag, cat), Some(DeleteReason::Debris));
        assert_eq!(can_delete(&steel, cat), None);
        assert_eq!(can_delete(&granite, MapCleanup::Filth), None);
    }

    #[test]
    fn only_foreign_corpses_are_removed() {
        let raider = thing(1, "Corpse_Human", ThingKind::Corpse { inner_of_player: false });
        let colonist = thing(2, "Corpse_Human", ThingKind::Corpse { inner_of_player: true });
        assert_eq!(can_delete(&raider, MapCleanup::ForeignCorpses), Some(DeleteReason::Debris));
        assert_eq!(can_delete(&colonist, MapCleanup::ForeignCorpses), None);
    }

    #[test]
    fn all_filth_is_removed() {
        let blood = thing(1, "Filth_Blood", ThingKind::Filth);
        let dirt = thing(2, "Filth_Dirt", ThingKind::Filth);
        assert_eq!(can_delete(&blood, MapCleanup::Filth), Some(DeleteReason::Debris));
        assert_eq!(can_delete(&dirt, MapCleanup::Filth), Some(DeleteReason::Debris));
    }

    #[test]
    fn raid_trash_by_quality_then_tech() {
        let cat = MapCleanup::RaidTrash;
        let poor_vest = MapThingFacts {
            quality: Some(Quality::Poor),
            ..thing(1, "Apparel_FlakVest", ThingKind::Apparel)
        };
        assert_eq!(can_delete(&poor_vest, cat), Some(DeleteReason::LowQuality));

        // Low quality wins over a primitive weapon.
        let awful_club = MapThingFacts {
            quality: Some(Quality::Awful),
            tech_level: TechLevel::Neolithic,
            ..thing(2, "MeleeWeapon_Club", ThingKind::Weapon)
        };
        assert_eq!(can_delete(&awful_club, cat), Some(DeleteReason::LowQuality));

        let good_bow = MapThingFacts {
            quality: Some(Quality::Good),
            tech_level: TechLevel::Neolithic,
            ..thing(3, "Bow_Recurve", ThingKind::Weapon)
        };
        assert_eq!(can_delete(&good_bow, cat), Some(DeleteReason::Neolithic));

        assert_eq!(can_delete(&rifle(4), cat), None);

        // Normal apparel is never primitive, whatever its tech level.
        let parka = MapThingFacts {
            quality: Some(Quality::Normal),
            ..thing(5, "Apparel_Parka", ThingKind::Apparel)
        };
        assert_eq!(can_delete(&parka, cat), None);
    }

    #[test]
    fn raid_trash_skips_player_and_unspawned_gear() {
        let cat = MapCleanup::RaidTrash;
        let owned = MapThingFacts {
            of_player_faction: true,
            quality: Some(Quality::Awful),
            ..thing(1, "Apparel_Duster", ThingKind::Apparel)
        };
        let carried = MapThingFacts {
            spawned: false,
            quality: Some(Quality::Awful),
            ..thing(2, "Apparel_Duster", ThingKind::Apparel)
        };
        assert_eq!(can_delete(&owned, cat), None);
        assert_eq!(can_delete(&carried, cat), None);
    }

    #[test]
    fn primitive_weapons_by_tag_or_name() {
        let tagged = MapThingFacts {
            weapon_tags: vec!["TribalMelee".into()],
            ..rifle(1)
        };
        assert!(is_neolithic_weapon(&tagged));

        let named = MapThingFacts {
            def_name: "MeleeWeapon_Spear".into(),
            ..rifle(2)
        };
        assert!(is_neolithic_weapon(&named));

        assert!(!is_neolithic_weapon(&rifle(3)));
        let plain = MapThingFacts {
            tech_level: TechLevel::Medieval,
            ..thing(4, "MeleeWeapon_LongSword", ThingKind::Weapon)
        };
        assert!(!is_neolithic_weapon(&plain));
    }

    #[test]
    fn quest_tagged_and_destroyed_things_are_kept() {
        for cat in [
            MapCleanup::ChunksAndSlag,
            MapCleanup::ForeignCorpses,
            MapCleanup::Filth,
            MapCleanup::RaidTrash,
        ] {
            let mut all = vec![
                thing(1, "ChunkGranite", ThingKind::Chunk),
                thing(2, "Corpse_Human", ThingKind::Corpse { inner_of_player: false }),
                thing(3, "Filth_Blood", ThingKind::Filth),
                MapThingFacts { quality: Some(Quality::Poor), ..rifle(4) },
            ];
            for t in &mut all {
                t.quest_tagged = true;
            }
            assert!(all.iter().all(|t| can_delete(t, cat).is_none()), "{cat:?}");
            for t in &mut all {
                t.quest_tagged = false;
                t.destroyed = true;
            }
            assert!(all.iter().all(|t| can_delete(t, cat).is_none()), "{cat:?}");
        }
    }

    #[test]
    fn batch_counts_by_reason_and_survives_failures() {
        let bow = |id, name: &str| MapThingFacts {
            tech_level: TechLevel::Neolithic,
            ..thing(id, name, ThingKind::Weapon)
        };
        let things = vec![
            MapThingFacts { quality: Some(Quality::Awful), ..rifle(1) },
            bow(2, "Bow_Short"),
            bow(3, "Bow_Great"),
            rifle(4),
            thing(5, "Filth_Blood", ThingKind::Filth),
        ];
        let mut removed = Vec::new();
        let report = clean_map_things(&things, MapCleanup::RaidTrash, |t| {
            if t.id == 3 {
                return Err(RemovalError("reserved".into()));
            }
            removed.push(t.id);
            Ok(())
        });
        assert_eq!(removed, vec![1, 2]);
        let expected = MapCleanupReport { debris: 0, low_quality: 1, neolithic: 1, failed: 1 };
        assert_eq!(report, expected);
        assert_eq!(report.removed(), 2);
    }
}
