//! Safety overrides that force a full pawn update regardless of throttle
//! state.
//!
//! The host describes each pawn with a [`PawnFacts`] snapshot; the
//! classifiers here map it to the first applicable [`Bypass`] in
//! precedence order, or `None` when the pawn may be throttled. Hunger is
//! graded separately ([`Hunger`]) because "low" food shortens the interval
//! instead of bypassing the registry.

use crate::constants::wildlife::{HUNGER_EMERGENCY, HUNGER_LOW};
use crate::settings::{PrisonerSettings, WildlifeSettings};
use crate::EntityId;

/// Everything the policy needs to know about one pawn on one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PawnFacts {
    pub id: EntityId,
    pub spawned: bool,
    pub dead: bool,
    pub downed: bool,
    pub is_animal: bool,
    pub has_faction: bool,
    /// Inside a container that fully encloses it (cryptosleep, transporter).
    pub enclosed: bool,
    /// Reserved by a quest; never touched.
    pub quest_tagged: bool,
    pub prisoner_of_colony: bool,
    /// Held by something other than the region itself (being carried).
    pub held: bool,
    pub in_mental_state: bool,
    pub has_enemy_target: bool,
    pub has_melee_threat: bool,
    pub drafted: bool,
    pub burning: bool,
    pub predator: bool,
    pub moving: bool,
    pub job: Option<JobFacts>,
    /// Food need as a fraction of capacity; `None` for pawns without one.
    pub food: Option<f32>,
    pub position: GroundPos,
}

/// The pawn's current job, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFacts {
    pub player_forced: bool,
    /// Jobs that always show a weapon are combat jobs.
    pub shows_weapon: bool,
}

/// Cell coordinate on the ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroundPos {
    pub x: i32,
    pub z: i32,
}

impl GroundPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn distance_sq(self, other: GroundPos) -> i64 {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dz = i64::from(other.z) - i64::from(self.z);
        dx * dx + dz * dz
    }
}

/// Why a pawn must receive a full update this tick, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bypass {
    /// Wrong category, not in the world, terminal, or quest-reserved.
    NotATarget,
    /// Hostile engagement or externally forced action.
    Urgent,
    /// Category excluded by settings (predators).
    ExcludedCategory,
    /// Moving or running a multi-step job.
    Busy,
}

/// Food grading for pawns that have a food need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hunger {
    Fed,
    /// Still throttled, but at the minimum interval.
    Low,
    /// Never throttled.
    Emergency,
}

impl Hunger {
    pub fn from_food_level(food: Option<f32>) -> Self {
        match food {
            Some(level) if level < HUNGER_EMERGENCY => Self::Emergency,
            Some(level) if level < HUNGER_LOW => Self::Low,
            _ => Self::Fed,
        }
    }
}

/// Factionless, living, spawned, free animal without quest tags.
pub fn is_wildlife_target(p: &PawnFacts) -> bool {
    p.spawned
        && !p.dead
        && p.is_animal
        && !p.has_faction
        && !p.downed
        && !p.enclosed
        && !p.quest_tagged
}

pub fn is_aggressive(p: &PawnFacts) -> bool {
    if p.in_mental_state || p.has_enemy_target || p.has_melee_threat {
        return true;
    }
    p.job.is_some_and(|job| job.player_forced || job.shows_weapon)
}

/// Skipping a tick while pathing or running a job would desync the job
/// driver's progress.
pub fn is_busy_or_moving(p: &PawnFacts) -> bool {
    p.moving || p.job.is_some()
}

/// First applicable wildlife override, or `None` if the animal may be
/// throttled.
pub fn wildlife_bypass(p: &PawnFacts, settings: &WildlifeSettings) -> Option<Bypass> {
    if !is_wildlife_target(p) {
        return Some(Bypass::NotATarget);
    }
    if is_aggressive(p) {
        return Some(Bypass::Urgent);
    }
    if settings.exclude_predators && p.predator {
        return Some(Bypass::ExcludedCategory);
    }
    if is_busy_or_moving(p) {
        return Some(Bypass::Busy);
    }
    None
}

/// A spawned, living prisoner of the colony standing on the map.
pub fn is_prisoner_target(p: &PawnFacts) -> bool {
    p.spawned && !p.dead && p.prisoner_of_colony && !p.held
}

/// First applicable prisoner override, or `None` if the prisoner may be
/// throttled.
pub fn prisoner_bypass(p: &PawnFacts, _settings: &PrisonerSettings) -> Option<Bypass> {
    if !is_prisoner_target(p) {
        return Some(Bypass::NotATarget);
    }
    if p.downed || p.in_mental_state || p.burning || p.drafted {
        return Some(Bypass::Urgent);
    }
    if p.moving {
        return Some(Bypass::Busy);
    }
    None
}

/// Whether any of `others` lies within `radius` cells of `pos`.
///
/// A non-positive radius disables the check.
pub fn any_within_radius<I>(pos: GroundPos, others: I, radius: i32) -> bool
where
    I: IntoIterator<Item = GroundPos>,
{
    if radius <= 0 {
        return false;
    }
    let r2 = i64::from(radius) * i64::from(radius);
    others.into_iter().any(|other| pos.distance_sq(other) <= r2)
}
