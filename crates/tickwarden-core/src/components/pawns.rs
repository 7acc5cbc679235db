//! Pawn components: on-map pawns, markers, and off-map world pawns.

use tickwarden_logic::cleanup::WorldPawnFacts;
use tickwarden_logic::policy::PawnFacts;
use tickwarden_logic::{EntityId, RegionId, Tick};

/// Hands out entity ids that are never reused within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// The region (map) an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InRegion(pub RegionId);

/// An on-map pawn, described the way the gates read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pawn {
    pub facts: PawnFacts,
}

/// Marker: a free colonist. Other pawns near one are never deferred long.
#[derive(Debug, Clone, Copy, Default)]
pub struct Colonist;

/// Marker: an active threat to the colony.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hostile;

/// How often a pawn actually ran its full update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCounters {
    pub full_updates: u64,
    pub skipped_updates: u64,
    pub last_full_tick: Tick,
}

/// A pawn stored off-map, candidate for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPawn {
    pub facts: WorldPawnFacts,
}
