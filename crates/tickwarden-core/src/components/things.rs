//! Loose items lying on a map.

use tickwarden_logic::mapclean::MapThingFacts;

/// Chunks, filth, corpses, dropped gear. Nothing ticks them; they only
/// matter to map cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct MapThing {
    pub facts: MapThingFacts,
}
