//! Buildings and plants.

use hecs::Entity;
use tickwarden_logic::compensator::PlantFacts;
use tickwarden_logic::policy::GroundPos;
use tickwarden_logic::turret::TurretFacts;

/// A turret. `facts.current_target` is refreshed from `target` every tick
/// before the scan gate runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Turret {
    pub facts: TurretFacts,
    pub position: GroundPos,
    /// Cells.
    pub range: i32,
    pub target: Option<Entity>,
    pub full_scans: u64,
}

impl Turret {
    pub fn can_reach(&self, other: GroundPos) -> bool {
        self.position.distance_sq(other) <= i64::from(self.range) * i64::from(self.range)
    }
}

/// A plant growing on the long-tick cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    pub facts: PlantFacts,
    /// Growth added by one long-tick.
    pub growth_per_update: f32,
    pub long_ticks: u64,
}

impl Plant {
    pub fn grow(&mut self) {
        self.facts.growth = (self.facts.growth + self.growth_per_update).min(1.0);
        self.long_ticks += 1;
    }
}
