//! Tickwarden Core - Governor Session Engine
//!
//! Drives the pure gates from `tickwarden-logic` over an ECS world of host
//! entities: wildlife and prisoners behind tick throttles, turrets behind
//! the idle-scan cache, plants behind the deferred-update compensator.
//!
//! # Architecture
//!
//! The host world is a `hecs` ECS:
//! - **Entities**: Pawns, turrets, plants, world pawns
//! - **Components**: Fact snapshots the gates read (Pawn, Turret, Plant, ...)
//! - **Systems**: One pass per governed subsystem, run in a fixed order
//!
//! # Example
//!
//! ```rust,no_run
//! use tickwarden_core::prelude::*;
//! use tickwarden_core::generation::ColonyConfig;
//!
//! let mut session = GovernorSession::new(GovernorSettings::default(), 42);
//! session.generate(&ColonyConfig::default());
//!
//! let stats = session.run(60_000);
//! println!("skipped {:.0}% of pawn updates", stats.skip_ratio() * 100.0);
//! ```

pub mod components;
pub mod systems;
pub mod generation;
pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::GovernorSession;
    pub use crate::systems::StepStats;
    pub use tickwarden_logic::settings::GovernorSettings;
}
