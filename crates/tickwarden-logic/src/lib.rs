//! Pure throttling logic for tickwarden.
//!
//! This crate decides, for a large rotating population of simulated
//! entities, when a full update may be skipped and how skipped work is
//! made up for. Functions take plain data and explicitly owned state
//! objects and return decisions, so every rule is unit-testable without a
//! host simulation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cleanup`] | World-pawn cleanup policy and batched removal |
//! | [`compensator`] | Deferred plant long-ticks with batched replay |
//! | [`constants`] | Tick cadences, retention windows, clamp ranges |
//! | [`mapclean`] | Map cleanup categories and batched deletion |
//! | [`measure`] | Scope timer for slow-path diagnostics |
//! | [`policy`] | Safety overrides for wildlife and prisoner gating |
//! | [`quest`] | Quest root cache, layer gate, fast chooser, fallbacks |
//! | [`recent`] | Single-slot time-windowed memo for threat points |
//! | [`registry`] | Bounded entity → next-eligible-tick map |
//! | [`sampler`] | Bounded weighted rejection sampling and list pool |
//! | [`settings`] | Options structure consumed by every instantiation |
//! | [`throttle`] | Gate composition: policy precedence + registry |
//! | [`turret`] | Danger state, idle-scan cache, target validity |

pub mod cleanup;
pub mod compensator;
pub mod constants;
pub mod mapclean;
pub mod measure;
pub mod policy;
pub mod quest;
pub mod recent;
pub mod registry;
pub mod sampler;
pub mod settings;
pub mod throttle;
pub mod turret;

/// Simulation tick counter, advanced once per step by the host.
pub type Tick = u64;

/// Process-lifetime-unique identity of a simulated thing.
pub type EntityId = u32;

/// Identity of a spatially bounded simulation area ("map").
pub type RegionId = u32;
