//! Component definitions for the host world.
//!
//! Components are plain data; the governor's decisions live in systems.
//! Most of them wrap the fact snapshots `tickwarden-logic` consumes, so a
//! system can hand them to a gate without translation.

mod pawns;
mod structures;
mod things;

pub use pawns::*;
pub use structures::*;
pub use things::*;
