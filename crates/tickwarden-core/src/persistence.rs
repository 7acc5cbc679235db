//! Save/Load for governor state
//!
//! Only the state the governor owns is persisted: both throttle registries,
//! the plant compensator, and each region's danger flag and scan-tick cache.
//! The host world is the host's to save. Quest caches are rebuilt lazily
//! after a load.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickwarden_logic::compensator::PlantCompensator;
use tickwarden_logic::registry::ThrottleRegistry;
use tickwarden_logic::turret::RegionTurretState;
use tickwarden_logic::Tick;

/// Version number for save format (increment when format changes)
pub const SAVE_VERSION: u32 = 2;

/// Serializable snapshot of governor state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub tick: Tick,
    pub wildlife: ThrottleRegistry,
    pub prisoners: ThrottleRegistry,
    pub plants: PlantCompensator,
    /// Sorted by region id.
    pub regions: Vec<RegionTurretState>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Write governor state to `writer`.
pub fn save_governor<W: Write>(
    writer: W,
    tick: Tick,
    wildlife: &ThrottleRegistry,
    prisoners: &ThrottleRegistry,
    plants: &PlantCompensator,
    regions: impl IntoIterator<Item = RegionTurretState>,
) -> Result<(), SaveError> {
    let mut regions: Vec<_> = regions.into_iter().collect();
    regions.sort_by_key(|r| r.region);

    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        wildlife: wildlife.clone(),
        prisoners: prisoners.clone(),
        plants: plants.clone(),
        regions,
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Read governor state from `reader`.
pub fn load_governor<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }
    Ok(save_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tickwarden_logic::compensator::ExecutionMode;

    #[test]
    fn test_save_load_roundtrip() {
        let mut wildlife = ThrottleRegistry::new();
        wildlife.record_deferral(1, 1_000, 300);
        let _ = wildlife.maintain(1_000);
        let mut prisoners = ThrottleRegistry::new();
        prisoners.record_deferral(2, 1_000, 120);
        let mut plants = PlantCompensator::new();
        let _ = plants.gate(4, 1_000, 2_000, ExecutionMode::Normal, false, false, 8_000);

        let mut region = RegionTurretState::new(3);
        region.danger.danger_present = true;
        region.danger.next_danger_check_tick = 1_500;

        let mut buf = Vec::new();
        save_governor(&mut buf, 1_000, &wildlife, &prisoners, &plants, [region.clone()])
            .expect("save failed");

        let loaded = load_governor(&buf[..]).expect("load failed");
        assert_eq!(loaded.tick, 1_000);
        assert_eq!(loaded.wildlife, wildlife);
        assert_eq!(loaded.prisoners, prisoners);
        assert_eq!(loaded.plants, plants);
        assert_eq!(loaded.regions, vec![region]);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let data = SaveData { version: SAVE_VERSION + 1, ..SaveData::default() };
        let buf = bincode::serialize(&data).expect("serialize");
        match load_governor(&buf[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let mut buf = Vec::new();
        let empty = ThrottleRegistry::new();
        save_governor(&mut buf, 5, &empty, &empty, &PlantCompensator::new(), []).expect("save");
        buf.truncate(buf.len() / 2);
        assert!(matches!(load_governor(&buf[..]), Err(SaveError::Bincode(_))));
    }
}
