//! Options structure for every throttling instantiation.
//!
//! The host's settings UI owns persistence of these values; this crate only
//! reads them. [`GovernorSettings::sanitized`] clamps every number into the
//! range the UI sliders allow, so a hand-edited settings file cannot push an
//! interval into a pathological range.
//!
//! ```
//! use tickwarden_logic::settings::GovernorSettings;
//!
//! let json = r#"{ "wildlife": { "interval_ticks": 99999 } }"#;
//! let settings: GovernorSettings = serde_json::from_str(json).unwrap();
//! assert_eq!(settings.sanitized().wildlife.interval_ticks, 7200);
//! assert!(settings.turrets.enabled);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PLANT_INTERVAL, TICK_LONG_INTERVAL};
use crate::Tick;

/// All governor options, one block per instantiation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorSettings {
    pub wildlife: WildlifeSettings,
    pub prisoners: PrisonerSettings,
    pub turrets: TurretSettings,
    pub plants: PlantSettings,
    pub quests: QuestSettings,
}

/// Factionless animal tick gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WildlifeSettings {
    pub enabled: bool,
    pub interval_ticks: Tick,
    pub exclude_predators: bool,
    pub exclude_near_colonists: bool,
    /// Cells. Zero disables the proximity check.
    pub near_colonist_radius: i32,
}

/// Prisoner tick gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrisonerSettings {
    pub enabled: bool,
    pub interval_ticks: Tick,
    pub exclude_near_colonists: bool,
    pub near_colonist_radius: i32,
    pub verbose_logging: bool,
}

/// Player turret idle-scan caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretSettings {
    pub enabled: bool,
    /// With no active threat, one full target scan per this many ticks.
    pub idle_scan_interval_ticks: Tick,
    /// How often each region recomputes its danger flag.
    pub danger_refresh_interval_ticks: Tick,
    pub verbose_logging: bool,
}

/// Plant long-tick deferral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantSettings {
    pub enabled: bool,
    pub fully_grown_interval_ticks: Tick,
    /// Multiplier on the native cadence for growing plants in the home area
    /// or a growing zone.
    pub home_area_growing_multiplier: f32,
    /// Multiplier for every other growing plant.
    pub wild_growing_multiplier: f32,
}

/// Quest selection tweaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestSettings {
    pub enabled: bool,
    pub use_fast_chooser: bool,
    pub max_checks_per_selection: usize,
    pub normalize_zero_points: bool,
    pub use_ancient_complex_fallback: bool,
    pub verbose_logging: bool,
}

impl Default for WildlifeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: 1_800, // 30 s
            exclude_predators: true,
            exclude_near_colonists: true,
            near_colonist_radius: 30,
        }
    }
}

impl Default for PrisonerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: 120, // 2 s
            exclude_near_colonists: true,
            near_colonist_radius: 25,
            verbose_logging: false,
        }
    }
}

impl Default for TurretSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_scan_interval_ticks: 500, // ~8.3 s
            danger_refresh_interval_ticks: 500,
            verbose_logging: false,
        }
    }
}

impl Default for PlantSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fully_grown_interval_ticks: 8_000,
            home_area_growing_multiplier: 2.0,
            wild_growing_multiplier: 4.0,
        }
    }
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            use_fast_chooser: true,
            max_checks_per_selection: 12,
            normalize_zero_points: true,
            use_ancient_complex_fallback: true,
            verbose_logging: false,
        }
    }
}

impl GovernorSettings {
    /// Copy with every number clamped into its UI slider range.
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();

        s.wildlife.interval_ticks = s.wildlife.interval_ticks.clamp(60, 7_200);
        s.wildlife.near_colonist_radius = s.wildlife.near_colonist_radius.clamp(0, 80);

        s.prisoners.interval_ticks = s.prisoners.interval_ticks.clamp(15, 600);
        s.prisoners.near_colonist_radius = s.prisoners.near_colonist_radius.clamp(5, 80);

        s.turrets.idle_scan_interval_ticks = s.turrets.idle_scan_interval_ticks.clamp(60, 2_000);
        s.turrets.danger_refresh_interval_ticks =
            s.turrets.danger_refresh_interval_ticks.clamp(60, 2_000);

        s.plants.fully_grown_interval_ticks = s
            .plants
            .fully_grown_interval_ticks
            .clamp(TICK_LONG_INTERVAL, MAX_PLANT_INTERVAL);
        let plants = &mut s.plants;
        plants.home_area_growing_multiplier =
            clamp_multiplier(plants.home_area_growing_multiplier, 8.0);
        plants.wild_growing_multiplier = clamp_multiplier(plants.wild_growing_multiplier, 16.0);

        s.quests.max_checks_per_selection = s.quests.max_checks_per_selection.clamp(1, 60);

        s
    }
}

/// NaN multipliers fall back to 1.0 (native cadence).
pub(crate) fn clamp_multiplier(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(1.0, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipping_values() {
        let s = GovernorSettings::default();
        assert_eq!(s.wildlife.interval_ticks, 1_800);
        assert_eq!(s.wildlife.near_colonist_radius, 30);
        assert_eq!(s.prisoners.interval_ticks, 120);
        assert_eq!(s.turrets.idle_scan_interval_ticks, 500);
        assert_eq!(s.quests.max_checks_per_selection, 12);
        assert!(s.plants.enabled);
    }

    #[test]
    fn defaults_survive_sanitize() {
        let s = GovernorSettings::default();
        assert_eq!(s.sanitized(), s);
    }

    #[test]
    fn sanitize_clamps_out_of_range() {
        let mut s = GovernorSettings::default();
        s.prisoners.interval_ticks = 1;
        s.turrets.idle_scan_interval_ticks = 1_000_000;
        s.plants.wild_growing_multiplier = 99.0;
        s.plants.home_area_growing_multiplier = f32::NAN;
        s.quests.max_checks_per_selection = 0;

        let c = s.sanitized();
        assert_eq!(c.prisoners.interval_ticks, 15);
        assert_eq!(c.turrets.idle_scan_interval_ticks, 2_000);
        assert_eq!(c.plants.wild_growing_multiplier, 16.0);
        assert_eq!(c.plants.home_area_growing_multiplier, 1.0);
        assert_eq!(c.quests.max_checks_per_selection, 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: GovernorSettings =
            serde_json::from_str(r#"{ "prisoners": { "enabled": false } }"#).unwrap();
        assert!(!s.prisoners.enabled);
        assert_eq!(s.prisoners.interval_ticks, 120);
        assert!(s.wildlife.enabled);
    }
}
