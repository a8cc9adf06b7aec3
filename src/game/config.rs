use std::path::Path;

use bevy::log::{error, info};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";

/// Static configuration loaded once at startup. These values are the tuned
/// constants of the motion core (grid shifts, relevance distance, world
/// bounds). Every peer must load identical values before a match starts;
/// changing them mid-game breaks determinism.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    pub tick_rate: f64,

    // Proximity grid
    pub collision_unit_shift: u32,
    pub collision_super_shift: u32,
    pub distance_unit_shift: u32,
    pub distance_super_shift: u32,
    pub adjacency_delta_bound: i32,

    // Awareness
    pub max_relevant_distance: u32,
    pub nearest_foe_zoom: bool,

    // World bounds
    pub universal_center: i32,
    pub thinkiverse_half_size: i32,

    // Countdowns
    pub age_decrement: i32,
    pub presentation_step_shift: u32,
    pub cloak_on_state_max: i32,

    // Separation
    pub separation_step_limit: u32,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            collision_unit_shift: 7,
            collision_super_shift: 11,
            distance_unit_shift: 11,
            distance_super_shift: 15,
            adjacency_delta_bound: 256,
            max_relevant_distance: 46340,
            nearest_foe_zoom: false,
            universal_center: 1_073_741_823,
            thinkiverse_half_size: 2 * 65534,
            age_decrement: 3,
            presentation_step_shift: 2,
            cloak_on_state_max: 254,
            separation_step_limit: 100_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl InitialConfig {
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Load from `path`, logging and falling back to defaults on failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded initial config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                error!("Using default InitialConfig");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let shifts = [
            self.collision_unit_shift,
            self.collision_super_shift,
            self.distance_unit_shift,
            self.distance_super_shift,
        ];
        if shifts.iter().any(|&shift| shift > 31) {
            return Err(ConfigError::Invalid("grid shifts must be below 32"));
        }
        if self.collision_super_shift < self.collision_unit_shift {
            return Err(ConfigError::Invalid("collision_super_shift is below collision_unit_shift"));
        }
        if self.distance_super_shift < self.distance_unit_shift {
            return Err(ConfigError::Invalid("distance_super_shift is below distance_unit_shift"));
        }
        if self.distance_unit_shift < self.collision_super_shift {
            return Err(ConfigError::Invalid("distance_unit_shift is below collision_super_shift"));
        }
        if self.max_relevant_distance > 46340 {
            return Err(ConfigError::Invalid("max_relevant_distance squared must fit in 31 bits"));
        }
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::Invalid("tick_rate must be positive and finite"));
        }
        Ok(())
    }
}

/// Simulation constants in the form the tick code consumes them.
///
/// Built once from [`InitialConfig`]; all derived values (squared distance,
/// thinkiverse corners, extra shifts) are computed here so the tick itself
/// only does integer work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub collision_unit_shift: u32,
    /// Extra shift from a near-grid unit to its super coordinate.
    pub collision_super_extra_shift: u32,
    /// Shift from the near super coordinate to the far-grid unit.
    pub distance_unit_extra_shift: u32,
    /// Extra shift from a far-grid unit to its super coordinate.
    pub distance_super_extra_shift: u32,
    pub adjacency_delta_bound: i32,
    pub max_relevant_distance: u32,
    pub max_relevant_distance_squared: u32,
    pub nearest_foe_zoom: bool,
    pub thinkiverse_top_left: i32,
    pub thinkiverse_bottom_right: i32,
    pub age_decrement: i32,
    pub presentation_step_shift: u32,
    pub cloak_on_state_max: i32,
    pub separation_step_limit: u32,
}

impl From<&InitialConfig> for SimConfig {
    fn from(config: &InitialConfig) -> Self {
        Self {
            collision_unit_shift: config.collision_unit_shift,
            collision_super_extra_shift: config.collision_super_shift.saturating_sub(config.collision_unit_shift),
            distance_unit_extra_shift: config.distance_unit_shift.saturating_sub(config.collision_super_shift),
            distance_super_extra_shift: config.distance_super_shift.saturating_sub(config.distance_unit_shift),
            adjacency_delta_bound: config.adjacency_delta_bound,
            max_relevant_distance: config.max_relevant_distance,
            max_relevant_distance_squared: config.max_relevant_distance.saturating_mul(config.max_relevant_distance),
            nearest_foe_zoom: config.nearest_foe_zoom,
            thinkiverse_top_left: config.universal_center.saturating_sub(config.thinkiverse_half_size),
            thinkiverse_bottom_right: config.universal_center.saturating_add(config.thinkiverse_half_size),
            age_decrement: config.age_decrement,
            presentation_step_shift: config.presentation_step_shift,
            cloak_on_state_max: config.cloak_on_state_max,
            separation_step_limit: config.separation_step_limit,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from(&InitialConfig::default())
    }
}
