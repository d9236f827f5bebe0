//! Tuning parameters for a simulation run

use super::error::ConfigError;
use super::types::VEHICLE_LENGTH;

/// Default clearance kept behind the leader's position
pub const DEFAULT_MIN_GAP: f32 = VEHICLE_LENGTH + 2.0;

/// Default distance of the stop line from the road end
pub const DEFAULT_STOP_LINE_OFFSET: f32 = 2.0;

/// Default chance that an unrouted vehicle leaves at a border intersection
pub const DEFAULT_BORDER_EXIT_PROBABILITY: f64 = 0.35;

/// Physical meters per grid tile
pub const DEFAULT_TILE_LENGTH: f32 = 8.0;

/// Nominal speed of generated grid roads
pub const DEFAULT_TILE_SPEED: f32 = 10.0;

/// Per-tile signal phase shift of generated grid intersections
pub const DEFAULT_PHASE_OFFSET_STEP: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub min_gap_m: f32,
    pub stop_line_offset_m: f32,
    pub border_exit_probability: f64,
    pub tile_length_m: f32,
    pub tile_speed_mps: f32,
    pub phase_offset_step_s: f32,
    /// Seed of the world's next-road RNG
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            min_gap_m: DEFAULT_MIN_GAP,
            stop_line_offset_m: DEFAULT_STOP_LINE_OFFSET,
            border_exit_probability: DEFAULT_BORDER_EXIT_PROBABILITY,
            tile_length_m: DEFAULT_TILE_LENGTH,
            tile_speed_mps: DEFAULT_TILE_SPEED,
            phase_offset_step_s: DEFAULT_PHASE_OFFSET_STEP,
            seed: 42,
        }
    }
}

/// False for negative values and NaN
pub(crate) fn non_negative(value: f32) -> bool {
    value >= 0.0
}

/// False for zero, negative values and NaN
pub(crate) fn positive(value: f32) -> bool {
    value > 0.0
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !non_negative(self.min_gap_m) {
            return Err(ConfigError::InvalidConfig("min_gap_m must be non-negative"));
        }
        if !non_negative(self.stop_line_offset_m) {
            return Err(ConfigError::InvalidConfig(
                "stop_line_offset_m must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.border_exit_probability) {
            return Err(ConfigError::InvalidConfig(
                "border_exit_probability must be within [0, 1]",
            ));
        }
        if !positive(self.tile_length_m) || !positive(self.tile_speed_mps) {
            return Err(ConfigError::InvalidConfig(
                "tile length and speed must be positive",
            ));
        }
        if !non_negative(self.phase_offset_step_s) {
            return Err(ConfigError::InvalidConfig(
                "phase_offset_step_s must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let config = SimConfig {
            border_exit_probability: 1.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_nan_gap_rejected() {
        let config = SimConfig {
            min_gap_m: f32::NAN,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
