use bevy::prelude::*;
use constants::sort_settings::*;
use constants::sorting::{MAX_PASS_COUNT, MIN_PASS_COUNT};
use constants::texture::{DEFAULT_GRID_RESOLUTION, MAX_GRID_RESOLUTION};
use serde::{Deserialize, Serialize};

use crate::bridge::grid_dimensions;
use crate::error::{Result, SortError};
use crate::keys::key_bits;

/// Smallest power-of-two grid side holding `count` elements, or `None` when
/// even the largest accepted grid is too small.
pub fn grid_resolution_for(count: usize) -> Option<u32> {
    let side = grid_dimensions(count).x.max(1).next_power_of_two();
    (side <= MAX_GRID_RESOLUTION).then_some(side)
}

/// Runtime sort settings. Loaded from JSON by hosts, fields missing from the
/// file keep their defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Asset, TypePath)]
#[serde(default)]
pub struct SortConfiguration {
    /// Radix passes of 4 bits each (2 = 8-bit keys, 4 = 16-bit keys).
    pub pass_count: u8,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Camera displacement (metres) before a new sort is worth its cost.
    pub quantization_threshold: f32,
    pub separate_eye_sorting: bool,
    pub inter_pupillary_distance: f32,
    /// Side of the square key/index grids; capacity is its square.
    pub grid_resolution: u32,
    /// Sort every frame regardless of camera movement.
    pub always_update: bool,
    pub debug_log: bool,
}

impl Default for SortConfiguration {
    fn default() -> Self {
        Self {
            pass_count: DEFAULT_PASS_COUNT,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            quantization_threshold: DEFAULT_QUANTIZATION_THRESHOLD,
            separate_eye_sorting: false,
            inter_pupillary_distance: DEFAULT_INTER_PUPILLARY_DISTANCE,
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            always_update: false,
            debug_log: false,
        }
    }
}

impl SortConfiguration {
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(SortError::InvalidConfiguration(message));

        if !(MIN_PASS_COUNT..=MAX_PASS_COUNT).contains(&self.pass_count) {
            return invalid(format!(
                "pass_count {} outside {MIN_PASS_COUNT}..={MAX_PASS_COUNT}",
                self.pass_count
            ));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return invalid(format!("min_distance {} must be >= 0", self.min_distance));
        }
        if !self.max_distance.is_finite() || self.max_distance <= self.min_distance {
            return invalid(format!(
                "max_distance {} must exceed min_distance {}",
                self.max_distance, self.min_distance
            ));
        }
        if !self.quantization_threshold.is_finite() || self.quantization_threshold <= 0.0 {
            return invalid(format!(
                "quantization_threshold {} must be > 0",
                self.quantization_threshold
            ));
        }
        if !self.inter_pupillary_distance.is_finite() || self.inter_pupillary_distance < 0.0 {
            return invalid(format!(
                "inter_pupillary_distance {} must be >= 0",
                self.inter_pupillary_distance
            ));
        }
        if !self.grid_resolution.is_power_of_two() || self.grid_resolution > MAX_GRID_RESOLUTION {
            return invalid(format!(
                "grid_resolution {} must be a power of two up to {MAX_GRID_RESOLUTION}",
                self.grid_resolution
            ));
        }
        Ok(())
    }

    pub fn key_bits(&self) -> u32 {
        key_bits(self.pass_count)
    }

    /// Elements one grid set can sort.
    pub fn capacity(&self) -> usize {
        self.grid_resolution as usize * self.grid_resolution as usize
    }

    /// Grow `grid_resolution` until `count` elements fit. Never shrinks.
    /// Returns whether the resolution changed.
    pub fn fit_to(&mut self, count: usize) -> Result<bool> {
        if count <= self.capacity() {
            return Ok(false);
        }
        let resolution = grid_resolution_for(count).ok_or(SortError::CapacityExceeded {
            count,
            capacity: MAX_GRID_RESOLUTION as usize * MAX_GRID_RESOLUTION as usize,
        })?;
        self.grid_resolution = resolution;
        Ok(true)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SortError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SortConfiguration::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.pass_count, 3);
        assert_eq!(config.key_bits(), 12);
        assert_eq!(config.max_distance, 50.0);
        assert_eq!(config.capacity(), 1024 * 1024);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            SortConfiguration { pass_count: 1, ..default() },
            SortConfiguration { pass_count: 5, ..default() },
            SortConfiguration { min_distance: -1.0, ..default() },
            SortConfiguration { min_distance: 10.0, max_distance: 10.0, ..default() },
            SortConfiguration { quantization_threshold: 0.0, ..default() },
            SortConfiguration { quantization_threshold: f32::NAN, ..default() },
            SortConfiguration { inter_pupillary_distance: -0.1, ..default() },
            SortConfiguration { grid_resolution: 1000, ..default() },
            SortConfiguration { grid_resolution: 0, ..default() },
            SortConfiguration { grid_resolution: 8192, ..default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SortError::InvalidConfiguration(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SortConfiguration::from_json(
            r#"{ "pass_count": 4, "max_distance": 20.0, "separate_eye_sorting": true }"#,
        )
        .unwrap();
        assert_eq!(config.pass_count, 4);
        assert_eq!(config.max_distance, 20.0);
        assert!(config.separate_eye_sorting);
        assert_eq!(config.quantization_threshold, DEFAULT_QUANTIZATION_THRESHOLD);
        assert_eq!(config.grid_resolution, DEFAULT_GRID_RESOLUTION);
    }

    #[test]
    fn grid_grows_to_fit_cloud() {
        assert_eq!(grid_resolution_for(0), Some(1));
        assert_eq!(grid_resolution_for(65_536), Some(256));
        assert_eq!(grid_resolution_for(65_537), Some(512));
        assert_eq!(grid_resolution_for(4096 * 4096 + 1), None);

        let mut config = SortConfiguration {
            grid_resolution: 256,
            ..default()
        };
        assert_eq!(config.fit_to(40_000), Ok(false));
        assert_eq!(config.grid_resolution, 256);
        assert_eq!(config.fit_to(1_000_000), Ok(true));
        assert_eq!(config.grid_resolution, 1024);
        assert_eq!(config.validate(), Ok(()));
        assert!(matches!(
            config.fit_to(20_000_000),
            Err(SortError::CapacityExceeded { .. })
        ));
        assert_eq!(config.grid_resolution, 1024);
    }

    #[test]
    fn invalid_json_values_are_rejected() {
        assert!(SortConfiguration::from_json(r#"{ "min_distance": 5.0, "max_distance": 1.0 }"#).is_err());
        assert!(SortConfiguration::from_json("not json").is_err());
    }
}
