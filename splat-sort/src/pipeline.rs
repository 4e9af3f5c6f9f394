use bevy::log::{debug, warn};
use bevy::math::{Mat4, Vec3};

use crate::bridge::{PositionSource, upload_positions};
use crate::config::SortConfiguration;
use crate::error::{Result, SortError};
use crate::keys::{KeyIndexGrid, KeyParameters, compute_keys};
use crate::radix::RadixSortEngine;

/// Viewpoint and placement of the splat set for one sort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortRequest {
    pub camera_position: Vec3,
    pub world_transform: Mat4,
}

/// One grid set plus the stages that fill it: bridge, keys, radix.
///
/// Two pipelines never share grids, so stereo sorting owns one per eye.
#[derive(Debug, Clone)]
pub struct SortPipeline {
    engine: RadixSortEngine,
    sorted_count: usize,
}

impl SortPipeline {
    pub fn new(resolution: u32) -> Result<Self> {
        Ok(Self {
            engine: RadixSortEngine::new(resolution)?,
            sorted_count: 0,
        })
    }

    pub fn for_configuration(config: &SortConfiguration) -> Result<Self> {
        config.validate()?;
        Self::new(config.grid_resolution)
    }

    pub fn resolution(&self) -> u32 {
        self.engine.resolution()
    }

    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    /// Elements in the current sorted output.
    pub fn sorted_count(&self) -> usize {
        self.sorted_count
    }

    pub fn sorted_output(&self) -> &KeyIndexGrid {
        self.engine.sorted_output()
    }

    pub fn sorted_indices(&self) -> Vec<u32> {
        self.engine.sorted_output().sorted_indices(self.sorted_count)
    }

    /// Run a full sort. On error the previous output is left as it was.
    pub fn sort(
        &mut self,
        source: &dyn PositionSource,
        request: &SortRequest,
        config: &SortConfiguration,
    ) -> Result<usize> {
        let result = self.try_sort(source, request, config);
        if let Err(error) = &result {
            warn!("Splat sort skipped, keeping previous order: {}", error);
        }
        result
    }

    fn try_sort(
        &mut self,
        source: &dyn PositionSource,
        request: &SortRequest,
        config: &SortConfiguration,
    ) -> Result<usize> {
        config.validate()?;

        let count = source.count();
        if count > self.capacity() {
            return Err(SortError::CapacityExceeded {
                count,
                capacity: self.capacity(),
            });
        }
        if count == 0 {
            self.engine.clear_output();
            self.sorted_count = 0;
            return Ok(0);
        }

        let positions = upload_positions(source)?;

        let parameters = KeyParameters::from_configuration(
            config,
            request.camera_position,
            request.world_transform,
        )?;
        compute_keys(&positions, &parameters, self.engine.key_values_mut())?;
        self.engine.sort(config.pass_count, count)?;
        self.sorted_count = count;

        debug!(
            "Sorted {} splats from camera {:?}",
            count, request.camera_position
        );
        Ok(count)
    }
}
