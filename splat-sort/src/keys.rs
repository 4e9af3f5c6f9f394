//! Distance keys and the key/index grid the radix passes reorder.

use bevy::math::{Mat4, UVec2, Vec3};
use constants::sorting::{PADDING_INDEX, PADDING_KEY, RADIX_BITS};
use constants::texture::MAX_GRID_RESOLUTION;

use crate::bridge::PositionGrid;
use crate::config::SortConfiguration;
use crate::error::{Result, SortError};
use crate::raster::{Texture, draw_fullscreen, morton_decode, morton_encode};

/// Padding pair; sorts behind every valid element and never names one.
pub const PADDING_PAIR: [f32; 2] = [PADDING_KEY, PADDING_INDEX];

/// Total key width for a pass count.
#[inline]
pub fn key_bits(pass_count: u8) -> u32 {
    pass_count as u32 * RADIX_BITS
}

#[inline]
fn key_max(bits: u32) -> f32 {
    ((1u32 << bits) - 1) as f32
}

/// Integer key of a normalised distance.
#[inline]
pub fn quantize_key(key: f32, bits: u32) -> u32 {
    (key.clamp(0.0, 1.0) * key_max(bits)).round() as u32
}

/// Integer key back out of a stored float key.
#[inline]
pub fn stored_key_bits(stored: f32, bits: u32) -> u32 {
    quantize_key(stored, bits)
}

/// Distance of `world` from `camera`, clamped to `[min, max]` and mapped to [0, 1].
/// An empty or inverted window maps everything to 0.
#[inline]
pub fn normalized_distance(world: Vec3, camera: Vec3, min_distance: f32, max_distance: f32) -> f32 {
    let window = max_distance - min_distance;
    if window.is_nan() || window <= 0.0 {
        return 0.0;
    }
    let distance = world.distance(camera).max(min_distance).min(max_distance);
    (distance - min_distance) / window
}

/// Square grid of `(key, index)` pairs addressed by Z-order slot.
#[derive(Debug, Clone)]
pub struct KeyIndexGrid {
    texture: Texture<[f32; 2]>,
}

impl KeyIndexGrid {
    pub fn new(label: &'static str, resolution: u32) -> Result<Self> {
        if resolution == 0 || !resolution.is_power_of_two() || resolution > MAX_GRID_RESOLUTION {
            return Err(SortError::InvalidConfiguration(format!(
                "{label} resolution {resolution} must be a power of two no larger than {MAX_GRID_RESOLUTION}"
            )));
        }
        Ok(Self {
            texture: Texture::new(label, resolution, resolution, PADDING_PAIR),
        })
    }

    pub fn resolution(&self) -> u32 {
        self.texture.width()
    }

    /// Elements the grid can hold.
    pub fn capacity(&self) -> usize {
        self.texture.texel_count()
    }

    pub fn texture(&self) -> &Texture<[f32; 2]> {
        &self.texture
    }

    pub(crate) fn texture_mut(&mut self) -> &mut Texture<[f32; 2]> {
        &mut self.texture
    }

    #[inline]
    pub fn load_slot(&self, slot: usize) -> [f32; 2] {
        self.texture.load(morton_decode(slot as u32))
    }

    pub fn clear_to_padding(&mut self) {
        self.texture.clear(PADDING_PAIR);
    }

    /// The first `count` pairs in slot order.
    pub fn pairs(&self, count: usize) -> impl Iterator<Item = [f32; 2]> + '_ {
        (0..count.min(self.capacity())).map(|slot| self.load_slot(slot))
    }

    /// Original element indices of the first `count` slots, in draw order.
    /// Padding slots are skipped.
    pub fn sorted_indices(&self, count: usize) -> Vec<u32> {
        self.pairs(count)
            .filter(|[_, index]| *index >= 0.0)
            .map(|[_, index]| index as u32)
            .collect()
    }

    pub fn keys(&self, count: usize) -> Vec<f32> {
        self.pairs(count).map(|[key, _]| key).collect()
    }

    /// Fill with `pairs` in slot order, padding the rest.
    #[cfg(test)]
    pub(crate) fn from_pairs(resolution: u32, pairs: &[[f32; 2]]) -> Self {
        let mut grid = Self::new("test_keys", resolution).unwrap();
        draw_fullscreen(grid.texture_mut(), |texel| {
            pairs
                .get(morton_encode(texel) as usize)
                .copied()
                .unwrap_or(PADDING_PAIR)
        });
        grid
    }
}

/// Inputs to one key generation draw.
#[derive(Debug, Clone, Copy)]
pub struct KeyParameters {
    pub world_transform: Mat4,
    pub camera_position: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub key_bits: u32,
}

impl KeyParameters {
    /// Parameters for a sort from `camera_position` under a validated `config`.
    pub fn from_configuration(
        config: &SortConfiguration,
        camera_position: Vec3,
        world_transform: Mat4,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            world_transform,
            camera_position,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            key_bits: config.key_bits(),
        })
    }
}

/// Write one quantised `(key, index)` pair per element of `positions` into
/// `target`, padding every slot past the element count.
pub fn compute_keys(
    positions: &PositionGrid,
    parameters: &KeyParameters,
    target: &mut KeyIndexGrid,
) -> Result<()> {
    if parameters.max_distance.is_nan() || parameters.max_distance <= parameters.min_distance {
        return Err(SortError::InvalidConfiguration(format!(
            "max_distance {} must exceed min_distance {}",
            parameters.max_distance, parameters.min_distance
        )));
    }

    let count = positions.count();
    if count > target.capacity() {
        return Err(SortError::CapacityExceeded {
            count,
            capacity: target.capacity(),
        });
    }

    let max = key_max(parameters.key_bits);
    draw_fullscreen(target.texture_mut(), |texel: UVec2| {
        let slot = morton_encode(texel) as usize;
        let Some(position) = positions.load_element(slot) else {
            return PADDING_PAIR;
        };

        let world = parameters.world_transform.transform_point3(position);
        let key = normalized_distance(
            world,
            parameters.camera_position,
            parameters.min_distance,
            parameters.max_distance,
        );
        [quantize_key(key, parameters.key_bits) as f32 / max, slot as f32]
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{RawPositionSource, upload_positions};
    use crate::decode::VectorFormat;

    fn line_positions() -> PositionGrid {
        let source = RawPositionSource::from_positions(
            VectorFormat::Float32,
            &[Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 10.0)],
        );
        upload_positions(&source).unwrap()
    }

    fn parameters(camera: Vec3) -> KeyParameters {
        KeyParameters {
            world_transform: Mat4::IDENTITY,
            camera_position: camera,
            min_distance: 0.0,
            max_distance: 10.0,
            key_bits: key_bits(3),
        }
    }

    #[test]
    fn camera_at_origin_keys_ascend() {
        let mut grid = KeyIndexGrid::new("keys", 4).unwrap();
        compute_keys(&line_positions(), &parameters(Vec3::ZERO), &mut grid).unwrap();

        let pairs: Vec<_> = grid.pairs(3).collect();
        assert_eq!(pairs[0], [0.0, 0.0]);
        assert!((pairs[1][0] - 0.5).abs() < 1e-3);
        assert_eq!(pairs[1][1], 1.0);
        assert_eq!(pairs[2], [1.0, 2.0]);
    }

    #[test]
    fn camera_at_far_end_keys_descend() {
        let mut grid = KeyIndexGrid::new("keys", 4).unwrap();
        compute_keys(&line_positions(), &parameters(Vec3::new(0.0, 0.0, 10.0)), &mut grid)
            .unwrap();

        let keys = grid.keys(3);
        assert_eq!(keys[0], 1.0);
        assert!((keys[1] - 0.5).abs() < 1e-3);
        assert_eq!(keys[2], 0.0);
    }

    #[test]
    fn padding_slots_hold_sentinel() {
        let mut grid = KeyIndexGrid::new("keys", 4).unwrap();
        compute_keys(&line_positions(), &parameters(Vec3::ZERO), &mut grid).unwrap();
        for slot in 3..16 {
            assert_eq!(grid.load_slot(slot), PADDING_PAIR);
        }
        assert_eq!(grid.sorted_indices(16), vec![0, 1, 2]);
    }

    #[test]
    fn world_transform_moves_positions() {
        let mut grid = KeyIndexGrid::new("keys", 2).unwrap();
        let mut params = parameters(Vec3::ZERO);
        params.world_transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        compute_keys(&line_positions(), &params, &mut grid).unwrap();
        // everything is pushed to or past the far end
        assert_eq!(grid.keys(3), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn distances_outside_window_clamp() {
        assert_eq!(normalized_distance(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, 2.0, 4.0), 0.0);
        assert_eq!(normalized_distance(Vec3::new(0.0, 0.0, 9.0), Vec3::ZERO, 2.0, 4.0), 1.0);
    }

    #[test]
    fn inverted_window_does_not_panic() {
        assert_eq!(normalized_distance(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 4.0, 2.0), 0.0);
        assert_eq!(normalized_distance(Vec3::ONE, Vec3::ZERO, 2.0, 2.0), 0.0);

        let mut grid = KeyIndexGrid::new("keys", 2).unwrap();
        let mut params = parameters(Vec3::ZERO);
        params.min_distance = 8.0;
        params.max_distance = 1.0;
        assert!(matches!(
            compute_keys(&line_positions(), &params, &mut grid),
            Err(SortError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn parameters_come_from_validated_configuration() {
        let config = SortConfiguration {
            pass_count: 4,
            max_distance: 20.0,
            ..Default::default()
        };
        let params = KeyParameters::from_configuration(&config, Vec3::X, Mat4::IDENTITY).unwrap();
        assert_eq!(params.key_bits, 16);
        assert_eq!(params.max_distance, 20.0);
        assert_eq!(params.camera_position, Vec3::X);

        let inverted = SortConfiguration {
            min_distance: 30.0,
            ..config
        };
        assert!(KeyParameters::from_configuration(&inverted, Vec3::X, Mat4::IDENTITY).is_err());
    }

    #[test]
    fn quantised_keys_survive_storage() {
        let bits = key_bits(4);
        for raw in [0u32, 1, 255, 4096, 40_000, 65_535] {
            let stored = raw as f32 / key_max(bits);
            assert_eq!(stored_key_bits(stored, bits), raw);
        }
        assert_eq!(quantize_key(2.0, key_bits(2)), 255);
        assert_eq!(quantize_key(-1.0, key_bits(2)), 0);
    }

    #[test]
    fn too_many_elements_for_grid() {
        let mut grid = KeyIndexGrid::new("keys", 1).unwrap();
        assert_eq!(
            compute_keys(&line_positions(), &parameters(Vec3::ZERO), &mut grid),
            Err(SortError::CapacityExceeded {
                count: 3,
                capacity: 1
            })
        );
    }

    #[test]
    fn resolution_must_be_power_of_two() {
        assert!(KeyIndexGrid::new("keys", 6).is_err());
        assert!(KeyIndexGrid::new("keys", 8192).is_err());
    }
}
