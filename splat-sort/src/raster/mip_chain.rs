use bevy::math::UVec2;

use super::draw::draw_fullscreen;
use super::texture::Texture;
use crate::error::{Result, SortError};

/// Single-channel render target with a full box-filter mip chain.
///
/// Level 0 is the base grid, the last level is 1x1. Each coarser texel holds
/// the mean of the 2x2 block beneath it, exactly what hardware mip generation
/// produces, so sums have to be reconstructed with [`MipChain::block_sum`].
#[derive(Debug, Clone)]
pub struct MipChain {
    levels: Vec<Texture<f32>>,
}

impl MipChain {
    pub fn new(label: &'static str, resolution: u32) -> Result<Self> {
        if resolution == 0 || !resolution.is_power_of_two() {
            return Err(SortError::InvalidConfiguration(format!(
                "{label} resolution {resolution} is not a power of two"
            )));
        }

        let level_count = resolution.trailing_zeros() + 1;
        let levels = (0..level_count)
            .map(|level| {
                let size = resolution >> level;
                Texture::new(label, size, size, 0.0)
            })
            .collect();

        Ok(Self { levels })
    }

    pub fn resolution(&self) -> u32 {
        self.levels[0].width()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &Texture<f32> {
        &self.levels[level]
    }

    pub fn base(&self) -> &Texture<f32> {
        &self.levels[0]
    }

    /// Base level as a render target. Coarser levels are stale until the next
    /// [`MipChain::generate_mips`].
    pub fn base_mut(&mut self) -> &mut Texture<f32> {
        &mut self.levels[0]
    }

    /// Rebuild every coarser level from the base by 2x2 averaging.
    pub fn generate_mips(&mut self) {
        for level in 1..self.levels.len() {
            let (finer, coarser) = self.levels.split_at_mut(level);
            let source = &finer[level - 1];
            draw_fullscreen(&mut coarser[0], |texel| {
                let origin = texel * 2u32;
                (source.load(origin)
                    + source.load(origin + UVec2::X)
                    + source.load(origin + UVec2::Y)
                    + source.load(origin + UVec2::ONE))
                    * 0.25
            });
        }
    }

    /// Number of set base texels covered by `texel` at `level`.
    #[inline]
    pub fn block_sum(&self, level: usize, texel: UVec2) -> u32 {
        let base_texels = (1u64 << (2 * level)) as f32;
        (self.levels[level].load(texel) * base_texels).round() as u32
    }

    /// Sum over the whole base level.
    pub fn total(&self) -> u32 {
        self.block_sum(self.levels.len() - 1, UVec2::ZERO)
    }

    /// Sum of all base texels that precede `texel` on the Z-order curve.
    ///
    /// Walks from the root towards the base; at each level the siblings that
    /// come before the texel's ancestor in (0,0), (1,0), (0,1), (1,1) order
    /// contribute their whole block.
    pub fn prefix_before(&self, texel: UVec2) -> u32 {
        let mut prefix = 0;
        for level in (0..self.levels.len() - 1).rev() {
            let ancestor = texel >> level as u32;
            let parent = ancestor >> 1;
            let child = ((ancestor.y & 1) << 1) | (ancestor.x & 1);
            for sibling in 0..child {
                let offset = UVec2::new(sibling & 1, sibling >> 1);
                prefix += self.block_sum(level, parent * 2u32 + offset);
            }
        }
        prefix
    }
}
