//! Per-digit prefix sums built from mip reduction.
//!
//! For one digit at a time the occupancy of the source grid is rasterized
//! into a mip chain. The chain's root is that digit's bucket size; walking
//! it back down gives an element's rank among same-digit elements at smaller
//! slots. Bucket sizes are accumulated into a 17-texel table by additive
//! point draws, so texel `d` holds the number of elements with a smaller
//! digit and the last texel holds the element count.

use bevy::math::UVec2;
use constants::sorting::{RADIX_BUCKETS, RADIX_MASK};

use crate::error::Result;
use crate::keys::{KeyIndexGrid, stored_key_bits};
use crate::raster::{
    BlendMode, MipChain, PointVertex, Texture, draw_fullscreen, draw_points, morton_encode,
};

/// Digit of a stored key for the pass starting at `shift`.
#[inline]
pub fn key_digit(key: f32, key_bits: u32, shift: u32) -> u32 {
    (stored_key_bits(key, key_bits) >> shift) & RADIX_MASK
}

/// Which digit the current pass looks at.
#[derive(Debug, Clone, Copy)]
pub struct DigitSelector {
    pub key_bits: u32,
    pub shift: u32,
    pub count: usize,
}

impl DigitSelector {
    #[inline]
    pub fn digit_at(&self, slot: usize, pair: [f32; 2]) -> Option<u32> {
        (slot < self.count).then(|| key_digit(pair[0], self.key_bits, self.shift))
    }
}

#[derive(Debug, Clone)]
pub struct BucketPrefixSum {
    occupancy: MipChain,
    bucket_bases: Texture<f32>,
}

impl BucketPrefixSum {
    pub fn new(resolution: u32) -> Result<Self> {
        Ok(Self {
            occupancy: MipChain::new("digit_occupancy", resolution)?,
            bucket_bases: Texture::new("bucket_bases", RADIX_BUCKETS as u32 + 1, 1, 0.0),
        })
    }

    /// Start of a pass: no bucket has been counted yet.
    pub fn reset(&mut self) {
        self.bucket_bases.clear(0.0);
    }

    /// Rasterize which slots of `source` carry `digit`, reduce, and append
    /// the bucket size to the base table.
    pub fn count_digit(&mut self, source: &KeyIndexGrid, selector: &DigitSelector, digit: u32) {
        let texture = source.texture();
        draw_fullscreen(self.occupancy.base_mut(), |texel| {
            let slot = morton_encode(texel) as usize;
            match selector.digit_at(slot, texture.load(texel)) {
                Some(d) if d == digit => 1.0,
                _ => 0.0,
            }
        });
        self.occupancy.generate_mips();

        let total = self.occupancy.total() as f32;
        let first = digit + 1;
        draw_points(
            &mut self.bucket_bases,
            RADIX_BUCKETS - digit as usize,
            BlendMode::Add,
            |i| {
                Some(PointVertex {
                    texel: UVec2::new(first + i as u32, 0),
                    value: total,
                })
            },
        );
    }

    /// Elements with a smaller digit, valid once that digit was counted.
    #[inline]
    pub fn bucket_base(&self, digit: u32) -> u32 {
        self.bucket_bases.load(UVec2::new(digit, 0)).round() as u32
    }

    /// Same-digit elements in slots before `texel`, for the digit counted last.
    #[inline]
    pub fn rank(&self, texel: UVec2) -> u32 {
        self.occupancy.prefix_before(texel)
    }

    /// Elements counted so far in this pass.
    pub fn counted(&self) -> u32 {
        self.bucket_base(RADIX_BUCKETS as u32)
    }
}
