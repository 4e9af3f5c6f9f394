//! Z-order curve used as the linear addressing of key/index textures.
//!
//! X occupies the even bits and Y the odd bits, so the four children of a
//! 2x2 block are visited as (0,0), (1,0), (0,1), (1,1). This matches the
//! sibling order walked when reading prefix sums back out of a mip chain.

use bevy::math::UVec2;

#[inline]
fn spread_bits(v: u32) -> u32 {
    let mut v = v & 0x0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333;
    (v | (v << 1)) & 0x5555_5555
}

#[inline]
fn compact_bits(v: u32) -> u32 {
    let mut v = v & 0x5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF;
    (v | (v >> 8)) & 0x0000_FFFF
}

/// Linear slot of a texel. Coordinates must fit in 16 bits.
#[inline]
pub fn morton_encode(texel: UVec2) -> u32 {
    spread_bits(texel.x) | (spread_bits(texel.y) << 1)
}

/// Texel holding a linear slot.
#[inline]
pub fn morton_decode(slot: u32) -> UVec2 {
    UVec2::new(compact_bits(slot), compact_bits(slot >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_block_order() {
        assert_eq!(morton_decode(0), UVec2::new(0, 0));
        assert_eq!(morton_decode(1), UVec2::new(1, 0));
        assert_eq!(morton_decode(2), UVec2::new(0, 1));
        assert_eq!(morton_decode(3), UVec2::new(1, 1));
        assert_eq!(morton_decode(4), UVec2::new(2, 0));
    }

    #[test]
    fn slots_cover_square_exactly_once() {
        let resolution = 16u32;
        let mut seen = vec![false; (resolution * resolution) as usize];
        for slot in 0..resolution * resolution {
            let texel = morton_decode(slot);
            assert!(texel.x < resolution && texel.y < resolution);
            assert_eq!(morton_encode(texel), slot);
            let index = (texel.y * resolution + texel.x) as usize;
            assert!(!seen[index]);
            seen[index] = true;
        }
    }

    #[test]
    fn large_coordinates_round_trip() {
        let texel = UVec2::new(4095, 2048);
        assert_eq!(morton_decode(morton_encode(texel)), texel);
    }
}
