//! Position decoding from compact binary encodings into canonical vectors.
//!
//! Every decoder is a pure function. Normalised formats map raw integers onto
//! [-1, 1] with `raw / max_raw * 2 - 1`; Float32 passes values through.

mod format;

pub use format::{VectorFormat, format_vector_size};

use bevy::math::Vec3;

use crate::error::{Result, SortError};

const NORM11_MAX: f32 = 2047.0;
const NORM10_MAX: f32 = 1023.0;
const NORM16_MAX: f32 = 65535.0;
const NORM6_MAX: f32 = 63.0;

#[inline]
fn unorm_to_snorm(raw: u32, max_raw: f32) -> f32 {
    raw as f32 / max_raw * 2.0 - 1.0
}

/// Decode a packed 11/10/11 value: X in bits 31-21, Y in 20-11, Z in 10-0.
#[inline]
pub fn decode_norm11(packed: u32) -> Vec3 {
    let x = (packed >> 21) & 0x7FF;
    let y = (packed >> 11) & 0x3FF;
    let z = packed & 0x7FF;

    Vec3::new(
        unorm_to_snorm(x, NORM11_MAX),
        unorm_to_snorm(y, NORM10_MAX),
        unorm_to_snorm(z, NORM11_MAX),
    )
}

#[inline]
pub fn decode_norm16(x: u16, y: u16, z: u16) -> Vec3 {
    Vec3::new(
        unorm_to_snorm(x as u32, NORM16_MAX),
        unorm_to_snorm(y as u32, NORM16_MAX),
        unorm_to_snorm(z as u32, NORM16_MAX),
    )
}

#[inline]
pub fn decode_float32(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Decode three bytes whose top six bits carry one axis each.
#[inline]
pub fn decode_norm6(x: u8, y: u8, z: u8) -> Vec3 {
    let axis = |byte: u8| unorm_to_snorm(((byte >> 2) & 0x3F) as u32, NORM6_MAX);
    Vec3::new(axis(x), axis(y), axis(z))
}

/// Decode one little-endian record. `record` must be exactly
/// `format.vector_size()` bytes long.
pub fn decode_record(format: VectorFormat, record: &[u8]) -> Result<Vec3> {
    if record.len() != format.vector_size() {
        return Err(SortError::InvalidBufferSize {
            expected: format.vector_size(),
            actual: record.len(),
        });
    }

    let u16_at = |i: usize| u16::from_le_bytes([record[i], record[i + 1]]);
    let f32_at =
        |i: usize| f32::from_le_bytes([record[i], record[i + 1], record[i + 2], record[i + 3]]);

    Ok(match format {
        VectorFormat::Norm11 => decode_norm11(u32::from_le_bytes([
            record[0], record[1], record[2], record[3],
        ])),
        VectorFormat::Norm16 => decode_norm16(u16_at(0), u16_at(2), u16_at(4)),
        VectorFormat::Float32 => decode_float32(f32_at(0), f32_at(4), f32_at(8)),
        VectorFormat::Norm6 => decode_norm6(record[0], record[1], record[2]),
    })
}

/// Encoders used to build fixtures and synthetic sources. They quantise to
/// the nearest representable step.
pub mod encode {
    use bevy::math::Vec3;

    fn snorm_to_unorm(v: f32, max_raw: f32) -> u32 {
        (((v.clamp(-1.0, 1.0) + 1.0) * 0.5) * max_raw).round() as u32
    }

    pub fn encode_norm11(v: Vec3) -> u32 {
        (snorm_to_unorm(v.x, super::NORM11_MAX) << 21)
            | (snorm_to_unorm(v.y, super::NORM10_MAX) << 11)
            | snorm_to_unorm(v.z, super::NORM11_MAX)
    }

    pub fn encode_norm16(v: Vec3) -> [u16; 3] {
        [
            snorm_to_unorm(v.x, super::NORM16_MAX) as u16,
            snorm_to_unorm(v.y, super::NORM16_MAX) as u16,
            snorm_to_unorm(v.z, super::NORM16_MAX) as u16,
        ]
    }

    pub fn encode_norm6(v: Vec3) -> [u8; 3] {
        [
            (snorm_to_unorm(v.x, super::NORM6_MAX) as u8) << 2,
            (snorm_to_unorm(v.y, super::NORM6_MAX) as u8) << 2,
            (snorm_to_unorm(v.z, super::NORM6_MAX) as u8) << 2,
        ]
    }

    /// Append one record in `format` to `out`.
    pub fn encode_record(format: super::VectorFormat, v: Vec3, out: &mut Vec<u8>) {
        use super::VectorFormat;
        match format {
            VectorFormat::Norm11 => out.extend_from_slice(&encode_norm11(v).to_le_bytes()),
            VectorFormat::Norm16 => {
                for axis in encode_norm16(v) {
                    out.extend_from_slice(&axis.to_le_bytes());
                }
            }
            VectorFormat::Float32 => {
                for axis in v.to_array() {
                    out.extend_from_slice(&axis.to_le_bytes());
                }
            }
            VectorFormat::Norm6 => out.extend_from_slice(&encode_norm6(v)),
        }
    }
}
