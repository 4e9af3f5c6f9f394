//! Position sources and the grid the key stage reads from.

use std::borrow::Cow;

use bevy::log::debug;
use bevy::math::{UVec2, Vec3};
use rayon::prelude::*;

use crate::decode::{VectorFormat, decode_record, encode::encode_record};
use crate::error::{Result, SortError};
use crate::raster::{Texture, draw_fullscreen};

/// Anything that can hand over encoded splat positions.
///
/// The sorter never looks behind this interface; a renderer exposes its
/// storage by implementing it.
pub trait PositionSource: Send + Sync {
    fn count(&self) -> usize;

    fn format(&self) -> VectorFormat;

    /// All `count` records back to back, little-endian. May block while the
    /// bytes are transferred off the device.
    fn raw_position_bytes(&self) -> Result<Cow<'_, [u8]>>;
}

/// A position source backed by bytes already in memory.
#[derive(Debug, Clone)]
pub struct RawPositionSource {
    bytes: Vec<u8>,
    count: usize,
    format: VectorFormat,
}

impl RawPositionSource {
    pub fn new(bytes: Vec<u8>, count: usize, format: VectorFormat) -> Self {
        Self {
            bytes,
            count,
            format,
        }
    }

    /// Build from a wire format code, rejecting codes no decoder exists for.
    pub fn from_format_code(bytes: Vec<u8>, count: usize, code: u8) -> Result<Self> {
        Ok(Self::new(bytes, count, VectorFormat::try_from(code)?))
    }

    /// Encode `positions` into `format`.
    pub fn from_positions(format: VectorFormat, positions: &[Vec3]) -> Self {
        let mut bytes = Vec::with_capacity(positions.len() * format.vector_size());
        for &position in positions {
            encode_record(format, position, &mut bytes);
        }
        Self::new(bytes, positions.len(), format)
    }
}

impl PositionSource for RawPositionSource {
    fn count(&self) -> usize {
        self.count
    }

    fn format(&self) -> VectorFormat {
        self.format
    }

    fn raw_position_bytes(&self) -> Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(&self.bytes))
    }
}

/// Decoded positions laid out row-major in an RGBA32F grid.
///
/// Valid cells carry alpha 1; padding cells are all zero.
#[derive(Debug, Clone)]
pub struct PositionGrid {
    texture: Texture<[f32; 4]>,
    count: usize,
}

impl PositionGrid {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn size(&self) -> UVec2 {
        self.texture.size()
    }

    pub fn texture(&self) -> &Texture<[f32; 4]> {
        &self.texture
    }

    /// Canonical position of element `index`, `None` for padding.
    pub fn load_element(&self, index: usize) -> Option<Vec3> {
        if index >= self.count {
            return None;
        }
        let width = self.texture.width() as usize;
        let [x, y, z, _] = self
            .texture
            .load(UVec2::new((index % width) as u32, (index / width) as u32));
        Some(Vec3::new(x, y, z))
    }
}

/// Grid size for `count` elements: `w = ceil(sqrt(count))`, `h = ceil(count / w)`.
pub fn grid_dimensions(count: usize) -> UVec2 {
    if count == 0 {
        return UVec2::ZERO;
    }

    let mut width = (count as f64).sqrt().ceil() as usize;
    // float sqrt can be off by one for large counts
    while width > 1 && (width - 1) * (width - 1) >= count {
        width -= 1;
    }
    while width * width < count {
        width += 1;
    }

    UVec2::new(width as u32, count.div_ceil(width) as u32)
}

/// Decode `count` records of `format` from `bytes` into a fresh grid.
pub fn build_position_grid(bytes: &[u8], count: usize, format: VectorFormat) -> Result<PositionGrid> {
    let stride = format.vector_size();
    if count == 0 {
        return Err(SortError::InvalidBufferSize {
            expected: stride,
            actual: bytes.len(),
        });
    }
    if bytes.len() != count * stride {
        return Err(SortError::InvalidBufferSize {
            expected: count * stride,
            actual: bytes.len(),
        });
    }

    let decoded = bytes
        .par_chunks_exact(stride)
        .map(|record| decode_record(format, record))
        .collect::<Result<Vec<Vec3>>>()?;

    let size = grid_dimensions(count);
    let mut texture = Texture::new("position_grid", size.x, size.y, [0.0; 4]);
    draw_fullscreen(&mut texture, |texel| {
        let index = (texel.y * size.x + texel.x) as usize;
        match decoded.get(index) {
            Some(p) => [p.x, p.y, p.z, 1.0],
            None => [0.0; 4],
        }
    });

    debug!(
        "Decoded {} {} positions into {}x{} grid",
        count,
        format.description(),
        size.x,
        size.y
    );

    Ok(PositionGrid { texture, count })
}

/// Pull the bytes out of `source` and build its position grid.
pub fn upload_positions(source: &dyn PositionSource) -> Result<PositionGrid> {
    let bytes = source.raw_position_bytes()?;
    build_position_grid(&bytes, source.count(), source.format())
}
