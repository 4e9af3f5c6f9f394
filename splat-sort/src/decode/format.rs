use serde::{Deserialize, Serialize};

use crate::error::SortError;

/// Binary encodings a position source may store its records in.
///
/// Discriminants are the wire codes used by splat assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VectorFormat {
    Float32 = 0,
    Norm16 = 1,
    Norm11 = 2,
    Norm6 = 3,
}

impl VectorFormat {
    pub const ALL: [VectorFormat; 4] = [
        VectorFormat::Float32,
        VectorFormat::Norm16,
        VectorFormat::Norm11,
        VectorFormat::Norm6,
    ];

    /// Bytes occupied by one encoded position.
    pub const fn vector_size(self) -> usize {
        match self {
            VectorFormat::Norm11 => 4,
            VectorFormat::Norm16 => 6,
            VectorFormat::Float32 => 12,
            VectorFormat::Norm6 => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VectorFormat::Norm11 => "Norm11 (11+10+11 bits, 4 bytes)",
            VectorFormat::Norm16 => "Norm16 (16+16+16 bits, 6 bytes)",
            VectorFormat::Float32 => "Float32 (32+32+32 bits, 12 bytes)",
            VectorFormat::Norm6 => "Norm6 (6+6+6 bits, 3 bytes)",
        }
    }
}

impl TryFrom<u8> for VectorFormat {
    type Error = SortError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(VectorFormat::Float32),
            1 => Ok(VectorFormat::Norm16),
            2 => Ok(VectorFormat::Norm11),
            3 => Ok(VectorFormat::Norm6),
            other => Err(SortError::UnsupportedFormat(other)),
        }
    }
}

impl From<VectorFormat> for u8 {
    fn from(format: VectorFormat) -> Self {
        format as u8
    }
}

/// Bytes per record for a raw format code, failing on unknown codes rather
/// than guessing a stride.
pub fn format_vector_size(code: u8) -> Result<usize, SortError> {
    VectorFormat::try_from(code).map(VectorFormat::vector_size)
}
