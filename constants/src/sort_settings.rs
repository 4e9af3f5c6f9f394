/// 12-bit keys; the usual trade-off on mobile GPUs
pub const DEFAULT_PASS_COUNT: u8 = 3;

/// Near end of the normalisation window (metres)
pub const DEFAULT_MIN_DISTANCE: f32 = 0.0;

/// Far end of the normalisation window (metres)
pub const DEFAULT_MAX_DISTANCE: f32 = 50.0;

/// Camera displacement that triggers a re-sort (metres)
pub const DEFAULT_QUANTIZATION_THRESHOLD: f32 = 0.05;

/// Average adult inter-pupillary distance (metres)
pub const DEFAULT_INTER_PUPILLARY_DISTANCE: f32 = 0.064;
