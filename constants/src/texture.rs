/// Default key/index texture resolution (square, power of two)
pub const DEFAULT_GRID_RESOLUTION: u32 = 1024;

/// Largest resolution accepted by configuration validation
pub const MAX_GRID_RESOLUTION: u32 = 4096;
