/// Sort configuration asset, relative to the asset folder
pub const SORT_CONFIG_PATH: &str = "sort_config.json";

/// Splats in the generated demo cloud
pub const DEMO_SPLAT_COUNT: usize = 40_000;

/// Half extent of the demo cloud in world units
pub const DEMO_CLOUD_RADIUS: f32 = 12.0;

/// Sorted splats drawn by the gizmo overlay, sampled evenly from the order
pub const PREVIEW_SPLAT_LIMIT: usize = 2_000;

pub const PREVIEW_SPLAT_RADIUS: f32 = 0.05;
