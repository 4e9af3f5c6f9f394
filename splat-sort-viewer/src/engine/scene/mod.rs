/// Procedural splat cloud used when no LAS/LAZ file is given.
pub mod demo_cloud;

/// Positions read from LAS/LAZ files.
pub mod las_source;
