//! Camera-distance sorting of splats with rasterization draws only.
//!
//! Positions come in through a [`PositionSource`], are decoded into a
//! position grid, turned into quantised distance keys and ordered by a
//! four-bit-per-pass LSD radix sort whose prefix sums are read from a mip
//! chain. The sorted `(key, index)` grid is the only output.

pub mod bridge;
pub mod config;
pub mod decode;
pub mod error;
pub mod image;
pub mod keys;
pub mod pipeline;
pub mod plugin;
pub mod radix;
pub mod raster;
pub mod schedule;

pub use bridge::{PositionGrid, PositionSource, RawPositionSource, build_position_grid, upload_positions};
pub use config::{SortConfiguration, grid_resolution_for};
pub use decode::{VectorFormat, format_vector_size};
pub use error::{Result, SortError};
pub use keys::{KeyIndexGrid, compute_keys};
pub use pipeline::{SortPipeline, SortRequest};
pub use plugin::{ForceSort, SortCamera, SplatPositions, SplatSortPlugin, SplatSorter};
pub use radix::RadixSortEngine;
pub use schedule::{SortScheduler, SortStatistics, eye_positions};
