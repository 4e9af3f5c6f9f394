//! Rasterization primitives the sort is written against.
//!
//! Only three operations exist: clearing a target, drawing a fullscreen quad
//! and drawing a point list. Every draw completes before the next one starts,
//! which is the only ordering the sort relies on.

mod draw;
mod mip_chain;
pub mod morton;
mod texture;

pub use draw::{BlendMode, PointVertex, draw_fullscreen, draw_points};
pub use mip_chain::MipChain;
pub use morton::{morton_decode, morton_encode};
pub use texture::{Texel, Texture};
