use bevy::math::UVec2;
use rayon::prelude::*;

use super::texture::{Texel, Texture};

/// How a rasterized point combines with the texel already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Replace,
    Add,
}

/// Output of one point vertex invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointVertex<T> {
    pub texel: UVec2,
    pub value: T,
}

/// Full-screen quad: one fragment per target texel.
///
/// A fragment only writes its own texel and never sees the target's
/// contents, so rows are shaded in parallel.
pub fn draw_fullscreen<T, F>(target: &mut Texture<T>, fragment: F)
where
    T: Texel,
    F: Fn(UVec2) -> T + Sync,
{
    let width = target.width() as usize;
    if width == 0 {
        return;
    }

    target
        .texels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                *texel = fragment(UVec2::new(x as u32, y as u32));
            }
        });
}

/// Point list draw. Vertices are shaded in parallel, then rasterized in
/// submission order; a vertex returning `None` or landing outside the target
/// is clipped. Returns the number of points written.
pub fn draw_points<T, F>(
    target: &mut Texture<T>,
    point_count: usize,
    blend: BlendMode,
    vertex: F,
) -> usize
where
    T: Texel,
    F: Fn(usize) -> Option<PointVertex<T>> + Send + Sync,
{
    let shaded: Vec<Option<PointVertex<T>>> = (0..point_count).into_par_iter().map(vertex).collect();

    let width = target.width();
    let mut written = 0;
    for point in shaded.into_iter().flatten() {
        if !target.contains(point.texel) {
            continue;
        }
        let index = (point.texel.y * width + point.texel.x) as usize;
        let texels = target.texels_mut();
        texels[index] = match blend {
            BlendMode::Replace => point.value,
            BlendMode::Add => texels[index].blend_add(point.value),
        };
        written += 1;
    }
    written
}
