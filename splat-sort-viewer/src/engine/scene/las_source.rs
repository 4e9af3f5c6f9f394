use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bevy::prelude::*;
use constants::texture::MAX_GRID_RESOLUTION;
use las::Reader;

/// Most splats one sorter can hold.
const MAX_SORTABLE_POINTS: usize = MAX_GRID_RESOLUTION as usize * MAX_GRID_RESOLUTION as usize;

/// Positions of a LAS/LAZ file normalised into [-1, 1] per axis.
pub struct LasCloud {
    pub path: String,
    pub positions: Vec<Vec3>,
    pub center: Vec3,
    pub half_extent: Vec3,
}

/// Read every point, converting LAS Z-up into Y-up.
pub fn load_las_positions(path: &str) -> Result<LasCloud, Box<dyn std::error::Error>> {
    let file = File::open(Path::new(path))?;
    let mut reader = Reader::new(BufReader::new(file))?;

    let mut world = Vec::with_capacity(reader.header().number_of_points() as usize);
    for point_result in reader.points() {
        let point = point_result?;
        world.push(Vec3::new(point.x as f32, point.z as f32, -point.y as f32));
    }
    if world.is_empty() {
        return Err(format!("{path} contains no points").into());
    }
    if world.len() > MAX_SORTABLE_POINTS {
        let total = world.len();
        world = thin_points(world, MAX_SORTABLE_POINTS);
        warn!(
            "{} has {} points, keeping every {}th ({} points) to fit the sort grid",
            path,
            total,
            total.div_ceil(MAX_SORTABLE_POINTS),
            world.len()
        );
    }

    let (positions, center, half_extent) = normalise_positions(&world);
    Ok(LasCloud {
        path: path.to_string(),
        positions,
        center,
        half_extent,
    })
}

/// Keep every n-th point so at most `limit` remain.
pub fn thin_points(points: Vec<Vec3>, limit: usize) -> Vec<Vec3> {
    if points.len() <= limit {
        return points;
    }
    let stride = points.len().div_ceil(limit.max(1));
    points.into_iter().step_by(stride).collect()
}

/// Map positions into [-1, 1] around their bounds centre. Flat axes keep a
/// non-zero extent so the scale stays invertible.
pub fn normalise_positions(world: &[Vec3]) -> (Vec<Vec3>, Vec3, Vec3) {
    let (min, max) = world
        .iter()
        .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), p| {
            (min.min(*p), max.max(*p))
        });
    let center = (min + max) * 0.5;
    let half_extent = ((max - min) * 0.5).max(Vec3::splat(1e-3));

    let positions = world.iter().map(|p| (*p - center) / half_extent).collect();
    (positions, center, half_extent)
}
