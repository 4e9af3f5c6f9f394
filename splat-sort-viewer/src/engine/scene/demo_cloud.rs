use std::sync::Arc;

use bevy::prelude::*;
use constants::viewer::{DEMO_CLOUD_RADIUS, DEMO_SPLAT_COUNT};
use splat_sort::{RawPositionSource, SortConfiguration, SplatPositions, VectorFormat};

use super::las_source::load_las_positions;
use crate::engine::camera::orbit_camera::OrbitCamera;

/// Local-space positions kept on the CPU for the preview overlay.
#[derive(Component, Debug, Clone)]
pub struct SplatPreview {
    pub positions: Vec<Vec3>,
}

/// Size of the spawned splat set, so later configurations can be fitted to it.
#[derive(Resource, Debug, Clone, Copy)]
pub struct LoadedCloud {
    pub splat_count: usize,
}

/// Grow the grid in `config` until `splat_count` splats fit, logging when it
/// had to. Returns false when no accepted grid is large enough.
pub fn fit_configuration_to_cloud(config: &mut SortConfiguration, splat_count: usize) -> bool {
    match config.fit_to(splat_count) {
        Ok(true) => {
            info!(
                "Sort grid raised to {}x{} for {} splats",
                config.grid_resolution, config.grid_resolution, splat_count
            );
            true
        }
        Ok(false) => true,
        Err(error) => {
            warn!("Splat cloud does not fit the sort grid: {}", error);
            false
        }
    }
}

/// Deterministic cloud of points inside the unit cube: a few nested shells
/// plus a loose helix, so distance ordering is easy to see.
pub fn generate_demo_positions(count: usize) -> Vec<Vec3> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    (0..count)
        .map(|i| {
            let t = i as f32 / count.max(1) as f32;
            if i % 5 == 4 {
                let angle = t * std::f32::consts::TAU * 6.0;
                return Vec3::new(angle.cos() * 0.3, t * 2.0 - 1.0, angle.sin() * 0.3);
            }

            let shell = 0.35 + 0.3 * (i % 3) as f32;
            let y = 1.0 - 2.0 * t;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            Vec3::new(theta.cos() * ring, y, theta.sin() * ring) * shell
        })
        .collect()
}

/// Spawn the splat set: a LAS/LAZ file given as the first argument, or the
/// generated demo cloud.
pub fn spawn_splat_cloud(
    mut commands: Commands,
    mut orbit: ResMut<OrbitCamera>,
    mut config: ResMut<SortConfiguration>,
) {
    let las_path = std::env::args().nth(1);

    let (source, preview, scale, center) = match las_path.as_deref().map(load_las_positions) {
        Some(Ok(cloud)) => {
            println!("✓ Loaded {} points from {}", cloud.positions.len(), cloud.path);
            (
                RawPositionSource::from_positions(VectorFormat::Norm16, &cloud.positions),
                cloud.positions,
                cloud.half_extent,
                cloud.center,
            )
        }
        other => {
            if let Some(Err(error)) = other {
                warn!("Could not read point cloud, using demo cloud: {}", error);
            }
            let positions = generate_demo_positions(DEMO_SPLAT_COUNT);
            (
                RawPositionSource::from_positions(VectorFormat::Norm11, &positions),
                positions,
                Vec3::splat(DEMO_CLOUD_RADIUS),
                Vec3::ZERO,
            )
        }
    };

    let splat_count = preview.len();
    fit_configuration_to_cloud(&mut config, splat_count);
    commands.insert_resource(LoadedCloud { splat_count });

    orbit.focus_point = center;
    orbit.distance = scale.max_element() * 2.5;

    commands.spawn((
        SplatPositions(Arc::new(source)),
        SplatPreview { positions: preview },
        Transform::from_translation(center).with_scale(scale),
    ));
}
