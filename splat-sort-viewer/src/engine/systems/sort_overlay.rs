use bevy::prelude::*;
use constants::viewer::{PREVIEW_SPLAT_LIMIT, PREVIEW_SPLAT_RADIUS};
use splat_sort::{ForceSort, SortCamera, SortConfiguration, SplatSorter, eye_positions};

use crate::engine::scene::demo_cloud::SplatPreview;

/// Evenly spaced ranks into a sorted order of `count`, at most `limit` of them.
pub fn preview_ranks(count: usize, limit: usize) -> impl Iterator<Item = usize> {
    let step = count.div_ceil(limit.max(1)).max(1);
    (0..count).step_by(step)
}

/// Draw a sample of the sorted splats, coloured from near (warm) to far (cool).
/// Reads the order straight from the sorter's output.
pub fn draw_sorted_splats(
    mut gizmos: Gizmos,
    splats: Query<(&SplatSorter, &SplatPreview, &GlobalTransform)>,
) {
    for (sorter, preview, transform) in &splats {
        let order = sorter.sorted_indices(0);
        let count = order.len();
        if count == 0 {
            continue;
        }

        for rank in preview_ranks(count, PREVIEW_SPLAT_LIMIT) {
            let Some(local) = preview.positions.get(order[rank] as usize) else {
                continue;
            };
            let world = transform.transform_point(*local);
            let t = rank as f32 / count as f32;
            let colour = Color::srgb(1.0 - t, 0.3, t);
            gizmos.sphere(Isometry3d::from_translation(world), PREVIEW_SPLAT_RADIUS, colour);
        }
    }
}

/// Radius of the head and eye markers.
const EYE_MARKER_RADIUS: f32 = 0.02;

/// Eye positions to mark, only when eyes are sorted separately.
pub fn eye_markers(center: Vec3, right_axis: Vec3, config: &SortConfiguration) -> Option<(Vec3, Vec3)> {
    config
        .separate_eye_sorting
        .then(|| eye_positions(center, right_axis, config.inter_pupillary_distance))
}

/// Sort window around where the last sort happened: the near and far
/// distance spheres, the head centre, and with per-eye sorting both eyes
/// joined by the inter-pupillary line.
pub fn draw_sort_window(
    mut gizmos: Gizmos,
    config: Res<SortConfiguration>,
    cameras: Query<&GlobalTransform, With<SortCamera>>,
    sorters: Query<&SplatSorter>,
) {
    let right_axis = cameras.single().map_or(Vec3::X, |camera| *camera.right());

    for sorter in &sorters {
        let Some(center) = sorter.statistics().last_sort_position else {
            continue;
        };
        let at = |position: Vec3| Isometry3d::from_translation(position);

        gizmos.sphere(at(center), config.max_distance, Color::srgb(0.2, 0.8, 0.2));
        if config.min_distance > 0.0 {
            gizmos.sphere(at(center), config.min_distance, Color::srgb(0.8, 0.8, 0.2));
        }
        gizmos.sphere(at(center), EYE_MARKER_RADIUS, Color::WHITE);

        if let Some((left, right)) = eye_markers(center, right_axis, &config) {
            gizmos.sphere(at(left), EYE_MARKER_RADIUS, Color::srgb(0.2, 0.4, 1.0));
            gizmos.sphere(at(right), EYE_MARKER_RADIUS, Color::srgb(1.0, 0.3, 0.2));
            gizmos.line(left, right, Color::WHITE);
        }
    }
}

/// `R` forces a re-sort, `V` toggles per-eye sorting, `U` toggles sorting every frame.
pub fn sort_keyboard_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut force_sort: EventWriter<ForceSort>,
    mut config: ResMut<SortConfiguration>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        force_sort.write(ForceSort);
    }
    if keyboard.just_pressed(KeyCode::KeyV) {
        config.separate_eye_sorting = !config.separate_eye_sorting;
        info!("Separate eye sorting: {}", config.separate_eye_sorting);
    }
    if keyboard.just_pressed(KeyCode::KeyU) {
        config.always_update = !config.always_update;
        info!("Sort every frame: {}", config.always_update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_samples_are_bounded() {
        assert_eq!(preview_ranks(10, 100).count(), 10);
        assert!(preview_ranks(40_000, 2_000).count() <= 2_000);
        assert_eq!(preview_ranks(0, 5).count(), 0);
        assert_eq!(preview_ranks(9, 3).collect::<Vec<_>>(), vec![0, 3, 6]);
    }

    #[test]
    fn eyes_are_marked_only_for_stereo_sorting() {
        let mono = SortConfiguration::default();
        assert_eq!(eye_markers(Vec3::ZERO, Vec3::X, &mono), None);

        let stereo = SortConfiguration {
            separate_eye_sorting: true,
            inter_pupillary_distance: 0.2,
            ..Default::default()
        };
        let (left, right) = eye_markers(Vec3::Y, Vec3::X, &stereo).unwrap();
        assert!((left - Vec3::new(-0.1, 1.0, 0.0)).length() < 1e-6);
        assert!((right - Vec3::new(0.1, 1.0, 0.0)).length() < 1e-6);
        assert!((left.distance(right) - 0.2).abs() < 1e-6);
    }
}
