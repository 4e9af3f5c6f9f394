use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use splat_sort::SplatSorter;

#[derive(Component)]
pub struct FpsText;

#[derive(Component)]
pub struct SortStatsText;

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

pub fn sort_stats_text_system(
    sorters: Query<&SplatSorter>,
    mut query: Query<&mut Text, With<SortStatsText>>,
) {
    let Some(sorter) = sorters.iter().next() else {
        return;
    };
    let statistics = sorter.statistics();
    let position = statistics
        .last_sort_position
        .map_or_else(|| "-".to_string(), |p| format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));

    for mut text in &mut query {
        text.0 = format!(
            "Sorts: {}  Splats: {}  Eyes: {}  Last sort at {}",
            statistics.sort_count,
            sorter.sorted_count(),
            sorter.eye_count(),
            position
        );
    }
}
