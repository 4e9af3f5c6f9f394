use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use splat_sort::{SortCamera, SortConfiguration, SplatSortPlugin};

use crate::engine::camera::orbit_camera::{OrbitCamera, orbit_camera_controller};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::config_loader::{
    ConfigLoader, apply_loaded_configuration, start_loading,
};
use crate::engine::scene::demo_cloud::spawn_splat_cloud;
use crate::engine::systems::fps_tracking::{
    FpsText, SortStatsText, fps_text_update_system, sort_stats_text_system,
};
use crate::engine::systems::sort_overlay::{
    draw_sort_window, draw_sorted_splats, sort_keyboard_controls,
};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers SortConfiguration as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<SortConfiguration>::new(&["json"]))
        .add_plugins(SplatSortPlugin::default());

    app.init_resource::<ConfigLoader>()
        .init_resource::<OrbitCamera>();

    app.add_systems(Startup, (setup, start_loading, spawn_splat_cloud))
        .add_systems(
            Update,
            (
                apply_loaded_configuration,
                sort_keyboard_controls,
                orbit_camera_controller,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                fps_text_update_system,
                sort_stats_text_system,
                draw_sorted_splats,
                draw_sort_window,
            ),
        );

    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_sort_camera(commands: &mut Commands, orbit: &OrbitCamera) {
    commands.spawn((Camera3d::default(), orbit.transform(), SortCamera));
}

fn setup(mut commands: Commands, orbit: Res<OrbitCamera>) {
    spawn_lighting(&mut commands);
    spawn_sort_camera(&mut commands, &orbit);
    create_overlays(&mut commands);
}

fn create_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
            parent.spawn((
                Text::new("Sorts: 0"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                SortStatsText,
            ));
        });
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
