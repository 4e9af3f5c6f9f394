use bevy::prelude::*;
use constants::viewer::SORT_CONFIG_PATH;
use splat_sort::SortConfiguration;

use crate::engine::scene::demo_cloud::{LoadedCloud, fit_configuration_to_cloud};

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<SortConfiguration>>,
}

pub fn start_loading(mut loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(SORT_CONFIG_PATH));
}

/// Install the JSON configuration once it loads, and again on every reload.
/// Invalid files are reported and the running configuration is kept. The
/// grid is grown to hold the loaded cloud if the file asks for less.
pub fn apply_loaded_configuration(
    loader: Res<ConfigLoader>,
    cloud: Option<Res<LoadedCloud>>,
    mut events: EventReader<AssetEvent<SortConfiguration>>,
    configurations: Res<Assets<SortConfiguration>>,
    mut active: ResMut<SortConfiguration>,
) {
    let Some(handle) = &loader.handle else {
        return;
    };

    for event in events.read() {
        let id = match event {
            AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id } => *id,
            _ => continue,
        };
        if id != handle.id() {
            continue;
        }
        let Some(loaded) = configurations.get(id) else {
            continue;
        };
        let mut loaded = loaded.clone();
        if let Some(cloud) = &cloud {
            fit_configuration_to_cloud(&mut loaded, cloud.splat_count);
        }

        match loaded.validate() {
            Ok(()) if *active != loaded => {
                println!("✓ Sort configuration loaded from {}", SORT_CONFIG_PATH);
                *active = loaded;
            }
            Ok(()) => {}
            Err(error) => warn!("Ignoring {}: {}", SORT_CONFIG_PATH, error),
        }
    }
}
