//! Bevy integration: sorts every `SplatPositions` entity against the
//! `SortCamera` and publishes the result as an RG32F image per eye.

use std::sync::Arc;

use bevy::prelude::*;

use crate::bridge::PositionSource;
use crate::config::SortConfiguration;
use crate::error::{Result, SortError};
use crate::image::{texture_to_image, write_texture_to_image};
use crate::pipeline::{SortPipeline, SortRequest};
use crate::schedule::{SortScheduler, SortStatistics, Viewpoints, viewpoints};

#[derive(Default)]
pub struct SplatSortPlugin {
    pub config: SortConfiguration,
}

impl Plugin for SplatSortPlugin {
    fn build(&self, app: &mut App) {
        if let Err(error) = self.config.validate() {
            error!("Splat sort configuration rejected, using defaults: {}", error);
            app.insert_resource(SortConfiguration::default());
        } else {
            app.insert_resource(self.config.clone());
        }

        app.add_event::<ForceSort>().add_systems(
            Update,
            (
                attach_splat_sorters,
                reconfigure_splat_sorters,
                handle_force_sort,
                drive_splat_sorting,
            )
                .chain(),
        );
    }
}

/// Marks the viewpoint splats are sorted against.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct SortCamera;

/// Position storage of a splat set.
#[derive(Component, Clone)]
pub struct SplatPositions(pub Arc<dyn PositionSource>);

/// Request a sort on the next frame regardless of camera movement.
#[derive(Event, Default, Debug, Clone, Copy)]
pub struct ForceSort;

struct EyeSorter {
    pipeline: SortPipeline,
    output: Handle<Image>,
}

impl EyeSorter {
    fn new(config: &SortConfiguration, images: &mut Assets<Image>) -> Result<Self> {
        let pipeline = SortPipeline::for_configuration(config)?;
        let output = images.add(texture_to_image(pipeline.sorted_output().texture()));
        Ok(Self { pipeline, output })
    }
}

/// Per splat set sort state: trigger logic plus one pipeline and output
/// image per eye (a single one unless eyes are sorted separately).
#[derive(Component)]
pub struct SplatSorter {
    scheduler: SortScheduler,
    eyes: Vec<EyeSorter>,
}

impl SplatSorter {
    pub fn new(config: &SortConfiguration, images: &mut Assets<Image>) -> Result<Self> {
        let eye_count = if config.separate_eye_sorting { 2 } else { 1 };
        let eyes = (0..eye_count)
            .map(|_| EyeSorter::new(config, images))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            scheduler: SortScheduler::default(),
            eyes,
        })
    }

    /// Sorted output of `eye` (0 is mono or left, 1 is right).
    ///
    /// An RG32F image of `(key, index)` pairs. Pairs are laid out along the
    /// Z-order curve, not row-major: draw rank `r` lives at texel
    /// [`morton_decode(r)`](crate::raster::morton_decode). Slots past
    /// [`SplatSorter::sorted_count`] hold the padding pair `(1.0, -1.0)`.
    pub fn output(&self, eye: usize) -> Option<&Handle<Image>> {
        self.eyes.get(eye).map(|e| &e.output)
    }

    pub fn sorted_indices(&self, eye: usize) -> Vec<u32> {
        self.eyes
            .get(eye)
            .map(|e| e.pipeline.sorted_indices())
            .unwrap_or_default()
    }

    pub fn sorted_count(&self) -> usize {
        self.eyes.first().map_or(0, |e| e.pipeline.sorted_count())
    }

    pub fn eye_count(&self) -> usize {
        self.eyes.len()
    }

    pub fn resolution(&self) -> u32 {
        self.eyes.first().map_or(0, |e| e.pipeline.resolution())
    }

    pub fn statistics(&self) -> SortStatistics {
        self.scheduler.statistics()
    }

    pub fn force_sort_next_frame(&mut self) {
        self.scheduler.force_sort_next_frame();
    }

    /// Apply a changed configuration. Grids are only rebuilt when their size
    /// or the number of eyes changes; either way the next frame sorts.
    pub fn reconfigure(&mut self, config: &SortConfiguration, images: &mut Assets<Image>) -> Result<()> {
        config.validate()?;
        let eye_count = if config.separate_eye_sorting { 2 } else { 1 };
        if self.resolution() != config.grid_resolution || self.eyes.len() != eye_count {
            let rebuilt = Self::new(config, images)?;
            for eye in self.eyes.drain(..) {
                images.remove(&eye.output);
            }
            self.eyes = rebuilt.eyes;
            self.scheduler.invalidate();
        }
        self.scheduler.force_sort_next_frame();
        Ok(())
    }

    /// Sort if the scheduler says so. Returns whether a sort completed.
    ///
    /// Transient errors retry on the next frame. Any other error is recorded
    /// as an attempt from `center`, so it is not retried until the camera
    /// moves past the threshold or a sort is forced.
    pub fn update(
        &mut self,
        source: &dyn PositionSource,
        world_transform: Mat4,
        center: Vec3,
        right_axis: Vec3,
        config: &SortConfiguration,
        images: &mut Assets<Image>,
    ) -> Result<bool> {
        if !self.scheduler.should_sort(center, config) {
            return Ok(false);
        }

        match self.sort_eyes(source, world_transform, center, right_axis, config, images) {
            Ok(()) => {
                self.scheduler.mark_sorted(center, config);
                Ok(true)
            }
            Err(error) => {
                if !error.is_transient() {
                    self.scheduler.mark_failed(center);
                }
                Err(error)
            }
        }
    }

    fn sort_eyes(
        &mut self,
        source: &dyn PositionSource,
        world_transform: Mat4,
        center: Vec3,
        right_axis: Vec3,
        config: &SortConfiguration,
        images: &mut Assets<Image>,
    ) -> Result<()> {
        let positions = match viewpoints(center, right_axis, config) {
            Viewpoints::Mono(position) => vec![position],
            Viewpoints::Stereo { left, right } => vec![left, right],
        };
        if positions.len() != self.eyes.len() {
            return Err(SortError::MissingResource("sort pipeline for every eye"));
        }

        for (eye, camera_position) in self.eyes.iter_mut().zip(positions) {
            if !images.contains(&eye.output) {
                return Err(SortError::MissingResource("sorted output image"));
            }

            let request = SortRequest {
                camera_position,
                world_transform,
            };
            eye.pipeline.sort(source, &request, config)?;

            let image = images
                .get_mut(&eye.output)
                .ok_or(SortError::MissingResource("sorted output image"))?;
            write_texture_to_image(eye.pipeline.sorted_output().texture(), image)?;
        }
        Ok(())
    }
}

pub fn attach_splat_sorters(
    mut commands: Commands,
    added: Query<Entity, (Added<SplatPositions>, Without<SplatSorter>)>,
    config: Res<SortConfiguration>,
    mut images: ResMut<Assets<Image>>,
) {
    for entity in &added {
        match SplatSorter::new(&config, &mut images) {
            Ok(sorter) => {
                info!(
                    "Splat sorter attached ({}x{} grid, {} passes)",
                    config.grid_resolution, config.grid_resolution, config.pass_count
                );
                commands.entity(entity).insert(sorter);
            }
            Err(error) => error!("Could not create splat sorter: {}", error),
        }
    }
}

pub fn reconfigure_splat_sorters(
    config: Res<SortConfiguration>,
    mut sorters: Query<&mut SplatSorter>,
    mut images: ResMut<Assets<Image>>,
) {
    if !config.is_changed() || config.is_added() {
        return;
    }

    for mut sorter in &mut sorters {
        if let Err(error) = sorter.reconfigure(&config, &mut images) {
            warn!("Splat sort configuration not applied: {}", error);
            return;
        }
    }
}

pub fn handle_force_sort(mut events: EventReader<ForceSort>, mut sorters: Query<&mut SplatSorter>) {
    if events.read().count() == 0 {
        return;
    }
    for mut sorter in &mut sorters {
        sorter.force_sort_next_frame();
    }
}

pub fn drive_splat_sorting(
    config: Res<SortConfiguration>,
    cameras: Query<&GlobalTransform, With<SortCamera>>,
    mut splats: Query<(&SplatPositions, Option<&GlobalTransform>, &mut SplatSorter)>,
    mut images: ResMut<Assets<Image>>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };
    let center = camera.translation();
    let right_axis = *camera.right();

    for (positions, transform, mut sorter) in &mut splats {
        let world_transform = transform.map_or(Mat4::IDENTITY, GlobalTransform::compute_matrix);
        if let Err(error) = sorter.update(
            positions.0.as_ref(),
            world_transform,
            center,
            right_axis,
            &config,
            &mut images,
        ) {
            if error.is_transient() {
                error!("Splat sort failed, will retry next frame: {}", error);
            } else {
                error!("Splat sort failed, will retry after the camera moves: {}", error);
            }
        }
    }
}
