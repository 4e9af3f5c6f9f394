//! Raster targets as Bevy images.

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureUsages};

use crate::error::{Result, SortError};
use crate::raster::{Texel, Texture};

fn extent<T: Texel>(texture: &Texture<T>) -> Extent3d {
    Extent3d {
        width: texture.width(),
        height: texture.height(),
        depth_or_array_layers: 1,
    }
}

/// New image holding `texture`, sampled without filtering.
pub fn texture_to_image<T: Texel>(texture: &Texture<T>) -> Image {
    let mut image = Image::new(
        extent(texture),
        TextureDimension::D2,
        texture.as_bytes().to_vec(),
        T::FORMAT,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    image.texture_descriptor.label = Some(texture.label());
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::COPY_SRC;

    // key/index pairs must never be blended between texels
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        mag_filter: ImageFilterMode::Nearest,
        min_filter: ImageFilterMode::Nearest,
        ..default()
    });
    image
}

/// Overwrite `image` with the texels of `texture`, resizing if needed.
pub fn write_texture_to_image<T: Texel>(texture: &Texture<T>, image: &mut Image) -> Result<()> {
    if image.texture_descriptor.format != T::FORMAT {
        return Err(SortError::MissingResource("output image with matching texel format"));
    }

    image.texture_descriptor.size = extent(texture);
    image.data = Some(texture.as_bytes().to_vec());
    Ok(())
}
