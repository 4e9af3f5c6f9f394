use bevy::math::UVec2;
use bevy::render::render_resource::TextureFormat;
use bytemuck::Pod;

/// A value that can live in one texel of a render target.
pub trait Texel: Pod + Send + Sync + PartialEq + std::fmt::Debug {
    /// GPU format the texel maps onto when uploaded.
    const FORMAT: TextureFormat;

    /// Additive blend (`ONE, ONE`).
    fn blend_add(self, other: Self) -> Self;
}

impl Texel for f32 {
    const FORMAT: TextureFormat = TextureFormat::R32Float;

    fn blend_add(self, other: Self) -> Self {
        self + other
    }
}

impl Texel for [f32; 2] {
    const FORMAT: TextureFormat = TextureFormat::Rg32Float;

    fn blend_add(self, other: Self) -> Self {
        [self[0] + other[0], self[1] + other[1]]
    }
}

impl Texel for [f32; 4] {
    const FORMAT: TextureFormat = TextureFormat::Rgba32Float;

    fn blend_add(self, other: Self) -> Self {
        [
            self[0] + other[0],
            self[1] + other[1],
            self[2] + other[2],
            self[3] + other[3],
        ]
    }
}

/// A 2D render target with row-major texel storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture<T: Texel> {
    label: &'static str,
    width: u32,
    height: u32,
    texels: Vec<T>,
}

impl<T: Texel> Texture<T> {
    pub fn new(label: &'static str, width: u32, height: u32, fill: T) -> Self {
        Self {
            label,
            width,
            height,
            texels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn texel_count(&self) -> usize {
        self.texels.len()
    }

    pub fn contains(&self, texel: UVec2) -> bool {
        texel.x < self.width && texel.y < self.height
    }

    /// Unfiltered fetch with clamp-to-edge addressing.
    #[inline]
    pub fn load(&self, texel: UVec2) -> T {
        let x = texel.x.min(self.width.saturating_sub(1));
        let y = texel.y.min(self.height.saturating_sub(1));
        self.texels[(y * self.width + x) as usize]
    }

    /// Load-op clear of the whole target.
    pub fn clear(&mut self, value: T) {
        self.texels.fill(value);
    }

    pub fn texels(&self) -> &[T] {
        &self.texels
    }

    pub(crate) fn texels_mut(&mut self) -> &mut [T] {
        &mut self.texels
    }

    /// Raw little-endian bytes in the layout `T::FORMAT` expects.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_clamps_to_edge() {
        let mut texture = Texture::new("test", 2, 2, 0.0f32);
        texture.texels_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(texture.load(UVec2::new(1, 0)), 2.0);
        assert_eq!(texture.load(UVec2::new(0, 1)), 3.0);
        assert_eq!(texture.load(UVec2::new(9, 9)), 4.0);
    }

    #[test]
    fn byte_view_matches_format_stride() {
        let texture = Texture::new("pairs", 3, 2, [0.5f32, 7.0]);
        assert_eq!(texture.as_bytes().len(), 3 * 2 * 8);
        assert_eq!(<[f32; 2] as Texel>::FORMAT, TextureFormat::Rg32Float);
    }
}
