use image::RgbaImage;

use crate::atlas::AtlasLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasKind {
    Image,
    Label,
}

/// Sampling setup the tiling shader expects for both atlases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSettings {
    pub generate_mipmaps: bool,
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
    pub wrap_u: wgpu::AddressMode,
    pub wrap_v: wgpu::AddressMode,
    /// Rows are stored top-down; the shader's UV origin matches.
    pub flip_y: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            generate_mipmaps: false,
            min_filter: wgpu::FilterMode::Linear,
            mag_filter: wgpu::FilterMode::Linear,
            wrap_u: wgpu::AddressMode::ClampToEdge,
            wrap_v: wgpu::AddressMode::ClampToEdge,
            flip_y: false,
        }
    }
}

/// A finished atlas: the composited surface plus its texture metadata.
#[derive(Debug)]
pub struct AtlasTexture {
    kind: AtlasKind,
    layout: AtlasLayout,
    surface: RgbaImage,
    settings: TextureSettings,
}

impl AtlasTexture {
    pub(crate) fn new(kind: AtlasKind, layout: AtlasLayout, surface: RgbaImage) -> Self {
        debug_assert_eq!(surface.width(), layout.canvas_size_px());
        debug_assert_eq!(surface.height(), layout.canvas_size_px());
        Self {
            kind,
            layout,
            surface,
            settings: TextureSettings::default(),
        }
    }

    pub fn kind(&self) -> AtlasKind {
        self.kind
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    pub fn size_px(&self) -> u32 {
        self.surface.width()
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            AtlasKind::Image => "atlas_gallery::image_atlas",
            AtlasKind::Label => "atlas_gallery::label_atlas",
        }
    }

    pub fn texture_descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some(self.label()),
            size: wgpu::Extent3d {
                width: self.surface.width(),
                height: self.surface.height(),
                depth_or_array_layers: 1,
            },
            // No mip chain; the grid is sampled at roughly native resolution
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }

    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some(self.label()),
            address_mode_u: self.settings.wrap_u,
            address_mode_v: self.settings.wrap_v,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.settings.mag_filter,
            min_filter: self.settings.min_filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_follow_settings() {
        let layout = AtlasLayout::new(3, 4).unwrap();
        let atlas = AtlasTexture::new(AtlasKind::Label, layout, RgbaImage::new(8, 8));

        let settings = atlas.settings();
        assert!(!settings.generate_mipmaps);
        assert!(!settings.flip_y);

        let texture = atlas.texture_descriptor();
        assert_eq!(texture.mip_level_count, 1);
        assert_eq!(texture.size.width, 8);
        assert_eq!(texture.size.height, 8);
        assert_eq!(texture.label, Some("atlas_gallery::label_atlas"));

        let sampler = atlas.sampler_descriptor();
        assert_eq!(sampler.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(sampler.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(sampler.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(sampler.address_mode_v, wgpu::AddressMode::ClampToEdge);
    }
}
