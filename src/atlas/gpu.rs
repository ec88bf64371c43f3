use std::sync::Arc;

use wgpu::util::DeviceExt;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::AtlasTexture;
use crate::uniforms::GridUniforms;

/// An atlas uploaded to the GPU, ready to bind next to its sampler.
#[derive(Debug)]
pub struct GpuAtlas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    source: Arc<AtlasTexture>,
}

impl GpuAtlas {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, atlas: &Arc<AtlasTexture>) -> Self {
        let descriptor = atlas.texture_descriptor();
        let texture = device.create_texture(&descriptor);
        let (width, height) = atlas.surface().dimensions();

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(atlas.surface().as_raw()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            descriptor.size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&atlas.sampler_descriptor());
        debug!("Uploaded {} ({}x{})", atlas.label(), width, height);

        Self {
            texture,
            view,
            sampler,
            source: Arc::clone(atlas),
        }
    }

    /// Whether this upload still reflects `atlas` (atlases are replaced, never patched).
    pub fn is_current(&self, atlas: &Arc<AtlasTexture>) -> bool {
        Arc::ptr_eq(&self.source, atlas)
    }
}

/// Uniform buffer holding the per-frame scalar block.
#[derive(Debug)]
pub struct GpuUniforms {
    pub buffer: wgpu::Buffer,
}

impl GpuUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("atlas_gallery::grid_uniforms"),
            contents: bytemuck::bytes_of(&GridUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self { buffer }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniforms: &GridUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }
}
