// Frame uniform bridge
// Pure read-and-publish: everything here is recomputed from the controller and atlases each frame

use std::sync::Arc;
use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::atlas::{AtlasPair, AtlasTexture};
use crate::interaction::ViewportController;

/// Scalar uniform block as laid out in the shader's uniform buffer (std140, 48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GridUniforms {
    pub offset: [f32; 2],
    pub resolution: [f32; 2],
    pub pointer_position: [f32; 2],
    pub zoom: f32,
    pub cell_size: f32,
    pub is_loading: f32,
    pub elapsed_time: f32,
    pub item_count: u32,
    pub _padding: u32,
}

impl Default for GridUniforms {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            resolution: [1.0, 1.0],
            pointer_position: [-1.0, -1.0],
            zoom: 1.0,
            cell_size: crate::config::DEFAULT_GALLERY_CELL_SIZE,
            is_loading: 1.0,
            elapsed_time: 0.0,
            item_count: 0,
            _padding: 0,
        }
    }
}

/// Host-side values that are not owned by the gallery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Viewport size in physical pixels.
    pub resolution: Vec2,
    /// Clock time since the view was created.
    pub elapsed: Duration,
}

impl FrameInput {
    pub fn new(width: f32, height: f32, elapsed: Duration) -> Self {
        Self {
            resolution: Vec2::new(width, height),
            elapsed,
        }
    }
}

/// A single named shader input.
#[derive(Debug, Clone)]
pub enum UniformValue {
    Vec2([f32; 2]),
    Int(u32),
    Float(f32),
    /// `None` while loading.
    Texture(Option<Arc<AtlasTexture>>),
}

#[derive(Debug, Clone)]
pub struct FrameUniforms {
    pub offset: Vec2,
    pub resolution: Vec2,
    pub pointer_position: Vec2,
    pub item_count: u32,
    pub zoom: f32,
    pub cell_size: f32,
    pub is_loading: bool,
    pub elapsed_time: f32,
    pub image_atlas: Option<Arc<AtlasTexture>>,
    pub label_atlas: Option<Arc<AtlasTexture>>,
}

impl FrameUniforms {
    /// Snapshot the live state for one frame.
    ///
    /// Atlases are only handed out when they exist and the readiness gate agrees;
    /// otherwise the full set is still published with the loading flag raised.
    pub fn publish(
        controller: &ViewportController,
        atlases: Option<&AtlasPair>,
        images_ready: bool,
        item_count: usize,
        cell_size: f32,
        input: FrameInput,
    ) -> Self {
        let atlases = atlases.filter(|_| images_ready);

        Self {
            offset: controller.scroll_offset(),
            resolution: input.resolution,
            pointer_position: controller.pointer_pixel_pos(),
            item_count: u32::try_from(item_count).unwrap_or(u32::MAX),
            zoom: controller.current_zoom(),
            cell_size,
            is_loading: atlases.is_none(),
            elapsed_time: input.elapsed.as_secs_f32(),
            image_atlas: atlases.map(|pair| Arc::clone(&pair.image)),
            label_atlas: atlases.map(|pair| Arc::clone(&pair.label)),
        }
    }

    pub fn is_loading_flag(&self) -> f32 {
        if self.is_loading {
            1.0
        } else {
            0.0
        }
    }

    pub fn to_gpu(&self) -> GridUniforms {
        GridUniforms {
            offset: self.offset.to_array(),
            resolution: self.resolution.to_array(),
            pointer_position: self.pointer_position.to_array(),
            zoom: self.zoom,
            cell_size: self.cell_size,
            is_loading: self.is_loading_flag(),
            elapsed_time: self.elapsed_time,
            item_count: self.item_count,
            _padding: 0,
        }
    }

    /// The uniform set under the names the shader declares.
    pub fn named(&self) -> Vec<(&'static str, UniformValue)> {
        vec![
            ("offset", UniformValue::Vec2(self.offset.to_array())),
            ("resolution", UniformValue::Vec2(self.resolution.to_array())),
            ("pointerPosition", UniformValue::Vec2(self.pointer_position.to_array())),
            ("itemCount", UniformValue::Int(self.item_count)),
            ("zoom", UniformValue::Float(self.zoom)),
            ("cellSize", UniformValue::Float(self.cell_size)),
            ("isLoading", UniformValue::Float(self.is_loading_flag())),
            ("elapsedTime", UniformValue::Float(self.elapsed_time)),
            ("imageAtlas", UniformValue::Texture(self.image_atlas.clone())),
            ("labelAtlas", UniformValue::Texture(self.label_atlas.clone())),
        ]
    }
}
