use std::path::PathBuf;
use std::time::Duration;

use image::Rgba;
use once_cell::sync::Lazy;

use crate::settings::UserSettings;

// Default values for configuration
// These are the fixed gallery constants; a settings file may override them at startup only
pub const DEFAULT_CELL_SIZE_PX: u32 = 512;
pub const DEFAULT_TEXT_AREA_HEIGHT_RATIO: f32 = 0.1;
pub const DEFAULT_MAX_FONT_SIZE: f32 = 20.0;
pub const DEFAULT_FONT_SIZE_RATIO: f32 = 0.6;
pub const DEFAULT_BACKGROUND_COLOR: [u8; 4] = [0x00, 0x00, 0x00, 0xff];
pub const DEFAULT_PLACEHOLDER_COLOR: [u8; 4] = [0x22, 0x22, 0x22, 0xff];
pub const DEFAULT_ERROR_COLOR: [u8; 4] = [0x33, 0x33, 0x33, 0xff];

pub const DEFAULT_TEXT_COLOR: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
pub const DEFAULT_SHADOW_COLOR: [u8; 4] = [0x00, 0x00, 0x00, 0xff];
pub const DEFAULT_SHADOW_BLUR: f32 = 10.0;
pub const DEFAULT_SHADOW_OFFSET: (i32, i32) = (2, 2);

pub const DEFAULT_DRAG_SENSITIVITY: f32 = 0.003;
pub const DEFAULT_VELOCITY_DAMPING: f32 = 0.92;
pub const DEFAULT_ZOOM_NORMAL: f32 = 1.0;
pub const DEFAULT_ZOOM_DRAGGING: f32 = 1.3;
pub const DEFAULT_ZOOM_LERP_SPEED: f32 = 0.1;

pub const DEFAULT_GALLERY_CELL_SIZE: f32 = 0.8;    // World units
pub const DEFAULT_READINESS_RECHECK_MS: u64 = 100;

// Largest square surface the atlas builders will allocate (matches common GPU 2D limits)
pub const MAX_ATLAS_DIMENSION: u32 = 16_384;

/// Bold sans-serif faces tried in order, standing in for a CSS font-family stack.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\segoeuib.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];

/// Layout and colours shared by the image and label atlases.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    pub cell_size_px: u32,
    pub background_color: Rgba<u8>,
    pub placeholder_color: Rgba<u8>,
    pub error_color: Rgba<u8>,
    pub text_area_height_ratio: f32,
    pub max_font_size: f32,
    pub font_size_ratio: f32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            cell_size_px: DEFAULT_CELL_SIZE_PX,
            background_color: Rgba(DEFAULT_BACKGROUND_COLOR),
            placeholder_color: Rgba(DEFAULT_PLACEHOLDER_COLOR),
            error_color: Rgba(DEFAULT_ERROR_COLOR),
            text_area_height_ratio: DEFAULT_TEXT_AREA_HEIGHT_RATIO,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            font_size_ratio: DEFAULT_FONT_SIZE_RATIO,
        }
    }
}

/// Label styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextConfig {
    pub font_candidates: Vec<PathBuf>,
    pub text_color: Rgba<u8>,
    pub shadow_color: Rgba<u8>,
    pub shadow_blur: f32,
    pub shadow_offset: (i32, i32),
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_candidates: DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
            text_color: Rgba(DEFAULT_TEXT_COLOR),
            shadow_color: Rgba(DEFAULT_SHADOW_COLOR),
            shadow_blur: DEFAULT_SHADOW_BLUR,
            shadow_offset: DEFAULT_SHADOW_OFFSET,
        }
    }
}

/// Drag, inertia and zoom tuning for the viewport controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub sensitivity: f32,        // Pointer pixels to scroll offset multiplier
    pub velocity_damping: f32,   // 0-1, lower = more friction
    pub zoom_normal: f32,
    pub zoom_dragging: f32,
    pub zoom_lerp_speed: f32,    // 0-1
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_DRAG_SENSITIVITY,
            velocity_damping: DEFAULT_VELOCITY_DAMPING,
            zoom_normal: DEFAULT_ZOOM_NORMAL,
            zoom_dragging: DEFAULT_ZOOM_DRAGGING,
            zoom_lerp_speed: DEFAULT_ZOOM_LERP_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    pub atlas: AtlasConfig,
    pub text: TextConfig,
    pub drag: DragConfig,
    pub cell_size: f32,               // Size of each gallery cell in world units
    pub readiness_recheck: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            atlas: AtlasConfig::default(),
            text: TextConfig::default(),
            drag: DragConfig::default(),
            cell_size: DEFAULT_GALLERY_CELL_SIZE,
            readiness_recheck: Duration::from_millis(DEFAULT_READINESS_RECHECK_MS),
        }
    }
}

pub static CONFIG: Lazy<GalleryConfig> = Lazy::new(|| {
    // Load overrides from the YAML settings file, if any
    UserSettings::load(None).to_config()
});
