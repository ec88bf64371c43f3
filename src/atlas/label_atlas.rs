// Label atlas builder
// Same grid as the image atlas, transparent except for each item's label band

use std::sync::Mutex;

use image::imageops;
use image::{GrayImage, Rgba, RgbaImage};
use once_cell::sync::Lazy;
use rayon::prelude::*;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::{AtlasError, AtlasKind, AtlasLayout, AtlasTexture};
use crate::config::{AtlasConfig, TextConfig};
use crate::item::Item;
use crate::text::GlyphRasterizer;
use crate::utils::timing::{ScopedTimer, TimingStats};

static LABEL_ATLAS_STATS: Lazy<Mutex<TimingStats>> = Lazy::new(|| {
    Mutex::new(TimingStats::new("Label Atlas Build"))
});

/// Vertical placement of the label inside a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBand {
    pub top: f32,
    pub height: f32,
    pub font_size: f32,
}

impl LabelBand {
    pub fn for_cell(cell_size: u32, config: &AtlasConfig) -> Self {
        let height = cell_size as f32 * config.text_area_height_ratio;
        Self {
            top: cell_size as f32 - height,
            height,
            font_size: (height * config.font_size_ratio).min(config.max_font_size),
        }
    }

    /// Top-left of a `mask_size` mask centred horizontally in the cell and vertically in the band.
    pub fn mask_origin(&self, cell_size: u32, mask_size: (u32, u32)) -> (i64, i64) {
        let x = (cell_size as f32 - mask_size.0 as f32) / 2.0;
        let y = self.top + (self.height - mask_size.1 as f32) / 2.0;
        (x.round() as i64, y.round() as i64)
    }
}

fn tinted(mask: &GrayImage, color: Rgba<u8>, padding: u32) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(
        mask.width() + 2 * padding,
        mask.height() + 2 * padding,
        Rgba([color[0], color[1], color[2], 0]),
    );
    for (x, y, coverage) in mask.enumerate_pixels() {
        let alpha = (u16::from(coverage.0[0]) * u16::from(color[3]) / 255) as u8;
        out.put_pixel(x + padding, y + padding, Rgba([color[0], color[1], color[2], alpha]));
    }
    out
}

/// Render one label into a transparent cell-sized tile. Anything outside the cell is clipped.
fn draw_label_tile(
    label: &str,
    cell_size: u32,
    band: &LabelBand,
    text: &TextConfig,
    rasterizer: &dyn GlyphRasterizer,
) -> Option<RgbaImage> {
    let mask = rasterizer.rasterize(label, band.font_size)?;
    let (x, y) = band.mask_origin(cell_size, mask.dimensions());
    let mut tile = RgbaImage::new(cell_size, cell_size);

    if text.shadow_color[3] > 0 {
        // Canvas-style shadow blur: gaussian with sigma = blur / 2
        let sigma = text.shadow_blur / 2.0;
        let padding = (sigma * 3.0).ceil() as u32;
        let mut shadow = tinted(&mask, text.shadow_color, padding);
        if sigma > 0.0 {
            shadow = imageops::blur(&shadow, sigma);
        }
        let (dx, dy) = text.shadow_offset;
        imageops::overlay(
            &mut tile,
            &shadow,
            x - i64::from(padding) + i64::from(dx),
            y - i64::from(padding) + i64::from(dy),
        );
    }

    imageops::overlay(&mut tile, &tinted(&mask, text.text_color, 0), x, y);
    Some(tile)
}

/// Build the label atlas: one centred, shadowed label per item in the bottom band of its cell.
pub fn build_label_atlas(
    items: &[Item],
    atlas_config: &AtlasConfig,
    text_config: &TextConfig,
    rasterizer: &dyn GlyphRasterizer,
) -> Result<AtlasTexture, AtlasError> {
    let layout = AtlasLayout::new(items.len(), atlas_config.cell_size_px)?;
    let cell_size = layout.cell_size_px();
    let band = LabelBand::for_cell(cell_size, atlas_config);

    let mut stats = LABEL_ATLAS_STATS.lock().unwrap_or_else(|e| e.into_inner());
    let _timer = ScopedTimer::new(&mut stats);

    // Transparent background so the shader can composite labels over the image atlas
    let size = layout.canvas_size_px();
    let mut canvas = RgbaImage::new(size, size);
    debug!("Label atlas: {} labels, font {:.1}px, band {:.1}px", items.len(), band.font_size, band.height);

    let tiles: Vec<Option<RgbaImage>> = items
        .par_iter()
        .map(|item| draw_label_tile(&item.label, cell_size, &band, text_config, rasterizer))
        .collect();

    for (i, tile) in tiles.into_iter().enumerate() {
        let Some(tile) = tile else {
            debug!("Label {i} is empty, leaving cell transparent");
            continue;
        };
        let (x, y) = layout.cell_origin(i);
        imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    Ok(AtlasTexture::new(AtlasKind::Label, layout, canvas))
}
