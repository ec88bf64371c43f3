//! Glyph rasterization for atlas labels.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use rusttype::{point, Font, Scale};

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::AtlasError;

/// Turns a label into a coverage mask.
///
/// The mask spans the laid-out line: its width is the advance width of the string and
/// its height is ascent minus descent, so centring the mask centres the line box.
pub trait GlyphRasterizer: Send + Sync {
    /// Returns `None` when there is nothing to draw.
    fn rasterize(&self, text: &str, px_size: f32) -> Option<GrayImage>;
}

/// `rusttype`-backed rasterizer over a single font face.
pub struct FontRasterizer {
    font: Font<'static>,
    source: Option<PathBuf>,
}

impl fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("source", &self.source)
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl FontRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AtlasError> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| AtlasError::FontUnavailable("invalid font data".to_string()))?;
        Ok(Self { font, source: None })
    }

    pub fn from_file(path: &Path) -> Result<Self, AtlasError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AtlasError::FontUnavailable(format!("{}: {e}", path.display())))?;
        let mut rasterizer = Self::from_bytes(bytes)
            .map_err(|_| AtlasError::FontUnavailable(format!("{}: invalid font data", path.display())))?;
        rasterizer.source = Some(path.to_path_buf());
        Ok(rasterizer)
    }

    /// Load the first usable face from `candidates`, like a font-family fallback list.
    pub fn from_candidates(candidates: &[PathBuf]) -> Result<Self, AtlasError> {
        for path in candidates {
            match Self::from_file(path) {
                Ok(rasterizer) => {
                    info!("Using label font {}", path.display());
                    return Ok(rasterizer);
                }
                Err(e) => debug!("Skipping label font candidate: {e}"),
            }
        }
        Err(AtlasError::FontUnavailable(format!(
            "none of {} candidate fonts could be loaded",
            candidates.len()
        )))
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&self, text: &str, px_size: f32) -> Option<GrayImage> {
        if text.is_empty() || px_size <= 0.0 {
            return None;
        }

        let scale = Scale::uniform(px_size);
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<_> = self.font.layout(text, scale, point(0.0, v_metrics.ascent)).collect();

        let width = glyphs
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
            .ceil() as u32;
        let height = (v_metrics.ascent - v_metrics.descent).ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let mut mask = GrayImage::new(width, height);
        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|x, y, coverage| {
                let px = x as i32 + bb.min.x;
                let py = y as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let value = (coverage * 255.0).round() as u8;
                let pixel = mask.get_pixel_mut(px as u32, py as u32);
                // Overlapping glyph boxes keep the stronger coverage
                *pixel = Luma([pixel.0[0].max(value)]);
            });
        }

        Some(mask)
    }
}
