// Image atlas builder
// Composites every item's image into one square grid, cover-fit cropped to its cell

use std::sync::Mutex;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;
use rayon::prelude::*;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::{AtlasError, AtlasKind, AtlasLayout, AtlasTexture, DrawError};
use crate::config::AtlasConfig;
use crate::source::TextureSource;
use crate::utils::timing::{ScopedTimer, TimingStats};

static IMAGE_ATLAS_STATS: Lazy<Mutex<TimingStats>> = Lazy::new(|| {
    Mutex::new(TimingStats::new("Image Atlas Build"))
});

/// Where a source lands relative to its cell's top-left corner when scaled to cover it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub draw_x: f32,
    pub draw_y: f32,
    pub draw_width: f32,
    pub draw_height: f32,
}

/// Scale `natural` uniformly so it covers a square cell, centring the overflow.
pub fn cover_fit(natural: (u32, u32), cell_size: u32) -> CoverFit {
    let cell = cell_size as f32;
    let aspect = natural.0.max(1) as f32 / natural.1.max(1) as f32;

    let (draw_width, draw_height) = if aspect > 1.0 {
        // Wider than the cell: fit height, crop width
        (cell * aspect, cell)
    } else {
        // Taller (or square): fit width, crop height
        (cell, cell / aspect)
    };

    CoverFit {
        draw_x: (cell - draw_width) / 2.0,
        draw_y: (cell - draw_height) / 2.0,
        draw_width,
        draw_height,
    }
}

impl CoverFit {
    /// The `(x, y, width, height)` region of a `pixel_size` buffer that ends up inside the cell.
    ///
    /// Natural size and pixel size may differ; the fit is computed on the former and
    /// mapped proportionally onto the latter.
    pub fn visible_source_rect(&self, pixel_size: (u32, u32), cell_size: u32) -> (u32, u32, u32, u32) {
        let cell = cell_size as f32;
        let axis = |offset: f32, drawn: f32, pixels: u32| -> (u32, u32) {
            let scale = pixels as f32 / drawn;
            let start = ((-offset * scale).round().max(0.0) as u32).min(pixels - 1);
            let len = ((cell * scale).round().max(1.0) as u32).min(pixels - start);
            (start, len)
        };

        let (x, width) = axis(self.draw_x, self.draw_width, pixel_size.0.max(1));
        let (y, height) = axis(self.draw_y, self.draw_height, pixel_size.1.max(1));
        (x, y, width, height)
    }
}

enum CellFill {
    Drawn(RgbaImage),
    Placeholder,
    Failed(DrawError),
}

/// Render one source as a `cell_size` square tile with cover-fit cropping.
///
/// The tile is exactly one cell, so nothing can spill into a neighbour.
pub fn draw_cover(source: &TextureSource, cell_size: u32) -> Result<RgbaImage, DrawError> {
    let pixels = source.pixels()?;
    let fit = cover_fit(source.natural_dimensions(cell_size), cell_size);
    let (x, y, width, height) = fit.visible_source_rect(pixels.dimensions(), cell_size);

    let visible = imageops::crop_imm(pixels, x, y, width, height).to_image();
    if visible.dimensions() == (cell_size, cell_size) {
        return Ok(visible);
    }
    Ok(imageops::resize(&visible, cell_size, cell_size, FilterType::Triangle))
}

fn prepare_cell(slot: Option<&TextureSource>, cell_size: u32) -> CellFill {
    match slot {
        Some(source) if source.is_decoded() => match draw_cover(source, cell_size) {
            Ok(tile) => CellFill::Drawn(tile),
            Err(e) => CellFill::Failed(e),
        },
        _ => CellFill::Placeholder,
    }
}

fn fill_cell(canvas: &mut RgbaImage, origin: (u32, u32), cell_size: u32, color: Rgba<u8>) {
    for y in origin.1..origin.1 + cell_size {
        for x in origin.0..origin.0 + cell_size {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Build the image atlas for `item_count` items from their loaded texture slots.
///
/// Missing or undecoded slots get the placeholder colour and slots that fail to draw
/// get the error colour; neither aborts the build.
pub fn build_image_atlas(
    textures: &[Option<TextureSource>],
    item_count: usize,
    config: &AtlasConfig,
) -> Result<AtlasTexture, AtlasError> {
    let layout = AtlasLayout::new(item_count, config.cell_size_px)?;
    let cell_size = layout.cell_size_px();

    let mut stats = IMAGE_ATLAS_STATS.lock().unwrap_or_else(|e| e.into_inner());
    let _timer = ScopedTimer::new(&mut stats);

    let size = layout.canvas_size_px();
    let mut canvas = RgbaImage::from_pixel(size, size, config.background_color);
    debug!("Image atlas: {} items on a {}x{} grid ({}px)", item_count, layout.grid_side(), layout.grid_side(), size);

    // Scaling dominates the cost, so tiles are prepared in parallel and composited in order
    let cells: Vec<CellFill> = (0..item_count)
        .into_par_iter()
        .map(|i| prepare_cell(textures.get(i).and_then(Option::as_ref), cell_size))
        .collect();

    for (i, fill) in cells.into_iter().enumerate() {
        let origin = layout.cell_origin(i);
        match fill {
            CellFill::Drawn(tile) => {
                imageops::overlay(&mut canvas, &tile, i64::from(origin.0), i64::from(origin.1));
            }
            CellFill::Placeholder => {
                warn!("Missing image for texture {i}");
                fill_cell(&mut canvas, origin, cell_size, config.placeholder_color);
            }
            CellFill::Failed(e) => {
                warn!("Failed to draw texture {i}: {e}");
                fill_cell(&mut canvas, origin, cell_size, config.error_color);
            }
        }
    }

    Ok(AtlasTexture::new(AtlasKind::Image, layout, canvas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageElement;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn small_config() -> AtlasConfig {
        AtlasConfig { cell_size_px: 10, ..AtlasConfig::default() }
    }

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> Option<TextureSource> {
        Some(TextureSource::Image(ImageElement::decoded(RgbaImage::from_pixel(width, height, color))))
    }

    fn cell_is(atlas: &AtlasTexture, index: usize, color: Rgba<u8>) -> bool {
        let layout = atlas.layout();
        let (x0, y0) = layout.cell_origin(index);
        let cell = layout.cell_size_px();
        (y0..y0 + cell).all(|y| (x0..x0 + cell).all(|x| *atlas.surface().get_pixel(x, y) == color))
    }

    #[test]
    fn test_cover_fit_wide_and_tall() {
        let wide = cover_fit((200, 100), 100);
        assert_eq!(wide.draw_width, 200.0);
        assert_eq!(wide.draw_height, 100.0);
        assert_eq!(wide.draw_x, -50.0);
        assert_eq!(wide.draw_y, 0.0);

        let tall = cover_fit((100, 400), 100);
        assert_eq!(tall.draw_width, 100.0);
        assert_eq!(tall.draw_height, 400.0);
        assert_eq!(tall.draw_x, 0.0);
        assert_eq!(tall.draw_y, -150.0);

        let square = cover_fit((50, 50), 100);
        assert_eq!((square.draw_x, square.draw_y), (0.0, 0.0));
        assert_eq!((square.draw_width, square.draw_height), (100.0, 100.0));
    }

    #[test]
    fn test_visible_rect_stays_inside_source() {
        for &(w, h) in &[(1, 1), (1, 1000), (1000, 1), (640, 480), (3, 7), (512, 512)] {
            let fit = cover_fit((w, h), 64);
            let (x, y, rw, rh) = fit.visible_source_rect((w, h), 64);
            assert!(rw >= 1 && rh >= 1);
            assert!(x + rw <= w, "x overflow for {w}x{h}");
            assert!(y + rh <= h, "y overflow for {w}x{h}");
        }
    }

    #[test]
    fn test_visible_rect_maps_natural_onto_pixels() {
        // Natural size is twice the decoded buffer
        let fit = cover_fit((400, 200), 100);
        assert_eq!(fit.visible_source_rect((200, 100), 100), (50, 0, 100, 100));
    }

    #[test]
    fn test_draw_cover_keeps_centre() {
        // Three vertical bands; the cover crop of a 3:1 image is the middle one
        let mut img = RgbaImage::from_pixel(30, 10, RED);
        for y in 0..10 {
            for x in 10..20 {
                img.put_pixel(x, y, WHITE);
            }
        }
        let tile = draw_cover(&TextureSource::from(img), 10).unwrap();
        assert_eq!(tile.dimensions(), (10, 10));
        assert!(tile.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_nine_items_make_three_by_three() {
        let textures: Vec<_> = (0..9).map(|_| solid(20, 20, RED)).collect();
        let atlas = build_image_atlas(&textures, 9, &small_config()).unwrap();
        assert_eq!(atlas.layout().grid_side(), 3);
        assert_eq!(atlas.size_px(), 30);
        assert!((0..9).all(|i| cell_is(&atlas, i, RED)));
    }

    #[test]
    fn test_ten_items_leave_six_background_cells() {
        let config = small_config();
        let textures: Vec<_> = (0..10).map(|_| solid(20, 20, RED)).collect();
        let atlas = build_image_atlas(&textures, 10, &config).unwrap();
        assert_eq!(atlas.layout().grid_side(), 4);
        assert_eq!(atlas.layout().empty_cells(), 6);
        assert!((0..10).all(|i| cell_is(&atlas, i, RED)));
        assert!((10..16).all(|i| cell_is(&atlas, i, config.background_color)));
    }

    #[test]
    fn test_overflow_never_bleeds() {
        let config = small_config();
        // Extreme aspect ratios on both axes next to a solid neighbour
        let textures = vec![solid(400, 10, RED), solid(10, 10, BLUE), solid(10, 400, RED)];
        let atlas = build_image_atlas(&textures, 3, &config).unwrap();
        assert!(cell_is(&atlas, 0, RED));
        assert!(cell_is(&atlas, 1, BLUE));
        assert!(cell_is(&atlas, 2, RED));
        assert!(cell_is(&atlas, 3, config.background_color));
    }

    #[test]
    fn test_draw_failure_only_affects_its_cell() {
        let config = small_config();
        let broken = ImageElement {
            complete: true,
            natural_size: (10, 10),
            size: (10, 10),
            pixels: None,
        };
        let textures = vec![
            solid(10, 10, BLUE),
            Some(TextureSource::Image(broken)),
            solid(10, 10, BLUE),
            solid(10, 10, BLUE),
        ];
        let atlas = build_image_atlas(&textures, 4, &config).unwrap();
        assert!(cell_is(&atlas, 0, BLUE));
        assert!(cell_is(&atlas, 1, config.error_color));
        assert!(cell_is(&atlas, 2, BLUE));
        assert!(cell_is(&atlas, 3, BLUE));
    }

    #[test]
    fn test_missing_and_pending_use_placeholder() {
        let config = small_config();
        let textures = vec![
            None,
            Some(TextureSource::Image(ImageElement::pending())),
            solid(10, 10, BLUE),
        ];
        let atlas = build_image_atlas(&textures, 3, &config).unwrap();
        assert!(cell_is(&atlas, 0, config.placeholder_color));
        assert!(cell_is(&atlas, 1, config.placeholder_color));
        assert!(cell_is(&atlas, 2, BLUE));
    }

    #[test]
    fn test_empty_item_set_is_an_error() {
        assert_eq!(
            build_image_atlas(&[], 0, &small_config()).unwrap_err(),
            AtlasError::EmptyItemSet
        );
    }
}
