//! Decoded texture sources handed over by the image loader.
//!
//! A loader fills one slot per gallery item. Slots start empty and the
//! backing image reports its decode progress through [`ImageElement::complete`].

use std::sync::Arc;

use image::RgbaImage;

use crate::atlas::DrawError;

/// An image element as produced by an asynchronous decoder.
#[derive(Debug, Clone, Default)]
pub struct ImageElement {
    pub complete: bool,
    /// Intrinsic size of the encoded image, `(0, 0)` until known.
    pub natural_size: (u32, u32),
    /// Size reported by the element itself, `(0, 0)` until known.
    pub size: (u32, u32),
    pub pixels: Option<Arc<RgbaImage>>,
}

impl ImageElement {
    /// A fully decoded element whose natural and reported sizes match its pixels.
    pub fn decoded(pixels: RgbaImage) -> Self {
        let size = pixels.dimensions();
        Self {
            complete: true,
            natural_size: size,
            size,
            pixels: Some(Arc::new(pixels)),
        }
    }

    /// An element whose decode has not finished yet.
    pub fn pending() -> Self {
        Self::default()
    }
}

/// A single frame grabbed from a video source.
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    /// Intrinsic video size, `(0, 0)` until metadata is available.
    pub video_size: (u32, u32),
    pub frame: Option<Arc<RgbaImage>>,
}

#[derive(Debug, Clone)]
pub enum TextureSource {
    Image(ImageElement),
    Video(VideoFrame),
    /// An already rasterized surface.
    Canvas(Arc<RgbaImage>),
}

impl TextureSource {
    /// Whether the backing image has finished decoding.
    ///
    /// Only image elements report decode progress; other sources are always ready.
    pub fn is_decoded(&self) -> bool {
        match self {
            TextureSource::Image(img) => img.complete && img.size.0 > 0 && img.size.1 > 0,
            TextureSource::Video(_) | TextureSource::Canvas(_) => true,
        }
    }

    /// Natural dimensions used for cover-fit, falling back to the cell size when unknown.
    pub fn natural_dimensions(&self, fallback: u32) -> (u32, u32) {
        let pick = |preferred: u32, secondary: u32| {
            if preferred > 0 {
                preferred
            } else if secondary > 0 {
                secondary
            } else {
                fallback
            }
        };

        match self {
            TextureSource::Image(img) => (
                pick(img.natural_size.0, img.size.0),
                pick(img.natural_size.1, img.size.1),
            ),
            TextureSource::Video(video) => (pick(video.video_size.0, 0), pick(video.video_size.1, 0)),
            TextureSource::Canvas(canvas) => (pick(canvas.width(), 0), pick(canvas.height(), 0)),
        }
    }

    /// Pixel data to sample from when drawing into a cell.
    pub fn pixels(&self) -> Result<&RgbaImage, DrawError> {
        let pixels = match self {
            TextureSource::Image(img) => img.pixels.as_deref(),
            TextureSource::Video(video) => video.frame.as_deref(),
            TextureSource::Canvas(canvas) => Some(canvas.as_ref()),
        }
        .ok_or(DrawError::MissingPixels)?;

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(DrawError::EmptySurface {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(pixels)
    }
}

impl From<ImageElement> for TextureSource {
    fn from(img: ImageElement) -> Self {
        TextureSource::Image(img)
    }
}

impl From<RgbaImage> for TextureSource {
    fn from(canvas: RgbaImage) -> Self {
        TextureSource::Canvas(Arc::new(canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_natural_size_fallbacks() {
        let mut img = ImageElement {
            complete: true,
            natural_size: (0, 0),
            size: (300, 200),
            pixels: None,
        };
        assert_eq!(TextureSource::Image(img.clone()).natural_dimensions(64), (300, 200));

        img.natural_size = (600, 400);
        assert_eq!(TextureSource::Image(img.clone()).natural_dimensions(64), (600, 400));

        img.natural_size = (0, 0);
        img.size = (0, 0);
        assert_eq!(TextureSource::Image(img).natural_dimensions(64), (64, 64));
    }

    #[test]
    fn test_video_and_canvas_dimensions() {
        let video = TextureSource::Video(VideoFrame { video_size: (1920, 1080), frame: None });
        assert_eq!(video.natural_dimensions(64), (1920, 1080));

        let unknown = TextureSource::Video(VideoFrame::default());
        assert_eq!(unknown.natural_dimensions(64), (64, 64));

        let canvas = TextureSource::from(RgbaImage::new(10, 20));
        assert_eq!(canvas.natural_dimensions(64), (10, 20));
    }

    #[test]
    fn test_decode_state() {
        assert!(!TextureSource::Image(ImageElement::pending()).is_decoded());
        assert!(TextureSource::Image(ImageElement::decoded(RgbaImage::new(4, 4))).is_decoded());
        assert!(TextureSource::from(RgbaImage::new(4, 4)).is_decoded());
        assert!(TextureSource::Video(VideoFrame::default()).is_decoded());

        let zero_sized = ImageElement { complete: true, ..ImageElement::default() };
        assert!(!TextureSource::Image(zero_sized).is_decoded());
    }

    #[test]
    fn test_pixels_errors() {
        let missing = ImageElement { complete: true, size: (8, 8), ..ImageElement::default() };
        assert_eq!(TextureSource::Image(missing).pixels().unwrap_err(), DrawError::MissingPixels);

        let empty = TextureSource::from(RgbaImage::new(0, 5));
        assert_eq!(
            empty.pixels().unwrap_err(),
            DrawError::EmptySurface { width: 0, height: 5 }
        );
    }
}
