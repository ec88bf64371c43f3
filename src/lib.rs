//! Texture-atlas compositing and inertial viewport control for an infinitely tiling
//! image gallery.
//!
//! The host hands over items and decoded textures, forwards pointer/touch events,
//! and calls [`Gallery::frame`] once per rendered frame. The returned
//! [`FrameUniforms`] carry everything the tiling shader samples: the image and label
//! atlases (once every image is decoded), the pan offset, zoom and pointer position.

pub mod atlas;
pub mod config;
pub mod gallery;
pub mod interaction;
pub mod item;
pub mod logging;
pub mod postfx;
pub mod readiness;
pub mod settings;
pub mod source;
pub mod text;
pub mod uniforms;
pub mod utils;

pub use atlas::{AtlasError, AtlasPair, AtlasTexture, DrawError};
pub use config::GalleryConfig;
pub use gallery::Gallery;
pub use interaction::{CursorStyle, InputEvent, PointerInput, ViewportController};
pub use item::Item;
pub use postfx::PostFxParams;
pub use readiness::ReadinessGate;
pub use source::{ImageElement, TextureSource, VideoFrame};
pub use text::{FontRasterizer, GlyphRasterizer};
pub use uniforms::{FrameInput, FrameUniforms, GridUniforms, UniformValue};
