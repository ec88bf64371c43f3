// Atlas Module
// Square grid-of-cells atlases for the tiling gallery shader
//
// Both atlases share one layout derivation so the shader can sample them with the same UVs.
// They are built once per stable input set (see `cache`) and are immutable afterwards.

pub mod layout;
pub mod surface;
pub mod image_atlas;
pub mod label_atlas;
pub mod cache;
pub mod gpu;

pub use cache::{AtlasCache, AtlasKey, AtlasPair};
pub use image_atlas::{build_image_atlas, cover_fit, CoverFit};
pub use label_atlas::build_label_atlas;
pub use layout::AtlasLayout;
pub use surface::{AtlasKind, AtlasTexture, TextureSettings};

/// Setup failures that leave the gallery without an atlas (rendered as loading).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    #[error("cannot build an atlas for an empty item set")]
    EmptyItemSet,
    #[error("atlas surface of {side}px exceeds the {limit}px limit")]
    SurfaceTooLarge { side: u64, limit: u32 },
    #[error("no usable label font: {0}")]
    FontUnavailable(String),
}

/// Per-item failures; the affected cell is filled with the error colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("source has no pixel data")]
    MissingPixels,
    #[error("source surface is empty ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
}
