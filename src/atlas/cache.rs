// Memoized atlas pair
// Building is the most expensive step in the pipeline, so it only happens when the key changes

use std::sync::Arc;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::{build_image_atlas, build_label_atlas, AtlasError, AtlasTexture};
use crate::config::GalleryConfig;
use crate::item::{items_hash, Item};
use crate::source::TextureSource;
use crate::text::GlyphRasterizer;

/// Inputs the atlases depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasKey {
    pub items_hash: u64,
    /// Bumped whenever the host swaps in a new texture set.
    pub textures_generation: u64,
    pub ready: bool,
}

impl AtlasKey {
    pub fn new(items: &[Item], textures_generation: u64, ready: bool) -> Self {
        Self {
            items_hash: items_hash(items),
            textures_generation,
            ready,
        }
    }
}

/// The two atlases the shader samples, always built and replaced together.
#[derive(Debug, Clone)]
pub struct AtlasPair {
    pub image: Arc<AtlasTexture>,
    pub label: Arc<AtlasTexture>,
}

impl AtlasPair {
    pub fn build(
        textures: &[Option<TextureSource>],
        items: &[Item],
        config: &GalleryConfig,
        rasterizer: &dyn GlyphRasterizer,
    ) -> Result<Self, AtlasError> {
        let image = build_image_atlas(textures, items.len(), &config.atlas)?;
        let label = build_label_atlas(items, &config.atlas, &config.text, rasterizer)?;
        Ok(Self {
            image: Arc::new(image),
            label: Arc::new(label),
        })
    }
}

#[derive(Debug, Default)]
pub struct AtlasCache {
    key: Option<AtlasKey>,
    atlases: Option<AtlasPair>,
    builds: usize,
}

impl AtlasCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The invalidation rule: any change of key discards the current pair.
    pub fn needs_rebuild(&self, key: &AtlasKey) -> bool {
        self.key.as_ref() != Some(key)
    }

    /// Return the pair for `key`, calling `build` only when the key changed and inputs are ready.
    ///
    /// A failed build is remembered under its key, so it is not retried until the key changes.
    pub fn refresh<F>(&mut self, key: AtlasKey, build: F) -> Option<&AtlasPair>
    where
        F: FnOnce() -> Result<AtlasPair, AtlasError>,
    {
        if !self.needs_rebuild(&key) {
            return self.atlases.as_ref();
        }

        debug!("Atlas cache miss: {:?} -> {:?}", self.key, key);
        self.key = Some(key);
        // Superseded wholesale, never patched
        self.atlases = None;

        if !key.ready {
            return None;
        }

        self.builds += 1;
        match build() {
            Ok(pair) => {
                info!(
                    "Atlas created successfully with {} images ({}x{} grid)",
                    pair.image.layout().item_count(),
                    pair.image.layout().grid_side(),
                    pair.image.layout().grid_side()
                );
                self.atlases = Some(pair);
            }
            Err(e) => warn!("Atlas build failed, staying in loading state: {e}"),
        }
        self.atlases.as_ref()
    }

    pub fn get(&self) -> Option<&AtlasPair> {
        self.atlases.as_ref()
    }

    /// Number of times a build was attempted.
    pub fn build_count(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.atlases = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::label_atlas::tests::BlockRasterizer;
    use crate::config::AtlasConfig;

    fn config() -> GalleryConfig {
        GalleryConfig {
            atlas: AtlasConfig { cell_size_px: 8, ..AtlasConfig::default() },
            ..GalleryConfig::default()
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new(format!("{i}.png"), format!("#{i}"))).collect()
    }

    #[test]
    fn test_builds_once_per_key() {
        let items = items(4);
        let textures = vec![None; 4];
        let config = config();
        let mut cache = AtlasCache::new();
        let key = AtlasKey::new(&items, 0, true);

        for _ in 0..5 {
            let pair = cache.refresh(key, || AtlasPair::build(&textures, &items, &config, &BlockRasterizer));
            assert!(pair.is_some());
        }
        assert_eq!(cache.build_count(), 1);
        assert!(!cache.needs_rebuild(&key));
    }

    #[test]
    fn test_not_ready_never_builds() {
        let items = items(2);
        let mut cache = AtlasCache::new();
        let key = AtlasKey::new(&items, 0, false);
        let pair = cache.refresh(key, || panic!("must not build while unready"));
        assert!(pair.is_none());
        assert_eq!(cache.build_count(), 0);
    }

    #[test]
    fn test_key_change_supersedes_pair() {
        let config = config();
        let first = items(2);
        let second = items(5);
        let mut cache = AtlasCache::new();

        let textures = vec![None; 2];
        let key = AtlasKey::new(&first, 0, true);
        let old = cache
            .refresh(key, || AtlasPair::build(&textures, &first, &config, &BlockRasterizer))
            .map(|p| Arc::clone(&p.image))
            .unwrap();

        let textures = vec![None; 5];
        let key = AtlasKey::new(&second, 0, true);
        assert!(cache.needs_rebuild(&key));
        let new = cache
            .refresh(key, || AtlasPair::build(&textures, &second, &config, &BlockRasterizer))
            .map(|p| Arc::clone(&p.image))
            .unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.layout().grid_side(), 3);
        assert_eq!(cache.build_count(), 2);

        // Readiness dropping clears the pair
        let unready = AtlasKey::new(&second, 0, false);
        assert!(cache.refresh(unready, || unreachable!()).is_none());
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_failed_build_is_not_retried() {
        let items = items(1);
        let mut cache = AtlasCache::new();
        let key = AtlasKey::new(&items, 3, true);

        assert!(cache.refresh(key, || Err(AtlasError::FontUnavailable("test".into()))).is_none());
        assert!(cache.refresh(key, || unreachable!()).is_none());
        assert_eq!(cache.build_count(), 1);
    }

    #[test]
    fn test_texture_generation_is_part_of_key() {
        let items = items(3);
        assert_ne!(AtlasKey::new(&items, 1, true), AtlasKey::new(&items, 2, true));
        assert_ne!(AtlasKey::new(&items, 1, true), AtlasKey::new(&items, 1, false));
    }
}
