// Gallery facade
// Owns every piece of per-view state; the host's event layer and frame callback both borrow it mutably

use std::time::Instant;

use glam::Vec2;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::atlas::{AtlasCache, AtlasError, AtlasKey, AtlasPair};
use crate::config::{GalleryConfig, CONFIG};
use crate::interaction::{CursorStyle, InputEvent, ViewportController};
use crate::item::{items_hash, Item};
use crate::postfx::PostFxParams;
use crate::readiness::ReadinessGate;
use crate::source::TextureSource;
use crate::text::{FontRasterizer, GlyphRasterizer};
use crate::uniforms::{FrameInput, FrameUniforms};

pub struct Gallery {
    items: Vec<Item>,
    items_hash: u64,
    textures: Vec<Option<TextureSource>>,
    textures_generation: u64,
    gate: ReadinessGate,
    cache: AtlasCache,
    controller: ViewportController,
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
    config: GalleryConfig,
}

impl Gallery {
    /// Gallery using the settings loaded from the user's settings file.
    pub fn new(items: Vec<Item>) -> Self {
        Self::with_config(items, CONFIG.clone())
    }

    /// Gallery labelling with the first loadable font in `config.text.font_candidates`.
    ///
    /// Without a usable font the label atlas cannot be built and the gallery keeps
    /// rendering its loading state.
    pub fn with_config(items: Vec<Item>, config: GalleryConfig) -> Self {
        let rasterizer = match FontRasterizer::from_candidates(&config.text.font_candidates) {
            Ok(rasterizer) => Some(Box::new(rasterizer) as Box<dyn GlyphRasterizer>),
            Err(e) => {
                warn!("No label font available: {e}");
                None
            }
        };
        Self::build(items, config, rasterizer)
    }

    pub fn with_rasterizer(items: Vec<Item>, config: GalleryConfig, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        Self::build(items, config, Some(rasterizer))
    }

    fn build(items: Vec<Item>, config: GalleryConfig, rasterizer: Option<Box<dyn GlyphRasterizer>>) -> Self {
        info!("Creating gallery with {} items", items.len());
        Self {
            items_hash: items_hash(&items),
            items,
            textures: Vec::new(),
            textures_generation: 0,
            gate: ReadinessGate::new(config.readiness_recheck),
            cache: AtlasCache::new(),
            controller: ViewportController::new(config.drag),
            rasterizer,
            config,
        }
    }

    /// Replace the item list. Atlases are rebuilt once the textures match it.
    pub fn set_items(&mut self, items: Vec<Item>, now: Instant) {
        self.items_hash = items_hash(&items);
        self.items = items;
        self.gate.observe(&self.textures, self.items.len(), now);
    }

    /// Hand over a new texture set, one slot per item in item order.
    ///
    /// Counts as a new identity even if the contents are equal, and schedules the
    /// delayed readiness re-check.
    pub fn set_textures(&mut self, textures: Vec<Option<TextureSource>>, now: Instant) {
        self.textures = textures;
        self.textures_generation += 1;
        debug!(
            "Texture set {} with {} slots for {} items",
            self.textures_generation,
            self.textures.len(),
            self.items.len()
        );
        self.gate.observe(&self.textures, self.items.len(), now);
    }

    /// Record decode progress for one slot of the current set.
    ///
    /// The set keeps its identity, so only the pending re-check sees the change.
    pub fn update_texture(&mut self, index: usize, source: TextureSource) -> bool {
        match self.textures.get_mut(index) {
            Some(slot) => {
                *slot = Some(source);
                true
            }
            None => {
                warn!("Ignoring texture update for slot {index}, set has {} slots", self.textures.len());
                false
            }
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        self.controller.handle_event(event);
    }

    /// Advance one rendered frame and return the uniforms to bind.
    pub fn frame(&mut self, input: FrameInput, now: Instant) -> FrameUniforms {
        let ready = self.gate.poll(&self.textures, self.items.len(), now);
        let key = AtlasKey {
            items_hash: self.items_hash,
            textures_generation: self.textures_generation,
            ready,
        };

        let textures = &self.textures;
        let items = &self.items;
        let config = &self.config;
        let rasterizer = self.rasterizer.as_deref();
        self.cache.refresh(key, || {
            let rasterizer = rasterizer.ok_or_else(|| AtlasError::FontUnavailable("no label font loaded".to_string()))?;
            AtlasPair::build(textures, items, config, rasterizer)
        });

        self.controller.tick();

        FrameUniforms::publish(
            &self.controller,
            self.cache.get(),
            ready,
            self.items.len(),
            self.config.cell_size,
            input,
        )
    }

    pub fn cursor(&self) -> CursorStyle {
        self.controller.cursor()
    }

    pub fn is_interacting(&self) -> bool {
        self.controller.is_interacting()
    }

    pub fn post_fx(&self) -> PostFxParams {
        PostFxParams::for_interaction(self.is_interacting())
    }

    pub fn scroll_offset(&self) -> Vec2 {
        self.controller.scroll_offset()
    }

    /// Inject inertia, e.g. a programmatic fling.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.controller.set_velocity(velocity);
    }

    /// Current atlas pair, if built.
    pub fn atlases(&self) -> Option<&AtlasPair> {
        self.cache.get()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn build_count(&self) -> usize {
        self.cache.build_count()
    }

    /// Cancel the pending readiness re-check and drop the atlases.
    pub fn teardown(&mut self) {
        self.gate.cancel();
        self.cache.clear();
        info!("Gallery torn down");
    }
}
