//! Gate that holds atlas construction back until every source image is decoded.
//!
//! The gate is evaluated whenever the texture set changes and once more after a
//! short delay, since decoders can finish between the change and the first check.
//! There are no further retries.

use std::time::{Duration, Instant};

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::source::TextureSource;

/// `true` iff there is one non-empty slot per item and every slot is decoded.
pub fn all_decoded(textures: &[Option<TextureSource>], item_count: usize) -> bool {
    if textures.is_empty() || textures.len() != item_count {
        return false;
    }
    textures
        .iter()
        .all(|slot| slot.as_ref().is_some_and(TextureSource::is_decoded))
}

#[derive(Debug)]
pub struct ReadinessGate {
    ready: bool,
    recheck_delay: Duration,
    recheck_at: Option<Instant>,
}

impl ReadinessGate {
    pub fn new(recheck_delay: Duration) -> Self {
        Self {
            ready: false,
            recheck_delay,
            recheck_at: None,
        }
    }

    /// Evaluate a new texture set and schedule the single delayed re-check.
    ///
    /// Replaces any re-check pending for the previous set.
    pub fn observe(&mut self, textures: &[Option<TextureSource>], item_count: usize, now: Instant) -> bool {
        self.set_ready(all_decoded(textures, item_count));
        // Nothing is decoding when nothing was handed over
        self.recheck_at = (!textures.is_empty()).then(|| now + self.recheck_delay);
        self.ready
    }

    /// Run the pending re-check if its deadline has passed. Call once per frame.
    pub fn poll(&mut self, textures: &[Option<TextureSource>], item_count: usize, now: Instant) -> bool {
        if let Some(deadline) = self.recheck_at {
            if now >= deadline {
                self.recheck_at = None;
                self.set_ready(all_decoded(textures, item_count));
                debug!("Readiness re-check: ready={}", self.ready);
            }
        }
        self.ready
    }

    /// Drop the pending re-check, e.g. on teardown.
    pub fn cancel(&mut self) {
        if self.recheck_at.take().is_some() {
            debug!("Readiness re-check cancelled");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_pending_recheck(&self) -> bool {
        self.recheck_at.is_some()
    }

    fn set_ready(&mut self, ready: bool) {
        if ready != self.ready {
            debug!("Images ready: {} -> {}", self.ready, ready);
        }
        self.ready = ready;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_READINESS_RECHECK_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ImageElement, VideoFrame};
    use image::RgbaImage;

    fn decoded() -> Option<TextureSource> {
        Some(TextureSource::Image(ImageElement::decoded(RgbaImage::new(4, 4))))
    }

    fn pending() -> Option<TextureSource> {
        Some(TextureSource::Image(ImageElement::pending()))
    }

    #[test]
    fn test_all_decoded_rules() {
        assert!(!all_decoded(&[], 0));
        assert!(!all_decoded(&[decoded()], 2));
        assert!(!all_decoded(&[decoded(), decoded()], 1));
        assert!(!all_decoded(&[decoded(), pending()], 2));
        assert!(!all_decoded(&[decoded(), None], 2));
        assert!(all_decoded(&[decoded(), decoded()], 2));

        // Non-element sources are always ready
        let canvas = Some(TextureSource::from(RgbaImage::new(2, 2)));
        let video = Some(TextureSource::Video(VideoFrame::default()));
        assert!(all_decoded(&[canvas, video, decoded()], 3));

        let zero = Some(TextureSource::Image(ImageElement { complete: true, size: (0, 3), ..ImageElement::default() }));
        assert!(!all_decoded(&[zero], 1));
    }

    #[test]
    fn test_delayed_recheck_catches_late_decode() {
        let start = Instant::now();
        let mut gate = ReadinessGate::new(Duration::from_millis(100));
        let mut textures = vec![decoded(), pending()];

        assert!(!gate.observe(&textures, 2, start));
        assert!(gate.has_pending_recheck());

        // Decode finishes in place before the deadline
        textures[1] = decoded();
        assert!(!gate.poll(&textures, 2, start + Duration::from_millis(50)));
        assert!(gate.poll(&textures, 2, start + Duration::from_millis(100)));
        assert!(!gate.has_pending_recheck());
    }

    #[test]
    fn test_recheck_fires_only_once() {
        let start = Instant::now();
        let mut gate = ReadinessGate::new(Duration::from_millis(100));
        let mut textures = vec![pending()];

        gate.observe(&textures, 1, start);
        assert!(!gate.poll(&textures, 1, start + Duration::from_millis(150)));

        // Too late: no further retries for this texture set
        textures[0] = decoded();
        assert!(!gate.poll(&textures, 1, start + Duration::from_secs(5)));
        assert!(!gate.is_ready());

        // A new texture set is evaluated again
        assert!(gate.observe(&textures, 1, start + Duration::from_secs(6)));
    }

    #[test]
    fn test_cancel_drops_recheck() {
        let start = Instant::now();
        let mut gate = ReadinessGate::new(Duration::from_millis(100));
        let mut textures = vec![pending()];
        gate.observe(&textures, 1, start);
        gate.cancel();

        textures[0] = decoded();
        assert!(!gate.poll(&textures, 1, start + Duration::from_millis(200)));
    }

    #[test]
    fn test_empty_set_is_not_ready() {
        let start = Instant::now();
        let mut gate = ReadinessGate::default();
        assert!(gate.observe(&[decoded()], 1, start));
        assert!(!gate.observe(&[], 1, start));
        assert!(!gate.has_pending_recheck());
    }
}
