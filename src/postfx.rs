// Post-processing parameters
// Cosmetic only: the host's vignette and chromatic aberration passes read these each frame

/// Filter settings for the current interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFxParams {
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    /// Red/blue channel shift in UV units.
    pub chromatic_aberration_offset: [f32; 2],
}

impl PostFxParams {
    pub const IDLE: Self = Self {
        vignette_offset: 0.8,
        vignette_darkness: 0.4,
        chromatic_aberration_offset: [0.0, 0.0],
    };

    pub const INTERACTING: Self = Self {
        vignette_offset: 0.4,
        vignette_darkness: 0.8,
        chromatic_aberration_offset: [0.005, 0.001],
    };

    pub fn for_interaction(is_interacting: bool) -> Self {
        if is_interacting {
            Self::INTERACTING
        } else {
            Self::IDLE
        }
    }
}

impl Default for PostFxParams {
    fn default() -> Self {
        Self::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dragging_tightens_vignette_and_splits_channels() {
        let idle = PostFxParams::for_interaction(false);
        let dragging = PostFxParams::for_interaction(true);

        assert_eq!(idle, PostFxParams::default());
        assert_eq!(idle.chromatic_aberration_offset, [0.0, 0.0]);
        assert!(dragging.vignette_offset < idle.vignette_offset);
        assert!(dragging.vignette_darkness > idle.vignette_darkness);
        assert_eq!(dragging.chromatic_aberration_offset, [0.005, 0.001]);
    }
}
