//! Viewport interaction: pointer/touch drag, inertial decay and zoom easing.
//!
//! The controller is a small state machine (idle / dragging) with a decay process
//! that runs on every frame tick while idle. Input handlers and the frame tick run
//! on the same thread and each applies its writes in full before returning.
//!
//! Releasing a drag does not start a fling: velocity is only ever decayed here,
//! never derived from gesture speed. Hosts may inject one with
//! [`ViewportController::set_velocity`].

use glam::Vec2;

#[allow(unused_imports)]
use log::{debug, trace};

use crate::config::DragConfig;

/// Pointer position reported while the pointer is outside the canvas.
pub const OFF_CANVAS: Vec2 = Vec2::new(-1.0, -1.0);

/// Device-specific input coordinates, normalized by [`PointerInput::client_position`].
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    /// Mouse or pen, in screen pixels.
    Pointer(Vec2),
    /// Active touch points, in screen pixels; the first one drives the drag.
    Touch(Vec<Vec2>),
}

impl PointerInput {
    pub fn client_position(&self) -> Vec2 {
        match self {
            PointerInput::Pointer(pos) => *pos,
            PointerInput::Touch(touches) => touches.first().copied().unwrap_or(Vec2::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer down / touch start.
    Press(PointerInput),
    /// Pointer move / touch move.
    Move(PointerInput),
    /// Pointer up / touch end.
    Release,
    /// Pointer left the canvas.
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Grab,
    Grabbing,
}

impl CursorStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            CursorStyle::Grab => "grab",
            CursorStyle::Grabbing => "grabbing",
        }
    }
}

/// Captured on press; only meaningful while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragAnchor {
    pub start: Vec2,
    pub offset_at_start: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    /// World-space pan; unbounded, the shader wraps it.
    pub scroll_offset: Vec2,
    pub velocity: Vec2,
    pub is_dragging: bool,
    pub drag_anchor: DragAnchor,
    pub target_zoom: f32,
    pub current_zoom: f32,
    pub pointer_pixel_pos: Vec2,
}

impl InteractionState {
    fn new(zoom: f32) -> Self {
        Self {
            scroll_offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
            is_dragging: false,
            drag_anchor: DragAnchor::default(),
            target_zoom: zoom,
            current_zoom: zoom,
            pointer_pixel_pos: OFF_CANVAS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    state: InteractionState,
    config: DragConfig,
    cursor: CursorStyle,
}

impl ViewportController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            state: InteractionState::new(config.zoom_normal),
            config,
            cursor: CursorStyle::Grab,
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Press(input) => self.begin_drag(input.client_position()),
            InputEvent::Move(input) => {
                // Hover only tracks real pointers; touches have no hover
                if let PointerInput::Pointer(pos) = input {
                    self.state.pointer_pixel_pos = *pos;
                }
                self.drag_to(input.client_position());
            }
            InputEvent::Release => self.end_drag(),
            InputEvent::Leave => {
                self.end_drag();
                self.state.pointer_pixel_pos = OFF_CANVAS;
            }
        }
    }

    fn begin_drag(&mut self, pos: Vec2) {
        self.state.is_dragging = true;
        self.state.target_zoom = self.config.zoom_dragging;
        self.state.drag_anchor = DragAnchor {
            start: pos,
            offset_at_start: self.state.scroll_offset,
        };
        self.cursor = CursorStyle::Grabbing;
        debug!("Drag started at ({:.1}, {:.1})", pos.x, pos.y);
    }

    fn drag_to(&mut self, pos: Vec2) {
        if !self.state.is_dragging {
            self.cursor = CursorStyle::Grab;
            return;
        }

        let anchor = self.state.drag_anchor;
        let delta = (pos - anchor.start) * self.config.sensitivity;
        // Screen Y grows downwards, world Y upwards
        self.state.scroll_offset = Vec2::new(
            anchor.offset_at_start.x - delta.x,
            anchor.offset_at_start.y + delta.y,
        );
        trace!("Scroll offset ({:.4}, {:.4})", self.state.scroll_offset.x, self.state.scroll_offset.y);
    }

    fn end_drag(&mut self) {
        if self.state.is_dragging {
            debug!("Drag ended at offset ({:.4}, {:.4})", self.state.scroll_offset.x, self.state.scroll_offset.y);
        }
        self.state.is_dragging = false;
        self.state.target_zoom = self.config.zoom_normal;
        self.cursor = CursorStyle::Grab;
    }

    /// Advance inertia and zoom by one frame.
    ///
    /// Both are plain exponential approaches, so neither velocity nor zoom ever
    /// lands exactly on its target.
    pub fn tick(&mut self) {
        if !self.state.is_dragging {
            self.state.scroll_offset += self.state.velocity;
            self.state.velocity *= self.config.velocity_damping;
        }
        self.state.current_zoom +=
            (self.state.target_zoom - self.state.current_zoom) * self.config.zoom_lerp_speed;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.state.velocity = velocity;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn scroll_offset(&self) -> Vec2 {
        self.state.scroll_offset
    }

    pub fn current_zoom(&self) -> f32 {
        self.state.current_zoom
    }

    pub fn pointer_pixel_pos(&self) -> Vec2 {
        self.state.pointer_pixel_pos
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Drives the cosmetic post-processing.
    pub fn is_interacting(&self) -> bool {
        self.state.is_dragging
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn pointer(x: f32, y: f32) -> PointerInput {
        PointerInput::Pointer(Vec2::new(x, y))
    }

    #[test]
    fn test_drag_x_subtracts_y_adds() {
        let config = DragConfig::default();
        let s = config.sensitivity;
        let mut controller = ViewportController::new(config);

        controller.handle_event(&InputEvent::Press(pointer(100.0, 100.0)));
        controller.handle_event(&InputEvent::Move(pointer(150.0, 130.0)));

        let offset = controller.scroll_offset();
        assert!(approx_eq(offset.x, -50.0 * s));
        assert!(approx_eq(offset.y, 30.0 * s));
    }

    #[test]
    fn test_drag_is_relative_to_anchor() {
        let mut controller = ViewportController::new(DragConfig { sensitivity: 1.0, ..DragConfig::default() });

        controller.handle_event(&InputEvent::Press(pointer(0.0, 0.0)));
        controller.handle_event(&InputEvent::Move(pointer(10.0, 0.0)));
        controller.handle_event(&InputEvent::Move(pointer(20.0, 5.0)));
        controller.handle_event(&InputEvent::Release);
        assert_eq!(controller.scroll_offset(), Vec2::new(-20.0, 5.0));

        // Second drag starts from the accumulated offset
        controller.handle_event(&InputEvent::Press(pointer(50.0, 50.0)));
        controller.handle_event(&InputEvent::Move(pointer(45.0, 40.0)));
        assert_eq!(controller.scroll_offset(), Vec2::new(-15.0, -5.0));
    }

    #[test]
    fn test_touch_uses_first_touch() {
        let mut controller = ViewportController::new(DragConfig { sensitivity: 1.0, ..DragConfig::default() });
        controller.handle_event(&InputEvent::Press(PointerInput::Touch(vec![Vec2::new(10.0, 10.0), Vec2::new(99.0, 99.0)])));
        controller.handle_event(&InputEvent::Move(PointerInput::Touch(vec![Vec2::new(12.0, 13.0)])));
        assert_eq!(controller.scroll_offset(), Vec2::new(-2.0, 3.0));
        // Touch moves never touch the hover position
        assert_eq!(controller.pointer_pixel_pos(), OFF_CANVAS);

        assert_eq!(PointerInput::Touch(Vec::new()).client_position(), Vec2::ZERO);
    }

    #[test]
    fn test_move_without_drag_only_hovers() {
        let mut controller = ViewportController::default();
        controller.handle_event(&InputEvent::Move(pointer(40.0, 60.0)));
        assert_eq!(controller.scroll_offset(), Vec2::ZERO);
        assert_eq!(controller.pointer_pixel_pos(), Vec2::new(40.0, 60.0));
        assert_eq!(controller.cursor(), CursorStyle::Grab);
    }

    #[test]
    fn test_press_release_zoom_and_cursor() {
        let config = DragConfig::default();
        let mut controller = ViewportController::new(config);
        assert!(!controller.is_interacting());

        controller.handle_event(&InputEvent::Press(pointer(1.0, 1.0)));
        assert!(controller.is_interacting());
        assert_eq!(controller.state().target_zoom, config.zoom_dragging);
        assert_eq!(controller.cursor().as_str(), "grabbing");

        controller.handle_event(&InputEvent::Release);
        assert!(!controller.is_interacting());
        assert_eq!(controller.state().target_zoom, config.zoom_normal);
        assert_eq!(controller.cursor().as_str(), "grab");
    }

    #[test]
    fn test_leave_ends_drag_and_resets_pointer() {
        let mut controller = ViewportController::default();
        controller.handle_event(&InputEvent::Move(pointer(5.0, 5.0)));
        controller.handle_event(&InputEvent::Press(pointer(5.0, 5.0)));
        controller.handle_event(&InputEvent::Leave);
        assert!(!controller.is_interacting());
        assert_eq!(controller.pointer_pixel_pos(), OFF_CANVAS);
    }

    #[test]
    fn test_idle_tick_applies_and_damps_velocity() {
        let mut controller = ViewportController::default();
        controller.set_velocity(Vec2::new(10.0, 0.0));

        controller.tick();
        assert!(approx_eq(controller.scroll_offset().x, 10.0));
        assert!(approx_eq(controller.state().velocity.x, 9.2));

        let mut previous = controller.state().velocity.x;
        for _ in 0..500 {
            controller.tick();
            let v = controller.state().velocity.x;
            assert!(v < previous);
            assert!(v > 0.0);
            previous = v;
        }
    }

    #[test]
    fn test_dragging_freezes_inertia() {
        let mut controller = ViewportController::default();
        controller.set_velocity(Vec2::new(3.0, 4.0));
        controller.handle_event(&InputEvent::Press(pointer(0.0, 0.0)));
        controller.tick();
        assert_eq!(controller.scroll_offset(), Vec2::ZERO);
        assert_eq!(controller.state().velocity, Vec2::new(3.0, 4.0));

        // Release does not fling; the old velocity resumes decaying
        controller.handle_event(&InputEvent::Release);
        controller.tick();
        assert_eq!(controller.scroll_offset(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_zoom_eases_without_overshoot() {
        let mut controller = ViewportController::default();
        controller.handle_event(&InputEvent::Press(pointer(0.0, 0.0)));

        controller.tick();
        assert!(approx_eq(controller.current_zoom(), 1.03));

        let mut previous = controller.current_zoom();
        for _ in 0..300 {
            controller.tick();
            let zoom = controller.current_zoom();
            assert!(zoom >= previous);
            assert!(zoom <= 1.3);
            previous = zoom;
        }
        assert!(approx_eq(previous, 1.3));
    }
}
