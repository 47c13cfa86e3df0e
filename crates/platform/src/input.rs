//! Input handling for keyboard and mouse-look.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Tracks the keyboard state and the mouse motion accumulated since the last
/// frame.
///
/// Mouse motion comes from raw device events, so deltas are accumulated
/// rather than derived from cursor positions; `begin_frame` drains them.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently pressed keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that were pressed since the last `begin_frame`
    just_pressed_keys: HashSet<KeyCode>,
    /// Mouse movement accumulated since the last `begin_frame`
    mouse_delta: (f32, f32),
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the beginning of each frame to clear per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Handle a key press event.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    /// Handle a key release event.
    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Accumulate raw mouse motion.
    pub fn on_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    /// Check if a key is currently held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key went down since the last `begin_frame`.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Mouse movement accumulated since the last `begin_frame`.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }
}
