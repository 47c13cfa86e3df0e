//! Platform layer for the prism renderer.
//!
//! This crate provides platform-specific functionality:
//! - Window management via winit
//! - Vulkan surface creation via ash-window
//! - Keyboard and mouse input state

mod input;
mod window;

pub use input::{InputState, KeyCode};
pub use window::{Surface, Window, get_required_extensions};
