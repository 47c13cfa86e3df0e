//! Scene components for the prism renderer.
//!
//! This crate provides the camera used to navigate the rendered scene.

pub mod camera;

pub use camera::{Camera, CameraMovement};
