//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! This crate provides thin, safe constructors over Vulkan using the `ash`
//! crate. It handles:
//! - Instance creation with an injected diagnostic sink
//! - Physical device selection and logical device creation
//! - Swapchain, render pass, framebuffer, and pipeline objects
//! - Buffers, descriptors, and command recording
//! - Synchronization primitives
//!
//! Long-lived objects (instance, device, command pool) clean up in `Drop`.
//! Objects that belong to the rebuildable presentation chain instead expose
//! an explicit, idempotent `destroy(&Device)` so the render crate can tear
//! them down in dependency order while the device is idle.

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
