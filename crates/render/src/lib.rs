//! Real-time rendering for the prism renderer: frame pacing, presentation
//! surface lifecycle, and the Vulkan frame loop.
//!
//! The crate splits the frame loop into a backend-agnostic scheduler and a
//! Vulkan driver:
//!
//! - [`scheduler`] owns the frame protocol and the surface lifecycle state
//!   machine, expressed against the [`FrameDriver`] trait
//! - [`driver`] implements that trait on the real device stack
//! - [`surface`] bundles every size-dependent resource into one
//!   rebuildable unit
//! - [`renderer`] is the facade the application drives
//!
//! Frames are paced by one slot per swapchain image; each slot's fence is
//! the only backpressure between the control thread and the GPU.

pub mod depth;
pub mod driver;
mod error;
pub mod frame;
pub mod mesh;
pub mod renderer;
pub mod scheduler;
pub mod surface;
pub mod ubo;

pub use error::{RenderError, RenderResult};
pub use renderer::Renderer;
pub use scheduler::{AcquiredImage, FrameDriver, FrameScheduler, SurfaceState};
