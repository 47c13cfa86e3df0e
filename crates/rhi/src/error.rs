//! RHI-specific error types.

use thiserror::Error;

/// Errors produced by the Vulkan abstraction layer.
///
/// Creation failures are fatal to the caller; the frame-level distinction
/// between transient and fatal presentation outcomes lives in the render
/// crate, not here.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader module loading error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface query error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain creation or usage error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Invalid handle or argument
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
