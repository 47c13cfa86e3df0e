//! Error taxonomy for the frame loop.
//!
//! The frame loop distinguishes one transient condition from everything
//! fatal: [`RenderError::OutOfDate`] means the presentation surface no
//! longer matches the window and must be rebuilt, after which rendering
//! continues. Every other variant ends the session.
//!
//! Two conversion paths exist on purpose. `From<RhiError>` wraps the error
//! as a [`RenderError::Creation`] and is what `?` picks up on resource
//! build paths. Frame-loop calls use [`RenderError::from_rhi`] instead, so
//! that a Vulkan result buried in an RHI error keeps its frame-loop
//! meaning (out of date, timeout, device lost).

use ash::vk;
use thiserror::Error;

use prism_rhi::RhiError;

/// Errors surfaced by the frame scheduler and its driver.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The presentation surface no longer matches the window. Transient;
    /// the scheduler rebuilds the surface and continues.
    #[error("presentation surface is out of date")]
    OutOfDate,

    /// A bounded wait on a frame fence expired. The GPU is wedged or the
    /// frame took implausibly long; treated as fatal.
    #[error("timed out waiting for the GPU")]
    Timeout,

    /// The logical device was lost. Unrecoverable.
    #[error("GPU device lost")]
    DeviceLost,

    /// Creating or rebuilding rendering resources failed.
    #[error("resource creation failed: {0}")]
    Creation(#[from] RhiError),

    /// Any other Vulkan failure from the frame loop.
    #[error("Vulkan error: {0}")]
    Vulkan(vk::Result),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RenderError {
    /// Returns true if the frame loop can recover by rebuilding the
    /// presentation surface.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::OutOfDate)
    }

    /// Classifies an RHI error raised inside the frame loop.
    ///
    /// Embedded Vulkan results are mapped the same way raw results are;
    /// anything else becomes a creation failure.
    pub fn from_rhi(err: RhiError) -> Self {
        match err {
            RhiError::VulkanError(result) => Self::from(result),
            other => RenderError::Creation(other),
        }
    }
}

impl From<vk::Result> for RenderError {
    fn from(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_DATE_KHR => RenderError::OutOfDate,
            vk::Result::TIMEOUT => RenderError::Timeout,
            vk::Result::ERROR_DEVICE_LOST => RenderError::DeviceLost,
            other => RenderError::Vulkan(other),
        }
    }
}

/// Result type alias using the render error type.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_date_result_classified_transient() {
        let err = RenderError::from(vk::Result::ERROR_OUT_OF_DATE_KHR);
        assert!(matches!(err, RenderError::OutOfDate));
        assert!(err.is_transient());
    }

    #[test]
    fn test_fatal_results_classified() {
        assert!(matches!(
            RenderError::from(vk::Result::TIMEOUT),
            RenderError::Timeout
        ));
        assert!(matches!(
            RenderError::from(vk::Result::ERROR_DEVICE_LOST),
            RenderError::DeviceLost
        ));
        assert!(matches!(
            RenderError::from(vk::Result::ERROR_SURFACE_LOST_KHR),
            RenderError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR)
        ));
    }

    #[test]
    fn test_only_out_of_date_is_transient() {
        assert!(!RenderError::Timeout.is_transient());
        assert!(!RenderError::DeviceLost.is_transient());
        assert!(!RenderError::Vulkan(vk::Result::ERROR_UNKNOWN).is_transient());
        assert!(!RenderError::Internal("x".to_string()).is_transient());
    }

    #[test]
    fn test_from_rhi_unwraps_vulkan_results() {
        let err = RenderError::from_rhi(RhiError::VulkanError(vk::Result::ERROR_OUT_OF_DATE_KHR));
        assert!(matches!(err, RenderError::OutOfDate));

        let err = RenderError::from_rhi(RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST));
        assert!(matches!(err, RenderError::DeviceLost));
    }

    #[test]
    fn test_from_rhi_keeps_non_vulkan_errors_as_creation() {
        let err = RenderError::from_rhi(RhiError::ShaderError("bad spirv".to_string()));
        assert!(matches!(err, RenderError::Creation(_)));
    }

    #[test]
    fn test_build_path_conversion_wraps_as_creation() {
        // `?` on an RhiError goes through From and must not reclassify
        let err = RenderError::from(RhiError::VulkanError(vk::Result::ERROR_OUT_OF_DATE_KHR));
        assert!(matches!(err, RenderError::Creation(_)));
    }
}
