//! Synchronization primitives for Vulkan.
//!
//! This module provides wrappers for Vulkan synchronization objects:
//! - [`Semaphore`] - GPU-to-GPU synchronization (between queue operations)
//! - [`Fence`] - GPU-to-CPU synchronization (for host waiting)
//!
//! # Overview
//!
//! Semaphores order operations between queue submissions (acquire before
//! render, render before present) and are never observed by the CPU. Fences
//! are what the control thread blocks on before reusing per-frame resources.
//!
//! Both types belong to the rebuildable per-frame resource set, so neither
//! implements `Drop`; the owner calls `destroy(&Device)` during rebuild or
//! shutdown, after the device-idle wait. `destroy` is idempotent.
//!
//! # Example
//!
//! ```no_run
//! use prism_rhi::device::Device;
//! use prism_rhi::sync::{Semaphore, Fence};
//!
//! # fn example(device: &Device) -> Result<(), prism_rhi::RhiError> {
//! let image_available = Semaphore::new(device)?;
//!
//! // Fences guarding first use start signaled so the first wait returns
//! let mut in_flight = Fence::new(device, true)?;
//! in_flight.wait(device, u64::MAX)?;
//! in_flight.reset(device)?;
//!
//! in_flight.destroy(device);
//! # Ok(())
//! # }
//! ```

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan semaphore wrapper.
///
/// Used for GPU-to-GPU ordering between queue operations: image-available
/// (acquire → submit) and render-finished (submit → present).
pub struct Semaphore {
    /// Vulkan semaphore handle; null after `destroy`.
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new semaphore in the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: &Device) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        Ok(Self { semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// Destroys the semaphore. Safe to call more than once.
    ///
    /// The caller must guarantee no submitted GPU work still waits on or
    /// signals this semaphore.
    pub fn destroy(&mut self, device: &Device) {
        if self.semaphore != vk::Semaphore::null() {
            unsafe {
                device.handle().destroy_semaphore(self.semaphore, None);
            }
            self.semaphore = vk::Semaphore::null();
        }
    }
}

/// Vulkan fence wrapper.
///
/// Fences let the control thread observe GPU completion. The renderer uses
/// one per frame slot as its only cross-frame backpressure: waiting on the
/// slot's fence bounds how far the CPU can run ahead of the GPU.
pub struct Fence {
    /// Vulkan fence handle; null after `destroy`.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - If true, the fence starts signaled. Required for
    ///   fences that are waited on before the first submission that would
    ///   signal them.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: &Device, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled or `timeout` (nanoseconds)
    /// expires.
    ///
    /// # Errors
    ///
    /// Returns `vk::Result::TIMEOUT` as an error when the bound expires;
    /// the caller decides whether that is fatal.
    pub fn wait(&self, device: &Device, timeout: u64) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe { device.handle().wait_for_fences(&fences, true, timeout)? };
        Ok(())
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be in use by any pending queue submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self, device: &Device) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe { device.handle().reset_fences(&fences)? };
        Ok(())
    }

    /// Returns whether the fence is currently signaled, without blocking.
    pub fn is_signaled(&self, device: &Device) -> bool {
        let result = unsafe { device.handle().get_fence_status(self.fence) };
        matches!(result, Ok(true))
    }

    /// Destroys the fence. Safe to call more than once.
    ///
    /// The caller must guarantee no pending submission still signals this
    /// fence.
    pub fn destroy(&mut self, device: &Device) {
        if self.fence != vk::Fence::null() {
            unsafe {
                device.handle().destroy_fence(self.fence, None);
            }
            self.fence = vk::Fence::null();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
    }

    #[test]
    fn test_fence_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }
}
