//! Framebuffer creation.
//!
//! One framebuffer per swapchain image, each pairing that image's view with
//! the shared depth attachment. Framebuffers are part of the resources torn
//! down and recreated with the swapchain, so they are released with
//! [`Framebuffer::destroy`] rather than on drop.

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan framebuffer wrapper.
pub struct Framebuffer {
    /// Vulkan framebuffer handle.
    framebuffer: vk::Framebuffer,
    /// Framebuffer dimensions.
    extent: vk::Extent2D,
}

impl Framebuffer {
    /// Creates a framebuffer binding the given attachments to a render pass.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - Render pass the framebuffer must be compatible with
    /// * `attachments` - Image views in attachment order (color, then depth)
    /// * `extent` - Framebuffer dimensions
    ///
    /// # Errors
    ///
    /// Returns an error if framebuffer creation fails.
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        Ok(Self {
            framebuffer,
            extent,
        })
    }

    /// Returns the Vulkan framebuffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Returns the framebuffer dimensions.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroys the framebuffer.
    ///
    /// Safe to call more than once; subsequent calls are no-ops.
    pub fn destroy(&mut self, device: &Device) {
        if self.framebuffer != vk::Framebuffer::null() {
            unsafe {
                device.handle().destroy_framebuffer(self.framebuffer, None);
            }
            self.framebuffer = vk::Framebuffer::null();
            debug!("Destroyed framebuffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_is_send() {
        // Compile-time check that Framebuffer is Send
        fn assert_send<T: Send>() {}
        assert_send::<Framebuffer>();
    }
}
