//! Render pass creation.
//!
//! A single render pass with one color attachment (the swapchain image) and
//! one depth attachment drives all drawing. The pass is recreated together
//! with the swapchain because the color attachment format follows the
//! surface format, so it is released with [`RenderPass::destroy`] rather
//! than on drop.

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan render pass wrapper.
///
/// Describes a single graphics subpass that clears and writes a color
/// attachment in `COLOR_ATTACHMENT_OPTIMAL` layout and a depth attachment in
/// `DEPTH_STENCIL_ATTACHMENT_OPTIMAL` layout. The color attachment transitions
/// to `PRESENT_SRC_KHR` at the end of the pass.
pub struct RenderPass {
    /// Vulkan render pass handle.
    render_pass: vk::RenderPass,
}

impl RenderPass {
    /// Creates a render pass for the given attachment formats.
    ///
    /// An external subpass dependency covers both the color output stage and
    /// the early fragment test stage, so the pass can wait on the swapchain
    /// acquire semaphore at `COLOR_ATTACHMENT_OUTPUT` and still clear the
    /// depth attachment safely.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `color_format` - Format of the swapchain images
    /// * `depth_format` - Format of the depth attachment
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(
        device: &Device,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> RhiResult<Self> {
        let color_attachment = vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let color_attachment_ref = vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let depth_attachment = vk::AttachmentDescription::default()
            .format(depth_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let depth_attachment_ref = vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_attachment_ref))
            .depth_stencil_attachment(&depth_attachment_ref);

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let attachments = [color_attachment, depth_attachment];
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

        debug!(
            "Created render pass: color={:?}, depth={:?}",
            color_format, depth_format
        );

        Ok(Self { render_pass })
    }

    /// Returns the Vulkan render pass handle.
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Destroys the render pass.
    ///
    /// Safe to call more than once; subsequent calls are no-ops.
    pub fn destroy(&mut self, device: &Device) {
        if self.render_pass != vk::RenderPass::null() {
            unsafe {
                device.handle().destroy_render_pass(self.render_pass, None);
            }
            self.render_pass = vk::RenderPass::null();
            debug!("Destroyed render pass");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pass_is_send() {
        // Compile-time check that RenderPass is Send
        fn assert_send<T: Send>() {}
        assert_send::<RenderPass>();
    }
}
