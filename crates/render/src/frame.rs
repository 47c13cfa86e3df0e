//! Per-frame resources for CPU/GPU frame pacing.
//!
//! The renderer keeps one [`FrameSlot`] per swapchain image. Each slot
//! bundles the pre-recorded command buffer for its image with the
//! synchronization objects and uniform buffers of one in-flight frame:
//!
//! - `image_available` orders acquire before the submitted work samples
//!   the image
//! - `render_finished` orders the submitted work before presentation
//! - `in_flight` is the fence the control thread blocks on before reusing
//!   the slot's uniform buffers
//!
//! Slots are built and destroyed together with the presentation surface,
//! so every resource here uses explicit `destroy` rather than drop.

use ash::vk;

use prism_rhi::buffer::{Buffer, BufferUsage};
use prism_rhi::descriptor::{self, buffer_info};
use prism_rhi::device::Device;
use prism_rhi::sync::{Fence, Semaphore};
use prism_rhi::RhiResult;

use crate::ubo::{CameraMatrices, ModelMatrix, CAMERA_BINDING, MODEL_BINDING};

/// One frame slot: command buffer, sync objects, and uniform buffers.
pub struct FrameSlot {
    /// Pre-recorded command buffer for this slot's swapchain image. The
    /// handle is owned by the command pool and freed through it.
    command_buffer: vk::CommandBuffer,
    /// Signaled when this slot's acquired image is ready to be rendered to.
    image_available: Semaphore,
    /// Signaled when this slot's submitted work finishes.
    render_finished: Semaphore,
    /// Signaled when this slot's submitted work retires; waited on before
    /// the slot is reused.
    in_flight: Fence,
    /// Camera matrices uniform buffer, persistently mapped.
    camera_ubo: Buffer,
    /// Model matrix uniform buffer, persistently mapped.
    model_ubo: Buffer,
    /// Descriptor set pointing at this slot's uniform buffers. Owned by
    /// the surface context's descriptor pool.
    descriptor_set: vk::DescriptorSet,
}

impl FrameSlot {
    /// Creates the slot's sync objects and uniform buffers, and points the
    /// descriptor set at them.
    ///
    /// The fence starts signaled so the first wait on a fresh slot returns
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if any sync object or buffer creation fails.
    pub fn new(
        device: &Device,
        command_buffer: vk::CommandBuffer,
        descriptor_set: vk::DescriptorSet,
    ) -> RhiResult<Self> {
        let image_available = Semaphore::new(device)?;
        let render_finished = Semaphore::new(device)?;
        let in_flight = Fence::new(device, true)?;

        let camera_ubo = Buffer::new(device, BufferUsage::Uniform, CameraMatrices::SIZE)?;
        let model_ubo = Buffer::new(device, BufferUsage::Uniform, ModelMatrix::SIZE)?;

        let camera_info = [buffer_info(camera_ubo.handle(), 0, CameraMatrices::SIZE)];
        let model_info = [buffer_info(model_ubo.handle(), 0, ModelMatrix::SIZE)];

        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(CAMERA_BINDING)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&camera_info),
            vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(MODEL_BINDING)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&model_info),
        ];
        descriptor::update_descriptor_sets(device, &writes);

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
            camera_ubo,
            model_ubo,
            descriptor_set,
        })
    }

    /// Returns the slot's command buffer handle.
    #[inline]
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Returns the image-available semaphore.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Returns the render-finished semaphore.
    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    /// Returns the in-flight fence.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }

    /// Returns the slot's descriptor set handle.
    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    /// Writes camera matrices into this slot's uniform buffer.
    ///
    /// Only safe once the slot's fence has been waited on; the previous
    /// frame on this slot may otherwise still be reading the buffer.
    pub fn write_camera(&self, matrices: &CameraMatrices) -> RhiResult<()> {
        self.camera_ubo.write_data(0, bytemuck::bytes_of(matrices))
    }

    /// Writes the model matrix into this slot's uniform buffer.
    ///
    /// Same fencing requirement as [`FrameSlot::write_camera`].
    pub fn write_model(&self, matrix: &ModelMatrix) -> RhiResult<()> {
        self.model_ubo.write_data(0, bytemuck::bytes_of(matrix))
    }

    /// Destroys the slot's sync objects and uniform buffers.
    ///
    /// The command buffer handle and descriptor set are freed by their
    /// owning pool. Safe to call more than once.
    pub fn destroy(&mut self, device: &Device) {
        self.image_available.destroy(device);
        self.render_finished.destroy(device);
        self.in_flight.destroy(device);
        self.camera_ubo.destroy(device);
        self.model_ubo.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_slot_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameSlot>();
    }
}
