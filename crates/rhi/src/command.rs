//! Command pool and command buffer management.
//!
//! This module provides wrappers for VkCommandPool and VkCommandBuffer,
//! enabling safe recording of Vulkan commands.
//!
//! # Overview
//!
//! - [`CommandPool`] manages VkCommandPool creation and command buffer allocation
//! - [`CommandBuffer`] wraps VkCommandBuffer with methods for recording commands
//!
//! The pool is a long-lived object that cleans itself up on drop. Command
//! buffers allocated from it are plain handles; they are freed back to the
//! pool explicitly when the surface resources they reference are torn down.
//!
//! # Example
//!
//! ```no_run
//! use prism_rhi::device::Device;
//! use prism_rhi::command::{CommandPool, CommandBuffer};
//!
//! # fn example(device: &Device) -> Result<(), prism_rhi::RhiError> {
//! // Create command pool for the graphics queue family
//! let queue_family = device.queue_families().graphics_family.unwrap();
//! let pool = CommandPool::new(device, queue_family)?;
//!
//! // Allocate command buffers, one per swapchain image
//! let buffers = pool.allocate_command_buffers(3)?;
//!
//! // Record commands into the first one
//! let cmd = CommandBuffer::from_handle(device, buffers[0]);
//! cmd.begin_reusable()?;
//! // ... record rendering commands ...
//! cmd.end()?;
//! # Ok(())
//! # }
//! ```

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan command pool wrapper.
///
/// A command pool is used to allocate command buffers. Each pool is associated
/// with a specific queue family and can only allocate command buffers that
/// will be submitted to queues of that family.
///
/// # Thread Safety
///
/// Command pools are not thread-safe. For multi-threaded command recording,
/// create a separate pool per thread.
pub struct CommandPool {
    /// Logical device function table.
    device: ash::Device,
    /// Vulkan command pool handle.
    pool: vk::CommandPool,
    /// Queue family index this pool belongs to.
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a new command pool for the specified queue family.
    ///
    /// The pool is created with the `RESET_COMMAND_BUFFER` flag, allowing
    /// individual command buffers to be reset without resetting the entire pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `queue_family_index` - The queue family for command buffer submission
    ///
    /// # Errors
    ///
    /// Returns an error if command pool creation fails.
    pub fn new(device: &Device, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        info!(
            "Command pool created for queue family {}",
            queue_family_index
        );

        Ok(Self {
            device: device.handle().clone(),
            pool,
            queue_family_index,
        })
    }

    /// Returns the Vulkan command pool handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Returns the queue family index this pool belongs to.
    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Allocates multiple primary command buffers from this pool.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of command buffers to allocate
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffers(&self, count: u32) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let buffers = unsafe { self.device.allocate_command_buffers(&alloc_info)? };
        Ok(buffers)
    }

    /// Frees command buffers back to this pool.
    ///
    /// The caller must ensure none of the buffers are pending execution.
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        if buffers.is_empty() {
            return;
        }
        unsafe {
            self.device.free_command_buffers(self.pool, buffers);
        }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
        info!(
            "Command pool destroyed for queue family {}",
            self.queue_family_index
        );
    }
}

/// Vulkan command buffer wrapper.
///
/// Provides a safe interface for recording Vulkan commands. The command buffer
/// wraps the raw VkCommandBuffer handle and provides methods for common
/// rendering operations.
///
/// # Command Recording
///
/// Commands are recorded between `begin_reusable()` and `end()` calls:
///
/// ```no_run
/// # use prism_rhi::device::Device;
/// # use prism_rhi::command::CommandBuffer;
/// # fn example(device: &Device, handle: prism_rhi::vk::CommandBuffer) -> Result<(), prism_rhi::RhiError> {
/// let cmd = CommandBuffer::from_handle(device, handle);
///
/// cmd.begin_reusable()?;
/// // Record commands here...
/// cmd.end()?;
/// # Ok(())
/// # }
/// ```
///
/// # Note
///
/// The command buffer does NOT own the underlying VkCommandBuffer handle.
/// The handle is freed through the owning [`CommandPool`].
pub struct CommandBuffer {
    /// Logical device function table.
    device: ash::Device,
    /// Vulkan command buffer handle.
    buffer: vk::CommandBuffer,
}

impl CommandBuffer {
    /// Wraps an existing command buffer handle.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `buffer` - The raw command buffer handle
    #[inline]
    pub fn from_handle(device: &Device, buffer: vk::CommandBuffer) -> Self {
        Self {
            device: device.handle().clone(),
            buffer,
        }
    }

    /// Returns the raw Vulkan command buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    // =========================================================================
    // Recording Control
    // =========================================================================

    /// Begins recording commands that can be resubmitted.
    ///
    /// The recorded contents stay valid across submissions until the buffer
    /// is reset or freed, which is what pre-recorded per-image command
    /// buffers need.
    ///
    /// # Errors
    ///
    /// Returns an error if beginning fails (e.g., if already recording).
    pub fn begin_reusable(&self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default();

        unsafe {
            self.device.begin_command_buffer(self.buffer, &begin_info)?;
        }

        Ok(())
    }

    /// Ends recording commands to the buffer.
    ///
    /// After this call, the command buffer is ready for submission.
    ///
    /// # Errors
    ///
    /// Returns an error if ending fails (e.g., if not recording).
    pub fn end(&self) -> RhiResult<()> {
        unsafe {
            self.device.end_command_buffer(self.buffer)?;
        }

        Ok(())
    }

    // =========================================================================
    // Render Pass Commands
    // =========================================================================

    /// Begins a render pass instance with inline subpass contents.
    ///
    /// # Arguments
    ///
    /// * `begin_info` - Render pass, framebuffer, render area and clear values
    pub fn begin_render_pass(&self, begin_info: &vk::RenderPassBeginInfo) {
        unsafe {
            self.device.cmd_begin_render_pass(
                self.buffer,
                begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    /// Ends the current render pass instance.
    pub fn end_render_pass(&self) {
        unsafe {
            self.device.cmd_end_render_pass(self.buffer);
        }
    }

    // =========================================================================
    // Pipeline Binding
    // =========================================================================

    /// Binds a pipeline to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `bind_point` - Whether this is a graphics or compute pipeline
    /// * `pipeline` - The pipeline to bind
    pub fn bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(self.buffer, bind_point, pipeline);
        }
    }

    /// Binds vertex buffers to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `first_binding` - First vertex input binding to update
    /// * `buffers` - Slice of buffer handles
    /// * `offsets` - Byte offsets into each buffer
    pub fn bind_vertex_buffers(
        &self,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(self.buffer, first_binding, buffers, offsets);
        }
    }

    /// Binds an index buffer to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `buffer` - The index buffer
    /// * `offset` - Byte offset into the buffer
    /// * `index_type` - Type of indices (UINT16 or UINT32)
    pub fn bind_index_buffer(
        &self,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(self.buffer, buffer, offset, index_type);
        }
    }

    /// Binds descriptor sets to the command buffer.
    ///
    /// # Arguments
    ///
    /// * `bind_point` - Whether this is for graphics or compute
    /// * `layout` - The pipeline layout
    /// * `first_set` - First descriptor set to update
    /// * `descriptor_sets` - Slice of descriptor sets
    pub fn bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.buffer,
                bind_point,
                layout,
                first_set,
                descriptor_sets,
                &[],
            );
        }
    }

    // =========================================================================
    // Drawing Commands
    // =========================================================================

    /// Issues an indexed draw command.
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `instance_count` - Number of instances to draw
    /// * `first_index` - Offset to the first index
    /// * `vertex_offset` - Constant added to each index
    /// * `first_instance` - Offset to the first instance
    pub fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                self.buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_buffer_is_send() {
        // Compile-time check that CommandBuffer is Send
        fn assert_send<T: Send>() {}
        assert_send::<CommandBuffer>();
    }

    #[test]
    fn test_command_pool_is_send() {
        // Compile-time check that CommandPool is Send
        fn assert_send<T: Send>() {}
        assert_send::<CommandPool>();
    }
}
