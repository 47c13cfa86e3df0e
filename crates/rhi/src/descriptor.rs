//! Descriptor set management for shader resource binding.
//!
//! This module provides abstractions for Vulkan descriptor management:
//! - [`DescriptorSetLayout`] defines the layout of shader bindings
//! - [`DescriptorPool`] manages allocation of descriptor sets
//! - Helper functions for updating descriptor sets
//!
//! The layout is long-lived and cleans up on drop. The pool belongs to the
//! per-frame resources that are torn down and recreated with the presentation
//! surface, so it is released with [`DescriptorPool::destroy`]; the sets
//! allocated from it die with the pool.
//!
//! # Example
//!
//! ```no_run
//! use ash::vk;
//! use prism_rhi::device::Device;
//! use prism_rhi::descriptor::{DescriptorBindingBuilder, DescriptorSetLayout, DescriptorPool};
//!
//! # fn example(device: &Device) -> Result<(), prism_rhi::RhiError> {
//! // Create layout with a uniform buffer binding
//! let bindings = [DescriptorBindingBuilder::uniform_buffer(
//!     0,
//!     vk::ShaderStageFlags::VERTEX,
//! )];
//! let layout = DescriptorSetLayout::new(device, &bindings)?;
//!
//! // Create pool, one set per swapchain image
//! let pool_size = vk::DescriptorPoolSize::default()
//!     .ty(vk::DescriptorType::UNIFORM_BUFFER)
//!     .descriptor_count(3);
//!
//! let mut pool = DescriptorPool::new(device, 3, &[pool_size])?;
//!
//! // Allocate descriptor sets
//! let sets = pool.allocate(device, &[layout.handle(); 3])?;
//! # pool.destroy(device);
//! # Ok(())
//! # }
//! ```

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper.
///
/// A descriptor set layout defines the structure of resources that can be
/// bound to a shader. It specifies the binding points, descriptor types,
/// and shader stages that can access each resource.
pub struct DescriptorSetLayout {
    /// Logical device function table.
    device: ash::Device,
    /// Vulkan descriptor set layout handle.
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bindings` - Array of binding descriptions
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(device: &Device, bindings: &[vk::DescriptorSetLayoutBinding]) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self {
            device: device.handle().clone(),
            layout,
        })
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool for allocating descriptor sets.
///
/// A descriptor pool manages a pool of descriptors from which descriptor
/// sets can be allocated. The pool must be created with enough capacity
/// for all descriptor types and sets that will be allocated from it.
///
/// # Thread Safety
///
/// Descriptor pool operations are not thread-safe. Synchronize access
/// externally when sharing between threads.
pub struct DescriptorPool {
    /// Vulkan descriptor pool handle.
    pool: vk::DescriptorPool,
    /// Maximum number of sets that can be allocated.
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a new descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `max_sets` - Maximum number of descriptor sets that can be allocated
    /// * `pool_sizes` - Array of pool sizes for each descriptor type
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: &Device,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self { pool, max_sets })
    }

    /// Allocates descriptor sets from the pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `layouts` - Array of descriptor set layouts, one per set to allocate
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails (e.g., pool exhausted).
    pub fn allocate(
        &self,
        device: &Device,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    /// Returns the Vulkan descriptor pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Returns the maximum number of sets that can be allocated from this pool.
    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    /// Destroys the pool and implicitly frees every set allocated from it.
    ///
    /// Safe to call more than once; subsequent calls are no-ops. The caller
    /// must ensure no set from this pool is in use by the GPU.
    pub fn destroy(&mut self, device: &Device) {
        if self.pool != vk::DescriptorPool::null() {
            unsafe {
                device.handle().destroy_descriptor_pool(self.pool, None);
            }
            self.pool = vk::DescriptorPool::null();
            debug!("Destroyed descriptor pool");
        }
    }
}

/// Updates descriptor sets with resource bindings.
///
/// This function writes resource bindings to one or more descriptor sets.
/// It's the primary way to connect buffers to shaders.
///
/// # Arguments
///
/// * `device` - The logical device
/// * `writes` - Array of write descriptor set operations
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }

    debug!("Updated {} descriptor set(s)", writes.len());
}

/// Creates a buffer info for descriptor set updates.
///
/// Convenience function for creating a `DescriptorBufferInfo` structure.
///
/// # Arguments
///
/// * `buffer` - The buffer handle
/// * `offset` - Offset into the buffer in bytes
/// * `range` - Size of the buffer range to bind, or `vk::WHOLE_SIZE` for the entire buffer
#[inline]
pub fn buffer_info(
    buffer: vk::Buffer,
    offset: vk::DeviceSize,
    range: vk::DeviceSize,
) -> vk::DescriptorBufferInfo {
    vk::DescriptorBufferInfo::default()
        .buffer(buffer)
        .offset(offset)
        .range(range)
}

/// Builder for creating descriptor set layout bindings.
///
/// Provides a convenient way to construct descriptor set layout bindings
/// with a fluent API.
///
/// # Example
///
/// ```no_run
/// use ash::vk;
/// use prism_rhi::descriptor::DescriptorBindingBuilder;
///
/// let bindings = [
///     DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX),
///     DescriptorBindingBuilder::uniform_buffer(1, vk::ShaderStageFlags::VERTEX),
/// ];
/// ```
pub struct DescriptorBindingBuilder;

impl DescriptorBindingBuilder {
    /// Creates a uniform buffer binding.
    ///
    /// # Arguments
    ///
    /// * `binding` - The binding index
    /// * `stage_flags` - The shader stages that can access this binding
    #[inline]
    pub fn uniform_buffer(
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stage_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_binding_builder_uniform_buffer() {
        let binding = DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_buffer_info_helper() {
        let info = buffer_info(vk::Buffer::null(), 64, 128);
        assert_eq!(info.buffer, vk::Buffer::null());
        assert_eq!(info.offset, 64);
        assert_eq!(info.range, 128);
    }
}
