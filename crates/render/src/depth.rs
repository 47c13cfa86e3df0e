//! Depth attachment for the presentation surface.
//!
//! One depth image sized to the swapchain extent, shared by every
//! framebuffer. It belongs to the rebuildable surface resources, so it is
//! released with [`DepthTarget::destroy`] during surface teardown rather
//! than on drop.

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use prism_rhi::device::Device;
use prism_rhi::{RhiError, RhiResult};

/// Depth attachment format used throughout the renderer.
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Depth image plus its view and backing allocation.
pub struct DepthTarget {
    /// Vulkan image handle; null after `destroy`.
    image: vk::Image,
    /// Vulkan image view handle; null after `destroy`.
    image_view: vk::ImageView,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Depth target dimensions.
    extent: vk::Extent2D,
}

impl DepthTarget {
    /// Creates a depth target with the given dimensions.
    ///
    /// The image uses [`DEPTH_FORMAT`] with optimal tiling and GPU-only
    /// memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or if image creation,
    /// memory allocation, or view creation fails.
    pub fn new(device: &Device, width: u32, height: u32) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(
                "Depth target dimensions must be greater than 0".to_string(),
            ));
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "depth target",
                requirements,
                location: MemoryLocation::GpuOnly,
                // Optimal tiling is not linear
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe { device.handle().create_image_view(&view_info, None)? };

        info!("Created depth target: {}x{}", width, height);

        Ok(Self {
            image,
            image_view,
            allocation: Some(allocation),
            extent: vk::Extent2D { width, height },
        })
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Returns the depth target extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroys the view, the image, and the backing allocation.
    ///
    /// Safe to call more than once; subsequent calls are no-ops. The caller
    /// must ensure the GPU is no longer rendering to the target.
    pub fn destroy(&mut self, device: &Device) {
        if self.image_view != vk::ImageView::null() {
            unsafe {
                device.handle().destroy_image_view(self.image_view, None);
            }
            self.image_view = vk::ImageView::null();
        }

        if self.image != vk::Image::null() {
            unsafe {
                device.handle().destroy_image(self.image, None);
            }
            self.image = vk::Image::null();
            debug!(
                "Destroyed depth target: {}x{}",
                self.extent.width, self.extent.height
            );
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free depth target allocation: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_format_is_depth_capable() {
        assert!(matches!(
            DEPTH_FORMAT,
            vk::Format::D32_SFLOAT
                | vk::Format::D32_SFLOAT_S8_UINT
                | vk::Format::D24_UNORM_S8_UINT
                | vk::Format::D16_UNORM
        ));
    }

    #[test]
    fn test_depth_target_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DepthTarget>();
    }
}
