//! Vulkan implementation of the frame driver.
//!
//! [`VulkanDriver`] owns the whole device stack: instance, surface, logical
//! device, command pool, layouts, mesh buffers, and the rebuildable
//! [`SurfaceContext`]. The [`FrameDriver`] impl maps the scheduler's
//! abstract frame protocol onto queue submissions and swapchain calls.
//!
//! The long-lived RAII objects are held in `ManuallyDrop` so the `Drop`
//! impl can release them in dependency order after the device idles.

use std::mem::ManuallyDrop;

use ash::vk;
use tracing::{error, info, warn};

use prism_platform::Surface;
use prism_rhi::command::CommandPool;
use prism_rhi::descriptor::DescriptorSetLayout;
use prism_rhi::device::Device;
use prism_rhi::instance::Instance;
use prism_rhi::pipeline::PipelineLayout;

use crate::error::{RenderError, RenderResult};
use crate::mesh::MeshBuffers;
use crate::scheduler::{AcquiredImage, FrameDriver};
use crate::surface::SurfaceContext;
use crate::ubo::{CameraMatrices, ModelMatrix};

/// Upper bound on a frame fence wait, in nanoseconds.
///
/// A healthy frame retires in milliseconds; hitting this bound means the
/// GPU is wedged and the session ends with [`RenderError::Timeout`].
const FENCE_TIMEOUT_NS: u64 = 1_000_000_000;

/// The Vulkan backend behind the frame scheduler.
///
/// Rebuildable surface resources live in `context`; `None` between a
/// release and the next successful rebuild. Everything else lives for the
/// whole session.
pub struct VulkanDriver {
    context: Option<SurfaceContext>,
    mesh: MeshBuffers,
    /// Drawable size from the latest window event; may be zero while
    /// minimized.
    drawable_size: (u32, u32),
    camera_data: CameraMatrices,
    model_data: ModelMatrix,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    set_layout: ManuallyDrop<DescriptorSetLayout>,
    command_pool: ManuallyDrop<CommandPool>,
    device: ManuallyDrop<Device>,
    surface: ManuallyDrop<Surface>,
    instance: ManuallyDrop<Instance>,
}

impl VulkanDriver {
    /// Assembles a driver from fully constructed parts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instance: Instance,
        surface: Surface,
        device: Device,
        command_pool: CommandPool,
        set_layout: DescriptorSetLayout,
        pipeline_layout: PipelineLayout,
        mesh: MeshBuffers,
        context: SurfaceContext,
        drawable_size: (u32, u32),
    ) -> Self {
        Self {
            context: Some(context),
            mesh,
            drawable_size,
            camera_data: CameraMatrices::default(),
            model_data: ModelMatrix::default(),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            set_layout: ManuallyDrop::new(set_layout),
            command_pool: ManuallyDrop::new(command_pool),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            instance: ManuallyDrop::new(instance),
        }
    }

    /// Updates the stored drawable size from a window event.
    pub fn set_drawable_size(&mut self, width: u32, height: u32) {
        self.drawable_size = (width, height);
    }

    /// Sets the uniform data the next frame will upload.
    pub fn set_frame_data(&mut self, camera: CameraMatrices, model: ModelMatrix) {
        self.camera_data = camera;
        self.model_data = model;
    }

    /// Returns the live surface context, if any.
    #[inline]
    pub fn context(&self) -> Option<&SurfaceContext> {
        self.context.as_ref()
    }

    fn context_ref(&self) -> RenderResult<&SurfaceContext> {
        self.context
            .as_ref()
            .ok_or_else(|| RenderError::Internal("no live presentation surface".to_string()))
    }
}

impl FrameDriver for VulkanDriver {
    fn drawable_extent(&self) -> (u32, u32) {
        self.drawable_size
    }

    fn release_surface(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = self.device.wait_idle() {
                warn!("Device wait failed during surface release: {}", e);
            }
            context.destroy(&self.device, &self.command_pool);
            info!("Presentation surface released");
        }
    }

    fn rebuild_surface(&mut self, width: u32, height: u32) -> RenderResult<usize> {
        let context = SurfaceContext::build(
            &self.instance,
            &self.device,
            self.surface.handle(),
            width,
            height,
            &self.command_pool,
            &self.set_layout,
            &self.pipeline_layout,
            &self.mesh,
        )?;
        let frame_count = context.frame_count();
        self.context = Some(context);
        Ok(frame_count)
    }

    fn acquire_image(&mut self, slot: usize) -> RenderResult<AcquiredImage> {
        let context = self.context_ref()?;
        let semaphore = context.slot(slot).image_available().handle();

        let (image_index, suboptimal) = context
            .swapchain()
            .acquire_next_image(semaphore)
            .map_err(RenderError::from)?;

        Ok(AcquiredImage {
            image_index: image_index as usize,
            suboptimal,
        })
    }

    fn wait_and_reset_fence(&mut self, slot: usize) -> RenderResult<()> {
        let context = self.context_ref()?;
        let fence = context.slot(slot).in_flight();

        fence
            .wait(&self.device, FENCE_TIMEOUT_NS)
            .map_err(RenderError::from_rhi)?;
        fence.reset(&self.device).map_err(RenderError::from_rhi)?;
        Ok(())
    }

    fn write_frame_data(&mut self, slot: usize) -> RenderResult<()> {
        let camera = self.camera_data;
        let model = self.model_data;

        let context = self.context_ref()?;
        let frame = context.slot(slot);
        frame.write_camera(&camera).map_err(RenderError::from_rhi)?;
        frame.write_model(&model).map_err(RenderError::from_rhi)?;
        Ok(())
    }

    fn submit(&mut self, slot: usize, image_index: usize) -> RenderResult<()> {
        let context = self.context_ref()?;
        let sync = context.slot(slot);

        let wait_semaphores = [sync.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        // The command buffer belongs to the acquired image; the sync
        // objects belong to the pacing slot
        let command_buffers = [context.slot(image_index).command_buffer()];
        let signal_semaphores = [sync.render_finished().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was recorded at surface build, the
        // semaphores are this frame's acquire/present pair, and the fence
        // was reset after its wait this iteration
        unsafe {
            self.device
                .submit_graphics(&[submit_info], sync.in_flight().handle())
        }
        .map_err(RenderError::from_rhi)?;
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: usize) -> RenderResult<bool> {
        let context = self.context_ref()?;
        let wait_semaphore = context.slot(slot).render_finished().handle();

        context
            .swapchain()
            .present(
                self.device.present_queue(),
                image_index as u32,
                wait_semaphore,
            )
            .map_err(RenderError::from)
    }
}

impl Drop for VulkanDriver {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Device wait failed during shutdown: {}", e);
        }

        if let Some(mut context) = self.context.take() {
            context.destroy(&self.device, &self.command_pool);
        }
        self.mesh.destroy(&self.device);

        // SAFETY: each field is dropped exactly once, children before the
        // device, the device before the surface and instance it came from
        unsafe {
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.set_layout);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer shut down");
    }
}
