//! Top-level renderer facade.
//!
//! [`Renderer`] wires the whole stack together: it boots the Vulkan device
//! behind a [`VulkanDriver`], owns the [`FrameScheduler`] that paces
//! frames, and turns input into camera and model transforms. The
//! application layer only ever talks to this type.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Mat4;
use tracing::{debug, info};

use prism_platform::{get_required_extensions, InputState, KeyCode, Window};
use prism_rhi::command::CommandPool;
use prism_rhi::descriptor::{DescriptorBindingBuilder, DescriptorSetLayout};
use prism_rhi::device::Device;
use prism_rhi::instance::Instance;
use prism_rhi::physical_device::select_physical_device;
use prism_rhi::pipeline::PipelineLayout;
use prism_rhi::{vk, RhiError};
use prism_scene::{Camera, CameraMovement};

use crate::driver::VulkanDriver;
use crate::error::{RenderError, RenderResult};
use crate::mesh::{self, MeshBuffers};
use crate::scheduler::{FrameScheduler, SurfaceState};
use crate::surface::SurfaceContext;
use crate::ubo::{CameraMatrices, ModelMatrix, CAMERA_BINDING, MODEL_BINDING};

/// Spin rate of the demo quad, in radians per second.
const MODEL_SPIN_RATE: f32 = FRAC_PI_2;

/// The renderer: device stack, frame pacing, and scene state.
pub struct Renderer {
    driver: VulkanDriver,
    scheduler: FrameScheduler,
    camera: Camera,
    /// Current rotation of the demo quad around the Z axis, in radians.
    model_angle: f32,
}

impl Renderer {
    /// Boots Vulkan against the given window and builds the first surface.
    ///
    /// Validation layers are enabled in debug builds when available.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of device or surface creation fails.
    pub fn new(window: &Window) -> RenderResult<Self> {
        let (width, height) = window.drawable_size();

        let display_handle = window
            .display_handle()
            .map_err(|e| RenderError::Internal(format!("no display handle: {}", e)))?;
        let surface_extensions = get_required_extensions(display_handle.as_raw())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let enable_validation = cfg!(debug_assertions);
        let instance = Instance::new(c"prism", &surface_extensions, enable_validation, None)?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device)?;

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RenderError::Internal("selected GPU has no graphics queue".to_string()))?;
        let command_pool = CommandPool::new(&device, graphics_family)?;

        let bindings = [
            DescriptorBindingBuilder::uniform_buffer(CAMERA_BINDING, vk::ShaderStageFlags::VERTEX),
            DescriptorBindingBuilder::uniform_buffer(MODEL_BINDING, vk::ShaderStageFlags::VERTEX),
        ];
        let set_layout = DescriptorSetLayout::new(&device, &bindings)?;
        let pipeline_layout = PipelineLayout::new(&device, &[set_layout.handle()], &[])?;

        let mesh_buffers = MeshBuffers::upload(&device, &mesh::quad(), &mesh::QUAD_INDICES)?;

        let context = SurfaceContext::build(
            &instance,
            &device,
            surface.handle(),
            width,
            height,
            &command_pool,
            &set_layout,
            &pipeline_layout,
            &mesh_buffers,
        )?;
        let frame_count = context.frame_count();

        let mut camera = Camera::new();
        if height > 0 {
            camera.set_aspect(width as f32 / height as f32);
        }

        let driver = VulkanDriver::new(
            instance,
            surface,
            device,
            command_pool,
            set_layout,
            pipeline_layout,
            mesh_buffers,
            context,
            (width, height),
        );

        info!("Renderer initialized with {} frame slot(s)", frame_count);

        Ok(Self {
            driver,
            scheduler: FrameScheduler::new(frame_count),
            camera,
            model_angle: 0.0,
        })
    }

    /// Handles a window resize event.
    ///
    /// Zero sizes pass through; the scheduler suspends rendering until the
    /// window regains area.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("Resize event: {}x{}", width, height);
        self.driver.set_drawable_size(width, height);
        self.scheduler.notify_resize();
    }

    /// Advances the scene by one tick of input and elapsed time.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        if input.is_key_pressed(KeyCode::KeyW) {
            self.camera.process_movement(CameraMovement::Forward, dt);
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            self.camera.process_movement(CameraMovement::Backward, dt);
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            self.camera.process_movement(CameraMovement::Left, dt);
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            self.camera.process_movement(CameraMovement::Right, dt);
        }

        let (dx, dy) = input.mouse_delta();
        if dx != 0.0 || dy != 0.0 {
            self.camera.process_mouse(dx, dy);
        }

        self.model_angle = (self.model_angle + MODEL_SPIN_RATE * dt) % TAU;
    }

    /// Renders one frame, or advances the surface lifecycle if the surface
    /// is stale.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions; resize and stale
    /// swapchains are handled internally.
    pub fn render_frame(&mut self) -> RenderResult<()> {
        // Track the live surface's aspect ratio; it can differ from the
        // requested window size after a rebuild
        if let Some(context) = self.driver.context() {
            let extent = context.extent();
            if extent.height > 0 {
                self.camera
                    .set_aspect(extent.width as f32 / extent.height as f32);
            }
        }

        let camera_data =
            CameraMatrices::new(self.camera.view_matrix(), self.camera.projection_matrix());
        let model_data = ModelMatrix::new(Mat4::from_rotation_z(self.model_angle));
        self.driver.set_frame_data(camera_data, model_data);

        self.scheduler.run_frame(&mut self.driver)
    }

    /// Returns the camera.
    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Returns the camera mutably.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Returns the current surface lifecycle state.
    #[inline]
    pub fn surface_state(&self) -> SurfaceState {
        self.scheduler.state()
    }
}
