//! The rebuildable presentation surface context.
//!
//! [`SurfaceContext`] owns every resource whose lifetime is tied to the
//! window's drawable size: the swapchain and its views, the depth target,
//! the render pass, one framebuffer and one pre-recorded command buffer per
//! image, the extent-baked pipeline, and the per-frame slots. Whenever the
//! surface is invalidated the whole bundle is torn down and built again;
//! nothing in here survives a rebuild.
//!
//! Long-lived objects (device, command pool, layouts, mesh buffers) are
//! borrowed during build and teardown but owned elsewhere.

use std::path::Path;

use ash::vk;
use tracing::info;

use prism_rhi::command::{CommandBuffer, CommandPool};
use prism_rhi::descriptor::{DescriptorPool, DescriptorSetLayout};
use prism_rhi::device::Device;
use prism_rhi::framebuffer::Framebuffer;
use prism_rhi::instance::Instance;
use prism_rhi::pipeline::{FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use prism_rhi::render_pass::RenderPass;
use prism_rhi::shader::{Shader, ShaderStage};
use prism_rhi::swapchain::Swapchain;
use prism_rhi::vertex::VertexStreams;

use crate::depth::{DepthTarget, DEPTH_FORMAT};
use crate::error::RenderResult;
use crate::frame::FrameSlot;
use crate::mesh::MeshBuffers;

/// SPIR-V path of the mesh vertex shader.
const VERT_SHADER_PATH: &str = "shaders/spirv/mesh.vert.spv";
/// SPIR-V path of the mesh fragment shader.
const FRAG_SHADER_PATH: &str = "shaders/spirv/mesh.frag.spv";

/// Clear values for the color and depth attachments, in attachment order.
const CLEAR_VALUES: [vk::ClearValue; 2] = [
    vk::ClearValue {
        color: vk::ClearColorValue {
            float32: [0.0, 0.0, 0.0, 1.0],
        },
    },
    vk::ClearValue {
        depth_stencil: vk::ClearDepthStencilValue {
            depth: 1.0,
            stencil: 0,
        },
    },
];

/// Every size-dependent rendering resource, built and destroyed as a unit.
pub struct SurfaceContext {
    swapchain: Swapchain,
    depth: DepthTarget,
    render_pass: RenderPass,
    framebuffers: Vec<Framebuffer>,
    pipeline: Pipeline,
    descriptor_pool: DescriptorPool,
    slots: Vec<FrameSlot>,
}

impl SurfaceContext {
    /// Builds the full surface context for the given drawable size.
    ///
    /// The swapchain decides the actual extent and image count; everything
    /// else follows it. Command buffer `i` is recorded against framebuffer
    /// `i` with slot `i`'s descriptor set, so a frame's uniform data flows
    /// through whichever slot acquired image `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if the drawable size is unusable or any resource
    /// creation fails.
    pub fn build(
        instance: &Instance,
        device: &Device,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        command_pool: &CommandPool,
        set_layout: &DescriptorSetLayout,
        pipeline_layout: &PipelineLayout,
        mesh: &MeshBuffers,
    ) -> RenderResult<Self> {
        let swapchain = Swapchain::new(instance, device, surface, width, height)?;
        let extent = swapchain.extent();
        let frame_count = swapchain.image_count();

        let depth = DepthTarget::new(device, extent.width, extent.height)?;

        let render_pass = RenderPass::new(device, swapchain.format(), DEPTH_FORMAT)?;

        let mut framebuffers = Vec::with_capacity(frame_count as usize);
        for &color_view in swapchain.image_views() {
            framebuffers.push(Framebuffer::new(
                device,
                render_pass.handle(),
                &[color_view, depth.image_view()],
                extent,
            )?);
        }

        let pipeline = build_mesh_pipeline(device, render_pass.handle(), extent, pipeline_layout)?;

        // One set per slot, each holding the two uniform blocks
        let pool_sizes = [vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(2 * frame_count)];
        let descriptor_pool = DescriptorPool::new(device, frame_count, &pool_sizes)?;

        let layouts = vec![set_layout.handle(); frame_count as usize];
        let descriptor_sets = descriptor_pool.allocate(device, &layouts)?;

        let command_buffers = command_pool.allocate_command_buffers(frame_count)?;

        let mut slots = Vec::with_capacity(frame_count as usize);
        for (&command_buffer, &descriptor_set) in command_buffers.iter().zip(&descriptor_sets) {
            slots.push(FrameSlot::new(device, command_buffer, descriptor_set)?);
        }

        let context = Self {
            swapchain,
            depth,
            render_pass,
            framebuffers,
            pipeline,
            descriptor_pool,
            slots,
        };
        context.record_command_buffers(device, pipeline_layout, mesh)?;

        info!(
            "Surface context built: {}x{}, {} frame slot(s)",
            extent.width, extent.height, frame_count
        );

        Ok(context)
    }

    /// Records every slot's command buffer against its framebuffer.
    fn record_command_buffers(
        &self,
        device: &Device,
        pipeline_layout: &PipelineLayout,
        mesh: &MeshBuffers,
    ) -> RenderResult<()> {
        let extent = self.swapchain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        for (slot, framebuffer) in self.slots.iter().zip(&self.framebuffers) {
            let cmd = CommandBuffer::from_handle(device, slot.command_buffer());
            cmd.begin_reusable()?;

            let begin_info = vk::RenderPassBeginInfo::default()
                .render_pass(self.render_pass.handle())
                .framebuffer(framebuffer.handle())
                .render_area(render_area)
                .clear_values(&CLEAR_VALUES);
            cmd.begin_render_pass(&begin_info);

            cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
            cmd.bind_vertex_buffers(0, &mesh.vertex_buffers(), &[0, 0, 0]);
            cmd.bind_index_buffer(mesh.index_buffer(), 0, vk::IndexType::UINT16);
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                pipeline_layout.handle(),
                0,
                &[slot.descriptor_set()],
            );
            cmd.draw_indexed(mesh.index_count(), 1, 0, 0, 0);

            cmd.end_render_pass();
            cmd.end()?;
        }

        Ok(())
    }

    /// Returns the number of frame slots (equal to the swapchain image
    /// count).
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the surface extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain.
    #[inline]
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Returns the frame slot at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// Tears the whole context down.
    ///
    /// The caller must wait for the device to idle first; in-flight GPU
    /// work may otherwise still reference these resources. Safe to call
    /// more than once.
    pub fn destroy(&mut self, device: &Device, command_pool: &CommandPool) {
        self.pipeline.destroy(device);
        self.render_pass.destroy(device);

        for framebuffer in &mut self.framebuffers {
            framebuffer.destroy(device);
        }
        self.framebuffers.clear();

        self.depth.destroy(device);
        self.swapchain.destroy(device);

        let command_buffers: Vec<vk::CommandBuffer> =
            self.slots.iter().map(|slot| slot.command_buffer()).collect();
        command_pool.free_command_buffers(&command_buffers);

        for slot in &mut self.slots {
            slot.destroy(device);
        }
        self.slots.clear();

        self.descriptor_pool.destroy(device);
    }
}

/// Loads the mesh shaders, builds the pipeline, and releases the modules.
///
/// The quad's triangles wind counter-clockwise in object space; the
/// projection's Y flip makes them clockwise in framebuffer space, so the
/// pipeline keeps back-face culling with a clockwise front face.
fn build_mesh_pipeline(
    device: &Device,
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
    pipeline_layout: &PipelineLayout,
) -> RenderResult<Pipeline> {
    let mut vertex_shader = Shader::from_spirv_file(
        device,
        Path::new(VERT_SHADER_PATH),
        ShaderStage::Vertex,
        "main",
    )?;

    let mut fragment_shader = match Shader::from_spirv_file(
        device,
        Path::new(FRAG_SHADER_PATH),
        ShaderStage::Fragment,
        "main",
    ) {
        Ok(shader) => shader,
        Err(e) => {
            vertex_shader.destroy(device);
            return Err(e.into());
        }
    };

    let result = GraphicsPipelineBuilder::new()
        .vertex_shader(&vertex_shader)
        .fragment_shader(&fragment_shader)
        .vertex_bindings(&VertexStreams::binding_descriptions())
        .vertex_attributes(&VertexStreams::attribute_descriptions())
        .front_face(FrontFace::Clockwise)
        .render_pass(render_pass)
        .extent(extent)
        .build(device, pipeline_layout);

    // Modules are only needed while the pipeline is created
    vertex_shader.destroy(device);
    fragment_shader.destroy(device);

    Ok(result?)
}
