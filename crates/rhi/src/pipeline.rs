//! Graphics pipeline management.
//!
//! This module handles VkPipeline and VkPipelineLayout creation.
//!
//! # Overview
//!
//! - [`PipelineLayout`] wraps VkPipelineLayout for descriptor set configuration
//! - [`Pipeline`] wraps VkPipeline for graphics pipeline state
//! - [`GraphicsPipelineBuilder`] provides a flexible builder for graphics pipeline creation
//!
//! The viewport and scissor are baked into the pipeline at creation time, so
//! the pipeline must be recreated whenever the swapchain extent changes. It is
//! therefore released with [`Pipeline::destroy`] as part of the surface
//! teardown, while the extent-independent [`PipelineLayout`] is long-lived and
//! cleans up on drop.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use prism_rhi::device::Device;
//! use prism_rhi::shader::{Shader, ShaderStage};
//! use prism_rhi::pipeline::{PipelineLayout, GraphicsPipelineBuilder};
//! use prism_rhi::vertex::VertexStreams;
//! use ash::vk;
//!
//! # fn example(device: &Device, render_pass: vk::RenderPass) -> Result<(), prism_rhi::RhiError> {
//! // Load shaders
//! let vertex_shader = Shader::from_spirv_file(
//!     device,
//!     Path::new("shaders/spirv/mesh.vert.spv"),
//!     ShaderStage::Vertex,
//!     "main",
//! )?;
//!
//! let fragment_shader = Shader::from_spirv_file(
//!     device,
//!     Path::new("shaders/spirv/mesh.frag.spv"),
//!     ShaderStage::Fragment,
//!     "main",
//! )?;
//!
//! // Create pipeline layout
//! let layout = PipelineLayout::new(device, &[], &[])?;
//!
//! // Build graphics pipeline
//! let pipeline = GraphicsPipelineBuilder::new()
//!     .vertex_shader(&vertex_shader)
//!     .fragment_shader(&fragment_shader)
//!     .vertex_bindings(&VertexStreams::binding_descriptions())
//!     .vertex_attributes(&VertexStreams::attribute_descriptions())
//!     .render_pass(render_pass)
//!     .extent(vk::Extent2D { width: 1280, height: 720 })
//!     .build(device, &layout)?;
//! # Ok(())
//! # }
//! ```

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::Shader;

/// Vulkan pipeline layout wrapper.
///
/// A pipeline layout describes the complete set of resources that can be
/// accessed by a pipeline. This includes descriptor set layouts and push
/// constant ranges.
///
/// # Thread Safety
///
/// The pipeline layout is immutable after creation and can be safely shared
/// between threads.
pub struct PipelineLayout {
    /// Logical device function table.
    device: ash::Device,
    /// Vulkan pipeline layout handle.
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a new pipeline layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `descriptor_set_layouts` - Slice of descriptor set layout handles
    /// * `push_constant_ranges` - Slice of push constant ranges
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline layout creation fails.
    pub fn new(
        device: &Device,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!(
            "Created pipeline layout with {} descriptor set layout(s) and {} push constant range(s)",
            descriptor_set_layouts.len(),
            push_constant_ranges.len()
        );

        Ok(Self {
            device: device.handle().clone(),
            layout,
        })
    }

    /// Returns the Vulkan pipeline layout handle.
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Vulkan graphics pipeline wrapper.
///
/// A pipeline encapsulates all the shader stages and fixed-function state
/// needed to process vertices and generate fragments.
pub struct Pipeline {
    /// Vulkan pipeline handle.
    pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Destroys the pipeline.
    ///
    /// Safe to call more than once; subsequent calls are no-ops.
    pub fn destroy(&mut self, device: &Device) {
        if self.pipeline != vk::Pipeline::null() {
            unsafe {
                device.handle().destroy_pipeline(self.pipeline, None);
            }
            self.pipeline = vk::Pipeline::null();
            info!("Graphics pipeline destroyed");
        }
    }
}

/// Primitive topology for input assembly.
///
/// Defines how vertices are assembled into primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent points.
    PointList,
    /// Independent lines.
    LineList,
    /// Independent triangles.
    #[default]
    TriangleList,
    /// Connected triangles with shared edges.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Converts to Vulkan primitive topology.
    pub fn to_vk(self) -> vk::PrimitiveTopology {
        match self {
            PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        }
    }
}

/// Face culling mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    /// Do not cull any faces.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

impl CullMode {
    /// Converts to Vulkan cull mode flags.
    pub fn to_vk(self) -> vk::CullModeFlags {
        match self {
            CullMode::None => vk::CullModeFlags::NONE,
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        }
    }
}

/// Front face winding order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrontFace {
    /// Counter-clockwise winding is front-facing.
    #[default]
    CounterClockwise,
    /// Clockwise winding is front-facing.
    Clockwise,
}

impl FrontFace {
    /// Converts to Vulkan front face.
    pub fn to_vk(self) -> vk::FrontFace {
        match self {
            FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

/// Depth comparison operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareOp {
    /// Never passes.
    Never,
    /// Passes if less than.
    #[default]
    Less,
    /// Passes if less than or equal.
    LessOrEqual,
    /// Passes if greater than.
    Greater,
    /// Always passes.
    Always,
}

impl CompareOp {
    /// Converts to Vulkan compare op.
    pub fn to_vk(self) -> vk::CompareOp {
        match self {
            CompareOp::Never => vk::CompareOp::NEVER,
            CompareOp::Less => vk::CompareOp::LESS,
            CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
            CompareOp::Greater => vk::CompareOp::GREATER,
            CompareOp::Always => vk::CompareOp::ALWAYS,
        }
    }
}

/// Builder for creating graphics pipelines.
///
/// This builder provides a flexible way to configure a graphics pipeline
/// targeting a render pass subpass. It uses sensible defaults for most
/// settings:
///
/// - Primitive topology: Triangle list
/// - Cull mode: Back-face culling
/// - Front face: Counter-clockwise
/// - Depth test: Enabled
/// - Depth write: Enabled
/// - Depth compare op: Less
/// - Multisampling: 1 sample (no MSAA)
///
/// The viewport and scissor cover the full extent given to [`extent`] and are
/// fixed pipeline state.
///
/// [`extent`]: GraphicsPipelineBuilder::extent
pub struct GraphicsPipelineBuilder<'a> {
    // Shader stages
    vertex_shader: Option<&'a Shader>,
    fragment_shader: Option<&'a Shader>,

    // Vertex input state
    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,

    // Input assembly state
    topology: PrimitiveTopology,

    // Rasterization state
    cull_mode: CullMode,
    front_face: FrontFace,

    // Depth/stencil state
    depth_test_enable: bool,
    depth_write_enable: bool,
    depth_compare_op: CompareOp,

    // Render target
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    /// Creates a new graphics pipeline builder with default settings.
    pub fn new() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            render_pass: vk::RenderPass::null(),
            extent: vk::Extent2D::default(),
        }
    }

    /// Sets the vertex shader.
    pub fn vertex_shader(mut self, shader: &'a Shader) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    /// Sets the fragment shader.
    pub fn fragment_shader(mut self, shader: &'a Shader) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    /// Sets all vertex input binding descriptions.
    pub fn vertex_bindings(mut self, bindings: &[vk::VertexInputBindingDescription]) -> Self {
        self.vertex_bindings = bindings.to_vec();
        self
    }

    /// Sets all vertex input attribute descriptions.
    pub fn vertex_attributes(mut self, attributes: &[vk::VertexInputAttributeDescription]) -> Self {
        self.vertex_attributes = attributes.to_vec();
        self
    }

    /// Sets the primitive topology.
    pub fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Sets the face culling mode.
    pub fn cull_mode(mut self, mode: CullMode) -> Self {
        self.cull_mode = mode;
        self
    }

    /// Sets the front face winding order.
    pub fn front_face(mut self, face: FrontFace) -> Self {
        self.front_face = face;
        self
    }

    /// Enables or disables depth testing.
    pub fn depth_test_enable(mut self, enable: bool) -> Self {
        self.depth_test_enable = enable;
        self
    }

    /// Enables or disables depth writing.
    pub fn depth_write_enable(mut self, enable: bool) -> Self {
        self.depth_write_enable = enable;
        self
    }

    /// Sets the depth comparison operation.
    pub fn depth_compare_op(mut self, op: CompareOp) -> Self {
        self.depth_compare_op = op;
        self
    }

    /// Sets the render pass the pipeline will be used with (subpass 0).
    pub fn render_pass(mut self, render_pass: vk::RenderPass) -> Self {
        self.render_pass = render_pass;
        self
    }

    /// Sets the fixed viewport and scissor extent.
    pub fn extent(mut self, extent: vk::Extent2D) -> Self {
        self.extent = extent;
        self
    }

    /// Builds the graphics pipeline.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `layout` - The pipeline layout
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Vertex or fragment shader is not set
    /// - No render pass is specified
    /// - The extent is zero
    /// - Pipeline creation fails
    pub fn build(self, device: &Device, layout: &PipelineLayout) -> RhiResult<Pipeline> {
        // Validate required fields
        let vertex_shader = self
            .vertex_shader
            .ok_or_else(|| RhiError::PipelineError("Vertex shader is required".to_string()))?;

        let fragment_shader = self
            .fragment_shader
            .ok_or_else(|| RhiError::PipelineError("Fragment shader is required".to_string()))?;

        if self.render_pass == vk::RenderPass::null() {
            return Err(RhiError::PipelineError(
                "A render pass is required".to_string(),
            ));
        }

        if self.extent.width == 0 || self.extent.height == 0 {
            return Err(RhiError::PipelineError(format!(
                "Pipeline extent must be non-zero, got {}x{}",
                self.extent.width, self.extent.height
            )));
        }

        // Create shader stage infos
        let shader_stages = [
            vertex_shader.stage_create_info(),
            fragment_shader.stage_create_info(),
        ];

        // Vertex input state
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);

        // Input assembly state
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology.to_vk())
            .primitive_restart_enable(false);

        // Fixed viewport and scissor covering the whole extent
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        };

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(std::slice::from_ref(&viewport))
            .scissors(std::slice::from_ref(&scissor));

        // Rasterization state
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(self.cull_mode.to_vk())
            .front_face(self.front_face.to_vk())
            .depth_bias_enable(false);

        // Multisample state
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // Depth/stencil state
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(self.depth_test_enable)
            .depth_write_enable(self.depth_write_enable)
            .depth_compare_op(self.depth_compare_op.to_vk())
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        // Color blend state, single attachment without blending
        let color_blend_attachment = vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::FALSE,
            color_write_mask: vk::ColorComponentFlags::RGBA,
            ..Default::default()
        };

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        // Create pipeline
        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .layout(layout.handle())
            .render_pass(self.render_pass)
            .subpass(0);

        let pipeline = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, result)| result)?[0]
        };

        info!(
            "Graphics pipeline created for extent {}x{}",
            self.extent.width, self.extent.height
        );

        Ok(Pipeline { pipeline })
    }
}

impl Default for GraphicsPipelineBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_topology_to_vk() {
        assert_eq!(
            PrimitiveTopology::PointList.to_vk(),
            vk::PrimitiveTopology::POINT_LIST
        );
        assert_eq!(
            PrimitiveTopology::LineList.to_vk(),
            vk::PrimitiveTopology::LINE_LIST
        );
        assert_eq!(
            PrimitiveTopology::TriangleList.to_vk(),
            vk::PrimitiveTopology::TRIANGLE_LIST
        );
        assert_eq!(
            PrimitiveTopology::TriangleStrip.to_vk(),
            vk::PrimitiveTopology::TRIANGLE_STRIP
        );
    }

    #[test]
    fn test_cull_mode_to_vk() {
        assert_eq!(CullMode::None.to_vk(), vk::CullModeFlags::NONE);
        assert_eq!(CullMode::Front.to_vk(), vk::CullModeFlags::FRONT);
        assert_eq!(CullMode::Back.to_vk(), vk::CullModeFlags::BACK);
    }

    #[test]
    fn test_front_face_to_vk() {
        assert_eq!(
            FrontFace::CounterClockwise.to_vk(),
            vk::FrontFace::COUNTER_CLOCKWISE
        );
        assert_eq!(FrontFace::Clockwise.to_vk(), vk::FrontFace::CLOCKWISE);
    }

    #[test]
    fn test_compare_op_to_vk() {
        assert_eq!(CompareOp::Never.to_vk(), vk::CompareOp::NEVER);
        assert_eq!(CompareOp::Less.to_vk(), vk::CompareOp::LESS);
        assert_eq!(CompareOp::LessOrEqual.to_vk(), vk::CompareOp::LESS_OR_EQUAL);
        assert_eq!(CompareOp::Greater.to_vk(), vk::CompareOp::GREATER);
        assert_eq!(CompareOp::Always.to_vk(), vk::CompareOp::ALWAYS);
    }

    #[test]
    fn test_graphics_pipeline_builder_default() {
        let builder = GraphicsPipelineBuilder::new();
        assert!(builder.vertex_shader.is_none());
        assert!(builder.fragment_shader.is_none());
        assert!(builder.vertex_bindings.is_empty());
        assert!(builder.vertex_attributes.is_empty());
        assert_eq!(builder.topology, PrimitiveTopology::TriangleList);
        assert_eq!(builder.cull_mode, CullMode::Back);
        assert_eq!(builder.front_face, FrontFace::CounterClockwise);
        assert!(builder.depth_test_enable);
        assert!(builder.depth_write_enable);
        assert_eq!(builder.depth_compare_op, CompareOp::Less);
        assert_eq!(builder.render_pass, vk::RenderPass::null());
    }

    #[test]
    fn test_graphics_pipeline_builder_topology() {
        let builder = GraphicsPipelineBuilder::new().topology(PrimitiveTopology::LineList);
        assert_eq!(builder.topology, PrimitiveTopology::LineList);
    }

    #[test]
    fn test_graphics_pipeline_builder_cull_mode() {
        let builder = GraphicsPipelineBuilder::new().cull_mode(CullMode::None);
        assert_eq!(builder.cull_mode, CullMode::None);
    }

    #[test]
    fn test_graphics_pipeline_builder_depth_settings() {
        let builder = GraphicsPipelineBuilder::new()
            .depth_test_enable(false)
            .depth_write_enable(false)
            .depth_compare_op(CompareOp::Always);
        assert!(!builder.depth_test_enable);
        assert!(!builder.depth_write_enable);
        assert_eq!(builder.depth_compare_op, CompareOp::Always);
    }

    #[test]
    fn test_graphics_pipeline_builder_extent() {
        let builder = GraphicsPipelineBuilder::new().extent(vk::Extent2D {
            width: 800,
            height: 600,
        });
        assert_eq!(builder.extent.width, 800);
        assert_eq!(builder.extent.height, 600);
    }
}
