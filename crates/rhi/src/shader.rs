//! Shader module management.
//!
//! This module handles SPIR-V loading and VkShaderModule creation.
//! It supports loading shaders from files or byte arrays and provides
//! the necessary Vulkan structures for pipeline creation.
//!
//! # Overview
//!
//! - [`ShaderStage`] defines the type of shader (vertex or fragment)
//! - [`Shader`] wraps VkShaderModule with stage and entry point information
//!
//! Shader modules are only needed while a pipeline is being created; callers
//! destroy them with [`Shader::destroy`] once the pipeline exists.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use prism_rhi::device::Device;
//! use prism_rhi::shader::{Shader, ShaderStage};
//!
//! # fn example(device: &Device) -> Result<(), prism_rhi::RhiError> {
//! // Load vertex shader from SPIR-V file
//! let mut vertex_shader = Shader::from_spirv_file(
//!     device,
//!     Path::new("shaders/spirv/mesh.vert.spv"),
//!     ShaderStage::Vertex,
//!     "main",
//! )?;
//!
//! // Get pipeline shader stage create info for pipeline creation
//! let _vertex_stage_info = vertex_shader.stage_create_info();
//!
//! // ... build the pipeline, then release the module ...
//! vertex_shader.destroy(device);
//! # Ok(())
//! # }
//! ```

use std::ffi::CString;
use std::path::Path;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Shader stage type.
///
/// Defines which stage of the graphics pipeline the shader will be used in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader stage - processes each vertex
    Vertex,
    /// Fragment (pixel) shader stage - processes each fragment
    Fragment,
}

impl ShaderStage {
    /// Converts the shader stage to Vulkan shader stage flags.
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    /// Returns a human-readable name for the shader stage.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Vulkan shader module wrapper.
///
/// This struct manages the lifecycle of a VkShaderModule and provides
/// the necessary information for creating graphics pipelines.
pub struct Shader {
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
    /// Shader stage type.
    stage: ShaderStage,
    /// Entry point function name.
    entry_point: CString,
}

impl Shader {
    /// Creates a shader module from a SPIR-V file.
    ///
    /// This method reads the SPIR-V binary from the specified file path
    /// and creates a Vulkan shader module.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `path` - Path to the SPIR-V file
    /// * `stage` - The shader stage (vertex or fragment)
    /// * `entry_point` - The name of the entry point function (typically "main")
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The SPIR-V data is invalid
    /// - Shader module creation fails
    pub fn from_spirv_file(
        device: &Device,
        path: &Path,
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        debug!("Loading {} shader from {:?}", stage, path);

        let bytes = std::fs::read(path).map_err(|e| {
            RhiError::ShaderError(format!("Failed to read shader file {:?}: {}", path, e))
        })?;

        Self::from_spirv_bytes(device, &bytes, stage, entry_point)
    }

    /// Creates a shader module from SPIR-V bytes.
    ///
    /// The bytes must be valid SPIR-V code and properly aligned (4-byte
    /// alignment).
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bytes` - The SPIR-V binary data
    /// * `stage` - The shader stage (vertex or fragment)
    /// * `entry_point` - The name of the entry point function (typically "main")
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The byte length is not a multiple of 4 (SPIR-V alignment requirement)
    /// - The entry point name contains null bytes
    /// - Shader module creation fails
    pub fn from_spirv_bytes(
        device: &Device,
        bytes: &[u8],
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        // Validate SPIR-V alignment
        if !bytes.len().is_multiple_of(4) {
            return Err(RhiError::ShaderError(format!(
                "SPIR-V code must be 4-byte aligned, got {} bytes",
                bytes.len()
            )));
        }

        // Convert bytes to u32 code words
        let code: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        // Create shader module
        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        // Create entry point CString
        let entry_point_cstring = CString::new(entry_point)
            .map_err(|e| RhiError::ShaderError(format!("Invalid entry point name: {}", e)))?;

        info!(
            "Created {} shader module with entry point '{}'",
            stage, entry_point
        );

        Ok(Self {
            module,
            stage,
            entry_point: entry_point_cstring,
        })
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Returns the shader stage.
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Returns the entry point function name as a C string reference.
    #[inline]
    pub fn entry_point(&self) -> &std::ffi::CStr {
        &self.entry_point
    }

    /// Creates a pipeline shader stage create info structure.
    ///
    /// This structure is used when creating graphics pipelines.
    /// The returned structure borrows from this shader and must not outlive it.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(&self.entry_point)
    }

    /// Destroys the shader module.
    ///
    /// Safe to call more than once; subsequent calls are no-ops.
    pub fn destroy(&mut self, device: &Device) {
        if self.module != vk::ShaderModule::null() {
            unsafe {
                device.handle().destroy_shader_module(self.module, None);
            }
            self.module = vk::ShaderModule::null();
            debug!("Destroyed {} shader module", self.stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_stage_to_vk_stage() {
        assert_eq!(
            ShaderStage::Vertex.to_vk_stage(),
            vk::ShaderStageFlags::VERTEX
        );
        assert_eq!(
            ShaderStage::Fragment.to_vk_stage(),
            vk::ShaderStageFlags::FRAGMENT
        );
    }

    #[test]
    fn test_shader_stage_name() {
        assert_eq!(ShaderStage::Vertex.name(), "vertex");
        assert_eq!(ShaderStage::Fragment.name(), "fragment");
    }

    #[test]
    fn test_shader_stage_display() {
        assert_eq!(format!("{}", ShaderStage::Vertex), "vertex");
        assert_eq!(format!("{}", ShaderStage::Fragment), "fragment");
    }

    #[test]
    fn test_shader_stage_equality() {
        assert_eq!(ShaderStage::Vertex, ShaderStage::Vertex);
        assert_ne!(ShaderStage::Vertex, ShaderStage::Fragment);
    }
}
