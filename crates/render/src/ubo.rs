//! Uniform buffer layouts shared with the shaders.
//!
//! Both blocks use std140 layout. A `mat4` is 16-byte aligned with no tail
//! padding, so the Rust `#[repr(C)]` layout of consecutive [`glam::Mat4`]
//! fields matches the GLSL side exactly; the tests below pin that down.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Descriptor binding index of the camera matrices block.
pub const CAMERA_BINDING: u32 = 0;
/// Descriptor binding index of the model matrix block.
pub const MODEL_BINDING: u32 = 1;

/// Per-frame camera matrices, bound at [`CAMERA_BINDING`].
///
/// Must match the `CameraMatrices` block in `shaders/mesh.vert`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CameraMatrices {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform, already Y-flipped for Vulkan.
    pub projection: Mat4,
}

impl CameraMatrices {
    /// Size of the uniform block in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Creates a camera block from view and projection matrices.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }
}

/// Per-frame model transform, bound at [`MODEL_BINDING`].
///
/// Must match the `ModelMatrix` block in `shaders/mesh.vert`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ModelMatrix {
    /// Object-to-world transform.
    pub model: Mat4,
}

impl ModelMatrix {
    /// Size of the uniform block in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Creates a model block from an object-to-world matrix.
    pub fn new(model: Mat4) -> Self {
        Self { model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_camera_matrices_layout_matches_std140() {
        assert_eq!(size_of::<CameraMatrices>(), 128);
        assert_eq!(offset_of!(CameraMatrices, view), 0);
        assert_eq!(offset_of!(CameraMatrices, projection), 64);
        assert_eq!(CameraMatrices::SIZE, 128);
    }

    #[test]
    fn test_model_matrix_layout_matches_std140() {
        assert_eq!(size_of::<ModelMatrix>(), 64);
        assert_eq!(offset_of!(ModelMatrix, model), 0);
        assert_eq!(ModelMatrix::SIZE, 64);
    }

    #[test]
    fn test_blocks_cast_to_bytes() {
        let camera = CameraMatrices::new(Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(bytemuck::bytes_of(&camera).len(), 128);

        let model = ModelMatrix::new(Mat4::IDENTITY);
        assert_eq!(bytemuck::bytes_of(&model).len(), 64);
    }

    #[test]
    fn test_default_blocks_are_identity() {
        let camera = CameraMatrices::default();
        assert_eq!(camera.view, Mat4::IDENTITY);
        assert_eq!(camera.projection, Mat4::IDENTITY);
        assert_eq!(ModelMatrix::default().model, Mat4::IDENTITY);
    }

    #[test]
    fn test_bindings_are_distinct() {
        assert_ne!(CAMERA_BINDING, MODEL_BINDING);
    }
}
