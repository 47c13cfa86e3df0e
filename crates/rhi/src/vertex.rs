//! Vertex data structures and input descriptions.
//!
//! Meshes keep their attributes in separate tightly packed streams rather
//! than one interleaved struct: positions, colors, and texture coordinates
//! each live in their own vertex buffer with their own binding. The layout
//! descriptions here must match the bind order used at draw time.

use ash::vk;
use glam::{Vec2, Vec3};

/// Binding index of the position stream.
pub const POSITION_BINDING: u32 = 0;
/// Binding index of the color stream.
pub const COLOR_BINDING: u32 = 1;
/// Binding index of the texture coordinate stream.
pub const UV_BINDING: u32 = 2;

/// Per-attribute vertex streams for a mesh.
///
/// All three streams must have the same length; element `i` of each stream
/// together forms vertex `i`.
///
/// # Shader Locations
///
/// - location 0: position (vec3), binding 0
/// - location 1: color (vec3), binding 1
/// - location 2: tex_coord (vec2), binding 2
#[derive(Clone, Debug, Default)]
pub struct VertexStreams {
    /// 3D positions in object space.
    pub positions: Vec<Vec3>,
    /// RGB vertex colors.
    pub colors: Vec<Vec3>,
    /// Texture coordinates (UV).
    pub uvs: Vec<Vec2>,
}

impl VertexStreams {
    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the streams hold no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns true if all three streams have the same length.
    pub fn is_consistent(&self) -> bool {
        self.positions.len() == self.colors.len() && self.positions.len() == self.uvs.len()
    }

    /// Get the vertex input binding descriptions, one per stream.
    pub fn binding_descriptions() -> [vk::VertexInputBindingDescription; 3] {
        [
            vk::VertexInputBindingDescription {
                binding: POSITION_BINDING,
                stride: std::mem::size_of::<Vec3>() as u32,
                input_rate: vk::VertexInputRate::VERTEX,
            },
            vk::VertexInputBindingDescription {
                binding: COLOR_BINDING,
                stride: std::mem::size_of::<Vec3>() as u32,
                input_rate: vk::VertexInputRate::VERTEX,
            },
            vk::VertexInputBindingDescription {
                binding: UV_BINDING,
                stride: std::mem::size_of::<Vec2>() as u32,
                input_rate: vk::VertexInputRate::VERTEX,
            },
        ]
    }

    /// Get the vertex attribute descriptions.
    ///
    /// Each attribute starts at offset 0 within its own stream.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: POSITION_BINDING,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // Color at location 1
            vk::VertexInputAttributeDescription {
                binding: COLOR_BINDING,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // TexCoord at location 2
            vk::VertexInputAttributeDescription {
                binding: UV_BINDING,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_streams() -> VertexStreams {
        VertexStreams {
            positions: vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
            ],
            colors: vec![Vec3::X, Vec3::Y, Vec3::Z],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::ONE],
        }
    }

    #[test]
    fn test_stream_lengths() {
        let streams = sample_streams();
        assert_eq!(streams.len(), 3);
        assert!(!streams.is_empty());
        assert!(streams.is_consistent());
    }

    #[test]
    fn test_inconsistent_streams_detected() {
        let mut streams = sample_streams();
        streams.uvs.pop();
        assert!(!streams.is_consistent());
    }

    #[test]
    fn test_binding_descriptions() {
        let bindings = VertexStreams::binding_descriptions();
        assert_eq!(bindings.len(), 3);

        // Position stream
        assert_eq!(bindings[0].binding, POSITION_BINDING);
        assert_eq!(bindings[0].stride, 12);
        assert_eq!(bindings[0].input_rate, vk::VertexInputRate::VERTEX);

        // Color stream
        assert_eq!(bindings[1].binding, COLOR_BINDING);
        assert_eq!(bindings[1].stride, 12);
        assert_eq!(bindings[1].input_rate, vk::VertexInputRate::VERTEX);

        // UV stream
        assert_eq!(bindings[2].binding, UV_BINDING);
        assert_eq!(bindings[2].stride, 8);
        assert_eq!(bindings[2].input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_attribute_descriptions() {
        let attrs = VertexStreams::attribute_descriptions();
        assert_eq!(attrs.len(), 3);

        // Position attribute (location 0)
        assert_eq!(attrs[0].binding, POSITION_BINDING);
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);

        // Color attribute (location 1)
        assert_eq!(attrs[1].binding, COLOR_BINDING);
        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[1].offset, 0);

        // TexCoord attribute (location 2)
        assert_eq!(attrs[2].binding, UV_BINDING);
        assert_eq!(attrs[2].location, 2);
        assert_eq!(attrs[2].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[2].offset, 0);
    }

    #[test]
    fn test_streams_cast_to_bytes() {
        let streams = sample_streams();

        let position_bytes: &[u8] = bytemuck::cast_slice(&streams.positions);
        assert_eq!(position_bytes.len(), streams.len() * 12);

        let uv_bytes: &[u8] = bytemuck::cast_slice(&streams.uvs);
        assert_eq!(uv_bytes.len(), streams.len() * 8);
    }
}
