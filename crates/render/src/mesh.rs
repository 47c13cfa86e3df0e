//! Demo mesh data and its GPU buffers.
//!
//! The demo scene draws a single textured-quad mesh, stored as three
//! separate attribute streams plus a 16-bit index buffer. The streams map
//! one-to-one onto the vertex bindings declared in
//! [`prism_rhi::vertex::VertexStreams`].

use ash::vk;
use glam::{Vec2, Vec3};
use tracing::info;

use prism_rhi::buffer::{Buffer, BufferUsage};
use prism_rhi::device::Device;
use prism_rhi::vertex::VertexStreams;

use crate::error::{RenderError, RenderResult};

/// Index list for the demo quad, two counter-clockwise triangles.
pub const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

/// Vertex streams for the demo quad.
///
/// The quad stands on a corner, a diamond centered at the origin in the
/// XY plane, so the rotation animation reads clearly.
pub fn quad() -> VertexStreams {
    VertexStreams {
        positions: vec![
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::new(0.0, -0.5, 0.0),
        ],
        colors: vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ],
        uvs: vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ],
    }
}

/// GPU buffers for one indexed mesh.
///
/// Holds one vertex buffer per attribute stream plus the index buffer.
/// The buffers are device resources that outlive the rebuildable surface
/// context; the pre-recorded command buffers reference them by handle, so
/// they must stay alive until the device idles at shutdown.
pub struct MeshBuffers {
    positions: Buffer,
    colors: Buffer,
    uvs: Buffer,
    indices: Buffer,
    index_count: u32,
}

impl MeshBuffers {
    /// Uploads vertex streams and indices into freshly created buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if the streams have mismatched lengths or any
    /// buffer creation fails.
    pub fn upload(device: &Device, streams: &VertexStreams, indices: &[u16]) -> RenderResult<Self> {
        if !streams.is_consistent() {
            return Err(RenderError::Internal(format!(
                "mismatched vertex streams: {} positions, {} colors, {} uvs",
                streams.positions.len(),
                streams.colors.len(),
                streams.uvs.len()
            )));
        }

        let positions = Buffer::new_with_data(
            device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&streams.positions),
        )?;
        let colors = Buffer::new_with_data(
            device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&streams.colors),
        )?;
        let uvs = Buffer::new_with_data(
            device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&streams.uvs),
        )?;
        let index_buffer =
            Buffer::new_with_data(device, BufferUsage::Index, bytemuck::cast_slice(indices))?;

        info!(
            "Mesh uploaded: {} vertices, {} indices",
            streams.len(),
            indices.len()
        );

        Ok(Self {
            positions,
            colors,
            uvs,
            indices: index_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Vertex buffer handles in binding order (position, color, uv).
    #[inline]
    pub fn vertex_buffers(&self) -> [vk::Buffer; 3] {
        [
            self.positions.handle(),
            self.colors.handle(),
            self.uvs.handle(),
        ]
    }

    /// Returns the index buffer handle.
    #[inline]
    pub fn index_buffer(&self) -> vk::Buffer {
        self.indices.handle()
    }

    /// Returns the number of indices to draw.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Destroys all buffers. Safe to call more than once.
    pub fn destroy(&mut self, device: &Device) {
        self.positions.destroy(device);
        self.colors.destroy(device);
        self.uvs.destroy(device);
        self.indices.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_streams_are_consistent() {
        let streams = quad();
        assert_eq!(streams.len(), 4);
        assert!(streams.is_consistent());
    }

    #[test]
    fn test_quad_indices_in_bounds() {
        let vertex_count = quad().len() as u16;
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn test_quad_triangles_wind_counter_clockwise() {
        // Both triangles must wind CCW in object space; the projection's
        // Y flip turns that into the clockwise front face the pipeline
        // culls against.
        let streams = quad();
        for triangle in QUAD_INDICES.chunks_exact(3) {
            let a = streams.positions[triangle[0] as usize];
            let b = streams.positions[triangle[1] as usize];
            let c = streams.positions[triangle[2] as usize];
            let signed_area = (b - a).cross(c - a).z;
            assert!(signed_area > 0.0, "triangle {:?} winds clockwise", triangle);
        }
    }

    #[test]
    fn test_quad_uvs_normalized() {
        let streams = quad();
        assert!(
            streams
                .uvs
                .iter()
                .all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y))
        );
    }
}
