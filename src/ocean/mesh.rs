//! Static ocean grid mesh displaced on the GPU.

use bytemuck::{Pod, Zeroable};

/// Vertex data for the ocean mesh (position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Flat XZ grid centered on the origin. The topology never changes;
/// vertices are displaced in the vertex shader by sampling the
/// displacement map at the vertex UV, so the vertex count is independent
/// of the simulation resolution.
pub struct OceanGrid {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl OceanGrid {
    /// Create a grid with `cells` quads per side spanning `extent_m`
    /// meters.
    pub fn new(cells: usize, extent_m: f32) -> Self {
        let spacing = extent_m / cells as f32;
        let half = extent_m / 2.0;

        let mut vertices = Vec::with_capacity((cells + 1) * (cells + 1));
        for z in 0..=cells {
            for x in 0..=cells {
                vertices.push(Vertex {
                    position: [x as f32 * spacing - half, 0.0, z as f32 * spacing - half],
                    uv: [x as f32 / cells as f32, z as f32 / cells as f32],
                });
            }
        }

        // Triangle indices (counter-clockwise winding)
        let mut indices = Vec::with_capacity(cells * cells * 6);
        for z in 0..cells {
            for x in 0..cells {
                let top_left = (z * (cells + 1) + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * (cells + 1) + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let grid = OceanGrid::new(64, 400.0);
        assert_eq!(grid.vertices.len(), 65 * 65);
        assert_eq!(grid.indices.len(), 64 * 64 * 6);
    }

    #[test]
    fn test_grid_uv_and_extent() {
        let grid = OceanGrid::new(8, 100.0);

        let first = &grid.vertices[0];
        let last = grid.vertices.last().unwrap();
        assert_eq!(first.position[0], -50.0);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position[0], 50.0);
        assert_eq!(last.uv, [1.0, 1.0]);

        // All indices address existing vertices
        for &i in &grid.indices {
            assert!((i as usize) < grid.vertices.len());
        }
    }
}
