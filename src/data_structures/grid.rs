//! Reference grid geometry.
//!
//! The grid is a static set of line-list vertices on the ground plane plus
//! one vertical axis line, generated once and uploaded to a vertex buffer.
//! It is drawn non-indexed with its own translucent pipeline.

use wgpu::util::DeviceExt;

use crate::data_structures::model::Vertex;

/// Grid line generation and appearance parameters.
#[derive(Clone, Copy, Debug)]
pub struct GridConfig {
    /// Number of lines on each side of the origin, per axis.
    pub half_lines: i32,
    /// Distance between neighbouring lines.
    pub spacing: f32,
    pub color: [f32; 4],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            half_lines: 100,
            spacing: 1.0,
            // Semi-transparent gray
            color: [0.5, 0.5, 0.5, 0.5],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
}

impl Vertex for GridVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Pairs of line endpoints: for every step along one axis, one line
/// parallel to the x axis and one parallel to the z axis, plus a single
/// vertical line through the origin.
pub fn generate_grid_vertices(half_lines: i32, spacing: f32) -> Vec<GridVertex> {
    let extent = half_lines as f32 * spacing;
    let mut vertices = Vec::with_capacity(((2 * half_lines + 1) * 4 + 2) as usize);

    for i in -half_lines..=half_lines {
        let a = i as f32 * spacing;

        vertices.push(GridVertex { position: [-extent, 0.0, a] });
        vertices.push(GridVertex { position: [extent, 0.0, a] });

        vertices.push(GridVertex { position: [a, 0.0, -extent] });
        vertices.push(GridVertex { position: [a, 0.0, extent] });
    }

    vertices.push(GridVertex { position: [0.0, extent, 0.0] });
    vertices.push(GridVertex { position: [0.0, -extent, 0.0] });

    vertices
}

/// The grid's GPU residency: a static vertex buffer and its line count.
pub struct Grid {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl Grid {
    pub fn new(device: &wgpu::Device, config: &GridConfig) -> Self {
        let vertices = generate_grid_vertices(config.half_lines, config.spacing);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_count_matches_line_layout() {
        for half_lines in [1, 10, 100] {
            let vertices = generate_grid_vertices(half_lines, 1.0);
            assert_eq!(vertices.len(), ((2 * half_lines + 1) * 4 + 2) as usize);
            // Line lists need an even number of endpoints.
            assert_eq!(vertices.len() % 2, 0);
        }
    }

    #[test]
    fn ground_lines_stay_on_the_ground() {
        let vertices = generate_grid_vertices(5, 0.5);
        // Everything except the vertical axis line lies in the y = 0 plane.
        let (ground, axis) = vertices.split_at(vertices.len() - 2);
        for v in ground {
            assert_eq!(v.position[1], 0.0);
        }
        assert_eq!(axis[0].position, [0.0, 2.5, 0.0]);
        assert_eq!(axis[1].position, [0.0, -2.5, 0.0]);
    }

    #[test]
    fn spacing_scales_the_extent() {
        let vertices = generate_grid_vertices(4, 2.0);
        assert_eq!(vertices[0].position, [-8.0, 0.0, -8.0]);
        assert_eq!(vertices[1].position, [8.0, 0.0, -8.0]);
    }
}
