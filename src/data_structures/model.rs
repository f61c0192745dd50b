//! GPU-resident mesh and model types.
//!
//! A [`Mesh`] is one indexed triangle group living in GPU buffers; a
//! [`Model`] is the ordered collection of meshes produced by flattening
//! one imported scene file. Vertex and index data is uploaded once at
//! construction and only the buffers plus element counts are retained.

use wgpu::util::DeviceExt;

/// Anything that can describe its vertex buffer layout to a pipeline.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One drawable triangle group, uploaded to the GPU at construction.
///
/// The vertex and index buffers are exclusively owned by the mesh and are
/// released when it is dropped. A mesh with `num_elements == 0` is inert:
/// drawing it is a no-op.
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_vertices: u32,
    pub num_elements: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[ModelVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_vertices: vertices.len() as u32,
            num_elements: indices.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_elements == 0
    }
}

/// One loaded scene file: an ordered sequence of meshes in flattening
/// order. An empty model is legal and draws nothing.
pub struct Model {
    pub path: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(path: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            path: path.to_string(),
            meshes,
        }
    }

    pub fn empty(path: &str) -> Self {
        Self::new(path, Vec::new())
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn vertex_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.num_vertices).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Log how much geometry this model carries and its approximate GPU
    /// footprint. Advisory only.
    pub fn log_summary(&self) {
        let vertices = self.vertex_count();
        let bytes = vertices as usize * std::mem::size_of::<ModelVertex>();
        log::info!(
            "Loaded model {} with {} meshes and {} vertices ({:.2} MiB)",
            self.path,
            self.mesh_count(),
            vertices,
            bytes as f32 / (1024.0 * 1024.0),
        );
    }
}

pub trait DrawModel {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_model(&mut self, model: &Model);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        if mesh.is_empty() {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(&mut self, model: &Model) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let desc = ModelVertex::desc();
        assert_eq!(
            desc.array_stride,
            std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress
        );
        assert_eq!(desc.attributes.len(), 2);
        assert_eq!(desc.attributes[0].offset, 0);
        assert_eq!(desc.attributes[0].shader_location, 0);
        // The normal channel starts right after the three position floats.
        assert_eq!(desc.attributes[1].offset, 12);
        assert_eq!(desc.attributes[1].shader_location, 1);
    }
}
