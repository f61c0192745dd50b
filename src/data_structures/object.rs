//! Scene objects: a loaded model paired with a time-driven world
//! transform and a flat base color.
//!
//! The per-object transform and color live in a small per-instance vertex
//! buffer (one instance per object) that is rewritten every frame before
//! the object is drawn.

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::data_structures::model::{Model, Vertex};

/// Computes an object's world matrix for a given elapsed time in seconds.
pub type TransformFn = Box<dyn Fn(f32) -> Matrix4<f32>>;

/// The raw per-object data as stored on the GPU: the world matrix as four
/// vec4 columns plus the base color.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectRaw {
    model: [[f32; 4]; 4],
    color: [f32; 3],
    _padding: f32,
}

impl ObjectRaw {
    pub fn new(model: Matrix4<f32>, color: [f32; 3]) -> Self {
        Self {
            model: model.into(),
            color,
            _padding: 0.0,
        }
    }
}

impl Vertex for ObjectRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ObjectRaw>() as wgpu::BufferAddress,
            // Advances once per instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 occupies four vec4 slots.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One entry of the per-frame draw list: the model, how to place it at a
/// given time, and its flat base color.
pub struct SceneObject {
    pub model: Model,
    pub color: [f32; 3],
    transform: TransformFn,
    buffer: wgpu::Buffer,
}

impl SceneObject {
    pub fn new(device: &wgpu::Device, model: Model, color: [f32; 3], transform: TransformFn) -> Self {
        let raw = ObjectRaw::new(transform(0.0), color);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Object Buffer", model.path)),
            contents: bytemuck::cast_slice(&[raw]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            model,
            color,
            transform,
            buffer,
        }
    }

    /// Evaluate the transform at `time` and push matrix and color to the
    /// GPU.
    pub fn write_to_buffer(&self, queue: &wgpu::Queue, time: f32) {
        let raw = ObjectRaw::new((self.transform)(time), self.color);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[raw]));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Convert 8-bit channel values to the linear float color the shaders
/// expect.
pub fn rgb(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_layout_covers_matrix_and_color() {
        let desc = ObjectRaw::desc();
        assert_eq!(desc.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(desc.attributes.len(), 5);
        assert_eq!(desc.attributes[4].offset, 64);
        assert_eq!(
            desc.array_stride,
            std::mem::size_of::<ObjectRaw>() as wgpu::BufferAddress
        );
    }

    #[test]
    fn rgb_maps_to_unit_range() {
        assert_eq!(rgb(255, 0, 255), [1.0, 0.0, 1.0]);
        let teal = rgb(36, 176, 181);
        assert!((teal[0] - 36.0 / 255.0).abs() < 1e-6);
    }
}
