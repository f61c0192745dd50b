use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        grid::{Grid, GridConfig, GridVertex},
        model::Vertex,
        texture::Texture,
    },
    pipelines::basic::mk_render_pipeline,
};

/// Uniform data for the grid draw: a world matrix (identity, the grid
/// lives at the origin) and the translucent line color.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl GridUniform {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            model: cgmath::Matrix4::identity().into(),
            color,
        }
    }
}

/// The grid's line geometry together with its uniform and bind group.
pub struct GridResources {
    pub geometry: Grid,
    pub uniform: GridUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl GridResources {
    pub fn new(device: &wgpu::Device, config: &GridConfig) -> Self {
        let geometry = Grid::new(device, config);
        let uniform = GridUniform::new(config.color);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("grid_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("grid_bind_group"),
        });

        Self {
            geometry,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// The translucent line-list pipeline for the reference grid.
///
/// Alpha blending is part of this pipeline's color target, so it is in
/// effect exactly while the grid draws and cannot leak into other draws.
pub fn mk_grid_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    grid_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Grid Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, grid_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Grid Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("grid.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        wgpu::PrimitiveTopology::LineList,
        wgpu::PolygonMode::Fill,
        &[GridVertex::desc()],
        shader,
    )
}
