use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, CameraUniform},
    data_structures::{grid::GridConfig, texture},
    pipelines::{
        basic::mk_basic_pipeline,
        grid::{GridResources, mk_grid_pipeline},
        light::{LightResources, LightUniform},
    },
    viewer::ViewerConfig,
};

/// The three pipeline configurations of a frame: lit fill, lit wireframe
/// (same shader, line polygon mode) and the translucent grid lines.
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub wireframe: wgpu::RenderPipeline,
    pub grid: wgpu::RenderPipeline,
}

/// Central GPU and window state: device, queue, surface, depth attachment,
/// camera/light/grid resources and the render pipelines.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: camera::Projection,
    pub light: LightResources,
    pub grid: GridResources,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        viewer_config: &ViewerConfig,
        grid_config: &GridConfig,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                // Line polygon mode backs the wireframe toggle.
                required_features: wgpu::Features::POLYGON_MODE_LINE,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::Camera::new((0.0, 1.0, 3.0), cgmath::Deg(-90.0), cgmath::Deg(0.0));
        // The projection aspect is a configured constant, independent of
        // the live window size.
        let projection = camera::Projection::new(
            viewer_config.width,
            viewer_config.height,
            cgmath::Deg(45.0),
            0.1,
            100.0,
        );
        let camera_controller = camera::CameraController::new(2.5, 1.0);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        // Direction from the light source into the scene.
        let light = LightResources::new(&device, LightUniform::new([-1.0, -2.0, -1.0]));

        let grid = GridResources::new(&device, grid_config);

        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &light.bind_group_layout,
                wgpu::PolygonMode::Fill,
            ),
            wireframe: mk_basic_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &light.bind_group_layout,
                wgpu::PolygonMode::Line,
            ),
            grid: mk_grid_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &grid.bind_group_layout,
            ),
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            grid,
            pipelines,
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
        })
    }
}
