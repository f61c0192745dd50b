//! The viewer application: window lifecycle, input handling and the
//! per-frame render submission.
//!
//! [`run`] opens a window, loads the requested scene files once, then
//! renders them every frame with the free-fly camera, the directional
//! light and the reference grid. All mutable state lives in
//! [`ViewerState`] and is passed by reference through the event handlers.
//!
//! # Frame protocol
//!
//! 1. Measure the frame delta and the elapsed time
//! 2. Apply accumulated input to the camera, rewrite the camera uniform
//!    (view, camera position, projection) and the light/time uniform
//! 3. Evaluate every object's transform at the elapsed time and rewrite
//!    its instance buffer
//! 4. Encode one render pass executing the frame plan: opaque objects in
//!    list order, the translucent grid last
//! 5. Present and request the next redraw

use std::{iter, sync::Arc};

use cgmath::Matrix4;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::KeyCode,
    window::{CursorGrabMode, Window},
};

use crate::{
    context::Context,
    data_structures::{
        grid::GridConfig,
        object::{SceneObject, TransformFn},
        texture::Texture,
    },
    render, resources,
};

/// Window and projection configuration. The width and height fix both the
/// requested window size and the projection's aspect ratio.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            title: "meshview".to_string(),
        }
    }
}

/// One entry of the scene description handed to [`run`]: which file to
/// load, its flat base color, and how to place it over time.
pub struct ObjectDesc {
    pub path: String,
    pub color: [f32; 3],
    pub transform: TransformFn,
}

impl ObjectDesc {
    pub fn new(
        path: impl Into<String>,
        color: [f32; 3],
        transform: impl Fn(f32) -> Matrix4<f32> + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            color,
            transform: Box::new(transform),
        }
    }
}

/// Everything the viewer mutates while running: the GPU context, the
/// loaded scene objects, timing, and the input toggles.
pub struct ViewerState {
    pub(crate) ctx: Context,
    objects: Vec<SceneObject>,
    start_time: Instant,
    is_surface_configured: bool,
    mouse_captured: bool,
    wireframe: bool,
}

impl ViewerState {
    async fn new(
        window: Arc<Window>,
        config: &ViewerConfig,
        grid_config: &GridConfig,
        descs: Vec<ObjectDesc>,
    ) -> Self {
        let ctx = Context::new(window, config, grid_config).await;
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "Viewer initialization failed. Cannot create the main context: {}",
                e
            ),
        };

        let objects = futures::future::join_all(descs.into_iter().map(|desc| {
            let device = &ctx.device;
            async move {
                let model = resources::load_model(&desc.path, device).await;
                SceneObject::new(device, model, desc.color, desc.transform)
            }
        }))
        .await;

        Self {
            ctx,
            objects,
            start_time: Instant::now(),
            is_surface_configured: false,
            mouse_captured: false,
            wireframe: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
            // TODO: feed the new size into the projection once the aspect
            // ratio is no longer a fixed configuration constant.
        }
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        let window = &self.ctx.window;
        if captured {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("Could not grab the cursor: {}", e);
            }
            window.set_cursor_visible(false);
        } else {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                log::warn!("Could not release the cursor: {}", e);
            }
            window.set_cursor_visible(true);
        }
        // Avoid a camera jump from deltas accumulated while toggling.
        self.ctx.camera.controller.reset_rotation();
        self.mouse_captured = captured;
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::F2 => self.set_mouse_captured(!self.mouse_captured),
            KeyCode::KeyF => self.wireframe = true,
            KeyCode::KeyG => self.wireframe = false,
            _ => (),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let plan = render::plan_frame(self.objects.len(), true);
            let object_pipeline = if self.wireframe {
                &self.ctx.pipelines.wireframe
            } else {
                &self.ctx.pipelines.basic
            };
            render::execute_plan(
                &plan,
                &mut render_pass,
                &self.objects,
                &self.ctx.grid,
                object_pipeline,
                &self.ctx.pipelines.grid,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    state: Option<ViewerState>,
    config: ViewerConfig,
    grid_config: GridConfig,
    // Consumed by `take()` when the window first resumes.
    object_descs: Option<Vec<ObjectDesc>>,
    last_time: Instant,
}

impl App {
    fn new(config: ViewerConfig, grid_config: GridConfig, objects: Vec<ObjectDesc>) -> Self {
        Self {
            async_runtime: tokio::runtime::Runtime::new().unwrap(),
            state: None,
            config,
            grid_config,
            object_descs: Some(objects),
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let descs = self.object_descs.take().unwrap_or_default();
        let mut state = self.async_runtime.block_on(ViewerState::new(
            window,
            &self.config,
            &self.grid_config,
            descs,
        ));
        state.set_mouse_captured(true);
        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.last_time = Instant::now();
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.mouse_captured {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(key) = event.physical_key {
                    if !event.repeat {
                        state.handle_key(event_loop, key, event.state);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                let time = state.start_time.elapsed().as_secs_f32();

                // Camera first: view, camera position and the per-frame
                // projection all feed this frame's uniforms.
                state.ctx.camera.controller.update(
                    &mut state.ctx.camera.camera,
                    &mut state.ctx.projection,
                    dt,
                );
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                state.ctx.light.write_to_buffer(&state.ctx.queue, time);

                for object in &state.objects {
                    object.write_to_buffer(&state.ctx.queue, time);
                }

                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open the viewer window and render the described objects until the
/// window closes or Escape is pressed.
pub fn run(
    config: ViewerConfig,
    grid_config: GridConfig,
    objects: Vec<ObjectDesc>,
) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, grid_config, objects);
    event_loop.run_app(&mut app)?;

    Ok(())
}
