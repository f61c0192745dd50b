//! Free-fly camera, its input controller and the view/projection uniform.
//!
//! The camera is a position plus yaw/pitch angles; the controller
//! accumulates keyboard and mouse input between frames and applies it with
//! the frame delta. The projection's aspect ratio is a configured
//! constant, not the live window size.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::{
    event::{ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// cgmath produces OpenGL clip-space depth (-1..1); wgpu expects 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();

        Matrix4::look_to_rh(
            self.position,
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize(),
            Vector3::unit_y(),
        )
    }
}

#[derive(Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Narrow or widen the field of view, clamped to [1°, 45°].
    pub fn zoom<D: Into<Rad<f32>>>(&mut self, delta: D) {
        let min: Rad<f32> = Deg(1.0).into();
        let max: Rad<f32> = Deg(45.0).into();
        let fovy = self.fovy + delta.into();
        self.fovy = if fovy < min {
            min
        } else if fovy > max {
            max
        } else {
            fovy
        };
    }
}

/// Accumulates movement and look input between frames and applies it to
/// the camera (and the projection's field of view) once per frame.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.process_keyboard(key, event.state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.process_scroll(delta),
            _ => (),
        }
    }

    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.amount_right = amount;
                true
            }
            KeyCode::Space => {
                self.amount_up = amount;
                true
            }
            KeyCode::ShiftLeft => {
                self.amount_down = amount;
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.rotate_horizontal = mouse_dx as f32;
        self.rotate_vertical = mouse_dy as f32;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll = match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
        };
    }

    /// Drop any half-applied look input, e.g. when mouse capture toggles.
    pub fn reset_rotation(&mut self) {
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let dt = dt.as_secs_f32();

        // Planar movement follows the yaw direction; height is moved
        // directly so looking down does not slow the walk.
        let (yaw_sin, yaw_cos) = camera.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        camera.position += forward * (self.amount_forward - self.amount_backward) * self.speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * self.speed * dt;
        camera.position.y += (self.amount_up - self.amount_down) * self.speed * dt;

        camera.yaw += Rad(self.rotate_horizontal) * self.sensitivity * dt;
        camera.pitch += Rad(-self.rotate_vertical) * self.sensitivity * dt;
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        if camera.pitch < -Rad(SAFE_FRAC_PI_2) {
            camera.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if camera.pitch > Rad(SAFE_FRAC_PI_2) {
            camera.pitch = Rad(SAFE_FRAC_PI_2);
        }

        if self.scroll != 0.0 {
            projection.zoom(Deg(-self.scroll));
            self.scroll = 0.0;
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view = camera.calc_matrix().into();
        self.proj = projection.calc_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state bundled with its GPU residency (uniform buffer and bind
/// group), owned by the context.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_input_moves_along_yaw() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut projection = Projection::new(16, 9, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.0, 1.0);
        controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed);

        controller.update(&mut camera, &mut projection, Duration::from_secs(1));

        // Yaw 0 looks down +x.
        assert!((camera.position.x - 2.0).abs() < 1e-5);
        assert!(camera.position.y.abs() < 1e-5);
        assert!(camera.position.z.abs() < 1e-5);
    }

    #[test]
    fn releasing_a_key_stops_movement() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut projection = Projection::new(16, 9, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.0, 1.0);
        controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        controller.process_keyboard(KeyCode::KeyW, ElementState::Released);

        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.position.x.abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_below_vertical() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut projection = Projection::new(16, 9, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(1.0, 100.0);
        controller.handle_mouse(0.0, -10_000.0);

        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.pitch.0 <= SAFE_FRAC_PI_2);

        controller.handle_mouse(0.0, 10_000.0);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.pitch.0 >= -SAFE_FRAC_PI_2);
    }

    #[test]
    fn zoom_is_clamped_to_fov_range() {
        let mut projection = Projection::new(16, 9, Deg(45.0), 0.1, 100.0);
        projection.zoom(Deg(30.0));
        assert!((projection.fovy - Rad::from(Deg(45.0))).0.abs() < 1e-6);
        projection.zoom(Deg(-100.0));
        assert!((projection.fovy - Rad::from(Deg(1.0))).0.abs() < 1e-6);
    }

    #[test]
    fn projection_keeps_the_configured_aspect() {
        let projection = Projection::new(1920, 1080, Deg(45.0), 0.1, 100.0);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
