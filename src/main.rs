use std::f32::consts::PI;

use cgmath::{Matrix4, Rad, Vector3};
use meshview::{
    data_structures::{grid::GridConfig, object::rgb},
    viewer::{ObjectDesc, ViewerConfig, run},
};

fn main() -> anyhow::Result<()> {
    let objects = vec![
        // Spinning primary object above the origin, tilted toward the
        // camera.
        ObjectDesc::new("assets/cube.obj", rgb(36, 176, 181), |time| {
            Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))
                * Matrix4::from_angle_y(Rad(time))
                * Matrix4::from_angle_x(Rad(-PI / 5.0))
        }),
        // Ground plane.
        ObjectDesc::new("assets/plane.obj", rgb(100, 100, 100), |_| {
            Matrix4::from_scale(10.0)
        }),
    ];

    run(ViewerConfig::default(), GridConfig::default(), objects)
}
