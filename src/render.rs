//! Per-frame draw submission.
//!
//! [`plan_frame`] fixes the frame's draw order as pure data: every opaque
//! scene object in list order first, the translucent grid strictly last.
//! [`execute_plan`] then replays the plan against a render pass. Keeping
//! the plan separate from its execution makes the ordering and blending
//! contract observable without a GPU.

use crate::{
    data_structures::{model::DrawModel, object::SceneObject},
    pipelines::grid::GridResources,
};

/// Which pipeline a draw call runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineKind {
    Main,
    Grid,
}

impl PipelineKind {
    /// Whether the pipeline's color target blends with the frame. Only
    /// the grid pipeline does; blending can never leak into other draws.
    pub fn blends(self) -> bool {
        matches!(self, PipelineKind::Grid)
    }
}

/// What a draw call renders: a scene object by list index, or the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawSource {
    Object(usize),
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub pipeline: PipelineKind,
    pub source: DrawSource,
}

/// Build the frame's draw list. Deterministic: the same inputs always
/// produce the same sequence, and drawing mutates nothing that feeds back
/// into planning.
pub fn plan_frame(object_count: usize, has_grid: bool) -> Vec<DrawCall> {
    let mut calls = Vec::with_capacity(object_count + 1);
    for index in 0..object_count {
        calls.push(DrawCall {
            pipeline: PipelineKind::Main,
            source: DrawSource::Object(index),
        });
    }
    if has_grid {
        calls.push(DrawCall {
            pipeline: PipelineKind::Grid,
            source: DrawSource::Grid,
        });
    }
    calls
}

/// Replay a frame plan against the render pass. Object entries bind the
/// main pipeline, the camera and light groups and the object's instance
/// buffer; the grid entry binds the blending line pipeline and issues one
/// non-indexed draw over the grid's vertices.
#[allow(clippy::too_many_arguments)]
pub fn execute_plan(
    plan: &[DrawCall],
    render_pass: &mut wgpu::RenderPass<'_>,
    objects: &[SceneObject],
    grid: &GridResources,
    object_pipeline: &wgpu::RenderPipeline,
    grid_pipeline: &wgpu::RenderPipeline,
    camera_bind_group: &wgpu::BindGroup,
    light_bind_group: &wgpu::BindGroup,
) {
    for call in plan {
        match call.source {
            DrawSource::Object(index) => {
                let Some(object) = objects.get(index) else {
                    log::warn!("Draw call references object {} of {}", index, objects.len());
                    continue;
                };
                render_pass.set_pipeline(object_pipeline);
                render_pass.set_bind_group(0, camera_bind_group, &[]);
                render_pass.set_bind_group(1, light_bind_group, &[]);
                render_pass.set_vertex_buffer(1, object.buffer().slice(..));
                render_pass.draw_model(&object.model);
            }
            DrawSource::Grid => {
                render_pass.set_pipeline(grid_pipeline);
                render_pass.set_bind_group(0, camera_bind_group, &[]);
                render_pass.set_bind_group(1, &grid.bind_group, &[]);
                render_pass.set_vertex_buffer(0, grid.geometry.vertex_buffer.slice(..));
                render_pass.draw(0..grid.geometry.num_vertices, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_draw_in_list_order_before_the_grid() {
        let plan = plan_frame(2, true);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].source, DrawSource::Object(0));
        assert_eq!(plan[1].source, DrawSource::Object(1));
        assert_eq!(plan[2].source, DrawSource::Grid);
    }

    #[test]
    fn blending_is_limited_to_the_grid_draw() {
        let plan = plan_frame(5, true);
        let (grid_calls, object_calls): (Vec<_>, Vec<_>) =
            plan.iter().partition(|call| call.pipeline.blends());
        assert_eq!(grid_calls.len(), 1);
        assert_eq!(grid_calls[0].source, DrawSource::Grid);
        assert!(object_calls.iter().all(|c| c.pipeline == PipelineKind::Main));
        // The blending draw comes last.
        assert!(plan.last().unwrap().pipeline.blends());
    }

    #[test]
    fn planning_is_idempotent() {
        assert_eq!(plan_frame(3, true), plan_frame(3, true));
        assert_eq!(plan_frame(0, false), plan_frame(0, false));
    }

    #[test]
    fn empty_scene_still_draws_the_grid() {
        let plan = plan_frame(0, true);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, DrawSource::Grid);
    }

    #[test]
    fn no_grid_means_no_blending_draw() {
        let plan = plan_frame(2, false);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|c| !c.pipeline.blends()));
    }
}
