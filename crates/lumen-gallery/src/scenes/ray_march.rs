use lumen_engine::backend::{Topology, UniformValue};
use lumen_engine::geometry::{GeometryBuffer, GeometryError, VertexStream};
use lumen_engine::math::{Vec2, Vec3, Vec4};
use lumen_engine::params::{ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, Mesh, Scene, TransformState, UniformSet};

const SOURCE: &str = include_str!("../../shaders/ray_march.wgsl");

const PROGRAMS: &[ProgramSource] = &[ProgramSource {
    name: "ray march",
    vertex: SOURCE,
    fragment: SOURCE,
    attributes: &["a_position"],
    uniforms: &["iResolution", "iTime", "iMouse", "u_orbit"],
}];

/// Full-screen quad; all the work happens in the fragment stage.
pub struct RayMarchScene;

/// Shadertoy-style mouse: pixel position with a bottom-left origin, `z > 0`
/// while the pointer is over the surface.
fn mouse(pointer: Option<Vec2>, width: f32, height: f32) -> Vec4 {
    match pointer {
        Some(p) => Vec4::new(p.x * width, (1.0 - p.y) * height, 1.0, 0.0),
        None => Vec4::new(0.0, 0.0, 0.0, 0.0),
    }
}

impl Scene for RayMarchScene {
    fn name(&self) -> &'static str {
        "ray-marching"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![ParameterDescriptor::numeric(
            "orbit",
            2.0,
            (0.0, 4.0),
            0.1,
            StateCommand::set(StateTarget::Scalar("orbit")),
        )]
    }

    fn build_meshes(&mut self, _state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        let quad = GeometryBuffer::from_positions(vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]);
        Ok(vec![
            Mesh::new(0, quad)
                .with_attribute("a_position", VertexStream::Position)
                .with_topology(Topology::TriangleStrip),
        ])
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, _mesh: usize) -> Vec<UniformSet> {
        let (w, h) = (ctx.size.width as f32, ctx.size.height as f32);
        vec![
            UniformSet::new()
                .with("iResolution", UniformValue::Vec2(Vec2::new(w, h)))
                .with("iTime", UniformValue::Float(ctx.tick.seconds()))
                .with("iMouse", UniformValue::Vec4(mouse(ctx.pointer(), w, h)))
                .with("u_orbit", UniformValue::Float(ctx.state.scalar("orbit"))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_flips_to_a_bottom_left_origin() {
        let m = mouse(Some(Vec2::new(0.25, 0.75)), 800.0, 400.0);
        assert_eq!(m, Vec4::new(200.0, 100.0, 1.0, 0.0));
    }

    #[test]
    fn mouse_is_zero_without_a_pointer() {
        assert_eq!(mouse(None, 800.0, 400.0), Vec4::new(0.0, 0.0, 0.0, 0.0));
    }
}
