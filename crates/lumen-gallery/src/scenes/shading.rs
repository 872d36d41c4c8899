use lumen_engine::backend::UniformValue;
use lumen_engine::geometry::{
    GeometryError, SphereParams, VertexStream, flatten_for_flat_shading, sphere,
};
use lumen_engine::math::{Mat3, Mat4, Vec3};
use lumen_engine::params::{Axis, ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, Mesh, Scene, TransformState, UniformSet};

use super::color;

const SOURCE: &str = include_str!("../../shaders/directional.wgsl");

const PROGRAMS: &[ProgramSource] = &[ProgramSource {
    name: "directional",
    vertex: SOURCE,
    fragment: SOURCE,
    attributes: &["a_position", "a_normal"],
    uniforms: &["u_matrix", "u_normalMatrix", "u_reverseLightDirection", "u_color"],
}];

const RADIUS: f32 = 100.0;
const DEPTH: f32 = 500.0;

/// Diffuse sphere, flat or smooth shaded.
///
/// Flat shading expands the sphere into independent triangles and feeds the
/// face normal to every corner; smooth shading draws the indexed sphere with
/// its vertex normals.
pub struct ShadingScene;

impl Scene for ShadingScene {
    fn name(&self) -> &'static str {
        "flat-shading"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::boolean(
                "flat",
                true,
                StateCommand::rebuilding(StateTarget::Flag("flat")),
            ),
            ParameterDescriptor::numeric(
                "detail",
                2.0,
                (1.0, 8.0),
                1.0,
                StateCommand::rebuilding(StateTarget::Scalar("detail")),
            ),
            ParameterDescriptor::numeric(
                "angleX",
                20.0,
                (0.0, 360.0),
                1.0,
                StateCommand::set(StateTarget::Rotation(Axis::X)),
            ),
            ParameterDescriptor::numeric(
                "angleY",
                0.0,
                (0.0, 360.0),
                1.0,
                StateCommand::set(StateTarget::Rotation(Axis::Y)),
            ),
        ]
    }

    fn build_meshes(&mut self, state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        let detail = state.scalar("detail").round().max(1.0) as u32;
        let indexed = sphere(SphereParams::new(RADIUS, 8 * detail, 4 * detail));

        let mesh = if state.flag("flat") {
            Mesh::new(0, flatten_for_flat_shading(&indexed)?)
                .with_attribute("a_normal", VertexStream::FaceNormal)
        } else {
            Mesh::new(0, indexed).with_attribute("a_normal", VertexStream::Normal)
        };
        Ok(vec![mesh.with_attribute("a_position", VertexStream::Position)])
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, _mesh: usize) -> Vec<UniformSet> {
        let (w, h) = (ctx.size.width as f32, ctx.size.height as f32);
        let model = ctx.state.model_matrix();
        let matrix = Mat4::projection(w, h, DEPTH)
            .translate(w / 2.0, h / 2.0, 0.0)
            .multiply(&model);
        let normal_matrix = Mat3::from_mat4(&model.inverse().transpose());

        // Pixel space is +Y down, so "up" is negative y.
        let light = Vec3::new(0.5, -0.7, -1.0);

        vec![
            UniformSet::new()
                .with("u_matrix", UniformValue::Mat4(matrix))
                .with("u_normalMatrix", UniformValue::Mat3(normal_matrix))
                .with("u_reverseLightDirection", UniformValue::Vec3(light))
                .with("u_color", color(0.6, 0.7, 1.0, 1.0)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use lumen_engine::params::apply_defaults;

    use super::*;

    fn state(flat: bool) -> TransformState {
        let mut state = TransformState::new();
        apply_defaults(&mut state, &ShadingScene.parameters());
        state.with_flag("flat", flat)
    }

    #[test]
    fn flat_mesh_is_expanded_and_uses_face_normals() {
        let meshes = ShadingScene.build_meshes(&state(true)).unwrap();
        let mesh = &meshes[0];
        assert!(mesh.geometry.indices.is_none());
        // 16 x 8 segments: 2 * 16 * 7 triangles.
        assert_eq!(mesh.geometry.positions.len(), 3 * 2 * 16 * 7);
        assert!(mesh.attributes.contains(&("a_normal", VertexStream::FaceNormal)));
    }

    #[test]
    fn smooth_mesh_stays_indexed() {
        let meshes = ShadingScene.build_meshes(&state(false)).unwrap();
        let mesh = &meshes[0];
        assert!(mesh.geometry.indices.is_some());
        assert!(mesh.attributes.contains(&("a_normal", VertexStream::Normal)));
    }
}
