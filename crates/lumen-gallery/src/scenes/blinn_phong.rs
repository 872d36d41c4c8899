use std::f32::consts::PI;

use lumen_engine::backend::UniformValue;
use lumen_engine::geometry::{GeometryBuffer, GeometryError, VertexStream, box_geometry};
use lumen_engine::math::{Mat3, Mat4, Vec3, deg_to_rad};
use lumen_engine::params::{Axis, ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, Mesh, Scene, TransformState, UniformSet};

use super::color;

const SOURCE: &str = include_str!("../../shaders/blinn_phong.wgsl");

const PROGRAMS: &[ProgramSource] = &[ProgramSource {
    name: "blinn-phong",
    vertex: SOURCE,
    fragment: SOURCE,
    attributes: &["a_position", "a_normal"],
    uniforms: &[
        "u_worldViewProjection",
        "u_world",
        "u_worldInverseTranspose",
        "u_lightWorldPosition",
        "u_viewWorldPosition",
        "u_color",
        "u_shininess",
        "u_ambient",
    ],
}];

const CAMERA: Vec3 = Vec3::new(100.0, 150.0, 200.0);
const LIGHT: Vec3 = Vec3::new(20.0, 30.0, 60.0);

/// Boxes making up the letter, as (min corner, max corner) with +Y down.
const LETTER_F: [(Vec3, Vec3); 3] = [
    (Vec3::new(0.0, 0.0, 0.0), Vec3::new(30.0, 150.0, 30.0)),
    (Vec3::new(30.0, 0.0, 0.0), Vec3::new(100.0, 30.0, 30.0)),
    (Vec3::new(30.0, 60.0, 0.0), Vec3::new(67.0, 90.0, 30.0)),
];

/// A green letter F under a point light with diffuse, ambient and
/// Blinn-Phong specular terms.
pub struct BlinnPhongScene;

impl BlinnPhongScene {
    fn view_projection(aspect: f32) -> Mat4 {
        let projection = Mat4::perspective(deg_to_rad(60.0), aspect, 1.0, 2000.0);
        let camera = Mat4::look_at(CAMERA, Vec3::new(0.0, 35.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        projection.multiply(&camera.inverse())
    }
}

/// The letter F, 100 wide, 150 tall and 30 deep, centered on the origin with
/// +Y up.
pub fn letter_f() -> GeometryBuffer {
    let mut letter = GeometryBuffer::default();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    for (min, max) in LETTER_F {
        let size = max - min;
        let center = (min + max) * 0.5;
        let mut part = box_geometry(size.x, size.y, size.z);
        part.transform(&Mat4::translation(center.x, center.y, center.z));

        let base = letter.positions.len() as u32;
        indices.extend(part.indices.iter().flatten().map(|i| base + i));
        normals.extend(part.normals.into_iter().flatten());
        letter.positions.extend(part.positions);
    }
    letter.normals = Some(normals);
    letter.indices = Some(indices);

    // Flip to +Y up and center.
    letter.transform(&Mat4::rotation_x(PI).translate(-50.0, -75.0, -15.0));
    letter
}

impl Scene for BlinnPhongScene {
    fn name(&self) -> &'static str {
        "blinn-phong"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::numeric(
                "rotation",
                0.0,
                (-360.0, 360.0),
                1.0,
                StateCommand::set(StateTarget::Rotation(Axis::Y)),
            ),
            ParameterDescriptor::numeric(
                "shininess",
                150.0,
                (1.0, 300.0),
                1.0,
                StateCommand::set(StateTarget::Scalar("shininess")),
            ),
            ParameterDescriptor::numeric(
                "ambient",
                0.1,
                (0.0, 1.0),
                0.1,
                StateCommand::set(StateTarget::Scalar("ambient")),
            ),
        ]
    }

    fn build_meshes(&mut self, _state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        Ok(vec![
            Mesh::new(0, letter_f())
                .with_attribute("a_position", VertexStream::Position)
                .with_attribute("a_normal", VertexStream::Normal),
        ])
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, _mesh: usize) -> Vec<UniformSet> {
        let state = ctx.state;
        let world = Mat4::rotation_y(state.rotation.y);
        let view_projection = Self::view_projection(ctx.size.aspect());

        vec![
            UniformSet::new()
                .with(
                    "u_worldViewProjection",
                    UniformValue::Mat4(view_projection.multiply(&world)),
                )
                .with("u_world", UniformValue::Mat4(world))
                .with(
                    "u_worldInverseTranspose",
                    UniformValue::Mat3(Mat3::from_mat4(&world.inverse().transpose())),
                )
                .with("u_lightWorldPosition", UniformValue::Vec3(LIGHT))
                .with("u_viewWorldPosition", UniformValue::Vec3(CAMERA))
                .with("u_color", color(0.2, 1.0, 0.2, 1.0))
                .with("u_shininess", UniformValue::Float(state.scalar("shininess")))
                .with("u_ambient", UniformValue::Float(state.scalar("ambient"))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lumen_engine::backend::SurfaceSize;
    use lumen_engine::params::apply_defaults;
    use lumen_engine::scheduler::FrameTick;

    use super::*;

    fn default_state() -> TransformState {
        let mut state = TransformState::new();
        apply_defaults(&mut state, &BlinnPhongScene.parameters());
        state
    }

    fn float(set: &UniformSet, name: &str) -> Option<f32> {
        set.iter().find_map(|(n, v)| match v {
            UniformValue::Float(f) if n == name => Some(*f),
            _ => None,
        })
    }

    #[test]
    fn binds_every_declared_uniform() {
        let state = default_state();
        let textures = BTreeMap::new();
        let ctx = DrawContext {
            state: &state,
            tick: FrameTick::zero(),
            size: SurfaceSize::new(800, 600),
            textures: &textures,
        };
        let draws = BlinnPhongScene.draws(&ctx, 0);
        assert_eq!(draws.len(), 1);
        let names: Vec<_> = draws[0].iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), PROGRAMS[0].uniforms.len());
        assert!(PROGRAMS[0].uniforms.iter().all(|u| names.contains(u)));
    }

    #[test]
    fn shininess_and_ambient_reach_the_uniforms() {
        let mut state = default_state();
        assert_eq!(state.scalar("shininess"), 150.0);
        assert_eq!(state.scalar("ambient"), 0.1);

        state.scalars.insert("shininess", 40.0);
        state.scalars.insert("ambient", 0.5);
        let textures = BTreeMap::new();
        let ctx = DrawContext {
            state: &state,
            tick: FrameTick::zero(),
            size: SurfaceSize::new(800, 600),
            textures: &textures,
        };
        let set = &BlinnPhongScene.draws(&ctx, 0)[0];
        assert_eq!(float(set, "u_shininess"), Some(40.0));
        assert_eq!(float(set, "u_ambient"), Some(0.5));
    }

    #[test]
    fn letter_is_centered_with_y_up() {
        let letter = letter_f();
        assert_eq!(letter.vertex_count(), 3 * 24);
        assert_eq!(letter.element_count(), 3 * 36);
        assert_eq!(letter.validate(), Ok(()));

        let (lo, hi) = letter.positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), p| {
                (
                    Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                    Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
                )
            },
        );
        assert!((lo - Vec3::new(-50.0, -75.0, -15.0)).length() < 1e-3, "{lo:?}");
        assert!((hi - Vec3::new(50.0, 75.0, 15.0)).length() < 1e-3, "{hi:?}");

        // The top rung ends up at the top of the letter.
        let top_right = letter
            .positions
            .iter()
            .filter(|p| p.x > 49.0)
            .map(|p| p.y)
            .fold(f32::MIN, f32::max);
        assert!((top_right - 75.0).abs() < 1e-3);
    }
}
