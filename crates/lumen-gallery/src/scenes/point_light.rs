use std::f32::consts::FRAC_PI_2;

use lumen_engine::backend::UniformValue;
use lumen_engine::geometry::{GeometryError, VertexStream, box_geometry, plane};
use lumen_engine::math::{Mat3, Mat4, Vec3, deg_to_rad};
use lumen_engine::params::{Axis, ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, DrawLayer, Mesh, Scene, TransformState, UniformSet};

use super::color;

const LIT: &str = include_str!("../../shaders/point_light.wgsl");
const SOLID: &str = include_str!("../../shaders/solid.wgsl");

const PROGRAMS: &[ProgramSource] = &[
    ProgramSource {
        name: "point light",
        vertex: LIT,
        fragment: LIT,
        attributes: &["a_position", "a_normal"],
        uniforms: &[
            "u_matrix",
            "u_world",
            "u_normalMatrix",
            "u_lightWorldPosition",
            "u_color",
        ],
    },
    ProgramSource {
        name: "solid",
        vertex: SOLID,
        fragment: SOLID,
        attributes: &["a_position"],
        uniforms: &["u_matrix", "u_color"],
    },
];

const CUBE: usize = 0;
const FLOOR: usize = 1;
const MARKER: usize = 2;

const COLORS: &[&str] = &["green", "red", "white"];

/// A cube on a floor, lit by a movable point light.
pub struct PointLightScene;

impl PointLightScene {
    fn view_projection(aspect: f32) -> Mat4 {
        let projection = Mat4::perspective(deg_to_rad(60.0), aspect, 1.0, 2000.0);
        let camera = Mat4::look_at(
            Vec3::new(0.0, 200.0, 400.0),
            Vec3::zero(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        projection.multiply(&camera.inverse())
    }

    fn light_position(state: &TransformState) -> Vec3 {
        Vec3::new(
            state.scalar("light_x"),
            state.scalar("light_y"),
            state.scalar("light_z"),
        )
    }

    fn cube_color(state: &TransformState) -> UniformValue {
        match state.choice("color") {
            Some("red") => color(1.0, 0.25, 0.2, 1.0),
            Some("white") => color(0.95, 0.95, 0.95, 1.0),
            _ => color(0.2, 1.0, 0.2, 1.0),
        }
    }
}

impl Scene for PointLightScene {
    fn name(&self) -> &'static str {
        "point-light"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        let light = |key| StateCommand::set(StateTarget::Scalar(key));
        vec![
            ParameterDescriptor::numeric("light x", 60.0, (-200.0, 200.0), 5.0, light("light_x")),
            ParameterDescriptor::numeric("light y", 120.0, (-50.0, 250.0), 5.0, light("light_y")),
            ParameterDescriptor::numeric("light z", 80.0, (-200.0, 200.0), 5.0, light("light_z")),
            ParameterDescriptor::numeric(
                "angleY",
                30.0,
                (0.0, 360.0),
                1.0,
                StateCommand::set(StateTarget::Rotation(Axis::Y)),
            ),
            ParameterDescriptor::single_choice(
                "color",
                "green",
                COLORS,
                StateCommand::set(StateTarget::Choice("color")),
            ),
        ]
    }

    fn build_meshes(&mut self, _state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        let lit = |geometry| {
            Mesh::new(0, geometry)
                .with_attribute("a_position", VertexStream::Position)
                .with_attribute("a_normal", VertexStream::Normal)
        };
        let marker = Mesh::new(1, box_geometry(8.0, 8.0, 8.0))
            .with_attribute("a_position", VertexStream::Position)
            .with_layer(DrawLayer::Overlay);

        Ok(vec![
            lit(box_geometry(100.0, 100.0, 100.0)),
            lit(plane(400.0, 400.0, 1, 1)),
            marker,
        ])
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.05, 0.05, 0.08, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, mesh: usize) -> Vec<UniformSet> {
        let state = ctx.state;
        let view_projection = Self::view_projection(ctx.size.aspect());
        let light = Self::light_position(state);

        let lit = |world: Mat4, surface: UniformValue| {
            UniformSet::new()
                .with("u_matrix", UniformValue::Mat4(view_projection.multiply(&world)))
                .with("u_world", UniformValue::Mat4(world))
                .with(
                    "u_normalMatrix",
                    UniformValue::Mat3(Mat3::from_mat4(&world.inverse().transpose())),
                )
                .with("u_lightWorldPosition", UniformValue::Vec3(light))
                .with("u_color", surface)
        };

        match mesh {
            CUBE => vec![lit(state.model_matrix(), Self::cube_color(state))],
            FLOOR => {
                let world = Mat4::translation(0.0, -50.0, 0.0).rotate_x(-FRAC_PI_2);
                vec![lit(world, color(0.55, 0.55, 0.6, 1.0))]
            }
            MARKER => {
                let world = Mat4::translation(light.x, light.y, light.z);
                vec![
                    UniformSet::new()
                        .with("u_matrix", UniformValue::Mat4(view_projection.multiply(&world)))
                        .with("u_color", color(1.0, 1.0, 0.6, 1.0)),
                ]
            }
            _ => Vec::new(),
        }
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
        apply_defaults(&mut state, &PointLightScene.parameters());
        state
    }

    #[test]
    fn every_mesh_binds_its_program_uniforms() {
        let state = default_state();
        let textures = BTreeMap::new();
        let ctx = DrawContext {
            state: &state,
            tick: FrameTick::zero(),
            size: SurfaceSize::new(800, 600),
            textures: &textures,
        };
        let meshes = PointLightScene.build_meshes(&state).unwrap();
        for (index, mesh) in meshes.iter().enumerate() {
            let expected = PROGRAMS[mesh.program].uniforms;
            for set in PointLightScene.draws(&ctx, index) {
                let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
                assert_eq!(names.len(), expected.len(), "mesh {index}");
                assert!(expected.iter().all(|u| names.contains(u)), "mesh {index}");
            }
        }
    }

    #[test]
    fn color_choice_changes_the_cube() {
        let mut state = default_state();
        assert_eq!(
            PointLightScene::cube_color(&state),
            color(0.2, 1.0, 0.2, 1.0)
        );
        state.choices.insert("color", "red".to_string());
        assert_eq!(
            PointLightScene::cube_color(&state),
            color(1.0, 0.25, 0.2, 1.0)
        );
    }

    #[test]
    fn light_follows_the_scalars() {
        let state = default_state();
        assert_eq!(
            PointLightScene::light_position(&state),
            Vec3::new(60.0, 120.0, 80.0)
        );
    }
}
