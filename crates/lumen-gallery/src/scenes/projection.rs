use std::f32::consts::FRAC_PI_2;

use lumen_engine::backend::{Filter, SamplerState, Topology, UniformValue};
use lumen_engine::geometry::{
    GeometryBuffer, GeometryError, SphereParams, VertexStream, plane, sphere,
};
use lumen_engine::math::{Mat4, Vec3, deg_to_rad};
use lumen_engine::params::{ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, DrawLayer, Mesh, Scene, TransformState, UniformSet};

use super::color;

const PROJECTED: &str = include_str!("../../shaders/projected.wgsl");
const SOLID: &str = include_str!("../../shaders/solid.wgsl");

const PROGRAMS: &[ProgramSource] = &[
    ProgramSource {
        name: "projected texture",
        vertex: PROJECTED,
        fragment: PROJECTED,
        attributes: &["a_position", "a_texcoord"],
        uniforms: &[
            "u_matrix",
            "u_world",
            "u_textureMatrix",
            "u_colorMult",
            "u_texture",
            "u_sampler",
            "u_projectedTexture",
            "u_projectedSampler",
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

const CHECKER: &str = "checker.png";
const PROJECTED_IMAGE: &str = "f-texture.png";
const TEXTURES: &[&str] = &[CHECKER, PROJECTED_IMAGE];

const SPHERE: usize = 0;
const PLANE: usize = 1;
const FRUSTUM: usize = 2;

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

/// Clip-space box with `[0, 1]` depth, drawn as 12 line segments.
const FRUSTUM_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];
const FRUSTUM_EDGES: [u32; 24] = [
    0, 1, 1, 3, 3, 2, 2, 0, //
    4, 5, 5, 7, 7, 6, 6, 4, //
    0, 4, 1, 5, 3, 7, 2, 6,
];

/// A checkered plane and sphere with an image projected onto them from a
/// movable projector, whose frustum is outlined in black.
pub struct ProjectionScene;

impl ProjectionScene {
    fn view_projection(state: &TransformState, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective(deg_to_rad(60.0), aspect, 1.0, 2000.0);
        let eye = Vec3::new(state.scalar("camera_x"), state.scalar("camera_y"), 7.0);
        let camera = Mat4::look_at(eye, Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        projection.multiply(&camera.inverse())
    }

    /// Projector placement (its world matrix) and its projection.
    fn projector(state: &TransformState) -> (Mat4, Mat4) {
        let position = Vec3::new(
            state.scalar("projector_x"),
            state.scalar("projector_y"),
            state.scalar("projector_z"),
        );
        let target = Vec3::new(
            state.scalar("target_x"),
            state.scalar("target_y"),
            state.scalar("target_z"),
        );
        let world = Mat4::look_at(position, target, Vec3::new(0.0, 1.0, 0.0));

        let (width, height) = (state.scalar("projector_width"), state.scalar("projector_height"));
        let projection = if state.flag("perspective") {
            Mat4::perspective(state.scalar("projector_fov"), width / height, NEAR, FAR)
        } else {
            Mat4::ortho(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0, NEAR, FAR)
        };
        (world, projection)
    }

    /// Maps world positions into the projector's `[0, 1]` texture space.
    fn texture_matrix(state: &TransformState) -> Mat4 {
        let (world, projection) = Self::projector(state);
        Mat4::translation(0.5, 0.5, 0.5)
            .scale(0.5, 0.5, 0.5)
            .multiply(&projection)
            .multiply(&world.inverse())
    }

    fn frustum() -> GeometryBuffer {
        GeometryBuffer::from_positions(FRUSTUM_CORNERS.to_vec()).with_indices(FRUSTUM_EDGES.to_vec())
    }
}

impl Scene for ProjectionScene {
    fn name(&self) -> &'static str {
        "projection-mapping"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        let scalar = |key| StateCommand::set(StateTarget::Scalar(key));
        vec![
            ParameterDescriptor::numeric("cameraX", 2.75, (-10.0, 10.0), 0.1, scalar("camera_x")),
            ParameterDescriptor::numeric("cameraY", 5.0, (1.0, 20.0), 0.1, scalar("camera_y")),
            ParameterDescriptor::numeric("posX", 2.5, (-10.0, 10.0), 0.01, scalar("projector_x")),
            ParameterDescriptor::numeric("posY", 4.8, (1.0, 20.0), 0.01, scalar("projector_y")),
            ParameterDescriptor::numeric("posZ", 4.3, (1.0, 20.0), 0.01, scalar("projector_z")),
            ParameterDescriptor::numeric("targetX", 2.5, (-10.0, 10.0), 0.01, scalar("target_x")),
            ParameterDescriptor::numeric("targetY", 0.0, (0.0, 20.0), 0.01, scalar("target_y")),
            ParameterDescriptor::numeric("targetZ", 3.5, (-10.0, 20.0), 0.01, scalar("target_z")),
            ParameterDescriptor::numeric(
                "projWidth",
                1.0,
                (0.1, 2.0),
                0.01,
                scalar("projector_width"),
            ),
            ParameterDescriptor::numeric(
                "projHeight",
                1.0,
                (0.1, 2.0),
                0.01,
                scalar("projector_height"),
            ),
            ParameterDescriptor::boolean(
                "perspective",
                true,
                StateCommand::set(StateTarget::Flag("perspective")),
            ),
            ParameterDescriptor::numeric(
                "fieldOfView",
                45.0,
                (1.0, 179.0),
                1.0,
                StateCommand::set(StateTarget::Angle("projector_fov")),
            ),
        ]
    }

    fn build_meshes(&mut self, _state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        let textured = |geometry| {
            Mesh::new(0, geometry)
                .with_attribute("a_position", VertexStream::Position)
                .with_attribute("a_texcoord", VertexStream::Texcoord)
        };
        let mut floor = plane(20.0, 20.0, 1, 1);
        floor.transform(&Mat4::rotation_x(-FRAC_PI_2));

        Ok(vec![
            textured(sphere(SphereParams::new(1.0, 12, 6))),
            textured(floor),
            Mesh::new(1, Self::frustum())
                .with_attribute("a_position", VertexStream::Position)
                .with_topology(Topology::Lines)
                .with_layer(DrawLayer::Overlay),
        ])
    }

    fn textures(&self) -> &[&'static str] {
        TEXTURES
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.9, 0.9, 0.92, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, mesh: usize) -> Vec<UniformSet> {
        let state = ctx.state;
        let view_projection = Self::view_projection(state, ctx.size.aspect());

        let textured = |world: Mat4, tint: UniformValue| {
            let (Some(checker), Some(image)) = (ctx.texture(CHECKER), ctx.texture(PROJECTED_IMAGE))
            else {
                return Vec::new();
            };
            let checker_sampler = SamplerState {
                mag_filter: Filter::Nearest,
                ..SamplerState::default()
            };
            vec![
                UniformSet::new()
                    .with("u_matrix", UniformValue::Mat4(view_projection.multiply(&world)))
                    .with("u_world", UniformValue::Mat4(world))
                    .with("u_textureMatrix", UniformValue::Mat4(Self::texture_matrix(state)))
                    .with("u_colorMult", tint)
                    .with("u_texture", UniformValue::Texture(checker))
                    .with("u_sampler", UniformValue::Sampler(checker_sampler))
                    .with("u_projectedTexture", UniformValue::Texture(image))
                    .with("u_projectedSampler", UniformValue::Sampler(SamplerState::default())),
            ]
        };

        match mesh {
            SPHERE => textured(Mat4::translation(2.0, 3.0, 4.0), color(1.0, 0.5, 0.5, 1.0)),
            PLANE => textured(Mat4::identity(), color(0.5, 0.5, 1.0, 1.0)),
            FRUSTUM => {
                let (world, projection) = Self::projector(state);
                let frustum = world.multiply(&projection.inverse());
                vec![
                    UniformSet::new()
                        .with("u_matrix", UniformValue::Mat4(view_projection.multiply(&frustum)))
                        .with("u_color", color(0.0, 0.0, 0.0, 1.0)),
                ]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lumen_engine::backend::{SurfaceSize, TextureId};
    use lumen_engine::math::Vec4;
    use lumen_engine::params::apply_defaults;
    use lumen_engine::scheduler::FrameTick;

    use super::*;

    fn default_state() -> TransformState {
        let mut state = TransformState::new();
        apply_defaults(&mut state, &ProjectionScene.parameters());
        state
    }

    /// Projector at +Z looking at the origin, so its x axis is world +X.
    fn facing_state(perspective: bool) -> TransformState {
        default_state()
            .with_scalar("projector_x", 0.0)
            .with_scalar("projector_y", 0.0)
            .with_scalar("projector_z", 5.0)
            .with_scalar("target_x", 0.0)
            .with_scalar("target_y", 0.0)
            .with_scalar("target_z", 0.0)
            .with_flag("perspective", perspective)
    }

    fn projected(state: &TransformState, p: Vec3) -> (f32, f32) {
        let v = ProjectionScene::texture_matrix(state).transform_vec4(Vec4::new(p.x, p.y, p.z, 1.0));
        (v.x / v.w, v.y / v.w)
    }

    #[test]
    fn projector_target_lands_mid_texture() {
        let state = default_state();
        let target = Vec3::new(2.5, 0.0, 3.5);
        let (u, v) = projected(&state, target);
        assert!((u - 0.5).abs() < 1e-4, "{u}");
        assert!((v - 0.5).abs() < 1e-4, "{v}");
    }

    #[test]
    fn orthographic_projector_ignores_distance() {
        let ortho = facing_state(false);
        let (near_u, _) = projected(&ortho, Vec3::new(0.4, 0.0, 0.0));
        let (far_u, _) = projected(&ortho, Vec3::new(0.4, 0.0, -10.0));
        assert!((near_u - 0.9).abs() < 1e-4, "{near_u}");
        assert!((far_u - 0.9).abs() < 1e-4, "{far_u}");

        let (persp_u, _) = projected(&facing_state(true), Vec3::new(0.4, 0.0, 0.0));
        assert!(persp_u > 0.5 && persp_u < 0.9, "{persp_u}");
    }

    #[test]
    fn every_mesh_binds_its_program_uniforms() {
        let state = default_state();
        let textures = BTreeMap::from([(CHECKER, TextureId(1)), (PROJECTED_IMAGE, TextureId(2))]);
        let ctx = DrawContext {
            state: &state,
            tick: FrameTick::zero(),
            size: SurfaceSize::new(800, 600),
            textures: &textures,
        };
        let meshes = ProjectionScene.build_meshes(&state).unwrap();
        assert_eq!(meshes.len(), 3);
        for (index, mesh) in meshes.iter().enumerate() {
            let expected = PROGRAMS[mesh.program].uniforms;
            let draws = ProjectionScene.draws(&ctx, index);
            assert_eq!(draws.len(), 1, "mesh {index}");
            let names: Vec<_> = draws[0].iter().map(|(n, _)| n).collect();
            assert_eq!(names.len(), expected.len(), "mesh {index}");
            assert!(expected.iter().all(|u| names.contains(u)), "mesh {index}");
        }
    }

    #[test]
    fn frustum_is_a_line_list_overlay() {
        let meshes = ProjectionScene.build_meshes(&default_state()).unwrap();
        let frustum = &meshes[FRUSTUM];
        assert_eq!(frustum.topology, Topology::Lines);
        assert_eq!(frustum.layer, DrawLayer::Overlay);
        assert_eq!(frustum.geometry.element_count(), 24);
        assert_eq!(frustum.geometry.validate(), Ok(()));
    }

    #[test]
    fn textured_meshes_wait_for_both_textures() {
        let state = default_state();
        let textures = BTreeMap::from([(CHECKER, TextureId(1))]);
        let ctx = DrawContext {
            state: &state,
            tick: FrameTick::zero(),
            size: SurfaceSize::new(800, 600),
            textures: &textures,
        };
        assert!(ProjectionScene.draws(&ctx, SPHERE).is_empty());
        assert!(ProjectionScene.draws(&ctx, PLANE).is_empty());
        assert_eq!(ProjectionScene.draws(&ctx, FRUSTUM).len(), 1);
    }
}
