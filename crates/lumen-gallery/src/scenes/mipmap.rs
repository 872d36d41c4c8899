use std::f32::consts::{FRAC_PI_2, PI};

use lumen_engine::backend::{Filter, SamplerState, UniformValue};
use lumen_engine::geometry::{GeometryError, VertexStream, plane};
use lumen_engine::math::{Mat4, Vec2, Vec3, deg_to_rad};
use lumen_engine::params::{ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, Mesh, Scene, TransformState, UniformSet};

const SOURCE: &str = include_str!("../../shaders/textured.wgsl");

const PROGRAMS: &[ProgramSource] = &[ProgramSource {
    name: "textured",
    vertex: SOURCE,
    fragment: SOURCE,
    attributes: &["a_position", "a_texcoord"],
    uniforms: &["u_matrix", "u_uvScale", "u_texture", "u_sampler"],
}];

const TEXTURES: &[&str] = &["mip-low-res-example.png", "checker.png"];

/// Length of each strip along the view direction.
const DEPTH: f32 = 50.0;
const X_SPACING: f32 = 1.2;
const Y_SPACING: f32 = 0.7;

/// Grid cell, whether the strip is flipped upside down, and how it is sampled.
const STRIPS: [(f32, f32, f32, SamplerState); 6] = [
    (-1.0, 1.0, 0.0, SamplerState::new(Filter::Nearest, Filter::Nearest, None)),
    (0.0, 1.0, 0.0, SamplerState::new(Filter::Linear, Filter::Linear, None)),
    (1.0, 1.0, 0.0, SamplerState::new(Filter::Nearest, Filter::Linear, Some(Filter::Nearest))),
    (-1.0, -1.0, 1.0, SamplerState::new(Filter::Linear, Filter::Linear, Some(Filter::Nearest))),
    (0.0, -1.0, 1.0, SamplerState::new(Filter::Nearest, Filter::Linear, Some(Filter::Linear))),
    (1.0, -1.0, 1.0, SamplerState::new(Filter::Linear, Filter::Linear, Some(Filter::Linear))),
];

/// Six long textured strips receding from the camera, one per filter mode,
/// so the minification artifacts of each can be compared side by side.
pub struct MipmapScene;

impl MipmapScene {
    fn view_projection(aspect: f32) -> Mat4 {
        let projection = Mat4::perspective(deg_to_rad(60.0), aspect, 1.0, 2000.0);
        let camera = Mat4::look_at(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::zero(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        projection.multiply(&camera.inverse())
    }
}

impl Scene for MipmapScene {
    fn name(&self) -> &'static str {
        "mipmap"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::single_choice(
                "texture",
                TEXTURES[0],
                TEXTURES,
                StateCommand::set(StateTarget::Choice("texture")),
            ),
            ParameterDescriptor::numeric(
                "repeat",
                DEPTH,
                (1.0, 100.0),
                1.0,
                StateCommand::set(StateTarget::Scalar("repeat")),
            ),
        ]
    }

    fn build_meshes(&mut self, _state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        // Unit square lying in y = 0.5, texcoord v running from far (-z) to near.
        let mut strip = plane(1.0, 1.0, 1, 1);
        strip.transform(&Mat4::translation(0.0, 0.5, 0.0).rotate_x(-FRAC_PI_2));

        Ok(vec![
            Mesh::new(0, strip)
                .with_attribute("a_position", VertexStream::Position)
                .with_attribute("a_texcoord", VertexStream::Texcoord),
        ])
    }

    fn textures(&self) -> &[&'static str] {
        TEXTURES
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, _mesh: usize) -> Vec<UniformSet> {
        let id = ctx.state.choice("texture").unwrap_or(TEXTURES[0]);
        let Some(texture) = ctx.texture(id) else {
            return Vec::new();
        };
        let view_projection = Self::view_projection(ctx.size.aspect());
        let repeat = ctx.state.scalar("repeat");

        STRIPS
            .iter()
            .map(|&(x, y, flip, sampler)| {
                let matrix = view_projection
                    .translate(x * X_SPACING, y * Y_SPACING, -DEPTH * 0.5)
                    .rotate_z(flip * PI)
                    .scale(1.0, 1.0, DEPTH);
                UniformSet::new()
                    .with("u_matrix", UniformValue::Mat4(matrix))
                    .with("u_uvScale", UniformValue::Vec2(Vec2::new(1.0, repeat)))
                    .with("u_texture", UniformValue::Texture(texture))
                    .with("u_sampler", UniformValue::Sampler(sampler))
            })
            .collect()
    }
}
