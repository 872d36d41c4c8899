use lumen_engine::backend::{Topology, UniformValue};
use lumen_engine::geometry::{BezierCurve, GeometryBuffer, GeometryError, VertexStream};
use lumen_engine::math::{Mat4, Vec3};
use lumen_engine::params::{Axis, ParameterDescriptor, StateCommand, StateTarget};
use lumen_engine::program::ProgramSource;
use lumen_engine::session::{DrawContext, DrawLayer, Mesh, Scene, TransformState, UniformSet};

const SOURCE: &str = include_str!("../../shaders/vertex_color.wgsl");

const PROGRAMS: &[ProgramSource] = &[ProgramSource {
    name: "vertex color",
    vertex: SOURCE,
    fragment: SOURCE,
    attributes: &["a_position", "a_color"],
    uniforms: &["u_matrix"],
}];

/// Repeated along the curve, one color per sample.
const PALETTE: [[u8; 4]; 3] = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
const POLYGON: [u8; 4] = [90, 90, 90, 255];

/// Z range of the pixel-space projection.
const DEPTH: f32 = 400.0;

/// Quadratic bezier drawn as a line strip, with its control polygon on top.
pub struct BezierScene {
    curve: BezierCurve,
}

impl BezierScene {
    pub fn new() -> Result<Self, GeometryError> {
        let curve = BezierCurve::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(150.0, 0.0, 0.0),
            Vec3::new(300.0, 300.0, 0.0),
        ])?;
        Ok(Self { curve })
    }
}

impl Scene for BezierScene {
    fn name(&self) -> &'static str {
        "bezier"
    }

    fn programs(&self) -> &[ProgramSource] {
        PROGRAMS
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        let translate = |axis| StateCommand::set(StateTarget::Translation(axis));
        let rotate = |axis| StateCommand::set(StateTarget::Rotation(axis));
        vec![
            ParameterDescriptor::numeric("x", 0.0, (-150.0, 100.0), 1.0, translate(Axis::X)),
            ParameterDescriptor::numeric("y", 0.0, (0.0, 300.0), 1.0, translate(Axis::Y)),
            ParameterDescriptor::numeric("z", 0.0, (-150.0, 150.0), 1.0, translate(Axis::Z)),
            ParameterDescriptor::numeric("angleX", 0.0, (0.0, 360.0), 1.0, rotate(Axis::X)),
            ParameterDescriptor::numeric("angleY", 0.0, (0.0, 360.0), 1.0, rotate(Axis::Y)),
            ParameterDescriptor::numeric("angleZ", 0.0, (0.0, 360.0), 1.0, rotate(Axis::Z)),
            ParameterDescriptor::numeric(
                "points",
                10.0,
                (2.0, 64.0),
                1.0,
                StateCommand::rebuilding(StateTarget::Scalar("points")),
            ),
            ParameterDescriptor::numeric(
                "progress",
                1.0,
                (0.0, 1.0),
                0.05,
                StateCommand::rebuilding(StateTarget::Scalar("progress")),
            ),
        ]
    }

    fn build_meshes(&mut self, state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        let count = state.scalar("points").round().max(2.0) as usize;
        let points = self.curve.sample(count, state.scalar("progress"));
        let colors = (0..count).map(|i| PALETTE[i % PALETTE.len()]).collect();
        let curve = GeometryBuffer::from_positions(points).with_colors(colors);

        let controls = self.curve.control_points().to_vec();
        let polygon_colors = vec![POLYGON; controls.len()];
        let polygon = GeometryBuffer::from_positions(controls).with_colors(polygon_colors);

        let mesh = |geometry| {
            Mesh::new(0, geometry)
                .with_attribute("a_position", VertexStream::Position)
                .with_attribute("a_color", VertexStream::Color)
                .with_topology(Topology::LineStrip)
        };
        Ok(vec![mesh(curve), mesh(polygon).with_layer(DrawLayer::Overlay)])
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    fn draws(&self, ctx: &DrawContext<'_>, _mesh: usize) -> Vec<UniformSet> {
        let projection = Mat4::projection(ctx.size.width as f32, ctx.size.height as f32, DEPTH);
        let matrix = projection.multiply(&ctx.state.model_matrix());
        vec![UniformSet::new().with("u_matrix", UniformValue::Mat4(matrix))]
    }
}

#[cfg(test)]
mod tests {
    use lumen_engine::params::apply_defaults;

    use super::*;

    fn default_state(scene: &BezierScene) -> TransformState {
        let mut state = scene.initial_state();
        apply_defaults(&mut state, &scene.parameters());
        state
    }

    #[test]
    fn curve_runs_from_first_to_last_control_point() {
        let mut scene = BezierScene::new().unwrap();
        let state = default_state(&scene);
        let meshes = scene.build_meshes(&state).unwrap();

        let curve = &meshes[0].geometry;
        assert_eq!(curve.positions.len(), 10);
        assert_eq!(curve.positions[0], Vec3::new(0.0, 0.0, 0.0));
        let last = curve.positions[9];
        assert!((last.x - 300.0).abs() < 1e-3 && (last.y - 300.0).abs() < 1e-3);
        assert_eq!(curve.colors.as_ref().unwrap()[3], PALETTE[0]);
    }

    #[test]
    fn control_polygon_is_an_overlay() {
        let mut scene = BezierScene::new().unwrap();
        let state = default_state(&scene);
        let meshes = scene.build_meshes(&state).unwrap();
        assert_eq!(meshes[0].layer, DrawLayer::Opaque);
        assert_eq!(meshes[1].layer, DrawLayer::Overlay);
        assert_eq!(meshes[1].geometry.positions.len(), 3);
    }

    #[test]
    fn point_count_follows_the_parameter() {
        let mut scene = BezierScene::new().unwrap();
        let state = default_state(&scene).with_scalar("points", 33.0);
        let meshes = scene.build_meshes(&state).unwrap();
        assert_eq!(meshes[0].geometry.element_count(), 33);
    }
}
