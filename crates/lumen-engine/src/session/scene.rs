use std::collections::BTreeMap;

use crate::backend::{SurfaceSize, TextureId, Topology, UniformValue};
use crate::geometry::{GeometryBuffer, GeometryError, VertexStream};
use crate::math::Vec2;
use crate::params::ParameterDescriptor;
use crate::program::ProgramSource;
use crate::scheduler::FrameTick;

use super::TransformState;

/// Draw pass a mesh belongs to. Opaque meshes are drawn before overlays.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DrawLayer {
    #[default]
    Opaque,
    Overlay,
}

/// Geometry plus how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Index into [`Scene::programs`].
    pub program: usize,
    pub geometry: GeometryBuffer,
    /// Attribute name to geometry stream.
    pub attributes: Vec<(&'static str, VertexStream)>,
    pub topology: Topology,
    pub layer: DrawLayer,
}

impl Mesh {
    pub fn new(program: usize, geometry: GeometryBuffer) -> Self {
        Self {
            program,
            geometry,
            attributes: Vec::new(),
            topology: Topology::Triangles,
            layer: DrawLayer::Opaque,
        }
    }

    pub fn with_attribute(mut self, name: &'static str, stream: VertexStream) -> Self {
        self.attributes.push((name, stream));
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_layer(mut self, layer: DrawLayer) -> Self {
        self.layer = layer;
        self
    }
}

/// Uniform values for one draw call, by uniform name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        self.set(name, value);
        self
    }

    /// Sets or replaces `name`.
    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> + '_ {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything a scene may read while computing uniforms.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub state: &'a TransformState,
    pub tick: FrameTick,
    /// Backing-store size the frame renders at.
    pub size: SurfaceSize,
    pub textures: &'a BTreeMap<&'static str, TextureId>,
}

impl DrawContext<'_> {
    pub fn texture(&self, id: &str) -> Option<TextureId> {
        self.textures.get(id).copied()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.state.pointer
    }
}

/// Content hosted by a [`RenderSession`](super::RenderSession).
pub trait Scene {
    fn name(&self) -> &'static str;

    /// Programs the scene draws with, compiled once per session.
    fn programs(&self) -> &[ProgramSource];

    /// State before parameter defaults are applied.
    fn initial_state(&self) -> TransformState {
        TransformState::default()
    }

    /// Tunable parameters, in display order.
    fn parameters(&self) -> Vec<ParameterDescriptor> {
        Vec::new()
    }

    /// Builds every mesh from the current state. Called at initialization and
    /// after any parameter whose command requests a rebuild.
    fn build_meshes(&mut self, state: &TransformState) -> Result<Vec<Mesh>, GeometryError>;

    /// Asset ids to load as textures.
    fn textures(&self) -> &[&'static str] {
        &[]
    }

    fn clear_color(&self) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    /// Uniform sets for mesh `mesh`; each set is one draw call.
    fn draws(&self, ctx: &DrawContext<'_>, mesh: usize) -> Vec<UniformSet>;
}

impl<S: Scene + ?Sized> Scene for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn programs(&self) -> &[ProgramSource] {
        (**self).programs()
    }

    fn initial_state(&self) -> TransformState {
        (**self).initial_state()
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        (**self).parameters()
    }

    fn build_meshes(&mut self, state: &TransformState) -> Result<Vec<Mesh>, GeometryError> {
        (**self).build_meshes(state)
    }

    fn textures(&self) -> &[&'static str] {
        (**self).textures()
    }

    fn clear_color(&self) -> [f32; 4] {
        (**self).clear_color()
    }

    fn draws(&self, ctx: &DrawContext<'_>, mesh: usize) -> Vec<UniformSet> {
        (**self).draws(ctx, mesh)
    }
}
