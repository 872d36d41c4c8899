use std::time::Instant;

use crate::assets::AssetSource;
use crate::backend::{
    BufferId, BufferKind, DisplaySurface, DrawCall, Rasterizer, Topology, UniformBinding,
    VertexFormat, VertexInput,
};
use crate::geometry::{GeometryBuffer, GeometryError, VertexStream};
use crate::math::Vec2;
use crate::params::{ParameterDescriptor, ParameterSet, ParameterValue, apply_command, apply_defaults};
use crate::program::{ProgramKey, ProgramManager, ShaderProgram};
use crate::scheduler::{CancellationToken, FrameMode, FrameScheduler, FrameTick};

use super::resize::sync_backing_size;
use super::texture::TextureSlots;
use super::{
    DrawContext, DrawLayer, Mesh, Scene, SessionError, SessionState, TransformState, UniformSet,
};

/// Placeholder pixel shown until a texture's asset arrives.
pub const DEFAULT_PLACEHOLDER: [u8; 4] = [0, 0, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub frame_mode: FrameMode,
    pub placeholder: [u8; 4],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_mode: FrameMode::OnDemand,
            placeholder: DEFAULT_PLACEHOLDER,
        }
    }
}

/// Outcome of one drawn frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawReport {
    /// The backing store was resized to the display size before drawing.
    pub resized: bool,
    pub draw_calls: usize,
}

/// A mesh uploaded to vertex/index buffers.
struct GpuMesh {
    program: ProgramKey,
    inputs: Vec<VertexInput>,
    index: Option<BufferId>,
    element_count: u32,
    topology: Topology,
    layer: DrawLayer,
}

impl GpuMesh {
    fn buffers(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.inputs.iter().map(|i| i.buffer).chain(self.index)
    }
}

/// Hosts one [`Scene`] on one backend.
///
/// Owns every GPU handle it creates. Compiles programs and uploads geometry
/// and textures at `initialize`, draws frames when the scheduler releases
/// them, and frees everything exactly once at `dispose` (or drop).
pub struct RenderSession<G: Rasterizer + DisplaySurface, S: Scene> {
    backend: G,
    scene: S,
    config: SessionConfig,
    state: SessionState,

    programs: ProgramManager,
    program_keys: Vec<ProgramKey>,
    meshes: Vec<GpuMesh>,
    textures: TextureSlots,

    parameters: ParameterSet,
    transform: TransformState,
    rebuild_pending: bool,

    scheduler: FrameScheduler,
}

impl<G: Rasterizer + DisplaySurface, S: Scene> RenderSession<G, S> {
    pub fn new(backend: G, scene: S, config: SessionConfig) -> Self {
        let transform = scene.initial_state();
        Self {
            backend,
            scene,
            config,
            state: SessionState::Uninitialized,
            programs: ProgramManager::new(),
            program_keys: Vec::new(),
            meshes: Vec::new(),
            textures: TextureSlots::default(),
            parameters: ParameterSet::default(),
            transform,
            rebuild_pending: false,
            scheduler: FrameScheduler::new(config.frame_mode),
        }
    }

    /// Compiles every program, uploads geometry and starts texture loads.
    ///
    /// On failure every handle created so far is released and the session
    /// stays uninitialized.
    pub fn initialize(&mut self, assets: &dyn AssetSource) -> Result<(), SessionError> {
        self.expect_state("initialize", SessionState::Uninitialized)?;

        if let Err(err) = self.create_resources(assets) {
            log::error!("session `{}` failed to initialize: {err}", self.scene.name());
            self.release_resources();
            return Err(err);
        }

        self.state = SessionState::Ready;
        self.scheduler.request_redraw();
        log::info!(
            "session `{}` ready: {} programs, {} meshes, {} textures",
            self.scene.name(),
            self.programs.len(),
            self.meshes.len(),
            self.textures.handles().len()
        );
        Ok(())
    }

    fn create_resources(&mut self, assets: &dyn AssetSource) -> Result<(), SessionError> {
        self.parameters = ParameterSet::new(self.scene.parameters())?;
        self.transform = self.scene.initial_state();
        apply_defaults(&mut self.transform, self.parameters.describe());

        for source in self.scene.programs() {
            let key = self.programs.compile_and_link(&mut self.backend, source)?;
            self.program_keys.push(key);
        }

        self.meshes = self.upload_meshes()?;

        for id in self.scene.textures() {
            self.textures
                .request(&mut self.backend, assets, *id, self.config.placeholder)?;
        }
        Ok(())
    }

    /// Draws one frame at `tick`.
    pub fn draw(&mut self, tick: FrameTick) -> Result<DrawReport, SessionError> {
        self.expect_state("draw", SessionState::Ready)?;
        self.state = SessionState::Drawing;
        let result = self.draw_frame(tick);
        self.state = SessionState::Ready;
        if let Err(err) = &result {
            log::warn!("frame {} of `{}` failed: {err}", tick.frame_index, self.scene.name());
        }
        result
    }

    fn draw_frame(&mut self, tick: FrameTick) -> Result<DrawReport, SessionError> {
        let resized = sync_backing_size(&mut self.backend);

        // The old meshes stay until the rebuild succeeds; a failed rebuild is
        // retried on the next frame.
        if self.rebuild_pending {
            let meshes = self.upload_meshes()?;
            self.release_meshes();
            self.meshes = meshes;
            self.rebuild_pending = false;
        }

        let size = self.backend.backing_size();
        self.backend.begin_frame(size, self.scene.clear_color())?;
        let submitted = self.submit_draws(tick);
        let ended = self.backend.end_frame();
        let draw_calls = submitted?;
        ended?;

        Ok(DrawReport {
            resized,
            draw_calls,
        })
    }

    fn submit_draws(&mut self, tick: FrameTick) -> Result<usize, SessionError> {
        let ctx = DrawContext {
            state: &self.transform,
            tick,
            size: self.backend.backing_size(),
            textures: self.textures.handles(),
        };

        let mut draw_calls = 0;
        for layer in [DrawLayer::Opaque, DrawLayer::Overlay] {
            for (index, mesh) in self.meshes.iter().enumerate() {
                if mesh.layer != layer || mesh.element_count == 0 {
                    continue;
                }
                let program = self.programs.get(mesh.program).ok_or_else(|| {
                    SessionError::Scene(format!("mesh {index} has no program"))
                })?;
                for uniforms in self.scene.draws(&ctx, index) {
                    let call = draw_call(program, mesh, &uniforms)?;
                    self.backend.draw(&call)?;
                    draw_calls += 1;
                }
            }
        }
        Ok(draw_calls)
    }

    /// Delivers finished asset loads, then draws every frame the scheduler
    /// releases at `now`. Returns the number of frames drawn.
    ///
    /// A disposed session draws nothing.
    pub fn pump(&mut self, now: Instant) -> Result<usize, SessionError> {
        match self.state {
            SessionState::Disposed => return Ok(0),
            SessionState::Ready => {}
            state => {
                return Err(SessionError::InvalidState {
                    operation: "pump",
                    state,
                });
            }
        }

        self.poll_assets()?;

        let mut frames = 0;
        match self.scheduler.mode() {
            FrameMode::Continuous => {
                if let Some(tick) = self.scheduler.poll(now) {
                    self.draw(tick)?;
                    frames = 1;
                }
            }
            FrameMode::OnDemand => {
                while let Some(tick) = self.scheduler.poll(now) {
                    self.draw(tick)?;
                    frames += 1;
                }
            }
        }
        Ok(frames)
    }

    /// Uploads textures whose assets arrived, requesting one redraw for each.
    /// Returns how many were uploaded. Does nothing unless ready.
    pub fn poll_assets(&mut self) -> Result<usize, SessionError> {
        if self.state != SessionState::Ready {
            return Ok(0);
        }
        let mut completed = 0;
        let scheduler = &mut self.scheduler;
        self.textures.poll(&mut self.backend, || {
            scheduler.request_redraw();
            completed += 1;
        })?;
        Ok(completed)
    }

    pub fn has_pending_assets(&self) -> bool {
        self.state == SessionState::Ready && self.textures.pending() > 0
    }

    /// Validates `value`, writes it into the transform state and schedules a
    /// redraw. Out-of-range values are rejected, never clamped.
    pub fn set_parameter(&mut self, label: &str, value: ParameterValue) -> Result<(), SessionError> {
        self.expect_state("set a parameter", SessionState::Ready)?;
        let descriptor = self.parameters.validate(label, &value)?;
        let command = descriptor.command;

        apply_command(&mut self.transform, &command, &value);
        if command.rebuild_geometry {
            self.rebuild_pending = true;
        }
        log::debug!("parameter `{label}` = {value}");
        self.scheduler.request_redraw();
        Ok(())
    }

    /// Parameter descriptors in declaration order. Empty before `initialize`.
    pub fn describe(&self) -> &[ParameterDescriptor] {
        self.parameters.describe()
    }

    /// Records the pointer position, normalized to `[0, 1]`. Ignored once
    /// disposed.
    pub fn set_pointer(&mut self, position: Vec2) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.transform.pointer = Some(Vec2::new(
            position.x.clamp(0.0, 1.0),
            position.y.clamp(0.0, 1.0),
        ));
    }

    pub fn clear_pointer(&mut self) {
        if self.state != SessionState::Disposed {
            self.transform.pointer = None;
        }
    }

    pub fn request_redraw(&mut self) {
        self.scheduler.request_redraw();
    }

    /// Whether the host should schedule a frame.
    pub fn wants_frame(&self) -> bool {
        self.state == SessionState::Ready && self.scheduler.wants_frame()
    }

    pub fn pending_frames(&self) -> u32 {
        self.scheduler.pending_frames()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.scheduler.token()
    }

    /// Releases every GPU handle and stops scheduling. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.scheduler.cancel();
        self.release_resources();
        self.state = SessionState::Disposed;
        log::info!("session `{}` disposed", self.scene.name());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn backend(&self) -> &G {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut G {
        &mut self.backend
    }

    pub fn program(&self, index: usize) -> Option<&ShaderProgram> {
        self.program_keys
            .get(index)
            .and_then(|key| self.programs.get(*key))
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Builds and uploads the scene's meshes. Nothing stays allocated on
    /// failure.
    fn upload_meshes(&mut self) -> Result<Vec<GpuMesh>, SessionError> {
        let meshes = self.scene.build_meshes(&self.transform)?;
        let mut uploaded = Vec::with_capacity(meshes.len());
        for mesh in &meshes {
            match self.upload_mesh(mesh) {
                Ok(gpu) => uploaded.push(gpu),
                Err(err) => {
                    for buffer in uploaded.iter().flat_map(|m| m.buffers()) {
                        self.backend.delete_buffer(buffer);
                    }
                    return Err(err);
                }
            }
        }
        Ok(uploaded)
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<GpuMesh, SessionError> {
        mesh.geometry.validate()?;
        let key = self.program_keys.get(mesh.program).copied().ok_or_else(|| {
            SessionError::Scene(format!("mesh refers to unknown program {}", mesh.program))
        })?;
        let program = self
            .programs
            .get(key)
            .ok_or_else(|| SessionError::Scene(format!("program {key:?} missing")))?;

        let mut locations = Vec::with_capacity(mesh.attributes.len());
        for (name, stream) in &mesh.attributes {
            let location = program.attribute(name).ok_or_else(|| {
                SessionError::Scene(format!(
                    "attribute `{name}` not declared by program `{}`",
                    program.name()
                ))
            })?;
            locations.push((location, *stream));
        }

        let mut gpu = GpuMesh {
            program: key,
            inputs: Vec::with_capacity(locations.len()),
            index: None,
            element_count: mesh.geometry.element_count() as u32,
            topology: mesh.topology,
            layer: mesh.layer,
        };
        // Pushed as they are created so a failure part way can free them.
        let result = (|| -> Result<(), SessionError> {
            for (location, stream) in locations {
                let (format, bytes) = stream_bytes(&mesh.geometry, stream)?;
                let buffer = self.backend.create_buffer(BufferKind::Vertex, &bytes)?;
                gpu.inputs.push(VertexInput {
                    location,
                    buffer,
                    format,
                });
            }
            if let Some(indices) = &mesh.geometry.indices {
                gpu.index = Some(
                    self.backend
                        .create_buffer(BufferKind::Index, bytemuck::cast_slice(indices))?,
                );
            }
            Ok(())
        })();

        match result {
            Ok(()) => Ok(gpu),
            Err(err) => {
                for buffer in gpu.buffers() {
                    self.backend.delete_buffer(buffer);
                }
                Err(err)
            }
        }
    }

    fn release_meshes(&mut self) {
        for mesh in self.meshes.drain(..) {
            for buffer in mesh.buffers() {
                self.backend.delete_buffer(buffer);
            }
        }
    }

    fn release_resources(&mut self) {
        self.release_meshes();
        self.textures.release_all(&mut self.backend);
        self.programs.release_all(&mut self.backend);
        self.program_keys.clear();
    }
}

/// What a control surface sees of a session: the descriptor list and a way
/// to set values.
pub trait ParameterTarget {
    fn describe(&self) -> &[ParameterDescriptor];

    fn set_parameter(&mut self, label: &str, value: ParameterValue) -> Result<(), SessionError>;
}

impl<G: Rasterizer + DisplaySurface, S: Scene> ParameterTarget for RenderSession<G, S> {
    fn describe(&self) -> &[ParameterDescriptor] {
        RenderSession::describe(self)
    }

    fn set_parameter(&mut self, label: &str, value: ParameterValue) -> Result<(), SessionError> {
        RenderSession::set_parameter(self, label, value)
    }
}

impl<G: Rasterizer + DisplaySurface, S: Scene> Drop for RenderSession<G, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn stream_bytes(
    geometry: &GeometryBuffer,
    stream: VertexStream,
) -> Result<(VertexFormat, Vec<u8>), GeometryError> {
    let missing = || GeometryError::MissingStream(stream);
    Ok(match stream {
        VertexStream::Position => (
            VertexFormat::Float32x3,
            bytemuck::cast_slice(&geometry.positions).to_vec(),
        ),
        VertexStream::Normal => {
            let normals = geometry.normals.as_ref().ok_or_else(missing)?;
            (VertexFormat::Float32x3, bytemuck::cast_slice(normals).to_vec())
        }
        VertexStream::FaceNormal => {
            let normals = geometry.face_normals.as_ref().ok_or_else(missing)?;
            (VertexFormat::Float32x3, bytemuck::cast_slice(normals).to_vec())
        }
        VertexStream::Color => {
            let colors = geometry.colors.as_ref().ok_or_else(missing)?;
            (VertexFormat::Unorm8x4, bytemuck::cast_slice(colors).to_vec())
        }
        VertexStream::Texcoord => {
            let uvs = geometry.texcoords.as_ref().ok_or_else(missing)?;
            (VertexFormat::Float32x2, bytemuck::cast_slice(uvs).to_vec())
        }
    })
}

fn draw_call(
    program: &ShaderProgram,
    mesh: &GpuMesh,
    uniforms: &UniformSet,
) -> Result<DrawCall, SessionError> {
    let mut bindings = Vec::with_capacity(uniforms.len());
    for (name, value) in uniforms.iter() {
        let location = program.uniform(name).ok_or_else(|| {
            SessionError::Scene(format!(
                "uniform `{name}` not declared by program `{}`",
                program.name()
            ))
        })?;
        bindings.push(UniformBinding {
            name: name.to_string(),
            location,
            value: *value,
        });
    }
    Ok(DrawCall {
        program: program.handle(),
        vertex_inputs: mesh.inputs.clone(),
        uniforms: bindings,
        topology: mesh.topology,
        index_buffer: mesh.index,
        element_count: mesh.element_count,
    })
}
