use std::collections::HashMap;

use super::mip::mip_chain;
use super::shader::{self, CompiledShader, ProgramInterface};
use super::types::{
    BufferId, BufferKind, DrawCall, Image, ProgramId, ShaderId, ShaderStage, SurfaceSize,
    TextureId, UniformLocation,
};
use super::validate::{unknown, validate_draw};
use super::{BackendError, DisplaySurface, Rasterizer};

/// Initial backing-store size, before the first resize.
const DEFAULT_BACKING: SurfaceSize = SurfaceSize::new(300, 150);

/// One frame as submitted between `begin_frame` and `end_frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub size: SurfaceSize,
    pub clear: [f32; 4],
    pub draws: Vec<DrawCall>,
}

/// Live handle counts per kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct HandleCounts {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
    pub textures: usize,
}

impl HandleCounts {
    pub fn total(&self) -> usize {
        self.shaders + self.programs + self.buffers + self.textures
    }
}

struct ShaderSlot {
    stage: ShaderStage,
    compiled: Option<CompiledShader>,
}

/// Backend without a GPU.
///
/// Shaders go through the same WGSL front-end as the wgpu backend, so compile
/// and link failures behave identically. Draws are validated and recorded
/// instead of rasterized. Context loss and display resizes can be simulated.
pub struct HeadlessBackend {
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderSlot>,
    programs: HashMap<ProgramId, Option<ProgramInterface>>,
    buffers: HashMap<BufferId, BufferKind>,
    textures: HashMap<TextureId, Vec<Image>>,

    current: Option<RecordedFrame>,
    frames: Vec<RecordedFrame>,

    context_lost: bool,
    backing: SurfaceSize,
    display: SurfaceSize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BACKING)
    }
}

impl HeadlessBackend {
    /// Backend displayed at `display`, with a default-sized backing store.
    pub fn new(display: SurfaceSize) -> Self {
        Self {
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            current: None,
            frames: Vec::new(),
            context_lost: false,
            backing: DEFAULT_BACKING,
            display,
        }
    }

    pub fn set_display_size(&mut self, size: SurfaceSize) {
        self.display = size;
    }

    /// Every later create/compile/link/frame call fails with
    /// `ContextUnavailable` until `restore_context`.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    pub fn restore_context(&mut self) {
        self.context_lost = false;
    }

    pub fn handle_counts(&self) -> HandleCounts {
        HandleCounts {
            shaders: self.shaders.len(),
            programs: self.programs.len(),
            buffers: self.buffers.len(),
            textures: self.textures.len(),
        }
    }

    pub fn live_handles(&self) -> usize {
        self.handle_counts().total()
    }

    /// Completed frames, oldest first.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// Uploaded levels of `texture`, base level first.
    pub fn texture_levels(&self, texture: TextureId) -> Option<&[Image]> {
        self.textures.get(&texture).map(Vec::as_slice)
    }

    pub fn program_interface(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.programs.get(&program).and_then(Option::as_ref)
    }

    fn alive(&self) -> Result<(), BackendError> {
        if self.context_lost {
            Err(BackendError::ContextUnavailable)
        } else {
            Ok(())
        }
    }

    fn compiled(&self, shader: ShaderId) -> Result<&CompiledShader, BackendError> {
        let slot = self.shaders.get(&shader).ok_or(unknown("shader", shader.0))?;
        slot.compiled.as_ref().ok_or_else(|| BackendError::Link {
            log: format!("{shader} is not compiled"),
        })
    }

    fn allocate(&mut self) -> Result<u32, BackendError> {
        self.alive()?;
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}

impl Rasterizer for HeadlessBackend {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, BackendError> {
        let id = ShaderId(self.allocate()?);
        self.shaders.insert(
            id,
            ShaderSlot {
                stage,
                compiled: None,
            },
        );
        Ok(id)
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Result<(), BackendError> {
        self.alive()?;
        let slot = self
            .shaders
            .get_mut(&shader)
            .ok_or(unknown("shader", shader.0))?;
        slot.compiled = None;
        let compiled =
            shader::compile(slot.stage, source).map_err(|log| BackendError::Compile { log })?;
        slot.compiled = Some(compiled);
        Ok(())
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Result<ProgramId, BackendError> {
        let id = ProgramId(self.allocate()?);
        self.programs.insert(id, None);
        Ok(id)
    }

    fn link_program(
        &mut self,
        program: ProgramId,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<(), BackendError> {
        self.alive()?;
        if !self.programs.contains_key(&program) {
            return Err(unknown("program", program.0));
        }
        let interface = shader::link(self.compiled(vertex)?, self.compiled(fragment)?)
            .map_err(|log| BackendError::Link { log })?;
        self.programs.insert(program, Some(interface));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.program_interface(program)?.attributes.get(name).copied()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.program_interface(program)?.uniform_location(name)
    }

    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, BackendError> {
        let id = BufferId(self.allocate()?);
        log::trace!("headless: {id} holds {} bytes", data.len());
        self.buffers.insert(id, kind);
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let id = TextureId(self.allocate()?);
        self.textures.insert(id, Vec::new());
        Ok(id)
    }

    fn upload_texture(&mut self, texture: TextureId, image: &Image) -> Result<(), BackendError> {
        self.alive()?;
        let levels = self
            .textures
            .get_mut(&texture)
            .ok_or(unknown("texture", texture.0))?;
        *levels = vec![image.clone()];
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), BackendError> {
        self.alive()?;
        let levels = self
            .textures
            .get_mut(&texture)
            .ok_or(unknown("texture", texture.0))?;
        let Some(base) = levels.first() else {
            return Err(BackendError::Frame(format!("{texture} has no base level")));
        };
        *levels = mip_chain(base);
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn begin_frame(&mut self, size: SurfaceSize, clear: [f32; 4]) -> Result<(), BackendError> {
        self.alive()?;
        if self.current.is_some() {
            return Err(BackendError::Frame("frame already in progress".to_string()));
        }
        self.current = Some(RecordedFrame {
            size,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.alive()?;
        let Some(frame) = self.current.as_mut() else {
            return Err(BackendError::Frame("draw outside of a frame".to_string()));
        };
        let interface = match self.programs.get(&call.program) {
            Some(Some(interface)) => interface,
            Some(None) => {
                return Err(BackendError::Frame(format!("{} is not linked", call.program)));
            }
            None => return Err(unknown("program", call.program.0)),
        };
        validate_draw(
            call,
            interface,
            |b| self.buffers.get(&b).copied(),
            |t| self.textures.contains_key(&t),
        )?;
        frame.draws.push(call.clone());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let frame = self
            .current
            .take()
            .ok_or_else(|| BackendError::Frame("no frame in progress".to_string()))?;
        self.frames.push(frame);
        Ok(())
    }
}

impl DisplaySurface for HeadlessBackend {
    fn backing_size(&self) -> SurfaceSize {
        self.backing
    }

    fn display_size(&self) -> SurfaceSize {
        self.display
    }

    fn set_backing_size(&mut self, size: SurfaceSize) {
        self.backing = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::shader::tests::{BROKEN_FS, FS, VS};
    use crate::backend::{Topology, UniformBinding, UniformValue, VertexFormat, VertexInput};
    use crate::math::{Mat4, Vec4};

    fn linked(backend: &mut HeadlessBackend) -> ProgramId {
        let vs = backend.create_shader(ShaderStage::Vertex).unwrap();
        let fs = backend.create_shader(ShaderStage::Fragment).unwrap();
        backend.compile_shader(vs, VS).unwrap();
        backend.compile_shader(fs, FS).unwrap();
        let program = backend.create_program().unwrap();
        backend.link_program(program, vs, fs).unwrap();
        backend.delete_shader(vs);
        backend.delete_shader(fs);
        program
    }

    fn draw_call(backend: &mut HeadlessBackend, program: ProgramId) -> DrawCall {
        let positions = backend.create_buffer(BufferKind::Vertex, &[0; 36]).unwrap();
        let colors = backend.create_buffer(BufferKind::Vertex, &[0; 48]).unwrap();
        let matrix = backend.uniform_location(program, "u_matrix").unwrap();
        let tint = backend.uniform_location(program, "u_tint").unwrap();
        let uniform = |name: &str, location, value| UniformBinding {
            name: name.to_string(),
            location,
            value,
        };
        DrawCall {
            program,
            vertex_inputs: vec![
                VertexInput {
                    location: 0,
                    buffer: positions,
                    format: VertexFormat::Float32x3,
                },
                VertexInput {
                    location: 1,
                    buffer: colors,
                    format: VertexFormat::Float32x4,
                },
            ],
            uniforms: vec![
                uniform("u_matrix", matrix, UniformValue::Mat4(Mat4::identity())),
                uniform("u_tint", tint, UniformValue::Vec4(Vec4::new(1.0, 1.0, 1.0, 1.0))),
            ],
            topology: Topology::Triangles,
            index_buffer: None,
            element_count: 3,
        }
    }

    // ── programs ──────────────────────────────────────────────────────────

    #[test]
    fn link_exposes_locations() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        assert_eq!(backend.attribute_location(program, "a_color"), Some(1));
        assert!(backend.uniform_location(program, "u_tint").is_some());
        assert_eq!(backend.attribute_location(program, "missing"), None);
        assert_eq!(backend.handle_counts().shaders, 0);
    }

    #[test]
    fn compile_failure_carries_log() {
        let mut backend = HeadlessBackend::default();
        let fs = backend.create_shader(ShaderStage::Fragment).unwrap();
        match backend.compile_shader(fs, BROKEN_FS) {
            Err(BackendError::Compile { log }) => assert!(!log.is_empty()),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn link_requires_compiled_shaders() {
        let mut backend = HeadlessBackend::default();
        let vs = backend.create_shader(ShaderStage::Vertex).unwrap();
        let fs = backend.create_shader(ShaderStage::Fragment).unwrap();
        let program = backend.create_program().unwrap();
        assert!(matches!(
            backend.link_program(program, vs, fs),
            Err(BackendError::Link { .. })
        ));
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn records_valid_draws() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let call = draw_call(&mut backend, program);

        backend.begin_frame(SurfaceSize::new(10, 10), [0.0; 4]).unwrap();
        backend.draw(&call).unwrap();
        backend.end_frame().unwrap();

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(frame.size, SurfaceSize::new(10, 10));
    }

    #[test]
    fn draw_outside_frame_fails() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let call = draw_call(&mut backend, program);
        assert!(matches!(backend.draw(&call), Err(BackendError::Frame(_))));
    }

    #[test]
    fn draw_rejects_missing_uniform() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let mut call = draw_call(&mut backend, program);
        call.uniforms.pop();

        backend.begin_frame(SurfaceSize::new(1, 1), [0.0; 4]).unwrap();
        assert!(matches!(
            backend.draw(&call),
            Err(BackendError::UniformMismatch { .. })
        ));
    }

    #[test]
    fn draw_rejects_wrong_uniform_type() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let mut call = draw_call(&mut backend, program);
        call.uniforms[1].value = UniformValue::Float(1.0);

        backend.begin_frame(SurfaceSize::new(1, 1), [0.0; 4]).unwrap();
        assert!(matches!(
            backend.draw(&call),
            Err(BackendError::UniformMismatch { .. })
        ));
    }

    #[test]
    fn draw_rejects_missing_attribute() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let mut call = draw_call(&mut backend, program);
        call.vertex_inputs.truncate(1);

        backend.begin_frame(SurfaceSize::new(1, 1), [0.0; 4]).unwrap();
        assert!(matches!(backend.draw(&call), Err(BackendError::Frame(_))));
    }

    // ── resources ─────────────────────────────────────────────────────────

    #[test]
    fn handles_are_counted_and_released() {
        let mut backend = HeadlessBackend::default();
        let program = linked(&mut backend);
        let buffer = backend.create_buffer(BufferKind::Index, &[0; 12]).unwrap();
        let texture = backend.create_texture().unwrap();
        assert_eq!(backend.live_handles(), 3);

        backend.delete_program(program);
        backend.delete_buffer(buffer);
        backend.delete_texture(texture);
        backend.delete_texture(texture);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn mipmaps_build_full_chain() {
        let mut backend = HeadlessBackend::default();
        let texture = backend.create_texture().unwrap();
        backend.upload_texture(texture, &Image::solid(4, 4, [1, 2, 3, 4])).unwrap();
        backend.generate_mipmaps(texture).unwrap();
        assert_eq!(backend.texture_levels(texture).unwrap().len(), 3);
    }

    #[test]
    fn lost_context_refuses_work() {
        let mut backend = HeadlessBackend::default();
        backend.lose_context();
        assert_eq!(
            backend.create_shader(ShaderStage::Vertex),
            Err(BackendError::ContextUnavailable)
        );
        backend.restore_context();
        assert!(backend.create_shader(ShaderStage::Vertex).is_ok());
    }

    #[test]
    fn backing_store_starts_at_default_size() {
        let mut backend = HeadlessBackend::new(SurfaceSize::new(640, 480));
        assert_eq!(backend.backing_size(), SurfaceSize::new(300, 150));
        backend.set_backing_size(SurfaceSize::new(640, 480));
        assert_eq!(backend.backing_size(), backend.display_size());
    }
}
