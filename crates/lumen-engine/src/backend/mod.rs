//! GPU and display capabilities consumed by sessions.
//!
//! This module is responsible for:
//! - the `Rasterizer` and `DisplaySurface` traits
//! - handle, uniform and draw-call types shared by every backend
//! - the WGSL front-end (`shader`) and CPU mip generation (`mip`)
//! - `HeadlessBackend`, a recording implementation used by tests and tools
//!
//! The wgpu implementation lives in [`crate::device`].

mod headless;
pub mod mip;
pub mod shader;
mod types;
pub(crate) mod validate;

pub use headless::{HandleCounts, HeadlessBackend, RecordedFrame};
pub use types::{
    BufferId, BufferKind, DrawCall, Filter, Image, ProgramId, SamplerState, ShaderId, ShaderStage,
    SurfaceSize, TextureId, Topology, UniformBinding, UniformKind, UniformLocation, UniformValue,
    VertexFormat, VertexInput, Wrap,
};

/// Errors reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The GPU context is gone (device lost, surface never created).
    #[error("GPU context unavailable")]
    ContextUnavailable,

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("shader compilation failed:\n{log}")]
    Compile { log: String },

    #[error("program link failed:\n{log}")]
    Link { log: String },

    #[error("uniform `{name}` mismatch: {reason}")]
    UniformMismatch { name: String, reason: String },

    #[error("image {width}x{height} does not match {len} bytes of RGBA8")]
    InvalidImage { width: u32, height: u32, len: usize },

    #[error("invalid draw: {0}")]
    Frame(String),

    #[error("surface error: {0}")]
    Surface(String),
}

/// GPU rasterization capability.
///
/// Handles are owned by the caller and must be released explicitly; deleting an
/// unknown handle is a no-op. Draws are only valid between `begin_frame` and
/// `end_frame`.
pub trait Rasterizer {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, BackendError>;

    /// Compiles `source` into `shader`. Failures are `BackendError::Compile`
    /// carrying the info log.
    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Result<(), BackendError>;

    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Result<ProgramId, BackendError>;

    /// Links two compiled shaders into `program`. Failures are
    /// `BackendError::Link` carrying the info log.
    fn link_program(
        &mut self,
        program: ProgramId,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<(), BackendError>;

    fn delete_program(&mut self, program: ProgramId);

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, BackendError>;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn create_texture(&mut self) -> Result<TextureId, BackendError>;

    /// Replaces the texture's base level. Previously generated mips are dropped.
    fn upload_texture(&mut self, texture: TextureId, image: &Image) -> Result<(), BackendError>;

    /// Builds the full mip chain from the base level.
    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), BackendError>;

    fn delete_texture(&mut self, texture: TextureId);

    /// Starts a frame: sets the viewport to `size` and clears color and depth.
    fn begin_frame(&mut self, size: SurfaceSize, clear: [f32; 4]) -> Result<(), BackendError>;

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError>;

    fn end_frame(&mut self) -> Result<(), BackendError>;
}

/// Display surface capability: a backing store that may lag behind the size
/// the surface is displayed at.
pub trait DisplaySurface {
    fn backing_size(&self) -> SurfaceSize;

    fn display_size(&self) -> SurfaceSize;

    fn set_backing_size(&mut self, size: SurfaceSize);
}
