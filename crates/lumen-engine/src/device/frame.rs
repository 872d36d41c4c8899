use crate::backend::SurfaceSize;

/// Represents a single acquired frame.
///
/// Short-lived: holding the surface texture prevents acquisition of the next
/// frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// A draw call resolved to GPU objects, replayed at `end_frame`.
pub(crate) struct PreparedDraw {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_groups: Vec<wgpu::BindGroup>,
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub index_buffer: Option<wgpu::Buffer>,
    pub element_count: u32,
}

/// Frame between `begin_frame` and `end_frame`.
pub(crate) struct PendingFrame {
    pub size: SurfaceSize,
    pub clear: [f32; 4],
    pub draws: Vec<PreparedDraw>,
}
