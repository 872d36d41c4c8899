use std::collections::HashMap;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::backend::mip::mip_chain;
use crate::backend::shader::{self, CompiledShader};
use crate::backend::validate::{unknown, validate_draw};
use crate::backend::{
    BackendError, BufferId, BufferKind, DisplaySurface, DrawCall, Image, ProgramId, Rasterizer,
    SamplerState, ShaderId, ShaderStage, SurfaceSize, TextureId, UniformBinding, UniformLocation,
    UniformValue,
};

use super::frame::{PendingFrame, PreparedDraw};
use super::pipeline::{self, DEPTH_FORMAT, GpuProgram, PipelineKey};
use super::{Gpu, GpuInit, SurfaceErrorAction};

struct ShaderSlot {
    stage: ShaderStage,
    compiled: Option<(CompiledShader, wgpu::ShaderModule)>,
}

struct GpuBuffer {
    kind: BufferKind,
    buffer: wgpu::Buffer,
}

/// A texture handle. The GPU texture exists once an image is uploaded.
#[derive(Default)]
struct GpuTexture {
    base: Option<Image>,
    view: Option<wgpu::TextureView>,
}

struct DepthTarget {
    size: PhysicalSize<u32>,
    view: wgpu::TextureView,
}

/// Owned bind group resource, borrowed by `wgpu::BindGroupEntry`.
enum Bound {
    Buffer(wgpu::Buffer),
    View(wgpu::TextureView),
    Sampler(wgpu::Sampler),
}

/// [`Rasterizer`] and [`DisplaySurface`] on top of wgpu and a winit window.
///
/// Draws are validated and resolved to pipelines and bind groups as they are
/// submitted, then replayed in a single render pass at `end_frame`.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    window: &'w Window,

    next_id: u32,
    shaders: HashMap<ShaderId, ShaderSlot>,
    programs: HashMap<ProgramId, Option<GpuProgram>>,
    buffers: HashMap<BufferId, GpuBuffer>,
    textures: HashMap<TextureId, GpuTexture>,
    samplers: HashMap<SamplerState, wgpu::Sampler>,

    depth: Option<DepthTarget>,
    frame: Option<PendingFrame>,
}

impl<'w> WgpuBackend<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;
        Ok(Self {
            gpu,
            window,
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            depth: None,
            frame: None,
        })
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn window(&self) -> &'w Window {
        self.window
    }

    fn alive(&self) -> Result<(), BackendError> {
        if self.gpu.is_lost() {
            Err(BackendError::ContextUnavailable)
        } else {
            Ok(())
        }
    }

    fn allocate(&mut self) -> Result<u32, BackendError> {
        self.alive()?;
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn compiled(&self, shader: ShaderId) -> Result<&(CompiledShader, wgpu::ShaderModule), BackendError> {
        let slot = self.shaders.get(&shader).ok_or(unknown("shader", shader.0))?;
        slot.compiled.as_ref().ok_or_else(|| BackendError::Link {
            log: format!("{shader} is not compiled"),
        })
    }

    /// Recreates the texture with `levels` (base level first).
    fn write_levels(&mut self, texture: TextureId, levels: &[Image]) -> Result<(), BackendError> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or(unknown("texture", texture.0))?;
        let Some(base) = levels.first() else {
            return Err(BackendError::Frame(format!("{texture} has no base level")));
        };

        let gpu_texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen texture"),
            size: wgpu::Extent3d {
                width: base.width(),
                height: base.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, image) in levels.iter().enumerate() {
            self.gpu.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu_texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width()),
                    rows_per_image: Some(image.height()),
                },
                wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        entry.view = Some(gpu_texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(())
    }

    fn prepare(&mut self, call: &DrawCall) -> Result<PreparedDraw, BackendError> {
        let color_format = self.gpu.surface_format();
        let program = match self.programs.get_mut(&call.program) {
            Some(Some(program)) => program,
            Some(None) => {
                return Err(BackendError::Frame(format!("{} is not linked", call.program)));
            }
            None => return Err(unknown("program", call.program.0)),
        };
        validate_draw(
            call,
            &program.interface,
            |b| self.buffers.get(&b).map(|g| g.kind),
            |t| self.textures.contains_key(&t),
        )?;

        let key = PipelineKey::for_call(call);
        let pipeline = program.pipeline(self.gpu.device(), &key, color_format);
        let layouts = program.group_layouts.clone();

        let mut bind_groups = Vec::with_capacity(layouts.len());
        for (group, layout) in layouts.iter().enumerate() {
            let bindings = call
                .uniforms
                .iter()
                .filter(|u| u.location.group as usize == group);
            bind_groups.push(self.bind_group(layout, bindings)?);
        }

        let mut vertex_buffers = Vec::with_capacity(call.vertex_inputs.len());
        for input in &call.vertex_inputs {
            let buffer = self
                .buffers
                .get(&input.buffer)
                .ok_or(unknown("buffer", input.buffer.0))?;
            vertex_buffers.push(buffer.buffer.clone());
        }
        let index_buffer = match call.index_buffer {
            Some(id) => Some(
                self.buffers
                    .get(&id)
                    .ok_or(unknown("buffer", id.0))?
                    .buffer
                    .clone(),
            ),
            None => None,
        };

        Ok(PreparedDraw {
            pipeline,
            bind_groups,
            vertex_buffers,
            index_buffer,
            element_count: call.element_count,
        })
    }

    fn bind_group<'a>(
        &mut self,
        layout: &wgpu::BindGroupLayout,
        bindings: impl Iterator<Item = &'a UniformBinding>,
    ) -> Result<wgpu::BindGroup, BackendError> {
        let mut bound = Vec::new();
        for binding in bindings {
            let UniformLocation { binding: slot, .. } = binding.location;
            let resource = match binding.value {
                UniformValue::Texture(texture) => {
                    let view = self
                        .textures
                        .get(&texture)
                        .and_then(|t| t.view.clone())
                        .ok_or_else(|| {
                            BackendError::Frame(format!("{texture} has no uploaded image"))
                        })?;
                    Bound::View(view)
                }
                UniformValue::Sampler(state) => {
                    let device = self.gpu.device();
                    let sampler = self
                        .samplers
                        .entry(state)
                        .or_insert_with(|| {
                            device.create_sampler(&pipeline::sampler_descriptor(&state))
                        })
                        .clone();
                    Bound::Sampler(sampler)
                }
                value => {
                    let mut bytes = value.to_bytes().unwrap_or_default();
                    bytes.resize(bytes.len().next_multiple_of(16), 0);
                    let buffer =
                        self.gpu
                            .device()
                            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some("lumen uniform"),
                                contents: &bytes,
                                usage: wgpu::BufferUsages::UNIFORM,
                            });
                    Bound::Buffer(buffer)
                }
            };
            bound.push((slot, resource));
        }
        bound.sort_by_key(|(slot, _)| *slot);

        let entries: Vec<wgpu::BindGroupEntry<'_>> = bound
            .iter()
            .map(|(slot, resource)| wgpu::BindGroupEntry {
                binding: *slot,
                resource: match resource {
                    Bound::Buffer(b) => b.as_entire_binding(),
                    Bound::View(v) => wgpu::BindingResource::TextureView(v),
                    Bound::Sampler(s) => wgpu::BindingResource::Sampler(s),
                },
            })
            .collect();

        Ok(self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen bind group"),
                layout,
                entries: &entries,
            }))
    }

    fn depth_view(&mut self) -> wgpu::TextureView {
        let size = self.gpu.size();
        if let Some(depth) = &self.depth
            && depth.size == size
        {
            return depth.view.clone();
        }
        let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen depth"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget {
            size,
            view: view.clone(),
        });
        view
    }

    fn present(&mut self, pending: PendingFrame) -> Result<(), BackendError> {
        let mut frame = match self.gpu.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::debug!("skipping frame: {message}");
                        Ok(())
                    }
                    SurfaceErrorAction::Fatal => Err(BackendError::Surface(message)),
                };
            }
        };
        let depth = self.depth_view();
        let surface = self.gpu.size();
        let [r, g, b, a] = pending.clear.map(f64::from);

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let width = pending.size.width.min(surface.width);
            let height = pending.size.height.min(surface.height);
            rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

            for draw in &pending.draws {
                rpass.set_pipeline(&draw.pipeline);
                for (group, bind_group) in draw.bind_groups.iter().enumerate() {
                    rpass.set_bind_group(group as u32, bind_group, &[]);
                }
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                match &draw.index_buffer {
                    Some(indices) => {
                        rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..draw.element_count, 0, 0..1);
                    }
                    None => rpass.draw(0..draw.element_count, 0..1),
                }
            }
        }

        self.gpu.submit(frame);
        log::trace!("presented {} draws", pending.draws.len());
        Ok(())
    }
}

impl Rasterizer for WgpuBackend<'_> {
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
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("lumen shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        slot.compiled = Some((compiled, module));
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
        let (vs, vs_module) = self.compiled(vertex)?;
        let (fs, fs_module) = self.compiled(fragment)?;
        let interface = shader::link(vs, fs).map_err(|log| BackendError::Link { log })?;
        let linked = GpuProgram::new(
            self.gpu.device(),
            interface,
            vs_module.clone(),
            fs_module.clone(),
        );
        self.programs.insert(program, Some(linked));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let program = self.programs.get(&program)?.as_ref()?;
        program.interface.attributes.get(name).copied()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(&program)?.as_ref()?;
        program.interface.uniform_location(name)
    }

    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> Result<BufferId, BackendError> {
        let id = BufferId(self.allocate()?);
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen geometry"),
                contents: data,
                usage,
            });
        self.buffers.insert(id, GpuBuffer { kind, buffer });
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let id = TextureId(self.allocate()?);
        self.textures.insert(id, GpuTexture::default());
        Ok(id)
    }

    fn upload_texture(&mut self, texture: TextureId, image: &Image) -> Result<(), BackendError> {
        self.alive()?;
        self.write_levels(texture, std::slice::from_ref(image))?;
        if let Some(entry) = self.textures.get_mut(&texture) {
            entry.base = Some(image.clone());
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), BackendError> {
        self.alive()?;
        let base = self
            .textures
            .get(&texture)
            .ok_or(unknown("texture", texture.0))?
            .base
            .as_ref()
            .ok_or_else(|| BackendError::Frame(format!("{texture} has no base level")))?;
        let levels = mip_chain(base);
        self.write_levels(texture, &levels)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn begin_frame(&mut self, size: SurfaceSize, clear: [f32; 4]) -> Result<(), BackendError> {
        self.alive()?;
        if self.frame.is_some() {
            return Err(BackendError::Frame("frame already in progress".to_string()));
        }
        self.frame = Some(PendingFrame {
            size,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.alive()?;
        if self.frame.is_none() {
            return Err(BackendError::Frame("draw outside of a frame".to_string()));
        }
        let prepared = self.prepare(call)?;
        if let Some(frame) = self.frame.as_mut() {
            frame.draws.push(prepared);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let pending = self
            .frame
            .take()
            .ok_or_else(|| BackendError::Frame("no frame in progress".to_string()))?;
        self.alive()?;
        if pending.size.is_empty() {
            log::trace!("skipping frame for empty surface");
            return Ok(());
        }
        self.present(pending)
    }
}

impl DisplaySurface for WgpuBackend<'_> {
    fn backing_size(&self) -> SurfaceSize {
        let size = self.gpu.size();
        SurfaceSize::new(size.width, size.height)
    }

    fn display_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn set_backing_size(&mut self, size: SurfaceSize) {
        self.gpu.resize(PhysicalSize::new(size.width, size.height));
    }
}
