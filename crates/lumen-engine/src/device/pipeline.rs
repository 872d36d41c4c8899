use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU64;

use crate::backend::shader::{ProgramInterface, Visibility};
use crate::backend::{DrawCall, Filter, SamplerState, Topology, UniformKind, VertexFormat, Wrap};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything besides the program that shapes a render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub topology: Topology,
    pub indexed: bool,
    /// `(shader location, format)` per vertex buffer slot.
    pub inputs: Vec<(u32, VertexFormat)>,
}

impl PipelineKey {
    pub fn for_call(call: &DrawCall) -> Self {
        Self {
            topology: call.topology,
            indexed: call.index_buffer.is_some(),
            inputs: call
                .vertex_inputs
                .iter()
                .map(|i| (i.location, i.format))
                .collect(),
        }
    }
}

/// Shader modules and layouts of one linked program, plus its pipelines.
pub(crate) struct GpuProgram {
    pub interface: ProgramInterface,
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub group_layouts: Vec<wgpu::BindGroupLayout>,
    pub layout: wgpu::PipelineLayout,
    pub pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl GpuProgram {
    pub fn new(
        device: &wgpu::Device,
        interface: ProgramInterface,
        vertex: wgpu::ShaderModule,
        fragment: wgpu::ShaderModule,
    ) -> Self {
        let group_layouts = bind_group_layouts(device, &interface);
        let refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen pipeline layout"),
            bind_group_layouts: &refs,
            immediate_size: 0,
        });
        Self {
            interface,
            vertex,
            fragment,
            group_layouts,
            layout,
            pipelines: HashMap::new(),
        }
    }

    /// Returns the pipeline for `key`, creating it on first use.
    pub fn pipeline(
        &mut self,
        device: &wgpu::Device,
        key: &PipelineKey,
        color_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.pipelines.get(key) {
            return pipeline.clone();
        }
        log::debug!("creating pipeline for {key:?}");
        let pipeline = create_pipeline(device, self, key, color_format);
        self.pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }
}

/// One layout per bind group up to the highest group used. Unused groups get
/// an empty layout.
fn bind_group_layouts(
    device: &wgpu::Device,
    interface: &ProgramInterface,
) -> Vec<wgpu::BindGroupLayout> {
    let Some(max_group) = interface.max_group() else {
        return Vec::new();
    };
    let mut groups: BTreeMap<u32, Vec<wgpu::BindGroupLayoutEntry>> =
        (0..=max_group).map(|g| (g, Vec::new())).collect();
    for uniform in interface.uniforms.values() {
        let entry = wgpu::BindGroupLayoutEntry {
            binding: uniform.location.binding,
            visibility: shader_stages(uniform.visibility),
            ty: binding_type(uniform.location.kind),
            count: None,
        };
        groups.entry(uniform.location.group).or_default().push(entry);
    }
    groups
        .into_values()
        .map(|mut entries| {
            entries.sort_by_key(|e| e.binding);
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lumen bind group layout"),
                entries: &entries,
            })
        })
        .collect()
}

fn create_pipeline(
    device: &wgpu::Device,
    program: &GpuProgram,
    key: &PipelineKey,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
        .inputs
        .iter()
        .map(|&(location, format)| {
            [wgpu::VertexAttribute {
                format: vertex_format(format),
                offset: 0,
                shader_location: location,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
        .inputs
        .iter()
        .zip(&attributes)
        .map(|(&(_, format), attrs)| wgpu::VertexBufferLayout {
            array_stride: format.size(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attrs,
        })
        .collect();

    let topology = primitive_topology(key.topology);
    let strip_index_format =
        (key.indexed && topology.is_strip()).then_some(wgpu::IndexFormat::Uint32);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("lumen pipeline"),
        layout: Some(&program.layout),

        vertex: wgpu::VertexState {
            module: &program.vertex,
            entry_point: Some(program.interface.vertex_entry.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &program.fragment,
            entry_point: Some(program.interface.fragment_entry.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}

pub(crate) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
    }
}

pub(crate) fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
    }
}

fn shader_stages(visibility: Visibility) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::NONE;
    if visibility.vertex {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if visibility.fragment {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    stages
}

fn binding_type(kind: UniformKind) -> wgpu::BindingType {
    match kind {
        UniformKind::Buffer { size } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size),
        },
        UniformKind::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        UniformKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    }
}

/// Sampler for `state`. Without a mipmap filter only the base level is sampled.
pub(crate) fn sampler_descriptor(state: &SamplerState) -> wgpu::SamplerDescriptor<'static> {
    let address = address_mode(state.wrap);
    let (mipmap_filter, lod_max_clamp) = match state.mipmap_filter {
        Some(Filter::Nearest) => (wgpu::MipmapFilterMode::Nearest, 32.0),
        Some(Filter::Linear) => (wgpu::MipmapFilterMode::Linear, 32.0),
        None => (wgpu::MipmapFilterMode::Nearest, 0.0),
    };
    wgpu::SamplerDescriptor {
        label: Some("lumen sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter_mode(state.mag_filter),
        min_filter: filter_mode(state.min_filter),
        mipmap_filter,
        lod_min_clamp: 0.0,
        lod_max_clamp,
        ..Default::default()
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferId, ProgramId, VertexInput};

    fn call(topology: Topology, indexed: bool) -> DrawCall {
        DrawCall {
            program: ProgramId(1),
            vertex_inputs: vec![
                VertexInput {
                    location: 0,
                    buffer: BufferId(2),
                    format: VertexFormat::Float32x3,
                },
                VertexInput {
                    location: 1,
                    buffer: BufferId(3),
                    format: VertexFormat::Unorm8x4,
                },
            ],
            uniforms: Vec::new(),
            topology,
            index_buffer: indexed.then_some(BufferId(4)),
            element_count: 3,
        }
    }

    #[test]
    fn pipeline_key_ignores_buffer_identity() {
        let a = call(Topology::Triangles, false);
        let mut b = a.clone();
        b.vertex_inputs[0].buffer = BufferId(9);
        assert_eq!(PipelineKey::for_call(&a), PipelineKey::for_call(&b));
        assert_ne!(
            PipelineKey::for_call(&a),
            PipelineKey::for_call(&call(Topology::LineStrip, false))
        );
        assert_ne!(
            PipelineKey::for_call(&a),
            PipelineKey::for_call(&call(Topology::Triangles, true))
        );
    }

    #[test]
    fn topology_mapping() {
        assert_eq!(
            primitive_topology(Topology::LineStrip),
            wgpu::PrimitiveTopology::LineStrip
        );
        assert!(primitive_topology(Topology::TriangleStrip).is_strip());
        assert!(!primitive_topology(Topology::Triangles).is_strip());
    }

    #[test]
    fn vertex_format_sizes_agree() {
        for format in [
            VertexFormat::Float32x2,
            VertexFormat::Float32x3,
            VertexFormat::Float32x4,
            VertexFormat::Unorm8x4,
        ] {
            assert_eq!(vertex_format(format).size(), format.size());
        }
    }

    #[test]
    fn sampler_without_mips_pins_base_level() {
        let desc = sampler_descriptor(&SamplerState::new(Filter::Linear, Filter::Nearest, None));
        assert_eq!(desc.lod_max_clamp, 0.0);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);

        let mipped = sampler_descriptor(
            &SamplerState::new(Filter::Linear, Filter::Linear, Some(Filter::Linear))
                .with_wrap(Wrap::ClampToEdge),
        );
        assert_eq!(mipped.mipmap_filter, wgpu::MipmapFilterMode::Linear);
        assert_eq!(mipped.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert!(mipped.lod_max_clamp > 0.0);
    }
}
