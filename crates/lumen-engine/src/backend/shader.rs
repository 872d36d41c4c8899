//! WGSL front-end shared by every backend.
//!
//! `compile` parses and validates one stage with naga and reflects its
//! interface; `link` checks that a vertex/fragment pair fits together and
//! merges their name tables.

use std::collections::BTreeMap;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::types::{ShaderStage, UniformKind, UniformLocation};

/// A `@location` on a stage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVar {
    pub name: Option<String>,
    pub location: u32,
}

/// A named resource global (`var<uniform>`, texture or sampler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceVar {
    pub name: String,
    pub location: UniformLocation,
}

/// Interface of the entry point matching the shader's stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInterface {
    pub name: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
}

/// A validated shader stage.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub source: String,
    /// `None` when the module has no entry point for `stage`.
    pub entry: Option<EntryInterface>,
    pub resources: Vec<ResourceVar>,
}

/// Which stages read a uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Visibility {
    pub vertex: bool,
    pub fragment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramUniform {
    pub location: UniformLocation,
    pub visibility: Visibility,
}

/// Linked program interface: attribute and uniform name tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub attributes: BTreeMap<String, u32>,
    pub uniforms: BTreeMap<String, ProgramUniform>,
}

impl ProgramInterface {
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).map(|u| u.location)
    }

    /// Highest bind group index used, if any.
    pub fn max_group(&self) -> Option<u32> {
        self.uniforms.values().map(|u| u.location.group).max()
    }
}

/// Parses and validates `source`; the error is the rendered diagnostic.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage)
        .map(|ep| reflect_entry(&module, ep));

    Ok(CompiledShader {
        stage,
        source: source.to_string(),
        entry,
        resources: reflect_resources(&module),
    })
}

/// Checks that `vertex` and `fragment` form a program.
pub fn link(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<ProgramInterface, String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(format!(
            "expected a vertex and a fragment shader, got {} and {}",
            vertex.stage, fragment.stage
        ));
    }
    let vs = vertex
        .entry
        .as_ref()
        .ok_or_else(|| "vertex shader has no @vertex entry point".to_string())?;
    let fs = fragment
        .entry
        .as_ref()
        .ok_or_else(|| "fragment shader has no @fragment entry point".to_string())?;

    for input in &fs.inputs {
        if !vs.outputs.iter().any(|o| o.location == input.location) {
            return Err(format!(
                "fragment input {} at @location({}) is not written by the vertex stage",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            ));
        }
    }

    let mut uniforms: BTreeMap<String, ProgramUniform> = BTreeMap::new();
    let stages = [(vertex, true), (fragment, false)];
    for (shader, is_vertex) in stages {
        for res in &shader.resources {
            let clash = uniforms.iter().find(|(name, u)| {
                u.location.group == res.location.group
                    && u.location.binding == res.location.binding
                    && name.as_str() != res.name
            });
            if let Some((other, _)) = clash {
                return Err(format!(
                    "@group({}) @binding({}) is `{}` in one stage and `{}` in the other",
                    res.location.group, res.location.binding, other, res.name
                ));
            }

            let entry = uniforms.entry(res.name.clone()).or_insert(ProgramUniform {
                location: res.location,
                visibility: Visibility::default(),
            });
            if entry.location != res.location {
                return Err(format!(
                    "uniform `{}` is declared differently in the two stages",
                    res.name
                ));
            }
            if is_vertex {
                entry.visibility.vertex = true;
            } else {
                entry.visibility.fragment = true;
            }
        }
    }

    let attributes = vs
        .inputs
        .iter()
        .filter_map(|v| v.name.clone().map(|n| (n, v.location)))
        .collect();

    Ok(ProgramInterface {
        vertex_entry: vs.name.clone(),
        fragment_entry: fs.name.clone(),
        attributes,
        uniforms,
    })
}

// ── reflection ────────────────────────────────────────────────────────────

fn reflect_entry(module: &naga::Module, ep: &naga::EntryPoint) -> EntryInterface {
    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    EntryInterface {
        name: ep.name.clone(),
        inputs,
        outputs,
    }
}

/// Location-bound values, flattening one level of struct members.
fn collect_locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(InterfaceVar {
            name: name.map(str::to_string),
            location: *location,
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        out.push(InterfaceVar {
                            name: member.name.clone(),
                            location: *location,
                        });
                    }
                }
            }
        }
    }
}

fn reflect_resources(module: &naga::Module) -> Vec<ResourceVar> {
    let mut out = Vec::new();
    for (_, global) in module.global_variables.iter() {
        let (Some(name), Some(binding)) = (&global.name, &global.binding) else {
            continue;
        };
        let inner = &module.types[global.ty].inner;
        let kind = match global.space {
            naga::AddressSpace::Uniform => UniformKind::Buffer {
                size: u64::from(inner.size(module.to_ctx())),
            },
            naga::AddressSpace::Handle => match inner {
                naga::TypeInner::Image { .. } => UniformKind::Texture,
                naga::TypeInner::Sampler { .. } => UniformKind::Sampler,
                _ => continue,
            },
            _ => continue,
        };
        out.push(ResourceVar {
            name: name.clone(),
            location: UniformLocation {
                group: binding.group,
                binding: binding.binding,
                kind,
            },
        });
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const VS: &str = r#"
@group(0) @binding(0) var<uniform> u_matrix: mat4x4<f32>;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec3<f32>, @location(1) a_color: vec4<f32>) -> VsOut {
    var out: VsOut;
    out.position = u_matrix * vec4<f32>(a_position, 1.0);
    out.color = a_color;
    return out;
}
"#;

    pub(crate) const FS: &str = r#"
@group(0) @binding(1) var<uniform> u_tint: vec4<f32>;

@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color * u_tint;
}
"#;

    pub(crate) const BROKEN_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0) // missing component and semicolon
}
"#;

    #[test]
    fn reflects_vertex_attributes_and_uniforms() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let entry = vs.entry.as_ref().unwrap();
        assert_eq!(entry.name, "vs_main");
        assert_eq!(entry.inputs.len(), 2);
        assert_eq!(entry.outputs, vec![InterfaceVar { name: Some("color".into()), location: 0 }]);
        assert_eq!(vs.resources.len(), 1);
        assert_eq!(vs.resources[0].location.kind, UniformKind::Buffer { size: 64 });
    }

    #[test]
    fn parse_error_has_log() {
        let log = compile(ShaderStage::Fragment, BROKEN_FS).unwrap_err();
        assert!(!log.is_empty());
    }

    #[test]
    fn validation_error_has_log() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let log = compile(ShaderStage::Fragment, src).unwrap_err();
        assert!(!log.is_empty());
    }

    #[test]
    fn link_merges_tables() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let program = link(&vs, &fs).unwrap();
        assert_eq!(program.attributes.get("a_position"), Some(&0));
        assert_eq!(program.attributes.get("a_color"), Some(&1));
        assert!(program.uniforms["u_matrix"].visibility.vertex);
        assert!(program.uniforms["u_tint"].visibility.fragment);
        assert_eq!(program.max_group(), Some(0));
    }

    #[test]
    fn link_rejects_unfed_fragment_input() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs_src = "@fragment fn fs_main(@location(3) v: vec2<f32>) -> @location(0) vec4<f32> { return vec4<f32>(v, 0.0, 1.0); }";
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).unwrap_err().contains("@location(3)"));
    }

    #[test]
    fn link_rejects_missing_entry_point() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        // A vertex-only module compiled as the fragment stage.
        let fs = compile(ShaderStage::Fragment, VS).unwrap();
        assert!(link(&vs, &fs).is_err());
    }

    #[test]
    fn link_rejects_binding_name_clash() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs_src = r#"
@group(0) @binding(0) var<uniform> u_other: mat4x4<f32>;
@fragment fn fs_main(@location(0) c: vec4<f32>) -> @location(0) vec4<f32> { return u_other * c; }
"#;
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).is_err());
    }
}
