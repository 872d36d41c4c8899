use std::collections::BTreeMap;

use crate::backend::{ProgramId, Rasterizer, ShaderId, ShaderStage, UniformLocation};

use super::{ProgramError, ProgramSource};

/// Index of a program inside its [`ProgramManager`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey(usize);

impl ProgramKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linked program and its resolved locations. Immutable once linked.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    name: &'static str,
    handle: ProgramId,
    attributes: BTreeMap<&'static str, u32>,
    uniforms: BTreeMap<&'static str, UniformLocation>,
}

impl ShaderProgram {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn handle(&self) -> ProgramId {
        self.handle
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.attributes.iter().map(|(k, v)| (*k, *v))
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&'static str, UniformLocation)> + '_ {
        self.uniforms.iter().map(|(k, v)| (*k, *v))
    }
}

/// Handles created while building one program; released on failure.
#[derive(Default)]
struct Partial {
    shaders: Vec<ShaderId>,
    program: Option<ProgramId>,
}

impl Partial {
    fn release<G: Rasterizer + ?Sized>(self, backend: &mut G) {
        for shader in self.shaders {
            backend.delete_shader(shader);
        }
        if let Some(program) = self.program {
            backend.delete_program(program);
        }
    }
}

/// Owns every program of a session.
#[derive(Debug, Default)]
pub struct ProgramManager {
    programs: Vec<ShaderProgram>,
}

impl ProgramManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles both stages, links them and resolves every declared name.
    ///
    /// On any failure all handles created by this call are released before the
    /// error is returned. On success the shader objects are released and the
    /// program keeps its compiled stages.
    pub fn compile_and_link<G: Rasterizer + ?Sized>(
        &mut self,
        backend: &mut G,
        source: &ProgramSource,
    ) -> Result<ProgramKey, ProgramError> {
        let mut partial = Partial::default();
        match build(backend, source, &mut partial) {
            Ok(program) => {
                for shader in partial.shaders.drain(..) {
                    backend.delete_shader(shader);
                }
                log::debug!(
                    "program `{}` linked as {} ({} attributes, {} uniforms)",
                    source.name,
                    program.handle,
                    program.attributes.len(),
                    program.uniforms.len()
                );
                self.programs.push(program);
                Ok(ProgramKey(self.programs.len() - 1))
            }
            Err(err) => {
                log::debug!("program `{}` failed: {err}", source.name);
                partial.release(backend);
                Err(err)
            }
        }
    }

    pub fn get(&self, key: ProgramKey) -> Option<&ShaderProgram> {
        self.programs.get(key.0)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Deletes every program. Idempotent.
    pub fn release_all<G: Rasterizer + ?Sized>(&mut self, backend: &mut G) {
        for program in self.programs.drain(..) {
            log::debug!("releasing program `{}`", program.name);
            backend.delete_program(program.handle);
        }
    }
}

fn build<G: Rasterizer + ?Sized>(
    backend: &mut G,
    source: &ProgramSource,
    partial: &mut Partial,
) -> Result<ShaderProgram, ProgramError> {
    let vertex = compile_stage(backend, ShaderStage::Vertex, source.vertex, partial)?;
    let fragment = compile_stage(backend, ShaderStage::Fragment, source.fragment, partial)?;

    let handle = backend.create_program()?;
    partial.program = Some(handle);
    backend
        .link_program(handle, vertex, fragment)
        .map_err(ProgramError::from_link)?;

    let mut attributes = BTreeMap::new();
    for &name in source.attributes {
        let location = backend
            .attribute_location(handle, name)
            .ok_or_else(|| ProgramError::Link {
                log: format!("attribute `{name}` is not a vertex input of `{}`", source.name),
            })?;
        attributes.insert(name, location);
    }

    let mut uniforms = BTreeMap::new();
    for &name in source.uniforms {
        let location = backend
            .uniform_location(handle, name)
            .ok_or_else(|| ProgramError::Link {
                log: format!("uniform `{name}` is not declared by `{}`", source.name),
            })?;
        uniforms.insert(name, location);
    }

    Ok(ShaderProgram {
        name: source.name,
        handle,
        attributes,
        uniforms,
    })
}

fn compile_stage<G: Rasterizer + ?Sized>(
    backend: &mut G,
    stage: ShaderStage,
    text: &str,
    partial: &mut Partial,
) -> Result<ShaderId, ProgramError> {
    let shader = backend.create_shader(stage)?;
    partial.shaders.push(shader);
    backend
        .compile_shader(shader, text)
        .map_err(|e| ProgramError::from_stage(stage, e))?;
    Ok(shader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::shader::tests::{BROKEN_FS, FS, VS};
    use crate::backend::{BackendError, HeadlessBackend, UniformKind};

    const SOURCE: ProgramSource = ProgramSource {
        name: "colored",
        vertex: VS,
        fragment: FS,
        attributes: &["a_position", "a_color"],
        uniforms: &["u_matrix", "u_tint"],
    };

    // ── success ───────────────────────────────────────────────────────────

    #[test]
    fn resolves_every_declared_name() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        let key = manager.compile_and_link(&mut backend, &SOURCE).unwrap();

        let program = manager.get(key).unwrap();
        assert_eq!(program.attribute("a_position"), Some(0));
        assert_eq!(program.attribute("a_color"), Some(1));
        assert_eq!(
            program.uniform("u_matrix").map(|u| u.kind),
            Some(UniformKind::Buffer { size: 64 })
        );
    }

    #[test]
    fn shaders_released_after_link() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        manager.compile_and_link(&mut backend, &SOURCE).unwrap();
        let counts = backend.handle_counts();
        assert_eq!(counts.shaders, 0);
        assert_eq!(counts.programs, 1);
    }

    #[test]
    fn release_all_is_idempotent() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        manager.compile_and_link(&mut backend, &SOURCE).unwrap();
        manager.release_all(&mut backend);
        manager.release_all(&mut backend);
        assert!(manager.is_empty());
        assert_eq!(backend.live_handles(), 0);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn malformed_fragment_is_compile_error() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        let source = ProgramSource {
            fragment: BROKEN_FS,
            ..SOURCE
        };
        match manager.compile_and_link(&mut backend, &source) {
            Err(ProgramError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert_eq!(backend.live_handles(), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn interface_mismatch_is_link_error() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        let source = ProgramSource {
            fragment: "@fragment fn fs_main(@location(5) v: vec4<f32>) -> @location(0) vec4<f32> { return v; }",
            uniforms: &["u_matrix"],
            ..SOURCE
        };
        assert!(matches!(
            manager.compile_and_link(&mut backend, &source),
            Err(ProgramError::Link { .. })
        ));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn undeclared_uniform_is_link_error() {
        let mut backend = HeadlessBackend::default();
        let mut manager = ProgramManager::new();
        let source = ProgramSource {
            uniforms: &["u_matrix", "u_missing"],
            ..SOURCE
        };
        match manager.compile_and_link(&mut backend, &source) {
            Err(ProgramError::Link { log }) => assert!(log.contains("u_missing")),
            other => panic!("expected link error, got {other:?}"),
        }
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn lost_context_surfaces_backend_error() {
        let mut backend = HeadlessBackend::default();
        backend.lose_context();
        let mut manager = ProgramManager::new();
        assert_eq!(
            manager.compile_and_link(&mut backend, &SOURCE).unwrap_err(),
            ProgramError::Backend(BackendError::ContextUnavailable)
        );
    }
}
