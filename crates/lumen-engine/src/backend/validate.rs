use super::shader::ProgramInterface;
use super::types::{BufferId, BufferKind, DrawCall, TextureId, UniformValue};
use super::BackendError;

/// Checks a draw call against the linked program and the live resources.
///
/// Every attribute the program declares needs a vertex buffer, and every
/// uniform must be bound exactly where the program expects it.
pub(crate) fn validate_draw(
    call: &DrawCall,
    program: &ProgramInterface,
    buffer_kind: impl Fn(BufferId) -> Option<BufferKind>,
    texture_exists: impl Fn(TextureId) -> bool,
) -> Result<(), BackendError> {
    for input in &call.vertex_inputs {
        match buffer_kind(input.buffer) {
            Some(BufferKind::Vertex) => {}
            Some(BufferKind::Index) => {
                return Err(BackendError::Frame(format!(
                    "{} is an index buffer bound as a vertex stream",
                    input.buffer
                )));
            }
            None => return Err(unknown("buffer", input.buffer.0)),
        }
    }
    for (name, &location) in &program.attributes {
        if !call.vertex_inputs.iter().any(|i| i.location == location) {
            return Err(BackendError::Frame(format!(
                "attribute `{name}` at @location({location}) has no vertex buffer"
            )));
        }
    }

    if let Some(index) = call.index_buffer {
        match buffer_kind(index) {
            Some(BufferKind::Index) => {}
            Some(BufferKind::Vertex) => {
                return Err(BackendError::Frame(format!(
                    "{index} is a vertex buffer bound as indices"
                )));
            }
            None => return Err(unknown("buffer", index.0)),
        }
    }

    for binding in &call.uniforms {
        let Some(expected) = program.uniform_location(&binding.name) else {
            return Err(BackendError::UniformMismatch {
                name: binding.name.clone(),
                reason: "program has no such uniform".to_string(),
            });
        };
        if expected != binding.location {
            return Err(BackendError::UniformMismatch {
                name: binding.name.clone(),
                reason: format!("bound at {:?}, program expects {expected:?}", binding.location),
            });
        }
        binding.value.check(&binding.name, &expected)?;
        if let UniformValue::Texture(texture) = binding.value
            && !texture_exists(texture)
        {
            return Err(unknown("texture", texture.0));
        }
    }
    for name in program.uniforms.keys() {
        if !call.uniforms.iter().any(|b| &b.name == name) {
            return Err(BackendError::UniformMismatch {
                name: name.clone(),
                reason: "not bound for this draw".to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn unknown(kind: &'static str, id: u32) -> BackendError {
    BackendError::UnknownHandle { kind, id }
}
