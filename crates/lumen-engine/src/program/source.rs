/// Compile-time description of one program.
///
/// `attributes` and `uniforms` list every name the caller will look up; they
/// are resolved eagerly at link time and a missing name fails the link.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub name: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
    pub attributes: &'static [&'static str],
    pub uniforms: &'static [&'static str],
}
