//! GPU program lifecycle: compile, link, resolve names, release.

mod error;
mod manager;
mod source;

pub use error::ProgramError;
pub use manager::{ProgramKey, ProgramManager, ShaderProgram};
pub use source::ProgramSource;
