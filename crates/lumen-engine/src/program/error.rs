use crate::backend::{BackendError, ShaderStage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ProgramError {
    /// Maps a backend failure for `stage`, lifting compile logs.
    pub(crate) fn from_stage(stage: ShaderStage, err: BackendError) -> Self {
        match err {
            BackendError::Compile { log } => ProgramError::Compile { stage, log },
            other => ProgramError::Backend(other),
        }
    }

    pub(crate) fn from_link(err: BackendError) -> Self {
        match err {
            BackendError::Link { log } => ProgramError::Link { log },
            other => ProgramError::Backend(other),
        }
    }
}
