use std::fmt;

use crate::backend::BackendError;
use crate::geometry::GeometryError;
use crate::params::ParameterError;
use crate::program::ProgramError;

/// Lifecycle state of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Drawing,
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Drawing => "drawing",
            SessionState::Disposed => "disposed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Backend(BackendError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("GPU context unavailable")]
    ContextUnavailable,

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The scene refers to something its programs do not declare.
    #[error("scene error: {0}")]
    Scene(String),
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::ContextUnavailable => SessionError::ContextUnavailable,
            other => SessionError::Backend(other),
        }
    }
}

impl SessionError {
    /// Whether the error came from a lost or missing GPU context.
    pub fn is_context_loss(&self) -> bool {
        matches!(
            self,
            SessionError::ContextUnavailable
                | SessionError::Program(ProgramError::Backend(BackendError::ContextUnavailable))
        )
    }
}
