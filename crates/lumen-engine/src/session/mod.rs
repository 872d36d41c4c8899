//! Per-scene rendering sessions.
//!
//! A `RenderSession` owns its backend, its scene and every GPU handle created
//! on the scene's behalf. Scenes describe content through the [`Scene`]
//! trait; the session handles compilation, uploads, resizing, frame pacing
//! and teardown.

mod error;
mod resize;
#[allow(clippy::module_inception)]
mod session;
mod scene;
mod texture;
mod transform;

pub use error::{SessionError, SessionState};
pub use resize::sync_backing_size;
pub use scene::{DrawContext, DrawLayer, Mesh, Scene, UniformSet};
pub use session::{DEFAULT_PLACEHOLDER, DrawReport, ParameterTarget, RenderSession, SessionConfig};
pub use transform::TransformState;
