//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and hosts one [`RenderSession`]
//! drawing into it.
//!
//! [`RenderSession`]: crate::session::RenderSession

mod app;
mod runtime;

pub use app::{App, AppControl};
pub use runtime::{Runtime, RuntimeConfig};
