//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The window runtime translates platform events into `InputEvent`s; only
//! keys and the pointer matter to sessions and control surfaces.

mod frame;
pub mod platform;
mod pointer;
mod state;
mod types;

pub use frame::InputFrame;
pub use pointer::normalize_pointer;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, Modifiers};
