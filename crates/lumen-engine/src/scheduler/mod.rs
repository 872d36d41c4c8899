//! Frame scheduling.
//!
//! Provides testable frame timing without coupling to the runtime:
//! - `FrameClock` turns timestamps into clamped `FrameTick`s
//! - `FrameScheduler` decides when a frame runs (continuous or on demand)
//! - `CancellationToken` stops every further frame

mod cancel;
mod clock;
mod scheduler;

pub use cancel::CancellationToken;
pub use clock::{FrameClock, FrameTick};
pub use scheduler::{FrameMode, FrameScheduler};
