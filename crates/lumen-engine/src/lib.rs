//! Lumen engine crate.
//!
//! A small real-time rasterization kernel: transform math, procedural
//! geometry, shader program management, and a render session that draws a
//! scene on demand or on a frame clock while a control surface tunes its
//! parameters.

pub mod math;
pub mod geometry;
pub mod backend;
pub mod device;
pub mod program;
pub mod session;
pub mod scheduler;
pub mod params;
pub mod assets;

pub mod input;
pub mod window;
pub mod logging;
