//! wgpu implementation of the backend capabilities.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - translating programs, buffers, textures and draw calls into wgpu objects

mod backend;
mod error;
mod frame;
mod gpu;
mod init;
mod pipeline;
mod surface;

pub use backend::WgpuBackend;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
