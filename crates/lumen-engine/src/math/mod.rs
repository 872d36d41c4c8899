//! Vector and matrix value types.
//!
//! Conventions:
//! - `f32` components, column-major storage
//! - composition is right-multiplication (`base * delta`)
//! - world space is +Y up; clip-space depth is `[0, 1]` (wgpu)

mod angle;
mod mat3;
mod mat4;
mod vec;

pub use angle::{deg_to_rad, rad_to_deg};
pub use mat3::Mat3;
pub use mat4::{Mat4, SingularMatrix};
pub use vec::{Vec2, Vec3, Vec4};
