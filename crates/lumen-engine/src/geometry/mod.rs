//! Procedural vertex data: bezier polylines, spheres, boxes and planes, plus the
//! indexed-to-flat expansion used for flat shading.

mod bezier;
mod buffer;
mod flat;
mod primitives;
mod sphere;

pub use bezier::{BezierCurve, BinomialTable};
pub use buffer::{GeometryBuffer, GeometryError, VertexStream};
pub use flat::{face_normal, flatten_for_flat_shading};
pub use primitives::{box_geometry, plane};
pub use sphere::{SphereParams, sphere};
