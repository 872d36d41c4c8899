use crate::math::{Vec2, Vec3};

use super::buffer::GeometryBuffer;

/// Axis-aligned box centered at the origin.
///
/// Each face has its own four vertices so normals and uvs stay per-face:
/// 24 vertices, 36 indices, counter-clockwise when seen from outside.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> GeometryBuffer {
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

    // (normal, u axis, v axis) per face; u x v == normal.
    let faces = [
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
        (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
    ];
    let half = Vec3::new(hx, hy, hz);
    let mul = |a: Vec3, b: Vec3| Vec3::new(a.x * b.x, a.y * b.y, a.z * b.z);

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u_axis, v_axis) in faces {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = normal + u_axis * su + v_axis * sv;
            positions.push(mul(corner, half));
            normals.push(normal);
            texcoords.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    GeometryBuffer::from_positions(positions)
        .with_normals(normals)
        .with_texcoords(texcoords)
        .with_indices(indices)
}

/// Plane in the XY plane facing +Z, subdivided into a grid.
///
/// Segment counts are raised to at least 1. Texcoords run from the top-left
/// corner (0, 0) to the bottom-right (1, 1).
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryBuffer {
    let gx = width_segments.max(1);
    let gy = height_segments.max(1);
    let columns = gx + 1;

    let mut positions = Vec::with_capacity(((gx + 1) * (gy + 1)) as usize);
    let mut texcoords = Vec::with_capacity(positions.capacity());
    for iy in 0..=gy {
        let v = iy as f32 / gy as f32;
        for ix in 0..=gx {
            let u = ix as f32 / gx as f32;
            positions.push(Vec3::new((u - 0.5) * width, (0.5 - v) * height, 0.0));
            texcoords.push(Vec2::new(u, v));
        }
    }

    let mut indices = Vec::with_capacity((gx * gy * 6) as usize);
    for iy in 0..gy {
        for ix in 0..gx {
            let a = iy * columns + ix;
            let b = a + columns;
            let c = b + 1;
            let d = a + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let normals = vec![Vec3::new(0.0, 0.0, 1.0); positions.len()];
    GeometryBuffer::from_positions(positions)
        .with_normals(normals)
        .with_texcoords(texcoords)
        .with_indices(indices)
}
