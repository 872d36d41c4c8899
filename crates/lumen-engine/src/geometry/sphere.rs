use std::f32::consts::PI;

use crate::math::{Vec2, Vec3};

use super::buffer::GeometryBuffer;

/// UV sphere parameters.
///
/// `phi` sweeps around the Y axis, `theta` from the north pole (+Y) down.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub phi_start: f32,
    pub phi_length: f32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
            phi_start: 0.0,
            phi_length: PI * 2.0,
            theta_start: 0.0,
            theta_length: PI,
        }
    }
}

impl SphereParams {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
            ..Self::default()
        }
    }
}

/// Indexed sphere mesh with positions, unit normals, texcoords and indices.
///
/// Segment counts are raised to at least 3 (width) and 2 (height). Quads that
/// touch a closed pole emit a single triangle, so a full sphere has
/// `2 * w * (h - 1)` triangles.
pub fn sphere(params: SphereParams) -> GeometryBuffer {
    let width = params.width_segments.max(3) as usize;
    let height = params.height_segments.max(2) as usize;
    let theta_end = (params.theta_start + params.theta_length).min(PI);

    let vertex_count = (width + 1) * (height + 1);
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut texcoords = Vec::with_capacity(vertex_count);
    let mut grid: Vec<Vec<u32>> = Vec::with_capacity(height + 1);

    let mut index = 0u32;
    for iy in 0..=height {
        let v = iy as f32 / height as f32;

        // Poles share one position; shift their u so the texture seam stays centered.
        let u_offset = if iy == 0 && params.theta_start == 0.0 {
            0.5 / width as f32
        } else if iy == height && theta_end == PI {
            -0.5 / width as f32
        } else {
            0.0
        };

        let theta = params.theta_start + v * params.theta_length;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let mut row = Vec::with_capacity(width + 1);
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = params.phi_start + u * params.phi_length;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let p = Vec3::new(
                -params.radius * cos_phi * sin_theta,
                params.radius * cos_theta,
                params.radius * sin_phi * sin_theta,
            );
            positions.push(p);
            normals.push(p.normalize());
            texcoords.push(Vec2::new(u + u_offset, 1.0 - v));

            row.push(index);
            index += 1;
        }
        grid.push(row);
    }

    let mut indices = Vec::with_capacity(width * height * 6);
    for iy in 0..height {
        for ix in 0..width {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];

            if iy != 0 || params.theta_start > 0.0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 || theta_end < PI {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    GeometryBuffer::from_positions(positions)
        .with_normals(normals)
        .with_texcoords(texcoords)
        .with_indices(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_sphere_triangle_count() {
        let g = sphere(SphereParams::new(100.0, 16, 8));
        assert_eq!(g.vertex_count(), 17 * 9);
        assert_eq!(g.indices.as_ref().unwrap().len(), 3 * 2 * 16 * 7);
        assert_eq!(g.validate(), Ok(()));
    }

    #[test]
    fn positions_lie_on_radius() {
        let g = sphere(SphereParams::new(2.5, 12, 6));
        for p in &g.positions {
            assert!((p.length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn normals_point_outwards() {
        let g = sphere(SphereParams::new(3.0, 8, 4));
        for (p, n) in g.positions.iter().zip(g.normals.as_ref().unwrap()) {
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!(p.dot(*n) > 0.0);
        }
    }

    #[test]
    fn segment_counts_are_clamped() {
        let g = sphere(SphereParams::new(1.0, 0, 0));
        // 3 x 2 segments: 4 * 3 vertices, 2 * 3 * (2 - 1) triangles.
        assert_eq!(g.vertex_count(), 12);
        assert_eq!(g.indices.as_ref().unwrap().len(), 18);
    }
}
