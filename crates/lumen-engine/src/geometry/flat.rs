use crate::math::Vec3;

use super::buffer::{GeometryBuffer, GeometryError, VertexStream};

/// Expands an indexed mesh into a non-indexed triangle stream.
///
/// The output has `index_count` vertices, so every triangle owns its three
/// corners. Besides the expanded vertex normals (smooth shading) it carries
/// `face_normals`: the normalized cross product of the triangle's two edges,
/// repeated for each corner (flat shading). Degenerate triangles get a zero
/// face normal. Colors and texcoords are expanded when present.
pub fn flatten_for_flat_shading(mesh: &GeometryBuffer) -> Result<GeometryBuffer, GeometryError> {
    mesh.validate()?;
    let indices = mesh.indices.as_ref().ok_or(GeometryError::MissingIndices)?;
    let normals = mesh
        .normals
        .as_ref()
        .ok_or(GeometryError::MissingStream(VertexStream::Normal))?;
    if indices.len() % 3 != 0 {
        return Err(GeometryError::NotTriangles(indices.len()));
    }

    let positions: Vec<Vec3> = indices.iter().map(|&i| mesh.positions[i as usize]).collect();
    let vertex_normals: Vec<Vec3> = indices.iter().map(|&i| normals[i as usize]).collect();

    let mut face_normals = Vec::with_capacity(indices.len());
    for corners in positions.chunks_exact(3) {
        let normal = face_normal(corners[0], corners[1], corners[2]);
        face_normals.extend_from_slice(&[normal, normal, normal]);
    }

    Ok(GeometryBuffer {
        positions,
        normals: Some(vertex_normals),
        face_normals: Some(face_normals),
        colors: mesh
            .colors
            .as_ref()
            .map(|c| indices.iter().map(|&i| c[i as usize]).collect()),
        texcoords: mesh
            .texcoords
            .as_ref()
            .map(|t| indices.iter().map(|&i| t[i as usize]).collect()),
        indices: None,
    })
}

/// Unit normal of triangle `abc` with counter-clockwise winding.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SphereParams, sphere};

    #[test]
    fn sphere_flattens_to_three_vertices_per_triangle() {
        let mesh = sphere(SphereParams::new(100.0, 16, 8));
        let triangles = mesh.indices.as_ref().unwrap().len() / 3;
        let flat = flatten_for_flat_shading(&mesh).unwrap();

        assert_eq!(flat.vertex_count(), 3 * triangles);
        assert_eq!(flat.normals.as_ref().unwrap().len(), 3 * triangles);
        assert_eq!(flat.face_normals.as_ref().unwrap().len(), 3 * triangles);
        assert_eq!(flat.texcoords.as_ref().unwrap().len(), 3 * triangles);
        assert!(flat.indices.is_none());
        assert_eq!(flat.validate(), Ok(()));
    }

    #[test]
    fn face_normal_triplets_are_identical() {
        let flat = flatten_for_flat_shading(&sphere(SphereParams::new(1.0, 8, 4))).unwrap();
        for triplet in flat.face_normals.as_ref().unwrap().chunks_exact(3) {
            assert_eq!(triplet[0], triplet[1]);
            assert_eq!(triplet[1], triplet[2]);
        }
    }

    #[test]
    fn sphere_face_normals_point_outwards() {
        let flat = flatten_for_flat_shading(&sphere(SphereParams::new(1.0, 8, 4))).unwrap();
        let faces = flat.face_normals.as_ref().unwrap();
        for (corners, normals) in flat.positions.chunks_exact(3).zip(faces.chunks_exact(3)) {
            let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
            assert!(centroid.dot(normals[0]) > 0.0);
        }
    }

    #[test]
    fn vertex_normals_are_not_deduplicated() {
        let mesh = sphere(SphereParams::new(1.0, 8, 4));
        let flat = flatten_for_flat_shading(&mesh).unwrap();
        let indices = mesh.indices.as_ref().unwrap();
        let source = mesh.normals.as_ref().unwrap();
        for (k, &i) in indices.iter().enumerate() {
            assert_eq!(flat.normals.as_ref().unwrap()[k], source[i as usize]);
        }
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(p, p, p), Vec3::zero());
    }

    #[test]
    fn requires_indices() {
        let mesh = GeometryBuffer::from_positions(vec![Vec3::zero(); 3])
            .with_normals(vec![Vec3::zero(); 3]);
        assert_eq!(
            flatten_for_flat_shading(&mesh),
            Err(GeometryError::MissingIndices)
        );
    }

    #[test]
    fn requires_vertex_normals() {
        let mesh = GeometryBuffer::from_positions(vec![Vec3::zero(); 3]).with_indices(vec![0, 1, 2]);
        assert_eq!(
            flatten_for_flat_shading(&mesh),
            Err(GeometryError::MissingStream(VertexStream::Normal))
        );
    }

    #[test]
    fn rejects_partial_triangle() {
        let mesh = GeometryBuffer::from_positions(vec![Vec3::zero(); 3])
            .with_normals(vec![Vec3::zero(); 3])
            .with_indices(vec![0, 1]);
        assert_eq!(
            flatten_for_flat_shading(&mesh),
            Err(GeometryError::NotTriangles(2))
        );
    }
}
