use crate::math::{Mat3, Mat4, Vec2, Vec3};

/// Errors produced by geometry generators and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("a bezier curve needs at least one control point")]
    NoControlPoints,

    #[error("{stream:?} stream has {len} entries but the mesh has {expected} vertices")]
    StreamLength {
        stream: VertexStream,
        len: usize,
        expected: usize,
    },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),

    #[error("mesh has no {0:?} stream")]
    MissingStream(VertexStream),

    #[error("mesh has no index array")]
    MissingIndices,
}

/// Names one per-vertex stream of a [`GeometryBuffer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexStream {
    Position,
    /// Interpolated per-vertex normals (smooth shading).
    Normal,
    /// Face normals duplicated once per triangle corner (flat shading).
    FaceNormal,
    Color,
    Texcoord,
}

/// CPU-side vertex data for one mesh.
///
/// The vertex count is the number of positions; every other present stream must
/// have exactly that many entries. Colors are RGBA8 and are normalized to
/// `[0, 1]` when fetched by the vertex stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffer {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub face_normals: Option<Vec<Vec3>>,
    pub colors: Option<Vec<[u8; 4]>>,
    pub texcoords: Option<Vec<Vec2>>,
    pub indices: Option<Vec<u32>>,
}

impl GeometryBuffer {
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_colors(mut self, colors: Vec<[u8; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of elements a non-instanced draw consumes (indices if present).
    #[inline]
    pub fn element_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(self.positions.len(), |indices| indices.len())
    }

    pub fn has_stream(&self, stream: VertexStream) -> bool {
        match stream {
            VertexStream::Position => true,
            VertexStream::Normal => self.normals.is_some(),
            VertexStream::FaceNormal => self.face_normals.is_some(),
            VertexStream::Color => self.colors.is_some(),
            VertexStream::Texcoord => self.texcoords.is_some(),
        }
    }

    /// Checks stream lengths and index range.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let expected = self.vertex_count();
        let lengths = [
            (VertexStream::Normal, self.normals.as_ref().map(Vec::len)),
            (VertexStream::FaceNormal, self.face_normals.as_ref().map(Vec::len)),
            (VertexStream::Color, self.colors.as_ref().map(Vec::len)),
            (VertexStream::Texcoord, self.texcoords.as_ref().map(Vec::len)),
        ];
        for (stream, len) in lengths {
            if let Some(len) = len
                && len != expected
            {
                return Err(GeometryError::StreamLength {
                    stream,
                    len,
                    expected,
                });
            }
        }

        if let Some(indices) = &self.indices
            && let Some(&index) = indices.iter().find(|&&i| i as usize >= expected)
        {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: expected,
            });
        }
        Ok(())
    }

    /// Applies `matrix` to positions and its inverse-transpose to normals.
    ///
    /// Normals are re-normalized. A singular matrix leaves normals untouched.
    pub fn transform(&mut self, matrix: &Mat4) {
        for p in &mut self.positions {
            *p = matrix.transform_point(*p);
        }

        let Ok(inverse) = Mat3::from_mat4(matrix).try_inverse() else {
            log::debug!("geometry transform is singular; normals left as-is");
            return;
        };
        let normal_matrix = inverse.transpose();
        for stream in [self.normals.as_mut(), self.face_normals.as_mut()]
            .into_iter()
            .flatten()
        {
            for n in stream.iter_mut() {
                *n = normal_matrix.transform_vec3(*n).normalize();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> GeometryBuffer {
        GeometryBuffer::from_positions(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn validate_accepts_matching_streams() {
        let g = tri()
            .with_normals(vec![Vec3::new(0.0, 0.0, 1.0); 3])
            .with_indices(vec![0, 1, 2]);
        assert_eq!(g.validate(), Ok(()));
        assert_eq!(g.element_count(), 3);
    }

    #[test]
    fn validate_rejects_short_stream() {
        let g = tri().with_colors(vec![[255, 0, 0, 255]; 2]);
        assert_eq!(
            g.validate(),
            Err(GeometryError::StreamLength {
                stream: VertexStream::Color,
                len: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let g = tri().with_indices(vec![0, 1, 3]);
        assert!(matches!(
            g.validate(),
            Err(GeometryError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn transform_moves_positions_and_rotates_normals() {
        let mut g = tri().with_normals(vec![Vec3::new(0.0, 0.0, 1.0); 3]);
        g.transform(&Mat4::translation(1.0, 2.0, 3.0).rotate_x(std::f32::consts::PI));
        assert!((g.positions[0] - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        let n = g.normals.as_ref().unwrap()[0];
        assert!((n - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
