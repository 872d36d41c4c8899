use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

use super::mat4::{Mat4, SingularMatrix};
use super::vec::{Vec2, Vec3};

/// 3x3 matrix, column-major.
///
/// Used for 2D homogeneous transforms and for normal matrices extracted from a
/// [`Mat4`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat3 {
    m: [f32; 9],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    #[inline]
    pub const fn from_cols_array(m: [f32; 9]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn to_cols_array(&self) -> [f32; 9] {
        self.m
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[col * 3 + row]
    }

    pub const fn identity() -> Self {
        Self::from_cols_array([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// 2D pixel-space projection (top-left origin, +Y down).
    pub fn projection(width: f32, height: f32) -> Self {
        Self::from_cols_array([2.0 / width, 0.0, 0.0, 0.0, -2.0 / height, 0.0, -1.0, 1.0, 1.0])
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::from_cols_array([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, tx, ty, 1.0])
    }

    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols_array([c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::from_cols_array([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    /// Upper-left 3x3 block of a 4x4 transform.
    pub fn from_mat4(m: &Mat4) -> Self {
        let a = m.as_array();
        Self::from_cols_array([a[0], a[1], a[2], a[4], a[5], a[6], a[8], a[9], a[10]])
    }

    /// Matrix product `self * rhs`.
    pub fn multiply(&self, rhs: &Mat3) -> Mat3 {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0f32; 9];
        for col in 0..3 {
            for row in 0..3 {
                out[col * 3 + row] =
                    a[row] * b[col * 3] + a[3 + row] * b[col * 3 + 1] + a[6 + row] * b[col * 3 + 2];
            }
        }
        Mat3::from_cols_array(out)
    }

    #[inline]
    pub fn translate(&self, tx: f32, ty: f32) -> Mat3 {
        self.multiply(&Mat3::translation(tx, ty))
    }

    #[inline]
    pub fn rotate(&self, radians: f32) -> Mat3 {
        self.multiply(&Mat3::rotation(radians))
    }

    #[inline]
    pub fn scale(&self, sx: f32, sy: f32) -> Mat3 {
        self.multiply(&Mat3::scaling(sx, sy))
    }

    pub fn transpose(&self) -> Mat3 {
        let m = &self.m;
        Mat3::from_cols_array([m[0], m[3], m[6], m[1], m[4], m[7], m[2], m[5], m[8]])
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[7] * m[5]) - m[3] * (m[1] * m[8] - m[7] * m[2])
            + m[6] * (m[1] * m[5] - m[4] * m[2])
    }

    pub fn try_inverse(&self) -> Result<Mat3, SingularMatrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(SingularMatrix);
        }
        let m = &self.m;
        let inv = 1.0 / det;
        let out = [
            (m[4] * m[8] - m[7] * m[5]) * inv,
            (m[7] * m[2] - m[1] * m[8]) * inv,
            (m[1] * m[5] - m[4] * m[2]) * inv,
            (m[6] * m[5] - m[3] * m[8]) * inv,
            (m[0] * m[8] - m[6] * m[2]) * inv,
            (m[3] * m[2] - m[0] * m[5]) * inv,
            (m[3] * m[7] - m[6] * m[4]) * inv,
            (m[6] * m[1] - m[0] * m[7]) * inv,
            (m[0] * m[4] - m[3] * m[1]) * inv,
        ];
        if out.iter().any(|v| !v.is_finite()) {
            return Err(SingularMatrix);
        }
        Ok(Mat3::from_cols_array(out))
    }

    /// Inverse with the identity as the fallback for singular input.
    pub fn inverse(&self) -> Mat3 {
        self.try_inverse().unwrap_or(Mat3::identity())
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0] * p.x + m[3] * p.y + m[6], m[1] * p.x + m[4] * p.y + m[7])
    }

    pub fn transform_vec3(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0] * v.x + m[3] * v.y + m[6] * v.z,
            m[1] * v.x + m[4] * v.y + m[7] * v.z,
            m[2] * v.x + m[5] * v.y + m[8] * v.z,
        )
    }

    /// Columns padded to 16 bytes, the uniform-buffer layout of `mat3x3<f32>`.
    pub fn to_padded_cols(&self) -> [f32; 12] {
        let m = &self.m;
        [m[0], m[1], m[2], 0.0, m[3], m[4], m[5], 0.0, m[6], m[7], m[8], 0.0]
    }
}

impl Mul for Mat3 {
    type Output = Mat3;
    #[inline]
    fn mul(self, rhs: Mat3) -> Mat3 {
        self.multiply(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_canvas_corners() {
        let p = Mat3::projection(400.0, 300.0);
        assert_eq!(p.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
        assert_eq!(p.transform_point(Vec2::new(400.0, 300.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn translate_then_scale_chain() {
        let m = Mat3::identity().translate(10.0, 20.0).scale(2.0, 3.0);
        assert_eq!(m.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 23.0));
    }

    #[test]
    fn inverse_roundtrip() {
        let m = Mat3::translation(5.0, -3.0).rotate(0.4).scale(2.0, 0.5);
        let id = m * m.try_inverse().unwrap();
        for (a, b) in id.to_cols_array().iter().zip(Mat3::identity().to_cols_array().iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn singular_falls_back_to_identity() {
        let m = Mat3::scaling(0.0, 1.0);
        assert_eq!(m.try_inverse(), Err(SingularMatrix));
        assert_eq!(m.inverse(), Mat3::identity());
    }

    #[test]
    fn normal_matrix_from_mat4_drops_translation() {
        let m4 = Mat4::translation(7.0, 8.0, 9.0).scale(2.0, 2.0, 2.0);
        let n = Mat3::from_mat4(&m4);
        assert_eq!(n, Mat3::from_cols_array([2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]));
        assert_eq!(n.to_padded_cols()[3], 0.0);
    }
}
