use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

use super::vec::{Vec3, Vec4};

/// Error returned by [`Mat4::try_inverse`] and [`super::Mat3::try_inverse`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("matrix is singular and has no inverse")]
pub struct SingularMatrix;

/// 4x4 transform, column-major.
///
/// Element `(row, col)` lives at `m[col * 4 + row]`; `m[12..15]` holds the
/// translation. The array is uploaded to uniforms unchanged.
///
/// Helpers that take a base matrix (`translate`, `rotate_x`, ...) right-multiply:
/// `base.translate(..) == base * Mat4::translation(..)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    #[inline]
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn to_cols_array(&self) -> [f32; 16] {
        self.m
    }

    #[inline]
    pub const fn as_array(&self) -> &[f32; 16] {
        &self.m
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    pub const fn identity() -> Self {
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Pixel-space projection.
    ///
    /// Maps x in `[0, width]` to `[-1, 1]`, y in `[0, height]` to `[1, -1]`
    /// (top-left origin, +Y down) and z in `[-depth/2, depth/2]` to the `[0, 1]`
    /// clip depth range.
    pub fn projection(width: f32, height: f32, depth: f32) -> Self {
        Self::from_cols_array([
            2.0 / width, 0.0, 0.0, 0.0, //
            0.0, -2.0 / height, 0.0, 0.0, //
            0.0, 0.0, 1.0 / depth, 0.0, //
            -1.0, 1.0, 0.5, 1.0,
        ])
    }

    /// Perspective projection with `[0, 1]` clip depth.
    pub fn perspective(fov_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = (std::f32::consts::FRAC_PI_2 - 0.5 * fov_radians).tan();
        let range_inv = 1.0 / (near - far);
        Self::from_cols_array([
            f / aspect, 0.0, 0.0, 0.0, //
            0.0, f, 0.0, 0.0, //
            0.0, 0.0, far * range_inv, -1.0, //
            0.0, 0.0, near * far * range_inv, 0.0,
        ])
    }

    /// Orthographic projection with `[0, 1]` clip depth.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::from_cols_array([
            2.0 / (right - left), 0.0, 0.0, 0.0, //
            0.0, 2.0 / (top - bottom), 0.0, 0.0, //
            0.0, 0.0, 1.0 / (near - far), 0.0, //
            (left + right) / (left - right),
            (bottom + top) / (bottom - top),
            near / (near - far),
            1.0,
        ])
    }

    /// Camera world matrix looking from `eye` towards `target`.
    ///
    /// This is the camera-to-world transform; the view matrix is its inverse.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let z = (eye - target).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x).normalize();
        Self::from_cols_array([
            x.x, x.y, x.z, 0.0, //
            y.x, y.y, y.z, 0.0, //
            z.x, z.y, z.z, 0.0, //
            eye.x, eye.y, eye.z, 1.0,
        ])
    }

    pub fn translation(tx: f32, ty: f32, tz: f32) -> Self {
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            tx, ty, tz, 1.0,
        ])
    }

    pub fn rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols_array([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols_array([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Self {
        Self::from_cols_array([
            sx, 0.0, 0.0, 0.0, //
            0.0, sy, 0.0, 0.0, //
            0.0, 0.0, sz, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Matrix product `self * rhs`.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = a[row] * b[col * 4]
                    + a[4 + row] * b[col * 4 + 1]
                    + a[8 + row] * b[col * 4 + 2]
                    + a[12 + row] * b[col * 4 + 3];
            }
        }
        Mat4::from_cols_array(out)
    }

    #[inline]
    pub fn translate(&self, tx: f32, ty: f32, tz: f32) -> Mat4 {
        self.multiply(&Mat4::translation(tx, ty, tz))
    }

    #[inline]
    pub fn rotate_x(&self, radians: f32) -> Mat4 {
        self.multiply(&Mat4::rotation_x(radians))
    }

    #[inline]
    pub fn rotate_y(&self, radians: f32) -> Mat4 {
        self.multiply(&Mat4::rotation_y(radians))
    }

    #[inline]
    pub fn rotate_z(&self, radians: f32) -> Mat4 {
        self.multiply(&Mat4::rotation_z(radians))
    }

    #[inline]
    pub fn scale(&self, sx: f32, sy: f32, sz: f32) -> Mat4 {
        self.multiply(&Mat4::scaling(sx, sy, sz))
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[row * 4 + col] = self.m[col * 4 + row];
            }
        }
        Mat4::from_cols_array(out)
    }

    pub fn determinant(&self) -> f32 {
        let c = Cofactors::of(&self.m);
        c.determinant()
    }

    /// Inverse, or [`SingularMatrix`] when the determinant is zero or the
    /// result would not be finite.
    pub fn try_inverse(&self) -> Result<Mat4, SingularMatrix> {
        let a = &self.m;
        let c = Cofactors::of(a);
        let det = c.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(SingularMatrix);
        }
        let inv = 1.0 / det;

        let out = [
            (a[5] * c.b11 - a[6] * c.b10 + a[7] * c.b09) * inv,
            (a[2] * c.b10 - a[1] * c.b11 - a[3] * c.b09) * inv,
            (a[13] * c.b05 - a[14] * c.b04 + a[15] * c.b03) * inv,
            (a[10] * c.b04 - a[9] * c.b05 - a[11] * c.b03) * inv,
            (a[6] * c.b08 - a[4] * c.b11 - a[7] * c.b07) * inv,
            (a[0] * c.b11 - a[2] * c.b08 + a[3] * c.b07) * inv,
            (a[14] * c.b02 - a[12] * c.b05 - a[15] * c.b01) * inv,
            (a[8] * c.b05 - a[10] * c.b02 + a[11] * c.b01) * inv,
            (a[4] * c.b10 - a[5] * c.b08 + a[7] * c.b06) * inv,
            (a[1] * c.b08 - a[0] * c.b10 - a[3] * c.b06) * inv,
            (a[12] * c.b04 - a[13] * c.b02 + a[15] * c.b00) * inv,
            (a[9] * c.b02 - a[8] * c.b04 - a[11] * c.b00) * inv,
            (a[5] * c.b07 - a[4] * c.b09 - a[6] * c.b06) * inv,
            (a[0] * c.b09 - a[1] * c.b07 + a[2] * c.b06) * inv,
            (a[13] * c.b01 - a[12] * c.b03 - a[14] * c.b00) * inv,
            (a[8] * c.b03 - a[9] * c.b01 + a[10] * c.b00) * inv,
        ];

        if out.iter().any(|v| !v.is_finite()) {
            return Err(SingularMatrix);
        }
        Ok(Mat4::from_cols_array(out))
    }

    /// Inverse with the identity as the fallback for singular input.
    ///
    /// Never returns NaN; the fallback is deterministic.
    pub fn inverse(&self) -> Mat4 {
        self.try_inverse().unwrap_or_else(|SingularMatrix| {
            log::debug!("inverse of singular matrix requested; using identity");
            Mat4::identity()
        })
    }

    /// Transforms a point (w = 1) and performs the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = self.transform_vec4(Vec4::from_vec3(p, 1.0));
        if v.w != 0.0 && v.w != 1.0 {
            Vec3::new(v.x / v.w, v.y / v.w, v.z / v.w)
        } else {
            v.xyz()
        }
    }

    /// Transforms a direction (w = 0); translation is ignored.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.transform_vec4(Vec4::from_vec3(d, 0.0)).xyz()
    }

    pub fn transform_vec4(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z + m[12] * v.w,
            m[1] * v.x + m[5] * v.y + m[9] * v.z + m[13] * v.w,
            m[2] * v.x + m[6] * v.y + m[10] * v.z + m[14] * v.w,
            m[3] * v.x + m[7] * v.y + m[11] * v.z + m[15] * v.w,
        )
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Mat4, eps: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    #[inline]
    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

/// 2x2 sub-determinants shared by `determinant` and `try_inverse`.
struct Cofactors {
    b00: f32,
    b01: f32,
    b02: f32,
    b03: f32,
    b04: f32,
    b05: f32,
    b06: f32,
    b07: f32,
    b08: f32,
    b09: f32,
    b10: f32,
    b11: f32,
}

impl Cofactors {
    fn of(a: &[f32; 16]) -> Self {
        Self {
            b00: a[0] * a[5] - a[1] * a[4],
            b01: a[0] * a[6] - a[2] * a[4],
            b02: a[0] * a[7] - a[3] * a[4],
            b03: a[1] * a[6] - a[2] * a[5],
            b04: a[1] * a[7] - a[3] * a[5],
            b05: a[2] * a[7] - a[3] * a[6],
            b06: a[8] * a[13] - a[9] * a[12],
            b07: a[8] * a[14] - a[10] * a[12],
            b08: a[8] * a[15] - a[11] * a[12],
            b09: a[9] * a[14] - a[10] * a[13],
            b10: a[9] * a[15] - a[11] * a[13],
            b11: a[10] * a[15] - a[11] * a[14],
        }
    }

    fn determinant(&self) -> f32 {
        self.b00 * self.b11 - self.b01 * self.b10 + self.b02 * self.b09 + self.b03 * self.b08
            - self.b04 * self.b07
            + self.b05 * self.b06
    }
}
