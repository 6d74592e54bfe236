// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 matrix.
//!
//! [`Matrix4`] covers everything the scene graph needs from a general
//! homogeneous transform: TRS construction, projection construction,
//! multiplication, inversion with a defined fallback, decomposition, and
//! export to the float layouts graphics APIs consume.

use core::ops::Mul;

use super::quaternion::Quaternion;
use super::vector::{Vector3, Vector4};

/// Pivots smaller than this are treated as zero during inversion.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A column-major 4×4 matrix stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by OpenGL and most GPU APIs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Matrix4 {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a matrix from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Creates a matrix from 16 values in column-major order.
    #[must_use]
    pub fn from_cols_slice(values: &[f64; 16]) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (i, v) in values.iter().enumerate() {
            cols[i / 4][i % 4] = *v;
        }
        Self { cols }
    }

    /// Returns the columns as a 2-D array.
    #[inline]
    #[must_use]
    pub const fn to_cols_array_2d(self) -> [[f64; 4]; 4] {
        self.cols
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(t: Vector3) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(s: Vector3) -> Self {
        Self {
            cols: [
                [s.x, 0.0, 0.0, 0.0],
                [0.0, s.y, 0.0, 0.0],
                [0.0, 0.0, s.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation from a quaternion.
    #[inline]
    #[must_use]
    pub fn from_rotation(q: Quaternion) -> Self {
        q.to_matrix()
    }

    /// Creates `T * R * S`: scale first, then rotate, then translate.
    #[must_use]
    pub fn from_trs(translation: Vector3, rotation: Quaternion, scale: Vector3) -> Self {
        let r = rotation.to_matrix().cols;
        Self::from_cols(
            [r[0][0] * scale.x, r[0][1] * scale.x, r[0][2] * scale.x, 0.0],
            [r[1][0] * scale.y, r[1][1] * scale.y, r[1][2] * scale.y, 0.0],
            [r[2][0] * scale.z, r[2][1] * scale.z, r[2][2] * scale.z, 0.0],
            [translation.x, translation.y, translation.z, 1.0],
        )
    }

    /// Symmetric perspective projection.
    ///
    /// `fov_y_degrees` is the full vertical field of view. `zoom` scales the
    /// focal length, so `zoom = 2.0` halves the visible extent; `1.0` is the
    /// plain frustum. Camera space looks down -Z and depth maps to `[-1, 1]`.
    #[must_use]
    pub fn perspective(fov_y_degrees: f64, aspect: f64, near: f64, far: f64, zoom: f64) -> Self {
        let f = zoom / (fov_y_degrees.to_radians() * 0.5).tan();
        let range = near - far;
        Self::from_cols(
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) / range, -1.0],
            [0.0, 0.0, 2.0 * far * near / range, 0.0],
        )
    }

    /// Perspective projection from the six clip planes, as `glFrustum`.
    #[must_use]
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        Self::from_cols(
            [2.0 * near / w, 0.0, 0.0, 0.0],
            [0.0, 2.0 * near / h, 0.0, 0.0],
            [(right + left) / w, (top + bottom) / h, -(far + near) / d, -1.0],
            [0.0, 0.0, -2.0 * far * near / d, 0.0],
        )
    }

    /// Orthographic projection, as `glOrtho`.
    #[must_use]
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        Self::from_cols(
            [2.0 / w, 0.0, 0.0, 0.0],
            [0.0, 2.0 / h, 0.0, 0.0],
            [0.0, 0.0, -2.0 / d, 0.0],
            [-(right + left) / w, -(top + bottom) / h, -(far + near) / d, 1.0],
        )
    }

    /// Returns the transpose.
    #[must_use]
    pub fn transpose(self) -> Self {
        let c = &self.cols;
        let mut out = [[0.0; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = c[i][j];
            }
        }
        Self { cols: out }
    }

    /// Determinant, by elimination with partial pivoting.
    #[must_use]
    pub fn determinant(self) -> f64 {
        let mut a = self.to_rows();
        let mut det = 1.0;
        for k in 0..4 {
            let p = pivot_row(&a, k);
            if a[p][k] == 0.0 {
                return 0.0;
            }
            if p != k {
                a.swap(p, k);
                det = -det;
            }
            det *= a[k][k];
            for r in (k + 1)..4 {
                let f = a[r][k] / a[k][k];
                for c in k..4 {
                    a[r][c] -= f * a[k][c];
                }
            }
        }
        det
    }

    /// Returns the inverse, or `None` if the matrix is singular.
    #[must_use]
    pub fn try_inverse(self) -> Option<Self> {
        let mut a = self.to_rows();
        let mut inv = Self::IDENTITY.to_rows();
        for k in 0..4 {
            let p = pivot_row(&a, k);
            if a[p][k].abs() < SINGULAR_EPSILON || !a[p][k].is_finite() {
                return None;
            }
            a.swap(p, k);
            inv.swap(p, k);
            let d = a[k][k];
            for c in 0..4 {
                a[k][c] /= d;
                inv[k][c] /= d;
            }
            for r in 0..4 {
                if r == k {
                    continue;
                }
                let f = a[r][k];
                if f == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    a[r][c] -= f * a[k][c];
                    inv[r][c] -= f * inv[k][c];
                }
            }
        }
        Some(Self::from_rows(inv))
    }

    /// Returns the inverse, or the identity if the matrix is singular.
    ///
    /// Use [`try_inverse`](Self::try_inverse) to detect singularity.
    #[must_use]
    pub fn inverse(self) -> Self {
        self.try_inverse().unwrap_or(Self::IDENTITY)
    }

    /// Transforms a point (implicit `w = 1`) and applies the perspective
    /// divide when the resulting `w` is neither zero nor one.
    #[must_use]
    pub fn transform_point(self, p: Vector3) -> Vector3 {
        let v = self * p.extend(1.0);
        if v.w != 0.0 && v.w != 1.0 {
            v.truncate() / v.w
        } else {
            v.truncate()
        }
    }

    /// Transforms a direction (implicit `w = 0`); translation is ignored.
    #[must_use]
    pub fn transform_vector(self, v: Vector3) -> Vector3 {
        (self * v.extend(0.0)).truncate()
    }

    /// The translation component (column 3).
    #[inline]
    #[must_use]
    pub fn translation(self) -> Vector3 {
        let t = self.cols[3];
        Vector3::new(t[0], t[1], t[2])
    }

    /// The per-axis scale: lengths of the three basis columns.
    ///
    /// A mirrored basis (negative determinant) is reported as a negative X
    /// scale.
    #[must_use]
    pub fn scale(self) -> Vector3 {
        let c = &self.cols;
        let sx = Vector3::new(c[0][0], c[0][1], c[0][2]).length();
        let sy = Vector3::new(c[1][0], c[1][1], c[1][2]).length();
        let sz = Vector3::new(c[2][0], c[2][1], c[2][2]).length();
        if self.basis_determinant() < 0.0 {
            Vector3::new(-sx, sy, sz)
        } else {
            Vector3::new(sx, sy, sz)
        }
    }

    /// The rotation component, with scale divided out.
    ///
    /// Degenerate (zero-scale) bases yield the identity.
    #[must_use]
    pub fn orientation(self) -> Quaternion {
        let s = self.scale();
        if s.x == 0.0 || s.y == 0.0 || s.z == 0.0 {
            return Quaternion::IDENTITY;
        }
        let c = &self.cols;
        let basis = Self::from_cols(
            [c[0][0] / s.x, c[0][1] / s.x, c[0][2] / s.x, 0.0],
            [c[1][0] / s.y, c[1][1] / s.y, c[1][2] / s.y, 0.0],
            [c[2][0] / s.z, c[2][1] / s.z, c[2][2] / s.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        );
        Quaternion::from_matrix(&basis)
    }

    /// Column-major `f32` values, ready for a uniform upload.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU buffers are single precision"
    )]
    pub fn to_gl(self) -> [f32; 16] {
        let mut out = [0.0_f32; 16];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.cols[i / 4][i % 4] as f32;
        }
        out
    }

    /// Column-major upper-left 3×3 block as `f32`, for normal matrices and
    /// rotation-only uniforms.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU buffers are single precision"
    )]
    pub fn to_gl_rotation(self) -> [f32; 9] {
        let mut out = [0.0_f32; 9];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.cols[i / 3][i % 3] as f32;
        }
        out
    }

    /// Element-wise comparison within an absolute `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Is this matrix [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Is any element [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|v| v.is_nan())
    }

    fn basis_determinant(self) -> f64 {
        let c = &self.cols;
        let x = Vector3::new(c[0][0], c[0][1], c[0][2]);
        let y = Vector3::new(c[1][0], c[1][1], c[1][2]);
        let z = Vector3::new(c[2][0], c[2][1], c[2][2]);
        x.cross(y).dot(z)
    }

    fn to_rows(self) -> [[f64; 4]; 4] {
        self.transpose().cols
    }

    fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { cols: rows }.transpose()
    }
}

/// Index of the row at or below `k` with the largest magnitude in column `k`.
fn pivot_row(a: &[[f64; 4]; 4], k: usize) -> usize {
    let mut best = k;
    for r in (k + 1)..4 {
        if a[r][k].abs() > a[best][k].abs() {
            best = r;
        }
    }
    best
}

impl Default for Matrix4 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;

    #[inline]
    fn mul(self, v: Vector4) -> Vector4 {
        let c = &self.cols;
        let row = |i: usize| c[0][i] * v.x + c[1][i] * v.y + c[2][i] * v.z + c[3][i] * v.w;
        Vector4::new(row(0), row(1), row(2), row(3))
    }
}

/// Point transform with perspective divide, see [`Matrix4::transform_point`].
impl Mul<Vector3> for Matrix4 {
    type Output = Vector3;

    #[inline]
    fn mul(self, p: Vector3) -> Vector3 {
        self.transform_point(p)
    }
}
