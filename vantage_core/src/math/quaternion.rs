// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotation quaternions.
//!
//! Two products are defined and they are deliberately kept apart:
//!
//! - `q * r` ([`Mul<Quaternion>`]) is the Hamilton product, i.e. rotation
//!   composition: applying `q * r` to a vector rotates by `r` first, then `q`.
//! - [`Quaternion::component_mul`] multiplies the four components pairwise and
//!   has no rotational meaning. [`component_add`](Quaternion::component_add)
//!   and [`component_sub`](Quaternion::component_sub) are its siblings.
//!
//! Vectors are rotated with [`Quaternion::rotate`] (or `q * v`).

use core::ops::{Mul, Neg};

use super::matrix::Matrix4;
use super::vector::Vector3;

/// A quaternion `(x, y, z, w)` with `w` as the scalar part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    /// X component of the vector part.
    pub x: f64,
    /// Y component of the vector part.
    pub y: f64,
    /// Z component of the vector part.
    pub z: f64,
    /// Scalar part.
    pub w: f64,
}

impl Quaternion {
    /// The identity rotation, `(0, 0, 0, 1)`.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a quaternion from raw components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `radians` around `axis`.
    ///
    /// The axis does not need to be normalized. A zero axis yields the
    /// identity.
    #[must_use]
    pub fn from_axis_angle_radians(axis: Vector3, radians: f64) -> Self {
        let axis = axis.normalize();
        if axis == Vector3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = (radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Rotation of `degrees` around `axis`.
    #[inline]
    #[must_use]
    pub fn from_axis_angle_degrees(axis: Vector3, degrees: f64) -> Self {
        Self::from_axis_angle_radians(axis, degrees.to_radians())
    }

    /// Extracts the rotation from the upper-left 3x3 block of `m`.
    ///
    /// The block is assumed to be a pure rotation. Use
    /// [`Matrix4::orientation`] to strip scale first.
    #[must_use]
    pub fn from_matrix(m: &Matrix4) -> Self {
        let c = &m.cols;
        // Row r, column k is `c[k][r]`.
        let (m00, m01, m02) = (c[0][0], c[1][0], c[2][0]);
        let (m10, m11, m12) = (c[0][1], c[1][1], c[2][1]);
        let (m20, m21, m22) = (c[0][2], c[1][2], c[2][2]);
        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Returns the rotation as a 4x4 matrix.
    #[must_use]
    pub fn to_matrix(self) -> Matrix4 {
        let Self { x, y, z, w } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Matrix4::from_cols(
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy), 0.0],
            [2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx), 0.0],
            [2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub fn component_add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }

    /// Component-wise difference.
    #[inline]
    #[must_use]
    pub fn component_sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }

    /// Component-wise product. This is not rotation composition.
    #[inline]
    #[must_use]
    pub fn component_mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z, self.w * rhs.w)
    }

    /// Scales all four components by `s`.
    #[inline]
    #[must_use]
    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// Four-component dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    /// Quaternion norm.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit quaternion, or the identity if `self` is zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            self.scale(1.0 / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Negates the vector part.
    #[inline]
    #[must_use]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Multiplicative inverse, `conjugate / |q|²`.
    ///
    /// The zero quaternion has no inverse; the identity is returned instead.
    #[must_use]
    pub fn inverse(self) -> Self {
        let len_sq = self.dot(self);
        if len_sq > 0.0 {
            self.conjugate().scale(1.0 / len_sq)
        } else {
            Self::IDENTITY
        }
    }

    /// Rotates `v` by this quaternion (`q v q⁻¹` for a unit `q`).
    #[must_use]
    pub fn rotate(self, v: Vector3) -> Vector3 {
        // t = 2 * (u x v); v' = v + w t + u x t
        let u = Vector3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Spherical linear interpolation along the shorter arc.
    ///
    /// `t` outside `[0, 1]` extrapolates along the same great circle. When
    /// `other` lies in the opposite hemisphere the shorter arc runs towards
    /// `-other`; results past the midpoint are negated so that `t = 1`
    /// returns `other` itself. Both signs describe the same rotation.
    #[must_use]
    pub fn slerp(self, other: Self, t: f64) -> Self {
        let flipped = self.dot(other) < 0.0;
        let end = if flipped { -other } else { other };
        // Stable for nearly equal inputs, where acos of the dot is not.
        let theta = 2.0
            * self
                .component_sub(end)
                .length()
                .atan2(self.component_add(end).length());
        let sin_theta = theta.sin();
        let q = if sin_theta > f64::EPSILON {
            let a = ((1.0 - t) * theta).sin() / sin_theta;
            let b = (t * theta).sin() / sin_theta;
            self.scale(a).component_add(end.scale(b))
        } else {
            self.component_add(end.component_sub(self).scale(t)).normalize()
        };
        if flipped && t > 0.5 { -q } else { q }
    }

    /// Component-wise comparison within an absolute `tolerance`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
            && (self.w - other.w).abs() <= tolerance
    }
}

impl Default for Quaternion {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: rotation composition.
impl Mul for Quaternion {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vector3> for Quaternion {
    type Output = Vector3;

    #[inline]
    fn mul(self, rhs: Vector3) -> Vector3 {
        self.rotate(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}
