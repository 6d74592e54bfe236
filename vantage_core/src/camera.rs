// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera projection parameters.
//!
//! A camera is a node whose [`NodeKind`](crate::node::NodeKind) is `Camera`.
//! The node supplies the pose; the [`Camera`] value stored alongside it
//! supplies the projection. The eye transform of every node below a camera is
//! expressed relative to that camera, which makes the camera the render root
//! of whichever viewport is bound to it.

use kurbo::{Point, Vec2};

use crate::math::Matrix4;
use crate::output::ViewPortId;

/// Projection matrix and frustum parameters of a camera node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Eye-to-clip projection.
    pub projection: Matrix4,
    /// Distance to the near clip plane.
    pub near: f64,
    /// Distance to the far clip plane.
    pub far: f64,
    /// Offset of the optical axis in normalized device coordinates.
    /// `(0, 0)` is a centred axis.
    pub principal_point: Point,
    /// Horizontal (`x`) and vertical (`y`) field of view in degrees.
    pub fov: Vec2,
    pub(crate) viewport: Option<ViewPortId>,
}

impl Camera {
    /// Symmetric perspective camera.
    #[must_use]
    pub fn perspective(fov_y_degrees: f64, aspect: f64, near: f64, far: f64) -> Self {
        let half_y = (fov_y_degrees.to_radians() * 0.5).tan();
        let fov_x = (half_y * aspect).atan().to_degrees() * 2.0;
        Self {
            projection: Matrix4::perspective(fov_y_degrees, aspect, near, far, 1.0),
            near,
            far,
            principal_point: Point::ZERO,
            fov: Vec2::new(fov_x, fov_y_degrees),
            viewport: None,
        }
    }

    /// Camera built from pinhole intrinsics of an image `width` by `height`
    /// pixels, with focal lengths `fx`, `fy` and principal point `(cx, cy)` in
    /// pixels (origin top-left, y down).
    #[must_use]
    pub fn from_intrinsics(
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        width: f64,
        height: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let d = far - near;
        let offset_x = (width - 2.0 * cx) / width;
        let offset_y = (2.0 * cy - height) / height;
        let projection = Matrix4::from_cols(
            [2.0 * fx / width, 0.0, 0.0, 0.0],
            [0.0, 2.0 * fy / height, 0.0, 0.0],
            [offset_x, offset_y, -(far + near) / d, -1.0],
            [0.0, 0.0, -2.0 * far * near / d, 0.0],
        );
        Self {
            projection,
            near,
            far,
            principal_point: Point::new(-offset_x, -offset_y),
            fov: Vec2::new(
                (width / (2.0 * fx)).atan().to_degrees() * 2.0,
                (height / (2.0 * fy)).atan().to_degrees() * 2.0,
            ),
            viewport: None,
        }
    }

    /// Near and far plane distances as a pair.
    #[inline]
    #[must_use]
    pub fn frustum_plane_distance(&self) -> (f64, f64) {
        (self.near, self.far)
    }

    /// The viewport currently using this camera as its render root.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Option<ViewPortId> {
        self.viewport
    }
}

impl Default for Camera {
    /// A 60° vertical field of view, square aspect, clipping at 0.1 and 1000.
    fn default() -> Self {
        Self::perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    #[test]
    fn centred_intrinsics_match_perspective() {
        let (w, h) = (640.0, 480.0);
        let f = 500.0;
        let cam = Camera::from_intrinsics(f, f, w / 2.0, h / 2.0, w, h, 0.5, 200.0);
        let fov_y = (h / (2.0 * f)).atan().to_degrees() * 2.0;
        let reference = Camera::perspective(fov_y, w / h, 0.5, 200.0);
        assert!(cam.projection.approx_eq(&reference.projection, 1e-9));
        assert!((cam.fov.y - reference.fov.y).abs() < 1e-9);
        assert!((cam.fov.x - reference.fov.x).abs() < 1e-9);
        assert_eq!(cam.principal_point, Point::ZERO);
    }

    #[test]
    fn principal_point_offsets_optical_axis() {
        let (w, h) = (100.0, 100.0);
        let cam = Camera::from_intrinsics(50.0, 50.0, 75.0, 25.0, w, h, 1.0, 10.0);
        let ndc = cam
            .projection
            .transform_point(Vector3::new(0.0, 0.0, -2.0));
        assert!((ndc.x - cam.principal_point.x).abs() < 1e-9);
        assert!((ndc.y - cam.principal_point.y).abs() < 1e-9);
        // Right of centre and above centre in screen terms.
        assert!(ndc.x > 0.0 && ndc.y > 0.0);
    }

    #[test]
    fn default_is_detached() {
        let cam = Camera::default();
        assert_eq!(cam.viewport(), None);
        assert_eq!(cam.frustum_plane_distance(), (0.1, 1000.0));
    }
}
