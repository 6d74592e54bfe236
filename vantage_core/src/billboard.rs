// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera-facing orientation for billboard nodes.
//!
//! A billboard is a node whose [`NodeKind`](crate::node::NodeKind) is
//! `Billboard`. Its stored orientation is replaced, when transforms are
//! derived, by the rotation that aims its [`forward`](Billboard::forward)
//! vector at the render root (the eye-space origin). Locked axes keep the
//! node's own rotation about that axis instead.

use crate::math::{Quaternion, Vector3};

/// Facing parameters of a billboard node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Billboard {
    /// Local axis that is turned towards the camera.
    pub forward: Vector3,
    /// Keep the node's own rotation about its X axis.
    pub lock_x: bool,
    /// Keep the node's own rotation about its Y axis.
    pub lock_y: bool,
    /// Keep the node's own rotation about its Z axis.
    pub lock_z: bool,
}

impl Billboard {
    /// An unlocked billboard aiming `forward` at the camera.
    #[must_use]
    pub const fn new(forward: Vector3) -> Self {
        Self {
            forward,
            lock_x: false,
            lock_y: false,
            lock_z: false,
        }
    }

    /// Returns a copy with the given axis locks.
    #[must_use]
    pub const fn with_locks(mut self, x: bool, y: bool, z: bool) -> Self {
        self.lock_x = x;
        self.lock_y = y;
        self.lock_z = z;
        self
    }

    /// Local orientation that turns [`forward`](Self::forward) onto
    /// `to_camera`, a direction expressed in the parent's axes.
    ///
    /// `own` is the node's stored orientation. It supplies the angle of every
    /// locked axis, and is returned unchanged if `to_camera` has no
    /// direction.
    #[must_use]
    pub fn facing(&self, to_camera: Vector3, own: Quaternion) -> Quaternion {
        if to_camera.length_squared() <= f64::EPSILON {
            return own;
        }
        let aim = self.forward.rotation_to(to_camera);
        if !(self.lock_x || self.lock_y || self.lock_z) {
            return aim;
        }
        let aim = euler_xyz(aim);
        let own = euler_xyz(own);
        let pick = |locked: bool, kept: f64, aimed: f64| if locked { kept } else { aimed };
        from_euler_xyz([
            pick(self.lock_x, own[0], aim[0]),
            pick(self.lock_y, own[1], aim[1]),
            pick(self.lock_z, own[2], aim[2]),
        ])
    }
}

impl Default for Billboard {
    /// Local +Z faces the camera, which suits quads built in the XY plane.
    fn default() -> Self {
        Self::new(Vector3::Z)
    }
}

/// Angles `[x, y, z]` in radians such that `q = Rx * Ry * Rz`.
fn euler_xyz(q: Quaternion) -> [f64; 3] {
    let q = q.normalize();
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let r00 = 1.0 - 2.0 * (y * y + z * z);
    let r01 = 2.0 * (x * y - w * z);
    let r02 = 2.0 * (x * z + w * y);
    let r11 = 1.0 - 2.0 * (x * x + z * z);
    let r12 = 2.0 * (y * z - w * x);
    let r21 = 2.0 * (y * z + w * x);
    let r22 = 1.0 - 2.0 * (x * x + y * y);

    let ay = r02.clamp(-1.0, 1.0).asin();
    if r02.abs() > 1.0 - 1e-9 {
        // Gimbal lock: only x + z is determined, so fold it all into x.
        return [r21.atan2(r11), ay, 0.0];
    }
    [(-r12).atan2(r22), ay, (-r01).atan2(r00)]
}

fn from_euler_xyz([ax, ay, az]: [f64; 3]) -> Quaternion {
    Quaternion::from_axis_angle_radians(Vector3::X, ax)
        * Quaternion::from_axis_angle_radians(Vector3::Y, ay)
        * Quaternion::from_axis_angle_radians(Vector3::Z, az)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn euler_round_trip() {
        let q = Quaternion::from_axis_angle_degrees(Vector3::X, 20.0)
            * Quaternion::from_axis_angle_degrees(Vector3::Y, -35.0)
            * Quaternion::from_axis_angle_degrees(Vector3::Z, 70.0);
        let [x, y, z] = euler_xyz(q);
        assert!((x.to_degrees() - 20.0).abs() < 1e-6);
        assert!((y.to_degrees() + 35.0).abs() < 1e-6);
        assert!((z.to_degrees() - 70.0).abs() < 1e-6);
        assert!(from_euler_xyz([x, y, z]).approx_eq(q, EPS));
    }

    #[test]
    fn unlocked_billboard_aims_forward_at_camera() {
        let b = Billboard::default();
        let to_camera = Vector3::new(-1.0, 0.5, 1.0);
        let q = b.facing(to_camera, Quaternion::IDENTITY);
        assert!(q.rotate(b.forward).approx_eq(to_camera.normalize(), EPS));
    }

    #[test]
    fn locked_axis_keeps_own_rotation() {
        // The camera is 45° to the left: only a turn about Y reaches it.
        let to_camera = Vector3::new(-1.0, 0.0, 1.0);
        let free = Billboard::default().facing(to_camera, Quaternion::IDENTITY);
        let turn = Quaternion::from_axis_angle_degrees(Vector3::Y, -45.0);
        assert!(free.approx_eq(turn, EPS) || free.approx_eq(-turn, EPS));

        let own = Quaternion::from_axis_angle_degrees(Vector3::Y, 10.0);
        let locked = Billboard::default()
            .with_locks(false, true, false)
            .facing(to_camera, own);
        assert!(locked.approx_eq(own, EPS) || locked.approx_eq(-own, EPS));

        let x_locked = Billboard::default()
            .with_locks(true, false, false)
            .facing(to_camera, Quaternion::IDENTITY);
        assert!(x_locked.rotate(Vector3::Z).approx_eq(to_camera.normalize(), EPS));
    }

    #[test]
    fn no_direction_keeps_own_orientation() {
        let own = Quaternion::from_axis_angle_degrees(Vector3::X, 30.0);
        assert_eq!(Billboard::default().facing(Vector3::ZERO, own), own);
    }
}
