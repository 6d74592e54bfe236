// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived transforms and relative transform edits.
//!
//! Invalidation is eager (see [`NodeStore::mark_world_transform_as_dirty`]);
//! recomputation is lazy and per node. A read walks up only as far as the
//! first ancestor whose cache is still fresh, and clears just the stale flag of
//! each node it actually recomputes.

use crate::math::{Matrix4, Quaternion, Vector3};

use super::id::{INVALID, NodeId, NodeKind, TransformSpace};
use super::store::{Derived, NodeStore};

impl NodeStore {
    /// Returns the derived transforms of slot `idx`, recomputing if stale.
    pub(crate) fn resolve(&self, idx: u32) -> Derived {
        let slot = idx as usize;
        if !self.stale[slot].get() {
            return self.derived[slot].get();
        }

        let p = self.parent[slot];
        let parent = (p != INVALID).then(|| (self.kind[p as usize], self.resolve(p)));

        let position = self.position[slot];
        let mut orientation = self.orientation[slot];
        if let Some(billboard) = self.billboards.get(&idx) {
            // The render root sits at the eye-space origin.
            let (to_camera, parent_axes) = match parent {
                Some((_, pd)) => (-pd.full.transform_point(position), pd.full_orientation),
                None => (-position, Quaternion::IDENTITY),
            };
            let to_camera = parent_axes.inverse().rotate(to_camera);
            orientation = billboard.facing(to_camera, orientation);
        }
        let local = Matrix4::from_trs(position, orientation, self.scale[slot]);

        let (world, world_orientation) = match parent {
            Some((kind, pd)) if !starts_world_chain(kind) => {
                (pd.world * local, pd.world_orientation * orientation)
            }
            // Roots and direct children of a World or Camera start a new
            // world chain.
            _ => (local, orientation),
        };

        let (full, full_orientation) = if self.kind[slot] == NodeKind::Camera {
            let view = local.try_inverse().unwrap_or_else(|| {
                log::warn!(
                    "camera {:?} has a singular pose; using identity eye transform",
                    self.id_at(idx)
                );
                Matrix4::IDENTITY
            });
            (view, orientation.inverse())
        } else if let Some((_, pd)) = parent {
            (pd.full * local, pd.full_orientation * orientation)
        } else {
            (local, orientation)
        };

        let derived = Derived {
            local,
            world,
            full,
            world_orientation,
            full_orientation,
        };
        self.derived[slot].set(derived);
        self.stale[slot].set(false);
        derived
    }

    /// Orientation of the basis `id`'s position is expressed in, relative to
    /// its World.
    fn parent_world_orientation(&self, idx: u32) -> Quaternion {
        let p = self.parent[idx as usize];
        if p == INVALID || starts_world_chain(self.kind[p as usize]) {
            Quaternion::IDENTITY
        } else {
            self.resolve(p).world_orientation
        }
    }

    // -- Derived accessors --

    /// Local TRS matrix.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Matrix4 {
        self.validate(id);
        self.resolve(id.idx).local
    }

    /// Transform from local space into the space of the nearest enclosing
    /// World or Camera. Nodes outside both compose all the way to their root.
    ///
    /// Between a root camera and the first World below it,
    /// `full_transform(n) == full_transform(camera) * world_transform(n)`.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Matrix4 {
        self.validate(id);
        self.resolve(id.idx).world
    }

    /// Transform from local space into the eye space of the render root.
    ///
    /// For a camera node this is the view matrix (inverse of its pose). Nodes
    /// with no camera above them compose from an identity base.
    #[must_use]
    pub fn full_transform(&self, id: NodeId) -> Matrix4 {
        self.validate(id);
        self.resolve(id.idx).full
    }

    /// Accumulated orientation up to the nearest World.
    #[must_use]
    pub fn world_orientation(&self, id: NodeId) -> Quaternion {
        self.validate(id);
        self.resolve(id.idx).world_orientation
    }

    /// Position in World space.
    #[must_use]
    pub fn world_position(&self, id: NodeId) -> Vector3 {
        self.world_transform(id).translation()
    }

    /// Scale in World space.
    #[must_use]
    pub fn world_scale(&self, id: NodeId) -> Vector3 {
        self.world_transform(id).scale()
    }

    /// Position in eye space.
    #[must_use]
    pub fn full_position(&self, id: NodeId) -> Vector3 {
        self.full_transform(id).translation()
    }

    /// Orientation in eye space.
    #[must_use]
    pub fn full_orientation(&self, id: NodeId) -> Quaternion {
        self.validate(id);
        self.resolve(id.idx).full_orientation
    }

    /// Scale in eye space.
    #[must_use]
    pub fn full_scale(&self, id: NodeId) -> Vector3 {
        self.full_transform(id).scale()
    }

    // -- Conversions --

    /// Maps a point in `id`'s local space into World space.
    #[must_use]
    pub fn position_to_world(&self, id: NodeId, point: Vector3) -> Vector3 {
        self.world_transform(id).transform_point(point)
    }

    /// Maps a point in `id`'s local space into eye space.
    #[must_use]
    pub fn position_to_eye(&self, id: NodeId, point: Vector3) -> Vector3 {
        self.full_transform(id).transform_point(point)
    }

    /// Maps an orientation relative to `id` into World space.
    #[must_use]
    pub fn orientation_to_world(&self, id: NodeId, orientation: Quaternion) -> Quaternion {
        self.world_orientation(id) * orientation
    }

    /// Maps an orientation relative to `id` into eye space.
    #[must_use]
    pub fn orientation_to_eye(&self, id: NodeId, orientation: Quaternion) -> Quaternion {
        self.full_orientation(id) * orientation
    }

    // -- Relative edits --

    /// Moves the node by `delta` expressed in `space`.
    ///
    /// World-space deltas are un-rotated by the accumulated orientation of the
    /// parent chain only. The step is not divided by ancestor scale, so a
    /// scaled parent lengthens it in World space.
    pub fn translate_by(&mut self, id: NodeId, delta: Vector3, space: TransformSpace) {
        self.validate(id);
        let idx = id.idx;
        let step = match space {
            TransformSpace::Local => self.orientation[idx as usize].rotate(delta),
            TransformSpace::Parent => delta,
            TransformSpace::World => self.parent_world_orientation(idx).inverse().rotate(delta),
        };
        self.position[idx as usize] = self.position[idx as usize] + step;
        self.mark_transform_dirty(idx);
    }

    /// Rotates the node by `rotation` expressed in `space`.
    pub fn rotate_by(&mut self, id: NodeId, rotation: Quaternion, space: TransformSpace) {
        self.validate(id);
        let idx = id.idx;
        let current = self.orientation[idx as usize];
        let next = match space {
            TransformSpace::Local => current * rotation,
            TransformSpace::Parent => rotation * current,
            TransformSpace::World => {
                let w = self.parent_world_orientation(idx);
                w.inverse() * rotation * w * current
            }
        };
        self.orientation[idx as usize] = next.normalize();
        self.mark_transform_dirty(idx);
    }

    /// Rotates the node about `axis` by `degrees`.
    pub fn rotate_by_degrees(
        &mut self,
        id: NodeId,
        axis: Vector3,
        degrees: f64,
        space: TransformSpace,
    ) {
        self.rotate_by(id, Quaternion::from_axis_angle_degrees(axis, degrees), space);
    }

    /// Rotates the node about `axis` by `radians`.
    pub fn rotate_by_radians(
        &mut self,
        id: NodeId,
        axis: Vector3,
        radians: f64,
        space: TransformSpace,
    ) {
        self.rotate_by(id, Quaternion::from_axis_angle_radians(axis, radians), space);
    }

    /// Multiplies the local scale component-wise by `factors`.
    pub fn scale_by(&mut self, id: NodeId, factors: Vector3) {
        self.validate(id);
        let idx = id.idx as usize;
        self.scale[idx] = self.scale[idx] * factors;
        self.mark_transform_dirty(id.idx);
    }
}

/// Children of these kinds express their world transform in the parent's
/// frame rather than composing through it.
fn starts_world_chain(parent: NodeKind) -> bool {
    matches!(parent, NodeKind::World | NodeKind::Camera)
}
