// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity types.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`NodeStore`](super::NodeStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics and capture encoding).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// What role a node plays in the hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An ordinary transform node.
    #[default]
    Node,
    /// A coordinate-space root. World-transform queries stop ascending at the
    /// nearest ancestor of this kind.
    World,
    /// A render root carrying a [`Camera`](crate::camera::Camera).
    Camera,
    /// A node that turns to face its render root, per its
    /// [`Billboard`](crate::billboard::Billboard) parameters.
    Billboard,
}

/// The basis a relative transform edit is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransformSpace {
    /// The node's own axes.
    #[default]
    Local,
    /// The parent's axes.
    Parent,
    /// The axes of the nearest enclosing World.
    World,
}

/// Handle returned by [`NodeStore::add_touch_target`](super::NodeStore::add_touch_target).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchTargetId(pub(crate) u32);

impl fmt::Debug for TouchTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TouchTargetId({})", self.0)
    }
}
