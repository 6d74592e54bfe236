// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-thread pose handoff.
//!
//! The render thread is the only mutator of a [`NodeStore`]. Producers on
//! other threads (trackers, sensor callbacks) publish into a [`PoseWriter`];
//! the render thread drains the matching [`PoseSlot`] once per frame. The slot
//! keeps only the latest value, so a slow render thread never sees a backlog.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::math::{Quaternion, Vector3};
use crate::node::{NodeId, NodeStore};

/// A pose to write into a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseUpdate {
    /// Target node, typically a tracked World.
    pub node: NodeId,
    /// New local position.
    pub position: Vector3,
    /// New local orientation.
    pub orientation: Quaternion,
}

/// Render-thread end of a single-slot latest-value buffer.
#[derive(Debug, Default)]
pub struct PoseSlot {
    latest: Arc<Mutex<Option<PoseUpdate>>>,
}

/// Producer end of a [`PoseSlot`]. Cheap to clone and `Send`.
#[derive(Clone, Debug)]
pub struct PoseWriter {
    latest: Arc<Mutex<Option<PoseUpdate>>>,
}

impl PoseSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a writer publishing into this slot.
    #[must_use]
    pub fn writer(&self) -> PoseWriter {
        PoseWriter {
            latest: Arc::clone(&self.latest),
        }
    }

    /// Takes the pending update, if any.
    pub fn take(&self) -> Option<PoseUpdate> {
        self.latest.lock().take()
    }

    /// Applies the pending update through the node mutation API.
    ///
    /// Returns `true` if an update was written. Updates addressed to a node
    /// that no longer exists are dropped with a warning.
    pub fn apply(&self, store: &mut NodeStore) -> bool {
        let Some(update) = self.take() else {
            return false;
        };
        if !store.is_alive(update.node) {
            log::warn!("dropping pose for destroyed node {:?}", update.node);
            return false;
        }
        store.set_position(update.node, update.position);
        store.set_orientation(update.node, update.orientation);
        true
    }
}

impl PoseWriter {
    /// Publishes a pose, replacing any update not yet applied.
    pub fn publish(&self, update: PoseUpdate) {
        *self.latest.lock() = Some(update);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn latest_value_wins() {
        let mut store = NodeStore::new();
        let world = store.create_world();
        let slot = PoseSlot::new();
        let writer = slot.writer();

        for i in 1..=3 {
            writer.publish(PoseUpdate {
                node: world,
                position: Vector3::new(f64::from(i), 0.0, 0.0),
                orientation: Quaternion::IDENTITY,
            });
        }
        assert!(slot.apply(&mut store));
        assert_eq!(store.position(world), Vector3::new(3.0, 0.0, 0.0));
        assert!(!slot.apply(&mut store));
    }

    #[test]
    fn publish_from_another_thread() {
        let mut store = NodeStore::new();
        let world = store.create_world();
        let child = store.create_node();
        store.add_child(world, child).unwrap();
        let _ = store.world_transform(child);

        let slot = PoseSlot::new();
        let writer = slot.writer();
        let turn = Quaternion::from_axis_angle_degrees(Vector3::Y, 90.0);
        thread::spawn(move || {
            writer.publish(PoseUpdate {
                node: world,
                position: Vector3::new(0.0, 0.0, -2.0),
                orientation: turn,
            });
        })
        .join()
        .unwrap();

        assert!(slot.apply(&mut store));
        assert_eq!(store.orientation(world), turn);
        assert!(store.is_transform_dirty(child));
    }

    #[test]
    fn stale_target_is_dropped() {
        let mut store = NodeStore::new();
        let node = store.create_node();
        let slot = PoseSlot::new();
        slot.writer().publish(PoseUpdate {
            node,
            position: Vector3::ONE,
            orientation: Quaternion::IDENTITY,
        });
        store.destroy_node(node).unwrap();
        assert!(!slot.apply(&mut store));
    }
}
