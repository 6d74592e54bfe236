// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node touch callback registry.

use core::fmt;

use super::id::{NodeId, TouchTargetId};

/// Callback run when the owning node is picked.
pub type TouchAction = Box<dyn FnMut(NodeId)>;

/// Ordered list of touch callbacks for one node.
#[derive(Default)]
pub(crate) struct TouchTargets {
    entries: Vec<(TouchTargetId, TouchAction)>,
}

impl fmt::Debug for TouchTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchTargets")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl TouchTargets {
    pub(crate) fn push(&mut self, id: TouchTargetId, action: TouchAction) {
        self.entries.push((id, action));
    }

    pub(crate) fn remove(&mut self, id: TouchTargetId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Runs every callback in registration order.
    pub(crate) fn fire(&mut self, node: NodeId) -> usize {
        for (_, action) in &mut self.entries {
            action(node);
        }
        self.entries.len()
    }
}
