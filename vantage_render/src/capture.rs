// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identifiers encoded as capture-buffer colours.
//!
//! The capture pass draws every visible mesh in a flat colour that encodes
//! the node's slot index plus one in the RGB channels. Zero is reserved for
//! "nothing here". A [`CaptureTable`] built during the pass maps colours back
//! to full generational handles.

use hashbrown::HashMap;
use vantage_core::node::NodeId;

/// Largest encodable key (24 bits of RGB).
const MAX_KEY: u32 = 0x00FF_FFFF;

/// An RGBA8 capture-buffer value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CaptureColour(pub [u8; 4]);

impl CaptureColour {
    /// The cleared value: no node.
    pub const NONE: Self = Self([0, 0, 0, 0]);

    /// Encodes a node. Returns `None` if the slot index does not fit.
    #[must_use]
    pub fn for_node(node: NodeId) -> Option<Self> {
        let key = node.index().checked_add(1).filter(|k| *k <= MAX_KEY)?;
        let [_, r, g, b] = key.to_be_bytes();
        Some(Self([r, g, b, 255]))
    }

    /// The encoded key, or `None` for the cleared value.
    #[must_use]
    pub fn key(self) -> Option<u32> {
        let [r, g, b, _] = self.0;
        let key = u32::from_be_bytes([0, r, g, b]);
        (key != 0).then_some(key)
    }
}

/// Colour-to-node lookup table for one capture pass.
#[derive(Clone, Debug, Default)]
pub struct CaptureTable {
    nodes: HashMap<u32, NodeId>,
}

impl CaptureTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a colour to `node` and remembers it.
    pub fn insert(&mut self, node: NodeId) -> Option<CaptureColour> {
        let colour = CaptureColour::for_node(node);
        match colour.and_then(CaptureColour::key) {
            Some(key) => {
                self.nodes.insert(key, node);
            }
            None => log::warn!("{node:?} cannot be encoded in the capture buffer"),
        }
        colour
    }

    /// The node drawn in `colour`, if any.
    #[must_use]
    pub fn lookup(&self, colour: CaptureColour) -> Option<NodeId> {
        self.nodes.get(&colour.key()?).copied()
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Number of distinct nodes recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use vantage_core::node::NodeStore;

    use super::*;

    #[test]
    fn first_slot_is_not_the_empty_colour() {
        let mut store = NodeStore::new();
        let n = store.create_node();
        let c = CaptureColour::for_node(n).unwrap();
        assert_eq!(c, CaptureColour([0, 0, 1, 255]));
        assert_eq!(CaptureColour::NONE.key(), None);
    }

    #[test]
    fn table_resolves_generation() {
        let mut store = NodeStore::new();
        let old = store.create_node();
        store.destroy_node(old).unwrap();
        let new = store.create_node();

        let mut table = CaptureTable::new();
        let c = table.insert(new).unwrap();
        assert_eq!(table.lookup(c), Some(new));
        assert_ne!(table.lookup(c), Some(old));
        assert_eq!(table.lookup(CaptureColour::NONE), None);
        assert_eq!(table.len(), 1);
        table.clear();
        assert!(table.is_empty());
    }
}
