// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the direct children of a node.
///
/// Created by [`NodeStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a NodeStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A depth-first, pre-order iterator over the strict descendants of a node.
///
/// Created by [`NodeStore::descendants`] and
/// [`NodeStore::visible_descendants`]. The latter skips hidden nodes together
/// with their whole subtree.
#[derive(Debug)]
pub struct Descendants<'a> {
    store: &'a NodeStore,
    stack: Vec<u32>,
    skip_hidden: bool,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(store: &'a NodeStore, root: u32, skip_hidden: bool) -> Self {
        let first = store.first_child[root as usize];
        let mut stack = Vec::new();
        if first != INVALID {
            stack.push(first);
        }
        Self {
            store,
            stack,
            skip_hidden,
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let idx = self.stack.pop()?;
            let slot = idx as usize;
            // Sibling first so the child is popped next.
            let next = self.store.next_sibling[slot];
            if next != INVALID {
                self.stack.push(next);
            }
            if self.skip_hidden && !self.store.visible[slot] {
                continue;
            }
            let child = self.store.first_child[slot];
            if child != INVALID {
                self.stack.push(child);
            }
            return Some(self.store.id_at(idx));
        }
    }
}
