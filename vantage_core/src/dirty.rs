// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The node store uses [`understory_dirty`] to propagate transform
//! invalidation through the hierarchy. Every attached child has a dependency
//! edge on its parent in the [`TRANSFORM`] channel, and marks are made with
//! [`EagerPolicy`](understory_dirty::EagerPolicy), so marking one node marks
//! its whole subtree.
//!
//! The store drains the channel immediately after each mark and copies the
//! affected keys into per-node stale flags. Recomputation is lazy: each node
//! rebuilds its own cached matrices the next time one of them is read, and
//! only that node's flag is cleared.

use understory_dirty::Channel;

/// Local position, scale, orientation, or ancestry changed. Derived world and
/// eye transforms of the node and every descendant are stale.
pub const TRANSFORM: Channel = Channel::new(0);
