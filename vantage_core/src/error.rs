// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for scene-graph edits.

use thiserror::Error;

use crate::node::NodeId;

/// A hierarchy edit that would break the tree invariants.
///
/// Every variant is detected before the store is mutated, so a rejected edit
/// leaves the graph exactly as it was.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// A node cannot be its own child.
    #[error("cannot attach {0:?} to itself")]
    SelfAttach(NodeId),

    /// The child is an ancestor of the requested parent.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },

    /// The child is already a direct child of the parent.
    #[error("{child:?} is already a child of {parent:?}")]
    AlreadyChild {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },

    /// The node to remove is not a direct child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Given parent.
        parent: NodeId,
        /// Given child.
        child: NodeId,
    },

    /// Only leaf nodes can be destroyed individually.
    #[error("cannot destroy {0:?} while it has children")]
    HasChildren(NodeId),
}
