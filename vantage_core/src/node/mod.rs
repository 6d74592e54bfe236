// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph data model.
//!
//! A *node* is an entry in a spatial hierarchy. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - A [`NodeKind`]: an ordinary transform node, a World (coordinate-space
//!   root), a Camera (render root carrying a
//!   [`Camera`](crate::camera::Camera)), or a Billboard (a node whose
//!   orientation follows its render root).
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   forest, plus a non-owning link to the nearest enclosing World.
//! - **Local properties** set by the caller:
//!   [`position`](NodeStore::set_position),
//!   [`scale`](NodeStore::set_scale),
//!   [`orientation`](NodeStore::set_orientation),
//!   [`visible`](NodeStore::set_visible), an optional name and optional
//!   [`Geometry`](crate::geometry::Geometry).
//! - **Derived properties** computed lazily on read: the local TRS matrix,
//!   the world transform (composed up to the nearest World), and the full or
//!   eye transform (composed up to the Camera).
//!
//! # Coordinate spaces
//!
//! | Space  | Composed from                                     |
//! |--------|---------------------------------------------------|
//! | Local  | the node's own TRS                                |
//! | Parent | the parent's local frame                          |
//! | World  | ancestors below the nearest World or Camera       |
//! | Full   | ancestors below the Camera, then its view matrix  |
//!
//! A node with no enclosing World composes to its root; a node with no Camera
//! above it composes from identity. Neither case is an error.

mod id;
mod store;
mod touch;
mod transform;
mod traverse;

pub use id::{INVALID, NodeId, NodeKind, TouchTargetId, TransformSpace};
pub use store::NodeStore;
pub use touch::TouchAction;
pub use traverse::{Children, Descendants};
