// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph transforms, cameras, and math for viewport compositing.
//!
//! `vantage_core` holds the spatial half of an AR renderer: a hierarchy of
//! nodes with local poses, lazily derived transforms in several coordinate
//! spaces, cameras that root render sub-graphs, and the value types they are
//! built from. Storage is struct-of-arrays with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   tracker thread ──► PoseWriter ──► PoseSlot::apply()
//!                                          │
//!                                          ▼
//!   NodeStore (local TRS) ──mark──► dirty::TRANSFORM ──► stale flags
//!        │
//!        ▼ read
//!   world / full transforms (recomputed per node on demand)
//!        │
//!        ▼
//!   vantage_render: ViewPort ──► RenderTarget ──► Renderer
//! ```
//!
//! **[`math`]**: `Vector3`, `Vector4`, `Quaternion`, `Matrix4`.
//!
//! **[`node`]**: The [`NodeStore`](node::NodeStore): topology, local poses,
//! derived transforms, visibility, names, touch callbacks.
//!
//! **[`camera`]**: Projection and frustum parameters of camera nodes.
//!
//! **[`billboard`]**: Camera-facing orientation of billboard nodes.
//!
//! **[`geometry`]**: Local-space shapes and ray intersection for picking.
//!
//! **[`dirty`]**: Transform invalidation channel via `understory_dirty`.
//!
//! **[`error`]**: Rejected hierarchy edits.
//!
//! **[`handoff`]**: Latest-value pose handoff from producer threads.
//!
//! **[`output`]**: Render target and viewport handles.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and draw-loop event
//! types, with the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod billboard;
pub mod camera;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod handoff;
pub mod math;
pub mod node;
pub mod output;
pub mod trace;
