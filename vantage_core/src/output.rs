// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render target and viewport identification.
//!
//! [`RenderTargetId`] and [`ViewPortId`] are lightweight handles for the
//! compositing objects that live in `vantage_render`. They are declared here
//! so that cameras can hold a non-owning link back to the viewport that uses
//! them as a render root without the core crate depending on the renderer.

use core::fmt;

/// Identifies a render target.
///
/// Assigned by whoever creates the target (usually a `Compositor`). Core code
/// passes the value through without interpreting it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderTargetId(pub u32);

impl fmt::Debug for RenderTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderTargetId({})", self.0)
    }
}

/// Identifies a viewport within its owning render target.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewPortId {
    /// The render target that owns the viewport.
    pub target: RenderTargetId,
    /// Per-target serial number, unique for the target's lifetime.
    pub serial: u32,
}

impl fmt::Debug for ViewPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewPortId({}:{})", self.target.0, self.serial)
    }
}
