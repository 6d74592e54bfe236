// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for drawing render plans.
//!
//! A [`RenderTarget`](crate::RenderTarget) decides *what* to draw and in which
//! order; a [`Renderer`] decides *how*. GPU backends translate passes and
//! items into native draw calls, while [`SoftwareRenderer`](crate::SoftwareRenderer)
//! rasterizes them on the CPU for headless use and tests.
//!
//! # Call sequence
//!
//! ```text
//!   draw:              bind_target ─► (begin_pass ─► draw_item* ─► end_pass)* ─► present
//!   draw_for_capture:  bind_capture ─► (begin_capture_pass ─► draw_capture_item*)*
//!   pick:              read_capture_pixel
//!   screenshot:        read_pixels
//! ```
//!
//! Binding a target implicitly unbinds whatever was bound before.

use vantage_core::output::RenderTargetId;

use crate::capture::CaptureColour;
use crate::config::RenderTargetConfig;
use crate::error::RenderError;
use crate::image::Image;
use crate::plan::{RenderItem, RenderPass};

/// Executes render plans against real or simulated buffers.
pub trait Renderer {
    /// Binds (allocating if needed) and clears the colour buffer of `target`.
    ///
    /// On failure the previous contents of the target's buffers must be left
    /// untouched.
    fn bind_target(
        &mut self,
        target: RenderTargetId,
        config: &RenderTargetConfig,
    ) -> Result<(), RenderError>;

    /// Starts a viewport pass on the bound target.
    fn begin_pass(&mut self, pass: &RenderPass);

    /// Draws one item of the current pass.
    fn draw_item(&mut self, pass: &RenderPass, item: &RenderItem);

    /// Ends the current pass.
    fn end_pass(&mut self, pass: &RenderPass) {
        _ = pass;
    }

    /// Presents the bound target's colour buffer.
    fn present(&mut self, target: RenderTargetId);

    /// Binds (allocating if needed) and clears the capture buffer of `target`.
    fn bind_capture(
        &mut self,
        target: RenderTargetId,
        config: &RenderTargetConfig,
    ) -> Result<(), RenderError>;

    /// Starts a viewport pass on the bound capture buffer.
    fn begin_capture_pass(&mut self, pass: &RenderPass) {
        _ = pass;
    }

    /// Draws one item into the capture buffer in a flat `colour`.
    fn draw_capture_item(&mut self, pass: &RenderPass, item: &RenderItem, colour: CaptureColour);

    /// Reads one capture-buffer pixel. `None` if `target` has no capture
    /// buffer or the pixel is out of range.
    fn read_capture_pixel(&self, target: RenderTargetId, x: u32, y: u32) -> Option<CaptureColour>;

    /// Whether `target`'s colour buffer exists and matches its configured
    /// size.
    fn is_complete(&self, target: RenderTargetId) -> bool;

    /// Reads back `target`'s colour buffer.
    fn read_pixels(&self, target: RenderTargetId) -> Option<Image>;
}
