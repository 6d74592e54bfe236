// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render target configuration.

/// Size, ordering, and buffer options of a render target.
///
/// ```
/// use vantage_render::RenderTargetConfig;
///
/// let screen = RenderTargetConfig::screen(1280, 720);
/// let preview = RenderTargetConfig::offscreen(256, 256).with_priority(-5);
/// assert!(preview.priority < screen.priority);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargetConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Draw order among targets; lower values draw first.
    pub priority: i32,
    /// Whether a depth buffer is attached.
    pub has_depth: bool,
    /// Whether a stencil buffer is attached.
    pub has_stencil: bool,
    /// When set, the target is skipped by automatic per-frame drawing and
    /// only draws when asked to explicitly.
    pub manual_draw: bool,
    /// RGBA colour the buffer is cleared to when bound.
    pub clear_colour: [u8; 4],
}

impl RenderTargetConfig {
    /// The on-screen target: depth on, opaque black clear, priority 0.
    #[must_use]
    pub const fn screen(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            priority: 0,
            has_depth: true,
            has_stencil: false,
            manual_draw: false,
            clear_colour: [0, 0, 0, 255],
        }
    }

    /// An offscreen target drawn before the screen, cleared to transparent.
    #[must_use]
    pub const fn offscreen(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            priority: -1,
            has_depth: true,
            has_stencil: false,
            manual_draw: false,
            clear_colour: [0, 0, 0, 0],
        }
    }

    /// Returns a copy with the given priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a copy with manual drawing switched on or off.
    #[must_use]
    pub const fn with_manual_draw(mut self, manual_draw: bool) -> Self {
        self.manual_draw = manual_draw;
        self
    }

    /// Number of pixels in one buffer.
    #[must_use]
    pub const fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Default for RenderTargetConfig {
    fn default() -> Self {
        Self::screen(640, 480)
    }
}
