// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render-target drawing and picking.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! draw loop calls at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`DrawSummaryBuilder`] collects pass statistics while a target draws and
//! produces a [`DrawSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::node::NodeId;
use crate::output::{RenderTargetId, ViewPortId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render target starts drawing a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawBeginEvent {
    /// Per-target frame counter.
    pub frame_index: u64,
    /// Which target is drawing.
    pub target: RenderTargetId,
    /// Number of viewports that will be drawn.
    pub viewports: u32,
}

/// Emitted after one viewport pass has been issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassEvent {
    /// Per-target frame counter.
    pub frame_index: u64,
    /// The viewport drawn.
    pub viewport: ViewPortId,
    /// The viewport's z-order.
    pub z_order: i32,
    /// Draw calls issued (visible mesh-bearing nodes).
    pub items: u32,
    /// Nodes skipped because they or an ancestor were hidden.
    pub culled: u32,
}

/// Emitted when a render target presents its colour buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentEvent {
    /// Per-target frame counter.
    pub frame_index: u64,
    /// Which target presented.
    pub target: RenderTargetId,
}

/// Emitted after the capture buffer has been filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureEvent {
    /// Per-target frame counter.
    pub frame_index: u64,
    /// Which target captured.
    pub target: RenderTargetId,
    /// Number of distinct node colours written.
    pub nodes: u32,
}

/// Emitted when a touch point is resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickEvent {
    /// Which target was touched.
    pub target: RenderTargetId,
    /// Touch point in target pixels.
    pub x: f64,
    /// Touch point in target pixels.
    pub y: f64,
    /// The viewport containing the point, if any.
    pub viewport: Option<ViewPortId>,
    /// The node hit, if any.
    pub node: Option<NodeId>,
}

/// Emitted when a buffer could not be bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindFailedEvent {
    /// Which target failed.
    pub target: RenderTargetId,
    /// Requested width in pixels.
    pub width: u32,
    /// Requested height in pixels.
    pub height: u32,
    /// `true` if the capture buffer failed, `false` for the colour buffer.
    pub capture: bool,
}

/// Per-frame draw summary produced by [`DrawSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawSummary {
    /// Per-target frame counter.
    pub frame_index: u64,
    /// Which target drew.
    pub target: RenderTargetId,
    /// Viewport passes issued.
    pub passes: u32,
    /// Viewports skipped for lack of a camera.
    pub skipped_passes: u32,
    /// Total draw calls across all passes.
    pub items: u32,
    /// Total hidden nodes skipped across all passes.
    pub culled: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the draw loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a target starts drawing.
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        _ = e;
    }

    /// Called after each viewport pass.
    fn on_pass(&mut self, e: &PassEvent) {
        _ = e;
    }

    /// Called when a target presents.
    fn on_present(&mut self, e: &PresentEvent) {
        _ = e;
    }

    /// Called after a capture pass.
    fn on_capture(&mut self, e: &CaptureEvent) {
        _ = e;
    }

    /// Called when a touch point is resolved.
    fn on_pick(&mut self, e: &PickEvent) {
        _ = e;
    }

    /// Called when a buffer bind fails.
    fn on_bind_failed(&mut self, e: &BindFailedEvent) {
        _ = e;
    }

    /// Called with a per-frame draw summary.
    fn on_draw_summary(&mut self, s: &DrawSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`DrawBeginEvent`].
    #[inline]
    pub fn draw_begin(&mut self, e: &DrawBeginEvent) {
        dispatch!(self, on_draw_begin, e);
    }

    /// Emits a [`PassEvent`].
    #[inline]
    pub fn pass(&mut self, e: &PassEvent) {
        dispatch!(self, on_pass, e);
    }

    /// Emits a [`PresentEvent`].
    #[inline]
    pub fn present(&mut self, e: &PresentEvent) {
        dispatch!(self, on_present, e);
    }

    /// Emits a [`CaptureEvent`].
    #[inline]
    pub fn capture(&mut self, e: &CaptureEvent) {
        dispatch!(self, on_capture, e);
    }

    /// Emits a [`PickEvent`].
    #[inline]
    pub fn pick(&mut self, e: &PickEvent) {
        dispatch!(self, on_pick, e);
    }

    /// Emits a [`BindFailedEvent`].
    #[inline]
    pub fn bind_failed(&mut self, e: &BindFailedEvent) {
        dispatch!(self, on_bind_failed, e);
    }

    /// Emits a [`DrawSummary`].
    #[inline]
    pub fn draw_summary(&mut self, s: &DrawSummary) {
        dispatch!(self, on_draw_summary, s);
    }
}

// ---------------------------------------------------------------------------
// DrawSummaryBuilder
// ---------------------------------------------------------------------------

/// Accumulates pass statistics during a draw and produces a [`DrawSummary`].
#[derive(Debug)]
pub struct DrawSummaryBuilder {
    summary: DrawSummary,
}

impl DrawSummaryBuilder {
    /// Starts a summary for the given draw.
    #[must_use]
    pub fn new(begin: &DrawBeginEvent) -> Self {
        Self {
            summary: DrawSummary {
                frame_index: begin.frame_index,
                target: begin.target,
                ..DrawSummary::default()
            },
        }
    }

    /// Records one issued pass.
    pub fn pass(&mut self, e: &PassEvent) {
        self.summary.passes += 1;
        self.summary.items += e.items;
        self.summary.culled += e.culled;
    }

    /// Records a viewport skipped for lack of a camera.
    pub fn skipped(&mut self) {
        self.summary.skipped_passes += 1;
    }

    /// Consumes the builder and produces the final [`DrawSummary`].
    #[must_use]
    pub fn finish(self) -> DrawSummary {
        self.summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn begin() -> DrawBeginEvent {
        DrawBeginEvent {
            frame_index: 3,
            target: RenderTargetId(1),
            viewports: 2,
        }
    }

    fn pass(serial: u32, items: u32, culled: u32) -> PassEvent {
        PassEvent {
            frame_index: 3,
            viewport: ViewPortId {
                target: RenderTargetId(1),
                serial,
            },
            z_order: 0,
            items,
            culled,
        }
    }

    #[test]
    fn summary_accumulates_passes() {
        let mut b = DrawSummaryBuilder::new(&begin());
        b.pass(&pass(0, 4, 1));
        b.pass(&pass(1, 2, 0));
        b.skipped();
        let s = b.finish();
        assert_eq!(s.frame_index, 3);
        assert_eq!(s.target, RenderTargetId(1));
        assert_eq!(s.passes, 2);
        assert_eq!(s.skipped_passes, 1);
        assert_eq!(s.items, 6);
        assert_eq!(s.culled, 1);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let s = DrawSummaryBuilder::new(&begin()).finish();
        assert_eq!(s.passes, 0);
        assert_eq!(s.items, 0);
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        let mut tracer = Tracer::new(&mut sink);
        tracer.draw_begin(&begin());
        tracer.pass(&pass(0, 1, 0));
        tracer.present(&PresentEvent {
            frame_index: 3,
            target: RenderTargetId(1),
        });
        tracer.draw_summary(&DrawSummary::default());
    }

    #[derive(Default)]
    struct Counting {
        events: u32,
    }

    impl TraceSink for Counting {
        fn on_pass(&mut self, _e: &PassEvent) {
            self.events += 1;
        }
    }

    #[test]
    fn tracer_none_discards() {
        let mut t = Tracer::none();
        t.pass(&pass(0, 1, 0));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = Counting::default();
        {
            let mut t = Tracer::new(&mut sink);
            t.pass(&pass(0, 1, 0));
            t.pass(&pass(1, 1, 0));
            t.present(&PresentEvent {
                frame_index: 3,
                target: RenderTargetId(1),
            });
        }
        assert_eq!(sink.events, 2);
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn tracer_is_inert_without_feature() {
        let mut sink = Counting::default();
        {
            let mut t = Tracer::new(&mut sink);
            t.pass(&pass(0, 1, 0));
        }
        assert_eq!(sink.events, 0);
    }
}
