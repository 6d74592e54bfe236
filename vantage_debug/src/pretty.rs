// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use vantage_core::trace::{
    BindFailedEvent, CaptureEvent, DrawBeginEvent, DrawSummary, PassEvent, PickEvent,
    PresentEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] target={} frame={} viewports={}",
            e.target.0, e.frame_index, e.viewports,
        );
    }

    fn on_pass(&mut self, e: &PassEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] target={} viewport={} z={} items={} culled={}",
            e.viewport.target.0, e.viewport.serial, e.z_order, e.items, e.culled,
        );
    }

    fn on_present(&mut self, e: &PresentEvent) {
        let _ = writeln!(
            self.writer,
            "[present] target={} frame={}",
            e.target.0, e.frame_index,
        );
    }

    fn on_capture(&mut self, e: &CaptureEvent) {
        let _ = writeln!(
            self.writer,
            "[capture] target={} frame={} nodes={}",
            e.target.0, e.frame_index, e.nodes,
        );
    }

    fn on_pick(&mut self, e: &PickEvent) {
        let viewport = e
            .viewport
            .map_or_else(|| "-".to_owned(), |v| v.serial.to_string());
        let node = e.node.map_or_else(|| "none".to_owned(), |n| format!("{n:?}"));
        let _ = writeln!(
            self.writer,
            "[pick] target={} at=({:.1}, {:.1}) viewport={viewport} node={node}",
            e.target.0, e.x, e.y,
        );
    }

    fn on_bind_failed(&mut self, e: &BindFailedEvent) {
        let buffer = if e.capture { "capture" } else { "colour" };
        let _ = writeln!(
            self.writer,
            "[bind:FAILED] target={} {buffer} {}x{}",
            e.target.0, e.width, e.height,
        );
    }

    fn on_draw_summary(&mut self, s: &DrawSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] target={} frame={} passes={} skipped={} items={} culled={}",
            s.target.0, s.frame_index, s.passes, s.skipped_passes, s.items, s.culled,
        );
    }
}
