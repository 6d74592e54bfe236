// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each stamped with the microseconds
//! elapsed since the recorder was created. [`decode`] reads them back as an
//! iterator of [`Record`].
//!
//! Node handles are stored as their raw index and generation, and decode to
//! [`RecordedNode`]; a recording outlives the store that issued them.

use std::time::Instant;

use vantage_core::node::NodeId;
use vantage_core::output::{RenderTargetId, ViewPortId};
use vantage_core::trace::{
    BindFailedEvent, CaptureEvent, DrawBeginEvent, DrawSummary, PassEvent, PickEvent,
    PresentEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DRAW_BEGIN: u8 = 1;
const TAG_PASS: u8 = 2;
const TAG_PRESENT: u8 = 3;
const TAG_CAPTURE: u8 = 4;
const TAG_PICK: u8 = 5;
const TAG_BIND_FAILED: u8 = 6;
const TAG_DRAW_SUMMARY: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    start: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder. Timestamps count from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.write_u8(tag);
        self.write_u64(micros);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_viewport(&mut self, v: ViewPortId) {
        self.write_u32(v.target.0);
        self.write_u32(v.serial);
    }

    fn write_option_viewport(&mut self, v: Option<ViewPortId>) {
        match v {
            Some(id) => {
                self.write_u8(1);
                self.write_viewport(id);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
                self.write_u32(0);
            }
        }
    }

    fn write_option_node(&mut self, v: Option<NodeId>) {
        match v {
            Some(id) => {
                self.write_u8(1);
                self.write_u32(id.index());
                self.write_u32(id.generation());
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
                self.write_u32(0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        self.begin(TAG_DRAW_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.0);
        self.write_u32(e.viewports);
    }

    fn on_pass(&mut self, e: &PassEvent) {
        self.begin(TAG_PASS);
        self.write_u64(e.frame_index);
        self.write_viewport(e.viewport);
        self.write_i32(e.z_order);
        self.write_u32(e.items);
        self.write_u32(e.culled);
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.begin(TAG_PRESENT);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.0);
    }

    fn on_capture(&mut self, e: &CaptureEvent) {
        self.begin(TAG_CAPTURE);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.0);
        self.write_u32(e.nodes);
    }

    fn on_pick(&mut self, e: &PickEvent) {
        self.begin(TAG_PICK);
        self.write_u32(e.target.0);
        self.write_f64(e.x);
        self.write_f64(e.y);
        self.write_option_viewport(e.viewport);
        self.write_option_node(e.node);
    }

    fn on_bind_failed(&mut self, e: &BindFailedEvent) {
        self.begin(TAG_BIND_FAILED);
        self.write_u32(e.target.0);
        self.write_u32(e.width);
        self.write_u32(e.height);
        self.write_u8(u8::from(e.capture));
    }

    fn on_draw_summary(&mut self, s: &DrawSummary) {
        self.begin(TAG_DRAW_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.target.0);
        self.write_u32(s.passes);
        self.write_u32(s.skipped_passes);
        self.write_u32(s.items);
        self.write_u32(s.culled);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A node handle as it was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedNode {
    /// Slot index.
    pub index: u32,
    /// Slot generation at the time of recording.
    pub generation: u32,
}

/// A decoded [`PickEvent`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedPick {
    /// Which target was touched.
    pub target: RenderTargetId,
    /// Touch point in target pixels.
    pub x: f64,
    /// Touch point in target pixels.
    pub y: f64,
    /// The viewport containing the point, if any.
    pub viewport: Option<ViewPortId>,
    /// The node hit, if any.
    pub node: Option<RecordedNode>,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`DrawBeginEvent`].
    DrawBegin(DrawBeginEvent),
    /// A [`PassEvent`].
    Pass(PassEvent),
    /// A [`PresentEvent`].
    Present(PresentEvent),
    /// A [`CaptureEvent`].
    Capture(CaptureEvent),
    /// A [`PickEvent`].
    Pick(RecordedPick),
    /// A [`BindFailedEvent`].
    BindFailed(BindFailedEvent),
    /// A [`DrawSummary`].
    DrawSummary(DrawSummary),
}

/// A decoded event with its timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Microseconds since the recorder was created.
    pub at_us: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_target(&mut self) -> Option<RenderTargetId> {
        self.read_u32().map(RenderTargetId)
    }

    fn read_viewport(&mut self) -> Option<ViewPortId> {
        Some(ViewPortId {
            target: self.read_target()?,
            serial: self.read_u32()?,
        })
    }

    fn read_option_viewport(&mut self) -> Option<Option<ViewPortId>> {
        let present = self.read_u8()?;
        let id = self.read_viewport()?;
        Some((present != 0).then_some(id))
    }

    fn read_option_node(&mut self) -> Option<Option<RecordedNode>> {
        let present = self.read_u8()?;
        let node = RecordedNode {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        };
        Some((present != 0).then_some(node))
    }

    fn decode_draw_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawBegin(DrawBeginEvent {
            frame_index: self.read_u64()?,
            target: self.read_target()?,
            viewports: self.read_u32()?,
        }))
    }

    fn decode_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Pass(PassEvent {
            frame_index: self.read_u64()?,
            viewport: self.read_viewport()?,
            z_order: self.read_i32()?,
            items: self.read_u32()?,
            culled: self.read_u32()?,
        }))
    }

    fn decode_present(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Present(PresentEvent {
            frame_index: self.read_u64()?,
            target: self.read_target()?,
        }))
    }

    fn decode_capture(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Capture(CaptureEvent {
            frame_index: self.read_u64()?,
            target: self.read_target()?,
            nodes: self.read_u32()?,
        }))
    }

    fn decode_pick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Pick(RecordedPick {
            target: self.read_target()?,
            x: self.read_f64()?,
            y: self.read_f64()?,
            viewport: self.read_option_viewport()?,
            node: self.read_option_node()?,
        }))
    }

    fn decode_bind_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BindFailed(BindFailedEvent {
            target: self.read_target()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
            capture: self.read_u8()? != 0,
        }))
    }

    fn decode_draw_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawSummary(DrawSummary {
            frame_index: self.read_u64()?,
            target: self.read_target()?,
            passes: self.read_u32()?,
            skipped_passes: self.read_u32()?,
            items: self.read_u32()?,
            culled: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_us = self.read_u64()?;
        let event = match tag {
            TAG_DRAW_BEGIN => self.decode_draw_begin(),
            TAG_PASS => self.decode_pass(),
            TAG_PRESENT => self.decode_present(),
            TAG_CAPTURE => self.decode_capture(),
            TAG_PICK => self.decode_pick(),
            TAG_BIND_FAILED => self.decode_bind_failed(),
            TAG_DRAW_SUMMARY => self.decode_draw_summary(),
            _ => None, // unknown tag → stop iteration
        }?;
        Some(Record { at_us, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
