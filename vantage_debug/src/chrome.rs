// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each render target becomes one process lane. A frame shows as a duration
//! slice from its draw-begin to its summary, with passes, presents, captures
//! and picks as instants inside it.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = record.at_us;
        match record.event {
            RecordedEvent::DrawBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Draw",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": e.target.0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "viewports": e.viewports,
                    }
                }));
            }
            RecordedEvent::Pass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Pass",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": e.viewport.target.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "viewport": e.viewport.serial,
                        "z_order": e.z_order,
                        "items": e.items,
                        "culled": e.culled,
                    }
                }));
            }
            RecordedEvent::Present(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Present",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": e.target.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Capture(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Capture",
                    "cat": "Picking",
                    "ts": ts,
                    "pid": e.target.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "nodes": e.nodes,
                    }
                }));
            }
            RecordedEvent::Pick(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Pick",
                    "cat": "Picking",
                    "ts": ts,
                    "pid": e.target.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "x": e.x,
                        "y": e.y,
                        "viewport": e.viewport.map(|v| v.serial),
                        "node": e.node.map(|n| n.index),
                    }
                }));
            }
            RecordedEvent::BindFailed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BindFailed",
                    "cat": "Error",
                    "ts": ts,
                    "pid": e.target.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "width": e.width,
                        "height": e.height,
                        "buffer": if e.capture { "capture" } else { "colour" },
                    }
                }));
            }
            RecordedEvent::DrawSummary(s) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Draw",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": s.target.0,
                    "tid": 0,
                    "args": {
                        "frame_index": s.frame_index,
                        "passes": s.passes,
                        "skipped_passes": s.skipped_passes,
                        "items": s.items,
                        "culled": s.culled,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
