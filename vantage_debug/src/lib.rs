// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for vantage
//! diagnostics.
//!
//! This crate provides [`TraceSink`](vantage_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
mod tests {
    use kurbo::Point;
    use vantage_core::camera::Camera;
    use vantage_core::geometry::Geometry;
    use vantage_core::math::Vector3;
    use vantage_core::node::NodeStore;
    use vantage_core::trace::Tracer;
    use vantage_render::{Compositor, RenderTargetConfig, SoftwareRenderer};

    use crate::recorder::{RecordedEvent, RecorderSink, decode};

    #[test]
    fn records_a_frame_and_a_touch() {
        let mut nodes = NodeStore::new();
        let cam = nodes.create_camera(Camera::perspective(90.0, 1.0, 0.1, 100.0));
        let mesh = nodes.create_mesh(Geometry::Sphere { radius: 1.0 });
        nodes.add_child(cam, mesh).unwrap();
        nodes.set_position(mesh, Vector3::new(0.0, 0.0, -5.0));

        let mut compositor = Compositor::new();
        let id = compositor.add_target(RenderTargetConfig::screen(32, 32));
        compositor
            .target_mut(id)
            .unwrap()
            .create_default_viewport(&mut nodes, Some(cam));

        let mut renderer = SoftwareRenderer::default();
        let mut rec = RecorderSink::new();
        {
            let mut tracer = Tracer::new(&mut rec);
            let report = compositor.draw_frame(&mut nodes, &mut renderer, &mut tracer);
            assert!(report.is_ok());
            let hit = compositor
                .dispatch_touch(id, &mut nodes, &renderer, Point::new(16.0, 16.0), &mut tracer)
                .unwrap();
            assert_eq!(hit.map(|h| h.node), Some(mesh));
        }

        let names: Vec<&str> = decode(rec.as_bytes())
            .map(|r| match r.event {
                RecordedEvent::DrawBegin(_) => "begin",
                RecordedEvent::Pass(_) => "pass",
                RecordedEvent::Present(_) => "present",
                RecordedEvent::Capture(_) => "capture",
                RecordedEvent::Pick(_) => "pick",
                RecordedEvent::BindFailed(_) => "failed",
                RecordedEvent::DrawSummary(_) => "summary",
            })
            .collect();
        assert_eq!(names, ["begin", "pass", "present", "summary", "pick"]);

        let mut json = Vec::new();
        crate::chrome::export(rec.as_bytes(), &mut json).unwrap();
        assert!(!json.is_empty());
    }
}
