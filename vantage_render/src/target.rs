// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets: ordered viewports bound to one output buffer.
//!
//! # Per-frame state machine
//!
//! ```text
//!   Idle ─bind_buffer─► BufferBound ─passes─► ViewPortsDrawn ─present─► Presented ─► Idle
//!     │
//!     └─bind_capture_buffer─► CaptureBound ─(draw_for_capture)─► stays until next bind
//! ```
//!
//! A failed bind leaves the state, and the previous buffer contents, as they
//! were.

use core::fmt;

use kurbo::{Point, Rect};
use vantage_core::math::Vector3;
use vantage_core::node::{NodeId, NodeStore};
use vantage_core::output::{RenderTargetId, ViewPortId};
use vantage_core::trace::{
    BindFailedEvent, CaptureEvent, DrawBeginEvent, DrawSummary, DrawSummaryBuilder, PassEvent,
    PickEvent, PresentEvent, Tracer,
};

use crate::backend::Renderer;
use crate::capture::{CaptureColour, CaptureTable};
use crate::config::RenderTargetConfig;
use crate::error::RenderError;
use crate::image::Image;
use crate::plan::RenderPlan;
use crate::viewport::ViewPort;

/// Where a render target is in its per-frame sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawState {
    /// Nothing bound.
    #[default]
    Idle,
    /// Colour buffer bound and cleared.
    BufferBound,
    /// Every viewport pass issued.
    ViewPortsDrawn,
    /// Colour buffer presented.
    Presented,
    /// Capture buffer bound; picking reads from it.
    CaptureBound,
}

/// Observer notified around each draw.
///
/// Hooks run synchronously in registration order. `pre_render` may still
/// mutate the scene (for instance to apply the latest tracked pose);
/// `post_render` sees it read-only.
pub trait RenderTargetDelegate {
    /// Called after the buffer is bound, before any pass.
    fn pre_render(&mut self, target: RenderTargetId, nodes: &mut NodeStore) {
        _ = (target, nodes);
    }

    /// Called after the target has presented.
    fn post_render(&mut self, target: RenderTargetId, nodes: &NodeStore) {
        _ = (target, nodes);
    }
}

/// Handle returned by [`RenderTarget::add_delegate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelegateId(u32);

/// Result of resolving a touch point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    /// Viewport the point fell in.
    pub viewport: ViewPortId,
    /// Node under the point.
    pub node: NodeId,
    /// Hit position in the node's local space, when the ray meets its
    /// geometry.
    pub local_point: Option<Vector3>,
}

#[derive(Debug)]
struct Slot {
    seq: u32,
    viewport: ViewPort,
}

/// An ordered collection of viewports drawn into one buffer.
pub struct RenderTarget {
    id: RenderTargetId,
    config: RenderTargetConfig,
    /// Sorted by `(z_order, seq)`.
    viewports: Vec<Slot>,
    next_seq: u32,
    delegates: Vec<(DelegateId, Box<dyn RenderTargetDelegate>)>,
    next_delegate: u32,
    state: DrawState,
    frame_index: u64,
    capture: CaptureTable,
    touch: Option<Point>,
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("viewports", &self.viewports)
            .field("delegates", &self.delegates.len())
            .field("state", &self.state)
            .field("frame_index", &self.frame_index)
            .field("touch", &self.touch)
            .finish_non_exhaustive()
    }
}

impl RenderTarget {
    /// Creates a target with no viewports.
    #[must_use]
    pub fn new(id: RenderTargetId, config: RenderTargetConfig) -> Self {
        Self {
            id,
            config,
            viewports: Vec::new(),
            next_seq: 0,
            delegates: Vec::new(),
            next_delegate: 0,
            state: DrawState::Idle,
            frame_index: 0,
            capture: CaptureTable::new(),
            touch: None,
        }
    }

    /// This target's id.
    #[must_use]
    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    /// Size and buffer options.
    #[must_use]
    pub fn config(&self) -> &RenderTargetConfig {
        &self.config
    }

    /// Draw priority among targets; lower draws first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.config.priority
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.config.priority = priority;
    }

    /// `true` if automatic per-frame drawing skips this target.
    #[must_use]
    pub fn is_manual_draw(&self) -> bool {
        self.config.manual_draw
    }

    /// Switches manual drawing on or off.
    pub fn set_manual_draw(&mut self, manual_draw: bool) {
        self.config.manual_draw = manual_draw;
    }

    /// Resizes the target. Buffers are reallocated on the next bind and the
    /// capture buffer must be redrawn before it is used for picking again.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.capture.clear();
        if self.state == DrawState::CaptureBound {
            self.state = DrawState::Idle;
        }
    }

    /// Current position in the per-frame sequence.
    #[must_use]
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Number of frames drawn so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The whole target as a rectangle in target pixels.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.config.width),
            f64::from(self.config.height),
        )
    }

    // -- Viewports --

    /// Adds a viewport with a z-order equal to its insertion sequence.
    pub fn add_viewport(&mut self, nodes: &mut NodeStore, viewport: ViewPort) -> ViewPortId {
        let z = i32::try_from(self.next_seq).unwrap_or(i32::MAX);
        self.add_viewport_with_z_order(nodes, viewport, z)
    }

    /// Adds a viewport at `z_order`. Lower values draw first; ties keep
    /// insertion order.
    ///
    /// The viewport's camera, if any, is linked back to it.
    pub fn add_viewport_with_z_order(
        &mut self,
        nodes: &mut NodeStore,
        mut viewport: ViewPort,
        z_order: i32,
    ) -> ViewPortId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = ViewPortId {
            target: self.id,
            serial: seq,
        };
        viewport.id = Some(id);
        viewport.z_order = z_order;
        viewport.render_target = Some(self.id);
        if let Some(camera) = viewport.camera {
            link_camera(nodes, camera, Some(id));
        }
        log::debug!("{:?}: added {id:?} at z {z_order}", self.id);
        self.insert_sorted(Slot { seq, viewport });
        id
    }

    /// Adds a viewport covering the whole target.
    pub fn create_default_viewport(
        &mut self,
        nodes: &mut NodeStore,
        camera: Option<NodeId>,
    ) -> ViewPortId {
        let viewport = ViewPort::new(self.bounds(), camera);
        self.add_viewport(nodes, viewport)
    }

    /// Removes a viewport, unlinking its camera.
    pub fn remove_viewport(&mut self, nodes: &mut NodeStore, id: ViewPortId) -> Option<ViewPort> {
        let pos = self.position(id)?;
        let mut viewport = self.viewports.remove(pos).viewport;
        if let Some(camera) = viewport.camera {
            unlink_camera(nodes, camera, id);
        }
        viewport.id = None;
        viewport.render_target = None;
        log::debug!("{:?}: removed {id:?}", self.id);
        Some(viewport)
    }

    /// Removes every viewport.
    pub fn clear_viewports(&mut self, nodes: &mut NodeStore) {
        for slot in core::mem::take(&mut self.viewports) {
            if let (Some(camera), Some(id)) = (slot.viewport.camera, slot.viewport.id) {
                unlink_camera(nodes, camera, id);
            }
        }
    }

    /// Rebinds a viewport to another camera (or none).
    pub fn set_viewport_camera(
        &mut self,
        nodes: &mut NodeStore,
        id: ViewPortId,
        camera: Option<NodeId>,
    ) -> Result<(), RenderError> {
        let pos = self.position(id).ok_or(RenderError::UnknownViewPort(id))?;
        let viewport = &mut self.viewports[pos].viewport;
        if let Some(old) = viewport.camera {
            unlink_camera(nodes, old, id);
        }
        viewport.camera = camera;
        if let Some(new) = camera {
            link_camera(nodes, new, Some(id));
        }
        Ok(())
    }

    /// Moves a viewport in draw order. Among equal z-orders the original
    /// insertion order is kept.
    pub fn set_viewport_z_order(
        &mut self,
        id: ViewPortId,
        z_order: i32,
    ) -> Result<(), RenderError> {
        let pos = self.position(id).ok_or(RenderError::UnknownViewPort(id))?;
        let mut slot = self.viewports.remove(pos);
        slot.viewport.z_order = z_order;
        self.insert_sorted(slot);
        Ok(())
    }

    /// Changes a viewport's pixel rectangle.
    pub fn set_viewport_rect(&mut self, id: ViewPortId, rect: Rect) -> Result<(), RenderError> {
        let pos = self.position(id).ok_or(RenderError::UnknownViewPort(id))?;
        self.viewports[pos].viewport.rect = rect.abs();
        Ok(())
    }

    /// Looks up a viewport.
    #[must_use]
    pub fn viewport(&self, id: ViewPortId) -> Option<&ViewPort> {
        self.position(id).map(|pos| &self.viewports[pos].viewport)
    }

    /// Viewports in draw order.
    pub fn viewports(&self) -> impl DoubleEndedIterator<Item = &ViewPort> + '_ {
        self.viewports.iter().map(|s| &s.viewport)
    }

    /// Number of viewports.
    #[must_use]
    pub fn number_of_viewports(&self) -> usize {
        self.viewports.len()
    }

    fn position(&self, id: ViewPortId) -> Option<usize> {
        if id.target != self.id {
            return None;
        }
        self.viewports.iter().position(|s| s.seq == id.serial)
    }

    fn insert_sorted(&mut self, slot: Slot) {
        let key = (slot.viewport.z_order, slot.seq);
        let pos = self
            .viewports
            .partition_point(|s| (s.viewport.z_order, s.seq) < key);
        self.viewports.insert(pos, slot);
    }

    // -- Delegates --

    /// Registers a delegate.
    pub fn add_delegate(&mut self, delegate: impl RenderTargetDelegate + 'static) -> DelegateId {
        let id = DelegateId(self.next_delegate);
        self.next_delegate = self.next_delegate.wrapping_add(1);
        self.delegates.push((id, Box::new(delegate)));
        id
    }

    /// Unregisters a delegate. Returns `false` if it was not registered.
    pub fn remove_delegate(&mut self, id: DelegateId) -> bool {
        let before = self.delegates.len();
        self.delegates.retain(|(d, _)| *d != id);
        self.delegates.len() != before
    }

    /// Unregisters every delegate.
    pub fn clear_delegates(&mut self) {
        self.delegates.clear();
    }

    // -- Drawing --

    /// Binds and clears the colour buffer.
    pub fn bind_buffer<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError> {
        if let Err(err) = renderer.bind_target(self.id, &self.config) {
            log::warn!("{:?}: colour buffer bind failed: {err}", self.id);
            tracer.bind_failed(&BindFailedEvent {
                target: self.id,
                width: self.config.width,
                height: self.config.height,
                capture: false,
            });
            return Err(err);
        }
        self.state = DrawState::BufferBound;
        Ok(())
    }

    /// The viewports' passes for the current scene, in draw order.
    #[must_use]
    pub fn plan(&self, nodes: &NodeStore) -> RenderPlan {
        RenderPlan::build(nodes, self.id, self.viewports())
    }

    /// Draws one frame: bind, pre-render hooks, one pass per viewport in
    /// ascending z-order, present, post-render hooks.
    ///
    /// Only nodes that are visible together with every ancestor up to the
    /// camera are drawn. Viewports without a live camera are skipped. If the
    /// buffer cannot be bound nothing else happens and the error is returned.
    pub fn draw<R: Renderer + ?Sized>(
        &mut self,
        nodes: &mut NodeStore,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> Result<DrawSummary, RenderError> {
        self.bind_buffer(renderer, tracer)?;
        for (_, delegate) in &mut self.delegates {
            delegate.pre_render(self.id, nodes);
        }

        self.frame_index += 1;
        let plan = self.plan(nodes);
        let begin = DrawBeginEvent {
            frame_index: self.frame_index,
            target: self.id,
            viewports: u32::try_from(self.viewports.len()).unwrap_or(u32::MAX),
        };
        tracer.draw_begin(&begin);
        let mut summary = DrawSummaryBuilder::new(&begin);
        for _ in 0..plan.skipped {
            summary.skipped();
        }

        for pass in &plan.passes {
            renderer.begin_pass(pass);
            for item in &pass.items {
                renderer.draw_item(pass, item);
            }
            renderer.end_pass(pass);
            let event = PassEvent {
                frame_index: self.frame_index,
                viewport: pass.viewport,
                z_order: pass.z_order,
                items: pass.item_count(),
                culled: pass.culled,
            };
            log::trace!("{:?}: {} items, {} culled", pass.viewport, event.items, event.culled);
            tracer.pass(&event);
            summary.pass(&event);
        }
        self.state = DrawState::ViewPortsDrawn;

        renderer.present(self.id);
        self.state = DrawState::Presented;
        tracer.present(&PresentEvent {
            frame_index: self.frame_index,
            target: self.id,
        });

        for (_, delegate) in &mut self.delegates {
            delegate.post_render(self.id, nodes);
        }
        self.state = DrawState::Idle;

        let summary = summary.finish();
        tracer.draw_summary(&summary);
        Ok(summary)
    }

    /// Binds and clears the capture buffer.
    pub fn bind_capture_buffer<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError> {
        if let Err(err) = renderer.bind_capture(self.id, &self.config) {
            log::warn!("{:?}: capture buffer bind failed: {err}", self.id);
            tracer.bind_failed(&BindFailedEvent {
                target: self.id,
                width: self.config.width,
                height: self.config.height,
                capture: true,
            });
            return Err(err);
        }
        self.capture.clear();
        self.state = DrawState::CaptureBound;
        Ok(())
    }

    /// Renders node identifiers into the capture buffer for picking.
    ///
    /// Returns how many distinct nodes were written.
    pub fn draw_for_capture<R: Renderer + ?Sized>(
        &mut self,
        nodes: &NodeStore,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> Result<usize, RenderError> {
        self.bind_capture_buffer(renderer, tracer)?;
        let plan = self.plan(nodes);
        for pass in &plan.passes {
            renderer.begin_capture_pass(pass);
            for item in &pass.items {
                if let Some(colour) = self.capture.insert(item.node) {
                    renderer.draw_capture_item(pass, item, colour);
                }
            }
        }
        tracer.capture(&CaptureEvent {
            frame_index: self.frame_index,
            target: self.id,
            nodes: u32::try_from(self.capture.len()).unwrap_or(u32::MAX),
        });
        Ok(self.capture.len())
    }

    /// Whether the renderer holds a complete colour buffer for this target.
    #[must_use]
    pub fn check_fbo<R: Renderer + ?Sized>(&self, renderer: &R) -> bool {
        renderer.is_complete(self.id)
    }

    /// Reads back the colour buffer as an image of the target's size.
    pub fn screenshot<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<Image, RenderError> {
        renderer
            .read_pixels(self.id)
            .filter(|img| img.width() == self.config.width && img.height() == self.config.height)
            .ok_or(RenderError::IncompleteBuffer(self.id))
    }

    /// Maps a capture-buffer colour back to the node drawn in it.
    #[must_use]
    pub fn capture_colour_to_node(&self, colour: CaptureColour) -> Option<NodeId> {
        self.capture.lookup(colour)
    }

    /// The node drawn into the capture buffer at `point` (target pixels).
    ///
    /// Fails unless [`draw_for_capture`](Self::draw_for_capture) ran since
    /// the last colour bind.
    pub fn capture_node_at<R: Renderer + ?Sized>(
        &self,
        renderer: &R,
        point: Point,
    ) -> Result<Option<NodeId>, RenderError> {
        if self.state != DrawState::CaptureBound {
            return Err(RenderError::NoCaptureBuffer(self.id));
        }
        Ok(pixel_of(point)
            .and_then(|(x, y)| renderer.read_capture_pixel(self.id, x, y))
            .and_then(|colour| self.capture_colour_to_node(colour)))
    }

    // -- Touch --

    /// Records a touch at `point` (target pixels).
    pub fn receive_touch(&mut self, point: Point) {
        self.touch = Some(point);
    }

    /// Whether a touch is pending.
    #[must_use]
    pub fn touch_event_received(&self) -> bool {
        self.touch.is_some()
    }

    /// The pending touch point.
    #[must_use]
    pub fn touch_point(&self) -> Option<Point> {
        self.touch
    }

    /// Takes the pending touch point, clearing it.
    pub fn take_touch(&mut self) -> Option<Point> {
        self.touch.take()
    }

    // -- Picking --

    /// Resolves `point` (target pixels) to the node under it.
    ///
    /// The highest-z viewport containing the point is used. When the capture
    /// buffer is bound its pixel decides the hit; otherwise the ray through
    /// the point is tested against every visible mesh under the viewport's
    /// camera and the nearest intersection wins. Points outside every
    /// viewport never hit.
    pub fn pick<R: Renderer + ?Sized>(
        &self,
        nodes: &NodeStore,
        renderer: &R,
        point: Point,
        tracer: &mut Tracer<'_>,
    ) -> Option<PickHit> {
        let viewport = self.viewports().rev().find(|vp| vp.contains(point));
        let hit = viewport.and_then(|vp| {
            if self.state == DrawState::CaptureBound {
                self.pick_capture(nodes, renderer, vp, point)
            } else {
                pick_ray(nodes, vp, point)
            }
        });
        tracer.pick(&PickEvent {
            target: self.id,
            x: point.x,
            y: point.y,
            viewport: viewport.and_then(ViewPort::id),
            node: hit.map(|h| h.node),
        });
        hit
    }

    fn pick_capture<R: Renderer + ?Sized>(
        &self,
        nodes: &NodeStore,
        renderer: &R,
        vp: &ViewPort,
        point: Point,
    ) -> Option<PickHit> {
        let node = self
            .capture_node_at(renderer, point)
            .ok()
            .flatten()
            .filter(|n| nodes.is_alive(*n))?;
        // A lower viewport can show through where the top one drew nothing.
        if nodes.camera_of(node) != vp.camera() {
            return None;
        }
        Some(PickHit {
            viewport: vp.id()?,
            node,
            local_point: vp.node_from_viewport(nodes, node, point),
        })
    }

    /// Picks at `point` and runs the hit node's touch callbacks.
    ///
    /// The touch is also recorded as pending on the target.
    pub fn dispatch_touch<R: Renderer + ?Sized>(
        &mut self,
        nodes: &mut NodeStore,
        renderer: &R,
        point: Point,
        tracer: &mut Tracer<'_>,
    ) -> Option<PickHit> {
        self.receive_touch(point);
        let hit = self.pick(nodes, renderer, point, tracer)?;
        let ran = nodes.did_receive_touch(hit.node);
        log::debug!("{:?}: touch hit {:?}, {ran} callbacks", self.id, hit.node);
        Some(hit)
    }

    /// Projects a point in `node`'s local space to target pixels through the
    /// viewport its render root is bound to.
    ///
    /// `None` if the node is not rooted at a camera bound to one of this
    /// target's viewports, or if the point is behind the eye.
    #[must_use]
    pub fn viewport_from_node_position(
        &self,
        nodes: &NodeStore,
        node: NodeId,
        local: Vector3,
    ) -> Option<Point> {
        self.viewport_of(nodes, node)?
            .node_to_screen(nodes, node, local)
    }

    /// Intersects the ray through `point` with `node`'s geometry, using the
    /// viewport its render root is bound to.
    #[must_use]
    pub fn node_from_viewport(
        &self,
        nodes: &NodeStore,
        node: NodeId,
        point: Point,
    ) -> Option<Vector3> {
        self.viewport_of(nodes, node)?
            .node_from_viewport(nodes, node, point)
    }

    fn viewport_of(&self, nodes: &NodeStore, node: NodeId) -> Option<&ViewPort> {
        let camera = nodes.camera_of(node)?;
        let id = nodes.camera(camera)?.viewport()?;
        self.viewport(id)
    }
}

fn link_camera(nodes: &mut NodeStore, camera: NodeId, viewport: Option<ViewPortId>) {
    if !nodes.is_alive(camera) || !nodes.set_camera_viewport(camera, viewport) {
        log::warn!("{camera:?} is not a live camera; viewport will draw nothing");
    }
}

fn unlink_camera(nodes: &mut NodeStore, camera: NodeId, viewport: ViewPortId) {
    if nodes.is_alive(camera)
        && nodes.camera(camera).and_then(|c| c.viewport()) == Some(viewport)
    {
        nodes.set_camera_viewport(camera, None);
    }
}

/// Nearest-hit ray test over the visible meshes under `vp`'s camera.
fn pick_ray(nodes: &NodeStore, vp: &ViewPort, point: Point) -> Option<PickHit> {
    let camera = vp.camera().filter(|c| nodes.is_alive(*c))?;
    if !nodes.is_visible(camera) {
        return None;
    }
    let mut best: Option<(f64, NodeId, Vector3)> = None;
    for node in core::iter::once(camera).chain(nodes.visible_descendants(camera)) {
        if let Some((t, local)) = vp.hit(nodes, node, point)
            && best.is_none_or(|(bt, _, _)| t < bt)
        {
            best = Some((t, node, local));
        }
    }
    let (_, node, local) = best?;
    Some(PickHit {
        viewport: vp.id()?,
        node,
        local_point: Some(local),
    })
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "coordinates are checked non-negative and floored"
)]
fn pixel_of(point: Point) -> Option<(u32, u32)> {
    if point.x < 0.0 || point.y < 0.0 || !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }
    Some((point.x.floor() as u32, point.y.floor() as u32))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use vantage_core::camera::Camera;
    use vantage_core::geometry::Geometry;
    use vantage_core::trace::NoopSink;
    #[cfg(feature = "trace")]
    use vantage_core::trace::TraceSink;

    use super::*;
    use crate::plan::{RenderItem, RenderPass};
    use crate::software::{SoftwareRenderer, SoftwareRendererConfig};

    const ID: RenderTargetId = RenderTargetId(3);

    /// Records the call sequence without touching any buffer.
    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
        fail_bind: bool,
    }

    impl Renderer for Recording {
        fn bind_target(
            &mut self,
            target: RenderTargetId,
            config: &RenderTargetConfig,
        ) -> Result<(), RenderError> {
            if self.fail_bind {
                return Err(RenderError::BufferAllocation {
                    target,
                    width: config.width,
                    height: config.height,
                });
            }
            self.calls.push("bind".into());
            Ok(())
        }
        fn begin_pass(&mut self, pass: &RenderPass) {
            self.calls.push(format!("pass z{}", pass.z_order));
        }
        fn draw_item(&mut self, _pass: &RenderPass, item: &RenderItem) {
            self.calls.push(format!("item {}", item.node.index()));
        }
        fn present(&mut self, _target: RenderTargetId) {
            self.calls.push("present".into());
        }
        fn bind_capture(
            &mut self,
            _target: RenderTargetId,
            _config: &RenderTargetConfig,
        ) -> Result<(), RenderError> {
            Ok(())
        }
        fn draw_capture_item(&mut self, _: &RenderPass, _: &RenderItem, _: CaptureColour) {}
        fn read_capture_pixel(&self, _: RenderTargetId, _: u32, _: u32) -> Option<CaptureColour> {
            None
        }
        fn is_complete(&self, _target: RenderTargetId) -> bool {
            !self.calls.is_empty()
        }
        fn read_pixels(&self, _target: RenderTargetId) -> Option<Image> {
            None
        }
    }

    fn camera_with_mesh(nodes: &mut NodeStore) -> (NodeId, NodeId) {
        let cam = nodes.create_camera(Camera::perspective(90.0, 1.0, 0.1, 100.0));
        let mesh = nodes.create_mesh(Geometry::Quad {
            width: 1.0,
            height: 1.0,
        });
        nodes.add_child(cam, mesh).unwrap();
        nodes.set_position(mesh, Vector3::new(0.0, 0.0, -2.0));
        (cam, mesh)
    }

    fn draw_order(insert_low_first: bool) -> Vec<String> {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        let rect = target.bounds();
        let mut order = [-1, 0];
        if !insert_low_first {
            order.reverse();
        }
        for z in order {
            target.add_viewport_with_z_order(&mut nodes, ViewPort::new(rect, Some(cam)), z);
        }
        let mut r = Recording::default();
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        r.calls
    }

    #[test]
    fn viewports_draw_in_ascending_z_regardless_of_insertion() {
        let expected: Vec<String> = ["bind", "pass z-1", "item 1", "pass z0", "item 1", "present"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(draw_order(true), expected);
        assert_eq!(draw_order(false), expected);
    }

    #[test]
    fn default_z_order_is_insertion_sequence_and_ties_are_stable() {
        let mut nodes = NodeStore::new();
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        let rect = target.bounds();
        let a = target.add_viewport(&mut nodes, ViewPort::new(rect, None));
        let b = target.add_viewport(&mut nodes, ViewPort::new(rect, None));
        let c = target.add_viewport_with_z_order(&mut nodes, ViewPort::new(rect, None), 0);
        let ids: Vec<_> = target.viewports().filter_map(ViewPort::id).collect();
        // `a` has z 0 and was inserted before `c`.
        assert_eq!(ids, vec![a, c, b]);

        target.set_viewport_z_order(b, -5).unwrap();
        let ids: Vec<_> = target.viewports().filter_map(ViewPort::id).collect();
        assert_eq!(ids, vec![b, a, c]);
        assert_eq!(target.number_of_viewports(), 3);
    }

    #[test]
    fn inverted_and_empty_viewports_draw() {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        let inverted = ViewPort::new(Rect::new(8.0, 0.0, 2.0, 10.0), Some(cam));
        let inverted = target.add_viewport(&mut nodes, inverted);
        let empty = ViewPort::new(Rect::new(4.0, 4.0, 4.0, 9.0), Some(cam));
        let empty = target.add_viewport(&mut nodes, empty);
        assert_eq!(
            target.viewport(inverted).map(ViewPort::rect),
            Some(Rect::new(2.0, 0.0, 8.0, 10.0))
        );
        target
            .set_viewport_rect(empty, Rect::new(9.0, 9.0, 3.0, 9.0))
            .unwrap();
        assert_eq!(
            target.viewport(empty).map(ViewPort::rect),
            Some(Rect::new(3.0, 9.0, 9.0, 9.0))
        );

        let mut r = SoftwareRenderer::default();
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        assert_eq!(target.state(), DrawState::Idle);
        assert_eq!(target.frame_index(), 1);
        assert_eq!(r.presented_frames(ID), 1);
    }

    #[test]
    fn camera_backlink_follows_viewport() {
        let mut nodes = NodeStore::new();
        let (cam, mesh) = camera_with_mesh(&mut nodes);
        let other = nodes.create_camera(Camera::default());
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        let vp = target.create_default_viewport(&mut nodes, Some(cam));
        assert_eq!(nodes.camera(cam).unwrap().viewport(), Some(vp));
        assert_eq!(target.viewport(vp).unwrap().render_target(), Some(ID));

        target.set_viewport_camera(&mut nodes, vp, Some(other)).unwrap();
        assert_eq!(nodes.camera(cam).unwrap().viewport(), None);
        assert_eq!(nodes.camera(other).unwrap().viewport(), Some(vp));
        assert!(
            target
                .viewport_from_node_position(&nodes, mesh, Vector3::ZERO)
                .is_none()
        );

        let removed = target.remove_viewport(&mut nodes, vp).unwrap();
        assert_eq!(removed.id(), None);
        assert_eq!(nodes.camera(other).unwrap().viewport(), None);
        assert_eq!(target.remove_viewport(&mut nodes, vp), None);
        assert_eq!(
            target.set_viewport_z_order(vp, 1),
            Err(RenderError::UnknownViewPort(vp))
        );
    }

    #[test]
    fn clear_viewports_unlinks_cameras() {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        target.create_default_viewport(&mut nodes, Some(cam));
        target.clear_viewports(&mut nodes);
        assert_eq!(target.number_of_viewports(), 0);
        assert_eq!(nodes.camera(cam).unwrap().viewport(), None);
    }

    #[test]
    fn bind_failure_is_reported_and_state_kept() {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        target.create_default_viewport(&mut nodes, Some(cam));

        let mut r = Recording {
            fail_bind: true,
            ..Recording::default()
        };
        let err = target
            .draw(&mut nodes, &mut r, &mut Tracer::none())
            .unwrap_err();
        assert!(matches!(err, RenderError::BufferAllocation { .. }));
        assert_eq!(target.state(), DrawState::Idle);
        assert_eq!(target.frame_index(), 0);
        assert!(r.calls.is_empty());

        // The next frame is unaffected.
        r.fail_bind = false;
        let summary = target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        assert_eq!(summary.passes, 1);
        assert_eq!(target.frame_index(), 1);
    }

    #[test]
    fn software_bind_failure_keeps_previous_frame() {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut r = SoftwareRenderer::new(SoftwareRendererConfig { max_pixels: 400 });
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(20, 20));
        target.create_default_viewport(&mut nodes, Some(cam));
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        let before = target.screenshot(&r).unwrap();

        target.set_size(30, 30);
        let err = target
            .draw(&mut nodes, &mut r, &mut Tracer::none())
            .unwrap_err();
        assert!(matches!(err, RenderError::BufferAllocation { .. }));
        assert_eq!(r.read_pixels(ID), Some(before));
        assert_eq!(r.presented_frames(ID), 1);
        // The renderer still holds the old size.
        assert_eq!(
            target.screenshot(&r),
            Err(RenderError::IncompleteBuffer(ID))
        );
    }

    struct Hooks(Rc<RefCell<Vec<&'static str>>>, &'static str);

    impl RenderTargetDelegate for Hooks {
        fn pre_render(&mut self, _target: RenderTargetId, _nodes: &mut NodeStore) {
            self.0.borrow_mut().push(self.1);
        }
        fn post_render(&mut self, _target: RenderTargetId, _nodes: &NodeStore) {
            self.0.borrow_mut().push("post");
        }
    }

    #[test]
    fn delegates_run_in_registration_order() {
        let mut nodes = NodeStore::new();
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        let log = Rc::new(RefCell::new(Vec::new()));
        target.add_delegate(Hooks(Rc::clone(&log), "first"));
        let second = target.add_delegate(Hooks(Rc::clone(&log), "second"));
        let mut r = Recording::default();
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second", "post", "post"]);

        assert!(target.remove_delegate(second));
        assert!(!target.remove_delegate(second));
        target.clear_delegates();
        log.borrow_mut().clear();
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn draw_summary_counts_skipped_viewports() {
        let mut nodes = NodeStore::new();
        let (cam, _) = camera_with_mesh(&mut nodes);
        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(10, 10));
        target.create_default_viewport(&mut nodes, Some(cam));
        target.create_default_viewport(&mut nodes, None);
        let mut sink = NoopSink;
        let mut tracer = Tracer::new(&mut sink);
        let mut r = Recording::default();
        let s = target.draw(&mut nodes, &mut r, &mut tracer).unwrap();
        assert_eq!(s.passes, 1);
        assert_eq!(s.skipped_passes, 1);
        assert_eq!(s.items, 1);
    }

    fn picking_scene() -> (NodeStore, RenderTarget, NodeId, NodeId, NodeId) {
        let mut nodes = NodeStore::new();
        let cam = nodes.create_camera(Camera::perspective(90.0, 1.0, 0.1, 100.0));
        let near = nodes.create_mesh(Geometry::Quad {
            width: 0.5,
            height: 0.5,
        });
        let far = nodes.create_mesh(Geometry::Quad {
            width: 4.0,
            height: 4.0,
        });
        nodes.add_children(cam, &[far, near]).unwrap();
        nodes.set_position(near, Vector3::new(0.0, 0.0, -1.0));
        nodes.set_position(far, Vector3::new(0.0, 0.0, -3.0));

        let mut target = RenderTarget::new(ID, RenderTargetConfig::screen(100, 100));
        // Content only in the left half of the target.
        target.add_viewport(
            &mut nodes,
            ViewPort::new(Rect::new(0.0, 0.0, 50.0, 100.0), Some(cam)),
        );
        (nodes, target, cam, near, far)
    }

    #[test]
    fn ray_pick_prefers_nearest_hit() {
        let (nodes, target, _, near, far) = picking_scene();
        let r = Recording::default();
        let mut t = Tracer::none();

        let centre = target.pick(&nodes, &r, Point::new(25.0, 50.0), &mut t).unwrap();
        assert_eq!(centre.node, near);
        assert!(
            centre
                .local_point
                .unwrap()
                .approx_eq(Vector3::ZERO, 1e-9)
        );

        let edge = target.pick(&nodes, &r, Point::new(10.0, 50.0), &mut t).unwrap();
        assert_eq!(edge.node, far);
    }

    #[test]
    fn touch_outside_every_viewport_is_no_hit() {
        let (mut nodes, mut target, _, near, _) = picking_scene();
        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);
        nodes.add_touch_target(near, move |_| *counter.borrow_mut() += 1);

        let r = Recording::default();
        let mut t = Tracer::none();
        let miss = target.dispatch_touch(&mut nodes, &r, Point::new(75.0, 50.0), &mut t);
        assert_eq!(miss, None);
        assert_eq!(*fired.borrow(), 0);
        // The touch is still recorded.
        assert_eq!(target.take_touch(), Some(Point::new(75.0, 50.0)));
        assert!(!target.touch_event_received());

        let hit = target.dispatch_touch(&mut nodes, &r, Point::new(25.0, 50.0), &mut t);
        assert_eq!(hit.map(|h| h.node), Some(near));
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(target.touch_point(), Some(Point::new(25.0, 50.0)));
    }

    #[test]
    fn hidden_nodes_are_not_picked() {
        let (mut nodes, target, _, near, far) = picking_scene();
        nodes.set_visible(near, false);
        let r = Recording::default();
        let hit = target
            .pick(&nodes, &r, Point::new(25.0, 50.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(hit.node, far);
    }

    #[test]
    fn capture_pick_decodes_pixel() {
        let (mut nodes, mut target, _, near, far) = picking_scene();
        let mut r = SoftwareRenderer::default();
        let mut t = Tracer::none();
        target.draw(&mut nodes, &mut r, &mut t).unwrap();
        assert_eq!(
            target.capture_node_at(&r, Point::new(25.0, 50.0)),
            Err(RenderError::NoCaptureBuffer(ID))
        );
        assert_eq!(target.draw_for_capture(&nodes, &mut r, &mut t).unwrap(), 2);
        assert_eq!(
            target.capture_node_at(&r, Point::new(25.0, 50.0)),
            Ok(Some(near))
        );
        assert_eq!(target.state(), DrawState::CaptureBound);

        let centre = target.pick(&nodes, &r, Point::new(25.0, 50.0), &mut t).unwrap();
        assert_eq!(centre.node, near);
        let edge = target.pick(&nodes, &r, Point::new(10.0, 50.0), &mut t).unwrap();
        assert_eq!(edge.node, far);
        // Inside the viewport but off every mesh.
        assert_eq!(target.pick(&nodes, &r, Point::new(1.0, 1.0), &mut t), None);

        let colour = CaptureColour::for_node(near).unwrap();
        assert_eq!(target.capture_colour_to_node(colour), Some(near));
    }

    #[test]
    fn screenshot_matches_target_size() {
        let (mut nodes, mut target, ..) = picking_scene();
        let mut r = SoftwareRenderer::default();
        assert_eq!(
            target.screenshot(&r),
            Err(RenderError::IncompleteBuffer(ID))
        );
        assert!(!target.check_fbo(&r));
        target.draw(&mut nodes, &mut r, &mut Tracer::none()).unwrap();
        let img = target.screenshot(&r).unwrap();
        assert_eq!((img.width(), img.height()), (100, 100));
        // Right half has no viewport and keeps the clear colour.
        assert_eq!(img.pixel(75, 50), Some(target.config().clear_colour));
        assert_ne!(img.pixel(25, 50), Some(target.config().clear_colour));
    }

    #[test]
    fn node_position_round_trips_through_viewport() {
        let (nodes, target, _, near, _) = picking_scene();
        let screen = target
            .viewport_from_node_position(&nodes, near, Vector3::new(0.1, 0.1, 0.0))
            .unwrap();
        let local = target.node_from_viewport(&nodes, near, screen).unwrap();
        assert!(local.approx_eq(Vector3::new(0.1, 0.1, 0.0), 1e-6));
    }

    #[cfg(feature = "trace")]
    #[derive(Default)]
    struct PickLog(Vec<Option<NodeId>>);

    #[cfg(feature = "trace")]
    impl TraceSink for PickLog {
        fn on_pick(&mut self, e: &PickEvent) {
            self.0.push(e.node);
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn picks_are_traced() {
        let (nodes, target, _, near, _) = picking_scene();
        let r = Recording::default();
        let mut sink = PickLog::default();
        {
            let mut t = Tracer::new(&mut sink);
            target.pick(&nodes, &r, Point::new(25.0, 50.0), &mut t);
            target.pick(&nodes, &r, Point::new(75.0, 50.0), &mut t);
        }
        assert_eq!(sink.0, vec![Some(near), None]);
    }
}
