// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owns every render target and draws them once per frame.

use kurbo::Point;
use vantage_core::node::{NodeId, NodeStore};
use vantage_core::output::RenderTargetId;
use vantage_core::trace::{DrawSummary, Tracer};

use crate::backend::Renderer;
use crate::config::RenderTargetConfig;
use crate::error::RenderError;
use crate::target::{PickHit, RenderTarget};
use crate::viewport::ViewPort;

/// Outcome of [`Compositor::draw_frame`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Summaries of the targets that drew, in draw order.
    pub drawn: Vec<DrawSummary>,
    /// Targets whose buffer could not be bound. They drew nothing.
    pub failed: Vec<(RenderTargetId, RenderError)>,
    /// Targets left out because they draw manually.
    pub manual: Vec<RenderTargetId>,
}

impl FrameReport {
    /// `true` if no target failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The set of render targets, ordered by ascending priority.
#[derive(Debug, Default)]
pub struct Compositor {
    targets: Vec<RenderTarget>,
    next_id: u32,
}

impl Compositor {
    /// Creates a compositor with no targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target. Among equal priorities, earlier targets draw first.
    pub fn add_target(&mut self, config: RenderTargetConfig) -> RenderTargetId {
        let id = RenderTargetId(self.next_id);
        self.next_id += 1;
        self.insert(RenderTarget::new(id, config));
        log::debug!(
            "added {id:?} ({}x{}, priority {})",
            config.width,
            config.height,
            config.priority
        );
        id
    }

    /// Removes a target, unlinking the cameras of its viewports.
    pub fn remove_target(
        &mut self,
        nodes: &mut NodeStore,
        id: RenderTargetId,
    ) -> Option<RenderTarget> {
        let pos = self.position(id)?;
        let mut target = self.targets.remove(pos);
        target.clear_viewports(nodes);
        Some(target)
    }

    /// Looks up a target.
    #[must_use]
    pub fn target(&self, id: RenderTargetId) -> Option<&RenderTarget> {
        self.position(id).map(|pos| &self.targets[pos])
    }

    /// Looks up a target for modification.
    ///
    /// Use [`set_target_priority`](Self::set_target_priority) to change its
    /// draw order.
    pub fn target_mut(&mut self, id: RenderTargetId) -> Option<&mut RenderTarget> {
        let pos = self.position(id)?;
        Some(&mut self.targets[pos])
    }

    /// Targets in draw order.
    pub fn targets(&self) -> impl Iterator<Item = &RenderTarget> + '_ {
        self.targets.iter()
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// `true` if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Moves a target in draw order. It goes after any target already at
    /// `priority`.
    pub fn set_target_priority(
        &mut self,
        id: RenderTargetId,
        priority: i32,
    ) -> Result<(), RenderError> {
        let pos = self.position(id).ok_or(RenderError::UnknownTarget(id))?;
        let mut target = self.targets.remove(pos);
        target.set_priority(priority);
        self.insert(target);
        Ok(())
    }

    /// Draws every automatic target in priority order.
    ///
    /// A target whose buffer cannot be bound is reported and skipped; the
    /// remaining targets still draw.
    pub fn draw_frame<R: Renderer + ?Sized>(
        &mut self,
        nodes: &mut NodeStore,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        for target in &mut self.targets {
            if target.is_manual_draw() {
                report.manual.push(target.id());
                continue;
            }
            match target.draw(nodes, renderer, tracer) {
                Ok(summary) => report.drawn.push(summary),
                Err(err) => report.failed.push((target.id(), err)),
            }
        }
        report
    }

    /// Draws one target now, whether or not it draws manually.
    pub fn draw_target<R: Renderer + ?Sized>(
        &mut self,
        id: RenderTargetId,
        nodes: &mut NodeStore,
        renderer: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> Result<DrawSummary, RenderError> {
        self.target_mut(id)
            .ok_or(RenderError::UnknownTarget(id))?
            .draw(nodes, renderer, tracer)
    }

    /// Delivers a touch at `point` (target pixels) to target `id`.
    pub fn dispatch_touch<R: Renderer + ?Sized>(
        &mut self,
        id: RenderTargetId,
        nodes: &mut NodeStore,
        renderer: &R,
        point: Point,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<PickHit>, RenderError> {
        let target = self.target_mut(id).ok_or(RenderError::UnknownTarget(id))?;
        Ok(target.dispatch_touch(nodes, renderer, point, tracer))
    }

    /// The viewport `camera` renders through, if any.
    #[must_use]
    pub fn viewport_for_camera(&self, nodes: &NodeStore, camera: NodeId) -> Option<&ViewPort> {
        let id = nodes.camera(camera)?.viewport()?;
        self.target(id.target)?.viewport(id)
    }

    fn position(&self, id: RenderTargetId) -> Option<usize> {
        self.targets.iter().position(|t| t.id() == id)
    }

    fn insert(&mut self, target: RenderTarget) {
        let priority = target.priority();
        let pos = self.targets.partition_point(|t| t.priority() <= priority);
        self.targets.insert(pos, target);
    }
}
