// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the passes and draw items of one frame on one target.

use kurbo::Rect;
use vantage_core::geometry::Geometry;
use vantage_core::node::{NodeId, NodeStore};
use vantage_core::output::{RenderTargetId, ViewPortId};

use crate::viewport::ViewPort;

/// A single draw command.
///
/// Items are produced in depth-first, pre-order traversal order of the
/// camera's sub-graph.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The node this item originates from.
    pub node: NodeId,
    /// Local-space shape to draw.
    pub geometry: Geometry,
    /// Local-to-eye transform (column-major 4x4).
    pub full_transform: [f32; 16],
    /// Local-to-clip transform: projection times full transform.
    pub mvp: [f32; 16],
}

/// Everything drawn through one viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPass {
    /// Source viewport.
    pub viewport: ViewPortId,
    /// Pixel rectangle the pass is confined to.
    pub rect: Rect,
    /// The viewport's z-order.
    pub z_order: i32,
    /// Render root.
    pub camera: NodeId,
    /// Eye-to-clip projection (column-major 4x4).
    pub projection: [f32; 16],
    /// Draw items.
    pub items: Vec<RenderItem>,
    /// Nodes under the camera skipped because they or an ancestor are hidden.
    pub culled: u32,
}

impl RenderPass {
    /// Collects the visible mesh-bearing nodes under `viewport`'s camera.
    ///
    /// Returns `None` if the viewport is not attached to a target or has no
    /// live camera.
    #[must_use]
    pub fn collect(nodes: &NodeStore, viewport: &ViewPort) -> Option<Self> {
        let id = viewport.id()?;
        let camera = viewport
            .camera()
            .filter(|c| nodes.is_alive(*c) && nodes.camera(*c).is_some())?;
        let projection = viewport.projection(nodes);

        let total = 1 + nodes.descendants(camera).count();
        let visible: Vec<NodeId> = if nodes.is_visible(camera) {
            core::iter::once(camera)
                .chain(nodes.visible_descendants(camera))
                .collect()
        } else {
            Vec::new()
        };

        let items = visible
            .iter()
            .filter_map(|&node| {
                let geometry = nodes.geometry(node)?;
                let full = nodes.full_transform(node);
                Some(RenderItem {
                    node,
                    geometry,
                    full_transform: full.to_gl(),
                    mvp: (projection * full).to_gl(),
                })
            })
            .collect();

        Some(Self {
            viewport: id,
            rect: viewport.rect(),
            z_order: viewport.z_order(),
            camera,
            projection: projection.to_gl(),
            items,
            culled: u32::try_from(total - visible.len()).unwrap_or(u32::MAX),
        })
    }

    /// Number of draw items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }
}

/// The passes of one frame on one target, in draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    /// Target the plan draws to.
    pub target: RenderTargetId,
    /// Passes in ascending z-order.
    pub passes: Vec<RenderPass>,
    /// Viewports left out because they have no live camera.
    pub skipped: u32,
}

impl RenderPlan {
    /// Creates an empty plan for `target`.
    #[must_use]
    pub fn new(target: RenderTargetId) -> Self {
        Self {
            target,
            passes: Vec::new(),
            skipped: 0,
        }
    }

    /// Builds the plan for `viewports`, which must already be in draw order.
    #[must_use]
    pub fn build<'a>(
        nodes: &NodeStore,
        target: RenderTargetId,
        viewports: impl IntoIterator<Item = &'a ViewPort>,
    ) -> Self {
        let mut plan = Self::new(target);
        for vp in viewports {
            match RenderPass::collect(nodes, vp) {
                Some(pass) => plan.passes.push(pass),
                None => {
                    log::debug!("{:?} has no camera; skipping pass", vp.id());
                    plan.skipped += 1;
                }
            }
        }
        plan
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.skipped = 0;
    }
}
