// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-space viewports.
//!
//! A [`ViewPort`] is a pixel rectangle on a render target bound to one camera
//! node. Conversions between screen pixels and normalized device coordinates
//! use the viewport's own rectangle rather than the whole target, so a
//! sub-rectangle crops or zooms the camera image.
//!
//! Screen coordinates have their origin at the top-left of the target with
//! `y` growing downward. NDC has its origin at the viewport centre with `y`
//! growing upward.

use kurbo::{Point, Rect};
use vantage_core::geometry::Ray;
use vantage_core::math::{Matrix4, Vector3};
use vantage_core::node::{NodeId, NodeStore};
use vantage_core::output::{RenderTargetId, ViewPortId};

/// A camera-bound rectangle on a render target.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewPort {
    pub(crate) id: Option<ViewPortId>,
    pub(crate) rect: Rect,
    pub(crate) camera: Option<NodeId>,
    pub(crate) z_order: i32,
    pub(crate) render_target: Option<RenderTargetId>,
}

impl ViewPort {
    /// Creates a viewport covering `rect` (target pixels), rendering the
    /// sub-graph rooted at `camera`.
    ///
    /// Corners may be given in either order; the rectangle is stored with
    /// `x0 <= x1` and `y0 <= y1`. The id, z-order, and owning target are
    /// assigned when the viewport is added to a
    /// [`RenderTarget`](crate::RenderTarget).
    #[must_use]
    pub fn new(rect: Rect, camera: Option<NodeId>) -> Self {
        Self {
            id: None,
            rect: rect.abs(),
            camera,
            z_order: 0,
            render_target: None,
        }
    }

    /// The viewport's id, once added to a target.
    #[must_use]
    pub fn id(&self) -> Option<ViewPortId> {
        self.id
    }

    /// Pixel rectangle on the target.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The camera node used as render root.
    #[must_use]
    pub fn camera(&self) -> Option<NodeId> {
        self.camera
    }

    /// Draw order among the target's viewports.
    #[must_use]
    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// The owning render target, once added.
    #[must_use]
    pub fn render_target(&self) -> Option<RenderTargetId> {
        self.render_target
    }

    /// `true` if `point` (target pixels) lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    /// Maps target pixels to this viewport's NDC.
    #[must_use]
    pub fn screen_to_ndc(&self, point: Point) -> Point {
        let r = self.rect;
        Point::new(
            (point.x - r.x0) / r.width() * 2.0 - 1.0,
            1.0 - (point.y - r.y0) / r.height() * 2.0,
        )
    }

    /// Maps this viewport's NDC to target pixels.
    #[must_use]
    pub fn ndc_to_screen(&self, ndc: Point) -> Point {
        let r = self.rect;
        Point::new(
            (ndc.x + 1.0) * 0.5 * r.width() + r.x0,
            (1.0 - ndc.y) * 0.5 * r.height() + r.y0,
        )
    }

    /// The camera's projection, or identity when no camera is bound.
    #[must_use]
    pub fn projection(&self, nodes: &NodeStore) -> Matrix4 {
        self.camera
            .filter(|c| nodes.is_alive(*c))
            .and_then(|c| nodes.camera(c))
            .map_or(Matrix4::IDENTITY, |cam| cam.projection)
    }

    /// Eye-space ray through `point`, from the near plane toward the far
    /// plane.
    #[must_use]
    pub fn screen_ray(&self, nodes: &NodeStore, point: Point) -> Ray {
        let ndc = self.screen_to_ndc(point);
        let inverse = self.projection(nodes).inverse();
        let near = inverse.transform_point(Vector3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.transform_point(Vector3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Projects `local` (in `node`'s local space) to target pixels.
    ///
    /// Returns `None` for points at or behind the eye.
    #[must_use]
    pub fn node_to_screen(
        &self,
        nodes: &NodeStore,
        node: NodeId,
        local: Vector3,
    ) -> Option<Point> {
        let eye = nodes.position_to_eye(node, local);
        let clip = self.projection(nodes) * eye.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(self.ndc_to_screen(Point::new(ndc.x, ndc.y)))
    }

    /// Intersects the ray through `point` with `node`'s geometry.
    ///
    /// Returns the hit in `node`'s local space, or `None` if the node has no
    /// geometry, a singular transform, or the ray misses.
    #[must_use]
    pub fn node_from_viewport(
        &self,
        nodes: &NodeStore,
        node: NodeId,
        point: Point,
    ) -> Option<Vector3> {
        self.hit(nodes, node, point).map(|(_, local)| local)
    }

    /// Ray parameter and local-space point of the nearest hit on `node`.
    ///
    /// The parameter is shared between eye and local space because the ray is
    /// mapped through an affine transform, so hits on different nodes compare
    /// directly.
    pub(crate) fn hit(
        &self,
        nodes: &NodeStore,
        node: NodeId,
        point: Point,
    ) -> Option<(f64, Vector3)> {
        let geometry = nodes.geometry(node)?;
        let to_local = nodes.full_transform(node).try_inverse()?;
        let ray = self.screen_ray(nodes, point).transformed(&to_local);
        let t = geometry.intersect(&ray)?;
        Some((t, ray.at(t)))
    }
}
