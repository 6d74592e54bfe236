// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless CPU renderer.
//!
//! [`SoftwareRenderer`] rasterizes render plans into per-target colour, depth,
//! and capture buffers held in memory. It has no GPU or windowing dependency,
//! which makes it the backend for screenshots in headless tools and for
//! capture-based picking in tests.

use hashbrown::HashMap;
use kurbo::Rect;
use vantage_core::math::{Matrix4, Vector3, Vector4};
use vantage_core::output::RenderTargetId;

use crate::backend::Renderer;
use crate::capture::CaptureColour;
use crate::config::RenderTargetConfig;
use crate::error::RenderError;
use crate::image::Image;
use crate::plan::{RenderItem, RenderPass};

/// Clip-space `w` below which a vertex counts as behind the eye.
const NEAR_W: f64 = 1e-6;

/// Limits for a [`SoftwareRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftwareRendererConfig {
    /// Largest buffer, in pixels, the renderer will allocate. Larger targets
    /// fail to bind with [`RenderError::BufferAllocation`].
    pub max_pixels: u64,
}

impl SoftwareRendererConfig {
    /// 4096 × 4096 pixels.
    pub const DEFAULT: Self = Self {
        max_pixels: 4096 * 4096,
    };
}

impl Default for SoftwareRendererConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug)]
struct Buffers {
    width: u32,
    height: u32,
    colour: Vec<[u8; 4]>,
    depth: Option<Vec<f32>>,
    capture: Option<Vec<[u8; 4]>>,
    capture_depth: Vec<f32>,
    presented: u64,
}

impl Buffers {
    fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A CPU rasterizer implementing [`Renderer`].
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    config: SoftwareRendererConfig,
    targets: HashMap<RenderTargetId, Buffers>,
    bound: Option<RenderTargetId>,
    capture_bound: Option<RenderTargetId>,
}

impl SoftwareRenderer {
    /// Creates a renderer with the given limits.
    #[must_use]
    pub fn new(config: SoftwareRendererConfig) -> Self {
        Self {
            config,
            targets: HashMap::new(),
            bound: None,
            capture_bound: None,
        }
    }

    /// The currently bound colour target.
    #[must_use]
    pub fn bound(&self) -> Option<RenderTargetId> {
        self.bound
    }

    /// How many times `target` has been presented.
    #[must_use]
    pub fn presented_frames(&self, target: RenderTargetId) -> u64 {
        self.targets.get(&target).map_or(0, |b| b.presented)
    }

    /// Drops every buffer held for `target`.
    pub fn release(&mut self, target: RenderTargetId) {
        self.targets.remove(&target);
        if self.bound == Some(target) {
            self.bound = None;
        }
        if self.capture_bound == Some(target) {
            self.capture_bound = None;
        }
    }

    fn check_size(
        &self,
        target: RenderTargetId,
        config: &RenderTargetConfig,
    ) -> Result<usize, RenderError> {
        let pixels = config.pixel_count();
        let err = RenderError::BufferAllocation {
            target,
            width: config.width,
            height: config.height,
        };
        if pixels == 0 || pixels > self.config.max_pixels {
            log::warn!(
                "refusing {}x{} buffer for {target:?}",
                config.width,
                config.height
            );
            return Err(err);
        }
        usize::try_from(pixels).map_err(|_| err)
    }
}

impl Renderer for SoftwareRenderer {
    fn bind_target(
        &mut self,
        target: RenderTargetId,
        config: &RenderTargetConfig,
    ) -> Result<(), RenderError> {
        let len = self.check_size(target, config)?;
        let buffers = self.targets.entry(target).or_insert_with(|| Buffers {
            width: config.width,
            height: config.height,
            colour: Vec::new(),
            depth: None,
            capture: None,
            capture_depth: Vec::new(),
            presented: 0,
        });
        if buffers.width != config.width || buffers.height != config.height {
            // Resized: stale capture contents no longer line up.
            buffers.width = config.width;
            buffers.height = config.height;
            buffers.capture = None;
            buffers.capture_depth.clear();
        }
        buffers.colour.clear();
        buffers.colour.resize(len, config.clear_colour);
        buffers.depth = config.has_depth.then(|| vec![f32::INFINITY; len]);
        self.bound = Some(target);
        Ok(())
    }

    fn begin_pass(&mut self, pass: &RenderPass) {
        let Some(buffers) = self.bound.and_then(|t| self.targets.get_mut(&t)) else {
            return;
        };
        let (width, height) = (buffers.width, buffers.height);
        if let Some(depth) = &mut buffers.depth {
            clear_rect(depth, width, height, pass.rect, f32::INFINITY);
        }
    }

    fn draw_item(&mut self, pass: &RenderPass, item: &RenderItem) {
        let Some(buffers) = self.bound.and_then(|t| self.targets.get_mut(&t)) else {
            return;
        };
        let colour = shade(item);
        // No depth buffer: painter's order.
        let mut surface = Surface {
            width: buffers.width,
            height: buffers.height,
            colour: &mut buffers.colour,
            depth: buffers.depth.as_deref_mut(),
        };
        rasterize(&mut surface, pass.rect, item, colour);
    }

    fn present(&mut self, target: RenderTargetId) {
        if let Some(buffers) = self.targets.get_mut(&target) {
            buffers.presented += 1;
        }
    }

    fn bind_capture(
        &mut self,
        target: RenderTargetId,
        config: &RenderTargetConfig,
    ) -> Result<(), RenderError> {
        let len = self.check_size(target, config)?;
        let Some(buffers) = self.targets.get_mut(&target) else {
            // Capture shares the colour buffer's dimensions.
            return Err(RenderError::IncompleteBuffer(target));
        };
        if buffers.len() != len {
            return Err(RenderError::IncompleteBuffer(target));
        }
        buffers.capture = Some(vec![CaptureColour::NONE.0; len]);
        buffers.capture_depth.clear();
        buffers.capture_depth.resize(len, f32::INFINITY);
        self.capture_bound = Some(target);
        Ok(())
    }

    fn begin_capture_pass(&mut self, pass: &RenderPass) {
        let Some(buffers) = self.capture_bound.and_then(|t| self.targets.get_mut(&t)) else {
            return;
        };
        let (width, height) = (buffers.width, buffers.height);
        clear_rect(
            &mut buffers.capture_depth,
            width,
            height,
            pass.rect,
            f32::INFINITY,
        );
    }

    fn draw_capture_item(&mut self, pass: &RenderPass, item: &RenderItem, colour: CaptureColour) {
        let Some(buffers) = self.capture_bound.and_then(|t| self.targets.get_mut(&t)) else {
            return;
        };
        let Some(capture) = &mut buffers.capture else {
            return;
        };
        let mut surface = Surface {
            width: buffers.width,
            height: buffers.height,
            colour: capture,
            depth: Some(&mut buffers.capture_depth),
        };
        rasterize(&mut surface, pass.rect, item, colour.0);
    }

    fn read_capture_pixel(
        &self,
        target: RenderTargetId,
        x: u32,
        y: u32,
    ) -> Option<CaptureColour> {
        let buffers = self.targets.get(&target)?;
        if x >= buffers.width || y >= buffers.height {
            return None;
        }
        let capture = buffers.capture.as_ref()?;
        capture
            .get(y as usize * buffers.width as usize + x as usize)
            .copied()
            .map(CaptureColour)
    }

    fn is_complete(&self, target: RenderTargetId) -> bool {
        self.targets
            .get(&target)
            .is_some_and(|b| b.colour.len() == b.len() && !b.colour.is_empty())
    }

    fn read_pixels(&self, target: RenderTargetId) -> Option<Image> {
        let buffers = self.targets.get(&target)?;
        Image::new(buffers.width, buffers.height, buffers.colour.clone())
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

struct Surface<'a> {
    width: u32,
    height: u32,
    colour: &'a mut [[u8; 4]],
    depth: Option<&'a mut [f32]>,
}

/// Flat per-node colour, so neighbouring meshes are distinguishable in
/// screenshots.
fn shade(item: &RenderItem) -> [u8; 4] {
    let h = item.node.index().wrapping_mul(0x9E37_79B9);
    let [a, b, c, _] = h.to_le_bytes();
    [a | 0x40, b | 0x40, c | 0x40, 255]
}

/// Pixel span covered by `rect`, clamped to the buffer. Corner order does
/// not matter, and the span never has `x1 < x0` or `y1 < y0`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the buffer size first"
)]
fn pixel_span(rect: Rect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let rect = rect.abs();
    let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
    (
        clamp(rect.x0.floor(), width),
        clamp(rect.y0.floor(), height),
        clamp(rect.x1.ceil(), width),
        clamp(rect.y1.ceil(), height),
    )
}

fn clear_rect(buf: &mut [f32], width: u32, height: u32, rect: Rect, value: f32) {
    let (x0, y0, x1, y1) = pixel_span(rect, width, height);
    for y in y0..y1 {
        let row = y as usize * width as usize;
        buf[row + x0 as usize..row + x1 as usize].fill(value);
    }
}

fn rasterize(surface: &mut Surface<'_>, rect: Rect, item: &RenderItem, colour: [u8; 4]) {
    let mvp = Matrix4::from_cols_slice(&item.mvp.map(f64::from));
    for tri in item.geometry.triangles() {
        let clip = tri.map(|v| mvp * v.extend(1.0));
        if clip.iter().any(|c| c.w < NEAR_W) {
            // Crossing the eye plane: dropped rather than clipped.
            continue;
        }
        let screen = clip.map(|c| to_screen(c, rect));
        fill_triangle(surface, rect, screen, colour);
    }
}

/// Clip space to pixel coordinates within `rect`, keeping NDC depth in `z`.
fn to_screen(clip: Vector4, rect: Rect) -> Vector3 {
    let ndc = clip.truncate() / clip.w;
    Vector3::new(
        (ndc.x + 1.0) * 0.5 * rect.width() + rect.x0,
        (1.0 - ndc.y) * 0.5 * rect.height() + rect.y0,
        ndc.z,
    )
}

fn edge(a: Vector3, b: Vector3, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "depth is stored in single precision"
)]
fn fill_triangle(surface: &mut Surface<'_>, rect: Rect, [a, b, c]: [Vector3; 3], fill: [u8; 4]) {
    let area = edge(a, b, c.x, c.y);
    if area == 0.0 {
        return;
    }
    let bounds = Rect::new(
        a.x.min(b.x).min(c.x),
        a.y.min(b.y).min(c.y),
        a.x.max(b.x).max(c.x),
        a.y.max(b.y).max(c.y),
    )
    .intersect(rect);
    let (x0, y0, x1, y1) = pixel_span(bounds, surface.width, surface.height);
    for y in y0..y1 {
        for x in x0..x1 {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            if !rect.contains(kurbo::Point::new(px, py)) {
                continue;
            }
            // Normalizing by the signed area accepts either winding.
            let w0 = edge(b, c, px, py) / area;
            let w1 = edge(c, a, px, py) / area;
            let w2 = edge(a, b, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let z = (w0 * a.z + w1 * b.z + w2 * c.z) as f32;
            if !(-1.0..=1.0).contains(&z) {
                continue;
            }
            let i = y as usize * surface.width as usize + x as usize;
            if let Some(depth) = surface.depth.as_deref_mut() {
                if z >= depth[i] {
                    continue;
                }
                depth[i] = z;
            }
            surface.colour[i] = fill;
        }
    }
}

#[cfg(test)]
mod tests {
    use vantage_core::camera::Camera;
    use vantage_core::geometry::Geometry;
    use vantage_core::node::{NodeId, NodeStore};
    use vantage_core::output::ViewPortId;

    use super::*;
    use crate::plan::RenderPass;
    use crate::viewport::ViewPort;

    const TARGET: RenderTargetId = RenderTargetId(7);

    fn pass_for(nodes: &NodeStore, cam: NodeId, rect: Rect) -> RenderPass {
        let mut vp = ViewPort::new(rect, Some(cam));
        vp.id = Some(ViewPortId {
            target: TARGET,
            serial: 0,
        });
        RenderPass::collect(nodes, &vp).unwrap()
    }

    fn quad_scene(z: f64) -> (NodeStore, NodeId, NodeId) {
        let mut nodes = NodeStore::new();
        let cam = nodes.create_camera(Camera::perspective(90.0, 1.0, 0.1, 100.0));
        let quad = nodes.create_mesh(Geometry::Quad {
            width: 1.0,
            height: 1.0,
        });
        nodes.add_child(cam, quad).unwrap();
        nodes.set_position(quad, Vector3::new(0.0, 0.0, z));
        (nodes, cam, quad)
    }

    #[test]
    fn oversized_target_fails_without_touching_buffers() {
        let mut r = SoftwareRenderer::new(SoftwareRendererConfig { max_pixels: 100 });
        let small = RenderTargetConfig::screen(10, 10);
        r.bind_target(TARGET, &small).unwrap();
        let err = r
            .bind_target(TARGET, &RenderTargetConfig::screen(20, 20))
            .unwrap_err();
        assert_eq!(err, RenderError::BufferAllocation {
            target: TARGET,
            width: 20,
            height: 20
        });
        assert!(r.is_complete(TARGET));
        assert_eq!(r.read_pixels(TARGET).unwrap().width(), 10);
    }

    #[test]
    fn quad_covers_centre_only() {
        let (nodes, cam, _) = quad_scene(-2.0);
        let config = RenderTargetConfig::screen(20, 20);
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &config).unwrap();
        let pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 20.0, 20.0));
        r.begin_pass(&pass);
        for item in &pass.items {
            r.draw_item(&pass, item);
        }
        r.end_pass(&pass);
        r.present(TARGET);

        let img = r.read_pixels(TARGET).unwrap();
        // Half-extent 0.5 at distance 2 with a 90° frustum spans the middle
        // quarter of each axis.
        assert_ne!(img.pixel(10, 10), Some(config.clear_colour));
        assert_eq!(img.pixel(1, 1), Some(config.clear_colour));
        assert_eq!(img.pixel(10, 2), Some(config.clear_colour));
        assert_eq!(r.presented_frames(TARGET), 1);
    }

    #[test]
    fn pass_is_confined_to_its_rect() {
        let (nodes, cam, _) = quad_scene(-0.2);
        let config = RenderTargetConfig::screen(20, 20);
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &config).unwrap();
        let pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 10.0, 10.0));
        r.begin_pass(&pass);
        r.draw_item(&pass, &pass.items[0]);

        let img = r.read_pixels(TARGET).unwrap();
        assert_ne!(img.pixel(5, 5), Some(config.clear_colour));
        assert_eq!(img.pixel(15, 15), Some(config.clear_colour));
        assert_eq!(img.pixel(12, 5), Some(config.clear_colour));
    }

    #[test]
    fn capture_pixels_carry_node_colour() {
        let (nodes, cam, quad) = quad_scene(-2.0);
        let config = RenderTargetConfig::screen(20, 20);
        let mut r = SoftwareRenderer::default();
        assert_eq!(
            r.bind_capture(TARGET, &config),
            Err(RenderError::IncompleteBuffer(TARGET))
        );
        r.bind_target(TARGET, &config).unwrap();
        r.bind_capture(TARGET, &config).unwrap();

        let pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 20.0, 20.0));
        let colour = CaptureColour::for_node(quad).unwrap();
        r.begin_capture_pass(&pass);
        r.draw_capture_item(&pass, &pass.items[0], colour);

        assert_eq!(r.read_capture_pixel(TARGET, 10, 10), Some(colour));
        assert_eq!(r.read_capture_pixel(TARGET, 0, 0), Some(CaptureColour::NONE));
        assert_eq!(r.read_capture_pixel(TARGET, 20, 0), None);
    }

    #[test]
    fn nearer_item_wins_depth_test() {
        let mut nodes = NodeStore::new();
        let cam = nodes.create_camera(Camera::perspective(90.0, 1.0, 0.1, 100.0));
        let far = nodes.create_mesh(Geometry::Quad {
            width: 4.0,
            height: 4.0,
        });
        let near = nodes.create_mesh(Geometry::Quad {
            width: 0.5,
            height: 0.5,
        });
        // Near quad is attached first so it is drawn first.
        nodes.add_children(cam, &[near, far]).unwrap();
        nodes.set_position(near, Vector3::new(0.0, 0.0, -1.0));
        nodes.set_position(far, Vector3::new(0.0, 0.0, -3.0));

        let config = RenderTargetConfig::screen(20, 20);
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &config).unwrap();
        let pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 20.0, 20.0));
        r.begin_pass(&pass);
        for item in &pass.items {
            r.draw_item(&pass, item);
        }
        let img = r.read_pixels(TARGET).unwrap();
        assert_eq!(img.pixel(10, 10), Some(shade(&pass.items[0])));
        assert_eq!(img.pixel(4, 10), Some(shade(&pass.items[1])));
    }

    #[test]
    fn pixel_span_orders_corners() {
        assert_eq!(pixel_span(Rect::new(8.0, 0.0, 2.0, 10.0), 20, 20), (2, 0, 8, 10));
        assert_eq!(pixel_span(Rect::new(4.0, 4.0, 4.0, 9.0), 20, 20), (4, 4, 4, 9));
    }

    #[test]
    fn inverted_pass_rect_clears_without_panicking() {
        let (nodes, cam, _) = quad_scene(-2.0);
        let config = RenderTargetConfig::screen(20, 20);
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &config).unwrap();
        r.bind_capture(TARGET, &config).unwrap();
        let mut pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 20.0, 20.0));
        pass.rect = Rect::new(8.0, 0.0, 2.0, 10.0);
        r.begin_pass(&pass);
        r.begin_capture_pass(&pass);
        pass.rect = Rect::new(5.0, 5.0, 5.0, 5.0);
        r.begin_pass(&pass);
        r.draw_item(&pass, &pass.items[0]);
        assert_eq!(r.read_pixels(TARGET).unwrap().pixel(10, 10), Some(config.clear_colour));
    }

    #[test]
    fn without_depth_later_items_paint_over() {
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
        nodes.add_children(cam, &[near, far]).unwrap();
        nodes.set_position(near, Vector3::new(0.0, 0.0, -1.0));
        nodes.set_position(far, Vector3::new(0.0, 0.0, -3.0));

        let config = RenderTargetConfig {
            has_depth: false,
            ..RenderTargetConfig::screen(20, 20)
        };
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &config).unwrap();
        let pass = pass_for(&nodes, cam, Rect::new(0.0, 0.0, 20.0, 20.0));
        r.begin_pass(&pass);
        for item in &pass.items {
            r.draw_item(&pass, item);
        }
        let img = r.read_pixels(TARGET).unwrap();
        assert_eq!(img.pixel(10, 10), Some(shade(&pass.items[1])));
    }

    #[test]
    fn release_unbinds() {
        let mut r = SoftwareRenderer::default();
        r.bind_target(TARGET, &RenderTargetConfig::screen(4, 4)).unwrap();
        assert_eq!(r.bound(), Some(TARGET));
        r.release(TARGET);
        assert_eq!(r.bound(), None);
        assert!(!r.is_complete(TARGET));
    }
}
