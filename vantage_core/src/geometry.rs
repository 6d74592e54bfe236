// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node geometry and ray intersection.
//!
//! Mesh-bearing nodes carry a [`Geometry`] describing their shape in local
//! space. Picking casts a [`Ray`] into a node's local space and intersects it
//! with that shape; renderers tessellate it with [`Geometry::triangles`].

use core::f64::consts::{PI, TAU};

use crate::math::{Matrix4, Vector3};

/// Directions closer than this to parallel with a plane are treated as misses.
const PARALLEL_EPSILON: f64 = 1e-12;

const SPHERE_STACKS: u32 = 8;
const SPHERE_SLICES: u32 = 12;

/// Local-space shape of a mesh-bearing node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// A rectangle in the XY plane, centred on the origin, facing +Z.
    Quad {
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        height: f64,
    },
    /// An axis-aligned box centred on the origin.
    Cuboid {
        /// Half the extent along each axis.
        half_extents: Vector3,
    },
    /// A sphere centred on the origin.
    Sphere {
        /// Sphere radius.
        radius: f64,
    },
}

/// A half-line `origin + t * direction` for `t >= 0`.
///
/// The direction is not required to be normalized; intersection parameters
/// are in units of `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vector3,
    /// Direction of travel.
    pub direction: Vector3,
}

impl Ray {
    /// Creates a ray.
    #[inline]
    #[must_use]
    pub const fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// The point at parameter `t`.
    #[inline]
    #[must_use]
    pub fn at(&self, t: f64) -> Vector3 {
        self.origin + self.direction * t
    }

    /// Maps the ray through an affine transform.
    #[must_use]
    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self {
            origin: m.transform_point(self.origin),
            direction: m.transform_vector(self.direction),
        }
    }
}

impl Geometry {
    /// Nearest non-negative ray parameter at which `ray` meets the shape.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        match *self {
            Self::Quad { width, height } => {
                let dz = ray.direction.z;
                if dz.abs() < PARALLEL_EPSILON {
                    return None;
                }
                let t = -ray.origin.z / dz;
                if t < 0.0 {
                    return None;
                }
                let p = ray.at(t);
                (p.x.abs() <= width * 0.5 && p.y.abs() <= height * 0.5).then_some(t)
            }
            Self::Cuboid { half_extents } => intersect_box(ray, half_extents),
            Self::Sphere { radius } => {
                let a = ray.direction.length_squared();
                if a == 0.0 {
                    return None;
                }
                let b = 2.0 * ray.origin.dot(ray.direction);
                let c = ray.origin.length_squared() - radius * radius;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let root = disc.sqrt();
                let near = (-b - root) / (2.0 * a);
                let far = (-b + root) / (2.0 * a);
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    Some(far)
                } else {
                    None
                }
            }
        }
    }

    /// Tessellates the shape into counter-clockwise triangles.
    #[must_use]
    pub fn triangles(&self) -> Vec<[Vector3; 3]> {
        match *self {
            Self::Quad { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                let a = Vector3::new(-hw, -hh, 0.0);
                let b = Vector3::new(hw, -hh, 0.0);
                let c = Vector3::new(hw, hh, 0.0);
                let d = Vector3::new(-hw, hh, 0.0);
                vec![[a, b, c], [a, c, d]]
            }
            Self::Cuboid { half_extents: h } => {
                let corner = |sx: f64, sy: f64, sz: f64| Vector3::new(sx * h.x, sy * h.y, sz * h.z);
                // Each face as four corners in counter-clockwise order seen
                // from outside.
                let faces = [
                    [(1., -1., -1.), (1., 1., -1.), (1., 1., 1.), (1., -1., 1.)],
                    [(-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.), (-1., -1., -1.)],
                    [(-1., 1., -1.), (-1., 1., 1.), (1., 1., 1.), (1., 1., -1.)],
                    [(-1., -1., 1.), (-1., -1., -1.), (1., -1., -1.), (1., -1., 1.)],
                    [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
                    [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
                ];
                let mut out = Vec::with_capacity(12);
                for face in faces {
                    let [a, b, c, d] = face.map(|(x, y, z)| corner(x, y, z));
                    out.push([a, b, c]);
                    out.push([a, c, d]);
                }
                out
            }
            Self::Sphere { radius } => {
                let point = |stack: u32, slice: u32| {
                    let phi = PI * f64::from(stack) / f64::from(SPHERE_STACKS);
                    let theta = TAU * f64::from(slice) / f64::from(SPHERE_SLICES);
                    Vector3::new(
                        radius * phi.sin() * theta.cos(),
                        radius * phi.cos(),
                        -radius * phi.sin() * theta.sin(),
                    )
                };
                let mut out = Vec::new();
                for stack in 0..SPHERE_STACKS {
                    for slice in 0..SPHERE_SLICES {
                        let a = point(stack, slice);
                        let b = point(stack + 1, slice);
                        let c = point(stack + 1, slice + 1);
                        let d = point(stack, slice + 1);
                        if stack != 0 {
                            out.push([a, b, d]);
                        }
                        if stack + 1 != SPHERE_STACKS {
                            out.push([b, c, d]);
                        }
                    }
                }
                out
            }
        }
    }
}

/// Slab test against the box `[-h, h]`.
fn intersect_box(ray: &Ray, h: Vector3) -> Option<f64> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    let axes = [
        (ray.origin.x, ray.direction.x, h.x),
        (ray.origin.y, ray.direction.y, h.y),
        (ray.origin.z, ray.direction.z, h.z),
    ];
    for (o, d, half) in axes {
        if d.abs() < PARALLEL_EPSILON {
            if o.abs() > half {
                return None;
            }
            continue;
        }
        let t1 = (-half - o) / d;
        let t2 = (half - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }
    if t_max < t_min || t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}
