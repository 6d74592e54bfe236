// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector, quaternion, and matrix value types.
//!
//! All types use `f64` internally and export `f32` buffers only at the GPU
//! boundary ([`Matrix4::to_gl`], [`Matrix4::to_gl_rotation`]). Operations never
//! allocate and never produce NaN from a degenerate input on their own:
//! zero-length normalization and singular inversion return documented
//! fallbacks instead.

mod matrix;
mod quaternion;
mod vector;

pub use matrix::Matrix4;
pub use quaternion::Quaternion;
pub use vector::{Vector3, Vector4};
