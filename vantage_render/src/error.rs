// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-side errors.

use thiserror::Error;
use vantage_core::output::{RenderTargetId, ViewPortId};

/// A failure surfaced to the caller of a draw, bind, or lookup.
///
/// None of these are fatal: the target keeps its previous buffer state and
/// the next frame can be attempted as usual.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The backend could not allocate a buffer of the requested size.
    #[error("cannot allocate a {width}x{height} buffer for {target:?}")]
    BufferAllocation {
        /// Target whose buffer failed.
        target: RenderTargetId,
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The target's colour buffer is missing or does not match its size.
    #[error("buffer for {0:?} is incomplete")]
    IncompleteBuffer(RenderTargetId),

    /// A capture lookup was made before a capture pass.
    #[error("{0:?} has no capture buffer")]
    NoCaptureBuffer(RenderTargetId),

    /// No such viewport on this target.
    #[error("unknown viewport {0:?}")]
    UnknownViewPort(ViewPortId),

    /// No such render target.
    #[error("unknown render target {0:?}")]
    UnknownTarget(RenderTargetId),
}
