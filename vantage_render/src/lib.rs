// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets, viewports and picking for vantage scene graphs.
//!
//! This crate turns the node hierarchy of [`vantage_core`] into draw
//! commands and maps screen points back to nodes. It defines:
//!
//! - [`Compositor`]: every render target, drawn in priority order
//! - [`RenderTarget`]: z-ordered viewports sharing one output buffer
//! - [`ViewPort`]: a pixel rectangle rendered from one camera
//! - [`RenderPlan`]: the passes and items of one frame on one target
//! - [`Renderer`]: the backend contract, with [`SoftwareRenderer`] as a CPU
//!   implementation for headless use and tests
//! - [`CaptureTable`]: flat-colour node identifiers for pixel-exact picking
//!
//! Screen coordinates are pixels with the origin at the top-left and y
//! pointing down.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod backend;
mod capture;
mod compositor;
mod config;
mod error;
mod image;
mod plan;
mod software;
mod target;
mod viewport;

pub use backend::Renderer;
pub use capture::{CaptureColour, CaptureTable};
pub use compositor::{Compositor, FrameReport};
pub use config::RenderTargetConfig;
pub use error::RenderError;
pub use image::Image;
pub use plan::{RenderItem, RenderPass, RenderPlan};
pub use software::{SoftwareRenderer, SoftwareRendererConfig};
pub use target::{DelegateId, DrawState, PickHit, RenderTarget, RenderTargetDelegate};
pub use viewport::ViewPort;
