//! Rendering orchestration.
//!
//! - [`pipeline`]: prioritized (stage, camera, viewport, target) entries
//! - [`viewport`]: normalized screen rectangles
//! - [`backend`]: the [`Renderer`] trait concrete backends implement
//! - [`upload`]: the cross-thread gate for GPU-state mutation
//!
//! With the `wgpu` feature, [`wgpu_context::WgpuContext`] provides a real
//! [`GraphicsContext`].

pub mod backend;
pub mod pipeline;
pub mod upload;
pub mod viewport;
#[cfg(feature = "wgpu")]
pub mod wgpu_context;

pub use backend::{FrameStats, Renderer, SequenceInfo, SubActor};
pub use pipeline::{Pipeline, PipelineEntry, PipelineState, RenderPriority, RenderTarget};
pub use upload::{
    GpuTextureHandle, GraphicsContext, HeadlessContext, HeadlessStats, TextureImage, UploadGate,
    UploadOptions,
};
pub use viewport::{PixelRect, Viewport, ViewportType};
#[cfg(feature = "wgpu")]
pub use wgpu_context::{WgpuContext, WgpuTexture};
