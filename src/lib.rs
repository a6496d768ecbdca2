#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Lantern: scene, resource and render-pipeline core of a real-time 3D
//! renderer.
//!
//! Resources are created through managers that hand out typed handles
//! ([`MeshId`], [`TextureId`], ...). Handles resolve on demand; a deleted
//! handle stops resolving and reports [`EngineError::NotFound`].
//!
//! ```rust,ignore
//! let gate = UploadGate::new(HeadlessContext::new());
//! let mut scene = Scene::new(EngineSettings::default(), gate)?;
//!
//! let stage = scene.default_stage();
//! let mesh = scene.stage_mut(stage)?.resources_mut().new_mesh()?;
//! let actor = scene.stage_mut(stage)?.new_actor_with_mesh(mesh)?;
//!
//! let stats = scene.render(&mut my_renderer)?;
//! ```

pub mod assets;
pub mod core;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;

pub use assets::{Loader, LoaderOptions, TextureLoader};
pub use crate::core::{
    ActorId, BufferId, CameraId, LightId, MaterialId, MeshId, OverlayId, PipelineId, ShaderId,
    StageId, TextureId, UniqueId, ViewportId,
};
pub use errors::{EngineError, Result};
pub use renderer::{
    FrameStats, HeadlessContext, RenderPriority, RenderTarget, Renderer, SubActor, UploadGate,
    UploadOptions, ViewportType,
};
pub use resources::{AttributeMask, Material, Mesh, ResourceChain, ResourceManager, Texture};
pub use scene::{Actor, Camera, Light, LightKind, NodeHandle, Overlay, Scene, Stage};
pub use settings::EngineSettings;
