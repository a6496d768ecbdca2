//! Identity and ownership primitives shared by every subsystem.

pub mod id;
pub mod manager;
pub mod signal;

pub use id::{
    ActorId, BufferId, CameraId, IdKind, LightId, MaterialId, MeshId, OverlayId, PipelineId,
    ShaderId, StageId, TextureId, UniqueId, ViewportId,
};
pub use manager::{Managed, Manager};
pub use signal::{Connection, InstanceHook, Signal};
