//! Scene graph and object ownership.
//!
//! - [`Hierarchy`]: arena of parent/child nodes with TRS transforms
//! - [`Stage`]: actors, lights and a local resource scope
//! - [`Scene`]: stages, cameras, viewports, overlays and the render pipeline
//! - [`ObjectVisitor`]: kind-aware dispatch over nodes
//! - [`Partitioner`]: spatial index seam queried by camera frustum

pub mod actor;
pub mod camera;
pub mod hierarchy;
pub mod light;
pub mod node;
pub mod overlay;
pub mod partitioner;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod stage;
pub mod transform;
pub mod visitor;

pub use actor::Actor;
pub use camera::{Camera, Frustum, Projection, RenderCamera};
pub use hierarchy::Hierarchy;
pub use light::{Attenuation, Light, LightKind};
pub use node::{Node, NodeHandle, NodeKind};
pub use overlay::Overlay;
pub use partitioner::{NullPartitioner, Partitioner};
pub use scene::Scene;
pub use stage::Stage;
pub use transform::Transform;
pub use visitor::ObjectVisitor;
