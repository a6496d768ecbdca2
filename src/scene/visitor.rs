use crate::core::{ActorId, CameraId, LightId, OverlayId};
use crate::scene::actor::Actor;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::overlay::Overlay;

/// Kind-aware dispatch over hierarchy nodes.
///
/// Owners resolve a node's [`NodeKind`](crate::scene::NodeKind) and call the
/// matching method, so callers never downcast. Every method defaults to a
/// no-op; implement only the kinds you care about.
pub trait ObjectVisitor {
    fn visit_actor(&mut self, _id: ActorId, _actor: &Actor) {}

    fn visit_light(&mut self, _id: LightId, _light: &Light) {}

    fn visit_camera(&mut self, _id: CameraId, _camera: &Camera) {}

    fn visit_overlay(&mut self, _id: OverlayId, _overlay: &Overlay) {}
}
