use glam::Mat4;

use crate::core::Managed;
use crate::scene::node::NodeHandle;

/// 2D layer drawn over the scene with its own orthographic projection.
///
/// Overlays live in the scene hierarchy and may only be children of the scene
/// root. Higher `zindex` values draw later.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub(crate) node: NodeHandle,
    pub zindex: i32,
    projection: Mat4,
}

impl Overlay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: NodeHandle::default(),
            zindex: 0,
            projection: Mat4::orthographic_rh(0.0, 1.0, 0.0, 1.0, -1.0, 1.0),
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn set_ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.projection = Mat4::orthographic_rh(left, right, bottom, top, near, far);
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Managed for Overlay {}
