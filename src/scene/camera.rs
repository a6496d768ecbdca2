use glam::{Affine3A, Mat4, Vec3, Vec4};

use crate::core::Managed;
use crate::scene::node::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// `fov` is the vertical field of view in radians.
    Perspective {
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        match *self {
            // glam's `*_rh` variants target wgpu's 0..1 depth range
            Self::Perspective {
                fov,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov, aspect, near, far),
            Self::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub(crate) node: NodeHandle,
    pub projection: Projection,
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            node: NodeHandle::default(),
            projection: Projection::Perspective {
                fov: 0.0,
                aspect,
                near,
                far,
            },
        };
        camera.set_perspective(fov_degrees, aspect, near, far);
        camera
    }

    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn set_perspective(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
        };
    }

    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
    }

    /// Keeps a perspective projection in step with a resized target.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Resolves view, projection and frustum for a camera placed at `world`.
    #[must_use]
    pub fn extract(&self, world: &Affine3A) -> RenderCamera {
        let view = Mat4::from(*world).inverse();
        let projection = self.projection_matrix();
        let view_projection = projection * view;
        RenderCamera {
            position: world.translation.into(),
            view,
            projection,
            view_projection,
            frustum: Frustum::from_matrix(view_projection),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Managed for Camera {}

/// Snapshot of a camera handed to the renderer for one pipeline sequence.
#[derive(Debug, Clone, Copy)]
pub struct RenderCamera {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub frustum: Frustum,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    /// Gribb-Hartmann plane extraction for a 0..1 clip-space depth range.
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[2],
            rows[3] - rows[2],
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > f32::EPSILON {
                *plane /= length;
            }
        }

        Self { planes }
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(point, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frustum_culls_behind_camera() {
        let camera = Camera::default();
        let resolved = camera.extract(&Affine3A::IDENTITY);

        assert!(resolved.frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(!resolved.frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(resolved.frustum.intersects_sphere(Vec3::new(0.0, 0.0, 1.0), 2.0));
    }
}
