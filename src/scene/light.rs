use glam::Vec4;

use crate::core::Managed;
use crate::scene::node::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    #[default]
    Point,
    /// Direction comes from the node's -Z axis.
    Directional,
    Spot,
}

/// Distance falloff: `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

impl Attenuation {
    #[must_use]
    pub fn factor(&self, distance: f32) -> f32 {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom <= f32::EPSILON { 1.0 } else { 1.0 / denom }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub(crate) node: NodeHandle,

    pub kind: LightKind,
    pub diffuse: Vec4,
    pub ambient: Vec4,
    pub specular: Vec4,
    pub range: f32,
    pub attenuation: Attenuation,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        Self {
            node: NodeHandle::default(),
            kind,
            diffuse: Vec4::ONE,
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular: Vec4::ONE,
            range: 100.0,
            attenuation: Attenuation::default(),
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Sets attenuation so that intensity drops to roughly 1% at `range`.
    pub fn set_range(&mut self, range: f32) {
        self.range = range;
        if range > 0.0 {
            self.attenuation = Attenuation {
                constant: 1.0,
                linear: 4.5 / range,
                quadratic: 75.0 / (range * range),
            };
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(LightKind::Point)
    }
}

impl Managed for Light {}
