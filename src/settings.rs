//! Engine Settings
//!
//! Plain configuration consumed by [`Scene::new`](crate::scene::Scene::new).
//! Every field has a default, so partial documents deserialize cleanly.

use glam::Vec4;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Create the default texture, material, stage, camera, viewport and
    /// pipeline entry on construction.
    pub create_defaults: bool,

    /// Size of the solid default texture.
    pub default_texture_size: u32,
    /// RGBA8 colour of the default texture.
    pub default_texture_colour: [u8; 4],

    /// Background of the default viewport.
    pub clear_colour: Vec4,

    /// Vertical field of view of new cameras, in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    /// Install a [`NullPartitioner`](crate::scene::NullPartitioner) on new stages.
    pub null_partitioner: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            create_defaults: true,
            default_texture_size: 1,
            default_texture_colour: [255, 255, 255, 255],
            clear_colour: Vec4::new(0.0, 0.0, 0.0, 1.0),
            fov_degrees: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            null_partitioner: true,
        }
    }
}
