use std::borrow::Cow;

use glam::Vec4;

use crate::core::{Managed, ShaderId, TextureId};

/// Number of texture units a material can bind.
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Framebuffer blend equation requested by a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendType {
    /// Source replaces destination.
    #[default]
    One,
    Add,
    Alpha,
    Colour,
    Modulate,
}

/// Surface description shared by every sub-actor that references it.
///
/// Materials are plain data: cloning one is how the `new_material_from`
/// variant copies an existing entry.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Cow<'static, str>,

    /// Null resolves to the default shader at draw time.
    pub shader: ShaderId,
    textures: [TextureId; MAX_TEXTURE_UNITS],

    pub diffuse: Vec4,
    pub blend: BlendType,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Binds `texture` to `unit`. Units past [`MAX_TEXTURE_UNITS`] are ignored
    /// with a warning.
    pub fn set_texture_unit(&mut self, unit: usize, texture: TextureId) {
        match self.textures.get_mut(unit) {
            Some(slot) => *slot = texture,
            None => log::warn!("Material '{}': texture unit {unit} out of range", self.name),
        }
    }

    #[must_use]
    pub fn texture_unit(&self, unit: usize) -> TextureId {
        self.textures.get(unit).copied().unwrap_or_default()
    }

    /// Bound (non-null) units in unit order.
    pub fn bound_textures(&self) -> impl Iterator<Item = (usize, TextureId)> + '_ {
        self.textures
            .iter()
            .enumerate()
            .filter(|(_, id)| id.is_some())
            .map(|(unit, id)| (unit, *id))
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.blend != BlendType::One || self.diffuse.w < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("Material"),
            shader: ShaderId::NULL,
            textures: [TextureId::NULL; MAX_TEXTURE_UNITS],
            diffuse: Vec4::ONE,
            blend: BlendType::default(),
            depth_test: true,
            depth_write: true,
        }
    }
}

impl Managed for Material {}
