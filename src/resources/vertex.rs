use std::sync::Arc;

use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};

use crate::core::BufferId;

bitflags! {
    /// Selects which per-vertex attributes a [`VertexBuffer`] contains.
    ///
    /// Attributes are always laid out in bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct AttributeMask: u32 {
        const POSITION   = 1;
        const TEXCOORD_1 = 2;
        const DIFFUSE    = 4;
        const NORMAL     = 8;
    }
}

impl AttributeMask {
    /// Float count of a single attribute bit. Zero for combined or empty masks.
    #[must_use]
    pub const fn attribute_floats(self) -> usize {
        match self.bits() {
            1 | 8 => 3,
            2 => 2,
            4 => 4,
            _ => 0,
        }
    }

    #[must_use]
    pub fn stride_floats(self) -> usize {
        self.iter().map(AttributeMask::attribute_floats).sum()
    }

    #[must_use]
    pub fn stride_bytes(self) -> usize {
        self.stride_floats() * std::mem::size_of::<f32>()
    }

    /// Float offset of `attribute` within one vertex, if it is part of the mask.
    #[must_use]
    pub fn offset_floats(self, attribute: AttributeMask) -> Option<usize> {
        if !self.contains(attribute) || attribute.bits().count_ones() != 1 {
            return None;
        }
        Some(
            self.iter()
                .take_while(|bit| *bit != attribute)
                .map(AttributeMask::attribute_floats)
                .sum(),
        )
    }
}

/// One vertex with every attribute the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub diffuse: Vec4,
    pub normal: Vec3,
}

impl Vertex {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::default()
        }
    }

    fn write(&self, mask: AttributeMask, out: &mut Vec<f32>) {
        if mask.contains(AttributeMask::POSITION) {
            out.extend_from_slice(&self.position.to_array());
        }
        if mask.contains(AttributeMask::TEXCOORD_1) {
            out.extend_from_slice(&self.tex_coord.to_array());
        }
        if mask.contains(AttributeMask::DIFFUSE) {
            out.extend_from_slice(&self.diffuse.to_array());
        }
        if mask.contains(AttributeMask::NORMAL) {
            out.extend_from_slice(&self.normal.to_array());
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            tex_coord: Vec2::ZERO,
            diffuse: Vec4::ONE,
            normal: Vec3::Z,
        }
    }
}

/// Three indices into the vertex store visible to the owning part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

    #[inline]
    #[must_use]
    pub const fn index(&self, corner: usize) -> u32 {
        self.indices[corner]
    }
}

/// CPU-side interleaved vertex stream for one attribute mask.
///
/// Every build gets a fresh [`BufferId`]; a backend uploads it once and keys
/// the GPU object by that id.
#[derive(Debug)]
pub struct VertexBuffer {
    id: BufferId,
    mask: AttributeMask,
    vertex_count: u32,
    data: Vec<f32>,
}

impl VertexBuffer {
    pub(crate) fn build<'a>(
        mask: AttributeMask,
        corners: impl Iterator<Item = &'a Vertex>,
    ) -> Arc<Self> {
        let mut data = Vec::new();
        let mut vertex_count = 0u32;
        for vertex in corners {
            vertex.write(mask, &mut data);
            vertex_count += 1;
        }

        Arc::new(Self {
            id: BufferId::allocate(),
            mask,
            vertex_count,
            data,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn mask(&self) -> AttributeMask {
        self.mask
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    #[must_use]
    pub fn stride_bytes(&self) -> usize {
        self.mask.stride_bytes()
    }

    #[must_use]
    pub fn floats(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
