use std::cell::{Cell, RefCell};
use std::sync::Arc;

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::core::{Managed, MaterialId};
use crate::errors::{EngineError, Result};
use crate::resources::vertex::{AttributeMask, Triangle, Vertex, VertexBuffer};

/// Index of a part inside a [`Mesh`]. [`SubMeshIndex::ROOT`] is the mesh itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubMeshIndex(usize);

impl SubMeshIndex {
    pub const ROOT: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// How the triangle list is meant to be assembled by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshArrangement {
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
}

/// One node of the submesh tree.
///
/// A part with `shared_vertices` owns no vertices; its indices address the
/// store of the nearest ancestor that does.
#[derive(Debug, Default)]
struct MeshPart {
    parent: Option<usize>,
    shared_vertices: bool,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    material: MaterialId,
    // Derived from vertices/triangles; never a source of truth.
    buffers: RefCell<FxHashMap<AttributeMask, Arc<VertexBuffer>>>,
}

impl Clone for MeshPart {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent,
            shared_vertices: self.shared_vertices,
            vertices: self.vertices.clone(),
            triangles: self.triangles.clone(),
            material: self.material,
            buffers: RefCell::default(),
        }
    }
}

/// Vertex and triangle storage with lazily built GPU buffer variants.
///
/// # Buffer cache
///
/// [`Mesh::vbo`] returns a [`VertexBuffer`] holding exactly the requested
/// attributes. Variants are built on first request and reused until the next
/// structural mutation of the part (or of the vertex store it shares), at
/// which point every variant of that part is dropped.
///
/// # Submeshes
///
/// [`Mesh::add_submesh`] creates a child part. With `shared_vertices = true`
/// the child only owns triangles and reads vertices from its parent, which
/// allows several materials over one vertex store.
#[derive(Debug)]
pub struct Mesh {
    parts: Vec<MeshPart>,
    arrangement: MeshArrangement,
    builds: Cell<u64>,
}

impl Mesh {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parts: vec![MeshPart::default()],
            arrangement: MeshArrangement::default(),
            builds: Cell::new(0),
        }
    }

    // ========================================================================
    // Root part
    // ========================================================================

    /// Appends a vertex at `(x, y, z)` and returns its index.
    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32) -> u32 {
        self.push_vertex(0, Vertex::new(x, y, z))
    }

    pub fn add_vertex_with(&mut self, vertex: Vertex) -> u32 {
        self.push_vertex(0, vertex)
    }

    /// Appends a triangle. Indices are checked when a buffer is built.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.push_triangle(0, Triangle::new(a, b, c));
    }

    #[must_use]
    pub fn vertex(&self, index: u32) -> Option<&Vertex> {
        self.part_vertices(0).get(index as usize)
    }

    /// Mutable access to a root vertex. Drops every buffer built from it.
    pub fn vertex_mut(&mut self, index: u32) -> Option<&mut Vertex> {
        self.invalidate_vertex_store(0);
        self.parts[0].vertices.get_mut(index as usize)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.parts[0].vertices.len()
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.parts[0].triangles
    }

    /// Buffer for `mask` built from the root part's triangles.
    pub fn vbo(&self, mask: AttributeMask) -> Result<Arc<VertexBuffer>> {
        self.part_vbo(0, mask)
    }

    // ========================================================================
    // Submesh tree
    // ========================================================================

    /// Adds a child part under the root.
    pub fn add_submesh(&mut self, shared_vertices: bool) -> SubMeshIndex {
        self.push_part(0, shared_vertices)
    }

    pub fn submesh(&self, index: SubMeshIndex) -> Result<SubMesh<'_>> {
        self.check_part(index)?;
        Ok(SubMesh {
            mesh: self,
            part: index.0,
        })
    }

    pub fn submesh_mut(&mut self, index: SubMeshIndex) -> Result<SubMeshMut<'_>> {
        self.check_part(index)?;
        Ok(SubMeshMut {
            mesh: self,
            part: index.0,
        })
    }

    /// Number of parts below the root.
    #[must_use]
    pub fn submesh_count(&self) -> usize {
        self.parts.len() - 1
    }

    /// Every part, root included, that has at least one triangle.
    pub fn renderable_parts(&self) -> impl Iterator<Item = SubMesh<'_>> {
        (0..self.parts.len())
            .filter(|&part| !self.parts[part].triangles.is_empty())
            .map(|part| SubMesh { mesh: self, part })
    }

    // ========================================================================
    // Whole-mesh state
    // ========================================================================

    #[must_use]
    pub fn arrangement(&self) -> MeshArrangement {
        self.arrangement
    }

    pub fn set_arrangement(&mut self, arrangement: MeshArrangement) {
        self.arrangement = arrangement;
    }

    /// Sets the diffuse colour of every owned vertex in every part.
    pub fn set_diffuse_colour(&mut self, colour: Vec4) {
        for part in &mut self.parts {
            for vertex in &mut part.vertices {
                vertex.diffuse = colour;
            }
            part.buffers.get_mut().clear();
        }
    }

    /// Drops all geometry and submeshes.
    pub fn clear(&mut self) {
        self.parts.truncate(1);
        let root = &mut self.parts[0];
        root.vertices.clear();
        root.triangles.clear();
        root.buffers.get_mut().clear();
    }

    /// Number of vertex buffers built over the mesh lifetime.
    #[must_use]
    pub fn buffer_builds(&self) -> u64 {
        self.builds.get()
    }

    /// Number of buffer variants currently cached across all parts.
    #[must_use]
    pub fn cached_buffer_count(&self) -> usize {
        self.parts.iter().map(|p| p.buffers.borrow().len()).sum()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_part(&self, index: SubMeshIndex) -> Result<()> {
        if index.0 < self.parts.len() {
            Ok(())
        } else {
            Err(EngineError::not_found("SubMesh", index.0 as u64))
        }
    }

    fn push_part(&mut self, parent: usize, shared_vertices: bool) -> SubMeshIndex {
        self.parts.push(MeshPart {
            parent: Some(parent),
            shared_vertices,
            ..MeshPart::default()
        });
        SubMeshIndex(self.parts.len() - 1)
    }

    /// Part that physically stores the vertices `part` reads.
    fn vertex_owner(&self, mut part: usize) -> usize {
        while self.parts[part].shared_vertices {
            match self.parts[part].parent {
                Some(parent) => part = parent,
                None => break,
            }
        }
        part
    }

    fn part_vertices(&self, part: usize) -> &[Vertex] {
        &self.parts[self.vertex_owner(part)].vertices
    }

    fn invalidate_vertex_store(&mut self, owner: usize) {
        for part in 0..self.parts.len() {
            if self.vertex_owner(part) == owner {
                self.parts[part].buffers.get_mut().clear();
            }
        }
    }

    fn push_vertex(&mut self, part: usize, vertex: Vertex) -> u32 {
        self.parts[part].vertices.push(vertex);
        self.invalidate_vertex_store(part);
        (self.parts[part].vertices.len() - 1) as u32
    }

    fn push_triangle(&mut self, part: usize, triangle: Triangle) {
        let target = &mut self.parts[part];
        target.triangles.push(triangle);
        target.buffers.get_mut().clear();
    }

    fn part_vbo(&self, part: usize, mask: AttributeMask) -> Result<Arc<VertexBuffer>> {
        if mask.is_empty() {
            return Err(EngineError::InvalidOperation(
                "vertex buffer requested with an empty attribute mask".into(),
            ));
        }

        let cache = &self.parts[part].buffers;
        if let Some(buffer) = cache.borrow().get(&mask) {
            return Ok(Arc::clone(buffer));
        }

        let vertices = self.part_vertices(part);
        let triangles = &self.parts[part].triangles;
        for triangle in triangles {
            if let Some(&index) = triangle
                .indices
                .iter()
                .find(|&&i| i as usize >= vertices.len())
            {
                return Err(EngineError::VertexIndexOutOfRange {
                    index,
                    count: vertices.len(),
                });
            }
        }

        let corners = triangles
            .iter()
            .flat_map(|t| t.indices.iter().map(|&i| &vertices[i as usize]));
        let buffer = VertexBuffer::build(mask, corners);

        self.builds.set(self.builds.get() + 1);
        log::debug!(
            "Built vertex buffer {:?} (part {part}, mask {mask:?}, {} vertices)",
            buffer.id(),
            buffer.vertex_count()
        );

        cache.borrow_mut().insert(mask, Arc::clone(&buffer));
        Ok(buffer)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Mesh {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            arrangement: self.arrangement,
            builds: Cell::new(0),
        }
    }
}

impl Managed for Mesh {}

// ============================================================================
// Submesh views
// ============================================================================

/// Read-only view of one part.
#[derive(Debug, Clone, Copy)]
pub struct SubMesh<'a> {
    mesh: &'a Mesh,
    part: usize,
}

impl<'a> SubMesh<'a> {
    #[must_use]
    pub fn index(&self) -> SubMeshIndex {
        SubMeshIndex(self.part)
    }

    #[must_use]
    pub fn parent(&self) -> Option<SubMeshIndex> {
        self.mesh.parts[self.part].parent.map(SubMeshIndex)
    }

    #[must_use]
    pub fn shares_vertices(&self) -> bool {
        self.mesh.parts[self.part].shared_vertices
    }

    /// Vertex `index` of the store this part reads from.
    #[must_use]
    pub fn vertex(&self, index: u32) -> Option<&'a Vertex> {
        self.mesh.part_vertices(self.part).get(index as usize)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.part_vertices(self.part).len()
    }

    #[must_use]
    pub fn triangles(&self) -> &'a [Triangle] {
        &self.mesh.parts[self.part].triangles
    }

    #[must_use]
    pub fn material(&self) -> MaterialId {
        self.mesh.parts[self.part].material
    }

    pub fn vbo(&self, mask: AttributeMask) -> Result<Arc<VertexBuffer>> {
        self.mesh.part_vbo(self.part, mask)
    }
}

/// Mutable view of one part.
#[derive(Debug)]
pub struct SubMeshMut<'a> {
    mesh: &'a mut Mesh,
    part: usize,
}

impl SubMeshMut<'_> {
    #[must_use]
    pub fn view(&self) -> SubMesh<'_> {
        SubMesh {
            mesh: self.mesh,
            part: self.part,
        }
    }

    fn reject_shared(&self, what: &str) -> Result<()> {
        if self.mesh.parts[self.part].shared_vertices {
            return Err(EngineError::InvalidOperation(format!(
                "can not {what} on submesh {} because it shares its parent's vertices",
                self.part
            )));
        }
        Ok(())
    }

    /// Appends a vertex to this part's own store.
    ///
    /// Fails on shared-vertex parts; add to the owning parent instead.
    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32) -> Result<u32> {
        self.add_vertex_with(Vertex::new(x, y, z))
    }

    pub fn add_vertex_with(&mut self, vertex: Vertex) -> Result<u32> {
        self.reject_shared("add a vertex")?;
        Ok(self.mesh.push_vertex(self.part, vertex))
    }

    pub fn vertex_mut(&mut self, index: u32) -> Result<Option<&mut Vertex>> {
        self.reject_shared("edit a vertex")?;
        self.mesh.invalidate_vertex_store(self.part);
        Ok(self.mesh.parts[self.part].vertices.get_mut(index as usize))
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.mesh.push_triangle(self.part, Triangle::new(a, b, c));
    }

    pub fn set_material(&mut self, material: MaterialId) {
        self.mesh.parts[self.part].material = material;
    }

    /// Adds a nested part below this one.
    pub fn add_submesh(&mut self, shared_vertices: bool) -> SubMeshIndex {
        self.mesh.push_part(self.part, shared_vertices)
    }

    pub fn vbo(&self, mask: AttributeMask) -> Result<Arc<VertexBuffer>> {
        self.mesh.part_vbo(self.part, mask)
    }
}
