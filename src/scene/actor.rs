use rustc_hash::FxHashMap;

use crate::core::{Managed, MaterialId, MeshId};
use crate::renderer::pipeline::RenderPriority;
use crate::resources::mesh::SubMeshIndex;
use crate::scene::node::NodeHandle;

/// A renderable instance of a mesh inside a stage.
///
/// The mesh is referenced by id and resolved through the stage's resource
/// chain at render time, so several actors can share one mesh. A null mesh
/// makes the actor a pure transform node.
#[derive(Debug, Clone)]
pub struct Actor {
    pub(crate) node: NodeHandle,

    pub mesh: MeshId,
    material_overrides: FxHashMap<SubMeshIndex, MaterialId>,

    pub visible: bool,
    pub render_priority: RenderPriority,
}

impl Actor {
    #[must_use]
    pub fn new(mesh: MeshId) -> Self {
        Self {
            node: NodeHandle::default(),
            mesh,
            material_overrides: FxHashMap::default(),
            visible: true,
            render_priority: RenderPriority::MAIN,
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[must_use]
    pub fn has_geometry(&self) -> bool {
        self.mesh.is_some()
    }

    /// Replaces the material of one mesh part for this actor only.
    ///
    /// A null material removes the override.
    pub fn override_material(&mut self, part: SubMeshIndex, material: MaterialId) {
        if material.is_null() {
            self.material_overrides.remove(&part);
        } else {
            self.material_overrides.insert(part, material);
        }
    }

    #[must_use]
    pub fn material_override(&self, part: SubMeshIndex) -> Option<MaterialId> {
        self.material_overrides.get(&part).copied()
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::new(MeshId::NULL)
    }
}

impl Managed for Actor {}
