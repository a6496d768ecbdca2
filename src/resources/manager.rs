//! Resource Manager Aggregate
//!
//! [`ResourceManager`] composes one [`Manager`] per shareable resource kind
//! (meshes, textures, shaders, materials) behind per-kind methods. Because
//! each store is keyed by its own handle type, `new_mesh` and
//! `new_texture` can never be confused.
//!
//! A scene owns the root manager; every stage owns a local one. A
//! [`ResourceChain`] resolves handles local-first and then walks up to the
//! parent scopes, so stages can use scene-wide defaults without copying them.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::assets::{Loader, LoaderOptions};
use crate::core::id::{MaterialTag, MeshTag, ShaderTag, TextureTag};
use crate::core::{Manager, MaterialId, MeshId, ShaderId, TextureId};
use crate::errors::{EngineError, Result};
use crate::resources::material::Material;
use crate::resources::mesh::Mesh;
use crate::resources::shader::ShaderProgram;
use crate::resources::texture::Texture;

/// Per-kind stores for meshes, textures, shaders and materials.
pub struct ResourceManager {
    meshes: Manager<MeshTag, Mesh>,
    textures: Manager<TextureTag, Texture>,
    shaders: Manager<ShaderTag, ShaderProgram>,
    materials: Manager<MaterialTag, Material>,
    shader_names: Rc<RefCell<FxHashMap<String, ShaderId>>>,
}

impl ResourceManager {
    #[must_use]
    pub fn new() -> Self {
        let mut shaders: Manager<ShaderTag, ShaderProgram> = Manager::new();
        let shader_names: Rc<RefCell<FxHashMap<String, ShaderId>>> = Rc::default();

        let names = Rc::clone(&shader_names);
        shaders
            .post_create_signal()
            .connect(move |shader: &mut ShaderProgram, id| {
                let previous = names.borrow_mut().insert(shader.name().to_owned(), id);
                if let Some(previous) = previous {
                    log::warn!("Shader name '{}' now refers to {id} (was {previous})", shader.name());
                }
                Ok(())
            });

        let names = Rc::clone(&shader_names);
        shaders.pre_delete_signal().connect(move |id| {
            names.borrow_mut().retain(|_, entry| *entry != id);
        });

        Self {
            meshes: Manager::new(),
            textures: Manager::new(),
            shaders,
            materials: Manager::new(),
            shader_names,
        }
    }

    // ========================================================================
    // Meshes
    // ========================================================================

    pub fn new_mesh(&mut self) -> Result<MeshId> {
        self.meshes.create()
    }

    /// Copies the geometry of `source` into a new mesh.
    pub fn new_mesh_from(&mut self, source: MeshId) -> Result<MeshId> {
        self.meshes.create_from(source)
    }

    /// Builds a mesh with `loader`; nothing is stored if loading fails.
    pub fn new_mesh_from_loader<L>(&mut self, loader: &L, options: &LoaderOptions) -> Result<MeshId>
    where
        L: Loader<Target = Mesh>,
    {
        let mut mesh = Mesh::new();
        loader.load_into(&mut mesh, options)?;
        self.meshes.create_with(mesh)
    }

    pub fn mesh(&self, id: MeshId) -> Result<&Mesh> {
        self.meshes.get(id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Result<&mut Mesh> {
        self.meshes.get_mut(id)
    }

    #[must_use]
    pub fn has_mesh(&self, id: MeshId) -> bool {
        self.meshes.contains(id)
    }

    pub fn delete_mesh(&mut self, id: MeshId) -> Result<()> {
        self.meshes.remove(id).map(drop)
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // ========================================================================
    // Textures
    // ========================================================================

    pub fn new_texture(&mut self) -> Result<TextureId> {
        self.textures.create()
    }

    pub fn new_texture_with(&mut self, texture: Texture) -> Result<TextureId> {
        self.textures.create_with(texture)
    }

    /// Builds a texture with `loader`; nothing is stored if loading fails.
    pub fn new_texture_from_loader<L>(
        &mut self,
        loader: &L,
        options: &LoaderOptions,
    ) -> Result<TextureId>
    where
        L: Loader<Target = Texture>,
    {
        let mut texture = Texture::new();
        loader.load_into(&mut texture, options)?;
        self.textures.create_with(texture)
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture> {
        self.textures.get(id)
    }

    #[must_use]
    pub fn has_texture(&self, id: TextureId) -> bool {
        self.textures.contains(id)
    }

    /// Removes the entry and hands the texture back so the caller can
    /// release its GPU side.
    pub fn delete_texture(&mut self, id: TextureId) -> Result<Texture> {
        self.textures.remove(id)
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ========================================================================
    // Shaders
    // ========================================================================

    /// Registers a shader program; its name becomes resolvable through
    /// [`ResourceManager::find_shader`].
    pub fn new_shader(
        &mut self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderId> {
        self.shaders.create_with(ShaderProgram::new(
            name.to_owned(),
            vertex_source,
            fragment_source,
        ))
    }

    pub fn shader(&self, id: ShaderId) -> Result<&ShaderProgram> {
        self.shaders.get(id)
    }

    #[must_use]
    pub fn has_shader(&self, id: ShaderId) -> bool {
        self.shaders.contains(id)
    }

    #[must_use]
    pub fn find_shader(&self, name: &str) -> Option<ShaderId> {
        self.shader_names.borrow().get(name).copied()
    }

    pub fn delete_shader(&mut self, id: ShaderId) -> Result<()> {
        self.shaders.remove(id).map(drop)
    }

    /// Makes the null shader id resolve to `id`.
    pub fn set_default_shader(&mut self, id: ShaderId) -> Result<()> {
        self.shaders.get(id)?;
        self.shaders.set_fallback(Some(id));
        Ok(())
    }

    // ========================================================================
    // Materials
    // ========================================================================

    pub fn new_material(&mut self) -> Result<MaterialId> {
        self.materials.create()
    }

    /// Clone variant: copies every property of `source`.
    pub fn new_material_from(&mut self, source: MaterialId) -> Result<MaterialId> {
        self.materials.create_from(source)
    }

    pub fn new_material_with(&mut self, material: Material) -> Result<MaterialId> {
        self.materials.create_with(material)
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Result<&mut Material> {
        self.materials.get_mut(id)
    }

    #[must_use]
    pub fn has_material(&self, id: MaterialId) -> bool {
        self.materials.contains(id)
    }

    pub fn delete_material(&mut self, id: MaterialId) -> Result<()> {
        self.materials.remove(id).map(drop)
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    /// Makes the null material id resolve to `id`.
    pub fn set_default_material(&mut self, id: MaterialId) -> Result<()> {
        self.materials.get(id)?;
        self.materials.set_fallback(Some(id));
        Ok(())
    }

    #[must_use]
    pub fn default_material(&self) -> Option<MaterialId> {
        self.materials.fallback()
    }

    /// Makes the null texture id resolve to `id`.
    pub fn set_default_texture(&mut self, id: TextureId) -> Result<()> {
        self.textures.get(id)?;
        self.textures.set_fallback(Some(id));
        Ok(())
    }

    #[must_use]
    pub fn default_texture(&self) -> Option<TextureId> {
        self.textures.fallback()
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("meshes", &self.meshes.len())
            .field("textures", &self.textures.len())
            .field("shaders", &self.shaders.len())
            .field("materials", &self.materials.len())
            .finish()
    }
}

// ============================================================================
// Delegating lookups
// ============================================================================

/// Local-first view over a stack of resource managers.
///
/// The first scope is searched first; a miss falls through to the next one.
/// A miss in the last scope is a hard [`EngineError::NotFound`].
#[derive(Debug, Clone)]
pub struct ResourceChain<'a> {
    scopes: SmallVec<[&'a ResourceManager; 2]>,
}

impl<'a> ResourceChain<'a> {
    #[must_use]
    pub fn new(local: &'a ResourceManager) -> Self {
        let mut scopes = SmallVec::new();
        scopes.push(local);
        Self { scopes }
    }

    /// Appends `parent` as the next fallback scope.
    #[must_use]
    pub fn with_parent(mut self, parent: &'a ResourceManager) -> Self {
        self.scopes.push(parent);
        self
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn find<T: ?Sized>(
        &self,
        lookup: impl Fn(&'a ResourceManager) -> Result<&'a T>,
    ) -> Result<&'a T> {
        let mut miss = None;
        for &scope in &self.scopes {
            match lookup(scope) {
                Ok(found) => return Ok(found),
                Err(err) if err.is_not_found() => miss = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(miss.unwrap_or_else(|| EngineError::not_found("ResourceScope", 0)))
    }

    pub fn mesh(&self, id: MeshId) -> Result<&'a Mesh> {
        self.find(|scope| scope.mesh(id))
    }

    pub fn texture(&self, id: TextureId) -> Result<&'a Texture> {
        self.find(|scope| scope.texture(id))
    }

    pub fn shader(&self, id: ShaderId) -> Result<&'a ShaderProgram> {
        self.find(|scope| scope.shader(id))
    }

    pub fn material(&self, id: MaterialId) -> Result<&'a Material> {
        self.find(|scope| scope.material(id))
    }

    #[must_use]
    pub fn has_mesh(&self, id: MeshId) -> bool {
        self.scopes.iter().any(|scope| scope.has_mesh(id))
    }

    #[must_use]
    pub fn has_texture(&self, id: TextureId) -> bool {
        self.scopes.iter().any(|scope| scope.has_texture(id))
    }

    #[must_use]
    pub fn has_material(&self, id: MaterialId) -> bool {
        self.scopes.iter().any(|scope| scope.has_material(id))
    }

    /// First scope that knows `name`.
    #[must_use]
    pub fn find_shader(&self, name: &str) -> Option<ShaderId> {
        self.scopes.iter().find_map(|scope| scope.find_shader(name))
    }
}
