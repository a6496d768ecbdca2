//! Shareable resources: meshes, textures, shaders and materials.

pub mod manager;
pub mod material;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vertex;

pub use manager::{ResourceChain, ResourceManager};
pub use material::{BlendType, MAX_TEXTURE_UNITS, Material};
pub use mesh::{Mesh, MeshArrangement, SubMesh, SubMeshIndex, SubMeshMut};
pub use shader::ShaderProgram;
pub use texture::Texture;
pub use vertex::{AttributeMask, Triangle, Vertex, VertexBuffer};
