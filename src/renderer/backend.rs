//! Renderer Backend Seam
//!
//! The scene owns sequencing: which pipeline entries run, in which order,
//! against which viewport and camera, and which actors they contain. A
//! backend only issues draws. [`Renderer::render_subactor`] is the one method
//! every backend must implement; the sequence and frame hooks default to
//! no-ops.

use glam::Affine3A;

use crate::core::{ActorId, CameraId, MaterialId, MeshId, PipelineId, StageId, ViewportId};
use crate::errors::Result;
use crate::renderer::pipeline::{RenderPriority, RenderTarget};
use crate::renderer::viewport::Viewport;
use crate::resources::material::Material;
use crate::resources::mesh::{Mesh, SubMesh, SubMeshIndex};
use crate::scene::camera::RenderCamera;

/// One drawable part of one actor, fully resolved for drawing.
///
/// Vertex data is fetched through [`SubActor::submesh`] and its `vbo(mask)`,
/// so the backend asks only for the attributes its shaders consume.
#[derive(Debug, Clone, Copy)]
pub struct SubActor<'a> {
    pub actor: ActorId,
    pub mesh_id: MeshId,
    pub mesh: &'a Mesh,
    pub part: SubMeshIndex,
    pub material_id: MaterialId,
    pub material: &'a Material,
    pub world: Affine3A,
    pub priority: RenderPriority,
}

impl<'a> SubActor<'a> {
    pub fn submesh(&self) -> Result<SubMesh<'a>> {
        self.mesh.submesh(self.part)
    }
}

/// Bindings of the pipeline entry being rendered.
#[derive(Debug, Clone)]
pub struct SequenceInfo {
    pub pipeline: PipelineId,
    pub stage: StageId,
    pub camera: CameraId,
    pub viewport_id: ViewportId,
    pub viewport: Viewport,
    pub target: RenderTarget,
    pub priority: RenderPriority,
}

/// Counters returned by one `Scene::render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Pipeline entries rendered.
    pub sequences: usize,
    /// `render_subactor` invocations.
    pub subactors: usize,
}

pub trait Renderer {
    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    /// Binds target and viewport for the following sub-actors.
    fn begin_sequence(&mut self, _sequence: &SequenceInfo, _camera: &RenderCamera) -> Result<()> {
        Ok(())
    }

    fn render_subactor(&mut self, subactor: &SubActor<'_>, camera: &RenderCamera) -> Result<()>;

    fn end_sequence(&mut self, _sequence: &SequenceInfo) -> Result<()> {
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}
