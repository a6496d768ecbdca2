//! Scene
//!
//! [`Scene`] is the top-level aggregate. It owns:
//!
//! - the root [`ResourceManager`] holding scene-wide defaults,
//! - one [`Manager`] each for stages, cameras, viewports and overlays,
//! - the scene hierarchy (cameras and overlays hang under its root),
//! - the render [`Pipeline`],
//! - a clone of the [`UploadGate`] used for GPU-side texture work.
//!
//! Stage resources resolve through [`Scene::stage_resources`], which looks in
//! the stage first and then in the scene.
//!
//! # Frame
//!
//! [`Scene::render`] pumps pending uploads, then for each active pipeline
//! entry in priority order: resolves its bindings, asks the stage's
//! partitioner for the actors visible from the camera, expands them into
//! sub-actors and hands those to the [`Renderer`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::Affine3A;

use crate::core::id::{CameraTag, OverlayTag, StageTag, ViewportTag};
use crate::core::{
    CameraId, Manager, MaterialId, OverlayId, PipelineId, StageId, TextureId, ViewportId,
};
use crate::errors::{EngineError, Result};
use crate::renderer::backend::{FrameStats, Renderer, SequenceInfo, SubActor};
use crate::renderer::pipeline::{Pipeline, RenderPriority, RenderTarget};
use crate::renderer::upload::{GpuTextureHandle, UploadGate, UploadOptions};
use crate::renderer::viewport::{Viewport, ViewportType};
use crate::resources::manager::{ResourceChain, ResourceManager};
use crate::resources::material::Material;
use crate::resources::texture::Texture;
use crate::scene::camera::{Camera, RenderCamera};
use crate::scene::hierarchy::Hierarchy;
use crate::scene::node::{NodeHandle, NodeKind};
use crate::scene::overlay::Overlay;
use crate::scene::partitioner::NullPartitioner;
use crate::scene::stage::Stage;
use crate::scene::transform::Transform;
use crate::scene::visitor::ObjectVisitor;
use crate::settings::EngineSettings;

#[derive(Debug, Default, Clone, Copy)]
struct Defaults {
    stage: StageId,
    camera: CameraId,
    viewport: ViewportId,
    pipeline: PipelineId,
}

pub struct Scene {
    resources: ResourceManager,

    stages: Manager<StageTag, Stage>,
    cameras: Manager<CameraTag, Camera>,
    viewports: Manager<ViewportTag, Viewport>,
    overlays: Manager<OverlayTag, Overlay>,

    hierarchy: Hierarchy,
    pipeline: Pipeline,

    settings: EngineSettings,
    gate: UploadGate,
    defaults: Defaults,
}

impl Scene {
    pub fn new(settings: EngineSettings, gate: UploadGate) -> Result<Self> {
        let mut scene = Self {
            resources: ResourceManager::new(),
            stages: Manager::new(),
            cameras: Manager::new(),
            viewports: Manager::new(),
            overlays: Manager::new(),
            hierarchy: Hierarchy::new(),
            pipeline: Pipeline::new(),
            settings,
            gate,
            defaults: Defaults::default(),
        };

        if scene.settings.create_defaults {
            scene.create_defaults()?;
        }
        Ok(scene)
    }

    fn create_defaults(&mut self) -> Result<()> {
        let size = self.settings.default_texture_size.max(1);
        let texture = self.resources.new_texture_with(Texture::solid(
            size,
            size,
            self.settings.default_texture_colour,
        ))?;
        self.resources.set_default_texture(texture)?;

        let mut material = Material::new("default");
        material.set_texture_unit(0, texture);
        let material = self.resources.new_material_with(material)?;
        self.resources.set_default_material(material)?;

        let stage = self.new_stage()?;
        let camera = self.new_camera()?;
        let viewport = self.new_viewport(ViewportType::Full)?;
        self.viewports.get_mut(viewport)?.background = self.settings.clear_colour;

        let pipeline = self.pipeline.add(
            stage,
            camera,
            viewport,
            RenderTarget::Window,
            RenderPriority::MAIN,
        );
        self.pipeline.activate(pipeline)?;

        self.defaults = Defaults {
            stage,
            camera,
            viewport,
            pipeline,
        };
        Ok(())
    }

    // ========================================================================
    // Stages
    // ========================================================================

    pub fn new_stage(&mut self) -> Result<StageId> {
        let id = self.stages.create()?;
        if self.settings.null_partitioner {
            self.stages
                .get_mut(id)?
                .set_partitioner(Rc::new(RefCell::new(NullPartitioner::new())));
        }
        Ok(id)
    }

    pub fn stage(&self, id: StageId) -> Result<&Stage> {
        self.stages.get(id)
    }

    pub fn stage_mut(&mut self, id: StageId) -> Result<&mut Stage> {
        self.stages.get_mut(id)
    }

    #[must_use]
    pub fn has_stage(&self, id: StageId) -> bool {
        self.stages.contains(id)
    }

    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Deletes the stage and every pipeline entry bound to it.
    pub fn delete_stage(&mut self, id: StageId) -> Result<()> {
        self.stages.remove(id)?;

        let removed = self.pipeline.remove_referencing_stage(id);
        if removed > 0 {
            log::debug!("Removed {removed} pipeline(s) bound to stage {id}");
        }

        if id == self.defaults.stage {
            log::warn!("Deleted the default stage {id}");
            self.defaults.stage = StageId::NULL;
            self.defaults.pipeline = PipelineId::NULL;
        }
        Ok(())
    }

    /// Stage resources first, then the scene's.
    pub fn stage_resources(&self, id: StageId) -> Result<ResourceChain<'_>> {
        let stage = self.stages.get(id)?;
        Ok(ResourceChain::new(stage.resources()).with_parent(&self.resources))
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    /// Creates a perspective camera from the settings' defaults.
    pub fn new_camera(&mut self) -> Result<CameraId> {
        self.new_camera_with_parent(None)
    }

    pub fn new_camera_with_parent(&mut self, parent: Option<NodeHandle>) -> Result<CameraId> {
        if let Some(parent) = parent {
            self.hierarchy.node(parent)?;
        }

        let s = &self.settings;
        let camera = Camera::new_perspective(s.fov_degrees, s.aspect, s.near, s.far);
        let id = self.cameras.create_with(camera)?;

        match self.hierarchy.insert(NodeKind::Camera(id), parent) {
            Ok(node) => {
                self.cameras.get_mut(id)?.node = node;
                Ok(id)
            }
            Err(err) => {
                self.cameras.remove(id)?;
                Err(err)
            }
        }
    }

    pub fn camera(&self, id: CameraId) -> Result<&Camera> {
        self.cameras.get(id)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Result<&mut Camera> {
        self.cameras.get_mut(id)
    }

    #[must_use]
    pub fn has_camera(&self, id: CameraId) -> bool {
        self.cameras.contains(id)
    }

    /// Deletes the camera, its hierarchy subtree and every pipeline entry
    /// looking through it.
    pub fn delete_camera(&mut self, id: CameraId) -> Result<()> {
        let node = self.cameras.get(id)?.node();
        self.destroy_children(node)?;
        self.destroy_camera(id)
    }

    fn destroy_camera(&mut self, id: CameraId) -> Result<()> {
        let node = self.cameras.get(id)?.node();
        self.hierarchy.remove(node)?;
        self.cameras.remove(id)?;
        self.pipeline.remove_referencing_camera(id);
        if id == self.defaults.camera {
            log::warn!("Deleted the default camera {id}");
            self.defaults.camera = CameraId::NULL;
        }
        Ok(())
    }

    // ========================================================================
    // Viewports
    // ========================================================================

    pub fn new_viewport(&mut self, kind: ViewportType) -> Result<ViewportId> {
        self.viewports.create_with(Viewport::from_type(kind))
    }

    pub fn viewport(&self, id: ViewportId) -> Result<&Viewport> {
        self.viewports.get(id)
    }

    pub fn viewport_mut(&mut self, id: ViewportId) -> Result<&mut Viewport> {
        self.viewports.get_mut(id)
    }

    #[must_use]
    pub fn has_viewport(&self, id: ViewportId) -> bool {
        self.viewports.contains(id)
    }

    /// Pipeline entries still bound to the viewport fail at render time.
    pub fn delete_viewport(&mut self, id: ViewportId) -> Result<()> {
        self.viewports.remove(id)?;
        if id == self.defaults.viewport {
            self.defaults.viewport = ViewportId::NULL;
        }
        Ok(())
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    pub fn new_overlay(&mut self) -> Result<OverlayId> {
        let id = self.overlays.create()?;
        match self.hierarchy.insert(NodeKind::Overlay(id), None) {
            Ok(node) => {
                self.overlays.get_mut(id)?.node = node;
                Ok(id)
            }
            Err(err) => {
                self.overlays.remove(id)?;
                Err(err)
            }
        }
    }

    pub fn overlay(&self, id: OverlayId) -> Result<&Overlay> {
        self.overlays.get(id)
    }

    pub fn overlay_mut(&mut self, id: OverlayId) -> Result<&mut Overlay> {
        self.overlays.get_mut(id)
    }

    #[must_use]
    pub fn has_overlay(&self, id: OverlayId) -> bool {
        self.overlays.contains(id)
    }

    pub fn delete_overlay(&mut self, id: OverlayId) -> Result<()> {
        let node = self.overlays.get(id)?.node();
        self.destroy_children(node)?;
        self.hierarchy.remove(node)?;
        self.overlays.remove(id)?;
        Ok(())
    }

    /// Overlays ordered by ascending z-index.
    #[must_use]
    pub fn overlays_in_order(&self) -> Vec<(OverlayId, &Overlay)> {
        let mut overlays: Vec<_> = self.overlays.iter().collect();
        overlays.sort_by_key(|(_, overlay)| overlay.zindex);
        overlays
    }

    // ========================================================================
    // Scene hierarchy
    // ========================================================================

    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.hierarchy.root()
    }

    /// Reparents a camera or overlay node. Overlays only accept the root.
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        self.hierarchy.set_parent(child, parent)
    }

    pub fn destroy_children(&mut self, node: NodeHandle) -> Result<()> {
        for descendant in self.hierarchy.subtree_post_order(node)? {
            match self.hierarchy.node(descendant)?.kind() {
                NodeKind::Camera(camera) => self.destroy_camera(camera)?,
                NodeKind::Overlay(overlay) => {
                    self.hierarchy.remove(descendant)?;
                    self.overlays.remove(overlay)?;
                }
                _ => {
                    self.hierarchy.remove(descendant)?;
                }
            }
        }
        Ok(())
    }

    pub fn transform_mut(&mut self, node: NodeHandle) -> Result<&mut Transform> {
        self.hierarchy.transform_mut(node)
    }

    pub fn world_matrix(&self, node: NodeHandle) -> Result<Affine3A> {
        self.hierarchy.world_matrix(node)
    }

    pub fn accept(&self, node: NodeHandle, visitor: &mut dyn ObjectVisitor) -> Result<()> {
        match self.hierarchy.node(node)?.kind() {
            NodeKind::Camera(id) => visitor.visit_camera(id, self.cameras.get(id)?),
            NodeKind::Overlay(id) => visitor.visit_overlay(id, self.overlays.get(id)?),
            NodeKind::Root => {}
            other => {
                return Err(EngineError::InvalidOperation(format!(
                    "{} nodes belong to a stage, not the scene",
                    other.name()
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Resources
    // ========================================================================

    #[must_use]
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    #[must_use]
    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    /// Uploads a scene texture through the gate.
    pub fn upload_texture(
        &self,
        id: TextureId,
        options: UploadOptions,
    ) -> Result<GpuTextureHandle> {
        let texture = self.resources.texture(id)?.clone();
        texture.upload(&self.gate, options)
    }

    /// Removes the texture and releases its GPU object, if any.
    pub fn delete_texture(&mut self, id: TextureId) -> Result<()> {
        let texture = self.resources.delete_texture(id)?;
        if let Some(handle) = texture.take_gpu_handle() {
            self.gate.execute(move |ctx| ctx.release_texture(handle))?;
        }
        Ok(())
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Adds a configured (inactive) entry after checking its bindings exist.
    pub fn add_pipeline(
        &mut self,
        stage: StageId,
        camera: CameraId,
        viewport: ViewportId,
        target: RenderTarget,
        priority: RenderPriority,
    ) -> Result<PipelineId> {
        self.stages.get(stage)?;
        self.cameras.get(camera)?;
        self.viewports.get(viewport)?;
        if let RenderTarget::Texture(texture) = target {
            self.resources.texture(texture)?;
        }
        Ok(self.pipeline.add(stage, camera, viewport, target, priority))
    }

    /// Renders `stage` through `camera` to the whole window, starting next
    /// frame.
    pub fn render_stage(&mut self, stage: StageId, camera: CameraId) -> Result<PipelineId> {
        let viewport = if self.viewports.contains(self.defaults.viewport) {
            self.defaults.viewport
        } else {
            self.new_viewport(ViewportType::Full)?
        };
        let id = self.add_pipeline(
            stage,
            camera,
            viewport,
            RenderTarget::Window,
            RenderPriority::MAIN,
        )?;
        self.pipeline.activate(id)?;
        Ok(id)
    }

    /// Renders every active pipeline entry.
    ///
    /// Dangling bindings (a stage, camera or viewport deleted behind an
    /// entry's back) fail the frame with `NotFound`.
    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<FrameStats> {
        if self.gate.is_owner_thread() {
            self.gate.pump()?;
        }

        let mut stats = FrameStats::default();
        renderer.begin_frame()?;

        for (pipeline, entry) in self.pipeline.active_in_order() {
            let stage = self.stages.get(entry.stage())?;
            let camera = self.cameras.get(entry.camera())?;
            let viewport = self.viewports.get(entry.viewport())?;

            let world = self.hierarchy.world_matrix(camera.node())?;
            let render_camera = camera.extract(&world);

            let sequence = SequenceInfo {
                pipeline,
                stage: entry.stage(),
                camera: entry.camera(),
                viewport_id: entry.viewport(),
                viewport: viewport.clone(),
                target: entry.target(),
                priority: entry.priority(),
            };

            renderer.begin_sequence(&sequence, &render_camera)?;
            stats.subactors += self.render_sequence(stage, &render_camera, renderer)?;
            renderer.end_sequence(&sequence)?;
            stats.sequences += 1;
        }

        renderer.end_frame()?;
        Ok(stats)
    }

    fn render_sequence(
        &self,
        stage: &Stage,
        camera: &RenderCamera,
        renderer: &mut dyn Renderer,
    ) -> Result<usize> {
        let chain = ResourceChain::new(stage.resources()).with_parent(&self.resources);
        let mut subactors = Vec::new();

        for actor_id in stage.visible_actors(&camera.frustum) {
            let actor = stage.actor(actor_id)?;
            if !actor.visible || !actor.has_geometry() {
                continue;
            }

            let mesh = chain.mesh(actor.mesh)?;
            let world = stage.world_matrix(actor.node())?;

            for part in mesh.renderable_parts() {
                let requested = actor
                    .material_override(part.index())
                    .unwrap_or_else(|| part.material());
                let material_id = self.resolve_material_id(requested);
                let material = chain.material(material_id)?;

                subactors.push(SubActor {
                    actor: actor_id,
                    mesh_id: actor.mesh,
                    mesh,
                    part: part.index(),
                    material_id,
                    material,
                    world,
                    priority: actor.render_priority,
                });
            }
        }

        // Stable: equal priorities keep partitioner order
        subactors.sort_by_key(|subactor| subactor.priority);

        for subactor in &subactors {
            renderer.render_subactor(subactor, camera)?;
        }
        Ok(subactors.len())
    }

    fn resolve_material_id(&self, id: MaterialId) -> MaterialId {
        if id.is_null() {
            self.resources.default_material().unwrap_or(id)
        } else {
            id
        }
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn default_stage(&self) -> StageId {
        self.defaults.stage
    }

    #[must_use]
    pub fn default_camera(&self) -> CameraId {
        self.defaults.camera
    }

    #[must_use]
    pub fn default_viewport(&self) -> ViewportId {
        self.defaults.viewport
    }

    #[must_use]
    pub fn default_pipeline(&self) -> PipelineId {
        self.defaults.pipeline
    }

    #[must_use]
    pub fn default_material(&self) -> MaterialId {
        self.resources.default_material().unwrap_or_default()
    }

    #[must_use]
    pub fn default_texture(&self) -> TextureId {
        self.resources.default_texture().unwrap_or_default()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("resources", &self.resources)
            .field("stages", &self.stages.len())
            .field("cameras", &self.cameras.len())
            .field("viewports", &self.viewports.len())
            .field("overlays", &self.overlays.len())
            .field("pipelines", &self.pipeline.len())
            .finish_non_exhaustive()
    }
}
