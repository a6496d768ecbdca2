//! Render Pipeline Tests
//!
//! Tests for:
//! - Priority ordering of pipeline entries with insertion tie-break
//! - Activation state and binding validation
//! - Sub-actor expansion, material resolution and ordering
//! - Dangling bindings failing the frame

mod common;

use lantern::renderer::{Renderer, SequenceInfo, SubActor};
use lantern::resources::SubMeshIndex;
use lantern::scene::RenderCamera;
use lantern::{
    ActorId, EngineError, FrameStats, Material, MeshId, RenderPriority, RenderTarget, Result,
    Scene, StageId, ViewportType,
};

/// Records what the scene asked it to draw.
#[derive(Default)]
struct RecordingRenderer {
    frames: usize,
    sequences: Vec<StageId>,
    subactors: Vec<(ActorId, SubMeshIndex, String)>,
    open_sequence: bool,
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn begin_sequence(&mut self, sequence: &SequenceInfo, _camera: &RenderCamera) -> Result<()> {
        assert!(!self.open_sequence);
        self.open_sequence = true;
        self.sequences.push(sequence.stage);
        Ok(())
    }

    fn render_subactor(&mut self, subactor: &SubActor<'_>, _camera: &RenderCamera) -> Result<()> {
        assert!(self.open_sequence);
        subactor.submesh()?;
        self.subactors.push((
            subactor.actor,
            subactor.part,
            subactor.material.name.to_string(),
        ));
        Ok(())
    }

    fn end_sequence(&mut self, _sequence: &SequenceInfo) -> Result<()> {
        self.open_sequence = false;
        Ok(())
    }
}

fn triangle_mesh(scene: &mut Scene, stage: StageId) -> MeshId {
    let resources = scene.stage_mut(stage).unwrap().resources_mut();
    let id = resources.new_mesh().unwrap();
    let mesh = resources.mesh_mut(id).unwrap();
    mesh.add_vertex(0.0, 0.0, -5.0);
    mesh.add_vertex(1.0, 0.0, -5.0);
    mesh.add_vertex(0.0, 1.0, -5.0);
    mesh.add_triangle(0, 1, 2);
    id
}

fn add_active(scene: &mut Scene, stage: StageId, priority: RenderPriority) {
    let id = scene
        .add_pipeline(
            stage,
            scene.default_camera(),
            scene.default_viewport(),
            RenderTarget::Window,
            priority,
        )
        .unwrap();
    scene.pipeline_mut().activate(id).unwrap();
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn default_scene_renders_its_actor() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let mesh = triangle_mesh(&mut scene, stage);
    let actor = scene.stage_mut(stage).unwrap().new_actor_with_mesh(mesh).unwrap();

    let mut renderer = RecordingRenderer::default();
    let stats = scene.render(&mut renderer).unwrap();

    assert_eq!(
        stats,
        FrameStats {
            sequences: 1,
            subactors: 1
        }
    );
    assert_eq!(renderer.frames, 1);
    assert_eq!(renderer.sequences, vec![stage]);
    assert_eq!(
        renderer.subactors,
        vec![(actor, SubMeshIndex::ROOT, "default".to_string())]
    );
}

#[test]
fn empty_scene_still_frames() {
    let scene = common::headless_scene();
    let mut renderer = RecordingRenderer::default();

    let stats = scene.render(&mut renderer).unwrap();
    assert_eq!(stats.sequences, 1);
    assert_eq!(stats.subactors, 0);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn entries_run_by_priority_then_insertion() {
    let mut scene = common::headless_scene();
    let main = scene.default_stage();
    let late_main = scene.new_stage().unwrap();
    let background = scene.new_stage().unwrap();
    let foreground = scene.new_stage().unwrap();

    add_active(&mut scene, foreground, RenderPriority::FOREGROUND);
    add_active(&mut scene, late_main, RenderPriority::MAIN);
    add_active(&mut scene, background, RenderPriority::BACKGROUND);

    let mut renderer = RecordingRenderer::default();
    scene.render(&mut renderer).unwrap();
    assert_eq!(renderer.sequences, vec![background, main, late_main, foreground]);
}

#[test]
fn configured_entries_are_skipped() {
    let mut scene = common::headless_scene();
    let extra = scene.new_stage().unwrap();
    let configured = scene
        .add_pipeline(
            extra,
            scene.default_camera(),
            scene.default_viewport(),
            RenderTarget::Window,
            RenderPriority::MAIN,
        )
        .unwrap();
    let default = scene.default_pipeline();
    scene.pipeline_mut().deactivate(default).unwrap();

    let mut renderer = RecordingRenderer::default();
    assert_eq!(scene.render(&mut renderer).unwrap().sequences, 0);

    scene.pipeline_mut().activate(configured).unwrap();
    let mut renderer = RecordingRenderer::default();
    scene.render(&mut renderer).unwrap();
    assert_eq!(renderer.sequences, vec![extra]);
}

#[test]
fn subactors_sort_by_priority_stably() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let mesh = triangle_mesh(&mut scene, stage);
    let s = scene.stage_mut(stage).unwrap();

    let near = s.new_actor_with_mesh(mesh).unwrap();
    let first_main = s.new_actor_with_mesh(mesh).unwrap();
    let far = s.new_actor_with_mesh(mesh).unwrap();
    let second_main = s.new_actor_with_mesh(mesh).unwrap();
    s.actor_mut(near).unwrap().render_priority = RenderPriority::NEAR;
    s.actor_mut(far).unwrap().render_priority = RenderPriority::DISTANT;

    let mut renderer = RecordingRenderer::default();
    scene.render(&mut renderer).unwrap();
    let order: Vec<_> = renderer.subactors.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(order, vec![far, first_main, second_main, near]);
}

// ============================================================================
// Sub-actor expansion
// ============================================================================

#[test]
fn hidden_and_meshless_actors_are_skipped() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let mesh = triangle_mesh(&mut scene, stage);
    let s = scene.stage_mut(stage).unwrap();

    let shown = s.new_actor_with_mesh(mesh).unwrap();
    let hidden = s.new_actor_with_mesh(mesh).unwrap();
    s.new_actor().unwrap();
    s.actor_mut(hidden).unwrap().visible = false;

    let mut renderer = RecordingRenderer::default();
    let stats = scene.render(&mut renderer).unwrap();
    assert_eq!(stats.subactors, 1);
    assert_eq!(renderer.subactors[0].0, shown);
}

#[test]
fn material_resolution_order() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let mesh = triangle_mesh(&mut scene, stage);

    let part_material = scene
        .resources_mut()
        .new_material_with(Material::new("part"))
        .unwrap();
    let override_material = scene
        .stage_mut(stage)
        .unwrap()
        .resources_mut()
        .new_material_with(Material::new("override"))
        .unwrap();

    let part = {
        let s = scene.stage_mut(stage).unwrap();
        let mesh = s.resources_mut().mesh_mut(mesh).unwrap();
        let part = mesh.add_submesh(true);
        let mut view = mesh.submesh_mut(part).unwrap();
        view.add_triangle(2, 1, 0);
        view.set_material(part_material);
        part
    };

    let s = scene.stage_mut(stage).unwrap();
    let plain = s.new_actor_with_mesh(mesh).unwrap();
    let overridden = s.new_actor_with_mesh(mesh).unwrap();
    s.actor_mut(overridden)
        .unwrap()
        .override_material(part, override_material);

    let mut renderer = RecordingRenderer::default();
    scene.render(&mut renderer).unwrap();

    let materials: Vec<_> = renderer
        .subactors
        .iter()
        .map(|(actor, part, name)| (*actor, *part, name.as_str()))
        .collect();
    assert_eq!(
        materials,
        vec![
            (plain, SubMeshIndex::ROOT, "default"),
            (plain, part, "part"),
            (overridden, SubMeshIndex::ROOT, "default"),
            (overridden, part, "override"),
        ]
    );
}

#[test]
fn missing_mesh_fails_the_frame() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let mesh = triangle_mesh(&mut scene, stage);
    let s = scene.stage_mut(stage).unwrap();
    s.new_actor_with_mesh(mesh).unwrap();
    s.resources_mut().delete_mesh(mesh).unwrap();

    let err = scene.render(&mut RecordingRenderer::default()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "Mesh", .. }));
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn add_pipeline_validates_bindings() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let camera = scene.default_camera();
    let viewport = scene.default_viewport();

    assert!(scene
        .add_pipeline(
            StageId::allocate(),
            camera,
            viewport,
            RenderTarget::Window,
            RenderPriority::MAIN
        )
        .unwrap_err()
        .is_not_found());

    let texture = scene.resources_mut().new_texture().unwrap();
    let id = scene
        .add_pipeline(
            stage,
            camera,
            viewport,
            RenderTarget::Texture(texture),
            RenderPriority::MAIN,
        )
        .unwrap();
    assert!(!scene.pipeline().entry(id).unwrap().is_active());
}

#[test]
fn deleting_a_stage_removes_its_entries() {
    let mut scene = common::headless_scene();
    let stage = scene.default_stage();
    let pipeline = scene.default_pipeline();

    scene.delete_stage(stage).unwrap();
    assert!(!scene.pipeline().contains(pipeline));
    assert_eq!(scene.default_stage(), StageId::NULL);

    let stats = scene.render(&mut RecordingRenderer::default()).unwrap();
    assert_eq!(stats.sequences, 0);
}

#[test]
fn deleting_a_camera_removes_its_entries() {
    let mut scene = common::headless_scene();
    let camera = scene.default_camera();
    scene.delete_camera(camera).unwrap();

    assert!(scene.pipeline().is_empty());
    assert!(scene.render(&mut RecordingRenderer::default()).is_ok());
}

#[test]
fn dangling_viewport_is_not_found() {
    let mut scene = common::headless_scene();
    let viewport = scene.default_viewport();
    scene.delete_viewport(viewport).unwrap();

    let err = scene.render(&mut RecordingRenderer::default()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "Viewport", .. }));
}

#[test]
fn render_stage_activates_immediately() {
    let mut scene = common::headless_scene();
    let stage = scene.new_stage().unwrap();
    let camera = scene.new_camera().unwrap();
    let split = scene.new_viewport(ViewportType::HorizontalSplitRight).unwrap();
    assert!(scene.has_viewport(split));

    let id = scene.render_stage(stage, camera).unwrap();
    assert!(scene.pipeline().entry(id).unwrap().is_active());

    let mut renderer = RecordingRenderer::default();
    scene.render(&mut renderer).unwrap();
    assert_eq!(renderer.sequences.len(), 2);
}
