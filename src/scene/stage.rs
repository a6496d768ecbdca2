//! Stage
//!
//! A [`Stage`] is a self-contained scene subgraph: it owns its actors and
//! lights, the hierarchy they hang in, and a local [`ResourceManager`] for
//! stage-scoped meshes and materials. Lifetime of everything inside is bound
//! to the stage.
//!
//! # Signals
//!
//! Actor and light creation/destruction are published on four public
//! signals. The installed [`Partitioner`] is just another subscriber; its
//! connections are tracked so that replacing it disconnects the old one.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine3A, Vec4};

use crate::core::id::{ActorTag, LightTag};
use crate::core::{ActorId, Connection, LightId, Managed, Manager, MeshId, Signal};
use crate::errors::{EngineError, Result};
use crate::resources::manager::ResourceManager;
use crate::scene::actor::Actor;
use crate::scene::camera::Frustum;
use crate::scene::hierarchy::Hierarchy;
use crate::scene::light::{Light, LightKind};
use crate::scene::node::{NodeHandle, NodeKind};
use crate::scene::partitioner::Partitioner;
use crate::scene::transform::Transform;
use crate::scene::visitor::ObjectVisitor;

struct PartitionerBinding {
    partitioner: Rc<RefCell<dyn Partitioner>>,
    actor_created: Connection,
    actor_destroyed: Connection,
    light_created: Connection,
    light_destroyed: Connection,
}

pub struct Stage {
    actors: Manager<ActorTag, Actor>,
    lights: Manager<LightTag, Light>,
    hierarchy: Hierarchy,
    resources: ResourceManager,

    pub ambient: Vec4,

    pub actor_created: Signal<dyn FnMut(ActorId)>,
    pub actor_destroyed: Signal<dyn FnMut(ActorId)>,
    pub light_created: Signal<dyn FnMut(LightId)>,
    pub light_destroyed: Signal<dyn FnMut(LightId)>,

    partitioner: Option<PartitionerBinding>,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actors: Manager::new(),
            lights: Manager::new(),
            hierarchy: Hierarchy::new(),
            resources: ResourceManager::new(),
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            actor_created: Signal::new(),
            actor_destroyed: Signal::new(),
            light_created: Signal::new(),
            light_destroyed: Signal::new(),
            partitioner: None,
        }
    }

    // ========================================================================
    // Actors
    // ========================================================================

    pub fn new_actor(&mut self) -> Result<ActorId> {
        self.new_actor_with_parent(None, MeshId::NULL)
    }

    pub fn new_actor_with_mesh(&mut self, mesh: MeshId) -> Result<ActorId> {
        self.new_actor_with_parent(None, mesh)
    }

    /// Creates an actor under `parent` (the stage root when `None`).
    pub fn new_actor_with_parent(
        &mut self,
        parent: Option<NodeHandle>,
        mesh: MeshId,
    ) -> Result<ActorId> {
        if let Some(parent) = parent {
            self.hierarchy.node(parent)?;
        }

        let id = self.actors.create_with(Actor::new(mesh))?;
        let node = match self.hierarchy.insert(NodeKind::Actor(id), parent) {
            Ok(node) => node,
            Err(err) => {
                self.actors.remove(id)?;
                return Err(err);
            }
        };
        self.actors.get_mut(id)?.node = node;

        self.actor_created.emit(id);
        Ok(id)
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor> {
        self.actors.get_mut(id)
    }

    #[must_use]
    pub fn has_actor(&self, id: ActorId) -> bool {
        self.actors.contains(id)
    }

    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter()
    }

    /// Destroys the actor's subtree bottom-up, then the actor itself.
    pub fn delete_actor(&mut self, id: ActorId) -> Result<()> {
        let node = self.actors.get(id)?.node;
        self.destroy_children(node)?;
        self.destroy_actor(id)
    }

    fn destroy_actor(&mut self, id: ActorId) -> Result<()> {
        let node = self.actors.get(id)?.node;
        self.actor_destroyed.emit(id);
        self.hierarchy.remove(node)?;
        self.actors.remove(id)?;
        Ok(())
    }

    // ========================================================================
    // Lights
    // ========================================================================

    pub fn new_light(&mut self, kind: LightKind) -> Result<LightId> {
        self.new_light_with_parent(None, kind)
    }

    pub fn new_light_with_parent(
        &mut self,
        parent: Option<NodeHandle>,
        kind: LightKind,
    ) -> Result<LightId> {
        if let Some(parent) = parent {
            self.hierarchy.node(parent)?;
        }

        let id = self.lights.create_with(Light::new(kind))?;
        let node = match self.hierarchy.insert(NodeKind::Light(id), parent) {
            Ok(node) => node,
            Err(err) => {
                self.lights.remove(id)?;
                return Err(err);
            }
        };
        self.lights.get_mut(id)?.node = node;

        self.light_created.emit(id);
        Ok(id)
    }

    pub fn light(&self, id: LightId) -> Result<&Light> {
        self.lights.get(id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Result<&mut Light> {
        self.lights.get_mut(id)
    }

    #[must_use]
    pub fn has_light(&self, id: LightId) -> bool {
        self.lights.contains(id)
    }

    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.lights.iter()
    }

    pub fn delete_light(&mut self, id: LightId) -> Result<()> {
        let node = self.lights.get(id)?.node;
        self.destroy_children(node)?;
        self.destroy_light(id)
    }

    fn destroy_light(&mut self, id: LightId) -> Result<()> {
        let node = self.lights.get(id)?.node;
        self.light_destroyed.emit(id);
        self.hierarchy.remove(node)?;
        self.lights.remove(id)?;
        Ok(())
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.hierarchy.root()
    }

    /// Reparents `child`. `None` detaches it from the stage root.
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        self.hierarchy.set_parent(child, parent)
    }

    /// Destroys every descendant of `node`, deepest first.
    pub fn destroy_children(&mut self, node: NodeHandle) -> Result<()> {
        for descendant in self.hierarchy.subtree_post_order(node)? {
            match self.hierarchy.node(descendant)?.kind() {
                NodeKind::Actor(actor) => self.destroy_actor(actor)?,
                NodeKind::Light(light) => self.destroy_light(light)?,
                _ => {
                    self.hierarchy.remove(descendant)?;
                }
            }
        }
        Ok(())
    }

    pub fn world_matrix(&self, node: NodeHandle) -> Result<Affine3A> {
        self.hierarchy.world_matrix(node)
    }

    pub fn transform_mut(&mut self, node: NodeHandle) -> Result<&mut Transform> {
        self.hierarchy.transform_mut(node)
    }

    /// Dispatches `node` to the visitor method matching its kind.
    pub fn accept(&self, node: NodeHandle, visitor: &mut dyn ObjectVisitor) -> Result<()> {
        match self.hierarchy.node(node)?.kind() {
            NodeKind::Actor(id) => visitor.visit_actor(id, self.actors.get(id)?),
            NodeKind::Light(id) => visitor.visit_light(id, self.lights.get(id)?),
            NodeKind::Root => {}
            other => {
                return Err(EngineError::InvalidOperation(format!(
                    "{} nodes do not belong to a stage",
                    other.name()
                )));
            }
        }
        Ok(())
    }

    /// Visits every object under the stage root, parents before children.
    pub fn accept_all(&self, visitor: &mut dyn ObjectVisitor) -> Result<()> {
        let mut stack = vec![self.hierarchy.root()];
        while let Some(node) = stack.pop() {
            self.accept(node, visitor)?;
            stack.extend(self.hierarchy.children(node)?.iter().rev());
        }
        Ok(())
    }

    // ========================================================================
    // Resources & partitioning
    // ========================================================================

    #[must_use]
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Installs `partitioner`, replacing (and disconnecting) the previous one.
    ///
    /// The new partitioner is seeded with every existing actor and light.
    pub fn set_partitioner<P: Partitioner + 'static>(&mut self, partitioner: Rc<RefCell<P>>) {
        let partitioner: Rc<RefCell<dyn Partitioner>> = partitioner;

        if let Some(old) = self.partitioner.take() {
            self.actor_created.disconnect(old.actor_created);
            self.actor_destroyed.disconnect(old.actor_destroyed);
            self.light_created.disconnect(old.light_created);
            self.light_destroyed.disconnect(old.light_destroyed);
        }

        {
            let mut p = partitioner.borrow_mut();
            for id in self.actors.ids() {
                p.add_actor(id);
            }
            for id in self.lights.ids() {
                p.add_light(id);
            }
        }

        let p = Rc::clone(&partitioner);
        let actor_created = self
            .actor_created
            .connect(move |id| p.borrow_mut().add_actor(id));
        let p = Rc::clone(&partitioner);
        let actor_destroyed = self
            .actor_destroyed
            .connect(move |id| p.borrow_mut().remove_actor(id));
        let p = Rc::clone(&partitioner);
        let light_created = self
            .light_created
            .connect(move |id| p.borrow_mut().add_light(id));
        let p = Rc::clone(&partitioner);
        let light_destroyed = self
            .light_destroyed
            .connect(move |id| p.borrow_mut().remove_light(id));

        self.partitioner = Some(PartitionerBinding {
            partitioner,
            actor_created,
            actor_destroyed,
            light_created,
            light_destroyed,
        });
    }

    #[must_use]
    pub fn has_partitioner(&self) -> bool {
        self.partitioner.is_some()
    }

    /// Potentially visible actors. Without a partitioner every actor is
    /// returned in creation order.
    #[must_use]
    pub fn visible_actors(&self, frustum: &Frustum) -> Vec<ActorId> {
        match &self.partitioner {
            Some(binding) => binding.partitioner.borrow().visible_actors(frustum),
            None => self.actors.ids().collect(),
        }
    }

    #[must_use]
    pub fn visible_lights(&self, frustum: &Frustum) -> Vec<LightId> {
        match &self.partitioner {
            Some(binding) => binding.partitioner.borrow().visible_lights(frustum),
            None => self.lights.ids().collect(),
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Managed for Stage {}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("actors", &self.actors.len())
            .field("lights", &self.lights.len())
            .field("hierarchy", &self.hierarchy)
            .field("has_partitioner", &self.partitioner.is_some())
            .finish_non_exhaustive()
    }
}
