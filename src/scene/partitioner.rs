//! Spatial partitioning seam.
//!
//! A [`Partitioner`] is told about every actor and light a stage creates or
//! destroys (through the stage's signals) and is asked, per camera, which of
//! them are potentially visible. Real spatial indices live outside the core.

use crate::core::{ActorId, LightId};
use crate::scene::camera::Frustum;

pub trait Partitioner {
    fn add_actor(&mut self, id: ActorId);
    fn remove_actor(&mut self, id: ActorId);
    fn add_light(&mut self, id: LightId);
    fn remove_light(&mut self, id: LightId);

    /// Actors that may intersect `frustum`. Order is the render order for
    /// actors of equal priority.
    fn visible_actors(&self, frustum: &Frustum) -> Vec<ActorId>;
    fn visible_lights(&self, frustum: &Frustum) -> Vec<LightId>;
}

/// Keeps everything and culls nothing.
///
/// Actors and lights come back in the order they were added.
#[derive(Debug, Default)]
pub struct NullPartitioner {
    actors: Vec<ActorId>,
    lights: Vec<LightId>,
}

impl NullPartitioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for NullPartitioner {
    fn add_actor(&mut self, id: ActorId) {
        if !self.actors.contains(&id) {
            self.actors.push(id);
        }
    }

    fn remove_actor(&mut self, id: ActorId) {
        self.actors.retain(|&a| a != id);
    }

    fn add_light(&mut self, id: LightId) {
        if !self.lights.contains(&id) {
            self.lights.push(id);
        }
    }

    fn remove_light(&mut self, id: LightId) {
        self.lights.retain(|&l| l != id);
    }

    fn visible_actors(&self, _frustum: &Frustum) -> Vec<ActorId> {
        self.actors.clone()
    }

    fn visible_lights(&self, _frustum: &Frustum) -> Vec<LightId> {
        self.lights.clone()
    }
}
