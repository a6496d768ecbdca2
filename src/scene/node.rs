use slotmap::new_key_type;

use crate::core::{ActorId, CameraId, LightId, OverlayId};
use crate::scene::transform::Transform;

new_key_type! {
    pub(crate) struct NodeKey;
}

/// Handle of a node in one [`Hierarchy`](crate::scene::Hierarchy).
///
/// Carries the id of the hierarchy that issued it, so a handle from a stage
/// never resolves inside the scene or another stage. The default value
/// resolves nowhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    pub(crate) hierarchy: u32,
    pub(crate) key: NodeKey,
}

/// What a hierarchy node stands for.
///
/// The payload is the handle of the object in its owner's manager; the
/// hierarchy itself only stores links and transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Spatial root of a stage or scene.
    Root,
    Actor(ActorId),
    Light(LightId),
    Camera(CameraId),
    /// May only ever sit directly under the scene root.
    Overlay(OverlayId),
}

impl NodeKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Actor(_) => "Actor",
            Self::Light(_) => "Light",
            Self::Camera(_) => "Camera",
            Self::Overlay(_) => "Overlay",
        }
    }
}

/// A hierarchy node: links, local transform and kind.
///
/// # Hierarchy
///
/// - `parent`: `None` for the root and for detached nodes
/// - `children`: ordered, in attach order
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) kind: NodeKind,

    pub transform: Transform,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
            transform: Transform::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}
