//! Object Hierarchy
//!
//! Parent/child links live in a slotmap arena; nodes refer to each other by
//! [`NodeHandle`] only. Destroying a subtree is handle invalidation, never
//! pointer chasing, and a stale handle is reported as not-found.
//!
//! Every hierarchy has its own id and stamps it into the handles it issues.
//! A handle from another hierarchy (a scene camera node passed to a stage,
//! say) is treated like a stale one.
//!
//! The hierarchy knows nothing about actors or lights beyond the
//! [`NodeKind`] tag. Owners ([`Stage`](crate::scene::Stage),
//! [`Scene`](crate::scene::Scene)) use [`Hierarchy::subtree_post_order`] to
//! destroy the objects behind a subtree bottom-up, then call
//! [`Hierarchy::remove`] for each node.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Affine3A;
use slotmap::SlotMap;

use crate::errors::{EngineError, Result};
use crate::scene::node::{Node, NodeHandle, NodeKey, NodeKind};
use crate::scene::transform::Transform;

const NODE_KIND: &str = "Node";

// 0 is left for `NodeHandle::default()`
static NEXT_HIERARCHY_ID: AtomicU32 = AtomicU32::new(1);

pub struct Hierarchy {
    id: u32,
    nodes: SlotMap<NodeKey, Node>,
    root: NodeHandle,
}

impl Hierarchy {
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_HIERARCHY_ID.fetch_add(1, Ordering::Relaxed);
        let mut nodes = SlotMap::with_key();
        let key = nodes.insert(Node::new(NodeKind::Root));
        Self {
            id,
            nodes,
            root: NodeHandle { hierarchy: id, key },
        }
    }

    fn get(&self, handle: NodeHandle) -> Option<&Node> {
        if handle.hierarchy == self.id {
            self.nodes.get(handle.key)
        } else {
            None
        }
    }

    fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        if handle.hierarchy == self.id {
            self.nodes.get_mut(handle.key)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The root always exists, so this is `true` only if nothing else does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn node(&self, handle: NodeHandle) -> Result<&Node> {
        self.get(handle).ok_or_else(|| stale(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.get_mut(handle).ok_or_else(|| stale(handle))
    }

    pub fn transform(&self, handle: NodeHandle) -> Result<&Transform> {
        Ok(&self.node(handle)?.transform)
    }

    pub fn transform_mut(&mut self, handle: NodeHandle) -> Result<&mut Transform> {
        Ok(&mut self.node_mut(handle)?.transform)
    }

    pub fn children(&self, handle: NodeHandle) -> Result<&[NodeHandle]> {
        Ok(self.node(handle)?.children())
    }

    /// Creates a node under `parent`, or under the root when `None`.
    pub fn insert(&mut self, kind: NodeKind, parent: Option<NodeHandle>) -> Result<NodeHandle> {
        if kind == NodeKind::Root {
            return Err(EngineError::InvalidOperation(
                "a hierarchy has exactly one root".into(),
            ));
        }

        let parent = parent.unwrap_or(self.root);
        self.check_placement(kind, parent)?;

        let key = self.nodes.insert(Node::new(kind));
        let handle = NodeHandle {
            hierarchy: self.id,
            key,
        };
        self.link(handle, parent);
        Ok(handle)
    }

    /// Detaches `child` from its current parent and attaches it to `parent`.
    ///
    /// `None` leaves the node detached. It keeps its subtree and can be
    /// reattached later.
    ///
    /// # Errors
    ///
    /// - `NotFound` if either handle is stale
    /// - `InvalidOperation` when reparenting the root, parenting a node to
    ///   itself or one of its descendants, or placing an overlay anywhere but
    ///   directly under the root
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        let kind = self.node(child)?.kind;

        if child == self.root {
            return Err(EngineError::InvalidOperation(
                "the root node can not be reparented".into(),
            ));
        }

        if let Some(parent) = parent {
            self.node(parent)?;
            if parent == child {
                return Err(EngineError::InvalidOperation(
                    "a node can not be its own parent".into(),
                ));
            }
            if self.is_ancestor(child, parent) {
                return Err(EngineError::InvalidOperation(format!(
                    "reparenting {} node would create a cycle",
                    kind.name()
                )));
            }
            self.check_placement(kind, parent)?;
        }

        self.unlink(child);
        if let Some(parent) = parent {
            self.link(child, parent);
        }
        Ok(())
    }

    /// `true` if `ancestor` appears on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.get(handle).and_then(|n| n.parent);
        }
        false
    }

    fn check_placement(&self, kind: NodeKind, parent: NodeHandle) -> Result<()> {
        if matches!(kind, NodeKind::Overlay(_)) && parent != self.root {
            return Err(EngineError::InvalidOperation(
                "overlays may only be parented directly under the scene root".into(),
            ));
        }
        Ok(())
    }

    fn link(&mut self, child: NodeHandle, parent: NodeHandle) {
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn unlink(&mut self, child: NodeHandle) {
        let old_parent = self.get_mut(child).and_then(|n| n.parent.take());
        if let Some(p) = old_parent
            && let Some(n) = self.get_mut(p)
            && let Some(i) = n.children.iter().position(|&x| x == child)
        {
            n.children.remove(i);
        }
    }

    /// World matrix: parent chain composed with the local transform.
    ///
    /// Computed on demand; a detached node's world matrix is its local one.
    pub fn world_matrix(&self, handle: NodeHandle) -> Result<Affine3A> {
        let node = self.node(handle)?;
        let mut world = node.transform.local_matrix();
        let mut current = node.parent;
        while let Some(parent) = current {
            let p = self.node(parent)?;
            world = p.transform.local_matrix() * world;
            current = p.parent;
        }
        Ok(world)
    }

    /// Descendants of `handle` with every child listed before its parent.
    ///
    /// `handle` itself is not included.
    pub fn subtree_post_order(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeHandle, bool)> = self
            .node(handle)?
            .children
            .iter()
            .rev()
            .map(|&c| (c, false))
            .collect();

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            if let Some(node) = self.get(current) {
                stack.extend(node.children.iter().rev().map(|&c| (c, false)));
            }
        }
        Ok(out)
    }

    /// Unlinks `handle` from its parent and frees it.
    ///
    /// Remaining children become detached. Owners destroy them first.
    pub fn remove(&mut self, handle: NodeHandle) -> Result<Node> {
        if handle == self.root {
            return Err(EngineError::InvalidOperation(
                "the root node can not be removed".into(),
            ));
        }
        self.node(handle)?;
        self.unlink(handle);
        let node = self.nodes.remove(handle.key).ok_or_else(|| stale(handle))?;
        for &child in &node.children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }
        Ok(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        let hierarchy = self.id;
        self.nodes
            .iter()
            .map(move |(key, node)| (NodeHandle { hierarchy, key }, node))
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hierarchy")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

fn stale(handle: NodeHandle) -> EngineError {
    EngineError::not_found(NODE_KIND, slotmap::Key::data(&handle.key).as_ffi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActorId, OverlayId};

    fn actor() -> NodeKind {
        NodeKind::Actor(ActorId::allocate())
    }

    #[test]
    fn post_order_lists_children_first() {
        let mut h = Hierarchy::new();
        let a = h.insert(actor(), None).unwrap();
        let b = h.insert(actor(), Some(a)).unwrap();
        let c = h.insert(actor(), Some(b)).unwrap();
        let d = h.insert(actor(), Some(a)).unwrap();

        assert_eq!(h.subtree_post_order(a).unwrap(), vec![c, b, d]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut h = Hierarchy::new();
        let a = h.insert(actor(), None).unwrap();
        let b = h.insert(actor(), Some(a)).unwrap();

        assert!(matches!(
            h.set_parent(a, Some(b)),
            Err(EngineError::InvalidOperation(_))
        ));
        assert_eq!(h.node(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn overlay_only_under_root() {
        let mut h = Hierarchy::new();
        let a = h.insert(actor(), None).unwrap();
        let overlay = h.insert(NodeKind::Overlay(OverlayId::allocate()), None).unwrap();

        assert!(h.set_parent(overlay, Some(a)).is_err());
        assert!(h.set_parent(overlay, Some(h.root())).is_ok());
    }

    #[test]
    fn handles_do_not_cross_hierarchies() {
        let mut first = Hierarchy::new();
        let mut second = Hierarchy::new();
        let a = first.insert(actor(), None).unwrap();
        let b = second.insert(actor(), None).unwrap();

        // Same arena slot, different owner
        assert_eq!(a.key, b.key);
        assert!(!second.contains(a));
        assert!(second.node(a).unwrap_err().is_not_found());
        assert!(second.set_parent(a, None).unwrap_err().is_not_found());
        assert!(second.set_parent(b, Some(a)).unwrap_err().is_not_found());
        assert!(second.remove(a).unwrap_err().is_not_found());
        assert_eq!(second.node(b).unwrap().parent(), Some(second.root()));
        assert!(!first.contains(NodeHandle::default()));
    }
}
