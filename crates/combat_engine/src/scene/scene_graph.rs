//! Transform hierarchy
//!
//! Every entity, wheel mesh, wheel collider and particle emitter owns one
//! node in the [`SceneGraph`]. A node stores its local transform and an
//! optional, non-owning parent key; the global transform is always derived
//! on demand as `parent global ∘ local`, so there is no cached world state
//! that can drift from its parents.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Transform};

new_key_type! {
    /// Handle to a transform node
    pub struct TransformKey;
}

#[derive(Debug, Clone)]
struct TransformNode {
    local: Transform,
    parent: Option<TransformKey>,
    children: Vec<TransformKey>,
}

/// Arena of transform nodes linked into a forest
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<TransformKey, TransformNode>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node
    pub fn insert(&mut self, local: Transform) -> TransformKey {
        self.nodes.insert(TransformNode {
            local,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Insert a node under `parent`. Falls back to a root node if `parent` is gone.
    pub fn insert_child(&mut self, parent: TransformKey, local: Transform) -> TransformKey {
        let key = self.insert(local);
        self.set_parent(key, Some(parent));
        key
    }

    /// Remove a node. Its children become roots and keep their local transform.
    pub fn remove(&mut self, key: TransformKey) -> Option<Transform> {
        let node = self.nodes.remove(key)?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&child| child != key);
        }
        for child in node.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
            }
        }
        Some(node.local)
    }

    /// Whether `key` refers to a live node
    pub fn contains(&self, key: TransformKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Local transform of a node
    pub fn local(&self, key: TransformKey) -> Option<&Transform> {
        self.nodes.get(key).map(|node| &node.local)
    }

    /// Mutable local transform of a node
    pub fn local_mut(&mut self, key: TransformKey) -> Option<&mut Transform> {
        self.nodes.get_mut(key).map(|node| &mut node.local)
    }

    /// Replace the local transform of a node; returns false if the node is gone
    pub fn set_local(&mut self, key: TransformKey, local: Transform) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.local = local;
                true
            }
            None => false,
        }
    }

    /// Parent of a node
    pub fn parent(&self, key: TransformKey) -> Option<TransformKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    /// Children of a node
    pub fn children(&self, key: TransformKey) -> &[TransformKey] {
        self.nodes.get(key).map_or(&[], |node| node.children.as_slice())
    }

    /// Re-parent a node, keeping its local transform.
    ///
    /// Refuses (returns false) when either node is missing or the new link
    /// would create a cycle.
    pub fn set_parent(&mut self, key: TransformKey, parent: Option<TransformKey>) -> bool {
        if !self.nodes.contains_key(key) {
            return false;
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) || self.is_ancestor_or_self(key, parent) {
                log::warn!("Rejected re-parenting of {:?} under {:?}", key, parent);
                return false;
            }
        }

        let old_parent = self.nodes[key].parent;
        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            old.children.retain(|&child| child != key);
        }
        if let Some(new) = parent.and_then(|p| self.nodes.get_mut(p)) {
            new.children.push(key);
        }
        self.nodes[key].parent = parent;
        true
    }

    fn is_ancestor_or_self(&self, ancestor: TransformKey, mut key: TransformKey) -> bool {
        loop {
            if key == ancestor {
                return true;
            }
            match self.parent(key) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    /// Global transform: parent global ∘ local, or local for a root
    pub fn global(&self, key: TransformKey) -> Option<Transform> {
        let node = self.nodes.get(key)?;
        match node.parent.and_then(|parent| self.global(parent)) {
            Some(parent_global) => Some(parent_global.combine(&node.local)),
            None => Some(node.local),
        }
    }

    /// Global transform as a matrix, identity for a missing node
    pub fn global_matrix(&self, key: TransformKey) -> Mat4 {
        self.global(key).map_or_else(Mat4::identity, |t| t.to_matrix())
    }

    /// Set a node's local transform so that its global transform equals `global`
    pub fn set_global(&mut self, key: TransformKey, global: Transform) -> bool {
        let local = match self.parent(key).and_then(|parent| self.global(parent)) {
            Some(parent_global) => parent_global.inverse().combine(&global),
            None => global,
        };
        self.set_local(key, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Quat, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_root_global_is_local() {
        let mut graph = SceneGraph::new();
        let local = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let root = graph.insert(local);

        assert_eq!(graph.global(root), Some(local));
    }

    #[test]
    fn test_child_global_composes_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(Transform::from_position_rotation(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), constants::PI / 2.0),
        ));
        let child = graph.insert_child(parent, Transform::from_position(Vec3::new(0.0, 0.0, 1.0)));

        let global = graph.global(child).unwrap();
        assert_relative_eq!(global.position, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-5);

        // moving the parent moves the child with zero bookkeeping
        graph.local_mut(parent).unwrap().position.y = 5.0;
        assert_relative_eq!(graph.global(child).unwrap().position.y, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_remove_detaches_children() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let child = graph.insert_child(parent, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));

        graph.remove(parent);

        assert_eq!(graph.parent(child), None);
        assert_relative_eq!(graph.global(child).unwrap().position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(Transform::identity());
        let b = graph.insert_child(a, Transform::identity());

        assert!(!graph.set_parent(a, Some(b)));
        assert!(!graph.set_parent(a, Some(a)));
        assert_eq!(graph.parent(b), Some(a));
        assert_eq!(graph.children(a), &[b]);
    }

    #[test]
    fn test_set_global_under_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(Transform::from_position(Vec3::new(3.0, 0.0, 0.0)));
        let child = graph.insert_child(parent, Transform::identity());

        assert!(graph.set_global(child, Transform::from_position(Vec3::new(5.0, 1.0, 0.0))));

        assert_relative_eq!(graph.local(child).unwrap().position, Vec3::new(2.0, 1.0, 0.0), epsilon = 1e-5);
    }
}
