//! In-memory node tree with boxes, standing in for the host document

use std::collections::BTreeMap;

use crate::host::Surface;
use crate::model::geometry::{NodeId, Point, Rect, Viewport};

#[derive(Debug, Clone)]
struct SceneNode {
    parent: Option<NodeId>,
    rect: Rect,
}

/// Node tree rooted at a body node, plus the viewport
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    viewport: Viewport,
    body: NodeId,
    next_id: u64,
}

impl Scene {
    pub const BODY: NodeId = NodeId(0);

    pub fn new(viewport: Viewport) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            Self::BODY,
            SceneNode {
                parent: None,
                rect: Rect::sized(viewport.width, viewport.height),
            },
        );
        Self {
            nodes,
            viewport,
            body: Self::BODY,
            next_id: 1,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Add a node with the next free id
    pub fn add(&mut self, parent: NodeId, rect: Rect) -> NodeId {
        while self.nodes.contains_key(&NodeId(self.next_id)) {
            self.next_id += 1;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                parent: Some(parent),
                rect,
            },
        );
        id
    }

    /// Add a node under a caller-chosen id; false if the id is taken
    pub fn insert(&mut self, id: NodeId, parent: NodeId, rect: Rect) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(
            id,
            SceneNode {
                parent: Some(parent),
                rect,
            },
        );
        true
    }

    /// Remove a node and its subtree, returning every removed id
    pub fn remove(&mut self, node: NodeId) -> Vec<NodeId> {
        if node == self.body || !self.nodes.contains_key(&node) {
            return Vec::new();
        }
        let removed: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| self.contains(node, *id))
            .collect();
        for id in &removed {
            self.nodes.remove(id);
        }
        removed
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(&node).map(|n| n.rect)
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn move_to(&mut self, node: NodeId, origin: Point) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = n.rect.at(origin);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(body) = self.nodes.get_mut(&self.body) {
            body.rect = Rect::sized(viewport.width, viewport.height);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Surface for Scene {
    fn bounding_box(&self, node: NodeId) -> Option<Rect> {
        self.rect(node)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return self.nodes.contains_key(&id);
            }
            current = self.parent(id);
        }
        false
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_takes_subtree() {
        let mut scene = Scene::new(Viewport::new(400.0, 300.0));
        let panel = scene.add(scene.body(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let button = scene.add(panel, Rect::new(10.0, 10.0, 20.0, 10.0));
        let other = scene.add(scene.body(), Rect::new(200.0, 0.0, 10.0, 10.0));

        let removed = scene.remove(panel);
        assert_eq!(removed.len(), 2);
        assert!(!scene.is_attached(button));
        assert!(scene.is_attached(other));
    }

    #[test]
    fn test_contains_walks_ancestors() {
        let mut scene = Scene::new(Viewport::new(400.0, 300.0));
        let outer = scene.add(scene.body(), Rect::sized(50.0, 50.0));
        let inner = scene.add(outer, Rect::sized(10.0, 10.0));
        assert!(scene.contains(outer, inner));
        assert!(scene.contains(inner, inner));
        assert!(!scene.contains(inner, outer));
        assert!(scene.contains(scene.body(), inner));
    }

    #[test]
    fn test_body_cannot_be_removed() {
        let mut scene = Scene::new(Viewport::new(400.0, 300.0));
        assert!(scene.remove(Scene::BODY).is_empty());
        assert!(scene.is_attached(Scene::BODY));
    }
}
