use glam::{DAffine2, DVec2};

use super::node::{Node, NodeId, NodeKind, TextMeasure};
use crate::types::BoundingBox;

/// Arena backed transform hierarchy.
/// Nodes are addressed by [`NodeId`]; any mutation marks the scene dirty so
/// the view knows when to redraw.
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    /// Whether the scene changed since the last draw
    dirty: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root `stage` container
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::container("stage"))],
            root: NodeId(0),
            dirty: true,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert `node` as the last (topmost) child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = None;
        node.children.clear();
        self.nodes.push(Some(node));
        self.attach(parent, id);
        id
    }

    /// Move an existing node under `parent`, on top of its siblings
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.slot_mut(child) {
            node.parent = Some(parent);
        } else {
            return;
        }
        if let Some(parent_node) = self.slot_mut(parent) {
            parent_node.children.push(child);
        }
        self.dirty = true;
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.slot_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.slot_mut(id) {
            node.parent = None;
        }
    }

    /// Remove a node and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        self.detach(id);
        let mut node = self.nodes.get_mut(id.0)?.take()?;
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.remove_subtree(child);
        }
        self.dirty = true;
        Some(node)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Get a mutable reference to a node; marks the scene dirty
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let node = self.nodes.get_mut(id.0).and_then(Option::as_mut);
        if node.is_some() {
            self.dirty = true;
        }
        node
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `ancestor` is `id` itself or one of its parents
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Subtree of `id` in draw order (parents before children, earlier
    /// siblings before later ones)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    // === Dirty Tracking ===

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // === Transforms ===

    pub fn local_transform(&self, id: NodeId) -> DAffine2 {
        self.get(id)
            .map(Node::local_transform)
            .unwrap_or(DAffine2::IDENTITY)
    }

    /// Transform from the node's local space to stage space
    pub fn world_transform(&self, id: NodeId) -> DAffine2 {
        let mut transform = DAffine2::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else { break };
            transform = node.local_transform() * transform;
            current = node.parent;
        }
        transform
    }

    pub fn to_global(&self, id: NodeId, local: DVec2) -> DVec2 {
        self.world_transform(id).transform_point2(local)
    }

    pub fn to_local(&self, id: NodeId, global: DVec2) -> DVec2 {
        self.world_transform(id).inverse().transform_point2(global)
    }

    /// Stage position of the node's origin (its anchor point)
    pub fn global_position(&self, id: NodeId) -> DVec2 {
        self.to_global(id, DVec2::ZERO)
    }

    /// Uniform-ish scale of a node's world transform along each axis
    pub fn world_scale(&self, id: NodeId) -> DVec2 {
        let matrix = self.world_transform(id).matrix2;
        DVec2::new(matrix.x_axis.length(), matrix.y_axis.length())
    }

    // === Geometry ===

    /// Node rectangle corners in stage space: top-left, top-right,
    /// bottom-right, bottom-left of the unrotated content
    pub fn world_corners(&self, id: NodeId) -> Option<[DVec2; 4]> {
        let node = self.get(id)?;
        let transform = self.world_transform(id);
        Some(node.local_rect().corners().map(|c| transform.transform_point2(c)))
    }

    /// Bounds of the node's content and children in its own local space
    pub fn local_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        let node = self.get(id)?;
        let own = match &node.kind {
            NodeKind::Sprite { .. } | NodeKind::Text { .. } => Some(node.local_rect()),
            NodeKind::Graphics { shapes } => shapes_bounds(shapes),
            NodeKind::Container => None,
        };
        node.children
            .iter()
            .filter_map(|&child| {
                let bounds = self.local_bounds(child)?;
                Some(bounds.transformed(&self.local_transform(child)))
            })
            .fold(own, |acc, b| Some(acc.map_or(b, |a| a.union(&b))))
    }

    /// Axis-aligned stage-space bounds of the node and its subtree
    pub fn world_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        let bounds = self.local_bounds(id)?;
        Some(bounds.transformed(&self.world_transform(id)))
    }

    // === Editing ===

    /// See [`Node::change_anchor`]
    pub fn change_anchor(&mut self, id: NodeId, anchor: DVec2) {
        if let Some(node) = self.get_mut(id) {
            node.change_anchor(anchor);
        }
    }

    pub fn set_size(&mut self, id: NodeId, width: f64, height: f64) {
        if let Some(node) = self.get_mut(id) {
            node.set_width(width);
            node.set_height(height);
        }
    }

    /// Set the rotation in degrees
    pub fn set_angle(&mut self, id: NodeId, degrees: f64) {
        if let Some(node) = self.get_mut(id) {
            node.set_angle(degrees);
        }
    }

    /// Replace a text node's content and re-measure it
    pub fn set_text(&mut self, id: NodeId, value: &str, measure: &dyn TextMeasure) {
        let Some(node) = self.get_mut(id) else { return };
        if let NodeKind::Text {
            text,
            style,
            measured,
        } = &mut node.kind
        {
            *text = value.to_string();
            *measured = measure.measure(value, style);
            node.name = value.to_string();
        }
    }

    // === Hit Testing ===

    /// Topmost visible, interactive sprite or text under a stage-space point.
    /// Children drawn later win; clipped containers hide what lies outside
    /// their clip rectangle.
    pub fn hit_test(&self, id: NodeId, global: DVec2) -> Option<NodeId> {
        let node = self.get(id)?;
        if !node.visible {
            return None;
        }
        if let Some(clip) = node.clip {
            if !clip.contains(self.to_local(id, global)) {
                return None;
            }
        }
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, global) {
                return Some(hit);
            }
        }
        if node.interactive && node.is_selectable() && self.contains_point(id, global) {
            return Some(id);
        }
        None
    }

    /// Whether a stage-space point falls inside the node's rotated rectangle
    pub fn contains_point(&self, id: NodeId, global: DVec2) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        let transform = self.world_transform(id);
        if transform.matrix2.determinant().abs() <= f64::EPSILON {
            return false;
        }
        node.local_rect()
            .contains(transform.inverse().transform_point2(global))
    }

    // === Z-Order Management ===

    /// Move a node to the top of its siblings
    pub fn bring_to_front(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(parent_node) = self.slot_mut(parent) {
                parent_node.children.retain(|&c| c != id);
                parent_node.children.push(id);
                self.dirty = true;
            }
        }
    }

    /// Move a node to the bottom of its siblings
    pub fn send_to_back(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(parent_node) = self.slot_mut(parent) {
                parent_node.children.retain(|&c| c != id);
                parent_node.children.insert(0, id);
                self.dirty = true;
            }
        }
    }
}

fn shapes_bounds(shapes: &[super::GraphicsShape]) -> Option<BoundingBox> {
    use super::GraphicsShape;
    shapes
        .iter()
        .map(|shape| match shape {
            GraphicsShape::Rect { rect, .. } => *rect,
            GraphicsShape::Circle { center, radius, .. } => {
                BoundingBox::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
            }
            GraphicsShape::Shadow { rect, spread, .. } => rect.expand(*spread),
        })
        .reduce(|a, b| a.union(&b))
}
