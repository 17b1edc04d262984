//! Selection and transform controller.
//!
//! Clicking a sprite or text node selects it and shows a control box with
//! eight resize handles and a rotate handle. Dragging the body moves the
//! node, dragging a handle resizes it around the opposite corner or edge,
//! and dragging the rotate handle spins it around its centre.

use std::any::Any;

use glam::{DAffine2, DVec2};

use crate::geometry::{get_angle, normalize_degrees, rotate};
use crate::plugins::{EditorEvent, EventFlow, Plugin, PluginContext, PointerInput};
use crate::scene::{NodeId, SceneGraph, SceneLayers};
use crate::types::{BoundingBox, HandleName};

/// Drawn radius of the handle knobs, in screen pixels
pub const HANDLE_RADIUS: f64 = 5.0;
/// Pointer tolerance around a handle, in screen pixels
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
/// Length of the rotate handle stem, in screen pixels
pub const ROTATE_HANDLE_OFFSET: f64 = 20.0;

const CENTER_ANCHOR: DVec2 = DVec2::new(0.5, 0.5);

/// Geometry of the selection overlay, in `topLayer` space.
///
/// `origin` is the selected node's anchor point and the box is rotated by
/// the node's angle; `rect`, `handles` and the rotate handle are expressed
/// in that rotated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlBox {
    pub origin: DVec2,
    /// Degrees
    pub angle: f64,
    pub rect: BoundingBox,
    /// Handle centres, indexed like [`HandleName::ALL`]
    pub handles: [DVec2; 8],
    /// Bottom-centre point the rotate stem grows from
    pub rotate_stem: DVec2,
    pub rotate_handle: DVec2,
}

impl ControlBox {
    pub fn compute(graph: &SceneGraph, layers: &SceneLayers, id: NodeId) -> Option<Self> {
        let node = graph.get(id)?;
        // node frame relative to topLayer, ancestors' scale and rotation included
        let relative = graph.world_transform(layers.top_layer).inverse() * graph.world_transform(id);
        let x_axis = relative.matrix2.x_axis;
        let origin = relative.translation;
        let scale = DVec2::new(x_axis.length(), relative.matrix2.y_axis.length());
        let size = node.intrinsic_size() * scale;
        let rect = BoundingBox::new(
            -size.x * node.anchor.x,
            -size.y * node.anchor.y,
            size.x,
            size.y,
        );
        let handles = HandleName::ALL.map(|h| rect.min() + h.unit_position() * size);
        let rotate_stem = DVec2::new(rect.x + rect.width / 2.0, rect.y + rect.height);
        let layer_scale = graph.world_scale(layers.top_layer).y.max(f64::EPSILON);
        let rotate_handle = rotate_stem + DVec2::new(0.0, ROTATE_HANDLE_OFFSET / layer_scale);
        Some(Self {
            origin,
            angle: normalize_degrees(x_axis.y.atan2(x_axis.x).to_degrees()),
            rect,
            handles,
            rotate_stem,
            rotate_handle,
        })
    }

    /// Box frame to `topLayer` space
    pub fn transform(&self) -> DAffine2 {
        DAffine2::from_angle_translation(self.angle.to_radians(), self.origin)
    }

    /// The same geometry mapped to stage (screen) space
    pub fn to_screen(&self, graph: &SceneGraph, layers: &SceneLayers) -> ScreenControlBox {
        let to_screen = graph.world_transform(layers.top_layer) * self.transform();
        let map = |p: DVec2| to_screen.transform_point2(p);
        ScreenControlBox {
            corners: self.rect.corners().map(map),
            handles: self.handles.map(map),
            rotate_stem: map(self.rotate_stem),
            rotate_handle: map(self.rotate_handle),
        }
    }
}

/// Control box in stage coordinates, ready for drawing and hit testing
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenControlBox {
    /// top-left, top-right, bottom-right, bottom-left
    pub corners: [DVec2; 4],
    pub handles: [DVec2; 8],
    pub rotate_stem: DVec2,
    pub rotate_handle: DVec2,
}

impl ScreenControlBox {
    pub fn hit(&self, point: DVec2) -> Option<HandleHit> {
        if self.rotate_handle.distance(point) <= HANDLE_HIT_RADIUS {
            return Some(HandleHit::Rotate);
        }
        HandleName::ALL
            .iter()
            .zip(self.handles.iter())
            .find(|(_, center)| center.distance(point) <= HANDLE_HIT_RADIUS)
            .map(|(handle, _)| HandleHit::Resize(*handle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleHit {
    Rotate,
    Resize(HandleName),
}

impl HandleHit {
    pub fn cursor(&self) -> &'static str {
        match self {
            HandleHit::Rotate => "grab",
            HandleHit::Resize(handle) => handle.cursor(),
        }
    }
}

/// Drag in progress. Points are in the selected node's parent space.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Moving {
        start: DVec2,
        original: DVec2,
    },
    Resizing {
        handle: HandleName,
        start: DVec2,
        start_size: DVec2,
    },
    Rotating {
        start: DVec2,
        start_angle: f64,
    },
}

pub struct SelectionController {
    selected: Option<NodeId>,
    gesture: Gesture,
    hover_cursor: &'static str,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            selected: None,
            gesture: Gesture::Idle,
            hover_cursor: "default",
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Cursor for the last hovered position
    pub fn cursor(&self) -> &'static str {
        self.hover_cursor
    }

    pub fn control_box(&self, graph: &SceneGraph, layers: &SceneLayers) -> Option<ControlBox> {
        ControlBox::compute(graph, layers, self.selected?)
    }

    pub fn select(&mut self, ctx: &mut PluginContext, id: NodeId) {
        if self.selected == Some(id) {
            return;
        }
        if !ctx.graph.get(id).is_some_and(|n| n.is_selectable()) {
            return;
        }
        self.release_selected(ctx);
        if let Some(node) = ctx.graph.get_mut(id) {
            node.interactive = true;
            node.cursor = Some("move".to_string());
        }
        self.selected = Some(id);
        ctx.emit(EditorEvent::SelectionChanged(Some(id)));
    }

    pub fn clear_selection(&mut self, ctx: &mut PluginContext) {
        if self.selected.is_none() {
            return;
        }
        self.release_selected(ctx);
        ctx.emit(EditorEvent::SelectionChanged(None));
    }

    fn release_selected(&mut self, ctx: &mut PluginContext) {
        if let Some(id) = self.selected.take() {
            if let Some(node) = ctx.graph.get_mut(id) {
                node.cursor = Some("pointer".to_string());
            }
        }
        self.gesture = Gesture::Idle;
    }

    /// Set the selected node's displayed size
    pub fn resize_selected(&mut self, ctx: &mut PluginContext, width: f64, height: f64) {
        let Some(id) = self.selected else { return };
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        ctx.graph.set_size(id, width, height);
        ctx.emit(EditorEvent::NodeTransformed(id));
    }

    /// Set the selected node's rotation in degrees
    pub fn rotate_selected(&mut self, ctx: &mut PluginContext, angle: f64) {
        let Some(id) = self.selected else { return };
        ctx.graph.set_angle(id, normalize_degrees(angle));
        ctx.emit(EditorEvent::NodeTransformed(id));
    }

    /// Remove the selected node from the scene
    pub fn delete_selected(&mut self, ctx: &mut PluginContext) -> Option<NodeId> {
        let id = self.selected.take()?;
        self.gesture = Gesture::Idle;
        ctx.graph.remove(id);
        log::debug!("deleted node {}", id.index());
        ctx.emit(EditorEvent::SelectionChanged(None));
        Some(id)
    }

    fn handle_at(&self, graph: &SceneGraph, layers: &SceneLayers, point: DVec2) -> Option<HandleHit> {
        self.control_box(graph, layers)?
            .to_screen(graph, layers)
            .hit(point)
    }

    fn parent_point(graph: &SceneGraph, id: NodeId, global: DVec2) -> DVec2 {
        match graph.parent(id) {
            Some(parent) => graph.to_local(parent, global),
            None => global,
        }
    }

    fn begin_resize(&mut self, ctx: &mut PluginContext, id: NodeId, handle: HandleName, global: DVec2) {
        ctx.graph.change_anchor(id, handle.opposite_anchor());
        let start_size = ctx.graph.get(id).map_or(DVec2::ZERO, |n| n.size());
        self.gesture = Gesture::Resizing {
            handle,
            start: Self::parent_point(ctx.graph, id, global),
            start_size,
        };
    }

    fn begin_rotate(&mut self, ctx: &mut PluginContext, id: NodeId, global: DVec2) {
        let start_angle = ctx.graph.get(id).map_or(0.0, |n| n.angle());
        ctx.graph.change_anchor(id, CENTER_ANCHOR);
        self.gesture = Gesture::Rotating {
            start: Self::parent_point(ctx.graph, id, global),
            start_angle,
        };
    }

    fn begin_move(&mut self, ctx: &mut PluginContext, id: NodeId, global: DVec2) {
        let original = ctx.graph.get(id).map_or(DVec2::ZERO, |n| n.position);
        self.gesture = Gesture::Moving {
            start: Self::parent_point(ctx.graph, id, global),
            original,
        };
    }

    fn drag_to(&mut self, ctx: &mut PluginContext, id: NodeId, global: DVec2) {
        let current = Self::parent_point(ctx.graph, id, global);
        let min_size = ctx.config.min_node_size;
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Moving { start, original } => {
                if let Some(node) = ctx.graph.get_mut(id) {
                    node.position = original + (current - start);
                }
            }
            Gesture::Resizing {
                handle,
                start,
                start_size,
            } => {
                let Some(node) = ctx.graph.get_mut(id) else { return };
                let local_delta = rotate(current - start, -node.rotation) * handle.resize_direction();
                let size = (start_size + local_delta).max(DVec2::splat(min_size));
                node.set_width(size.x);
                node.set_height(size.y);
            }
            Gesture::Rotating { start, start_angle } => {
                let Some(node) = ctx.graph.get_mut(id) else { return };
                let delta = get_angle(start - node.position, current - node.position);
                node.set_angle(normalize_degrees(start_angle + delta));
            }
        }
    }

    fn hover(&mut self, graph: &SceneGraph, layers: &SceneLayers, point: DVec2) {
        if let Some(hit) = self.handle_at(graph, layers, point) {
            self.hover_cursor = hit.cursor();
            return;
        }
        self.hover_cursor = match graph.hit_test(layers.stage, point) {
            Some(id) if Some(id) == self.selected => "move",
            Some(_) => "pointer",
            None => "default",
        };
    }
}

impl Plugin for SelectionController {
    fn name(&self) -> &'static str {
        "selection-controller"
    }

    fn on_pointer_down(&mut self, ctx: &mut PluginContext, input: &PointerInput) -> EventFlow {
        let point = input.position;
        if let Some(id) = self.selected {
            match self.handle_at(ctx.graph, ctx.layers, point) {
                Some(HandleHit::Rotate) => {
                    self.begin_rotate(ctx, id, point);
                    return EventFlow::Stop;
                }
                Some(HandleHit::Resize(handle)) => {
                    self.begin_resize(ctx, id, handle, point);
                    return EventFlow::Stop;
                }
                None => {}
            }
        }

        match ctx.graph.hit_test(ctx.layers.stage, point) {
            Some(id) => {
                self.select(ctx, id);
                self.begin_move(ctx, id, point);
                EventFlow::Stop
            }
            None => {
                self.clear_selection(ctx);
                EventFlow::Continue
            }
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut PluginContext, input: &PointerInput) -> EventFlow {
        match (self.selected, self.gesture) {
            (Some(id), gesture) if gesture != Gesture::Idle => {
                self.drag_to(ctx, id, input.position);
                EventFlow::Stop
            }
            _ => {
                self.hover(ctx.graph, ctx.layers, input.position);
                EventFlow::Continue
            }
        }
    }

    fn on_pointer_up(&mut self, ctx: &mut PluginContext, _input: &PointerInput) -> EventFlow {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let Some(id) = self.selected else {
            return EventFlow::Continue;
        };
        if let Gesture::Resizing { .. } = gesture {
            ctx.graph.change_anchor(id, CENTER_ANCHOR);
        }
        if gesture == Gesture::Idle {
            return EventFlow::Continue;
        }
        ctx.emit(EditorEvent::NodeTransformed(id));
        EventFlow::Stop
    }

    fn on_event(&mut self, ctx: &mut PluginContext, event: &EditorEvent) {
        if let EditorEvent::ContentReplaced = event {
            if self.selected.is_some_and(|id| !ctx.graph.contains(id)) {
                self.selected = None;
                self.gesture = Gesture::Idle;
                ctx.emit(EditorEvent::SelectionChanged(None));
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::plugins::HostEffect;
    use crate::scene::{ApproxTextMeasure, Node, Texture};

    const EPS: f64 = 1e-6;

    struct Harness {
        graph: SceneGraph,
        layers: SceneLayers,
        config: EditorConfig,
        events: Vec<EditorEvent>,
        effects: Vec<HostEffect>,
        controller: SelectionController,
    }

    impl Harness {
        fn new() -> Self {
            let mut graph = SceneGraph::new();
            let config = EditorConfig::default();
            let layers = SceneLayers::build(&mut graph, &config);
            Self {
                graph,
                layers,
                config,
                events: Vec::new(),
                effects: Vec::new(),
                controller: SelectionController::new(),
            }
        }

        fn add_sprite(&mut self, position: DVec2, angle: f64) -> NodeId {
            let mut node = Node::sprite("img", Texture::new("a.png", 200.0, 100.0))
                .with_position(position)
                .with_anchor(CENTER_ANCHOR)
                .with_interactive(true);
            node.set_angle(angle);
            self.graph.add_child(self.layers.content, node)
        }

        fn with<R>(&mut self, f: impl FnOnce(&mut SelectionController, &mut PluginContext) -> R) -> R {
            let Harness {
                graph,
                layers,
                config,
                events,
                effects,
                controller,
            } = self;
            let mut ctx = PluginContext::new(graph, layers, config, &ApproxTextMeasure, events, effects);
            f(controller, &mut ctx)
        }

        fn down(&mut self, p: DVec2) -> EventFlow {
            self.with(|c, ctx| c.on_pointer_down(ctx, &PointerInput::at(p.x, p.y)))
        }

        fn drag(&mut self, p: DVec2) -> EventFlow {
            self.with(|c, ctx| c.on_pointer_move(ctx, &PointerInput::at(p.x, p.y)))
        }

        fn up(&mut self) -> EventFlow {
            self.with(|c, ctx| c.on_pointer_up(ctx, &PointerInput::at(0.0, 0.0)))
        }

        fn screen_box(&self) -> ScreenControlBox {
            self.controller
                .control_box(&self.graph, &self.layers)
                .unwrap()
                .to_screen(&self.graph, &self.layers)
        }

        fn global_corners(&self, id: NodeId) -> [DVec2; 4] {
            self.graph.world_corners(id).unwrap()
        }
    }

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(a.distance(b) < EPS, "{a} != {b}");
    }

    /// Stage point of the corner or edge midpoint opposite `handle`
    fn opposite_point(corners: &[DVec2; 4], handle: HandleName) -> DVec2 {
        let [tl, tr, br, bl] = *corners;
        match handle {
            HandleName::TopLeft => br,
            HandleName::Top => (bl + br) / 2.0,
            HandleName::TopRight => bl,
            HandleName::Right => (tl + bl) / 2.0,
            HandleName::BottomRight => tl,
            HandleName::Bottom => (tl + tr) / 2.0,
            HandleName::BottomLeft => tr,
            HandleName::Left => (tr + br) / 2.0,
        }
    }

    #[test]
    fn test_click_selects_and_empty_click_clears() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        let center = h.graph.global_position(id);

        assert_eq!(h.down(center), EventFlow::Stop);
        h.up();
        assert_eq!(h.controller.selected(), Some(id));
        assert_eq!(h.events[0], EditorEvent::SelectionChanged(Some(id)));
        assert_eq!(h.graph.get(id).unwrap().cursor.as_deref(), Some("move"));

        assert_eq!(h.down(DVec2::new(30.0, 30.0)), EventFlow::Continue);
        assert_eq!(h.controller.selected(), None);
        assert_eq!(h.events.last(), Some(&EditorEvent::SelectionChanged(None)));
    }

    #[test]
    fn test_move_follows_pointer() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::new(10.0, 10.0), 30.0);
        let start = h.graph.global_position(id);

        h.down(start);
        h.drag(start + DVec2::new(40.0, -25.0));
        h.up();

        assert_close(h.graph.global_position(id), start + DVec2::new(40.0, -25.0));
        assert_eq!(h.events.last(), Some(&EditorEvent::NodeTransformed(id)));
    }

    #[test]
    fn test_control_box_geometry() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::new(50.0, -20.0), 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let cb = h.controller.control_box(&h.graph, &h.layers).unwrap();
        assert_close(cb.origin, DVec2::new(50.0, -20.0));
        assert_close(cb.rect.min(), DVec2::new(-100.0, -50.0));
        assert_close(cb.rect.max(), DVec2::new(100.0, 50.0));
        assert_close(cb.handles[0], DVec2::new(-100.0, -50.0));
        assert_close(cb.handles[3], DVec2::new(100.0, 0.0));
        assert_close(cb.rotate_stem, DVec2::new(0.0, 50.0));

        // screen outline matches the node's own corners
        let screen = cb.to_screen(&h.graph, &h.layers);
        for (a, b) in screen.corners.iter().zip(h.global_corners(id).iter()) {
            assert_close(*a, *b);
        }
        // rotate knob sits a fixed distance below the box on screen
        assert!((screen.rotate_handle.distance(screen.rotate_stem) - ROTATE_HANDLE_OFFSET).abs() < EPS);
    }

    #[test]
    fn test_control_box_follows_scaled_and_rotated_container() {
        let mut h = Harness::new();
        let mut group = Node::container("group")
            .with_position(DVec2::new(30.0, -10.0))
            .with_scale(DVec2::splat(2.0));
        group.rotation = 0.5;
        let group = h.graph.add_child(h.layers.content, group);
        let mut sprite = Node::sprite("img", Texture::new("a.png", 120.0, 80.0))
            .with_anchor(CENTER_ANCHOR)
            .with_interactive(true);
        sprite.set_angle(20.0);
        let id = h.graph.add_child(group, sprite);
        h.with(|c, ctx| c.select(ctx, id));

        let screen = h.screen_box();
        for (a, b) in screen.corners.iter().zip(h.global_corners(id).iter()) {
            assert_close(*a, *b);
        }

        // the overlay handle drives a resize around the opposite corner
        let fixed = opposite_point(&h.global_corners(id), HandleName::TopLeft);
        let grab = screen.handles[HandleName::TopLeft as usize];
        assert_eq!(h.down(grab), EventFlow::Stop);
        h.drag(grab - DVec2::new(15.0, 10.0));
        assert_close(opposite_point(&h.global_corners(id), HandleName::TopLeft), fixed);
        h.up();
        for (a, b) in h.screen_box().corners.iter().zip(h.global_corners(id).iter()) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn test_resize_keeps_opposite_side_fixed_for_every_handle() {
        for handle in HandleName::ALL {
            let mut h = Harness::new();
            let id = h.add_sprite(DVec2::new(-40.0, 30.0), 35.0);
            h.with(|c, ctx| c.select(ctx, id));

            let fixed = opposite_point(&h.global_corners(id), handle);
            let grab = h.screen_box().handles[handle as usize];
            assert_eq!(h.down(grab), EventFlow::Stop, "{handle:?}");
            h.drag(grab + DVec2::new(23.0, 17.0));

            assert_close(opposite_point(&h.global_corners(id), handle), fixed);
            h.up();
            // anchor goes back to the centre without moving the node
            assert_eq!(h.graph.get(id).unwrap().anchor, CENTER_ANCHOR);
            assert_close(opposite_point(&h.global_corners(id), handle), fixed);
        }
    }

    #[test]
    fn test_resize_from_bottom_right_grows_by_local_delta() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let grab = h.screen_box().handles[HandleName::BottomRight as usize];
        let target = h.graph.to_global(h.layers.content, h.graph.to_local(h.layers.content, grab) + DVec2::new(30.0, 20.0));
        h.down(grab);
        h.drag(target);

        let size = h.graph.get(id).unwrap().size();
        assert_close(size, DVec2::new(230.0, 120.0));
    }

    #[test]
    fn test_edge_handle_changes_one_axis() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let grab = h.screen_box().handles[HandleName::Right as usize];
        h.down(grab);
        h.drag(grab + DVec2::new(20.0, 60.0));

        let size = h.graph.get(id).unwrap().size();
        assert!(size.x > 200.0);
        assert!((size.y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let grab = h.screen_box().handles[HandleName::BottomRight as usize];
        h.down(grab);
        h.drag(grab - DVec2::new(500.0, 500.0));

        assert_close(h.graph.get(id).unwrap().size(), DVec2::splat(50.0));
    }

    #[test]
    fn test_rotate_handle_quarter_turn() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let knob = h.screen_box().rotate_handle;
        let center = h.graph.global_position(id);
        assert_eq!(h.down(knob), EventFlow::Stop);

        // knob is straight below the centre; dragging it to the left of the
        // centre sweeps a quarter turn clockwise on screen
        let radius = knob.distance(center);
        h.drag(center - DVec2::new(radius, 0.0));
        h.up();

        let angle = h.graph.get(id).unwrap().angle();
        assert!((angle - 90.0).abs() < 1e-6, "angle {angle}");
    }

    #[test]
    fn test_rotation_stays_in_range() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 350.0);
        h.with(|c, ctx| c.select(ctx, id));

        let knob = h.screen_box().rotate_handle;
        let center = h.graph.global_position(id);
        h.down(knob);
        for step in 0..24 {
            let a = step as f64 * 0.4;
            h.drag(center + DVec2::new(a.sin(), a.cos()) * 40.0);
            let angle = h.graph.get(id).unwrap().angle();
            assert!((0.0..360.0).contains(&angle), "angle {angle}");
        }
    }

    #[test]
    fn test_public_resize_and_rotate() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| {
            c.resize_selected(ctx, 10.0, 10.0);
            c.select(ctx, id);
            c.resize_selected(ctx, 300.0, 150.0);
            c.rotate_selected(ctx, -45.0);
        });
        let node = h.graph.get(id).unwrap();
        assert_close(node.size(), DVec2::new(300.0, 150.0));
        assert!((node.angle() - 315.0).abs() < EPS);
    }

    #[test]
    fn test_delete_selected() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));
        let removed = h.with(|c, ctx| c.delete_selected(ctx));
        assert_eq!(removed, Some(id));
        assert!(!h.graph.contains(id));
        assert_eq!(h.controller.selected(), None);
    }

    #[test]
    fn test_hover_cursor_over_handles() {
        let mut h = Harness::new();
        let id = h.add_sprite(DVec2::ZERO, 0.0);
        h.with(|c, ctx| c.select(ctx, id));

        let top_left = h.screen_box().handles[0];
        h.drag(top_left);
        assert_eq!(h.controller.cursor(), "nw-resize");
        let knob = h.screen_box().rotate_handle;
        h.drag(knob);
        assert_eq!(h.controller.cursor(), "grab");
        h.drag(h.graph.global_position(id));
        assert_eq!(h.controller.cursor(), "move");
    }
}
