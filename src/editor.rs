//! The editor core: scene graph, layer structure and the plugin list,
//! driven by normalized input from the browser shell.

use glam::DVec2;

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::file_drop::FileDrop;
use crate::plugins::{
    DragInput, EditorEvent, EventFlow, HostEffect, PluginContext, PluginManager, PointerInput, WheelInput,
};
use crate::ruler::{Ruler, RulerMarks};
use crate::scene::{
    ApproxTextMeasure, AssetMetadata, Node, NodeId, NodeKind, SceneGraph, SceneLayers, TextMeasure, TextStyle,
    Texture,
};
use crate::selection::{ControlBox, SelectionController};
use crate::serialize::{self, Document, MOCK_SCENE};
use crate::sprite_loader::{create_sprite, SpriteOptions};
use crate::types::{BoundingBox, Dimensions};
use crate::zoom::ZoomController;

/// Row of the layers panel
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub visible: bool,
    pub depth: usize,
}

pub struct Editor {
    graph: SceneGraph,
    layers: SceneLayers,
    config: EditorConfig,
    plugins: PluginManager,
    measure: Box<dyn TextMeasure>,
    events: Vec<EditorEvent>,
    effects: Vec<HostEffect>,
    /// Container holding the user's document, child of `content`
    document: NodeId,
}

impl Editor {
    pub fn new(config: EditorConfig, measure: Box<dyn TextMeasure>) -> Self {
        let mut graph = SceneGraph::new();
        let layers = SceneLayers::build(&mut graph, &config);
        let document = graph.add_child(layers.content, Node::container("Container"));
        let mut editor = Self {
            graph,
            layers,
            config,
            plugins: PluginManager::new(),
            measure,
            events: Vec::new(),
            effects: Vec::new(),
            document,
        };
        editor.run(|plugins, ctx| {
            plugins.use_plugin(Ruler::new(), ctx);
            plugins.use_plugin(FileDrop::new(), ctx);
            plugins.use_plugin(SelectionController::new(), ctx);
            plugins.use_plugin(ZoomController::new(), ctx);
            plugins.ready(ctx);
        });
        log::info!("editor ready with plugins {:?}", editor.plugins.names());
        editor
    }

    /// Editor with default settings and approximate text metrics
    pub fn headless() -> Self {
        Self::new(EditorConfig::default(), Box::new(ApproxTextMeasure))
    }

    /// Run `f` with a plugin context, then deliver whatever it emitted
    fn run<R>(&mut self, f: impl FnOnce(&mut PluginManager, &mut PluginContext) -> R) -> R {
        let Self {
            graph,
            layers,
            config,
            plugins,
            measure,
            events,
            effects,
            ..
        } = self;
        let mut ctx = PluginContext::new(graph, layers, config, &**measure, events, effects);
        let result = f(plugins, &mut ctx);
        plugins.broadcast(&mut ctx);
        result
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn layers(&self) -> &SceneLayers {
        &self.layers
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn measure(&self) -> &dyn TextMeasure {
        self.measure.as_ref()
    }

    /// Whether anything visible changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        let dirty = self.graph.is_dirty();
        self.graph.clear_dirty();
        dirty
    }

    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    // === Input ===

    pub fn pointer_down(&mut self, input: PointerInput) -> EventFlow {
        self.run(|plugins, ctx| plugins.pointer_down(ctx, &input))
    }

    pub fn pointer_move(&mut self, input: PointerInput) -> EventFlow {
        self.run(|plugins, ctx| plugins.pointer_move(ctx, &input))
    }

    pub fn pointer_up(&mut self, input: PointerInput) -> EventFlow {
        self.run(|plugins, ctx| plugins.pointer_up(ctx, &input))
    }

    pub fn wheel(&mut self, input: WheelInput) -> EventFlow {
        self.run(|plugins, ctx| plugins.wheel(ctx, &input))
    }

    pub fn drag(&mut self, input: DragInput) -> EventFlow {
        self.run(|plugins, ctx| plugins.drag(ctx, &input))
    }

    /// Keyboard shortcuts; returns whether the key was used
    pub fn key_down(&mut self, key: &str) -> bool {
        match key {
            "Delete" | "Backspace" => self.delete_selected().is_some(),
            "Escape" => {
                let had_selection = self.selected().is_some();
                self.clear_selection();
                had_selection
            }
            _ => false,
        }
    }

    pub fn resize(&mut self, screen: Dimensions) {
        if screen == self.layers.screen() {
            return;
        }
        self.layers.resize(&mut self.graph, screen);
        self.run(|_, ctx| ctx.emit(EditorEvent::ViewChanged));
    }

    // === Document ===

    /// Replace the document with the bundled sample scene
    pub fn load_mock_data(&mut self) -> Result<()> {
        self.load_content(MOCK_SCENE)
    }

    pub fn serialize_content(&self) -> Result<String> {
        serialize::to_json(&self.graph, self.document)
    }

    /// The current document as a serializable value
    pub fn snapshot(&self) -> Result<Document> {
        serialize::serialize(&self.graph, self.document)
    }

    pub fn load_content(&mut self, json: &str) -> Result<()> {
        let document = serialize::parse_document(json)?;
        self.load_document(&document)
    }

    /// Replace the document with a saved one. Sprites carrying a content
    /// hash ask the host to swap in their cached image.
    pub fn load_document(&mut self, document: &Document) -> Result<()> {
        let root_type = document.element.element_type.as_str();
        if root_type != NodeKind::Container.type_name() {
            return Err(EditorError::Serialize(format!(
                "document root must be a Container, found {root_type}"
            )));
        }
        let previous = self.document;
        let content = self.layers.content;
        let document_root =
            match serialize::deserialize(&mut self.graph, content, &document.element, self.measure.as_ref()) {
                Ok(id) => id,
                Err(err) => {
                    // drop whatever was built before the failure
                    let partial: Vec<NodeId> = self
                        .graph
                        .children(content)
                        .iter()
                        .copied()
                        .filter(|&id| id != previous)
                        .collect();
                    for id in partial {
                        self.graph.remove(id);
                    }
                    return Err(err);
                }
            };
        self.graph.remove(previous);
        self.document = document_root;

        let pending: Vec<(NodeId, String)> = self
            .graph
            .descendants(document_root)
            .into_iter()
            .filter_map(|id| {
                let node = self.graph.get(id)?;
                let hash = node.metadata.as_ref()?.hash.clone()?;
                matches!(node.kind, NodeKind::Sprite { .. }).then_some((id, hash))
            })
            .collect();
        log::info!(
            "loaded document with {} nodes",
            self.graph.descendants(document_root).len()
        );
        self.run(|_, ctx| {
            for (node, hash) in pending {
                ctx.request(HostEffect::ResolveAsset { node, hash });
            }
            ctx.emit(EditorEvent::ContentReplaced);
        });
        Ok(())
    }

    /// Map a stage point into document coordinates
    pub fn to_document(&self, stage_point: DVec2) -> DVec2 {
        self.graph.to_local(self.document, stage_point)
    }

    /// Insert a decoded sprite under `parent`
    pub fn add_sprite(
        &mut self,
        parent: NodeId,
        texture: Texture,
        options: &SpriteOptions,
        metadata: AssetMetadata,
    ) -> NodeId {
        let parent = if self.graph.contains(parent) { parent } else { self.document };
        let id = create_sprite(&mut self.graph, parent, texture, options, metadata);
        self.run(|_, ctx| ctx.emit(EditorEvent::SpritesInserted(vec![id])));
        id
    }

    /// Add an editable text node at the centre of the page and select it
    pub fn add_text(&mut self, text: &str) -> NodeId {
        let style = TextStyle::default();
        let measured = self.measure.measure(text, &style);
        let mut node = Node::text(text, style, measured)
            .with_anchor(DVec2::splat(0.5))
            .with_interactive(true);
        node.cursor = Some("pointer".to_string());
        let id = self.graph.add_child(self.document, node);
        self.select(id);
        id
    }

    /// Point the sprite at a new image url, keeping its size and metadata
    pub fn set_texture_url(&mut self, id: NodeId, url: &str) -> Result<()> {
        let node = self.graph.get_mut(id).ok_or(EditorError::InvalidNode(id.index()))?;
        match &mut node.kind {
            NodeKind::Sprite { texture } => {
                texture.url = url.to_string();
                Ok(())
            }
            _ => Err(EditorError::InvalidNode(id.index())),
        }
    }

    /// Topmost selectable node under a stage point
    pub fn node_at(&self, stage_point: DVec2) -> Option<NodeId> {
        self.graph.hit_test(self.layers.stage, stage_point)
    }

    pub fn text_at(&self, id: NodeId) -> Option<(&str, &TextStyle)> {
        match &self.graph.get(id)?.kind {
            NodeKind::Text { text, style, .. } => Some((text.as_str(), style)),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        self.graph.set_text(id, value, self.measure.as_ref());
        self.run(|_, ctx| ctx.emit(EditorEvent::NodeTransformed(id)));
    }

    /// Screen-space bounding box of a node
    pub fn screen_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.graph.world_corners(id)?)
    }

    /// Selectable document nodes in draw order, for the layers panel
    pub fn content_nodes(&self) -> Vec<LayerEntry> {
        self.graph
            .descendants(self.document)
            .into_iter()
            .filter_map(|id| {
                let node = self.graph.get(id)?;
                if !node.is_selectable() {
                    return None;
                }
                let mut depth = 0;
                let mut parent = node.parent();
                while let Some(p) = parent.filter(|&p| p != self.document) {
                    depth += 1;
                    parent = self.graph.parent(p);
                }
                Some(LayerEntry {
                    id,
                    name: node.name.clone(),
                    kind: node.kind.type_name(),
                    visible: node.visible,
                    depth,
                })
            })
            .collect()
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.graph.get_mut(id) {
            node.visible = visible;
        }
        if !visible && self.selected() == Some(id) {
            self.clear_selection();
        }
    }

    pub fn bring_to_front(&mut self, id: NodeId) {
        self.graph.bring_to_front(id);
    }

    pub fn send_to_back(&mut self, id: NodeId) {
        self.graph.send_to_back(id);
    }

    // === Selection ===

    pub fn selected(&self) -> Option<NodeId> {
        self.plugins.get::<SelectionController>()?.selected()
    }

    pub fn select(&mut self, id: NodeId) {
        self.run(|plugins, ctx| plugins.with_plugin::<SelectionController, _>(ctx, |s, ctx| s.select(ctx, id)));
    }

    pub fn clear_selection(&mut self) {
        self.run(|plugins, ctx| {
            plugins.with_plugin::<SelectionController, _>(ctx, |s, ctx| s.clear_selection(ctx))
        });
    }

    pub fn delete_selected(&mut self) -> Option<NodeId> {
        self.run(|plugins, ctx| {
            plugins
                .with_plugin::<SelectionController, _>(ctx, |s, ctx| s.delete_selected(ctx))
                .flatten()
        })
    }

    pub fn resize_selected(&mut self, width: f64, height: f64) {
        self.run(|plugins, ctx| {
            plugins.with_plugin::<SelectionController, _>(ctx, |s, ctx| s.resize_selected(ctx, width, height))
        });
    }

    pub fn rotate_selected(&mut self, angle: f64) {
        self.run(|plugins, ctx| {
            plugins.with_plugin::<SelectionController, _>(ctx, |s, ctx| s.rotate_selected(ctx, angle))
        });
    }

    pub fn control_box(&self) -> Option<ControlBox> {
        self.plugins
            .get::<SelectionController>()?
            .control_box(&self.graph, &self.layers)
    }

    /// Cursor for the stage element
    pub fn cursor(&self) -> &'static str {
        self.plugins
            .get::<SelectionController>()
            .map_or("default", |s| s.cursor())
    }

    // === View ===

    pub fn zoom(&self) -> f64 {
        self.plugins
            .get::<ZoomController>()
            .map_or(1.0, |z| z.current_zoom())
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.run(|plugins, ctx| plugins.with_plugin::<ZoomController, _>(ctx, |z, ctx| z.set_zoom(ctx, zoom)));
    }

    pub fn reset_view(&mut self) {
        self.run(|plugins, ctx| plugins.with_plugin::<ZoomController, _>(ctx, |z, ctx| z.reset(ctx)));
    }

    pub fn ruler_marks(&self) -> RulerMarks {
        self.plugins
            .get::<Ruler>()
            .map(|r| r.marks().clone())
            .unwrap_or_default()
    }

    pub fn ruler_thickness(&self) -> f64 {
        self.config.ruler.thickness
    }

    /// Whether a file drag is hovering the canvas
    pub fn drop_active(&self) -> bool {
        self.plugins.get::<FileDrop>().is_some_and(|f| f.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::DroppedFile;

    fn image(editor: &mut Editor, at: DVec2) -> NodeId {
        let document = editor.document();
        editor.add_sprite(
            document,
            Texture::new("blob:test", 100.0, 80.0),
            &SpriteOptions::centered_at(at),
            AssetMetadata {
                url: Some("blob:test".to_string()),
                hash: Some("abc".to_string()),
            },
        )
    }

    #[test]
    fn test_plugins_registered_in_order() {
        let editor = Editor::headless();
        assert_eq!(
            editor.plugins().names(),
            vec!["ruler", "file-drop", "selection-controller", "zoom-controller"]
        );
        assert!(!editor.ruler_marks().horizontal.is_empty());
    }

    #[test]
    fn test_click_selects_and_escape_clears() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::ZERO);
        let center = editor.graph().global_position(id);

        editor.pointer_down(PointerInput::at(center.x, center.y));
        editor.pointer_up(PointerInput::at(center.x, center.y));
        assert_eq!(editor.selected(), Some(id));
        assert!(editor.control_box().is_some());

        assert!(editor.key_down("Escape"));
        assert_eq!(editor.selected(), None);
        assert!(!editor.key_down("Escape"));
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::ZERO);
        editor.select(id);
        assert!(editor.key_down("Delete"));
        assert!(!editor.graph().contains(id));
        assert!(editor.content_nodes().is_empty());
    }

    #[test]
    fn test_mock_data_and_save_round_trip() {
        let mut editor = Editor::headless();
        editor.load_mock_data().unwrap();
        let nodes = editor.content_nodes();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().any(|n| n.kind == "Text"));

        let saved = editor.serialize_content().unwrap();
        editor.load_content(&saved).unwrap();
        assert_eq!(editor.content_nodes().len(), 3);
        assert_eq!(editor.serialize_content().unwrap(), saved);
    }

    #[test]
    fn test_snapshot_restores_document() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::new(40.0, 10.0));
        let snapshot = editor.snapshot().unwrap();
        editor.delete_selected();
        editor.select(id);
        editor.delete_selected();
        assert!(editor.content_nodes().is_empty());
        editor.take_effects();

        editor.load_document(&snapshot).unwrap();
        let nodes = editor.content_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(editor.snapshot().unwrap(), snapshot);
        assert!(matches!(
            editor.take_effects().as_slice(),
            [HostEffect::ResolveAsset { hash, .. }] if hash == "abc"
        ));
    }

    #[test]
    fn test_loading_clears_stale_selection_and_requests_assets() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::ZERO);
        editor.select(id);
        let saved = editor.serialize_content().unwrap();
        editor.take_effects();

        editor.load_content(&saved).unwrap();
        assert_eq!(editor.selected(), None);
        let effects = editor.take_effects();
        assert_eq!(effects.len(), 1);
        match &effects[0] {
            HostEffect::ResolveAsset { node, hash } => {
                assert_eq!(hash, "abc");
                assert!(editor.graph().contains(*node));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_bad_document_keeps_current_content() {
        let mut editor = Editor::headless();
        image(&mut editor, DVec2::ZERO);
        assert!(editor.load_content("{not json").is_err());
        assert!(editor
            .load_content(r#"{"version":"1.0.0","element":{"type":"Mesh","x":0,"y":0}}"#)
            .is_err());
        assert_eq!(editor.content_nodes().len(), 1);
    }

    #[test]
    fn test_document_root_must_be_a_container() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::ZERO);
        let document = editor.document();
        let sprite_root = r#"{"version":"1.0.0","element":{"type":"Sprite","x":0,"y":0,"originWidth":10,"originHeight":10}}"#;
        match editor.load_content(sprite_root) {
            Err(EditorError::Serialize(message)) => assert!(message.contains("Container")),
            other => panic!("sprite root accepted: {other:?}"),
        }

        assert_eq!(editor.document(), document);
        assert!(editor.graph().contains(id));
        let text = editor.add_text("hi");
        assert_eq!(editor.graph().parent(text), Some(document));
        assert_eq!(editor.content_nodes().len(), 2);
    }

    #[test]
    fn test_drop_requests_import_at_point() {
        let mut editor = Editor::headless();
        editor.drag(DragInput::Enter);
        assert!(editor.drop_active());
        editor.drag(DragInput::Drop {
            position: DVec2::new(410.0, 310.0),
            files: vec![DroppedFile {
                index: 0,
                name: "cat.png".to_string(),
                mime: "image/png".to_string(),
                size: 2048,
            }],
        });
        assert!(!editor.drop_active());
        let effects = editor.take_effects();
        assert!(matches!(
            effects.as_slice(),
            [HostEffect::ImportFiles { files, .. }] if files.len() == 1
        ));
    }

    #[test]
    fn test_sprite_lands_under_drop_point() {
        let mut editor = Editor::headless();
        let drop_point = DVec2::new(300.0, 250.0);
        let at = editor.to_document(drop_point);
        let id = image(&mut editor, at);
        let landed = editor.graph().global_position(id);
        assert!(landed.distance(drop_point) < 1e-9);
    }

    #[test]
    fn test_text_editing() {
        let mut editor = Editor::headless();
        let id = editor.add_text("Hi");
        assert_eq!(editor.selected(), Some(id));
        let before = editor.graph().get(id).unwrap().width();
        editor.set_text(id, "Hello there");
        assert_eq!(editor.text_at(id).map(|(t, _)| t), Some("Hello there"));
        assert!(editor.graph().get(id).unwrap().width() > before);

        let bounds = editor.screen_bounds(id).unwrap();
        assert_eq!(editor.node_at(bounds.center()), Some(id));
        assert_eq!(editor.node_at(DVec2::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_texture_url_swap() {
        let mut editor = Editor::headless();
        let id = image(&mut editor, DVec2::ZERO);
        editor.set_texture_url(id, "blob:cached").unwrap();
        match &editor.graph().get(id).unwrap().kind {
            NodeKind::Sprite { texture } => {
                assert_eq!(texture.url, "blob:cached");
                assert_eq!(texture.size(), DVec2::new(100.0, 80.0));
            }
            _ => unreachable!(),
        }
        let text = editor.add_text("t");
        assert!(editor.set_texture_url(text, "x").is_err());
    }

    #[test]
    fn test_view_controls() {
        let mut editor = Editor::headless();
        editor.set_zoom(2.0);
        assert_eq!(editor.zoom(), 2.0);
        editor.reset_view();
        assert_eq!(editor.zoom(), 1.0);

        let before = editor.ruler_marks();
        editor.resize(Dimensions::new(1024.0, 768.0));
        assert_ne!(editor.ruler_marks(), before);
    }
}
