//! JSON save format for the canvas content.
//!
//! ```json
//! { "version": "1.0.0",
//!   "element": { "type": "Container", "x": 0, "y": 0,
//!                "originWidth": 0, "originHeight": 0,
//!                "children": [ ... ] } }
//! ```

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::scene::{AssetMetadata, Node, NodeId, NodeKind, SceneGraph, TextMeasure, TextStyle, Texture};

pub const FORMAT_VERSION: &str = "1.0.0";

/// Bundled sample scene loaded at startup
pub const MOCK_SCENE: &str = include_str!("../assets/mock_scene.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub element: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRecord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    Static,
    None,
}

/// Type specific payload: text content and style, or the sprite's source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Properties {
    Text { text: String, style: TextStyle },
    Sprite(AssetMetadata),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub origin_width: f64,
    #[serde(default)]
    pub origin_height: f64,
    /// Radians
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_mode: Option<EventMode>,
    /// Normalized pivot; omitted at the default (0, 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ScaleRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Serialize the subtree rooted at `root`. Graphics nodes are skipped;
/// asking for a Graphics root is an error.
pub fn serialize(graph: &SceneGraph, root: NodeId) -> Result<Document> {
    let element = serialize_element(graph, root)
        .ok_or_else(|| EditorError::Serialize(format!("node {} cannot be serialized", root.index())))?;
    Ok(Document {
        version: FORMAT_VERSION.to_string(),
        element,
    })
}

fn serialize_element(graph: &SceneGraph, id: NodeId) -> Option<Element> {
    let node = graph.get(id)?;
    let properties = match &node.kind {
        NodeKind::Graphics { .. } => return None,
        NodeKind::Container => None,
        NodeKind::Sprite { texture } => Some(Properties::Sprite(
            node.metadata.clone().unwrap_or_else(|| AssetMetadata {
                url: Some(texture.url.clone()),
                hash: None,
            }),
        )),
        NodeKind::Text { text, style, .. } => Some(Properties::Text {
            text: text.clone(),
            style: style.clone(),
        }),
    };
    let origin = match node.kind {
        NodeKind::Container => graph
            .local_bounds(id)
            .map_or(DVec2::ZERO, |b| DVec2::new(b.width, b.height)),
        _ => node.intrinsic_size(),
    };

    Some(Element {
        element_type: node.kind.type_name().to_string(),
        x: node.position.x,
        y: node.position.y,
        origin_width: origin.x,
        origin_height: origin.y,
        rotation: node.rotation,
        scale: (node.scale != DVec2::ONE).then(|| ScaleRecord {
            x: node.scale.x,
            y: node.scale.y,
        }),
        alpha: (node.alpha != 1.0).then_some(node.alpha),
        visible: (!node.visible).then_some(false),
        event_mode: Some(if node.interactive {
            EventMode::Static
        } else {
            EventMode::None
        }),
        anchor: (node.anchor != DVec2::ZERO).then(|| ScaleRecord {
            x: node.anchor.x,
            y: node.anchor.y,
        }),
        children: node
            .children()
            .iter()
            .filter_map(|&child| serialize_element(graph, child))
            .collect(),
        properties,
    })
}

/// Recreate `element` and its children under `parent`
pub fn deserialize(
    graph: &mut SceneGraph,
    parent: NodeId,
    element: &Element,
    measure: &dyn TextMeasure,
) -> Result<NodeId> {
    let mut node = match element.element_type.as_str() {
        "Container" => Node::container("Container"),
        "Sprite" => {
            let metadata = match &element.properties {
                Some(Properties::Sprite(metadata)) => metadata.clone(),
                _ => AssetMetadata::default(),
            };
            let texture = Texture::new(
                metadata.url.clone().unwrap_or_default(),
                element.origin_width,
                element.origin_height,
            );
            let mut node = Node::sprite("Sprite", texture);
            node.metadata = Some(metadata);
            node
        }
        "Text" => {
            let (text, style) = match &element.properties {
                Some(Properties::Text { text, style }) => (text.clone(), style.clone()),
                _ => (String::new(), TextStyle::default()),
            };
            let measured = measure.measure(&text, &style);
            Node::text(text, style, measured)
        }
        other => return Err(EditorError::UnknownElementType(other.to_string())),
    };

    node.position = DVec2::new(element.x, element.y);
    node.rotation = element.rotation;
    if let Some(scale) = element.scale {
        node.scale = DVec2::new(scale.x, scale.y);
    }
    if let Some(anchor) = element.anchor {
        node.anchor = DVec2::new(anchor.x, anchor.y);
    }
    if let Some(alpha) = element.alpha {
        node.alpha = alpha;
    }
    if let Some(visible) = element.visible {
        node.visible = visible;
    }
    node.interactive = element.event_mode == Some(EventMode::Static);

    let id = graph.add_child(parent, node);
    for child in &element.children {
        deserialize(graph, id, child, measure)?;
    }
    Ok(id)
}

pub fn to_json(graph: &SceneGraph, root: NodeId) -> Result<String> {
    Ok(serde_json::to_string(&serialize(graph, root)?)?)
}

pub fn parse_document(json: &str) -> Result<Document> {
    let document: Document = serde_json::from_str(json)?;
    if document.version != FORMAT_VERSION {
        log::warn!(
            "scene document version {} differs from {}",
            document.version,
            FORMAT_VERSION
        );
    }
    Ok(document)
}

/// Parse a saved document and rebuild it under `parent`
pub fn from_json(
    graph: &mut SceneGraph,
    parent: NodeId,
    json: &str,
    measure: &dyn TextMeasure,
) -> Result<NodeId> {
    let document = parse_document(json)?;
    deserialize(graph, parent, &document.element, measure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ApproxTextMeasure;

    fn sample_graph() -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_child(root, Node::container("group"));

        let mut sprite = Node::sprite("photo", Texture::new("blob:abc", 200.0, 100.0))
            .with_position(DVec2::new(10.0, 20.0))
            .with_scale(DVec2::new(2.0, 0.5))
            .with_anchor(DVec2::splat(0.5))
            .with_interactive(true);
        sprite.rotation = 0.75;
        sprite.alpha = 0.5;
        sprite.metadata = Some(AssetMetadata {
            url: Some("https://example.com/a.png".to_string()),
            hash: Some("deadbeef".to_string()),
        });
        let sprite = graph.add_child(group, sprite);

        let style = TextStyle {
            font_size: 32.0,
            fill: "#ff0000".to_string(),
            ..TextStyle::default()
        };
        let measured = ApproxTextMeasure.measure("Hello", &style);
        let mut text = Node::text("Hello", style, measured).with_interactive(true);
        text.visible = false;
        let text = graph.add_child(group, text);

        graph.add_child(group, Node::graphics("decoration", Vec::new()));
        (graph, group, sprite, text)
    }

    #[test]
    fn test_serialize_writes_only_non_default_fields() {
        let (graph, group, _, _) = sample_graph();
        let json = serde_json::to_value(serialize(&graph, group).unwrap()).unwrap();

        assert_eq!(json["version"], "1.0.0");
        let element = &json["element"];
        assert_eq!(element["type"], "Container");
        assert!(element.get("rotation").is_none());
        assert!(element.get("scale").is_none());
        assert!(element.get("alpha").is_none());
        assert!(element.get("visible").is_none());

        let children = element["children"].as_array().unwrap();
        // graphics node skipped
        assert_eq!(children.len(), 2);
        let sprite = &children[0];
        assert_eq!(sprite["type"], "Sprite");
        assert_eq!(sprite["originWidth"], 200.0);
        assert_eq!(sprite["scale"]["x"], 2.0);
        assert_eq!(sprite["alpha"], 0.5);
        assert_eq!(sprite["eventMode"], "static");
        assert_eq!(sprite["properties"]["hash"], "deadbeef");

        let text = &children[1];
        assert_eq!(text["visible"], false);
        assert_eq!(text["properties"]["text"], "Hello");
        assert_eq!(text["properties"]["style"]["fontSize"], 32.0);
    }

    #[test]
    fn test_round_trip_restores_transform_style_and_children() {
        let (graph, group, sprite, text) = sample_graph();
        let json = to_json(&graph, group).unwrap();

        let mut restored = SceneGraph::new();
        let root = restored.root();
        let copy = from_json(&mut restored, root, &json, &ApproxTextMeasure).unwrap();
        let children = restored.children(copy).to_vec();
        assert_eq!(children.len(), 2);

        let original = graph.get(sprite).unwrap();
        let sprite_copy = restored.get(children[0]).unwrap();
        assert_eq!(sprite_copy.position, original.position);
        assert_eq!(sprite_copy.scale, original.scale);
        assert_eq!(sprite_copy.rotation, original.rotation);
        assert_eq!(sprite_copy.anchor, original.anchor);
        assert_eq!(sprite_copy.alpha, original.alpha);
        assert_eq!(sprite_copy.intrinsic_size(), original.intrinsic_size());
        assert_eq!(sprite_copy.metadata, original.metadata);
        assert!(sprite_copy.interactive);

        let text_copy = restored.get(children[1]).unwrap();
        assert_eq!(text_copy.kind, graph.get(text).unwrap().kind);
        assert!(!text_copy.visible);
    }

    #[test]
    fn test_graphics_root_is_an_error() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let graphics = graph.add_child(root, Node::graphics("g", Vec::new()));
        assert!(matches!(serialize(&graph, graphics), Err(EditorError::Serialize(_))));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let json = r#"{"version":"1.0.0","element":{"type":"Mesh","x":0,"y":0}}"#;
        let err = from_json(&mut graph, root, json, &ApproxTextMeasure).unwrap_err();
        assert!(matches!(err, EditorError::UnknownElementType(ref t) if t == "Mesh"));
    }

    #[test]
    fn test_mock_scene_loads() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let id = from_json(&mut graph, root, MOCK_SCENE, &ApproxTextMeasure).unwrap();
        let selectable = graph
            .descendants(id)
            .into_iter()
            .filter(|&n| graph.get(n).is_some_and(Node::is_selectable))
            .count();
        assert!(selectable >= 2);
    }
}
