//! Creates sprite nodes from image urls.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen_futures::JsFuture;

use crate::editor::Editor;
use crate::error::{EditorError, Result};
use crate::scene::{AssetMetadata, Node, NodeId, SceneGraph, Texture};

/// Initial placement of a new sprite. `width`/`height` override the
/// natural image size through the scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteOptions {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub anchor: DVec2,
    pub scale: DVec2,
    pub alpha: f64,
    pub interactive: bool,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            anchor: DVec2::ZERO,
            scale: DVec2::ONE,
            alpha: 1.0,
            interactive: false,
        }
    }
}

impl SpriteOptions {
    /// Centre-anchored, selectable sprite at `position`
    pub fn centered_at(position: DVec2) -> Self {
        Self {
            x: position.x,
            y: position.y,
            anchor: DVec2::splat(0.5),
            interactive: true,
            ..Self::default()
        }
    }
}

pub fn apply_sprite_options(node: &mut Node, options: &SpriteOptions) {
    node.position = DVec2::new(options.x, options.y);
    node.anchor = options.anchor;
    node.scale = options.scale;
    node.alpha = options.alpha;
    node.interactive = options.interactive;
    node.cursor = Some(if options.interactive { "pointer" } else { "default" }.to_string());
    if let Some(width) = options.width {
        node.set_width(width);
    }
    if let Some(height) = options.height {
        node.set_height(height);
    }
}

pub fn create_sprite(
    graph: &mut SceneGraph,
    parent: NodeId,
    texture: Texture,
    options: &SpriteOptions,
    metadata: AssetMetadata,
) -> NodeId {
    let mut node = Node::sprite("Sprite", texture);
    apply_sprite_options(&mut node, options);
    node.metadata = Some(metadata);
    graph.add_child(parent, node)
}

/// Detach and drop a sprite together with anything below it
pub fn remove_sprite(graph: &mut SceneGraph, id: NodeId) -> bool {
    graph.remove(id).is_some()
}

/// Wait for the browser to decode `url` and report its natural size
pub async fn decode_image(url: &str) -> Result<Texture> {
    let image = web_sys::HtmlImageElement::new()?;
    image.set_src(url);
    JsFuture::from(image.decode())
        .await
        .map_err(|err| EditorError::ImageDecode {
            url: url.to_string(),
            reason: EditorError::from(err).to_string(),
        })?;
    Ok(Texture::new(
        url,
        f64::from(image.natural_width()),
        f64::from(image.natural_height()),
    ))
}

/// One sprite to load: where the image comes from and where it goes
#[derive(Debug, Clone)]
pub struct SpriteRequest {
    pub url: String,
    pub hash: Option<String>,
    pub options: SpriteOptions,
    pub parent: NodeId,
}

/// Decode the image, then insert the sprite into the editor's scene
pub async fn load_sprite(editor: &Rc<RefCell<Editor>>, request: SpriteRequest) -> Result<NodeId> {
    let texture = match decode_image(&request.url).await {
        Ok(texture) => texture,
        Err(err) => {
            log::error!("failed to load sprite: {err}");
            return Err(err);
        }
    };
    let metadata = AssetMetadata {
        url: Some(request.url),
        hash: request.hash,
    };
    let id = editor
        .borrow_mut()
        .add_sprite(request.parent, texture, &request.options, metadata);
    Ok(id)
}

/// Load sprites one after another, stopping at the first failure
pub async fn load_multiple_sprites(
    editor: &Rc<RefCell<Editor>>,
    requests: Vec<SpriteRequest>,
) -> Result<Vec<NodeId>> {
    let mut ids = Vec::with_capacity(requests.len());
    for request in requests {
        ids.push(load_sprite(editor, request).await?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_apply_to_node() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let options = SpriteOptions {
            x: 10.0,
            y: 20.0,
            width: Some(50.0),
            alpha: 0.5,
            interactive: true,
            ..SpriteOptions::default()
        };
        let id = create_sprite(
            &mut graph,
            root,
            Texture::new("a.png", 200.0, 100.0),
            &options,
            AssetMetadata::default(),
        );
        let node = graph.get(id).unwrap();
        assert_eq!(node.position, DVec2::new(10.0, 20.0));
        assert_eq!(node.width(), 50.0);
        assert_eq!(node.height(), 100.0);
        assert_eq!(node.alpha, 0.5);
        assert!(node.interactive);
        assert_eq!(node.cursor.as_deref(), Some("pointer"));
        assert_eq!(graph.parent(id), Some(root));
    }

    #[test]
    fn test_defaults_are_inert() {
        let mut node = Node::sprite("s", Texture::new("b.png", 10.0, 10.0));
        apply_sprite_options(&mut node, &SpriteOptions::default());
        assert!(!node.interactive);
        assert_eq!(node.cursor.as_deref(), Some("default"));
        assert_eq!(node.anchor, DVec2::ZERO);
        assert_eq!(node.scale, DVec2::ONE);
    }

    #[test]
    fn test_centered_options() {
        let options = SpriteOptions::centered_at(DVec2::new(3.0, 4.0));
        assert_eq!(options.anchor, DVec2::splat(0.5));
        assert!(options.interactive);
        assert_eq!((options.x, options.y), (3.0, 4.0));
    }

    #[test]
    fn test_remove_sprite() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let id = create_sprite(
            &mut graph,
            root,
            Texture::new("c.png", 1.0, 1.0),
            &SpriteOptions::default(),
            AssetMetadata::default(),
        );
        assert!(remove_sprite(&mut graph, id));
        assert!(!graph.contains(id));
        assert!(!remove_sprite(&mut graph, id));
    }
}
