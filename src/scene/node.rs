use glam::{DAffine2, DVec2};

use super::types::{AssetMetadata, GraphicsShape, TextStyle, Texture};
use crate::types::BoundingBox;

/// Handle to a node stored in a [`SceneGraph`](super::SceneGraph).
/// Ids are never reused once a node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Container,
    Sprite {
        texture: Texture,
    },
    Text {
        text: String,
        style: TextStyle,
        /// Size of the laid out text, before scaling
        measured: DVec2,
    },
    Graphics {
        shapes: Vec<GraphicsShape>,
    },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Container => "Container",
            NodeKind::Sprite { .. } => "Sprite",
            NodeKind::Text { .. } => "Text",
            NodeKind::Graphics { .. } => "Graphics",
        }
    }
}

/// A positioned element of the scene. Transform fields follow the usual
/// retained-mode convention: the local transform is
/// translate(position) · rotate(rotation) · scale(scale), and sprites/text
/// are drawn with their anchor point at the local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub position: DVec2,
    pub scale: DVec2,
    /// Radians, clockwise on screen
    pub rotation: f64,
    /// Normalized pivot, (0,0) top-left to (1,1) bottom-right
    pub anchor: DVec2,
    pub alpha: f64,
    pub visible: bool,
    /// Whether pointer hit testing considers this node
    pub interactive: bool,
    pub cursor: Option<String>,
    /// Clip rectangle in local coordinates applied to the node's children
    pub clip: Option<BoundingBox>,
    pub metadata: Option<AssetMetadata>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: DVec2::ZERO,
            scale: DVec2::ONE,
            rotation: 0.0,
            anchor: DVec2::ZERO,
            alpha: 1.0,
            visible: true,
            interactive: false,
            cursor: None,
            clip: None,
            metadata: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Container)
    }

    pub fn sprite(name: impl Into<String>, texture: Texture) -> Self {
        Self::new(name, NodeKind::Sprite { texture })
    }

    pub fn text(text: impl Into<String>, style: TextStyle, measured: DVec2) -> Self {
        let text = text.into();
        Self::new(
            text.clone(),
            NodeKind::Text {
                text,
                style,
                measured,
            },
        )
    }

    pub fn graphics(name: impl Into<String>, shapes: Vec<GraphicsShape>) -> Self {
        Self::new(name, NodeKind::Graphics { shapes })
    }

    /// Builder method to set position
    pub fn with_position(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    /// Builder method to set scale
    pub fn with_scale(mut self, scale: DVec2) -> Self {
        self.scale = scale;
        self
    }

    /// Builder method to set anchor point
    pub fn with_anchor(mut self, anchor: DVec2) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_clip(mut self, clip: BoundingBox) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Sprites and text can be selected and transformed by the user
    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, NodeKind::Sprite { .. } | NodeKind::Text { .. })
    }

    /// Rotation in degrees
    pub fn angle(&self) -> f64 {
        self.rotation.to_degrees()
    }

    pub fn set_angle(&mut self, degrees: f64) {
        self.rotation = degrees.to_radians();
    }

    /// Unscaled size of the node's own content
    pub fn intrinsic_size(&self) -> DVec2 {
        match &self.kind {
            NodeKind::Sprite { texture } => texture.size(),
            NodeKind::Text { measured, .. } => *measured,
            NodeKind::Container | NodeKind::Graphics { .. } => DVec2::ZERO,
        }
    }

    /// Displayed size in parent units
    pub fn size(&self) -> DVec2 {
        self.intrinsic_size() * self.scale.abs()
    }

    pub fn width(&self) -> f64 {
        self.size().x
    }

    pub fn height(&self) -> f64 {
        self.size().y
    }

    /// Set the displayed width by adjusting the horizontal scale. Nodes
    /// without intrinsic content ignore the call.
    pub fn set_width(&mut self, width: f64) {
        let intrinsic = self.intrinsic_size().x;
        if intrinsic > 0.0 {
            self.scale.x = self.scale.x.signum() * width / intrinsic;
        }
    }

    pub fn set_height(&mut self, height: f64) {
        let intrinsic = self.intrinsic_size().y;
        if intrinsic > 0.0 {
            self.scale.y = self.scale.y.signum() * height / intrinsic;
        }
    }

    pub fn local_transform(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Content rectangle in local coordinates, offset by the anchor
    pub fn local_rect(&self) -> BoundingBox {
        let size = self.intrinsic_size();
        BoundingBox::new(-size.x * self.anchor.x, -size.y * self.anchor.y, size.x, size.y)
    }

    /// Move the anchor without moving the node on screen: the position is
    /// shifted to where the new anchor lands in parent space.
    pub fn change_anchor(&mut self, anchor: DVec2) {
        let offset = (anchor - self.anchor) * self.intrinsic_size();
        self.position = self.local_transform().transform_point2(offset);
        self.anchor = anchor;
    }
}

/// Measures laid out text. The browser shell measures with a canvas 2D
/// context; tests and headless use fall back to [`ApproxTextMeasure`].
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> DVec2;
}

/// Fixed advance per glyph, good enough when no rendering context exists
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMeasure;

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> DVec2 {
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines
            .iter()
            .map(|line| {
                let glyphs = line.chars().count() as f64;
                glyphs * style.font_size * 0.6 + (glyphs - 1.0).max(0.0) * style.letter_spacing
            })
            .fold(0.0, f64::max);
        let height = lines.len() as f64 * style.line_height();
        DVec2::new(widest + style.padding * 2.0, height + style.padding * 2.0)
    }
}
