use glam::DVec2;

use super::graph::SceneGraph;
use super::node::{Node, NodeId, NodeKind};
use super::types::{Color, GraphicsShape, ShapeStyle, StrokeStyle};
use crate::config::EditorConfig;
use crate::geometry::compute_view_size;
use crate::types::{BoundingBox, Dimensions};

/// Spread of the page drop shadow, in view units
const SHADOW_SPREAD: f64 = 25.0;

/// The fixed container structure of the workspace.
///
/// ```text
/// stage
/// ├── bottomLayer
/// └── backgroundZone          centred in the area right of / below the rulers
///     ├── backgroundGraphic
///     └── mainZone            scale = zoom, position = pan
///         ├── shadow
///         ├── canvasZone      scale = view / design, clipped to the page
///         │   ├── pageGraphic
///         │   └── content     user nodes live here
///         └── topLayer        same scale as canvasZone
/// ```
#[derive(Debug, Clone)]
pub struct SceneLayers {
    pub stage: NodeId,
    pub bottom_layer: NodeId,
    pub background_zone: NodeId,
    pub background_graphic: NodeId,
    pub main_zone: NodeId,
    pub shadow: NodeId,
    pub canvas_zone: NodeId,
    pub page_graphic: NodeId,
    pub content: NodeId,
    pub top_layer: NodeId,
    screen: Dimensions,
    design: Dimensions,
    view: Dimensions,
    ruler_thickness: f64,
    padding: f64,
    colors: LayerColors,
}

#[derive(Debug, Clone, Copy)]
struct LayerColors {
    workspace: Color,
    page: Color,
    page_border: Color,
    shadow: Color,
}

impl LayerColors {
    fn from_config(config: &EditorConfig) -> Self {
        let parse = |hex: &str, fallback: u32| {
            Color::from_hex(hex).unwrap_or_else(|| {
                log::warn!("invalid color {hex:?}, using default");
                Color::from_rgb_u32(fallback)
            })
        };
        Self {
            workspace: parse(&config.colors.workspace, 0xcccccc),
            page: parse(&config.colors.page, 0xffffff),
            page_border: parse(&config.colors.page_border, 0xffbb66),
            shadow: parse(&config.colors.shadow, 0x808080),
        }
    }
}

impl SceneLayers {
    pub fn build(graph: &mut SceneGraph, config: &EditorConfig) -> Self {
        let stage = graph.root();
        let bottom_layer = graph.add_child(stage, Node::container("bottomLayer"));
        let background_zone = graph.add_child(stage, Node::container("backgroundZone"));
        let background_graphic =
            graph.add_child(background_zone, Node::graphics("backgroundGraphic", Vec::new()));
        let main_zone = graph.add_child(background_zone, Node::container("mainZone"));
        let shadow = graph.add_child(main_zone, Node::graphics("shadow", Vec::new()));
        let canvas_zone = graph.add_child(main_zone, Node::container("canvasZone"));
        let page_graphic = graph.add_child(canvas_zone, Node::graphics("pageGraphic", Vec::new()));
        let content = graph.add_child(canvas_zone, Node::container("content"));
        let top_layer = graph.add_child(main_zone, Node::container("topLayer"));

        let mut layers = Self {
            stage,
            bottom_layer,
            background_zone,
            background_graphic,
            main_zone,
            shadow,
            canvas_zone,
            page_graphic,
            content,
            top_layer,
            screen: config.screen,
            design: config.design,
            view: config.design,
            ruler_thickness: config.ruler.thickness,
            padding: config.padding,
            colors: LayerColors::from_config(config),
        };
        layers.layout(graph);
        log::debug!(
            "scene layers built: view {:.0}x{:.0} for design {:.0}x{:.0}",
            layers.view.width,
            layers.view.height,
            layers.design.width,
            layers.design.height
        );
        layers
    }

    pub fn screen(&self) -> Dimensions {
        self.screen
    }

    pub fn design(&self) -> Dimensions {
        self.design
    }

    /// On-screen size of the page at zoom 1
    pub fn view(&self) -> Dimensions {
        self.view
    }

    /// Workspace left after the rulers are drawn
    pub fn remaining(&self) -> Dimensions {
        Dimensions::new(
            (self.screen.width - self.ruler_thickness).max(0.0),
            (self.screen.height - self.ruler_thickness).max(0.0),
        )
    }

    /// Stage position of the workspace centre
    pub fn workspace_center(&self) -> DVec2 {
        let remaining = self.remaining();
        DVec2::new(
            self.ruler_thickness + remaining.width / 2.0,
            self.ruler_thickness + remaining.height / 2.0,
        )
    }

    /// Page rectangle in canvasZone coordinates
    pub fn page_rect(&self) -> BoundingBox {
        BoundingBox::centered(self.design.width, self.design.height)
    }

    /// Re-centre the workspace for a new screen size and rebuild the
    /// backdrop graphics
    pub fn resize(&mut self, graph: &mut SceneGraph, screen: Dimensions) {
        self.screen = screen;
        self.layout(graph);
    }

    pub fn zoom(&self, graph: &SceneGraph) -> f64 {
        graph.get(self.main_zone).map_or(1.0, |n| n.scale.x)
    }

    fn layout(&mut self, graph: &mut SceneGraph) {
        let remaining = self.remaining();
        self.view = compute_view_size(remaining, self.design, self.padding);
        let view_scale = DVec2::new(
            self.view.width / self.design.width.max(f64::EPSILON),
            self.view.height / self.design.height.max(f64::EPSILON),
        );
        let workspace = BoundingBox::centered(remaining.width, remaining.height);
        let page = self.page_rect();
        let view_rect = BoundingBox::centered(self.view.width, self.view.height);
        let colors = self.colors;

        if let Some(zone) = graph.get_mut(self.background_zone) {
            zone.position = self.workspace_center();
            zone.clip = Some(workspace);
        }
        if let Some(node) = graph.get_mut(self.background_graphic) {
            node.kind = NodeKind::Graphics {
                shapes: vec![
                    GraphicsShape::Rect {
                        rect: workspace,
                        style: ShapeStyle::fill_only(colors.workspace),
                    },
                    GraphicsShape::Circle {
                        center: DVec2::ZERO,
                        radius: 3.0,
                        style: ShapeStyle::fill_only(colors.workspace),
                    },
                ],
            };
        }
        if let Some(node) = graph.get_mut(self.shadow) {
            node.kind = NodeKind::Graphics {
                shapes: vec![GraphicsShape::Shadow {
                    rect: view_rect,
                    spread: SHADOW_SPREAD,
                    color: colors.shadow.with_alpha(0.5),
                }],
            };
        }
        if let Some(zone) = graph.get_mut(self.canvas_zone) {
            zone.scale = view_scale;
            zone.clip = Some(page);
        }
        if let Some(node) = graph.get_mut(self.page_graphic) {
            node.kind = NodeKind::Graphics {
                shapes: vec![GraphicsShape::Rect {
                    rect: page,
                    style: ShapeStyle::fill_and_stroke(
                        colors.page,
                        StrokeStyle::new(colors.page_border, 2.0),
                    ),
                }],
            };
        }
        if let Some(layer) = graph.get_mut(self.top_layer) {
            layer.scale = view_scale;
        }
    }
}
