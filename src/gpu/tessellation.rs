use crate::gpu::vertex::{Mesh, Vertex};
use crate::scene::{Color, GraphicsShape, NodeId, NodeKind, SceneGraph, ShapeStyle};
use crate::types::BoundingBox;
use glam::{DAffine2, DVec2};
use lyon::geom::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, StrokeOptions, StrokeTessellator,
    StrokeVertex, VertexBuffers,
};

/// Number of stacked rectangles used to fake a blurred shadow
const SHADOW_LAYERS: usize = 8;

/// Cubic bezier control distance for a quarter circle
const KAPPA: f64 = 0.5522847498;

/// Converts the scene's `Graphics` nodes to stage-space triangles
pub struct Tessellator {
    fill_tessellator: FillTessellator,
    stroke_tessellator: StrokeTessellator,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self {
            fill_tessellator: FillTessellator::new(),
            stroke_tessellator: StrokeTessellator::new(),
        }
    }

    /// Tessellate every visible Graphics node in draw order
    pub fn tessellate_scene(&mut self, graph: &SceneGraph) -> Mesh {
        let mut mesh = Mesh::new();
        self.tessellate_subtree(graph, graph.root(), 1.0, &mut mesh);
        mesh
    }

    fn tessellate_subtree(&mut self, graph: &SceneGraph, id: NodeId, parent_alpha: f32, mesh: &mut Mesh) {
        let Some(node) = graph.get(id) else { return };
        if !node.visible {
            return;
        }
        let alpha = parent_alpha * node.alpha as f32;
        if let NodeKind::Graphics { shapes } = &node.kind {
            let transform = graph.world_transform(id);
            for shape in shapes {
                let shape_mesh = self.tessellate_shape(shape, &transform, alpha);
                mesh.append(shape_mesh);
            }
        }
        for &child in node.children() {
            self.tessellate_subtree(graph, child, alpha, mesh);
        }
    }

    /// Tessellate one shape placed by `transform`, faded by `alpha`
    pub fn tessellate_shape(&mut self, shape: &GraphicsShape, transform: &DAffine2, alpha: f32) -> Mesh {
        let mut mesh = Mesh::new();
        match shape {
            GraphicsShape::Rect { rect, style } => {
                let path = rect_path(rect, transform);
                self.paint(&path, style, transform, alpha, &mut mesh);
            }
            GraphicsShape::Circle { center, radius, style } => {
                let path = circle_path(*center, *radius, transform);
                self.paint(&path, style, transform, alpha, &mut mesh);
            }
            GraphicsShape::Shadow { rect, spread, color } => {
                // outermost first so the inner layers stack up towards the rect
                let layer_color = color.with_alpha(color.a / SHADOW_LAYERS as f32);
                for i in (1..=SHADOW_LAYERS).rev() {
                    let grow = spread * i as f64 / SHADOW_LAYERS as f64;
                    let path = rect_path(&rect.expand(grow), transform);
                    if let Some(layer) = self.fill(&path, faded(layer_color, alpha)) {
                        mesh.append(layer);
                    }
                }
            }
        }
        mesh
    }

    fn paint(&mut self, path: &Path, style: &ShapeStyle, transform: &DAffine2, alpha: f32, mesh: &mut Mesh) {
        if let Some(fill) = style.fill {
            if let Some(fill_mesh) = self.fill(path, faded(fill, alpha)) {
                mesh.append(fill_mesh);
            }
        }
        if let Some(stroke) = style.stroke {
            // stroke widths are given in local units
            let scale = transform.matrix2.x_axis.length() as f32;
            if let Some(stroke_mesh) = self.stroke(path, faded(stroke.color, alpha), stroke.width * scale) {
                mesh.append(stroke_mesh);
            }
        }
    }

    fn fill(&mut self, path: &Path, color: Color) -> Option<Mesh> {
        let mut buffers: VertexBuffers<Vertex, u32> = VertexBuffers::new();
        let color_arr = color.to_array();

        let result = self.fill_tessellator.tessellate_path(
            path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| Vertex {
                position: [vertex.position().x, vertex.position().y],
                color: color_arr,
            }),
        );

        if let Err(err) = result {
            log::warn!("fill tessellation failed: {err:?}");
            return None;
        }
        Some(Mesh {
            vertices: buffers.vertices,
            indices: buffers.indices,
        })
    }

    fn stroke(&mut self, path: &Path, color: Color, width: f32) -> Option<Mesh> {
        if width <= 0.0 {
            return None;
        }
        let mut buffers: VertexBuffers<Vertex, u32> = VertexBuffers::new();
        let color_arr = color.to_array();

        let result = self.stroke_tessellator.tessellate_path(
            path,
            &StrokeOptions::default().with_line_width(width),
            &mut BuffersBuilder::new(&mut buffers, |vertex: StrokeVertex| Vertex {
                position: [vertex.position().x, vertex.position().y],
                color: color_arr,
            }),
        );

        if let Err(err) = result {
            log::warn!("stroke tessellation failed: {err:?}");
            return None;
        }
        Some(Mesh {
            vertices: buffers.vertices,
            indices: buffers.indices,
        })
    }
}

fn faded(color: Color, alpha: f32) -> Color {
    color.with_alpha(color.a * alpha)
}

fn to_point(transform: &DAffine2, p: DVec2) -> lyon::math::Point {
    let p = transform.transform_point2(p);
    point(p.x as f32, p.y as f32)
}

fn rect_path(rect: &BoundingBox, transform: &DAffine2) -> Path {
    let corners = rect.corners();
    let mut builder = Path::builder();
    builder.begin(to_point(transform, corners[0]));
    for corner in &corners[1..] {
        builder.line_to(to_point(transform, *corner));
    }
    builder.close();
    builder.build()
}

/// Four cubic arcs; a non-uniform transform turns the circle into an ellipse
fn circle_path(center: DVec2, radius: f64, transform: &DAffine2) -> Path {
    let r = radius;
    let k = radius * KAPPA;
    let at = |x: f64, y: f64| to_point(transform, center + DVec2::new(x, y));

    let mut builder = Path::builder();
    builder.begin(at(r, 0.0));
    builder.cubic_bezier_to(at(r, k), at(k, r), at(0.0, r));
    builder.cubic_bezier_to(at(-k, r), at(-r, k), at(-r, 0.0));
    builder.cubic_bezier_to(at(-r, -k), at(-k, -r), at(0.0, -r));
    builder.cubic_bezier_to(at(k, -r), at(r, -k), at(r, 0.0));
    builder.close();
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::scene::{Node, SceneLayers, StrokeStyle};

    fn bounds(mesh: &Mesh) -> BoundingBox {
        let points: Vec<DVec2> = mesh
            .vertices
            .iter()
            .map(|v| DVec2::new(v.position[0] as f64, v.position[1] as f64))
            .collect();
        BoundingBox::from_points(&points).unwrap()
    }

    #[test]
    fn test_rect_is_placed_by_transform() {
        let mut tessellator = Tessellator::new();
        let shape = GraphicsShape::Rect {
            rect: BoundingBox::new(0.0, 0.0, 100.0, 50.0),
            style: ShapeStyle::fill_only(Color::rgb(0.0, 1.0, 0.0)),
        };
        let transform = DAffine2::from_scale_angle_translation(DVec2::splat(2.0), 0.0, DVec2::new(10.0, 20.0));
        let mesh = tessellator.tessellate_shape(&shape, &transform, 1.0);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);

        let b = bounds(&mesh);
        assert!((b.x - 10.0).abs() < 1e-3);
        assert!((b.y - 20.0).abs() < 1e-3);
        assert!((b.width - 200.0).abs() < 1e-3);
        assert!((b.height - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_circle_fill() {
        let mut tessellator = Tessellator::new();
        let shape = GraphicsShape::Circle {
            center: DVec2::new(5.0, 5.0),
            radius: 3.0,
            style: ShapeStyle::fill_only(Color::rgb(0.0, 0.0, 1.0)),
        };
        let mesh = tessellator.tessellate_shape(&shape, &DAffine2::IDENTITY, 1.0);
        let b = bounds(&mesh);
        assert!((b.center() - DVec2::new(5.0, 5.0)).length() < 1e-3);
        assert!((b.width - 6.0).abs() < 0.05);
    }

    #[test]
    fn test_stroke_adds_vertices_and_alpha_fades() {
        let mut tessellator = Tessellator::new();
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let fill_only = tessellator.tessellate_shape(
            &GraphicsShape::Rect {
                rect,
                style: ShapeStyle::fill_only(Color::white()),
            },
            &DAffine2::IDENTITY,
            1.0,
        );
        let stroked = tessellator.tessellate_shape(
            &GraphicsShape::Rect {
                rect,
                style: ShapeStyle::fill_and_stroke(Color::white(), StrokeStyle::new(Color::black(), 2.0)),
            },
            &DAffine2::IDENTITY,
            0.5,
        );
        assert!(stroked.vertices.len() > fill_only.vertices.len());
        assert!(stroked.vertices.iter().all(|v| (v.color[3] - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_shadow_layers_extend_past_rect() {
        let mut tessellator = Tessellator::new();
        let shape = GraphicsShape::Shadow {
            rect: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            spread: 10.0,
            color: Color::black().with_alpha(0.8),
        };
        let mesh = tessellator.tessellate_shape(&shape, &DAffine2::IDENTITY, 1.0);
        let b = bounds(&mesh);
        assert!((b.x + 10.0).abs() < 1e-3);
        assert!((b.width - 120.0).abs() < 1e-3);
        assert!(mesh.vertices.iter().all(|v| (v.color[3] - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_scene_skips_hidden_subtrees() {
        let mut graph = SceneGraph::new();
        let layers = SceneLayers::build(&mut graph, &EditorConfig::default());
        let mut tessellator = Tessellator::new();
        let full = tessellator.tessellate_scene(&graph);
        assert!(!full.is_empty());

        if let Some(zone) = graph.get_mut(layers.main_zone) {
            zone.visible = false;
        }
        let partial = tessellator.tessellate_scene(&graph);
        assert!(partial.vertices.len() < full.vertices.len());

        let root = graph.root();
        graph.add_child(root, Node::graphics("empty", Vec::new()));
        assert_eq!(tessellator.tessellate_scene(&graph).vertices.len(), partial.vertices.len());
    }
}
