use glam::{DAffine2, DVec2};
use yew::prelude::*;

use crate::editor::Editor;
use crate::ruler::{RulerMarks, Tick};
use crate::scene::{NodeId, NodeKind, SceneGraph, TextStyle};
use crate::selection::{ScreenControlBox, HANDLE_RADIUS};
use crate::types::{BoundingBox, HandleName};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    Image { href: String },
    Text { lines: Vec<String>, style: TextStyle },
}

/// A sprite or text node ready for SVG output, in its local frame
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub id: NodeId,
    /// Local to stage transform
    pub transform: DAffine2,
    pub rect: BoundingBox,
    pub alpha: f64,
    pub kind: DrawKind,
}

impl DrawItem {
    pub fn svg_matrix(&self) -> String {
        let m = self.transform.matrix2;
        let t = self.transform.translation;
        format!(
            "matrix({} {} {} {} {} {})",
            m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y, t.x, t.y
        )
    }
}

/// Everything the SVG layer draws, captured from the editor after an update
#[derive(Clone, Debug, PartialEq)]
pub struct StageFrame {
    pub width: f64,
    pub height: f64,
    pub items: Vec<DrawItem>,
    /// Stage area where content is visible: the page inside the workspace
    pub clip: Option<BoundingBox>,
    pub control: Option<ScreenControlBox>,
    pub rulers: RulerMarks,
    pub ruler_thickness: f64,
    pub ruler_color: String,
    pub edge_color: String,
    pub rotate_color: String,
    pub cursor: String,
    pub drop_active: bool,
}

impl StageFrame {
    /// Snapshot the editor; `hidden` is left out (the text being edited)
    pub fn capture(editor: &Editor, hidden: Option<NodeId>) -> Self {
        let graph = editor.graph();
        let layers = editor.layers();
        let screen = layers.screen();

        let mut items = Vec::new();
        collect_items(graph, editor.document(), 1.0, hidden, &mut items);

        let page = layers
            .page_rect()
            .transformed(&graph.world_transform(layers.canvas_zone));
        let workspace = graph
            .get(layers.background_zone)
            .and_then(|zone| zone.clip)
            .map(|clip| clip.transformed(&graph.world_transform(layers.background_zone)));
        let clip = match workspace {
            Some(workspace) => page.intersect(&workspace),
            None => Some(page),
        };

        let control = editor.control_box().map(|b| b.to_screen(graph, layers));
        let config = editor.config();

        Self {
            width: screen.width,
            height: screen.height,
            items,
            clip,
            control,
            rulers: editor.ruler_marks(),
            ruler_thickness: editor.ruler_thickness(),
            ruler_color: config.ruler.color.clone(),
            edge_color: config.colors.selection_edge.clone(),
            rotate_color: config.colors.rotate_handle.clone(),
            cursor: editor.cursor().to_string(),
            drop_active: editor.drop_active(),
        }
    }
}

fn collect_items(graph: &SceneGraph, id: NodeId, parent_alpha: f64, hidden: Option<NodeId>, out: &mut Vec<DrawItem>) {
    let Some(node) = graph.get(id) else { return };
    if !node.visible {
        return;
    }
    let alpha = parent_alpha * node.alpha;
    let kind = match &node.kind {
        NodeKind::Sprite { texture } => Some(DrawKind::Image {
            href: texture.url.clone(),
        }),
        NodeKind::Text { text, style, .. } => Some(DrawKind::Text {
            lines: text.split('\n').map(str::to_string).collect(),
            style: style.clone(),
        }),
        NodeKind::Container | NodeKind::Graphics { .. } => None,
    };
    if let Some(kind) = kind.filter(|_| Some(id) != hidden) {
        out.push(DrawItem {
            id,
            transform: graph.world_transform(id),
            rect: node.local_rect(),
            alpha,
            kind,
        });
    }
    for &child in node.children() {
        collect_items(graph, child, alpha, hidden, out);
    }
}

#[derive(Properties, Clone, PartialEq)]
pub struct StageProps {
    pub frame: StageFrame,
}

/// SVG layer drawn over the GPU backdrop: content, selection overlay and
/// rulers. Pointer input is handled by the surrounding element.
#[function_component(Stage)]
pub fn stage(props: &StageProps) -> Html {
    let frame = &props.frame;

    let clip_rect: Html = frame.clip.map(|clip| {
        html! {
            <clipPath id="page-clip">
                <rect
                    x={clip.x.to_string()}
                    y={clip.y.to_string()}
                    width={clip.width.to_string()}
                    height={clip.height.to_string()}
                />
            </clipPath>
        }
    }).unwrap_or_default();

    let content: Html = frame.items.iter().map(render_item).collect();

    let control = frame
        .control
        .as_ref()
        .map(|b| render_control_box(b, &frame.edge_color, &frame.rotate_color))
        .unwrap_or_default();

    let drop_highlight = if frame.drop_active {
        html! {
            <rect
                data-testid="drop-highlight"
                x="2" y="2"
                width={(frame.width - 4.0).max(0.0).to_string()}
                height={(frame.height - 4.0).max(0.0).to_string()}
                fill="rgba(13, 153, 255, 0.08)"
                stroke="#0d99ff"
                stroke-width="2"
                stroke-dasharray="6,4"
            />
        }
    } else {
        html! {}
    };

    html! {
        <svg
            style={format!("position: absolute; top: 0; left: 0; cursor: {};", frame.cursor)}
            width={frame.width.to_string()}
            height={frame.height.to_string()}
            viewBox={format!("0 0 {} {}", frame.width, frame.height)}
        >
            <defs>{clip_rect}</defs>
            <g clip-path={frame.clip.map(|_| "url(#page-clip)")}>
                {content}
            </g>
            {control}
            {render_rulers(frame)}
            {drop_highlight}
        </svg>
    }
}

fn render_item(item: &DrawItem) -> Html {
    let body = match &item.kind {
        DrawKind::Image { href } => html! {
            <image
                href={href.clone()}
                x={item.rect.x.to_string()}
                y={item.rect.y.to_string()}
                width={item.rect.width.to_string()}
                height={item.rect.height.to_string()}
                preserveAspectRatio="none"
            />
        },
        DrawKind::Text { lines, style } => {
            let line_height = style.line_height();
            let x = item.rect.x + style.padding;
            html! {
                <text
                    font-family={style.font_family.clone()}
                    font-size={style.font_size.to_string()}
                    font-style={style.font_style.clone()}
                    font-weight={style.font_weight.clone()}
                    letter-spacing={style.letter_spacing.to_string()}
                    fill={style.fill.clone()}
                    dominant-baseline="text-before-edge"
                    style="white-space: pre;"
                >
                    { for lines.iter().enumerate().map(|(i, line)| html! {
                        <tspan
                            x={x.to_string()}
                            y={(item.rect.y + style.padding + i as f64 * line_height).to_string()}
                        >
                            {line.clone()}
                        </tspan>
                    }) }
                </text>
            }
        }
    };

    html! {
        <g
            key={item.id.index()}
            data-node={item.id.index().to_string()}
            transform={item.svg_matrix()}
            opacity={item.alpha.to_string()}
        >
            {body}
        </g>
    }
}

fn points_attr(points: &[DVec2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_control_box(control: &ScreenControlBox, edge: &str, rotate: &str) -> Html {
    let handles: Html = HandleName::ALL
        .iter()
        .zip(control.handles.iter())
        .map(|(handle, center)| {
            html! {
                <circle
                    key={handle.to_kebab_case()}
                    data-handle={handle.to_kebab_case()}
                    cx={center.x.to_string()}
                    cy={center.y.to_string()}
                    r={HANDLE_RADIUS.to_string()}
                    fill="white"
                    stroke={edge.to_string()}
                    stroke-width="1"
                />
            }
        })
        .collect();

    html! {
        <g data-testid="control-box" style="pointer-events: none;">
            <polygon
                points={points_attr(&control.corners)}
                fill="none"
                stroke={edge.to_string()}
                stroke-width="1"
            />
            <line
                x1={control.rotate_stem.x.to_string()}
                y1={control.rotate_stem.y.to_string()}
                x2={control.rotate_handle.x.to_string()}
                y2={control.rotate_handle.y.to_string()}
                stroke={rotate.to_string()}
                stroke-width="1"
            />
            <circle
                cx={control.rotate_handle.x.to_string()}
                cy={control.rotate_handle.y.to_string()}
                r={HANDLE_RADIUS.to_string()}
                fill={rotate.to_string()}
            />
            {handles}
        </g>
    }
}

fn render_rulers(frame: &StageFrame) -> Html {
    let t = frame.ruler_thickness;
    let color = frame.ruler_color.clone();

    let horizontal: Html = frame
        .rulers
        .horizontal
        .iter()
        .map(|tick| {
            html! {
                <>
                    <line
                        x1={tick.screen.to_string()}
                        y1={(t - tick.length).to_string()}
                        x2={tick.screen.to_string()}
                        y2={t.to_string()}
                        stroke={color.clone()}
                        stroke-width="1"
                    />
                    {tick_label(tick, tick.screen + 2.0, t / 2.0 - 1.0, None)}
                </>
            }
        })
        .collect();

    let vertical: Html = frame
        .rulers
        .vertical
        .iter()
        .map(|tick| {
            let x = t / 2.0 - 1.0;
            let y = tick.screen - 2.0;
            html! {
                <>
                    <line
                        x1={(t - tick.length).to_string()}
                        y1={tick.screen.to_string()}
                        x2={t.to_string()}
                        y2={tick.screen.to_string()}
                        stroke={color.clone()}
                        stroke-width="1"
                    />
                    {tick_label(tick, x, y, Some(format!("rotate(-90 {x} {y})")))}
                </>
            }
        })
        .collect();

    html! {
        <g data-testid="rulers" style="pointer-events: none;" font-size="8" font-family="sans-serif">
            <rect x="0" y="0" width={frame.width.to_string()} height={t.to_string()} fill="#f5f5f5" />
            <rect x="0" y="0" width={t.to_string()} height={frame.height.to_string()} fill="#f5f5f5" />
            <line x1={t.to_string()} y1={t.to_string()} x2={frame.width.to_string()} y2={t.to_string()} stroke={color.clone()} />
            <line x1={t.to_string()} y1={t.to_string()} x2={t.to_string()} y2={frame.height.to_string()} stroke={color.clone()} />
            {horizontal}
            {vertical}
            <rect x="0" y="0" width={t.to_string()} height={t.to_string()} fill="#e5e5e5" />
        </g>
    }
}

fn tick_label(tick: &Tick, x: f64, y: f64, transform: Option<String>) -> Html {
    match &tick.label {
        Some(label) => html! {
            <text x={x.to_string()} y={y.to_string()} {transform} fill="#333333">{label.clone()}</text>
        },
        None => html! {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PointerInput;

    #[test]
    fn test_capture_lists_visible_content() {
        let mut editor = Editor::headless();
        editor.load_mock_data().unwrap();
        let frame = StageFrame::capture(&editor, None);
        assert_eq!(frame.items.len(), 3);
        assert!(frame
            .items
            .iter()
            .any(|item| matches!(item.kind, DrawKind::Text { .. })));
        assert!(frame.control.is_none());
        assert!(!frame.rulers.horizontal.is_empty());

        let hidden = frame.items[0].id;
        assert_eq!(StageFrame::capture(&editor, Some(hidden)).items.len(), 2);
    }

    #[test]
    fn test_item_transform_matches_scene() {
        let mut editor = Editor::headless();
        editor.load_mock_data().unwrap();
        let frame = StageFrame::capture(&editor, None);
        for item in &frame.items {
            let corners = editor.graph().world_corners(item.id).unwrap();
            let mapped = item.transform.transform_point2(item.rect.min());
            assert!(mapped.distance(corners[0]) < 1e-9);
        }
        assert!(frame.items[0].svg_matrix().starts_with("matrix("));
    }

    #[test]
    fn test_clip_is_page_inside_workspace() {
        let editor = Editor::headless();
        let frame = StageFrame::capture(&editor, None);
        let clip = frame.clip.unwrap();
        assert!(clip.x >= editor.ruler_thickness());
        assert!(clip.y >= editor.ruler_thickness());
        assert!(clip.max().x <= frame.width + 1e-9);
        let view = editor.layers().view();
        assert!((clip.width - view.width).abs() < 1e-9);
    }

    #[test]
    fn test_selection_shows_control_box() {
        let mut editor = Editor::headless();
        let id = editor.add_text("Title");
        let center = editor.graph().global_position(id);
        editor.pointer_move(PointerInput::at(center.x, center.y));
        let frame = StageFrame::capture(&editor, None);
        let control = frame.control.unwrap();
        assert_eq!(control.handles.len(), 8);
        assert_eq!(frame.cursor, "move");
    }
}
