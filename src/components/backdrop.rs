use std::cell::RefCell;
use std::rc::Rc;

use web_sys::HtmlCanvasElement;
use yew::prelude::*;

use super::EditorHandle;
use crate::editor::Editor;
use crate::gpu::{Renderer, Tessellator};
use crate::scene::Color;
use crate::types::BoundingBox;

#[derive(Properties, Clone, PartialEq)]
pub struct BackdropProps {
    pub editor: EditorHandle,
    /// Bumped by the shell whenever the scene changed
    pub revision: u64,
    pub width: u32,
    pub height: u32,
}

struct BackdropState {
    renderer: Renderer,
    tessellator: Tessellator,
}

/// Workspace area in stage pixels; the GPU pass is limited to it
fn workspace_clip(editor: &Editor) -> Option<BoundingBox> {
    let graph = editor.graph();
    let zone = editor.layers().background_zone;
    let clip = graph.get(zone)?.clip?;
    Some(clip.transformed(&graph.world_transform(zone)))
}

/// WebGL canvas painting the workspace, page and page shadow
#[function_component(Backdrop)]
pub fn backdrop(props: &BackdropProps) -> Html {
    let canvas_ref = use_node_ref();
    let state: UseStateHandle<Option<Rc<RefCell<BackdropState>>>> = use_state(|| None);

    {
        let canvas_ref = canvas_ref.clone();
        let state = state.clone();
        let (width, height) = (props.width, props.height);
        use_effect_with((), move |_| {
            if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                canvas.set_width(width.max(1));
                canvas.set_height(height.max(1));
                wasm_bindgen_futures::spawn_local(async move {
                    match Renderer::new(canvas).await {
                        Ok(renderer) => {
                            log::info!("backdrop renderer ready");
                            state.set(Some(Rc::new(RefCell::new(BackdropState {
                                renderer,
                                tessellator: Tessellator::new(),
                            }))));
                        }
                        Err(err) => log::error!("failed to create renderer: {err}"),
                    }
                });
            }
            || ()
        });
    }

    {
        let ready = (*state).clone();
        let editor = props.editor.clone();
        use_effect_with(
            (ready.is_some(), props.revision, props.width, props.height),
            move |&(_, _, width, height)| {
                if let Some(state) = ready {
                    let mut state = state.borrow_mut();
                    let BackdropState { renderer, tessellator } = &mut *state;
                    renderer.resize(width, height);

                    let editor = editor.borrow();
                    let mesh = tessellator.tessellate_scene(editor.graph());
                    let clear = Color::from_hex(&editor.config().colors.workspace).unwrap_or(Color::white());
                    if let Err(err) = renderer.render(&mesh, clear, workspace_clip(&editor)) {
                        log::error!("render failed: {err}");
                    }
                }
                || ()
            },
        );
    }

    html! {
        <canvas
            ref={canvas_ref}
            width={props.width.to_string()}
            height={props.height.to_string()}
            style="position: absolute; top: 0; left: 0;"
        />
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    #[test]
    fn test_workspace_clip_sits_right_of_rulers() {
        let mut editor = Editor::headless();
        editor.resize(Dimensions::new(1000.0, 700.0));
        let clip = workspace_clip(&editor).unwrap();
        let t = editor.ruler_thickness();
        assert!((clip.x - t).abs() < 1e-9);
        assert!((clip.y - t).abs() < 1e-9);
        assert!((clip.width - (1000.0 - t)).abs() < 1e-9);
        assert!((clip.height - (700.0 - t)).abs() < 1e-9);
    }
}
