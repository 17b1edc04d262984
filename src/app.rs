use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use gloo::storage::{LocalStorage, Storage};
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlElement, KeyboardEvent, MouseEvent, PointerEvent, WheelEvent};
use yew::prelude::*;

use crate::components::backdrop::Backdrop;
use crate::components::stage::{Stage, StageFrame};
use crate::components::text_editor::TextEditor;
use crate::components::text_measure::CanvasTextMeasure;
use crate::components::EditorHandle;
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::EditorError;
use crate::file_drop::{describe_files, read_file};
use crate::layers_panel::LayersPanel;
use crate::plugins::{DragInput, DroppedFile, HostEffect, PointerInput, WheelInput};
use crate::scene::NodeId;
use crate::serialize::Document;
use crate::sprite_loader::{load_multiple_sprites, SpriteOptions, SpriteRequest};
use crate::storage::{content_hash, object_url, AssetStore};
use crate::transform_panel::{TransformPanel, TransformValues};
use crate::types::{ActiveTab, Dimensions, Modifiers};

/// LocalStorage key of the saved document
const SAVED_DOCUMENT_KEY: &str = "canvas-studio.document";

/// Pixels per line for wheel events reported in lines
const WHEEL_LINE_HEIGHT: f64 = 16.0;

#[derive(Default)]
struct UiState {
    /// Files of the last drop, read when the editor asks for an import
    dropped: Option<web_sys::FileList>,
    /// Text node open in the in-place editor
    editing: Option<NodeId>,
    status: Option<String>,
}

/// Everything the event handlers share
#[derive(Clone)]
struct Shell {
    editor: EditorHandle,
    store: Rc<RefCell<AssetStore>>,
    ui: Rc<RefCell<UiState>>,
    revision: Rc<RefCell<u64>>,
    redraw: UseForceUpdateHandle,
}

impl Shell {
    /// Run an editor call, carry out the effects it requested and redraw
    /// if anything on screen changed
    fn update<R>(&self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let (result, changed) = {
            let mut editor = self.editor.borrow_mut();
            let before = (editor.cursor(), editor.selected(), editor.drop_active());
            let result = f(&mut editor);
            let after = (editor.cursor(), editor.selected(), editor.drop_active());
            (result, editor.take_dirty() || before != after)
        };
        let had_effects = self.apply_effects();
        if changed || had_effects {
            self.refresh();
        }
        result
    }

    fn refresh(&self) {
        *self.revision.borrow_mut() += 1;
        self.redraw.force_update();
    }

    fn set_status(&self, message: impl Into<String>) {
        self.ui.borrow_mut().status = Some(message.into());
        self.refresh();
    }

    fn apply_effects(&self) -> bool {
        let effects = self.editor.borrow_mut().take_effects();
        let any = !effects.is_empty();
        for effect in effects {
            match effect {
                HostEffect::Report(err) => {
                    self.ui.borrow_mut().status = Some(err.to_string());
                }
                HostEffect::ImportFiles { files, position } => {
                    let shell = self.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        shell.import_files(files, position).await;
                    });
                }
                HostEffect::ResolveAsset { node, hash } => {
                    let shell = self.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        shell.resolve_asset(node, hash).await;
                    });
                }
            }
        }
        any
    }

    async fn import_files(&self, files: Vec<DroppedFile>, position: DVec2) {
        let Some(list) = self.ui.borrow_mut().dropped.take() else {
            log::warn!("import requested without dropped files");
            return;
        };
        let store = self.store.borrow().clone();
        let (parent, at) = {
            let editor = self.editor.borrow();
            (editor.document(), editor.to_document(position))
        };

        let mut requests = Vec::with_capacity(files.len());
        for dropped in files {
            let Some(file) = list.get(dropped.index as u32) else { continue };
            let bytes = match read_file(&file).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::error!("{err}");
                    self.set_status(err.to_string());
                    continue;
                }
            };
            let hash = content_hash(&bytes);
            if let Err(err) = store.save_file(&hash, &bytes).await {
                log::warn!("asset not cached: {err}");
            }
            match object_url(&bytes, Some(&dropped.mime)) {
                Ok(url) => requests.push(SpriteRequest {
                    url,
                    hash: Some(hash),
                    options: SpriteOptions::centered_at(at),
                    parent,
                }),
                Err(err) => log::error!("{err}"),
            }
        }

        if let Err(err) = load_multiple_sprites(&self.editor, requests).await {
            self.set_status(err.to_string());
        }
        self.update(|_| ());
    }

    async fn resolve_asset(&self, node: NodeId, hash: String) {
        let store = self.store.borrow().clone();
        let url = match store.get_file(&hash).await {
            Ok(Some(bytes)) => object_url(&bytes, None),
            Ok(None) => {
                log::warn!("no cached image for {hash}");
                return;
            }
            Err(err) => Err(err),
        };
        match url.and_then(|url| self.editor.borrow_mut().set_texture_url(node, &url)) {
            Ok(()) => self.refresh(),
            Err(err) => {
                log::error!("failed to restore image {hash}: {err}");
                self.set_status(err.to_string());
            }
        }
    }

    /// Match the editor's screen to the stage element
    fn fit_to(&self, element: &HtmlElement) {
        let screen = Dimensions::new(
            f64::from(element.client_width()),
            f64::from(element.client_height()),
        );
        if screen.width > 0.0 && screen.height > 0.0 {
            self.update(|editor| editor.resize(screen));
        }
    }
}

fn modifiers_of(event: &MouseEvent) -> Modifiers {
    Modifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

/// Event position relative to the stage element
fn local_position(event: &MouseEvent, stage: &NodeRef) -> DVec2 {
    let client = DVec2::new(f64::from(event.client_x()), f64::from(event.client_y()));
    match stage.cast::<HtmlElement>() {
        Some(element) => {
            let rect = element.get_bounding_client_rect();
            client - DVec2::new(rect.left(), rect.top())
        }
        None => client,
    }
}

fn pointer_input(event: &MouseEvent, stage: &NodeRef) -> PointerInput {
    PointerInput {
        position: local_position(event, stage),
        modifiers: modifiers_of(event),
    }
}

fn is_text_field(target: Option<web_sys::EventTarget>) -> bool {
    target
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"))
}

#[function_component(App)]
pub fn app() -> Html {
    let editor = use_memo((), |_| {
        let config = EditorConfig::from_document();
        let mut editor = Editor::new(config, CanvasTextMeasure::best_available());
        if let Err(err) = editor.load_mock_data() {
            log::error!("failed to load sample scene: {err}");
        }
        EditorHandle(Rc::new(RefCell::new(editor)))
    });
    let store = use_mut_ref(AssetStore::closed);
    let ui = use_mut_ref(UiState::default);
    let revision = use_mut_ref(|| 0u64);
    let redraw = use_force_update();
    let active_tab = use_state(|| ActiveTab::Transform);
    let stage_ref = use_node_ref();

    let shell = Shell {
        editor: (*editor).clone(),
        store: store.clone(),
        ui: ui.clone(),
        revision: revision.clone(),
        redraw,
    };

    // Open the asset cache
    {
        let store = store.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match AssetStore::open().await {
                    Ok(opened) => *store.borrow_mut() = opened,
                    Err(err) => log::error!("asset cache unavailable: {err}"),
                }
            });
            || ()
        });
    }

    // Size, wheel, keyboard and window listeners
    {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        use_effect_with((), move |_| {
            let mut listeners = Vec::new();
            if let Some(element) = stage_ref.cast::<HtmlElement>() {
                shell.fit_to(&element);

                let wheel_shell = shell.clone();
                let wheel_ref = stage_ref.clone();
                listeners.push(EventListener::new_with_options(
                    &element,
                    "wheel",
                    EventListenerOptions::enable_prevent_default(),
                    move |event| {
                        let Some(event) = event.dyn_ref::<WheelEvent>() else { return };
                        event.prevent_default();
                        let unit = if event.delta_mode() == WheelEvent::DOM_DELTA_LINE {
                            WHEEL_LINE_HEIGHT
                        } else {
                            1.0
                        };
                        let input = WheelInput {
                            position: local_position(event, &wheel_ref),
                            delta: DVec2::new(event.delta_x(), event.delta_y()) * unit,
                            modifiers: modifiers_of(event),
                        };
                        wheel_shell.update(|editor| editor.wheel(input));
                    },
                ));

                let resize_shell = shell.clone();
                listeners.push(EventListener::new(&gloo_utils::window(), "resize", move |_| {
                    resize_shell.fit_to(&element);
                }));
            }

            let key_shell = shell.clone();
            listeners.push(EventListener::new(&gloo_utils::document(), "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                if key_shell.ui.borrow().editing.is_some() || is_text_field(event.target()) {
                    return;
                }
                if key_shell.update(|editor| editor.key_down(&event.key())) {
                    event.prevent_default();
                }
            }));

            move || drop(listeners)
        });
    }

    let onpointerdown = {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        Callback::from(move |e: PointerEvent| {
            if e.button() != 0 {
                return;
            }
            if let Some(element) = stage_ref.cast::<HtmlElement>() {
                let _ = element.set_pointer_capture(e.pointer_id());
            }
            let input = pointer_input(&e, &stage_ref);
            shell.update(|editor| editor.pointer_down(input));
        })
    };

    let onpointermove = {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        Callback::from(move |e: PointerEvent| {
            let input = pointer_input(&e, &stage_ref);
            shell.update(|editor| editor.pointer_move(input));
        })
    };

    let onpointerup = {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        Callback::from(move |e: PointerEvent| {
            if let Some(element) = stage_ref.cast::<HtmlElement>() {
                let _ = element.release_pointer_capture(e.pointer_id());
            }
            let input = pointer_input(&e, &stage_ref);
            shell.update(|editor| editor.pointer_up(input));
        })
    };

    let ondblclick = {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        Callback::from(move |e: MouseEvent| {
            let point = local_position(&e, &stage_ref);
            let target = {
                let editor = shell.editor.borrow();
                editor.node_at(point).filter(|&id| editor.text_at(id).is_some())
            };
            if let Some(id) = target {
                shell.ui.borrow_mut().editing = Some(id);
                shell.refresh();
            }
        })
    };

    let ondragenter = {
        let shell = shell.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            shell.update(|editor| editor.drag(DragInput::Enter));
        })
    };

    let ondragover = {
        let shell = shell.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            shell.update(|editor| editor.drag(DragInput::Over));
        })
    };

    let ondragleave = {
        let shell = shell.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            shell.update(|editor| editor.drag(DragInput::Leave));
        })
    };

    let ondrop = {
        let shell = shell.clone();
        let stage_ref = stage_ref.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            let position = local_position(&e, &stage_ref);
            let files = e.data_transfer().and_then(|dt| dt.files());
            let described = files.as_ref().map(describe_files).unwrap_or_default();
            shell.ui.borrow_mut().dropped = files;
            shell.update(|editor| {
                editor.drag(DragInput::Drop {
                    position,
                    files: described,
                })
            });
        })
    };

    // Toolbar
    let on_add_text = {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| {
            shell.update(|editor| {
                editor.add_text("Double-click to edit");
            });
        })
    };

    let on_save = {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| {
            let snapshot = shell.editor.borrow().snapshot();
            let result = snapshot.and_then(|doc| {
                LocalStorage::set(SAVED_DOCUMENT_KEY, &doc)
                    .map_err(|err| EditorError::Storage(err.to_string()))
            });
            match result {
                Ok(()) => shell.set_status("Saved"),
                Err(err) => shell.set_status(err.to_string()),
            }
        })
    };

    let on_load = {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| match LocalStorage::get::<Document>(SAVED_DOCUMENT_KEY) {
            Ok(doc) => {
                shell.ui.borrow_mut().editing = None;
                match shell.update(|editor| editor.load_document(&doc)) {
                    Ok(()) => shell.set_status("Loaded"),
                    Err(err) => shell.set_status(err.to_string()),
                }
            }
            Err(err) => shell.set_status(format!("Nothing to load: {err}")),
        })
    };

    let on_reset_view = {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| shell.update(|editor| editor.reset_view()))
    };

    let on_zoom = |factor: f64| {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| {
            shell.update(|editor| {
                let zoom = editor.zoom() * factor;
                editor.set_zoom(zoom);
            })
        })
    };

    let on_delete = {
        let shell = shell.clone();
        Callback::from(move |_: MouseEvent| {
            shell.update(|editor| {
                editor.delete_selected();
            })
        })
    };

    // Panels
    let on_select = {
        let shell = shell.clone();
        Callback::from(move |id: NodeId| shell.update(|editor| editor.select(id)))
    };
    let on_toggle_visible = {
        let shell = shell.clone();
        Callback::from(move |(id, visible): (NodeId, bool)| shell.update(|editor| editor.set_visible(id, visible)))
    };
    let on_bring_to_front = {
        let shell = shell.clone();
        Callback::from(move |id: NodeId| shell.update(|editor| editor.bring_to_front(id)))
    };
    let on_send_to_back = {
        let shell = shell.clone();
        Callback::from(move |id: NodeId| shell.update(|editor| editor.send_to_back(id)))
    };
    let on_resize = {
        let shell = shell.clone();
        Callback::from(move |(w, h): (f64, f64)| shell.update(|editor| editor.resize_selected(w, h)))
    };
    let on_rotate = {
        let shell = shell.clone();
        Callback::from(move |angle: f64| shell.update(|editor| editor.rotate_selected(angle)))
    };

    let editing = ui.borrow().editing;
    let status = ui.borrow().status.clone();

    let (frame, entries, selected, values, zoom, text_editor) = {
        let editor = editor.0.borrow();
        let text_editor = editing.and_then(|id| {
            let (text, style) = editor.text_at(id)?;
            let bounds = editor.screen_bounds(id)?;
            let scale = editor.graph().world_scale(id).y;
            let on_input = {
                let shell = shell.clone();
                Callback::from(move |value: String| shell.update(|editor| editor.set_text(id, &value)))
            };
            let on_commit = {
                let shell = shell.clone();
                Callback::from(move |_: ()| {
                    if shell.ui.borrow_mut().editing.take().is_some() {
                        shell.refresh();
                    }
                })
            };
            Some(html! {
                <TextEditor
                    {bounds}
                    value={AttrValue::from(text.to_string())}
                    font_size={style.font_size * scale}
                    font_family={AttrValue::from(style.font_family.clone())}
                    color={AttrValue::from(style.fill.clone())}
                    {on_input}
                    {on_commit}
                />
            })
        });
        (
            StageFrame::capture(&editor, editing),
            editor.content_nodes(),
            editor.selected(),
            TransformValues::of_selection(&editor),
            editor.zoom(),
            text_editor,
        )
    };
    let revision = *revision.borrow();
    let (width, height) = (frame.width.max(0.0) as u32, frame.height.max(0.0) as u32);

    let tab_class = |tab: ActiveTab| {
        if *active_tab == tab {
            "px-3 py-1 text-sm border-b-2 border-blue-500"
        } else {
            "px-3 py-1 text-sm text-gray-500"
        }
    };
    let show_tab = |tab: ActiveTab| {
        let active_tab = active_tab.clone();
        Callback::from(move |_: MouseEvent| active_tab.set(tab))
    };

    html! {
        <div class="flex h-screen w-screen overflow-hidden bg-gray-100">
            <div class="flex-1 flex flex-col">
                <div class="flex items-center gap-2 p-2 bg-white border-b border-gray-300">
                    <button onclick={on_add_text} class="px-3 py-1 bg-white border border-gray-300 rounded text-sm hover:bg-gray-50">{"Add text"}</button>
                    <button onclick={on_delete} disabled={selected.is_none()} class="px-3 py-1 bg-white border border-gray-300 rounded text-sm hover:bg-gray-50">{"Delete"}</button>
                    <button onclick={on_save} class="px-3 py-1 bg-white border border-gray-300 rounded text-sm hover:bg-gray-50">{"Save"}</button>
                    <button onclick={on_load} class="px-3 py-1 bg-white border border-gray-300 rounded text-sm hover:bg-gray-50">{"Load"}</button>
                    <span class="mx-2 h-5 border-l border-gray-300" />
                    <button onclick={on_zoom(0.8)} class="px-2 py-1 bg-white border border-gray-300 rounded text-sm">{"−"}</button>
                    <span data-testid="zoom-level" class="text-sm w-14 text-center">{format!("{:.0}%", zoom * 100.0)}</span>
                    <button onclick={on_zoom(1.25)} class="px-2 py-1 bg-white border border-gray-300 rounded text-sm">{"+"}</button>
                    <button onclick={on_reset_view} class="px-3 py-1 bg-white border border-gray-300 rounded text-sm hover:bg-gray-50">{"Reset view"}</button>
                    if let Some(status) = status {
                        <span data-testid="status" class="ml-auto text-sm text-gray-600">{status}</span>
                    }
                </div>
                <div
                    ref={stage_ref}
                    data-testid="stage"
                    data-revision={revision.to_string()}
                    class="relative flex-1 overflow-hidden select-none"
                    style="touch-action: none;"
                    {onpointerdown}
                    {onpointermove}
                    {onpointerup}
                    {ondblclick}
                    {ondragenter}
                    {ondragover}
                    {ondragleave}
                    {ondrop}
                >
                    <Backdrop editor={(*editor).clone()} {revision} {width} {height} />
                    <Stage {frame} />
                    {text_editor.unwrap_or_default()}
                </div>
            </div>
            <div class="w-72 flex-none bg-white border-l border-gray-300 p-4 overflow-y-auto">
                <div class="flex gap-2 mb-4">
                    <button class={tab_class(ActiveTab::Transform)} onclick={show_tab(ActiveTab::Transform)}>{"Transform"}</button>
                    <button class={tab_class(ActiveTab::Layers)} onclick={show_tab(ActiveTab::Layers)}>{"Layers"}</button>
                </div>
                if *active_tab == ActiveTab::Transform {
                    <TransformPanel {values} {on_resize} {on_rotate} />
                } else {
                    <LayersPanel
                        {entries}
                        {selected}
                        {on_select}
                        {on_toggle_visible}
                        {on_bring_to_front}
                        {on_send_to_back}
                    />
                }
            </div>
        </div>
    }
}
