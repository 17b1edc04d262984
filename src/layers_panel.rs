use yew::prelude::*;

use crate::editor::LayerEntry;
use crate::scene::NodeId;

#[derive(Properties, PartialEq)]
pub struct LayersPanelProps {
    pub entries: Vec<LayerEntry>,
    pub selected: Option<NodeId>,
    pub on_select: Callback<NodeId>,
    pub on_toggle_visible: Callback<(NodeId, bool)>,
    pub on_bring_to_front: Callback<NodeId>,
    pub on_send_to_back: Callback<NodeId>,
}

fn kind_icon(kind: &str) -> Html {
    match kind {
        "Text" => html! {
            <svg width="14" height="14" viewBox="0 0 14 14" fill="none" stroke="currentColor" stroke-width="1.5">
                <path d="M2 3 H12 M7 3 V12" stroke-linecap="round"/>
            </svg>
        },
        _ => html! {
            <svg width="14" height="14" viewBox="0 0 14 14" fill="none" stroke="currentColor" stroke-width="1.5">
                <rect x="2" y="2" width="10" height="10" rx="1"/>
                <path d="M2 10 L6 6 L12 11" stroke-linejoin="round"/>
            </svg>
        },
    }
}

#[function_component(LayersPanel)]
pub fn layers_panel(props: &LayersPanelProps) -> Html {
    // topmost first, like the stacking on the canvas
    let rows = props.entries.iter().rev().map(|entry| {
        let id = entry.id;
        let is_selected = props.selected == Some(id);

        let onclick = {
            let on_select = props.on_select.clone();
            Callback::from(move |_| on_select.emit(id))
        };
        let on_toggle = {
            let on_toggle_visible = props.on_toggle_visible.clone();
            let visible = entry.visible;
            Callback::from(move |e: MouseEvent| {
                e.stop_propagation();
                on_toggle_visible.emit((id, !visible));
            })
        };
        let on_front = {
            let cb = props.on_bring_to_front.clone();
            Callback::from(move |e: MouseEvent| {
                e.stop_propagation();
                cb.emit(id);
            })
        };
        let on_back = {
            let cb = props.on_send_to_back.clone();
            Callback::from(move |e: MouseEvent| {
                e.stop_propagation();
                cb.emit(id);
            })
        };

        html! {
            <div
                key={id.index()}
                {onclick}
                style={format!("margin-left: {}px;", entry.depth * 12)}
                class={classes!(
                    "flex",
                    "items-center",
                    "gap-2",
                    "p-2",
                    "rounded",
                    "cursor-pointer",
                    "border",
                    "border-gray-200",
                    "hover:bg-gray-100",
                    if is_selected { "bg-blue-100 border-blue-300" } else { "bg-white" },
                    (!entry.visible).then_some("opacity-50")
                )}
            >
                {kind_icon(entry.kind)}
                <span class="text-sm flex-1 truncate">{&entry.name}</span>
                <button class="text-xs text-gray-500" title="Bring to front" onclick={on_front}>{"↑"}</button>
                <button class="text-xs text-gray-500" title="Send to back" onclick={on_back}>{"↓"}</button>
                <button class="text-xs text-gray-500" onclick={on_toggle}>
                    { if entry.visible { "Hide" } else { "Show" } }
                </button>
            </div>
        }
    });

    html! {
        <div class="w-64 flex-none bg-white border-r border-gray-300 p-4 overflow-y-auto">
            <h2 class="text-lg font-semibold pb-3 mb-4 border-b border-gray-200">{"Layers"}</h2>
            <div class="space-y-2">
                if props.entries.is_empty() {
                    <p class="text-sm text-gray-500">{"Drop images onto the canvas to add them"}</p>
                } else {
                    { for rows }
                }
            </div>
        </div>
    }
}
