use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::editor::Editor;

/// Size and rotation of the selected node as shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct TransformValues {
    pub name: String,
    pub kind: &'static str,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl TransformValues {
    pub fn of_selection(editor: &Editor) -> Option<Self> {
        let node = editor.graph().get(editor.selected()?)?;
        Some(Self {
            name: node.name.clone(),
            kind: node.kind.type_name(),
            width: node.width(),
            height: node.height(),
            angle: node.angle(),
        })
    }
}

#[derive(Properties, PartialEq)]
pub struct TransformPanelProps {
    pub values: Option<TransformValues>,
    pub on_resize: Callback<(f64, f64)>,
    pub on_rotate: Callback<f64>,
}

fn number_input(value: f64, on_change: Callback<f64>) -> Html {
    html! {
        <input
            type="number"
            value={format!("{:.0}", value)}
            onchange={Callback::from(move |e: Event| {
                if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                    if let Ok(v) = input.value().parse::<f64>() {
                        on_change.emit(v);
                    }
                }
            })}
            class="w-full px-2 py-1 border border-gray-300 rounded text-sm bg-white text-gray-900"
        />
    }
}

#[function_component(TransformPanel)]
pub fn transform_panel(props: &TransformPanelProps) -> Html {
    let Some(values) = props.values.as_ref() else {
        return html! {
            <>
                <h2 class="text-lg font-semibold pb-3 mb-4 border-b border-gray-200">{"Transform"}</h2>
                <p class="text-sm text-gray-500">{"Select an element to edit it"}</p>
            </>
        };
    };

    let on_width = {
        let on_resize = props.on_resize.clone();
        let height = values.height;
        Callback::from(move |w: f64| on_resize.emit((w, height)))
    };
    let on_height = {
        let on_resize = props.on_resize.clone();
        let width = values.width;
        Callback::from(move |h: f64| on_resize.emit((width, h)))
    };

    html! {
        <>
            <h2 class="text-lg font-semibold pb-3 mb-4 border-b border-gray-200">{"Transform"}</h2>
            <div class="space-y-4">
                <p class="text-sm text-gray-700">
                    {&values.name}
                    <span class="ml-2 text-xs text-gray-400">{values.kind}</span>
                </p>
                <div class="grid grid-cols-2 gap-2">
                    <div>
                        <label class="block text-xs text-gray-500 mb-1">{"Width"}</label>
                        {number_input(values.width, on_width)}
                    </div>
                    <div>
                        <label class="block text-xs text-gray-500 mb-1">{"Height"}</label>
                        {number_input(values.height, on_height)}
                    </div>
                </div>
                <div>
                    <label class="block text-xs text-gray-500 mb-1">{"Rotation"}</label>
                    {number_input(values.angle, props.on_rotate.clone())}
                </div>
            </div>
        </>
    }
}
