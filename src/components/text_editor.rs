use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::types::BoundingBox;

#[derive(Properties, Clone, PartialEq)]
pub struct TextEditorProps {
    /// Stage-space box of the text being edited
    pub bounds: BoundingBox,
    pub value: AttrValue,
    /// Font size on screen, after zoom
    pub font_size: f64,
    pub font_family: AttrValue,
    pub color: AttrValue,
    /// Fired on every keystroke
    pub on_input: Callback<String>,
    /// Fired once editing ends (Enter, Escape or focus loss)
    pub on_commit: Callback<()>,
}

/// In-place input shown over a text node while it is being edited
#[function_component(TextEditor)]
pub fn text_editor(props: &TextEditorProps) -> Html {
    let input_ref = use_node_ref();

    {
        let input_ref = input_ref.clone();
        use_effect_with((), move |_| {
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                let _ = input.focus();
                input.select();
            }
            || ()
        });
    }

    let oninput = {
        let on_input = props.on_input.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_input.emit(input.value());
        })
    };

    let onkeydown = {
        let on_commit = props.on_commit.clone();
        Callback::from(move |e: KeyboardEvent| {
            // keep Delete and Backspace away from the canvas shortcuts
            e.stop_propagation();
            if matches!(e.key().as_str(), "Enter" | "Escape") {
                e.prevent_default();
                on_commit.emit(());
            }
        })
    };

    let onblur = {
        let on_commit = props.on_commit.clone();
        Callback::from(move |_: FocusEvent| on_commit.emit(()))
    };

    let b = props.bounds;
    let style = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
         font-size: {}px; font-family: {}; color: {}; padding: 0; margin: 0; \
         border: 1px dashed #0d99ff; background: rgba(255, 255, 255, 0.9); outline: none; z-index: 10;",
        b.x,
        b.y,
        b.width.max(40.0),
        b.height,
        props.font_size,
        props.font_family,
        props.color,
    );

    html! {
        <input
            ref={input_ref}
            type="text"
            data-testid="text-editor"
            value={props.value.clone()}
            {style}
            {oninput}
            {onkeydown}
            {onblur}
        />
    }
}
