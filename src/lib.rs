mod app;
mod layers_panel;
mod transform_panel;

pub mod components;
pub mod config;
pub mod editor;
pub mod error;
pub mod file_drop;
pub mod geometry;
pub mod gpu;
pub mod plugins;
pub mod ruler;
pub mod scene;
pub mod selection;
pub mod serialize;
pub mod sprite_loader;
pub mod storage;
pub mod types;
pub mod zoom;

use app::App;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
