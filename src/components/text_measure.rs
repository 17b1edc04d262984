use glam::DVec2;
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;

use crate::error::{EditorError, Result};
use crate::scene::{ApproxTextMeasure, TextMeasure, TextStyle};

/// Measures text with an offscreen 2D canvas context
pub struct CanvasTextMeasure {
    context: CanvasRenderingContext2d,
}

impl CanvasTextMeasure {
    pub fn new() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| EditorError::MissingElement("document".to_string()))?;
        let canvas = document.create_element("canvas")?;
        let context = canvas
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .map_err(|_| EditorError::MissingElement("canvas".to_string()))?
            .get_context("2d")?
            .ok_or_else(|| EditorError::MissingElement("2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EditorError::MissingElement("2d context".to_string()))?;
        Ok(Self { context })
    }

    /// Canvas metrics when available, glyph estimates otherwise
    pub fn best_available() -> Box<dyn TextMeasure> {
        match Self::new() {
            Ok(measure) => Box::new(measure),
            Err(err) => {
                log::warn!("falling back to approximate text metrics: {err}");
                Box::new(ApproxTextMeasure)
            }
        }
    }
}

impl TextMeasure for CanvasTextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> DVec2 {
        self.context.set_font(&style.css_font());
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines
            .iter()
            .map(|line| {
                let width = self.context.measure_text(line).map_or(0.0, |m| m.width());
                let gaps = (line.chars().count() as f64 - 1.0).max(0.0);
                width + gaps * style.letter_spacing
            })
            .fold(0.0, f64::max);
        let height = lines.len() as f64 * style.line_height();
        DVec2::new(widest + style.padding * 2.0, height + style.padding * 2.0)
    }
}
