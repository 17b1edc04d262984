use std::any::Any;

use glam::DVec2;

use crate::config::RulerOptions;
use crate::plugins::{EditorEvent, Plugin, PluginContext};
use crate::scene::{SceneGraph, SceneLayers};

/// Unit of the ruler at zoom 1, in canvas units
const BASE_UNIT: f64 = 10.0;
/// Hard cap on ticks per ruler, in case of a degenerate unit
const MAX_TICKS: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Position along the ruler in stage pixels
    pub screen: f64,
    /// Canvas coordinate the tick marks
    pub value: f64,
    pub length: f64,
    /// Set on major ticks only
    pub label: Option<String>,
}

impl Tick {
    pub fn is_major(&self) -> bool {
        self.label.is_some()
    }
}

/// Ruler contents after the last redraw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulerMarks {
    pub horizontal: Vec<Tick>,
    pub vertical: Vec<Tick>,
}

/// Horizontal and vertical rulers measuring `canvasZone` coordinates
pub struct Ruler {
    options: RulerOptions,
    marks: RulerMarks,
}

impl Default for Ruler {
    fn default() -> Self {
        Self {
            options: RulerOptions::default(),
            marks: RulerMarks::default(),
        }
    }
}

impl Ruler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &RulerOptions {
        &self.options
    }

    pub fn marks(&self) -> &RulerMarks {
        &self.marks
    }

    pub fn thickness(&self) -> f64 {
        self.options.thickness
    }

    /// Set the tick spacing; `major_unit` is kept when `None`
    pub fn set_unit(&mut self, ctx: &mut PluginContext, unit: f64, major_unit: Option<u32>) {
        self.options.unit = unit;
        if let Some(major_unit) = major_unit {
            self.options.major_unit = major_unit;
        }
        self.draw(ctx.graph, ctx.layers);
    }

    /// Denser ticks when zoomed in, sparser labels when zoomed out
    pub fn set_zoom(&mut self, ctx: &mut PluginContext, zoom: f64) {
        let unit = BASE_UNIT / zoom;
        let major_unit = if zoom < 0.5 {
            10
        } else if zoom > 2.0 {
            2
        } else {
            5
        };
        self.set_unit(ctx, unit, Some(major_unit));
    }

    pub fn draw(&mut self, graph: &SceneGraph, layers: &SceneLayers) {
        let screen = layers.screen();
        let origin = graph.to_global(layers.canvas_zone, DVec2::ZERO);
        let axis_x = graph.to_global(layers.canvas_zone, DVec2::X) - origin;
        let axis_y = graph.to_global(layers.canvas_zone, DVec2::Y) - origin;
        self.marks = RulerMarks {
            horizontal: self.ticks(origin.x, axis_x.x, screen.width),
            vertical: self.ticks(origin.y, axis_y.y, screen.height),
        };
    }

    /// Ticks for one axis where canvas value `v` lands at `origin + v * scale`
    fn ticks(&self, origin: f64, scale: f64, extent: f64) -> Vec<Tick> {
        let RulerOptions {
            unit,
            major_unit,
            thickness,
            ..
        } = self.options;
        if unit <= 0.0 || !unit.is_finite() || scale.abs() <= f64::EPSILON {
            return Vec::new();
        }
        // canvas range covered by the visible part of the ruler
        let a = (thickness - origin) / scale;
        let b = (extent - origin) / scale;
        let first = (a.min(b) / unit).ceil() as i64;
        let last = (a.max(b) / unit).floor() as i64;
        let major_unit = i64::from(major_unit.max(1));

        (first..=last)
            .take(MAX_TICKS)
            .filter_map(|k| {
                let value = k as f64 * unit;
                let screen = origin + value * scale;
                if screen < thickness || screen > extent {
                    return None;
                }
                let major = k.rem_euclid(major_unit) == 0;
                Some(Tick {
                    screen,
                    value,
                    length: if major { thickness / 2.0 } else { thickness / 3.0 },
                    label: major.then(|| format!("{}", value.round() as i64)),
                })
            })
            .collect()
    }
}

impl Plugin for Ruler {
    fn name(&self) -> &'static str {
        "ruler"
    }

    fn init(&mut self, ctx: &mut PluginContext) {
        self.options = ctx.config.ruler.clone();
    }

    fn on_load(&mut self, ctx: &mut PluginContext) {
        self.draw(ctx.graph, ctx.layers);
    }

    fn on_event(&mut self, ctx: &mut PluginContext, event: &EditorEvent) {
        match event {
            EditorEvent::ZoomChanged(zoom) => self.set_zoom(ctx, *zoom),
            EditorEvent::ViewChanged => self.draw(ctx.graph, ctx.layers),
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
