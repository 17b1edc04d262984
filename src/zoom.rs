use std::any::Any;

use glam::DVec2;

use crate::plugins::{EditorEvent, EventFlow, Plugin, PluginContext, WheelInput};

/// Ctrl/Cmd + wheel zooms `mainZone` about the cursor; a plain wheel pans it.
pub struct ZoomController {
    current: f64,
    min: f64,
    max: f64,
    step: f64,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self {
            current: 1.0,
            min: 0.1,
            max: 5.0,
            step: 0.001,
        }
    }
}

impl ZoomController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_zoom(&self) -> f64 {
        self.current
    }

    fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }

    /// Set the zoom, keeping the stage point `focus` fixed on screen
    pub fn zoom_at(&mut self, ctx: &mut PluginContext, zoom: f64, focus: DVec2) {
        let zoom = self.clamp(zoom);
        if zoom == self.current {
            return;
        }
        let main_zone = ctx.layers.main_zone;
        let Some(parent) = ctx.graph.parent(main_zone) else { return };
        let local = ctx.graph.to_local(main_zone, focus);
        let focus_in_parent = ctx.graph.to_local(parent, focus);
        if let Some(zone) = ctx.graph.get_mut(main_zone) {
            zone.scale = DVec2::splat(zoom);
            zone.position = focus_in_parent - local * zoom;
        }
        log::debug!("zoom {:.3} -> {:.3}", self.current, zoom);
        self.current = zoom;
        ctx.emit(EditorEvent::ZoomChanged(zoom));
    }

    /// Set the zoom about the origin of `mainZone`
    pub fn set_zoom(&mut self, ctx: &mut PluginContext, zoom: f64) {
        let zoom = self.clamp(zoom);
        if zoom == self.current {
            return;
        }
        if let Some(zone) = ctx.graph.get_mut(ctx.layers.main_zone) {
            zone.scale = DVec2::splat(zoom);
        }
        self.current = zoom;
        ctx.emit(EditorEvent::ZoomChanged(zoom));
    }

    /// Back to zoom 1 with the page centred
    pub fn reset(&mut self, ctx: &mut PluginContext) {
        if let Some(zone) = ctx.graph.get_mut(ctx.layers.main_zone) {
            zone.position = DVec2::ZERO;
        }
        ctx.emit(EditorEvent::ViewChanged);
        self.set_zoom(ctx, 1.0);
    }

    pub fn pan(&mut self, ctx: &mut PluginContext, delta: DVec2) {
        if let Some(zone) = ctx.graph.get_mut(ctx.layers.main_zone) {
            zone.position += delta;
            ctx.emit(EditorEvent::ViewChanged);
        }
    }
}

impl Plugin for ZoomController {
    fn name(&self) -> &'static str {
        "zoom-controller"
    }

    fn init(&mut self, ctx: &mut PluginContext) {
        self.min = ctx.config.zoom.min;
        self.max = ctx.config.zoom.max;
        self.step = ctx.config.zoom.step;
        self.current = ctx.layers.zoom(ctx.graph);
    }

    fn on_wheel(&mut self, ctx: &mut PluginContext, input: &WheelInput) -> EventFlow {
        if input.modifiers.command() {
            let zoom = self.current - input.delta.y * self.step;
            self.zoom_at(ctx, zoom, input.position);
        } else {
            self.pan(ctx, -input.delta);
        }
        EventFlow::Stop
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
