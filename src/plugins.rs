//! Plugin plumbing: the trait every editor feature implements, the manager
//! that owns them, and the context handed to each hook.

use std::any::Any;

use glam::DVec2;

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::scene::{NodeId, SceneGraph, SceneLayers, TextMeasure};
use crate::types::Modifiers;

/// Pointer event in stage (canvas element) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub position: DVec2,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            modifiers: Modifiers::default(),
        }
    }
}

/// Wheel event in stage coordinates; deltas in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub position: DVec2,
    pub delta: DVec2,
    pub modifiers: Modifiers,
}

/// A file offered by a drag, described without its bytes
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFile {
    /// Position in the browser's file list
    pub index: usize,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragInput {
    Enter,
    Over,
    Leave,
    Drop {
        position: DVec2,
        files: Vec<DroppedFile>,
    },
}

/// Whether an input event should reach the remaining plugins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Stop,
}

/// Notifications broadcast to every plugin after an input is handled
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ZoomChanged(f64),
    /// The workspace was panned or the screen resized
    ViewChanged,
    SelectionChanged(Option<NodeId>),
    /// A selected node was moved, resized or rotated by a gesture
    NodeTransformed(NodeId),
    SpritesInserted(Vec<NodeId>),
    ContentReplaced,
}

/// Work the editor cannot do synchronously; the browser shell carries it out
#[derive(Debug)]
pub enum HostEffect {
    /// Read, cache and insert the accepted files at a stage position
    ImportFiles { files: Vec<DroppedFile>, position: DVec2 },
    /// Swap a sprite's image for the cached bytes stored under `hash`
    ResolveAsset { node: NodeId, hash: String },
    Report(EditorError),
}

/// Everything a plugin may touch while handling a hook
pub struct PluginContext<'a> {
    pub graph: &'a mut SceneGraph,
    pub layers: &'a mut SceneLayers,
    pub config: &'a EditorConfig,
    pub measure: &'a dyn TextMeasure,
    events: &'a mut Vec<EditorEvent>,
    effects: &'a mut Vec<HostEffect>,
}

impl<'a> PluginContext<'a> {
    pub fn new(
        graph: &'a mut SceneGraph,
        layers: &'a mut SceneLayers,
        config: &'a EditorConfig,
        measure: &'a dyn TextMeasure,
        events: &'a mut Vec<EditorEvent>,
        effects: &'a mut Vec<HostEffect>,
    ) -> Self {
        Self {
            graph,
            layers,
            config,
            measure,
            events,
            effects,
        }
    }

    /// Queue an event for the post-dispatch broadcast
    pub fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub fn request(&mut self, effect: HostEffect) {
        self.effects.push(effect);
    }

    pub fn report(&mut self, error: EditorError) {
        log::warn!("{error}");
        self.effects.push(HostEffect::Report(error));
    }
}

/// An editor feature. Input hooks default to letting the event through.
pub trait Plugin: Any {
    fn name(&self) -> &'static str;

    /// Called once when the plugin is registered
    fn init(&mut self, _ctx: &mut PluginContext) {}

    /// Called for every plugin once all plugins are registered
    fn on_load(&mut self, _ctx: &mut PluginContext) {}

    fn on_pointer_down(&mut self, _ctx: &mut PluginContext, _input: &PointerInput) -> EventFlow {
        EventFlow::Continue
    }

    fn on_pointer_move(&mut self, _ctx: &mut PluginContext, _input: &PointerInput) -> EventFlow {
        EventFlow::Continue
    }

    fn on_pointer_up(&mut self, _ctx: &mut PluginContext, _input: &PointerInput) -> EventFlow {
        EventFlow::Continue
    }

    fn on_wheel(&mut self, _ctx: &mut PluginContext, _input: &WheelInput) -> EventFlow {
        EventFlow::Continue
    }

    fn on_drag(&mut self, _ctx: &mut PluginContext, _input: &DragInput) -> EventFlow {
        EventFlow::Continue
    }

    fn on_event(&mut self, _ctx: &mut PluginContext, _event: &EditorEvent) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Upper bound on broadcast rounds, in case handlers keep emitting
const MAX_BROADCAST_ROUNDS: usize = 16;

#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and immediately activate a plugin
    pub fn use_plugin<P: Plugin>(&mut self, mut plugin: P, ctx: &mut PluginContext) {
        log::info!("activating plugin {}", plugin.name());
        plugin.init(ctx);
        self.plugins.push(Box::new(plugin));
    }

    /// Signal that every plugin is registered
    pub fn ready(&mut self, ctx: &mut PluginContext) {
        for plugin in &mut self.plugins {
            plugin.on_load(ctx);
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn get<P: Plugin>(&self) -> Option<&P> {
        self.plugins.iter().find_map(|p| p.as_any().downcast_ref::<P>())
    }

    pub fn get_mut<P: Plugin>(&mut self) -> Option<&mut P> {
        self.plugins
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<P>())
    }

    /// Run `f` against a plugin with a context, if the plugin is registered
    pub fn with_plugin<P: Plugin, R>(
        &mut self,
        ctx: &mut PluginContext,
        f: impl FnOnce(&mut P, &mut PluginContext) -> R,
    ) -> Option<R> {
        let plugin = self.get_mut::<P>()?;
        Some(f(plugin, ctx))
    }

    fn dispatch(
        &mut self,
        ctx: &mut PluginContext,
        mut hook: impl FnMut(&mut dyn Plugin, &mut PluginContext) -> EventFlow,
    ) -> EventFlow {
        for plugin in &mut self.plugins {
            if hook(plugin.as_mut(), ctx) == EventFlow::Stop {
                return EventFlow::Stop;
            }
        }
        EventFlow::Continue
    }

    pub fn pointer_down(&mut self, ctx: &mut PluginContext, input: &PointerInput) -> EventFlow {
        self.dispatch(ctx, |p, ctx| p.on_pointer_down(ctx, input))
    }

    pub fn pointer_move(&mut self, ctx: &mut PluginContext, input: &PointerInput) -> EventFlow {
        self.dispatch(ctx, |p, ctx| p.on_pointer_move(ctx, input))
    }

    pub fn pointer_up(&mut self, ctx: &mut PluginContext, input: &PointerInput) -> EventFlow {
        self.dispatch(ctx, |p, ctx| p.on_pointer_up(ctx, input))
    }

    pub fn wheel(&mut self, ctx: &mut PluginContext, input: &WheelInput) -> EventFlow {
        self.dispatch(ctx, |p, ctx| p.on_wheel(ctx, input))
    }

    pub fn drag(&mut self, ctx: &mut PluginContext, input: &DragInput) -> EventFlow {
        self.dispatch(ctx, |p, ctx| p.on_drag(ctx, input))
    }

    /// Deliver queued events to every plugin, including events emitted by
    /// the handlers themselves
    pub fn broadcast(&mut self, ctx: &mut PluginContext) {
        for _ in 0..MAX_BROADCAST_ROUNDS {
            if ctx.events.is_empty() {
                return;
            }
            let events = std::mem::take(&mut *ctx.events);
            for event in &events {
                for plugin in &mut self.plugins {
                    plugin.on_event(ctx, event);
                }
            }
        }
        if !ctx.events.is_empty() {
            log::warn!("dropping {} events after repeated broadcasts", ctx.events.len());
            ctx.events.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ApproxTextMeasure;

    #[derive(Default)]
    struct Recorder {
        name: &'static str,
        stop_pointer: bool,
        seen: Vec<String>,
        loaded: bool,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_load(&mut self, _ctx: &mut PluginContext) {
            self.loaded = true;
        }

        fn on_pointer_down(&mut self, ctx: &mut PluginContext, _input: &PointerInput) -> EventFlow {
            self.seen.push("down".to_string());
            if self.stop_pointer {
                ctx.emit(EditorEvent::ViewChanged);
                EventFlow::Stop
            } else {
                EventFlow::Continue
            }
        }

        fn on_event(&mut self, ctx: &mut PluginContext, event: &EditorEvent) {
            self.seen.push(format!("{event:?}"));
            if *event == EditorEvent::ViewChanged {
                ctx.emit(EditorEvent::ZoomChanged(2.0));
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Other;

    impl Plugin for Other {
        fn name(&self) -> &'static str {
            "other"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn with_context(f: impl FnOnce(&mut PluginContext)) {
        let mut graph = SceneGraph::new();
        let config = EditorConfig::default();
        let mut layers = SceneLayers::build(&mut graph, &config);
        let mut events = Vec::new();
        let mut effects = Vec::new();
        let mut ctx = PluginContext::new(
            &mut graph,
            &mut layers,
            &config,
            &ApproxTextMeasure,
            &mut events,
            &mut effects,
        );
        f(&mut ctx);
    }

    #[test]
    fn test_stop_halts_dispatch_and_events_broadcast() {
        with_context(|ctx| {
            let mut manager = PluginManager::new();
            manager.use_plugin(
                Recorder {
                    name: "first",
                    stop_pointer: true,
                    ..Recorder::default()
                },
                ctx,
            );
            manager.use_plugin(Other, ctx);
            manager.ready(ctx);

            let flow = manager.pointer_down(ctx, &PointerInput::at(1.0, 1.0));
            assert_eq!(flow, EventFlow::Stop);
            manager.broadcast(ctx);

            let recorder = manager.get::<Recorder>().unwrap();
            assert!(recorder.loaded);
            assert_eq!(
                recorder.seen,
                vec!["down", "ViewChanged", "ZoomChanged(2.0)"]
            );
        });
    }

    #[test]
    fn test_typed_lookup_and_order() {
        with_context(|ctx| {
            let mut manager = PluginManager::new();
            manager.use_plugin(Other, ctx);
            assert!(manager.get::<Recorder>().is_none());
            manager.use_plugin(Recorder::default(), ctx);
            assert!(manager.get_mut::<Recorder>().is_some());
            assert_eq!(manager.names(), vec!["other", ""]);

            let hits = manager.with_plugin::<Recorder, _>(ctx, |p, ctx| {
                p.on_pointer_down(ctx, &PointerInput::at(0.0, 0.0))
            });
            assert_eq!(hits, Some(EventFlow::Continue));
        });
    }
}
