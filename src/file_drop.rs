use std::any::Any;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::FileDropOptions;
use crate::error::{EditorError, Result};
use crate::plugins::{DragInput, DroppedFile, EventFlow, HostEffect, Plugin, PluginContext};

/// Whether `mime` is allowed by an accept list. Entries ending in `/*`
/// match every subtype of their base type.
pub fn matches_accept(accept: &[String], mime: &str) -> bool {
    accept.iter().any(|pattern| match pattern.strip_suffix("/*") {
        Some(base) => mime
            .split_once('/')
            .is_some_and(|(file_base, _)| file_base == base),
        None => pattern == mime,
    })
}

/// Split dropped files into accepted ones and one error per rejection.
/// Several files while `multiple` is off rejects the whole drop.
pub fn validate(options: &FileDropOptions, files: &[DroppedFile]) -> (Vec<DroppedFile>, Vec<EditorError>) {
    if !options.multiple && files.len() > 1 {
        return (
            Vec::new(),
            vec![EditorError::FileRejected("only a single file may be dropped".to_string())],
        );
    }

    let mut accepted = Vec::new();
    let mut errors = Vec::new();
    for file in files {
        if !matches_accept(&options.accept, &file.mime) {
            errors.push(EditorError::FileRejected(format!(
                "unsupported file type: {}",
                file.mime
            )));
        } else if file.size > options.max_size {
            errors.push(EditorError::FileRejected(format!("file too large: {}", file.name)));
        } else {
            accepted.push(file.clone());
        }
    }
    (accepted, errors)
}

/// Tracks drag hover state over the canvas and turns drops into imports
pub struct FileDrop {
    options: FileDropOptions,
    /// Nested dragenter/dragleave pairs fire as the pointer crosses children
    drag_counter: u32,
}

impl Default for FileDrop {
    fn default() -> Self {
        Self {
            options: FileDropOptions::for_images(),
            drag_counter: 0,
        }
    }
}

impl FileDrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &FileDropOptions {
        &self.options
    }

    /// Whether a drag is currently hovering the drop zone
    pub fn is_active(&self) -> bool {
        self.drag_counter > 0
    }
}

impl Plugin for FileDrop {
    fn name(&self) -> &'static str {
        "file-drop"
    }

    fn init(&mut self, ctx: &mut PluginContext) {
        self.options = ctx.config.file_drop.clone();
    }

    fn on_drag(&mut self, ctx: &mut PluginContext, input: &DragInput) -> EventFlow {
        match input {
            DragInput::Enter => self.drag_counter += 1,
            DragInput::Leave => self.drag_counter = self.drag_counter.saturating_sub(1),
            DragInput::Over => {}
            DragInput::Drop { position, files } => {
                self.drag_counter = 0;
                let (accepted, errors) = validate(&self.options, files);
                for error in errors {
                    ctx.report(error);
                }
                if !accepted.is_empty() {
                    log::info!("importing {} dropped file(s)", accepted.len());
                    ctx.request(HostEffect::ImportFiles {
                        files: accepted,
                        position: *position,
                    });
                }
            }
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

/// Describe the files of a browser drop for validation
pub fn describe_files(files: &web_sys::FileList) -> Vec<DroppedFile> {
    (0..files.length())
        .filter_map(|i| files.get(i).map(|file| (i, file)))
        .map(|(i, file)| DroppedFile {
            index: i as usize,
            name: file.name(),
            mime: file.type_(),
            size: file.size() as u64,
        })
        .collect()
}

/// Read a browser file into memory
pub async fn read_file(file: &web_sys::File) -> Result<Vec<u8>> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|err| EditorError::FileRead {
            name: file.name(),
            reason: EditorError::from(err).to_string(),
        })?;
    let buffer = buffer
        .dyn_into::<js_sys::ArrayBuffer>()
        .map_err(|_| EditorError::FileRead {
            name: file.name(),
            reason: "not an ArrayBuffer".to_string(),
        })?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::scene::{ApproxTextMeasure, SceneGraph, SceneLayers};
    use glam::DVec2;

    fn file(index: usize, mime: &str, size: u64) -> DroppedFile {
        DroppedFile {
            index,
            name: format!("file{index}"),
            mime: mime.to_string(),
            size,
        }
    }

    #[test]
    fn test_accept_wildcards() {
        let accept = vec!["image/*".to_string()];
        assert!(matches_accept(&accept, "image/png"));
        assert!(matches_accept(&accept, "image/svg+xml"));
        assert!(!matches_accept(&accept, "imagefoo/png"));
        assert!(!matches_accept(&accept, "text/plain"));

        let exact = vec!["image/png".to_string()];
        assert!(matches_accept(&exact, "image/png"));
        assert!(!matches_accept(&exact, "image/gif"));
    }

    #[test]
    fn test_validate_reports_each_rejected_file() {
        let options = FileDropOptions::for_images();
        let files = vec![
            file(0, "image/png", 1024),
            file(1, "text/plain", 10),
            file(2, "image/gif", options.max_size + 1),
            file(3, "image/jpeg", options.max_size),
        ];
        let (accepted, errors) = validate(&options, &files);
        assert_eq!(accepted.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "file rejected: unsupported file type: text/plain");
        assert_eq!(errors[1].to_string(), "file rejected: file too large: file2");
    }

    #[test]
    fn test_single_file_mode_rejects_many() {
        let options = FileDropOptions::default();
        let (accepted, errors) = validate(&options, &[file(0, "image/png", 1), file(1, "image/png", 1)]);
        assert!(accepted.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_drag_counter_and_drop() {
        let mut graph = SceneGraph::new();
        let config = EditorConfig::default();
        let mut layers = SceneLayers::build(&mut graph, &config);
        let mut events = Vec::new();
        let mut effects = Vec::new();
        let mut drop = FileDrop::new();
        {
            let mut ctx =
                PluginContext::new(&mut graph, &mut layers, &config, &ApproxTextMeasure, &mut events, &mut effects);
            drop.init(&mut ctx);

            drop.on_drag(&mut ctx, &DragInput::Enter);
            drop.on_drag(&mut ctx, &DragInput::Enter);
            drop.on_drag(&mut ctx, &DragInput::Leave);
            assert!(drop.is_active());
            drop.on_drag(&mut ctx, &DragInput::Leave);
            assert!(!drop.is_active());
            drop.on_drag(&mut ctx, &DragInput::Leave);
            assert!(!drop.is_active());

            drop.on_drag(&mut ctx, &DragInput::Enter);
            drop.on_drag(
                &mut ctx,
                &DragInput::Drop {
                    position: DVec2::new(120.0, 80.0),
                    files: vec![file(0, "image/png", 10), file(1, "application/pdf", 10)],
                },
            );
            assert!(!drop.is_active());
        }

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], HostEffect::Report(EditorError::FileRejected(_))));
        match &effects[1] {
            HostEffect::ImportFiles { files, position } => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].index, 0);
                assert_eq!(*position, DVec2::new(120.0, 80.0));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }
}
