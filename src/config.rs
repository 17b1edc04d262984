use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Editor-wide settings. Every field falls back to its default when missing
/// from the JSON supplied by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Size of the drawing surface in CSS pixels
    pub screen: Dimensions,
    /// Size of the page being designed, in canvas units
    pub design: Dimensions,
    /// Gap kept between the page and the workspace edges
    pub padding: f64,
    pub ruler: RulerOptions,
    pub zoom: ZoomOptions,
    pub file_drop: FileDropOptions,
    /// Smallest width/height a node can be resized to
    pub min_node_size: f64,
    pub colors: ColorScheme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            screen: Dimensions::new(800.0, 600.0),
            design: Dimensions::new(1080.0, 720.0),
            padding: 40.0,
            ruler: RulerOptions::default(),
            zoom: ZoomOptions::default(),
            file_drop: FileDropOptions::for_images(),
            min_node_size: 50.0,
            colors: ColorScheme::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config, logging and falling back to defaults on error
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring invalid editor config: {err}");
                Self::default()
            }
        }
    }

    /// Read the `data-config` attribute of the document body, if any
    pub fn from_document() -> Self {
        let attribute = gloo_utils::document()
            .body()
            .and_then(|body| body.get_attribute("data-config"));
        match attribute {
            Some(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulerOptions {
    /// Canvas units between two minor ticks
    pub unit: f64,
    /// Number of minor ticks per major (labelled) tick
    pub major_unit: u32,
    pub color: String,
    pub thickness: f64,
}

impl Default for RulerOptions {
    fn default() -> Self {
        Self {
            unit: 10.0,
            major_unit: 5,
            color: "#333333".to_string(),
            thickness: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomOptions {
    pub min: f64,
    pub max: f64,
    /// Zoom change per wheel delta unit
    pub step: f64,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 5.0,
            step: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDropOptions {
    /// MIME types, `type/*` wildcards allowed
    pub accept: Vec<String>,
    pub multiple: bool,
    /// Maximum file size in bytes
    pub max_size: u64,
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

impl Default for FileDropOptions {
    fn default() -> Self {
        Self {
            accept: vec!["image/*".to_string()],
            multiple: false,
            max_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FileDropOptions {
    /// Options used by the drop plugin: common raster formats, many at once
    pub fn for_images() -> Self {
        Self {
            accept: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
            multiple: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorScheme {
    pub workspace: String,
    pub page: String,
    pub page_border: String,
    pub shadow: String,
    pub selection_edge: String,
    pub rotate_handle: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            workspace: "#cccccc".to_string(),
            page: "#ffffff".to_string(),
            page_border: "#ffbb66".to_string(),
            shadow: "#808080".to_string(),
            selection_edge: "#ffbb66".to_string(),
            rotate_handle: "#00ffbb".to_string(),
        }
    }
}
