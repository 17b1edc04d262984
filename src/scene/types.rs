use bytemuck::{Pod, Zeroable};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::types::BoundingBox;

/// RGBA color with f32 components (0.0 - 1.0)
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    pub const fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Color from a packed `0xRRGGBB` value
    pub fn from_rgb_u32(value: u32) -> Self {
        let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Parse a hex color string (e.g., "#ef4444", "ef4444" or "#fb6")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::from_rgb_u32(value))
    }

    /// Convert to hex string (e.g., "#ef4444")
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Convert to array for GPU upload
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// wgpu clear color
    pub fn to_wgpu(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Stroke styling for shape outlines
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

/// Fill and/or stroke of a backdrop shape
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<StrokeStyle>,
}

impl ShapeStyle {
    pub fn fill_only(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn fill_and_stroke(fill: Color, stroke: StrokeStyle) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
        }
    }
}

/// Vector primitives drawn by `Graphics` nodes. These only ever make up the
/// workspace backdrop and are never serialized.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicsShape {
    Rect { rect: BoundingBox, style: ShapeStyle },
    Circle { center: DVec2, radius: f64, style: ShapeStyle },
    /// Soft shadow around `rect`, fading out over `spread` units
    Shadow { rect: BoundingBox, spread: f64, color: Color },
}

/// Image backing a sprite, sized in its natural pixels
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub url: String,
    pub width: f64,
    pub height: f64,
}

impl Texture {
    pub fn new(url: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }
}

/// Where a sprite's image came from: a persistent url and/or the content
/// hash under which the bytes live in the asset cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_style: String,
    pub font_variant: String,
    pub font_weight: String,
    pub fill: String,
    /// Extra space between lines
    pub leading: f64,
    pub letter_spacing: f64,
    pub padding: f64,
    pub trim: bool,
    pub text_baseline: String,
    pub white_space: String,
    pub word_wrap: bool,
    pub word_wrap_width: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 26.0,
            font_style: "normal".to_string(),
            font_variant: "normal".to_string(),
            font_weight: "normal".to_string(),
            fill: "#000000".to_string(),
            leading: 0.0,
            letter_spacing: 0.0,
            padding: 0.0,
            trim: false,
            text_baseline: "alphabetic".to_string(),
            white_space: "pre".to_string(),
            word_wrap: false,
            word_wrap_width: 100.0,
        }
    }
}

impl TextStyle {
    /// CSS `font` shorthand, as understood by canvas 2D contexts
    pub fn css_font(&self) -> String {
        format!(
            "{} {} {} {}px {}",
            self.font_style, self.font_variant, self.font_weight, self.font_size, self.font_family
        )
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * 1.2 + self.leading
    }
}
