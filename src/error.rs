use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors surfaced by the editor core and its browser glue
#[derive(Debug, Error)]
pub enum EditorError {
    /// A dropped file failed validation (type, size or count)
    #[error("file rejected: {0}")]
    FileRejected(String),

    #[error("failed to read file {name}: {reason}")]
    FileRead { name: String, reason: String },

    #[error("asset storage error: {0}")]
    Storage(String),

    /// The IndexedDB connection was used before `init` completed
    #[error("asset storage is not initialized")]
    StorageClosed,

    #[error("failed to decode image {url}: {reason}")]
    ImageDecode { url: String, reason: String },

    #[error("scene serialization failed: {0}")]
    Serialize(String),

    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// A node id that was removed, or names a node of the wrong kind
    #[error("invalid node {0}")]
    InvalidNode(usize),

    #[error("renderer error: {0}")]
    Render(String),

    #[error("missing DOM element: {0}")]
    MissingElement(String),

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for EditorError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        EditorError::Js(message)
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::Serialize(err.to_string())
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
