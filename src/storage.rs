//! IndexedDB cache of dropped image bytes, keyed by content hash.

use sha2::{Digest, Sha256};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbOpenDbRequest, IdbRequest, IdbTransactionMode, IdbVersionChangeEvent};

use crate::error::{EditorError, Result};

pub const DB_NAME: &str = "fileCache";
pub const STORE_NAME: &str = "files";
pub const DB_VERSION: u32 = 1;

/// Hex encoded SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Object URL for in-memory image bytes, usable as an `<image>` href
pub fn object_url(bytes: &[u8], mime: Option<&str>) -> Result<String> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let blob = match mime {
        Some(mime) => {
            let options = web_sys::BlobPropertyBag::new();
            options.set_type(mime);
            web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?
        }
        None => web_sys::Blob::new_with_u8_array_sequence(&parts)?,
    };
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Await an IndexedDB request's `success`/`error` events
async fn request_result(request: &IdbRequest) -> Result<JsValue> {
    // only one of the two fires; both are dropped once the request settles
    let mut callbacks = None;
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let success_target = request.clone();
        let on_success = Closure::once(move |_event: web_sys::Event| {
            let value = success_target.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &value);
        });
        let error_target = request.clone();
        let on_error = Closure::once(move |_event: web_sys::Event| {
            let error = error_target
                .error()
                .ok()
                .flatten()
                .map(JsValue::from)
                .unwrap_or_else(|| JsValue::from_str("request failed"));
            let _ = reject.call1(&JsValue::NULL, &error);
        });
        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        callbacks = Some((on_success, on_error));
    });
    let result = JsFuture::from(promise).await;
    request.set_onsuccess(None);
    request.set_onerror(None);
    drop(callbacks);
    result.map_err(|err| EditorError::Storage(EditorError::from(err).to_string()))
}

/// Content-addressed byte store on top of IndexedDB
#[derive(Clone, Default)]
pub struct AssetStore {
    db: Option<IdbDatabase>,
}

impl AssetStore {
    /// A store whose database has not been opened yet
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Open (and on first use create) the cache database
    pub async fn open() -> Result<Self> {
        let factory = gloo_utils::window()
            .indexed_db()?
            .ok_or_else(|| EditorError::Storage("IndexedDB is not available".to_string()))?;
        let request: IdbOpenDbRequest = factory.open_with_u32(DB_NAME, DB_VERSION)?;

        let upgrade_target = request.clone();
        let on_upgrade = Closure::<dyn FnMut(IdbVersionChangeEvent)>::new(move |_event| {
            let Ok(result) = upgrade_target.result() else { return };
            let Ok(db) = result.dyn_into::<IdbDatabase>() else { return };
            if !db.object_store_names().contains(STORE_NAME) {
                if let Err(err) = db.create_object_store(STORE_NAME) {
                    log::error!("failed to create object store: {}", EditorError::from(err));
                }
            }
        });
        request.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));

        let result = request_result(&request).await;
        request.set_onupgradeneeded(None);
        drop(on_upgrade);

        let db = result?
            .dyn_into::<IdbDatabase>()
            .map_err(|_| EditorError::Storage("open did not return a database".to_string()))?;
        log::info!("asset cache {DB_NAME} v{DB_VERSION} opened");
        Ok(Self { db: Some(db) })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<web_sys::IdbObjectStore> {
        let db = self.db.as_ref().ok_or(EditorError::StorageClosed)?;
        let transaction = db.transaction_with_str_and_mode(STORE_NAME, mode)?;
        Ok(transaction.object_store(STORE_NAME)?)
    }

    pub async fn save_file(&self, hash: &str, bytes: &[u8]) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let data = js_sys::Uint8Array::from(bytes).buffer();
        let request = store.put_with_key(&data, &JsValue::from_str(hash))?;
        request_result(&request).await?;
        log::debug!("cached {} bytes under {hash}", bytes.len());
        Ok(())
    }

    pub async fn get_file(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let request = store.get(&JsValue::from_str(hash))?;
        let value = request_result(&request).await?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        let buffer = value
            .dyn_into::<js_sys::ArrayBuffer>()
            .map_err(|_| EditorError::Storage(format!("entry {hash} is not binary data")))?;
        Ok(Some(js_sys::Uint8Array::new(&buffer).to_vec()))
    }
}
