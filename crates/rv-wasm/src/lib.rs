//! WebAssembly bindings for the Revisit content script
//!
//! The extension's JS glue feeds this module the raw page signals
//! (startup, beforeunload, MutationObserver batches, runtime messages) and
//! hands over its storage adapter at init. Everything else - whitelist
//! matching, history bookkeeping, banner state - happens in `rv-core`, and
//! the resulting banner operations are applied to the real DOM here.

use std::cell::RefCell;
use std::rc::Rc;

use futures::lock::Mutex;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element};

use rv_core::{
    BannerOp, Command, NavigationTrigger, Storage, StorageError, Tracker, VisitHistory,
    BANNER_SPACER_ID, BANNER_TEXT_ID,
};

const HISTORY_KEY: &str = "visitHistory";
const FILTERS_KEY: &str = "filters";

// =============================================================================
// Storage bridge
// =============================================================================

/// Adapter over the extension storage object passed to [`init`]: anything
/// with `get(key)`, `set(record)` and `remove(key)` methods returning
/// Promises, i.e. `browser.storage.local`.
struct JsStorage {
    adapter: JsValue,
}

impl JsStorage {
    fn new(adapter: JsValue) -> Self {
        Self { adapter }
    }

    async fn invoke(&self, method: &str, arg: &JsValue) -> Result<JsValue, StorageError> {
        let func = js_sys::Reflect::get(&self.adapter, &JsValue::from_str(method))
            .map_err(|e| backend_error(method, &e))?;
        let func: js_sys::Function = func
            .dyn_into()
            .map_err(|_| StorageError::Backend(format!("storage adapter has no '{method}'")))?;
        let promise: js_sys::Promise = func
            .call1(&self.adapter, arg)
            .map_err(|e| backend_error(method, &e))?
            .into();
        JsFuture::from(promise)
            .await
            .map_err(|e| backend_error(method, &e))
    }

    /// `get(key)` resolves to `{ key: value }`; pull the value out and
    /// re-encode it as JSON text for serde.
    async fn load_json(&self, key: &'static str) -> Result<Option<String>, StorageError> {
        let results = self.invoke("get", &JsValue::from_str(key)).await?;
        let value = js_sys::Reflect::get(&results, &JsValue::from_str(key))
            .map_err(|e| backend_error("get", &e))?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        let text = js_sys::JSON::stringify(&value).map_err(|e| backend_error("get", &e))?;
        Ok(Some(String::from(text)))
    }

    /// `set({ key: value })` with the value built from JSON text.
    async fn store_json(&self, key: &'static str, json: &str) -> Result<(), StorageError> {
        let record =
            js_sys::JSON::parse(&format!("{{\"{key}\":{json}}}")).map_err(|e| backend_error("set", &e))?;
        self.invoke("set", &record).await?;
        Ok(())
    }
}

fn backend_error(method: &str, error: &JsValue) -> StorageError {
    let detail = error
        .as_string()
        .or_else(|| js_sys::JSON::stringify(error).ok().map(String::from))
        .unwrap_or_else(|| "unknown error".to_string());
    StorageError::Backend(format!("{method}: {detail}"))
}

impl Storage for JsStorage {
    async fn load_history(&self) -> Result<Option<VisitHistory>, StorageError> {
        match self.load_json(HISTORY_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StorageError::Malformed {
                    key: HISTORY_KEY,
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn store_history(&self, history: &VisitHistory) -> Result<(), StorageError> {
        let json = serde_json::to_string(history)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.store_json(HISTORY_KEY, &json).await
    }

    async fn remove_history(&self) -> Result<(), StorageError> {
        self.invoke("remove", &JsValue::from_str(HISTORY_KEY)).await?;
        Ok(())
    }

    async fn load_filters(&self) -> Result<Option<Vec<String>>, StorageError> {
        match self.load_json(FILTERS_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StorageError::Malformed {
                    key: FILTERS_KEY,
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn store_filters(&self, filters: &[String]) -> Result<(), StorageError> {
        let json = serde_json::to_string(filters)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.store_json(FILTERS_KEY, &json).await
    }
}

// =============================================================================
// Page-global tracker
// =============================================================================

type PageTracker = Tracker<JsStorage>;
type SharedTracker = Rc<Mutex<PageTracker>>;

thread_local! {
    // One tracker per page context. Handlers overlap freely on this page
    // (a MutationObserver batch can fire while another handler is parked
    // on a storage future), so all tracker access goes through a
    // future-aware lock: late arrivals queue behind the operation in
    // flight instead of re-entering it. Storage writes from other
    // contexts (the settings UI) stay unsynchronized; that read-modify-
    // write overlap is inherent to the storage collaborator.
    static TRACKER: RefCell<Option<SharedTracker>> = const { RefCell::new(None) };
}

fn tracker_handle() -> Result<SharedTracker, JsValue> {
    TRACKER
        .with(|t| t.borrow().clone())
        .ok_or_else(|| JsValue::from_str("Not initialized. Call init(storage) first."))
}

fn to_js_error(error: StorageError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Install the storage adapter and construct the page tracker.
#[wasm_bindgen]
pub fn init(storage: JsValue) -> Result<(), JsValue> {
    TRACKER.with(|t| {
        let mut slot = t.borrow_mut();
        if slot.is_some() {
            return Err(JsValue::from_str(
                "Already initialized. Reload the page to reinitialize.",
            ));
        }
        *slot = Some(Rc::new(Mutex::new(Tracker::new(JsStorage::new(storage)))));
        Ok(())
    })
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    TRACKER.with(|t| t.borrow().is_some())
}

/// Startup pass: make sure the persisted values exist, then show or remove
/// the banner for the page the script just loaded into.
#[wasm_bindgen]
pub async fn startup() -> Result<(), JsValue> {
    let tracker = tracker_handle()?;
    let mut tracker = tracker.lock().await;
    tracker.ensure_initialized().await.map_err(to_js_error)?;
    let op = tracker
        .refresh_banner(&current_url()?)
        .await
        .map_err(to_js_error)?;
    apply_banner_op(&op)
}

/// beforeunload: capture the outgoing URL as a visit.
#[wasm_bindgen]
pub async fn on_page_teardown() -> Result<(), JsValue> {
    handle_navigation(NavigationTrigger::PageTeardown).await
}

/// MutationObserver batch: check for an SPA route change.
#[wasm_bindgen]
pub async fn on_dom_mutation() -> Result<(), JsValue> {
    handle_navigation(NavigationTrigger::DomMutation).await
}

async fn handle_navigation(trigger: NavigationTrigger) -> Result<(), JsValue> {
    let tracker = tracker_handle()?;
    let mut tracker = tracker.lock().await;
    let op = tracker
        .handle_navigation(trigger, &current_url()?)
        .await
        .map_err(to_js_error)?;
    apply_banner_op(&op)
}

/// Route a runtime message. Returns the acknowledgement object, or
/// `undefined` for messages that are not ours.
#[wasm_bindgen]
pub async fn dispatch_message(message: JsValue) -> Result<JsValue, JsValue> {
    let text = js_sys::JSON::stringify(&message)
        .map_err(|_| JsValue::from_str("message is not serializable"))?;
    let command: Command = match serde_json::from_str(&String::from(text)) {
        Ok(command) => command,
        // Other listeners' traffic shares the channel; ignore it.
        Err(_) => return Ok(JsValue::UNDEFINED),
    };

    let tracker = tracker_handle()?;
    let mut tracker = tracker.lock().await;
    let outcome = tracker
        .dispatch(command, &current_url()?)
        .await
        .map_err(to_js_error)?;
    apply_banner_op(&outcome.banner)?;

    let ack = serde_json::to_string(&outcome.ack)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&ack)
}

// =============================================================================
// DOM surface
// =============================================================================

fn current_url() -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.location().href()
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn apply_banner_op(op: &BannerOp) -> Result<(), JsValue> {
    match op {
        BannerOp::Insert { text } => insert_banner(text),
        BannerOp::SetText { text } => set_banner_text(text),
        BannerOp::Remove => remove_banner(),
        BannerOp::Keep => Ok(()),
    }
}

fn insert_banner(text: &str) -> Result<(), JsValue> {
    let document = document()?;

    // The ids are fixed, so a banner left over in the DOM is reused rather
    // than duplicated.
    if let Some(existing) = document.get_element_by_id(BANNER_TEXT_ID) {
        existing.set_text_content(Some(text));
        return Ok(());
    }

    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;

    let text_el: Element = document.create_element("div")?;
    text_el.set_id(BANNER_TEXT_ID);
    text_el.set_attribute("style", "text-align: center;")?;
    text_el.set_text_content(Some(text));

    let spacer: Element = document.create_element("div")?;
    spacer.set_id(BANNER_SPACER_ID);

    body.insert_before(&text_el, body.first_child().as_ref())?;
    body.insert_before(&spacer, Some(text_el.as_ref()))?;
    Ok(())
}

fn set_banner_text(text: &str) -> Result<(), JsValue> {
    match document()?.get_element_by_id(BANNER_TEXT_ID) {
        Some(element) => {
            element.set_text_content(Some(text));
            Ok(())
        }
        // Page scripts may have torn the banner down behind our back.
        None => insert_banner(text),
    }
}

fn remove_banner() -> Result<(), JsValue> {
    let document = document()?;
    if let Some(element) = document.get_element_by_id(BANNER_SPACER_ID) {
        element.remove();
    }
    if let Some(element) = document.get_element_by_id(BANNER_TEXT_ID) {
        element.remove();
    }
    Ok(())
}
