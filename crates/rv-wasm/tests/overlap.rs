//! Overlapping handler calls on one page context.
//!
//! A MutationObserver batch or a runtime message can arrive while an earlier
//! handler is still parked on a storage future. Every entry point must queue
//! behind the operation in flight and complete; none may trap the instance.

#![cfg(target_arch = "wasm32")]

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

/// Minimal `browser.storage.local` stand-in: `get`/`set`/`remove` over a
/// plain object, each resolving on the microtask queue like the real API.
fn storage_stub() -> JsValue {
    let backing = Object::new();
    let adapter = Object::new();

    let get_backing = backing.clone();
    let get = Closure::wrap(Box::new(move |key: JsValue| -> Promise {
        let record = Object::new();
        let value = Reflect::get(&get_backing, &key).unwrap_or(JsValue::UNDEFINED);
        Reflect::set(&record, &key, &value).unwrap();
        Promise::resolve(&record)
    }) as Box<dyn FnMut(JsValue) -> Promise>);
    Reflect::set(&adapter, &JsValue::from_str("get"), get.as_ref()).unwrap();
    get.forget();

    let set_backing = backing.clone();
    let set = Closure::wrap(Box::new(move |record: JsValue| -> Promise {
        Object::assign(&set_backing, &Object::from(record));
        Promise::resolve(&JsValue::UNDEFINED)
    }) as Box<dyn FnMut(JsValue) -> Promise>);
    Reflect::set(&adapter, &JsValue::from_str("set"), set.as_ref()).unwrap();
    set.forget();

    let remove_backing = backing.clone();
    let remove = Closure::wrap(Box::new(move |key: JsValue| -> Promise {
        let _ = Reflect::delete_property(&remove_backing, &key);
        Promise::resolve(&JsValue::UNDEFINED)
    }) as Box<dyn FnMut(JsValue) -> Promise>);
    Reflect::set(&adapter, &JsValue::from_str("remove"), remove.as_ref()).unwrap();
    remove.forget();

    adapter.into()
}

#[wasm_bindgen_test]
async fn overlapping_signals_all_complete() {
    rv_wasm::init(storage_stub()).unwrap();
    rv_wasm::startup().await.unwrap();

    // Fire both navigation handlers without awaiting the first: the second
    // arrives while the first is suspended on its storage future.
    let (teardown, mutation) =
        futures::future::join(rv_wasm::on_page_teardown(), rv_wasm::on_dom_mutation()).await;
    teardown.unwrap();
    mutation.unwrap();

    // A runtime message queues the same way and still gets its ack.
    let message = js_sys::JSON::parse(r#"{"command":"cleanupVisitHistory"}"#).unwrap();
    let ack = rv_wasm::dispatch_message(message).await.unwrap();
    let command = Reflect::get(&ack, &JsValue::from_str("command")).unwrap();
    assert_eq!(command.as_string().as_deref(), Some("cleanHistoryComplete"));
}
