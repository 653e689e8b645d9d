use std::cell::RefCell;
use std::rc::Rc;

use dioxus::logger::tracing;
use js_sys::{Array, Function, Promise};
use tourmap_shared::lifecycle::VisibilityGate;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// Distance outside the viewport that already counts as visible.
const ROOT_MARGIN: &str = "50px";

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// One-shot subscription that fires the first time a canvas scrolls into view.
///
/// Dropping the watch disconnects the observer.
pub struct VisibilityWatch {
    gate: Rc<RefCell<VisibilityGate>>,
    observer: Option<IntersectionObserver>,
    _callback: Option<ObserverCallback>,
}

impl VisibilityWatch {
    /// Start observing `element`. The future resolves on the first
    /// intersection, or right away where `IntersectionObserver` is missing.
    pub fn observe(element: &Element) -> Result<(Self, JsFuture), JsValue> {
        let gate = Rc::new(RefCell::new(VisibilityGate::default()));
        let mut resolve = None;
        let promise = Promise::new(&mut |res: Function, _rej: Function| resolve = Some(res));
        let resolve = resolve.ok_or_else(|| JsValue::from_str("promise executor did not run"))?;

        if !observer_supported() {
            gate.borrow_mut().render_now();
            resolve.call0(&JsValue::NULL)?;
            let watch = VisibilityWatch {
                gate,
                observer: None,
                _callback: None,
            };
            return Ok((watch, JsFuture::from(promise)));
        }

        let callback_gate = Rc::clone(&gate);
        let callback: ObserverCallback =
            Closure::new(move |entries: Array, observer: IntersectionObserver| {
                let visible = entries
                    .iter()
                    .any(|e| e.unchecked_into::<IntersectionObserverEntry>().is_intersecting());
                if callback_gate.borrow_mut().on_intersection(visible) {
                    observer.disconnect();
                    if let Err(err) = resolve.call0(&JsValue::NULL) {
                        tracing::error!(?err, "Failed to start map render");
                    }
                }
            });

        let init = IntersectionObserverInit::new();
        init.set_root_margin(ROOT_MARGIN);
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        observer.observe(element);

        let watch = VisibilityWatch {
            gate,
            observer: Some(observer),
            _callback: Some(callback),
        };
        Ok((watch, JsFuture::from(promise)))
    }

    /// Stop observing if rendering has not started yet.
    pub fn withdraw(&self) {
        if self.gate.borrow_mut().withdraw() {
            tracing::debug!("Map unobserved before it became visible");
            if let Some(observer) = &self.observer {
                observer.disconnect();
            }
        }
    }
}

impl Drop for VisibilityWatch {
    fn drop(&mut self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}

fn observer_supported() -> bool {
    web_sys::window()
        .and_then(|w| js_sys::Reflect::has(&w, &JsValue::from_str("IntersectionObserver")).ok())
        .unwrap_or(false)
}
