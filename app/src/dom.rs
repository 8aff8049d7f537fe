//! `web-sys` implementation of [`Dom`]
//!
//! Thin wrappers over the browser DOM. JS exceptions become [`DomError`]s;
//! listener and observer closures are leaked on purpose since they must
//! outlive every Rust frame for the rest of the page session.

use lightbox_core::{Callback, Dom, DomError, DomEvent, Matcher, ObserveOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlDialogElement, HtmlElement, HtmlImageElement,
    MutationObserver, MutationObserverInit,
};

pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

/// Extract a readable message from a thrown JS value
fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn add_listener(target: &web_sys::EventTarget, event: &'static str, callback: Callback) -> Result<(), DomError> {
    let closure = Closure::<dyn FnMut()>::wrap(callback);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|e| DomError::Listen {
            event,
            reason: describe(e),
        })?;
    closure.forget();
    Ok(())
}

impl Dom for WebDom {
    type Node = Element;

    // ─────────────────────────────────────────────────────────────────────────
    // Document
    // ─────────────────────────────────────────────────────────────────────────

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        self.document
            .create_element(tag)
            .map_err(|_| DomError::CreateElement { tag: tag.to_string() })
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }

    fn on_ready(&self, callback: Callback) -> Result<(), DomError> {
        add_listener(&self.document, "DOMContentLoaded", callback)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tree
    // ─────────────────────────────────────────────────────────────────────────

    fn query_all(&self, root: &Element, matcher: &Matcher) -> Vec<Element> {
        let selector = matcher.to_css();
        let list = match root.query_selector_all(&selector) {
            Ok(list) => list,
            Err(e) => {
                tracing::debug!(%selector, error = %describe(e), "Selector rejected");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query(&self, root: &Element, matcher: &Matcher) -> Option<Element> {
        root.query_selector(&matcher.to_css()).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| DomError::Insert(describe(e)))
    }

    fn insert_before(&self, parent: &Element, child: &Element, reference: &Element) -> Result<(), DomError> {
        parent
            .insert_before(child, Some(reference))
            .map(|_| ())
            .map_err(|e| DomError::Insert(describe(e)))
    }

    fn prepend(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent
            .prepend_with_node_1(child)
            .map_err(|e| DomError::Insert(describe(e)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────────

    fn class_name(&self, node: &Element) -> String {
        node.class_name()
    }

    fn set_class_name(&self, node: &Element, value: &str) {
        node.set_class_name(value);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(|e| DomError::Attribute {
            name: name.to_string(),
            reason: describe(e),
        })
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn flag(&self, node: &Element, name: &str) -> bool {
        js_sys::Reflect::get(node, &JsValue::from_str(name))
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    fn set_flag(&self, node: &Element, name: &str) {
        js_sys::Reflect::set(node, &JsValue::from_str(name), &JsValue::TRUE).ok();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Controls
    // ─────────────────────────────────────────────────────────────────────────

    fn image_source(&self, image: &Element) -> String {
        match image.dyn_ref::<HtmlImageElement>() {
            Some(img) => {
                let current = img.current_src();
                if current.is_empty() { img.src() } else { current }
            }
            None => image.get_attribute("src").unwrap_or_default(),
        }
    }

    fn set_image_source(&self, image: &Element, src: &str) {
        match image.dyn_ref::<HtmlImageElement>() {
            Some(img) => img.set_src(src),
            None => {
                image.set_attribute("src", src).ok();
            }
        }
    }

    fn set_hidden(&self, node: &Element, hidden: bool) -> Result<(), DomError> {
        let Some(html) = node.dyn_ref::<HtmlElement>() else {
            return Ok(());
        };
        html.style()
            .set_property("display", if hidden { "none" } else { "" })
            .map_err(|e| DomError::Attribute {
                name: "style".to_string(),
                reason: describe(e),
            })
    }

    fn set_disabled(&self, node: &Element, disabled: bool) {
        if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            node.set_attribute("disabled", "").ok();
        } else {
            node.remove_attribute("disabled").ok();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dialog
    // ─────────────────────────────────────────────────────────────────────────

    fn show_modal(&self, dialog: &Element) -> Result<(), DomError> {
        dialog
            .dyn_ref::<HtmlDialogElement>()
            .ok_or_else(|| DomError::ShowModal("element is not a <dialog>".to_string()))?
            .show_modal()
            .map_err(|e| DomError::ShowModal(describe(e)))
    }

    fn close(&self, dialog: &Element) {
        if let Some(dialog) = dialog.dyn_ref::<HtmlDialogElement>() {
            dialog.close();
        }
    }

    fn is_open(&self, dialog: &Element) -> bool {
        dialog
            .dyn_ref::<HtmlDialogElement>()
            .is_some_and(HtmlDialogElement::open)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    fn listen(&self, target: &Element, event: DomEvent, callback: Callback) -> Result<(), DomError> {
        add_listener(target, event.name(), callback)
    }

    fn observe(&self, target: &Element, options: &ObserveOptions, callback: Callback) -> Result<(), DomError> {
        let closure = Closure::<dyn FnMut()>::wrap(callback);
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|e| DomError::Observe(describe(e)))?;

        let init = MutationObserverInit::new();
        init.set_child_list(options.child_list);
        init.set_subtree(options.subtree);
        if !options.attribute_filter.is_empty() {
            let filter = js_sys::Array::new();
            for name in &options.attribute_filter {
                filter.push(&JsValue::from_str(name));
            }
            init.set_attributes(true);
            init.set_attribute_filter(&filter);
        }

        observer
            .observe_with_options(target, &init)
            .map_err(|e| DomError::Observe(describe(e)))?;
        // The observed node keeps the observer alive; the callback is ours to leak.
        closure.forget();
        Ok(())
    }
}
