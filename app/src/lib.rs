//! Browser entry point
//!
//! Loaded as a wasm module alongside the generated interface. On start it
//! installs console logging, reads the optional page configuration and mounts
//! the augmenter on the live document.

mod config;
mod dom;

use std::rc::Rc;

use dioxus_logger::tracing::Level;
use lightbox_core::Augmenter;
use wasm_bindgen::prelude::*;

pub use config::CONFIG_GLOBAL;
pub use dom::WebDom;

#[wasm_bindgen(start)]
pub fn start() {
    // A host page may already have installed a subscriber
    let _ = dioxus_logger::init(Level::INFO);

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        tracing::warn!("No document available, image lightbox disabled");
        return;
    };

    let config = config::load();
    let augmenter = Augmenter::new(Rc::new(WebDom::new(document)), &config);
    if let Err(e) = augmenter.mount() {
        tracing::warn!(error = %e, "Image lightbox setup failed");
    }
}
