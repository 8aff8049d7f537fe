//! Page-supplied configuration
//!
//! A page can set `window.__LIGHTBOX_CONFIG__` to a plain object before the
//! module loads. Any field it names overrides the default; a missing or
//! malformed object falls back to the defaults.

use lightbox_types::LightboxConfig;
use wasm_bindgen::prelude::*;

/// Global the page may define to override the defaults.
pub const CONFIG_GLOBAL: &str = "__LIGHTBOX_CONFIG__";

/// Deserialize a JS config object, returning None on failure
fn from_js(value: JsValue) -> Option<LightboxConfig> {
    match serde_wasm_bindgen::from_value(value) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed {}", CONFIG_GLOBAL);
            None
        }
    }
}

pub fn load() -> LightboxConfig {
    let Some(window) = web_sys::window() else {
        return LightboxConfig::default();
    };
    match js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)) {
        Ok(value) if !value.is_undefined() && !value.is_null() => from_js(value).unwrap_or_default(),
        _ => LightboxConfig::default(),
    }
}
