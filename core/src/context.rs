//! Compiled settings and the shared handle passed to every callback.

use std::rc::Rc;

use lightbox_types::{LightboxConfig, WatchMode};

use crate::dom::Dom;
use crate::matcher::{Matcher, Signatures};

/// [`LightboxConfig`] with its signature lists compiled into matchers.
#[derive(Debug, Clone)]
pub struct Settings {
    pub overlay_id: String,
    pub bound_flag: String,
    pub trigger_label: String,
    pub fallback_button_class: String,
    pub fallback_icon_class: String,
    pub watch_mode: WatchMode,
    pub hosts: Signatures,
    pub toolbars: Signatures,
    pub images: Signatures,
    pub fullscreen: Signatures,
    trigger_class: String,
    trigger: Matcher,
}

impl Settings {
    pub fn from_config(config: &LightboxConfig) -> Self {
        Self {
            overlay_id: config.overlay_id.clone(),
            bound_flag: config.bound_flag.clone(),
            trigger_label: config.trigger_label.clone(),
            fallback_button_class: config.fallback_button_class.clone(),
            fallback_icon_class: config.fallback_icon_class.clone(),
            watch_mode: config.watch_mode,
            hosts: Signatures::from_specs(&config.hosts),
            toolbars: Signatures::from_specs(&config.toolbars),
            images: Signatures::from_specs(&config.images),
            fullscreen: Signatures::from_specs(&config.fullscreen_signatures()),
            trigger_class: config.trigger_class.clone(),
            trigger: Matcher::class(config.trigger_class.as_str()),
        }
    }

    pub fn trigger_class(&self) -> &str {
        &self.trigger_class
    }

    /// Matches injected trigger buttons by their marker class.
    pub fn trigger(&self) -> &Matcher {
        &self.trigger
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&LightboxConfig::default())
    }
}

/// Document plus settings. Cheap to clone into event handlers.
pub struct Context<D: Dom> {
    dom: Rc<D>,
    settings: Rc<Settings>,
}

impl<D: Dom> Clone for Context<D> {
    fn clone(&self) -> Self {
        Self {
            dom: Rc::clone(&self.dom),
            settings: Rc::clone(&self.settings),
        }
    }
}

impl<D: Dom> Context<D> {
    pub fn new(dom: Rc<D>, settings: Settings) -> Self {
        Self {
            dom,
            settings: Rc::new(settings),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
