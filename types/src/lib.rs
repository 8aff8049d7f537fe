//! Configuration types for the image lightbox augmenter.
//!
//! Every field carries a serde default, so a page can override a single
//! knob (for example only `trigger_label`) and inherit the rest. The same
//! types deserialize from TOML and from a plain JS object.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Markup Signatures
// ─────────────────────────────────────────────────────────────────────────────

/// A serializable description of one markup signature.
///
/// Variant order matters for untagged deserialization: the most specific
/// shapes come first so `{ tag, attr, value }` is never read as a bare tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignatureSpec {
    /// `target` nested anywhere below an element matching `within`
    Within {
        within: Box<SignatureSpec>,
        target: Box<SignatureSpec>,
    },
    /// Element with the given tag whose attribute equals `value` exactly
    Attr {
        tag: String,
        attr: String,
        value: String,
    },
    /// Element carrying the class
    Class { class: String },
    /// Element with the tag name
    Tag { tag: String },
}

impl SignatureSpec {
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag { tag: tag.into() }
    }

    pub fn attr(tag: impl Into<String>, attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attr {
            tag: tag.into(),
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn within(within: SignatureSpec, target: SignatureSpec) -> Self {
        Self::Within {
            within: Box::new(within),
            target: Box::new(target),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Watch Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Which subtree the mutation observers cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchMode {
    /// One observer on the document body. Hosts inserted after startup are
    /// picked up on the next mutation.
    #[default]
    Document,
    /// One observer per host found at startup. Late hosts are never scanned.
    PerHost,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lightbox Config
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_OVERLAY_ID: &str = "modal_dlg";
pub const DEFAULT_TRIGGER_CLASS: &str = "view-modal-btn";
pub const DEFAULT_TRIGGER_LABEL: &str = "View modal screen";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    /// Element id of the shared `<dialog>`
    pub overlay_id: String,
    /// Expando property marking the dialog's dismissal handlers as bound
    pub bound_flag: String,
    /// Marker class identifying injected trigger buttons
    pub trigger_class: String,
    /// `aria-label` and `title` of injected trigger buttons
    pub trigger_label: String,
    /// Button class used when the toolbar has no fullscreen button to copy
    pub fallback_button_class: String,
    /// Icon wrapper class used when the toolbar has no fullscreen button to copy
    pub fallback_icon_class: String,
    pub watch_mode: WatchMode,
    /// Image widget host signatures
    pub hosts: Vec<SignatureSpec>,
    /// Toolbar container signatures, in priority order
    pub toolbars: Vec<SignatureSpec>,
    /// Image element signatures, most specific first
    pub images: Vec<SignatureSpec>,
    /// Exact labels identifying the widget's own fullscreen button
    pub fullscreen_labels: Vec<String>,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            overlay_id: DEFAULT_OVERLAY_ID.to_string(),
            bound_flag: "_modalBound".to_string(),
            trigger_class: DEFAULT_TRIGGER_CLASS.to_string(),
            trigger_label: DEFAULT_TRIGGER_LABEL.to_string(),
            fallback_button_class: "svelte-vzs2gq padded".to_string(),
            fallback_icon_class: "svelte-vzs2gq small".to_string(),
            watch_mode: WatchMode::default(),
            hosts: vec![SignatureSpec::class("modal-image")],
            toolbars: vec![
                SignatureSpec::class("icon-button-wrapper"),
                SignatureSpec::class("gr-image__tool"),
            ],
            images: vec![
                SignatureSpec::within(SignatureSpec::class("image-frame"), SignatureSpec::tag("img")),
                SignatureSpec::tag("img"),
            ],
            fullscreen_labels: vec![
                "View in full screen".to_string(),
                "View fullscreen".to_string(),
                "View full screen".to_string(),
            ],
        }
    }
}

impl LightboxConfig {
    /// Fullscreen button signatures expanded from `fullscreen_labels`.
    ///
    /// Each label is tried against `aria-label` first, then `title`.
    pub fn fullscreen_signatures(&self) -> Vec<SignatureSpec> {
        self.fullscreen_labels
            .iter()
            .flat_map(|label| {
                [
                    SignatureSpec::attr("button", "aria-label", label.as_str()),
                    SignatureSpec::attr("button", "title", label.as_str()),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: LightboxConfig = toml::from_str("").unwrap();
        assert_eq!(config, LightboxConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
trigger_label = "Open preview"
watch_mode = "per_host"
"#;

        let config: LightboxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.trigger_label, "Open preview");
        assert_eq!(config.watch_mode, WatchMode::PerHost);
        assert_eq!(config.overlay_id, DEFAULT_OVERLAY_ID);
        assert_eq!(config.toolbars.len(), 2);
    }

    #[test]
    fn test_parse_signatures() {
        let toml = r#"
hosts = [{ class = "gallery" }]
toolbars = [{ tag = "nav" }]
images = [
    { within = { class = "frame" }, target = { tag = "img" } },
    { tag = "img", attr = "data-role", value = "photo" },
]
"#;

        let config: LightboxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.hosts, vec![SignatureSpec::class("gallery")]);
        assert_eq!(config.toolbars, vec![SignatureSpec::tag("nav")]);
        assert_eq!(
            config.images,
            vec![
                SignatureSpec::within(SignatureSpec::class("frame"), SignatureSpec::tag("img")),
                SignatureSpec::attr("img", "data-role", "photo"),
            ]
        );
    }

    #[test]
    fn test_fullscreen_signatures_order() {
        let config = LightboxConfig {
            fullscreen_labels: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        };

        assert_eq!(
            config.fullscreen_signatures(),
            vec![
                SignatureSpec::attr("button", "aria-label", "A"),
                SignatureSpec::attr("button", "title", "A"),
                SignatureSpec::attr("button", "aria-label", "B"),
                SignatureSpec::attr("button", "title", "B"),
            ]
        );
    }
}
