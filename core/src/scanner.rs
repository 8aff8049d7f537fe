//! Host scanning
//!
//! Reconciles one image widget host: every toolbar inside it gets exactly
//! one trigger button, and every trigger is enabled only while the host has
//! a resolved image. Scans are idempotent, which is what keeps the mutation
//! observers from feeding on their own writes.

use std::ops::AddAssign;

use crate::context::Context;
use crate::dom::{Dom, DomEvent};
use crate::error::DomError;
use crate::matcher::Matcher;
use crate::overlay::Overlay;

/// Square glyph shown inside the trigger.
const TRIGGER_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="100%" height="100%"><path fill="currentColor" d="M4 4h16v16H4z"/></svg>"#;

/// Outcome of a scan, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub hosts: usize,
    pub toolbars: usize,
    /// Triggers created during this scan
    pub inserted: usize,
    /// Triggers whose state was refreshed
    pub triggers: usize,
    /// Hosts that currently show an image
    pub with_image: usize,
}

impl AddAssign for ScanReport {
    fn add_assign(&mut self, other: Self) {
        self.hosts += other.hosts;
        self.toolbars += other.toolbars;
        self.inserted += other.inserted;
        self.triggers += other.triggers;
        self.with_image += other.with_image;
    }
}

/// The image the host currently displays, preferring the real photo frame
/// over any stray `<img>` such as label icons.
pub fn pick_image<D: Dom>(ctx: &Context<D>, host: &D::Node) -> Option<D::Node> {
    ctx.settings().images.first_match(ctx.dom(), host)
}

/// Resolved source of the host's current image, if any.
pub fn current_source<D: Dom>(ctx: &Context<D>, host: &D::Node) -> Option<String> {
    pick_image(ctx, host)
        .map(|img| ctx.dom().image_source(&img))
        .filter(|src| !src.is_empty())
}

/// Ensure a trigger in every toolbar of `host` and refresh trigger state.
pub fn scan_host<D: Dom>(
    ctx: &Context<D>,
    host: &D::Node,
    overlay: &Overlay<D::Node>,
) -> Result<ScanReport, DomError> {
    let dom = ctx.dom();
    let settings = ctx.settings();

    let toolbars = settings.toolbars.all_matches(dom, host);
    let mut report = ScanReport {
        hosts: 1,
        toolbars: toolbars.len(),
        ..Default::default()
    };

    for toolbar in &toolbars {
        if install_trigger(ctx, toolbar, host, overlay)? {
            report.inserted += 1;
        }
    }

    let has_image = current_source(ctx, host).is_some();
    if has_image {
        report.with_image = 1;
    }
    for trigger in dom.query_all(host, settings.trigger()) {
        set_trigger_state(dom, &trigger, has_image)?;
        report.triggers += 1;
    }

    Ok(report)
}

/// Open the overlay on whatever image the host shows right now.
///
/// The image is looked up again on every click since the widget swaps its
/// `<img>` node when the picture changes.
pub fn open_from_host<D: Dom>(
    ctx: &Context<D>,
    host: &D::Node,
    overlay: &Overlay<D::Node>,
) -> Result<(), DomError> {
    match current_source(ctx, host) {
        Some(src) => overlay.open(ctx.dom(), &src),
        None => Ok(()),
    }
}

/// Returns `true` if a new trigger was inserted.
fn install_trigger<D: Dom>(
    ctx: &Context<D>,
    toolbar: &D::Node,
    host: &D::Node,
    overlay: &Overlay<D::Node>,
) -> Result<bool, DomError> {
    let dom = ctx.dom();
    let settings = ctx.settings();

    if dom.query(toolbar, settings.trigger()).is_some() {
        return Ok(false);
    }

    let fullscreen = settings.fullscreen.first_match(dom, toolbar);
    let button = build_trigger(ctx, fullscreen.as_ref())?;

    let on_click = {
        let ctx = ctx.clone();
        let host = host.clone();
        let overlay = overlay.clone();
        move || {
            if let Err(e) = open_from_host(&ctx, &host, &overlay) {
                tracing::warn!(error = %e, "Failed to open image overlay");
            }
        }
    };
    dom.listen(&button, DomEvent::Click, Box::new(on_click))?;

    match fullscreen {
        Some(full) if dom.parent(&full).as_ref() == Some(toolbar) => {
            dom.insert_before(toolbar, &button, &full)?;
        }
        _ => dom.prepend(toolbar, &button)?,
    }

    Ok(true)
}

/// Build a trigger styled after the toolbar's fullscreen button when there
/// is one, so it blends into the widget theme.
fn build_trigger<D: Dom>(ctx: &Context<D>, fullscreen: Option<&D::Node>) -> Result<D::Node, DomError> {
    let dom = ctx.dom();
    let settings = ctx.settings();

    let base_class = fullscreen
        .map(|full| dom.class_name(full))
        .unwrap_or_else(|| settings.fallback_button_class.clone());
    let icon_class = fullscreen
        .and_then(|full| dom.query(full, &Matcher::tag("div")))
        .map(|inner| dom.class_name(&inner))
        .unwrap_or_else(|| settings.fallback_icon_class.clone());

    let button = dom.create_element("button")?;
    dom.set_class_name(&button, join_classes(&base_class, settings.trigger_class()).as_str());
    dom.set_attribute(&button, "type", "button")?;
    dom.set_attribute(&button, "aria-label", &settings.trigger_label)?;
    dom.set_attribute(&button, "title", &settings.trigger_label)?;

    let icon = dom.create_element("div")?;
    dom.set_class_name(&icon, &icon_class);
    dom.set_inner_html(&icon, TRIGGER_ICON);
    dom.append_child(&button, &icon)?;

    Ok(button)
}

fn set_trigger_state<D: Dom>(dom: &D, trigger: &D::Node, enabled: bool) -> Result<(), DomError> {
    dom.set_hidden(trigger, !enabled)?;
    dom.set_disabled(trigger, !enabled);
    Ok(())
}

fn join_classes(base: &str, marker: &str) -> String {
    let base = base.trim();
    if base.is_empty() {
        marker.to_string()
    } else {
        format!("{base} {marker}")
    }
}
