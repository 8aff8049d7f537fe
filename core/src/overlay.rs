//! Shared preview overlay
//!
//! One `<dialog>` per page holds one `<img>`. It is found by id or created
//! on first use, and its dismissal handlers are bound exactly once no matter
//! how often [`ensure_overlay`] runs. Closing always clears the image source
//! so a hidden overlay never holds the previous picture.

use crate::context::Context;
use crate::dom::{Dom, DomEvent};
use crate::error::DomError;
use crate::matcher::Matcher;

/// Handle to the overlay dialog and its image element.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<N> {
    pub dialog: N,
    pub image: N,
}

impl<N> Overlay<N> {
    /// Show `src` full size. Empty sources and detached dialogs are ignored.
    pub fn open<D: Dom<Node = N>>(&self, dom: &D, src: &str) -> Result<(), DomError> {
        if src.is_empty() {
            return Ok(());
        }
        if !dom.is_connected(&self.dialog) {
            tracing::debug!("Overlay dialog is no longer in the document, ignoring open");
            return Ok(());
        }
        dom.set_image_source(&self.image, src);
        if !dom.is_open(&self.dialog) {
            dom.show_modal(&self.dialog)?;
        }
        Ok(())
    }

    /// Close the overlay. The close handler clears the image.
    pub fn dismiss<D: Dom<Node = N>>(&self, dom: &D) {
        dom.close(&self.dialog);
    }

    pub fn is_open<D: Dom<Node = N>>(&self, dom: &D) -> bool {
        dom.is_open(&self.dialog)
    }
}

/// Locate or build the overlay and make sure dismissal is wired.
pub fn ensure_overlay<D: Dom>(ctx: &Context<D>) -> Result<Overlay<D::Node>, DomError> {
    let dom = ctx.dom();
    let settings = ctx.settings();

    let dialog = match dom.element_by_id(&settings.overlay_id) {
        Some(dialog) => dialog,
        None => {
            let body = dom.body().ok_or(DomError::MissingBody)?;
            let dialog = dom.create_element("dialog")?;
            dom.set_attribute(&dialog, "id", &settings.overlay_id)?;
            dom.append_child(&body, &dialog)?;
            tracing::debug!(id = %settings.overlay_id, "Created overlay dialog");
            dialog
        }
    };

    let image = match dom.query(&dialog, &Matcher::tag("img")) {
        Some(image) => image,
        None => {
            let image = dom.create_element("img")?;
            dom.set_attribute(&image, "alt", "preview")?;
            dom.append_child(&dialog, &image)?;
            image
        }
    };

    if !dom.flag(&dialog, &settings.bound_flag) {
        bind_dismissal(ctx, &dialog, &image)?;
        dom.set_flag(&dialog, &settings.bound_flag);
    }

    Ok(Overlay { dialog, image })
}

fn bind_dismissal<D: Dom>(ctx: &Context<D>, dialog: &D::Node, image: &D::Node) -> Result<(), DomError> {
    let on_click = {
        let ctx = ctx.clone();
        let dialog = dialog.clone();
        move || ctx.dom().close(&dialog)
    };
    ctx.dom().listen(dialog, DomEvent::Click, Box::new(on_click))?;

    let on_close = {
        let ctx = ctx.clone();
        let image = image.clone();
        move || ctx.dom().set_image_source(&image, "")
    };
    ctx.dom().listen(dialog, DomEvent::Close, Box::new(on_close))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::context::Settings;
    use crate::dom::MemoryDom;

    fn context() -> (Rc<MemoryDom>, Context<MemoryDom>) {
        let dom = Rc::new(MemoryDom::new());
        let ctx = Context::new(dom.clone(), Settings::default());
        (dom, ctx)
    }

    #[test]
    fn test_creates_dialog_with_image() {
        let (dom, ctx) = context();
        let overlay = ensure_overlay(&ctx).unwrap();

        assert_eq!(dom.tag(overlay.dialog), "dialog");
        assert_eq!(dom.attr(overlay.dialog, "id").as_deref(), Some("modal_dlg"));
        assert_eq!(dom.parent(&overlay.dialog), Some(dom.body_id()));
        assert_eq!(dom.children(overlay.dialog), vec![overlay.image]);
        assert_eq!(dom.attr(overlay.image, "alt").as_deref(), Some("preview"));
    }

    #[test]
    fn test_reuses_existing_dialog() {
        let (dom, ctx) = context();
        let dialog = dom.build(dom.body_id(), "dialog", &[("id", "modal_dlg")]);
        let img = dom.build(dialog, "img", &[]);

        let overlay = ensure_overlay(&ctx).unwrap();
        assert_eq!(overlay, Overlay { dialog, image: img });
        assert_eq!(dom.children(dom.body_id()), vec![dialog]);
    }

    #[test]
    fn test_existing_dialog_without_image_gets_one() {
        let (dom, ctx) = context();
        let dialog = dom.build(dom.body_id(), "dialog", &[("id", "modal_dlg")]);

        let overlay = ensure_overlay(&ctx).unwrap();
        assert_eq!(overlay.dialog, dialog);
        assert_eq!(dom.children(dialog), vec![overlay.image]);
    }

    #[test]
    fn test_binds_handlers_once() {
        let (dom, ctx) = context();
        let mut last = None;
        for _ in 0..5 {
            last = Some(ensure_overlay(&ctx).unwrap());
        }
        let overlay = last.unwrap();

        assert_eq!(dom.listener_count(overlay.dialog, DomEvent::Click), 1);
        assert_eq!(dom.listener_count(overlay.dialog, DomEvent::Close), 1);
        assert_eq!(dom.children(dom.body_id()).len(), 1);
    }

    #[test]
    fn test_open_and_click_to_dismiss() {
        let (dom, ctx) = context();
        let overlay = ensure_overlay(&ctx).unwrap();

        overlay.open(dom.as_ref(), "a.png").unwrap();
        assert!(overlay.is_open(dom.as_ref()));
        assert_eq!(dom.image_source(&overlay.image), "a.png");

        dom.click(overlay.image);
        assert!(!overlay.is_open(dom.as_ref()));
        assert_eq!(dom.image_source(&overlay.image), "");
    }

    #[test]
    fn test_escape_clears_image() {
        let (dom, ctx) = context();
        let overlay = ensure_overlay(&ctx).unwrap();

        overlay.open(dom.as_ref(), "a.png").unwrap();
        dom.press_escape(overlay.dialog);
        assert_eq!(dom.image_source(&overlay.image), "");
    }

    #[test]
    fn test_open_ignores_empty_source() {
        let (dom, ctx) = context();
        let overlay = ensure_overlay(&ctx).unwrap();

        overlay.open(dom.as_ref(), "").unwrap();
        assert!(!overlay.is_open(dom.as_ref()));
    }

    #[test]
    fn test_open_ignores_detached_dialog() {
        let (dom, ctx) = context();
        let overlay = ensure_overlay(&ctx).unwrap();
        dom.remove(overlay.dialog);

        assert!(overlay.open(dom.as_ref(), "a.png").is_ok());
        assert!(!overlay.is_open(dom.as_ref()));
        assert_eq!(dom.image_source(&overlay.image), "");
    }
}
