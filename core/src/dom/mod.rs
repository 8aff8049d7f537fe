//! Document abstraction
//!
//! The augmenter never touches a concrete DOM. Everything it needs from the
//! page goes through [`Dom`]: the browser binding implements it over
//! `web-sys`, and [`MemoryDom`] implements it in memory for native tests.

mod memory;

use std::fmt;

use crate::error::DomError;
use crate::matcher::Matcher;

pub use memory::{MemoryDom, NodeId};

/// Event handler registered with the document. Handlers live as long as
/// the page does.
pub type Callback = Box<dyn FnMut()>;

/// Events the augmenter listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEvent {
    Click,
    /// Fired by `<dialog>` whenever it closes, including on Escape
    Close,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Close => "close",
        }
    }
}

/// Subset of `MutationObserverInit` the watcher uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    /// Attribute names to observe. Empty means attributes are ignored.
    pub attribute_filter: Vec<String>,
}

impl ObserveOptions {
    /// Child insertions and removals plus `src` changes anywhere below.
    pub fn subtree_with_src() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attribute_filter: vec!["src".to_string()],
        }
    }

    pub fn observes_attribute(&self, name: &str) -> bool {
        self.attribute_filter.iter().any(|a| a == name)
    }
}

pub trait Dom: 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    // ── Document ────────────────────────────────────────────────────────────

    fn body(&self) -> Option<Self::Node>;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

    /// True while the document is still being parsed.
    fn is_loading(&self) -> bool;

    /// Run `callback` once parsing completes.
    fn on_ready(&self, callback: Callback) -> Result<(), DomError>;

    // ── Tree ────────────────────────────────────────────────────────────────

    /// Descendants of `root` matching `matcher`, in document order.
    fn query_all(&self, root: &Self::Node, matcher: &Matcher) -> Vec<Self::Node>;

    fn query(&self, root: &Self::Node, matcher: &Matcher) -> Option<Self::Node> {
        self.query_all(root, matcher).into_iter().next()
    }

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn is_connected(&self, node: &Self::Node) -> bool;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), DomError>;

    /// Insert `child` ahead of every existing child of `parent`.
    fn prepend(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    // ── Attributes ──────────────────────────────────────────────────────────

    fn class_name(&self, node: &Self::Node) -> String;

    fn set_class_name(&self, node: &Self::Node, value: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    /// Read a non-attribute marker stored on the element object.
    fn flag(&self, node: &Self::Node, name: &str) -> bool;

    fn set_flag(&self, node: &Self::Node, name: &str);

    // ── Controls ────────────────────────────────────────────────────────────

    /// The resolved source of an image: `currentSrc`, falling back to `src`.
    /// Empty when nothing is resolved.
    fn image_source(&self, image: &Self::Node) -> String;

    fn set_image_source(&self, image: &Self::Node, src: &str);

    /// Toggle `display: none`.
    fn set_hidden(&self, node: &Self::Node, hidden: bool) -> Result<(), DomError>;

    fn set_disabled(&self, node: &Self::Node, disabled: bool);

    // ── Dialog ──────────────────────────────────────────────────────────────

    fn show_modal(&self, dialog: &Self::Node) -> Result<(), DomError>;

    fn close(&self, dialog: &Self::Node);

    fn is_open(&self, dialog: &Self::Node) -> bool;

    // ── Subscriptions ───────────────────────────────────────────────────────

    fn listen(&self, target: &Self::Node, event: DomEvent, callback: Callback) -> Result<(), DomError>;

    /// Call `callback` after each batch of mutations under `target` that
    /// `options` selects.
    fn observe(
        &self,
        target: &Self::Node,
        options: &ObserveOptions,
        callback: Callback,
    ) -> Result<(), DomError>;
}
