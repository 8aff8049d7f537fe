//! In-memory document
//!
//! Models just enough of a browser document to drive the augmenter
//! headlessly: element tree, attributes, `<dialog>` open state, click
//! bubbling (suppressed on disabled buttons) and subtree mutation observers.
//!
//! Mutation records are queued like a real `MutationObserver` and only
//! delivered by [`MemoryDom::flush`], which stands in for the microtask
//! checkpoint.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use super::{Callback, Dom, DomEvent, ObserveOptions};
use crate::error::DomError;
use crate::matcher::Matcher;

/// Upper bound on observer rounds per flush. A reconciliation loop that
/// keeps mutating its own subtree hits this instead of spinning forever.
const MAX_FLUSH_ROUNDS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

type SharedCallback = Rc<RefCell<Callback>>;

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    inner_html: Option<String>,
    current_src: Option<String>,
    flags: HashSet<String>,
}

struct Observer {
    target: NodeId,
    options: ObserveOptions,
    callback: SharedCallback,
}

enum Mutation<'a> {
    ChildList,
    Attribute(&'a str),
}

pub struct MemoryDom {
    nodes: RefCell<Vec<NodeData>>,
    root: NodeId,
    body: NodeId,
    loading: Cell<bool>,
    ready: RefCell<Vec<Callback>>,
    listeners: RefCell<HashMap<(NodeId, DomEvent), Vec<SharedCallback>>>,
    observers: RefCell<Vec<Observer>>,
    /// Observers with undelivered records, in queue order
    pending: RefCell<Vec<usize>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// A fully parsed document containing `<html><body></body></html>`.
    pub fn new() -> Self {
        let root = NodeId(0);
        let body = NodeId(1);
        let nodes = vec![
            NodeData {
                tag: "html".to_string(),
                children: vec![body],
                ..Default::default()
            },
            NodeData {
                tag: "body".to_string(),
                parent: Some(root),
                ..Default::default()
            },
        ];

        Self {
            nodes: RefCell::new(nodes),
            root,
            body,
            loading: Cell::new(false),
            ready: RefCell::new(Vec::new()),
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// A document that is still parsing until [`finish_loading`](Self::finish_loading).
    pub fn loading() -> Self {
        let dom = Self::new();
        dom.loading.set(true);
        dom
    }

    pub fn finish_loading(&self) {
        self.loading.set(false);
        let callbacks = std::mem::take(&mut *self.ready.borrow_mut());
        for mut callback in callbacks {
            callback();
        }
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Test Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an element with `attrs` and append it to `parent`.
    pub fn build(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.alloc(tag);
        {
            let mut nodes = self.nodes.borrow_mut();
            for (name, value) in attrs {
                nodes[node.0].attrs.insert(name.to_string(), value.to_string());
            }
        }
        self.attach(parent, node, None);
        node
    }

    /// Detach `node` from its parent.
    pub fn remove(&self, node: NodeId) {
        self.detach(node);
    }

    /// Swap `old` for `new` at the same position.
    pub fn replace_with(&self, old: NodeId, new: NodeId) {
        let Some(parent) = self.parent_of(old) else {
            return;
        };
        let index = self.index_in_parent(parent, old);
        self.detach(old);
        self.attach(parent, new, index);
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get(name).cloned()
    }

    pub fn inner_html(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow()[node.0].inner_html.clone()
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.0].attrs.contains_key("disabled")
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.attr(node, "style")
            .is_some_and(|style| style.replace(' ', "").contains("display:none"))
    }

    /// Simulate the browser resolving a `srcset` candidate.
    pub fn set_current_src(&self, image: NodeId, src: &str) {
        self.nodes.borrow_mut()[image.0].current_src = Some(src.to_string());
    }

    pub fn listener_count(&self, node: NodeId, event: DomEvent) -> usize {
        self.listeners
            .borrow()
            .get(&(node, event))
            .map_or(0, Vec::len)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Dispatch a bubbling click. Disabled buttons swallow it, as in browsers.
    pub fn click(&self, node: NodeId) {
        if self.tag(node) == "button" && self.is_disabled(node) {
            return;
        }
        let mut path = vec![node];
        path.extend(self.ancestors(node));
        for target in path {
            self.dispatch(target, DomEvent::Click);
        }
    }

    /// Simulate the user pressing Escape on an open modal.
    pub fn press_escape(&self, dialog: NodeId) {
        self.close(&dialog);
    }

    /// Deliver queued mutation records until no observer has any left.
    ///
    /// Returns the number of delivery rounds, or `None` if observers were
    /// still producing records after the round limit.
    pub fn flush(&self) -> Option<usize> {
        for round in 0..MAX_FLUSH_ROUNDS {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                return Some(round);
            }
            let callbacks: Vec<SharedCallback> = {
                let observers = self.observers.borrow();
                batch.iter().map(|&i| observers[i].callback.clone()).collect()
            };
            for callback in callbacks {
                let mut callback = callback.borrow_mut();
                (*callback)();
            }
        }
        self.pending.borrow().is_empty().then_some(MAX_FLUSH_ROUNDS)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn alloc(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        });
        NodeId(nodes.len() - 1)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut current = nodes[node.0].parent;
        while let Some(id) = current {
            out.push(id);
            current = nodes[id.0].parent;
        }
        out
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    fn index_in_parent(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes.borrow()[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[root.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, matcher: &Matcher) -> bool {
        match matcher {
            Matcher::Tag(tag) => self.nodes.borrow()[node.0].tag.eq_ignore_ascii_case(tag),
            Matcher::Class(class) => self.nodes.borrow()[node.0]
                .attrs
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            Matcher::Attr { tag, name, value } => {
                let nodes = self.nodes.borrow();
                let data = &nodes[node.0];
                data.tag.eq_ignore_ascii_case(tag) && data.attrs.get(name) == Some(value)
            }
            Matcher::Within { ancestor, target } => {
                self.matches(node, target)
                    && self
                        .ancestors(node)
                        .into_iter()
                        .any(|a| self.matches(a, ancestor))
            }
        }
    }

    fn detach(&self, node: NodeId) {
        let Some(parent) = self.parent_of(node) else {
            return;
        };
        {
            let mut nodes = self.nodes.borrow_mut();
            nodes[parent.0].children.retain(|&c| c != node);
            nodes[node.0].parent = None;
        }
        self.record(parent, Mutation::ChildList);
    }

    fn attach(&self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.detach(child);
        {
            let mut nodes = self.nodes.borrow_mut();
            let children = &mut nodes[parent.0].children;
            let index = index.unwrap_or(children.len()).min(children.len());
            children.insert(index, child);
            nodes[child.0].parent = Some(parent);
            nodes[parent.0].inner_html = None;
        }
        self.record(parent, Mutation::ChildList);
    }

    fn check_hierarchy(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Insert("new child contains the parent".to_string()));
        }
        Ok(())
    }

    fn write_attr(&self, node: NodeId, name: &str, value: Option<&str>) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let attrs = &mut nodes[node.0].attrs;
            match value {
                Some(value) => {
                    attrs.insert(name.to_string(), value.to_string());
                }
                None => {
                    attrs.remove(name);
                }
            }
        }
        self.record(node, Mutation::Attribute(name));
    }

    fn record(&self, target: NodeId, mutation: Mutation<'_>) {
        let interested: Vec<usize> = {
            let observers = self.observers.borrow();
            observers
                .iter()
                .enumerate()
                .filter(|(_, obs)| match &mutation {
                    Mutation::ChildList => obs.options.child_list,
                    Mutation::Attribute(name) => obs.options.observes_attribute(name),
                })
                .filter(|(_, obs)| {
                    obs.target == target
                        || (obs.options.subtree && self.is_inclusive_ancestor(obs.target, target))
                })
                .map(|(i, _)| i)
                .collect()
        };
        let mut pending = self.pending.borrow_mut();
        for i in interested {
            if !pending.contains(&i) {
                pending.push(i);
            }
        }
    }

    fn dispatch(&self, target: NodeId, event: DomEvent) {
        let callbacks = self
            .listeners
            .borrow()
            .get(&(target, event))
            .cloned()
            .unwrap_or_default();
        for callback in callbacks {
            let mut callback = callback.borrow_mut();
            (*callback)();
        }
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let candidates = self.descendants(self.root);
        let nodes = self.nodes.borrow();
        candidates
            .into_iter()
            .find(|n| nodes[n.0].attrs.get("id").is_some_and(|v| v == id))
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() {
            return Err(DomError::CreateElement {
                tag: tag.to_string(),
            });
        }
        Ok(self.alloc(tag))
    }

    fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn on_ready(&self, callback: Callback) -> Result<(), DomError> {
        self.ready.borrow_mut().push(callback);
        Ok(())
    }

    fn query_all(&self, root: &NodeId, matcher: &Matcher) -> Vec<NodeId> {
        self.descendants(*root)
            .into_iter()
            .filter(|&n| self.matches(n, matcher))
            .collect()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_of(*node)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, *node)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.check_hierarchy(*parent, *child)?;
        self.attach(*parent, *child, None);
        Ok(())
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: &NodeId) -> Result<(), DomError> {
        self.check_hierarchy(*parent, *child)?;
        if self.index_in_parent(*parent, *reference).is_none() {
            return Err(DomError::Insert("reference is not a child of parent".to_string()));
        }
        if child == reference {
            return Ok(());
        }
        self.detach(*child);
        let index = self.index_in_parent(*parent, *reference);
        self.attach(*parent, *child, index);
        Ok(())
    }

    fn prepend(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.check_hierarchy(*parent, *child)?;
        self.attach(*parent, *child, Some(0));
        Ok(())
    }

    fn class_name(&self, node: &NodeId) -> String {
        self.attr(*node, "class").unwrap_or_default()
    }

    fn set_class_name(&self, node: &NodeId, value: &str) {
        self.write_attr(*node, "class", Some(value));
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attr(*node, name)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(DomError::Attribute {
                name: name.to_string(),
                reason: "invalid attribute name".to_string(),
            });
        }
        self.write_attr(*node, name, Some(value));
        Ok(())
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let children = std::mem::take(&mut nodes[node.0].children);
            for child in children {
                nodes[child.0].parent = None;
            }
            nodes[node.0].inner_html = Some(html.to_string());
        }
        self.record(*node, Mutation::ChildList);
    }

    fn flag(&self, node: &NodeId, name: &str) -> bool {
        self.nodes.borrow()[node.0].flags.contains(name)
    }

    fn set_flag(&self, node: &NodeId, name: &str) {
        self.nodes.borrow_mut()[node.0].flags.insert(name.to_string());
    }

    fn image_source(&self, image: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let data = &nodes[image.0];
        data.current_src
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(data.attrs.get("src").map(String::as_str))
            .unwrap_or_default()
            .to_string()
    }

    fn set_image_source(&self, image: &NodeId, src: &str) {
        self.nodes.borrow_mut()[image.0].current_src = None;
        self.write_attr(*image, "src", Some(src));
    }

    fn set_hidden(&self, node: &NodeId, hidden: bool) -> Result<(), DomError> {
        self.write_attr(*node, "style", hidden.then_some("display: none"));
        Ok(())
    }

    fn set_disabled(&self, node: &NodeId, disabled: bool) {
        self.write_attr(*node, "disabled", disabled.then_some(""));
    }

    fn show_modal(&self, dialog: &NodeId) -> Result<(), DomError> {
        if !self.is_connected(dialog) {
            return Err(DomError::ShowModal("dialog is not connected".to_string()));
        }
        if !self.is_open(dialog) {
            self.write_attr(*dialog, "open", Some(""));
        }
        Ok(())
    }

    fn close(&self, dialog: &NodeId) {
        if !self.is_open(dialog) {
            return;
        }
        self.write_attr(*dialog, "open", None);
        self.dispatch(*dialog, DomEvent::Close);
    }

    fn is_open(&self, dialog: &NodeId) -> bool {
        self.attr(*dialog, "open").is_some()
    }

    fn listen(&self, target: &NodeId, event: DomEvent, callback: Callback) -> Result<(), DomError> {
        self.listeners
            .borrow_mut()
            .entry((*target, event))
            .or_default()
            .push(Rc::new(RefCell::new(callback)));
        Ok(())
    }

    fn observe(&self, target: &NodeId, options: &ObserveOptions, callback: Callback) -> Result<(), DomError> {
        if !options.child_list && options.attribute_filter.is_empty() {
            return Err(DomError::Observe(
                "options must select child list or attribute changes".to_string(),
            ));
        }
        self.observers.borrow_mut().push(Observer {
            target: *target,
            options: options.clone(),
            callback: Rc::new(RefCell::new(callback)),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_preorder_and_excludes_root() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let outer = dom.build(body, "div", &[("class", "bar")]);
        let inner = dom.build(outer, "div", &[("class", "bar")]);
        let sibling = dom.build(body, "div", &[("class", "bar")]);

        assert_eq!(dom.query_all(&body, &Matcher::class("bar")), vec![outer, inner, sibling]);
        assert_eq!(dom.query_all(&outer, &Matcher::class("bar")), vec![inner]);
    }

    #[test]
    fn test_insert_before_and_prepend() {
        let dom = MemoryDom::new();
        let bar = dom.build(dom.body_id(), "div", &[]);
        let a = dom.build(bar, "button", &[]);
        let b = dom.create_element("button").unwrap();
        let c = dom.create_element("button").unwrap();

        dom.insert_before(&bar, &b, &a).unwrap();
        dom.prepend(&bar, &c).unwrap();
        assert_eq!(dom.children(bar), vec![c, b, a]);

        let stranger = dom.create_element("span").unwrap();
        assert!(dom.insert_before(&bar, &stranger, &stranger).is_err());
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let dom = MemoryDom::new();
        let outer = dom.build(dom.body_id(), "div", &[]);
        let inner = dom.build(outer, "div", &[]);
        assert!(dom.append_child(&inner, &outer).is_err());
    }

    #[test]
    fn test_image_source_prefers_current_src() {
        let dom = MemoryDom::new();
        let img = dom.build(dom.body_id(), "img", &[("src", "small.png")]);
        assert_eq!(dom.image_source(&img), "small.png");

        dom.set_current_src(img, "large.png");
        assert_eq!(dom.image_source(&img), "large.png");

        dom.set_image_source(&img, "other.png");
        assert_eq!(dom.image_source(&img), "other.png");
    }

    #[test]
    fn test_disabled_button_swallows_click() {
        let dom = MemoryDom::new();
        let button = dom.build(dom.body_id(), "button", &[]);
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        dom.listen(&button, DomEvent::Click, Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        dom.click(button);
        dom.set_disabled(&button, true);
        dom.click(button);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_click_bubbles_to_ancestors() {
        let dom = MemoryDom::new();
        let dialog = dom.build(dom.body_id(), "dialog", &[]);
        let img = dom.build(dialog, "img", &[]);
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        dom.listen(&dialog, DomEvent::Click, Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        dom.click(img);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_close_fires_once() {
        let dom = MemoryDom::new();
        let dialog = dom.build(dom.body_id(), "dialog", &[]);
        let closes = Rc::new(Cell::new(0));
        let counter = closes.clone();
        dom.listen(&dialog, DomEvent::Close, Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        dom.close(&dialog);
        assert_eq!(closes.get(), 0);

        dom.show_modal(&dialog).unwrap();
        assert!(dom.is_open(&dialog));
        dom.close(&dialog);
        dom.close(&dialog);
        assert!(!dom.is_open(&dialog));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_show_modal_requires_connection() {
        let dom = MemoryDom::new();
        let dialog = dom.create_element("dialog").unwrap();
        assert!(dom.show_modal(&dialog).is_err());
    }

    #[test]
    fn test_observer_respects_attribute_filter() {
        let dom = MemoryDom::new();
        let host = dom.build(dom.body_id(), "div", &[]);
        let img = dom.build(host, "img", &[]);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        dom.observe(
            &host,
            &ObserveOptions::subtree_with_src(),
            Box::new(move || counter.set(counter.get() + 1)),
        )
        .unwrap();

        dom.set_attribute(&img, "alt", "ignored").unwrap();
        assert_eq!(dom.flush(), Some(0));

        dom.set_image_source(&img, "a.png");
        dom.set_attribute(&img, "src", "b.png").unwrap();
        assert_eq!(dom.flush(), Some(1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_observer_ignores_outside_subtree() {
        let dom = MemoryDom::new();
        let host = dom.build(dom.body_id(), "div", &[]);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        dom.observe(
            &host,
            &ObserveOptions::subtree_with_src(),
            Box::new(move || counter.set(counter.get() + 1)),
        )
        .unwrap();

        dom.build(dom.body_id(), "div", &[]);
        dom.flush();
        assert_eq!(calls.get(), 0);

        dom.build(host, "div", &[]);
        dom.flush();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_flush_detects_runaway_observer() {
        let dom = Rc::new(MemoryDom::new());
        let host = dom.build(dom.body_id(), "div", &[]);
        let inner = dom.clone();
        dom.observe(
            &host,
            &ObserveOptions::subtree_with_src(),
            Box::new(move || {
                inner.build(host, "span", &[]);
            }),
        )
        .unwrap();

        dom.build(host, "span", &[]);
        assert_eq!(dom.flush(), None);
    }

    #[test]
    fn test_ready_callbacks_run_on_finish() {
        let dom = MemoryDom::loading();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        dom.on_ready(Box::new(move || flag.set(true))).unwrap();
        assert!(dom.is_loading());
        assert!(!ran.get());

        dom.finish_loading();
        assert!(!dom.is_loading());
        assert!(ran.get());
    }
}
