//! Headless document model
//!
//! An arena of elements standing in for the browser DOM. Components select,
//! mutate and focus nodes through [`Document`]; node ids of removed elements
//! go stale and every accessor treats them as absent instead of panicking.

pub mod event;
pub mod selector;

pub use event::{Event, EventKind, Key};
pub use selector::{Selector, SelectorError};

use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Window size reported in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute lookup. Classes live apart from attributes, see [`Element::has_class`]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Element>>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    listeners: BTreeMap<ListenerId, (NodeId, EventKind)>,
    next_listener: u64,
    last_scrolled: Option<NodeId>,
    viewport: Viewport,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty `<html><head></head><body></body></html>` document
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            active: None,
            listeners: BTreeMap::new(),
            next_listener: 0,
            last_scrolled: None,
            viewport: Viewport::default(),
        };
        doc.root = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.append_child(doc.root, doc.head);
        doc.append_child(doc.root, doc.body);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Element::new(tag)));
        id
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node).and_then(|el| el.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node).map(Element::children).unwrap_or(&[])
    }

    /// Append `child` to `parent`, moving it if it already has a parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.element(parent).is_none()
            || self.element(child).is_none()
            || self.contains(child, parent)
        {
            return false;
        }
        self.detach(child);
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            if let Some(el) = self.element_mut(parent) {
                el.children.retain(|c| *c != node);
            }
            if let Some(el) = self.element_mut(node) {
                el.parent = None;
            }
        }
    }

    /// Remove `node` and its subtree. Returns false if it was already gone
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || self.element(node).is_none() {
            return false;
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(el.children);
            }
            if self.active == Some(current) {
                self.active = None;
            }
            self.listeners.retain(|_, (target, _)| *target != current);
        }
        debug!(node = node.0, "removed node");
        true
    }

    /// Inclusive ancestor check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// True if `node` is connected to the document root
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.element(node).is_some() && self.contains(self.root, node)
    }

    /// Descendants of `node` in document (pre-)order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    pub fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if selector.matches(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    // ===== Attributes =====

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attributes.insert(name.to_string(), value.to_string());
        }
    }

    // ===== Classes =====

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node)
            && !el.has_class(class)
        {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    /// Returns whether the class is present afterwards
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            self.has_class(node, class)
        }
    }

    // ===== Inline style, text, values =====

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.style(property))
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.remove(property);
        }
    }

    pub fn text(&self, node: NodeId) -> &str {
        self.element(node).map(Element::text).unwrap_or("")
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.element_mut(node) {
            el.text = text.to_string();
        }
    }

    /// Current value of a form control
    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(Element::value).unwrap_or("")
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = value.to_string();
        }
    }

    // ===== Focus & scrolling =====

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Focus an attached element. Detached or removed nodes are ignored
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_attached(node) {
            return false;
        }
        self.active = Some(node);
        true
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    pub fn scroll_into_view(&mut self, node: NodeId) {
        if self.is_attached(node) {
            self.last_scrolled = Some(node);
        }
    }

    pub fn last_scrolled(&self) -> Option<NodeId> {
        self.last_scrolled
    }

    /// True if `node` or an ancestor carries `aria-hidden="true"`
    pub fn is_hidden(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.attr(n, "aria-hidden") == Some("true") {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    // ===== Listener bookkeeping =====

    pub fn add_listener(&mut self, node: NodeId, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (node, kind));
        id
    }

    /// Returns false if the listener was already removed
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|(n, k)| *n == node && *k == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_subtree_and_stale_ids() {
        let mut doc = Document::new();
        let body = doc.body();
        let parent = doc.create_element("div");
        let child = doc.create_element("button");
        doc.append_child(body, parent);
        doc.append_child(parent, child);
        assert!(doc.focus(child));

        assert!(doc.remove(parent));
        assert!(!doc.remove(parent));
        assert!(doc.element(child).is_none());
        assert_eq!(doc.active_element(), None);
        assert!(doc.children(body).is_empty());
        assert_eq!(doc.text(child), "");
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("div");
        let a1 = doc.create_element("span");
        let b = doc.create_element("div");
        doc.append_child(body, a);
        doc.append_child(a, a1);
        doc.append_child(body, b);
        assert_eq!(doc.descendants(body), vec![a, a1, b]);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let mut doc = Document::new();
        let body = doc.body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(body, outer);
        doc.append_child(outer, inner);
        assert!(!doc.append_child(inner, outer));
        assert_eq!(doc.parent(outer), Some(body));
    }

    #[test]
    fn test_focus_requires_attachment() {
        let mut doc = Document::new();
        let detached = doc.create_element("button");
        assert!(!doc.focus(detached));
        let body = doc.body();
        doc.append_child(body, detached);
        assert!(doc.focus(detached));
        assert_eq!(doc.active_element(), Some(detached));
    }

    #[test]
    fn test_listener_bookkeeping() {
        let mut doc = Document::new();
        let body = doc.body();
        let id = doc.add_listener(body, EventKind::KeyDown);
        assert_eq!(doc.listener_count(body, EventKind::KeyDown), 1);
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        assert_eq!(doc.listener_count(body, EventKind::KeyDown), 0);
    }

    #[test]
    fn test_toggle_class_and_hidden() {
        let mut doc = Document::new();
        let body = doc.body();
        let overlay = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(body, overlay);
        doc.append_child(overlay, button);
        assert!(doc.toggle_class(overlay, "open"));
        assert!(!doc.toggle_class(overlay, "open"));

        doc.set_attr(overlay, "aria-hidden", "true");
        assert!(doc.is_hidden(button));
        doc.set_attr(overlay, "aria-hidden", "false");
        assert!(!doc.is_hidden(button));
    }
}
