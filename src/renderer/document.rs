//! Document - In-memory live DOM.
//!
//! Nodes live in a generational arena: a freed index goes back to a pool and
//! is reused with a bumped generation, so a stale [`NodeId`] never resolves
//! to the node that replaced it.
//!
//! Every mutating call bumps a mutation counter; tests use it to assert that
//! a pass touched nothing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::types::{BoolProps, EventKind};

// =============================================================================
// Handles
// =============================================================================

/// Handle to a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Event delivered to listeners.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
}

/// Event listener. Compared by reference.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// =============================================================================
// Arena
// =============================================================================

struct ElementData {
    tag: Rc<str>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    flags: BoolProps,
    listeners: Vec<(EventKind, Listener)>,
}

enum NodeData {
    Text(String),
    Element(ElementData),
}

struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    mutations: u64,
    created: u64,
}

impl Arena {
    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.mutations += 1;
        self.created += 1;
        let entry = NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.entry = Some(entry);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            NodeId { index, generation: 0 }
        }
    }

    fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.get_mut(id) {
            Some(NodeEntry {
                data: NodeData::Element(element),
                ..
            }) => Some(element),
            _ => {
                warn!(?id, "element operation on a node that is not a live element");
                None
            }
        }
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.get(id) {
            Some(NodeEntry {
                data: NodeData::Element(element),
                ..
            }) => Some(element),
            _ => None,
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get_mut(id).and_then(|entry| entry.parent.take()) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let Some(entry) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.take())
        else {
            return;
        };
        self.free.push(id.index);
        for child in entry.children {
            self.free_subtree(child);
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// Shared handle to an in-memory document.
#[derive(Clone, Default)]
pub struct Document {
    arena: Rc<RefCell<Arena>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Creation and lifetime
    // -------------------------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.arena.borrow_mut().alloc(NodeData::Element(ElementData {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            flags: BoolProps::empty(),
            listeners: Vec::new(),
        }))
    }

    pub fn create_text(&self, value: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .alloc(NodeData::Text(value.to_string()))
    }

    /// Detach `id` and free it together with its subtree.
    pub fn destroy(&self, id: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if arena.get(id).is_none() {
            return;
        }
        arena.mutations += 1;
        arena.detach(id);
        arena.free_subtree(id);
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.arena.borrow().get(id).is_some()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.arena.borrow().element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.arena.borrow().element(id).map(|e| e.tag.to_string())
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `anchor`, or at the end when
    /// `anchor` is `None` or not a child of `parent`. A child that is already
    /// attached somewhere is moved.
    pub fn insert_before(&self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
        let mut arena = self.arena.borrow_mut();
        if arena.element(parent).is_none() || arena.get(child).is_none() || parent == child {
            warn!(?parent, ?child, "insert into a node that is not a live element");
            return;
        }
        arena.mutations += 1;
        arena.detach(child);
        if let Some(entry) = arena.get_mut(child) {
            entry.parent = Some(parent);
        }
        if let Some(entry) = arena.get_mut(parent) {
            let position = anchor.and_then(|a| entry.children.iter().position(|c| *c == a));
            match position {
                Some(position) => entry.children.insert(position, child),
                None => entry.children.push(child),
            }
        }
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut arena = self.arena.borrow_mut();
        if arena.get(child).and_then(|entry| entry.parent) != Some(parent) {
            return false;
        }
        arena.mutations += 1;
        arena.detach(child);
        true
    }

    /// Direct child check.
    pub fn contains(&self, parent: NodeId, child: NodeId) -> bool {
        self.parent(child) == Some(parent)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.borrow().get(id).and_then(|entry| entry.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .get(id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena
            .borrow()
            .get(id)
            .and_then(|entry| entry.children.first().copied())
    }

    /// Remove and free every child of `id`.
    pub fn clear_children(&self, id: NodeId) {
        for child in self.children(id) {
            self.destroy(child);
        }
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    pub fn set_text(&self, id: NodeId, value: &str) {
        let mut arena = self.arena.borrow_mut();
        match arena.get_mut(id) {
            Some(NodeEntry {
                data: NodeData::Text(text),
                ..
            }) => {
                text.clear();
                text.push_str(value);
                arena.mutations += 1;
            }
            _ => warn!(?id, "set_text on a node that is not a live text node"),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<String> {
        match self.arena.borrow().get(id) {
            Some(NodeEntry {
                data: NodeData::Text(text),
                ..
            }) => Some(text.clone()),
            _ => None,
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(&text);
            return;
        }
        for child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    // -------------------------------------------------------------------------
    // Attributes, class, style, boolean properties
    // -------------------------------------------------------------------------

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            element.attributes.insert(name.to_string(), value.to_string());
            arena.mutations += 1;
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            element.attributes.remove(name);
            arena.mutations += 1;
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.arena
            .borrow()
            .element(id)
            .and_then(|e| e.attributes.get(name).cloned())
    }

    pub fn set_class_name(&self, id: NodeId, class_name: &str) {
        self.set_attribute(id, "class", class_name);
    }

    pub fn class_name(&self, id: NodeId) -> String {
        self.attribute(id, "class").unwrap_or_default()
    }

    /// Set one style declaration. An empty value removes it.
    pub fn set_style_property(&self, id: NodeId, property: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            if value.is_empty() {
                element.style.remove(property);
            } else {
                element.style.insert(property.to_string(), value.to_string());
            }
            arena.mutations += 1;
        }
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.arena
            .borrow()
            .element(id)
            .and_then(|e| e.style.get(property).cloned())
    }

    /// Set a live boolean property without touching its attribute.
    pub fn set_bool_property(&self, id: NodeId, flag: BoolProps, on: bool) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            element.flags.set(flag, on);
            arena.mutations += 1;
        }
    }

    pub fn bool_property(&self, id: NodeId, flag: BoolProps) -> bool {
        self.arena
            .borrow()
            .element(id)
            .is_some_and(|e| e.flags.contains(flag))
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    pub fn add_listener(&self, id: NodeId, kind: EventKind, listener: Listener) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            let duplicate = element
                .listeners
                .iter()
                .any(|(k, l)| *k == kind && l.ptr_eq(&listener));
            if !duplicate {
                element.listeners.push((kind, listener));
                arena.mutations += 1;
            }
        }
    }

    pub fn remove_listener(&self, id: NodeId, kind: EventKind, listener: &Listener) {
        let mut arena = self.arena.borrow_mut();
        if let Some(element) = arena.element_mut(id) {
            let before = element.listeners.len();
            element
                .listeners
                .retain(|(k, l)| !(*k == kind && l.ptr_eq(listener)));
            if element.listeners.len() != before {
                arena.mutations += 1;
            }
        }
    }

    pub fn listener_count(&self, id: NodeId, kind: EventKind) -> usize {
        self.arena.borrow().element(id).map_or(0, |e| {
            e.listeners.iter().filter(|(k, _)| *k == kind).count()
        })
    }

    /// Invoke the listeners registered on `target` for `kind`.
    ///
    /// No bubbling or delegation. Returns the number of listeners invoked.
    pub fn dispatch(&self, target: NodeId, kind: EventKind) -> usize {
        let listeners: Vec<Listener> = self
            .arena
            .borrow()
            .element(target)
            .map(|e| {
                e.listeners
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, l)| l.clone())
                    .collect()
            })
            .unwrap_or_default();
        let event = Event { kind, target };
        for listener in &listeners {
            listener.call(&event);
        }
        listeners.len()
    }

    // -------------------------------------------------------------------------
    // Queries and counters
    // -------------------------------------------------------------------------

    /// Total number of mutations (creation, insertion, removal, writes).
    pub fn mutation_count(&self) -> u64 {
        self.arena.borrow().mutations
    }

    /// Total number of nodes ever created.
    pub fn created_count(&self) -> u64 {
        self.arena.borrow().created
    }

    /// Number of nodes currently alive.
    pub fn live_count(&self) -> usize {
        self.arena
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    /// Depth-first search for the first element with `tag` under `root`.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all_by_tag(root, tag).into_iter().next()
    }

    /// Every element with `tag` under `root`, in document order.
    pub fn find_all_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(root) {
            if self.tag(child).as_deref() == Some(tag) {
                out.push(child);
            }
            out.extend(self.find_all_by_tag(child, tag));
        }
        out
    }

    /// Serialized children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if let Some(entry) = arena.get(id) {
            for child in &entry.children {
                write_html(&arena, *child, &mut out);
            }
        }
        out
    }

    /// Serialized `id` including itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        write_html(&arena, id, &mut out);
        out
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        f.debug_struct("Document")
            .field("slots", &arena.slots.len())
            .field("mutations", &arena.mutations)
            .finish()
    }
}

fn write_html(arena: &Arena, id: NodeId, out: &mut String) {
    let Some(entry) = arena.get(id) else { return };
    match &entry.data {
        NodeData::Text(text) => out.push_str(&escape(text)),
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push_str(&format!(" {name}=\"{}\"", escape(value)));
            }
            if !element.style.is_empty() {
                let css: Vec<String> = element
                    .style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v};"))
                    .collect();
                out.push_str(&format!(" style=\"{}\"", escape(&css.join(" "))));
            }
            out.push('>');
            for child in &entry.children {
                write_html(arena, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
