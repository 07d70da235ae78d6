//! DOM Projection - Props onto live elements.
//!
//! Precedence, first match wins:
//! 1. `children` / `key` are never projected
//! 2. listeners (declared through [`EventKind`]) register on the element
//! 3. `className` replaces the class attribute wholesale
//! 4. `style` objects are diffed declaration by declaration
//! 5. boolean properties (`checked`, `disabled`, `readOnly`, optionally
//!    `selected`) are set live and mirrored into the reflected attribute
//! 6. anything else is a string attribute, removed when null or absent
//!
//! Patching skips every prop whose value is identical between the previous
//! and next props. Listeners always compare by reference.

use tracing::trace;

use super::document::{Document, NodeId};
use crate::primitives::Props;
use crate::types::{BoolProps, Style, Value};

/// How a prop name is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropTarget {
    Skip,
    ClassName,
    Style,
    Flag(BoolProps),
    Attribute,
}

/// Applies and patches props on elements of one document.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    doc: &'a Document,
    reflect_selected: bool,
}

impl<'a> Projector<'a> {
    pub fn new(doc: &'a Document, reflect_selected: bool) -> Self {
        Self {
            doc,
            reflect_selected,
        }
    }

    fn target(&self, name: &str) -> PropTarget {
        match name {
            "children" | "key" => PropTarget::Skip,
            "className" => PropTarget::ClassName,
            "style" => PropTarget::Style,
            _ => BoolProps::from_prop(name, self.reflect_selected)
                .map_or(PropTarget::Attribute, PropTarget::Flag),
        }
    }

    /// Full apply on a freshly created element.
    pub fn apply(&self, element: NodeId, props: &Props) {
        for (kind, listener) in props.listeners() {
            self.doc.add_listener(element, kind, listener.clone());
        }

        for (name, value) in props.attrs() {
            match self.target(name) {
                PropTarget::Skip => {}
                PropTarget::ClassName => {
                    self.doc
                        .set_class_name(element, &value.to_attr().unwrap_or_default());
                }
                PropTarget::Style => match value {
                    Value::Style(style) => self.diff_style(element, None, Some(style)),
                    Value::Null => {}
                    other => self.set_attribute(element, name, other),
                },
                PropTarget::Flag(flag) => self.set_flag(element, flag, value.truthy()),
                PropTarget::Attribute => {
                    if !value.is_null() {
                        self.set_attribute(element, name, value);
                    }
                }
            }
        }
    }

    /// Patch an element from `prev` props to `next` props.
    pub fn patch(&self, element: NodeId, prev: &Props, next: &Props) {
        self.patch_listeners(element, prev, next);

        // Removals
        for (name, prev_value) in prev.attrs() {
            if next.contains(name) {
                continue;
            }
            match self.target(name) {
                PropTarget::Skip => {}
                PropTarget::ClassName => self.doc.set_class_name(element, ""),
                PropTarget::Style => self.clear_style(element, prev_value),
                PropTarget::Flag(flag) => self.set_flag(element, flag, false),
                PropTarget::Attribute => self.doc.remove_attribute(element, name),
            }
        }

        // Additions and changes
        for (name, value) in next.attrs() {
            let prev_value = prev.get(name);
            if prev_value.is_some_and(|prev_value| prev_value.same(value)) {
                continue;
            }
            trace!(prop = name, "patching prop");
            match self.target(name) {
                PropTarget::Skip => {}
                PropTarget::ClassName => {
                    self.doc
                        .set_class_name(element, &value.to_attr().unwrap_or_default());
                }
                PropTarget::Style => match value {
                    Value::Style(style) => {
                        let prev_style = prev_value.and_then(Value::as_style);
                        if prev_value.is_some_and(|v| !v.is_null() && v.as_style().is_none()) {
                            self.doc.remove_attribute(element, "style");
                        }
                        self.diff_style(element, prev_style, Some(style));
                    }
                    Value::Null => {
                        if let Some(prev_value) = prev_value {
                            self.clear_style(element, prev_value);
                        }
                    }
                    other => {
                        if let Some(prev_style) = prev_value.and_then(Value::as_style) {
                            self.diff_style(element, Some(prev_style), None);
                        }
                        self.set_attribute(element, name, other);
                    }
                },
                PropTarget::Flag(flag) => self.set_flag(element, flag, value.truthy()),
                PropTarget::Attribute => {
                    if value.is_null() {
                        self.doc.remove_attribute(element, name);
                    } else {
                        self.set_attribute(element, name, value);
                    }
                }
            }
        }
    }

    fn patch_listeners(&self, element: NodeId, prev: &Props, next: &Props) {
        for (kind, prev_listener) in prev.listeners() {
            let unchanged = next
                .listener(kind)
                .is_some_and(|next_listener| next_listener.ptr_eq(prev_listener));
            if !unchanged {
                self.doc.remove_listener(element, kind, prev_listener);
            }
        }
        for (kind, next_listener) in next.listeners() {
            let unchanged = prev
                .listener(kind)
                .is_some_and(|prev_listener| prev_listener.ptr_eq(next_listener));
            if !unchanged {
                self.doc.add_listener(element, kind, next_listener.clone());
            }
        }
    }

    fn set_attribute(&self, element: NodeId, name: &str, value: &Value) {
        if let Some(value) = value.to_attr() {
            self.doc.set_attribute(element, name, &value);
        }
    }

    fn set_flag(&self, element: NodeId, flag: BoolProps, on: bool) {
        self.doc.set_bool_property(element, flag, on);
        if on {
            self.doc.set_attribute(element, flag.attr_name(), "");
        } else {
            self.doc.remove_attribute(element, flag.attr_name());
        }
    }

    /// Undo whatever a previous `style` value projected.
    fn clear_style(&self, element: NodeId, prev: &Value) {
        match prev {
            Value::Style(style) => self.diff_style(element, Some(style), None),
            Value::Null => {}
            _ => self.doc.remove_attribute(element, "style"),
        }
    }

    /// Clear declarations dropped from `next`, then (re)apply all of `next`.
    fn diff_style(&self, element: NodeId, prev: Option<&Style>, next: Option<&Style>) {
        if let (Some(prev), Some(next)) = (prev, next) {
            if prev.ptr_eq(next) {
                return;
            }
        }
        if let Some(prev) = prev {
            for (property, _) in prev.iter() {
                if !next.is_some_and(|next| next.contains(property)) {
                    self.doc.set_style_property(element, property, "");
                }
            }
        }
        if let Some(next) = next {
            for (property, value) in next.iter() {
                let value = value.to_attr().unwrap_or_default();
                self.doc.set_style_property(element, property, &value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{VNode, h};
    use crate::renderer::Listener;
    use crate::types::EventKind;

    fn props(node: Option<VNode>) -> Props {
        node.map(|n| n.props().clone()).unwrap_or_default()
    }

    #[test]
    fn test_apply_full_prop_set() {
        let doc = Document::new();
        let el = doc.create_element("input");
        let p = props(
            h("input")
                .class("field")
                .attr("id", "name")
                .attr("maxlength", 3)
                .attr("placeholder", Value::Null)
                .attr("disabled", true)
                .style(Style::new().with("color", "red").with("margin", Value::Null))
                .build(),
        );

        Projector::new(&doc, true).apply(el, &p);

        assert_eq!(doc.class_name(el), "field");
        assert_eq!(doc.attribute(el, "id").as_deref(), Some("name"));
        assert_eq!(doc.attribute(el, "maxlength").as_deref(), Some("3"));
        assert_eq!(doc.attribute(el, "placeholder"), None);
        assert!(doc.bool_property(el, BoolProps::DISABLED));
        assert_eq!(doc.attribute(el, "disabled").as_deref(), Some(""));
        assert_eq!(doc.style_property(el, "color").as_deref(), Some("red"));
        assert_eq!(doc.style_property(el, "margin"), None);
    }

    #[test]
    fn test_patch_removes_absent_and_null() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let projector = Projector::new(&doc, true);

        let prev = props(h("div").attr("title", "a").attr("lang", "en").class("x").build());
        let next = props(h("div").attr("title", Value::Null).build());
        projector.apply(el, &prev);
        projector.patch(el, &prev, &next);

        assert_eq!(doc.attribute(el, "title"), None);
        assert_eq!(doc.attribute(el, "lang"), None);
        assert_eq!(doc.class_name(el), "");
    }

    #[test]
    fn test_patch_style_key_by_key() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let projector = Projector::new(&doc, true);

        let prev = props(h("div").style(Style::new().with("color", "red").with("width", 10)).build());
        let next = props(h("div").style(Style::new().with("width", 20)).build());
        projector.apply(el, &prev);
        projector.patch(el, &prev, &next);

        assert_eq!(doc.style_property(el, "color"), None);
        assert_eq!(doc.style_property(el, "width").as_deref(), Some("20"));

        let none = props(h("div").build());
        projector.patch(el, &next, &none);
        assert_eq!(doc.style_property(el, "width"), None);
    }

    #[test]
    fn test_patch_skips_identical_values() {
        let doc = Document::new();
        let el = doc.create_element("div");
        let projector = Projector::new(&doc, true);
        let style = Style::new().with("color", "red");
        let listener = Listener::new(|_| {});

        let p = props(
            h("div")
                .attr("id", "same")
                .attr("checked", false)
                .style(style)
                .on(EventKind::Click, listener)
                .build(),
        );
        projector.apply(el, &p);
        let before = doc.mutation_count();
        projector.patch(el, &p, &p.clone());
        assert_eq!(doc.mutation_count(), before);
    }

    #[test]
    fn test_patch_rebinds_changed_listener_only() {
        let doc = Document::new();
        let el = doc.create_element("button");
        let projector = Projector::new(&doc, true);
        let first = Listener::new(|_| {});
        let second = Listener::new(|_| {});

        let prev = props(h("button").on(EventKind::Click, first.clone()).build());
        let next = props(h("button").on(EventKind::Click, second).build());
        projector.apply(el, &prev);
        projector.patch(el, &prev, &next);
        assert_eq!(doc.listener_count(el, EventKind::Click), 1);

        let gone = props(h("button").build());
        projector.patch(el, &next, &gone);
        assert_eq!(doc.listener_count(el, EventKind::Click), 0);
    }

    #[test]
    fn test_bool_flags_mirror_attribute() {
        let doc = Document::new();
        let el = doc.create_element("option");
        let projector = Projector::new(&doc, true);

        let on = props(h("option").attr("selected", 1).attr("readOnly", true).build());
        let off = props(h("option").attr("selected", false).build());
        projector.apply(el, &on);
        assert!(doc.bool_property(el, BoolProps::SELECTED));
        assert_eq!(doc.attribute(el, "readonly").as_deref(), Some(""));

        projector.patch(el, &on, &off);
        assert!(!doc.bool_property(el, BoolProps::SELECTED));
        assert!(!doc.bool_property(el, BoolProps::READ_ONLY));
        assert_eq!(doc.attribute(el, "selected"), None);
        assert_eq!(doc.attribute(el, "readonly"), None);
    }

    #[test]
    fn test_selected_as_plain_attribute_when_not_reflected() {
        let doc = Document::new();
        let el = doc.create_element("option");
        let p = props(h("option").attr("selected", true).build());
        Projector::new(&doc, false).apply(el, &p);
        assert!(!doc.bool_property(el, BoolProps::SELECTED));
        assert_eq!(doc.attribute(el, "selected").as_deref(), Some("true"));
    }
}
