//! Normalization - Declared shapes to canonical nodes.
//!
//! Rules:
//! - `Empty`, booleans and `""` normalize to nothing
//! - strings and numbers become text nodes
//! - lists flatten at any depth; nothing left means nothing, otherwise a
//!   fragment
//! - elements get their children normalized and flattened; a fragment with
//!   no children left normalizes to nothing
//!
//! Normalizing an already canonical node yields that same node.

use super::element::{Child, NodeKind, Props, VNode};
use crate::types::{Key, format_number};

/// Normalize one declared node.
pub fn normalize(node: Child) -> Option<VNode> {
    match node {
        Child::Empty | Child::Bool(_) => None,
        Child::Text(text) if text.is_empty() => None,
        Child::Text(text) => Some(VNode::text(text)),
        Child::Int(value) => Some(VNode::text(value.to_string())),
        Child::Float(value) => Some(VNode::text(format_number(value))),
        Child::List(items) => {
            let children = normalize_children(items);
            (!children.is_empty()).then(|| VNode::fragment(None, children))
        }
        Child::Element(element) => {
            let (kind, key, props, children) = element.into_parts();
            let children = normalize_children(children);
            finish(kind, key, props, children)
        }
        // Nodes are only built by normalization, so they pass through as is
        Child::Node(node) => Some(node),
    }
}

/// Normalize and flatten a child list, dropping empty entries.
pub fn normalize_children(children: Vec<Child>) -> Vec<VNode> {
    let mut out = Vec::with_capacity(children.len());
    flatten_into(children, &mut out);
    out
}

fn flatten_into(children: Vec<Child>, out: &mut Vec<VNode>) {
    for child in children {
        match child {
            Child::List(items) => flatten_into(items, out),
            other => out.extend(normalize(other)),
        }
    }
}

fn finish(kind: NodeKind, key: Option<Key>, props: Props, children: Vec<VNode>) -> Option<VNode> {
    match kind {
        NodeKind::Fragment if children.is_empty() => None,
        NodeKind::Text(text) if text.is_empty() => None,
        NodeKind::Text(text) => Some(VNode::text(text)),
        kind => Some(VNode::new(kind, key, props.with_children(children))),
    }
}
