//! Equality helpers over [`Value`] and [`Props`].
//!
//! `shallow` compares one level: same length and every entry identical
//! (`Value::same`). `deep` descends into style objects and child nodes.
//! Listeners always compare by identity.

use super::element::{NodeKind, Props, VNode};
use crate::types::Value;

/// Entry-wise identity over two value lists.
///
/// This is the dependency check of `use_effect`.
pub fn shallow_equals(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same(b))
}

/// Structural equality. Style objects compare declaration by declaration.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Style(a), Value::Style(b)) => {
            a.ptr_eq(b)
                || (a.iter().count() == b.iter().count()
                    && a.iter()
                        .all(|(prop, value)| b.get(prop).is_some_and(|other| deep_equals(value, other))))
        }
        _ => a.same(b),
    }
}

/// [`deep_equals`] over two value lists.
pub fn deep_equals_list(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| deep_equals(a, b))
}

/// One-level props comparison used by [`memo`](super::memo()).
///
/// Attributes compare with [`Value::same`], children by node identity.
pub fn shallow_equals_props(a: &Props, b: &Props) -> bool {
    std::ptr::eq(a, b)
        || (same_entries(a, b, Value::same)
            && a.children().len() == b.children().len()
            && a.children().iter().zip(b.children()).all(|(a, b)| same_node(a, b)))
}

/// Structural props comparison used by [`deep_memo`](super::deep_memo()).
pub fn deep_equals_props(a: &Props, b: &Props) -> bool {
    std::ptr::eq(a, b)
        || (same_entries(a, b, deep_equals)
            && a.children().len() == b.children().len()
            && a.children().iter().zip(b.children()).all(|(a, b)| deep_equals_node(a, b)))
}

fn same_entries(a: &Props, b: &Props, eq: impl Fn(&Value, &Value) -> bool) -> bool {
    a.attrs().count() == b.attrs().count()
        && a.attrs().all(|(name, value)| b.get(name).is_some_and(|other| eq(value, other)))
        && a.listeners().count() == b.listeners().count()
        && a.listeners()
            .all(|(kind, listener)| b.listener(kind).is_some_and(|other| listener.ptr_eq(other)))
}

/// Text by content, everything else by the node it was built as.
fn same_node(a: &VNode, b: &VNode) -> bool {
    match (a.kind(), b.kind()) {
        (NodeKind::Text(a), NodeKind::Text(b)) => a == b,
        _ => a.same_identity(b) && std::ptr::eq(a.props(), b.props()),
    }
}

fn deep_equals_node(a: &VNode, b: &VNode) -> bool {
    match (a.kind(), b.kind()) {
        (NodeKind::Text(a), NodeKind::Text(b)) => a == b,
        _ => a.same_identity(b) && deep_equals_props(a.props(), b.props()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{h, normalize};
    use crate::renderer::Listener;
    use crate::types::{EventKind, Style};

    fn props_of(element: crate::primitives::Element) -> Props {
        normalize(element.into())
            .map(|node| node.props().clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_shallow_uses_identity() {
        let style = Style::new().with("color", "red");
        let a = [Value::from(1), Value::from("x"), Value::from(style.clone())];
        let b = [Value::from(1), Value::from("x"), Value::from(style)];
        assert!(shallow_equals(&a, &b));

        let rebuilt = [Value::from(1), Value::from("x"), Style::new().with("color", "red").into()];
        assert!(!shallow_equals(&a, &rebuilt));
        assert!(!shallow_equals(&a[..2], &a));
    }

    #[test]
    fn test_deep_compares_styles() {
        let a = Value::from(Style::new().with("color", "red").with("width", 3));
        let b = Value::from(Style::new().with("width", 3).with("color", "red"));
        let c = Value::from(Style::new().with("color", "blue"));
        assert!(deep_equals(&a, &b));
        assert!(!deep_equals(&a, &c));
        assert!(deep_equals_list(&[a.clone(), Value::Null], &[b, Value::Null]));
    }

    #[test]
    fn test_nan_is_same_as_itself() {
        assert!(shallow_equals(&[Value::Float(f64::NAN)], &[Value::Float(f64::NAN)]));
    }

    #[test]
    fn test_props_shallow_and_deep() {
        let listener = Listener::new(|_| {});
        let build = |color: &str| {
            props_of(
                h("div")
                    .attr("id", "a")
                    .style(Style::new().with("color", color))
                    .on(EventKind::Click, listener.clone())
                    .child("text"),
            )
        };

        // Rebuilt style objects differ by identity only
        assert!(!shallow_equals_props(&build("red"), &build("red")));
        assert!(deep_equals_props(&build("red"), &build("red")));
        assert!(!deep_equals_props(&build("red"), &build("blue")));

        let other_listener = props_of(h("div").on(EventKind::Click, Listener::new(|_| {})));
        let same_listener = props_of(h("div").on(EventKind::Click, listener.clone()));
        assert!(!deep_equals_props(&same_listener, &other_listener));
        assert!(shallow_equals_props(&same_listener, &props_of(h("div").on(EventKind::Click, listener))));
    }

    #[test]
    fn test_props_children_by_node() {
        let shared = h("b").child("x").build();
        let with = |child: Option<VNode>| props_of(h("p").child(child).child("tail"));

        assert!(shallow_equals_props(&with(shared.clone()), &with(shared.clone())));
        assert!(!shallow_equals_props(&with(shared.clone()), &with(h("b").child("x").build())));
        assert!(deep_equals_props(&with(shared), &with(h("b").child("x").build())));
    }
}
