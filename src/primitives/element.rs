//! Elements - Declared and canonical node shapes.
//!
//! Authoring produces [`Child`] values of any shape (strings, numbers,
//! booleans, nested lists, [`Element`] builders). Normalization turns them
//! into canonical [`VNode`]s, which is what the reconciler consumes.
//!
//! # Example
//!
//! ```ignore
//! use hookdom::{h, Component, Child, EventKind, Listener};
//!
//! let item = Component::new("Item", |props| {
//!     Ok(h("li").child(props.str("label").unwrap_or_default()).into())
//! });
//!
//! let list = h("ul")
//!     .class("items")
//!     .on(EventKind::Click, Listener::new(|_| {}))
//!     .child(item.element().attr("label", "first"))
//!     .child(item.element().attr("label", "second"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::normalize::{normalize, normalize_children};
use crate::engine::{FRAGMENT_LABEL, TEXT_LABEL};
use crate::error::RenderError;
use crate::renderer::Listener;
use crate::types::{EventKind, Key, Style, Value};

// =============================================================================
// Component descriptor
// =============================================================================

/// Render function of a component.
pub type RenderFn = dyn Fn(&Props) -> Result<Child, RenderError>;

/// Stable component descriptor.
///
/// Two nodes have the same component type only when they were built from
/// clones of the same descriptor. Create it once and reuse it across renders;
/// a freshly created descriptor with the same body is a different type and
/// forces a remount.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new(
        name: impl Into<Rc<str>>,
        render: impl Fn(&Props) -> Result<Child, RenderError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    /// Declared name. Empty for anonymous components.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same descriptor?
    #[inline]
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }

    /// Start an element of this component type.
    pub fn element(&self) -> Element {
        Element::new(NodeKind::Component(self.clone()))
    }

    pub(crate) fn call(&self, props: &Props) -> Result<Child, RenderError> {
        (self.render)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

// =============================================================================
// Node kind
// =============================================================================

/// Declared type of a node.
#[derive(Clone)]
pub enum NodeKind {
    /// Text node holding its stringified value.
    Text(Rc<str>),
    Fragment,
    /// Host element by tag name.
    Host(Rc<str>),
    Component(Component),
}

impl NodeKind {
    /// Type equality: tag names by content, components by descriptor
    /// identity. Text value does not take part.
    pub fn same_type(&self, other: &NodeKind) -> bool {
        match (self, other) {
            (NodeKind::Text(_), NodeKind::Text(_)) => true,
            (NodeKind::Fragment, NodeKind::Fragment) => true,
            (NodeKind::Host(a), NodeKind::Host(b)) => a == b,
            (NodeKind::Component(a), NodeKind::Component(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Label used in paths.
    pub fn label<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            NodeKind::Text(_) => TEXT_LABEL,
            NodeKind::Fragment => FRAGMENT_LABEL,
            NodeKind::Host(tag) => tag,
            NodeKind::Component(component) if component.name().is_empty() => fallback,
            NodeKind::Component(component) => component.name(),
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Text(value) => write!(f, "Text({value:?})"),
            NodeKind::Fragment => write!(f, "Fragment"),
            NodeKind::Host(tag) => write!(f, "Host({tag})"),
            NodeKind::Component(component) => component.fmt(f),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        NodeKind::Host(tag.into())
    }
}

impl From<Component> for NodeKind {
    fn from(component: Component) -> Self {
        NodeKind::Component(component)
    }
}

impl From<&Component> for NodeKind {
    fn from(component: &Component) -> Self {
        NodeKind::Component(component.clone())
    }
}

// =============================================================================
// Props
// =============================================================================

/// Props of a node: attributes, listeners and canonical children.
#[derive(Clone, Default)]
pub struct Props {
    attrs: BTreeMap<Rc<str>, Value>,
    listeners: BTreeMap<EventKind, Listener>,
    children: Vec<VNode>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// String attribute, if present.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (&**k, v))
    }

    pub fn listener(&self, kind: EventKind) -> Option<&Listener> {
        self.listeners.get(&kind)
    }

    pub fn listeners(&self) -> impl Iterator<Item = (EventKind, &Listener)> {
        self.listeners.iter().map(|(k, l)| (*k, l))
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub(crate) fn set(&mut self, name: impl Into<Rc<str>>, value: Value) {
        self.attrs.insert(name.into(), value);
    }

    pub(crate) fn listen(&mut self, kind: EventKind, listener: Listener) {
        self.listeners.insert(kind, listener);
    }

    pub(crate) fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.attrs)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

// =============================================================================
// Canonical node
// =============================================================================

/// Canonical node. Immutable and cheap to clone.
#[derive(Clone)]
pub struct VNode {
    kind: NodeKind,
    key: Option<Key>,
    props: Rc<Props>,
}

impl VNode {
    pub(crate) fn new(kind: NodeKind, key: Option<Key>, props: Props) -> Self {
        Self {
            kind,
            key,
            props: Rc::new(props),
        }
    }

    pub(crate) fn text(value: impl Into<Rc<str>>) -> Self {
        Self::new(NodeKind::Text(value.into()), None, Props::default())
    }

    pub(crate) fn fragment(key: Option<Key>, children: Vec<VNode>) -> Self {
        Self::new(NodeKind::Fragment, key, Props::default().with_children(children))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[VNode] {
        &self.props.children
    }

    /// Text value of a text node.
    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Same type and same key: the pair can be updated in place.
    pub fn same_identity(&self, other: &VNode) -> bool {
        self.kind.same_type(&other.kind) && self.key == other.key
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        s.field("kind", &self.kind);
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        if !self.props.attrs.is_empty() {
            s.field("attrs", &self.props.attrs);
        }
        if !self.props.children.is_empty() {
            s.field("children", &self.props.children);
        }
        s.finish()
    }
}

// =============================================================================
// Declared shapes
// =============================================================================

/// Anything a component may return or an element may contain.
///
/// `Empty`, booleans and the empty string render nothing; numbers and
/// strings become text; lists flatten.
#[derive(Clone, Debug, Default)]
pub enum Child {
    #[default]
    Empty,
    Bool(bool),
    Text(Rc<str>),
    Int(i64),
    Float(f64),
    List(Vec<Child>),
    Element(Element),
    Node(VNode),
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Bool(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Int(value.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Int(value)
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Int(value as i64)
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Float(value)
    }
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(value)
    }
}

impl From<VNode> for Child {
    fn from(value: VNode) -> Self {
        Child::Node(value)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(value: Vec<T>) -> Self {
        Child::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Child>> FromIterator<T> for Child {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Child::List(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Element builder
// =============================================================================

/// Declared (not yet normalized) element.
#[derive(Clone, Debug)]
pub struct Element {
    kind: NodeKind,
    key: Option<Key>,
    props: Props,
    children: Vec<Child>,
}

impl Element {
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            props: Props::default(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute. `children` and `key` are reserved and ignored here;
    /// use [`Element::child`] and [`Element::key`].
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        if name != "children" && name != "key" {
            self.props.set(name, value.into());
        }
        self
    }

    #[must_use]
    pub fn class(self, class_name: impl Into<Value>) -> Self {
        self.attr("className", class_name)
    }

    #[must_use]
    pub fn style(self, style: Style) -> Self {
        self.attr("style", style)
    }

    #[must_use]
    pub fn on(mut self, kind: EventKind, listener: Listener) -> Self {
        self.props.listen(kind, listener);
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = impl Into<Child>>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Normalize into a canonical node.
    pub fn build(self) -> Option<VNode> {
        normalize(Child::Element(self))
    }

    pub(crate) fn into_parts(self) -> (NodeKind, Option<Key>, Props, Vec<Child>) {
        (self.kind, self.key, self.props, self.children)
    }
}

/// Start a host element.
pub fn h(tag: &str) -> Element {
    Element::new(tag)
}

/// Start a fragment.
pub fn fragment() -> Element {
    Element::new(NodeKind::Fragment)
}

/// Build an element from a prop list, extracting `key` and normalizing the
/// children up front.
///
/// ```ignore
/// let node = create_element("input", [("type", "checkbox".into()), ("checked", true.into())], vec![]);
/// ```
pub fn create_element(
    kind: impl Into<NodeKind>,
    props: impl IntoIterator<Item = (&'static str, Value)>,
    children: Vec<Child>,
) -> Element {
    let mut element = Element::new(kind);
    for (name, value) in props {
        if name == "key" {
            element.key = value.to_attr().map(Into::into);
        } else {
            element = element.attr(name, value);
        }
    }
    element.children = normalize_children(children)
        .into_iter()
        .map(Child::Node)
        .collect();
    element
}
