//! Path Identity - Structural keys for tree positions.
//!
//! A path is `parent/label/id` where `label` is the tag name, the component
//! name or a marker for text/fragment nodes, and `id` is either `key:<key>`
//! or `idx:<n>`. The ordinal `n` only counts preceding siblings with the same
//! label, so an unkeyed `Foo` keeps its path when a `Bar` sibling is inserted
//! or removed around it.
//!
//! Paths pair instances across renders and isolate hook state.

use std::fmt;
use std::rc::Rc;

use crate::primitives::VNode;

/// Label used for text nodes.
pub const TEXT_LABEL: &str = "#text";

/// Label used for fragments.
pub const FRAGMENT_LABEL: &str = "#fragment";

/// Structural identity of a tree position.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Rc<str>);

impl Path {
    /// Path of the declared root.
    pub fn root() -> Self {
        Self(Rc::from(""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of `child` under `self`, given the siblings declared before it.
    ///
    /// `fallback` labels components that have no name. The ordinal counts
    /// preceding siblings that produce the same label, so distinct types
    /// sharing a name (two anonymous components, say) never share a path.
    pub fn derive(&self, child: &VNode, preceding: &[VNode], fallback: &str) -> Path {
        let label = child.kind().label(fallback);
        match child.key() {
            Some(key) => Path(format!("{}/{}/key:{}", self.0, label, key).into()),
            None => {
                let ordinal = preceding
                    .iter()
                    .filter(|sibling| sibling.kind().label(fallback) == label)
                    .count();
                Path(format!("{}/{}/idx:{}", self.0, label, ordinal).into())
            }
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", &*self.0)
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}
