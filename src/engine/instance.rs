//! Instance - The materialized tree.
//!
//! An instance pairs the last reconciled [`VNode`] with the live node(s) it
//! produced. TEXT and HOST instances own exactly one live node; FRAGMENT and
//! COMPONENT instances own none and contribute the nodes of their children.

use std::fmt;

use super::path::Path;
use crate::primitives::VNode;
use crate::renderer::NodeId;
use crate::types::Key;

/// What an instance materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Text,
    Host,
    Fragment,
    Component,
}

/// Materialization of one reconciled node.
pub struct Instance {
    pub(crate) kind: InstanceKind,
    pub(crate) dom: Option<NodeId>,
    pub(crate) node: VNode,
    pub(crate) children: Vec<Instance>,
    pub(crate) key: Option<Key>,
    pub(crate) path: Path,
}

impl Instance {
    pub(crate) fn new(kind: InstanceKind, dom: Option<NodeId>, node: &VNode, path: &Path) -> Self {
        Self {
            kind,
            dom,
            key: node.key().cloned(),
            node: node.clone(),
            children: Vec::new(),
            path: path.clone(),
        }
    }

    pub fn kind(&self) -> InstanceKind {
        self.kind
    }

    /// Live node owned directly (TEXT and HOST only).
    pub fn dom(&self) -> Option<NodeId> {
        self.dom
    }

    /// The node this instance was last reconciled against.
    pub fn node(&self) -> &VNode {
        &self.node
    }

    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level live nodes contributed by this instance, in order.
    ///
    /// Descends through fragments and components but not into host elements:
    /// an element's subtree moves with the element.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_live(&mut out);
        out
    }

    fn collect_live(&self, out: &mut Vec<NodeId>) {
        match (self.kind, self.dom) {
            (InstanceKind::Text | InstanceKind::Host, Some(dom)) => out.push(dom),
            _ => {
                for child in &self.children {
                    child.collect_live(out);
                }
            }
        }
    }

    /// First live node contributed by this instance.
    pub fn first_live_node(&self) -> Option<NodeId> {
        match (self.kind, self.dom) {
            (InstanceKind::Text | InstanceKind::Host, Some(dom)) => Some(dom),
            _ => self.children.iter().find_map(Instance::first_live_node),
        }
    }

    /// Visit this instance and all descendants, depth-first.
    pub fn walk(&self, visit: &mut impl FnMut(&Instance)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("kind", &self.kind)
            .field("dom", &self.dom)
            .field("path", &self.path)
            .field("key", &self.key)
            .field("children", &self.children)
            .finish()
    }
}
