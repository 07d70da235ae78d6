//! Reconciliation - Diff the declared tree against the materialized one.
//!
//! Depth-first, children in declared order. For each position:
//!
//! ```text
//! next empty            -> unmount: release every live node of prev
//! prev absent           -> mount
//! type or key differ    -> replace: release prev, mount next
//! same type and key     -> update in place
//! ```
//!
//! Children pair positionally. There is no keyed move: keys only make the
//! derived path independent of raw position, so hook state follows the key.
//!
//! New live nodes are inserted before an anchor, the first live node of the
//! next old sibling still in place, so a replaced or appended child lands in
//! declared order even inside fragments and components.

use tracing::{debug, trace};

use super::mount::RuntimeInner;
use crate::engine::{Instance, InstanceKind, Path};
use crate::error::RenderError;
use crate::primitives::{Component, NodeKind, VNode, normalize};
use crate::renderer::{NodeId, Projector};

pub(crate) struct Reconciler<'a> {
    rt: &'a RuntimeInner,
    projector: Projector<'a>,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(rt: &'a RuntimeInner) -> Self {
        Self {
            rt,
            projector: Projector::new(&rt.document, rt.config.reflect_selected),
        }
    }

    /// Reconcile one position under `container`.
    ///
    /// `anchor` is the live node new content must precede; `None` appends.
    pub(crate) fn reconcile(
        &self,
        container: NodeId,
        prev: Option<Instance>,
        next: Option<&VNode>,
        path: &Path,
        anchor: Option<NodeId>,
    ) -> Result<Option<Instance>, RenderError> {
        let Some(next) = next else {
            if let Some(prev) = prev {
                debug!(path = %prev.path, "unmount");
                self.release(&prev);
            }
            return Ok(None);
        };

        match prev {
            None => self.mount(container, next, path, anchor).map(Some),
            Some(prev) if !prev.node.same_identity(next) => {
                debug!(path = %path, from = ?prev.node.kind(), to = ?next.kind(), "replace");
                self.release(&prev);
                self.mount(container, next, path, anchor).map(Some)
            }
            Some(prev) => self.update(container, prev, next, path, anchor).map(Some),
        }
    }

    // -------------------------------------------------------------------------
    // Mount
    // -------------------------------------------------------------------------

    fn mount(
        &self,
        container: NodeId,
        node: &VNode,
        path: &Path,
        anchor: Option<NodeId>,
    ) -> Result<Instance, RenderError> {
        let doc = &self.rt.document;
        match node.kind() {
            NodeKind::Text(value) => {
                let text = doc.create_text(value);
                doc.insert_before(container, text, anchor);
                Ok(Instance::new(InstanceKind::Text, Some(text), node, path))
            }
            NodeKind::Fragment => {
                let mut instance = Instance::new(InstanceKind::Fragment, None, node, path);
                instance.children = self.mount_children(container, node.children(), path, anchor)?;
                Ok(instance)
            }
            NodeKind::Host(tag) => {
                let element = doc.create_element(tag);
                self.projector.apply(element, node.props());
                let children = match self.mount_children(element, node.children(), path, None) {
                    Ok(children) => children,
                    Err(err) => {
                        doc.destroy(element);
                        return Err(err);
                    }
                };
                doc.insert_before(container, element, anchor);

                let mut instance = Instance::new(InstanceKind::Host, Some(element), node, path);
                instance.children = children;
                Ok(instance)
            }
            NodeKind::Component(component) => {
                let rendered = self.render_component(component, node, path)?;
                let mut instance = Instance::new(InstanceKind::Component, None, node, path);
                if let Some(rendered) = rendered {
                    let child_path = self.rendered_path(path, &rendered);
                    let child = self.mount(container, &rendered, &child_path, anchor)?;
                    instance.children.push(child);
                }
                Ok(instance)
            }
        }
    }

    fn mount_children(
        &self,
        container: NodeId,
        children: &[VNode],
        parent: &Path,
        anchor: Option<NodeId>,
    ) -> Result<Vec<Instance>, RenderError> {
        let mut mounted = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let path = parent.derive(child, &children[..index], &self.rt.config.component_fallback);
            mounted.push(self.mount(container, child, &path, anchor)?);
        }
        Ok(mounted)
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    fn update(
        &self,
        container: NodeId,
        mut instance: Instance,
        next: &VNode,
        path: &Path,
        anchor: Option<NodeId>,
    ) -> Result<Instance, RenderError> {
        match next.kind() {
            NodeKind::Text(value) => {
                if let Some(text) = instance.dom {
                    if instance.node.text_value() != Some(&**value) {
                        trace!(path = %path, "text changed");
                        self.rt.document.set_text(text, value);
                    }
                }
            }
            NodeKind::Fragment => {
                let old = std::mem::take(&mut instance.children);
                instance.children =
                    self.reconcile_children(container, old, next.children(), path, anchor)?;
            }
            NodeKind::Host(_) => {
                if let Some(element) = instance.dom {
                    self.projector.patch(element, instance.node.props(), next.props());
                    let old = std::mem::take(&mut instance.children);
                    instance.children =
                        self.reconcile_children(element, old, next.children(), path, None)?;
                }
            }
            NodeKind::Component(component) => {
                let rendered = self.render_component(component, next, path)?;
                let old = instance.children.drain(..).next();
                let child_path = rendered
                    .as_ref()
                    .map_or_else(|| path.clone(), |node| self.rendered_path(path, node));
                let child = self.reconcile(container, old, rendered.as_ref(), &child_path, anchor)?;
                instance.children.extend(child);
            }
        }

        instance.node = next.clone();
        instance.key = next.key().cloned();
        instance.path = path.clone();
        Ok(instance)
    }

    /// Positional child reconciliation.
    fn reconcile_children(
        &self,
        container: NodeId,
        old: Vec<Instance>,
        next: &[VNode],
        parent: &Path,
        anchor: Option<NodeId>,
    ) -> Result<Vec<Instance>, RenderError> {
        let count = old.len().max(next.len());

        // anchors[i]: first live node after old slot i, else the parent anchor
        let mut anchors = vec![anchor; count];
        let mut following = anchor;
        for index in (0..count).rev() {
            anchors[index] = following;
            if let Some(first) = old.get(index).and_then(Instance::first_live_node) {
                following = Some(first);
            }
        }

        let mut old = old.into_iter();
        let mut out = Vec::with_capacity(next.len());
        for (index, slot_anchor) in anchors.into_iter().enumerate() {
            let prev = old.next();
            let Some(node) = next.get(index) else {
                self.reconcile(container, prev, None, parent, slot_anchor)?;
                continue;
            };
            let path = parent.derive(node, &next[..index], &self.rt.config.component_fallback);
            out.extend(self.reconcile(container, prev, Some(node), &path, slot_anchor)?);
        }
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Run a component body with `path` as the active hook owner.
    fn render_component(
        &self,
        component: &Component,
        node: &VNode,
        path: &Path,
    ) -> Result<Option<VNode>, RenderError> {
        trace!(path = %path, component = component.name(), "render component");
        self.rt.hooks.borrow_mut().enter(path.clone());
        let result = component.call(node.props());
        {
            let mut hooks = self.rt.hooks.borrow_mut();
            hooks.exit();
            hooks.mark_visited(path.clone());
        }
        let rendered = result.map_err(|err| err.at(path))?;
        Ok(normalize(rendered))
    }

    /// Path of the node a component rendered.
    ///
    /// The rendered node shares the component's path, except when it is
    /// itself a component: it then gets its own segment so the two bodies
    /// never share hook cells.
    fn rendered_path(&self, path: &Path, rendered: &VNode) -> Path {
        match rendered.kind() {
            NodeKind::Component(_) => {
                path.derive(rendered, &[], &self.rt.config.component_fallback)
            }
            _ => path.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Release
    // -------------------------------------------------------------------------

    /// Detach and free every live node `instance` transitively owns.
    fn release(&self, instance: &Instance) {
        for node in instance.live_nodes() {
            self.rt.document.destroy(node);
        }
    }
}
