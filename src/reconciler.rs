//! The mount / update / replace / unmount state machine.
//!
//! [`Reconciler::reconcile`] compares the instance at one tree position with the element that
//! should be there now:
//!
//! | previous | new | action |
//! |---|---|---|
//! | any | `None` | unmount |
//! | `None` | element | mount |
//! | instance | different type or key | replace (unmount, then mount at the same position) |
//! | instance | same type and key | update in place, keeping the instance handle |
//!
//! A pass is synchronous and runs to completion. A failing component aborts it: the error goes
//! straight back to the caller, instances already visited keep their new state and everything
//! not yet visited keeps its old state.

use ripple_core::{
    Component, Element, ElementType, HookStore, HostRenderer, Path, Props, Scope,
};
use tracing::{debug, trace};

use crate::{
    RenderError,
    instance::{Instance, InstanceId, InstanceKind, InstanceTree},
};

/// Where freshly mounted top-level nodes go.
#[derive(Debug, Clone)]
pub(crate) enum Placement<N> {
    /// Insert before the anchor, or append when there is none.
    Attach(Option<N>),
    /// Leave detached; the child-list differ inserts them while ordering siblings.
    Detached,
}

/// Runs reconciliation passes against a host, an instance tree and a hook store.
pub struct Reconciler<'a, H: HostRenderer, S: HookStore> {
    pub(crate) host: &'a mut H,
    pub(crate) tree: &'a mut InstanceTree<H::Node>,
    pub(crate) hooks: &'a mut S,
}

impl<H: HostRenderer, S: HookStore> std::fmt::Debug for Reconciler<'_, H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("instances", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl<'a, H: HostRenderer, S: HookStore> Reconciler<'a, H, S> {
    /// Borrows everything a pass needs.
    pub const fn new(
        host: &'a mut H,
        tree: &'a mut InstanceTree<H::Node>,
        hooks: &'a mut S,
    ) -> Self {
        Self { host, tree, hooks }
    }

    /// Reconciles one tree position.
    ///
    /// Returns the instance now occupying the position: the same handle when updated in place,
    /// a new one when mounted or replaced, `None` when unmounted.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ComponentInvocation`] when a component function fails anywhere in
    /// the subtree.
    pub fn reconcile(
        &mut self,
        container: &H::Node,
        previous: Option<InstanceId>,
        element: Option<&Element>,
        path: &Path,
    ) -> Result<Option<InstanceId>, RenderError> {
        let previous = previous.filter(|id| self.tree.contains(*id));

        let Some(element) = element else {
            if let Some(previous) = previous {
                self.unmount(previous);
            }
            return Ok(None);
        };

        let Some(previous) = previous else {
            return self
                .mount(container, element, path, &Placement::Attach(None))
                .map(Some);
        };

        let same = self
            .tree
            .get(previous)
            .is_some_and(|instance| instance.element.same_identity(element));
        if !same {
            debug!(%path, tag = element.ty().tag(), "replacing instance");
            let anchor = self
                .tree
                .collect_owned_nodes(previous)
                .last()
                .and_then(|node| self.host.next_sibling(node));
            self.unmount(previous);
            return self
                .mount(container, element, path, &Placement::Attach(anchor))
                .map(Some);
        }

        self.update(container, previous, element, path)?;
        Ok(Some(previous))
    }

    pub(crate) fn mount(
        &mut self,
        container: &H::Node,
        element: &Element,
        path: &Path,
        placement: &Placement<H::Node>,
    ) -> Result<InstanceId, RenderError> {
        trace!(%path, tag = element.ty().tag(), "mount");
        let kind = match element.ty() {
            ElementType::Text => {
                let node = self
                    .host
                    .create_text_node(element.text_value().unwrap_or_default());
                self.place(container, &node, placement);
                InstanceKind::Text { node }
            }
            ElementType::Fragment => {
                let children = self.mount_children(container, element.children(), path, placement)?;
                InstanceKind::Fragment { children }
            }
            ElementType::Host(tag) => {
                let node = self.host.create_element_node(tag);
                self.host.set_all_attributes(&node, element.props());
                let children = match self.mount_children(
                    &node,
                    element.children(),
                    path,
                    &Placement::Attach(None),
                ) {
                    Ok(children) => children,
                    Err(error) => {
                        self.host.discard_node(&node);
                        return Err(error);
                    }
                };
                self.place(container, &node, placement);
                InstanceKind::Host { node, children }
            }
            ElementType::Component(component) => {
                let path = path.child(element.key(), 0, element.ty(), None);
                if tracing::enabled!(tracing::Level::DEBUG)
                    && let Some(holder) = self.tree.component_at(&path)
                {
                    debug!(%path, ?holder, "component path already in use; hook state is shared");
                }
                let rendered = self.invoke(component, element.props(), &path)?;
                let child = match rendered {
                    Some(rendered) => {
                        let child_path = path.child(rendered.key(), 0, rendered.ty(), None);
                        Some(self.mount(container, &rendered, &child_path, placement)?)
                    }
                    None => None,
                };
                let instance = Instance::new(InstanceKind::Component { child }, element.clone(), path);
                return Ok(self.tree.insert(instance));
            }
        };
        Ok(self
            .tree
            .insert(Instance::new(kind, element.clone(), path.clone())))
    }

    fn mount_children(
        &mut self,
        container: &H::Node,
        children: &[Option<Element>],
        path: &Path,
        placement: &Placement<H::Node>,
    ) -> Result<Vec<Option<InstanceId>>, RenderError> {
        let mut mounted = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let Some(child) = child else {
                mounted.push(None);
                continue;
            };
            let child_path = path.child(child.key(), index, child.ty(), Some(children));
            match self.mount(container, child, &child_path, placement) {
                Ok(id) => mounted.push(Some(id)),
                Err(error) => {
                    for id in mounted.into_iter().flatten() {
                        self.unmount(id);
                    }
                    return Err(error);
                }
            }
        }
        Ok(mounted)
    }

    fn place(&mut self, container: &H::Node, node: &H::Node, placement: &Placement<H::Node>) {
        if let Placement::Attach(anchor) = placement {
            self.host.insert_before(container, node, anchor.as_ref());
        }
    }

    fn update(
        &mut self,
        container: &H::Node,
        id: InstanceId,
        element: &Element,
        path: &Path,
    ) -> Result<(), RenderError> {
        if let ElementType::Component(component) = element.ty() {
            return self.update_component(container, id, component, element);
        }
        let Some(instance) = self.tree.get(id) else {
            return Ok(());
        };
        trace!(%path, tag = element.ty().tag(), "update");

        let previous = instance.element.clone();
        let node = instance.node().cloned();
        let old = instance.children().to_vec();
        let tail = match element.ty() {
            ElementType::Fragment => self
                .tree
                .collect_owned_nodes(id)
                .last()
                .and_then(|node| self.host.next_sibling(node)),
            _ => None,
        };

        // Children below may fail; the instance itself is already up to date by then.
        if let Some(instance) = self.tree.get_mut(id) {
            instance.element = element.clone();
            instance.path = path.clone();
        }

        match (element.ty(), node) {
            (ElementType::Text, Some(node)) => {
                let value = element.text_value().unwrap_or_default();
                if previous.text_value() != Some(value) {
                    self.host.set_text(&node, value);
                }
            }
            (ElementType::Host(_), Some(node)) => {
                self.host
                    .apply_attribute_delta(&node, previous.props(), element.props());
                self.reconcile_children(id, &node, &old, element.children(), path, None)?;
            }
            (ElementType::Fragment, None) => {
                self.reconcile_children(id, container, &old, element.children(), path, tail)?;
            }
            _ => debug!(%path, "instance kind does not match element type"),
        }
        Ok(())
    }

    fn update_component(
        &mut self,
        container: &H::Node,
        id: InstanceId,
        component: &Component,
        element: &Element,
    ) -> Result<(), RenderError> {
        let Some(instance) = self.tree.get(id) else {
            return Ok(());
        };
        let path = instance.path.clone();
        let previous = instance.child_instance();

        let rendered = self.invoke(component, element.props(), &path)?;
        if let Some(instance) = self.tree.get_mut(id) {
            instance.element = element.clone();
        }

        let child_container = previous
            .and_then(|child| self.tree.first_owned_node(child))
            .and_then(|node| self.host.parent_node(&node))
            .unwrap_or_else(|| container.clone());

        let result = match rendered {
            Some(rendered) => {
                let child_path = path.child(rendered.key(), 0, rendered.ty(), None);
                self.reconcile(&child_container, previous, Some(&rendered), &child_path)
            }
            None => {
                if let Some(previous) = previous {
                    self.unmount(previous);
                }
                Ok(None)
            }
        };

        // A child replaced before failing is gone; one that failed mid-update is still alive.
        let child = match &result {
            Ok(child) => *child,
            Err(_) => previous.filter(|child| self.tree.contains(*child)),
        };
        if let Some(instance) = self.tree.get_mut(id) {
            instance.kind = InstanceKind::Component { child };
        }
        result.map(|_| ())
    }

    pub(crate) fn set_children(&mut self, id: InstanceId, new: Vec<Option<InstanceId>>) {
        if let Some(instance) = self.tree.get_mut(id) {
            match &mut instance.kind {
                InstanceKind::Host { children, .. } | InstanceKind::Fragment { children } => {
                    *children = new;
                }
                InstanceKind::Text { .. } | InstanceKind::Component { .. } => {}
            }
        }
    }

    /// Calls a component between the hook store's enter and exit markers.
    fn invoke(
        &mut self,
        component: &Component,
        props: &Props,
        path: &Path,
    ) -> Result<Option<Element>, RenderError> {
        self.hooks.enter_component(path);
        let result = {
            let mut scope = Scope::new(path, &mut *self.hooks);
            component.invoke(props, &mut scope)
        };
        self.hooks.exit_component();

        if let Err(error) = &result {
            debug!(%path, component = component.name(), %error, "component failed");
        }
        result.map_err(RenderError::from)
    }

    /// Detaches every top-level node of `id`, releases every node it created and frees its
    /// subtree.
    pub(crate) fn unmount(&mut self, id: InstanceId) {
        let nodes = self.tree.collect_owned_nodes(id);
        for node in nodes.iter().rev() {
            if let Some(parent) = self.host.parent_node(node) {
                self.host.remove_child(&parent, node);
            }
        }
        for node in self.tree.collect_created_nodes(id) {
            self.host.discard_node(&node);
        }
        let freed = self.tree.remove_subtree(id);
        debug!(nodes = nodes.len(), instances = freed, "unmount");
    }
}
