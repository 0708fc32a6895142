//! Child-list diffing.
//!
//! Reconciling a list of children runs in four steps:
//!
//! 1. Index the old children: keyed ones by key, unkeyed ones in order.
//! 2. Walk the new children in order. A keyed child first claims the old instance with the same
//!    key and type. Otherwise it takes the next unused unkeyed old instance of its type, scanning
//!    forward from a cursor; only the last non-empty new child may also scan backward, which
//!    keeps a trailing sibling (a footer, say) when a conditional child before it disappears.
//!    Matched pairs are reconciled, everything else is mounted detached.
//! 3. Unmount old instances nobody claimed.
//! 4. Walk the new list backwards, moving each child's nodes in front of the running anchor
//!    unless they are already there. Children whose order did not change are never touched.
//!
//! A component path is fixed when the component mounts, while the backward scan in step 2 can
//! hand an old component to a later position. A component freshly mounted at that old position
//! then derives the same path as the one it displaced, and both share hook state until one of
//! them is unmounted. The reconciler logs this at debug level.
//!
//! When a child fails, the pass stops there. Children already reached keep their new state,
//! the ones not reached keep their old state, and all of them stay attached in order.

use std::collections::{HashMap, HashSet};

use ripple_core::{Element, HookStore, HostRenderer, Key, Path};
use tracing::{debug, trace};

use crate::{
    RenderError,
    instance::InstanceId,
    reconciler::{Placement, Reconciler},
};

/// Old children indexed for matching.
struct OldChildren {
    keyed: HashMap<Key, InstanceId>,
    unkeyed: Vec<InstanceId>,
    used: HashSet<InstanceId>,
    cursor: usize,
}

impl<H: HostRenderer, S: HookStore> Reconciler<'_, H, S> {
    /// Reconciles the `old` children of `owner` against `new` child elements inside
    /// `container`, then stores the resulting child list on `owner`.
    ///
    /// `tail` is the node that must follow the last child once the pass is done, `None` when
    /// the children end the container. On success the stored list is aligned index for index
    /// with `new`.
    ///
    /// # Errors
    ///
    /// Returns the first component failure. The children reconciled before it keep their new
    /// state, the rest keep their old one, and all of them stay in `owner`'s list in order.
    pub(crate) fn reconcile_children(
        &mut self,
        owner: InstanceId,
        container: &H::Node,
        old: &[Option<InstanceId>],
        new: &[Option<Element>],
        parent_path: &Path,
        tail: Option<H::Node>,
    ) -> Result<(), RenderError> {
        let mut index = self.index_children(old);
        let last = new.iter().rposition(Option::is_some);

        let mut children = Vec::with_capacity(new.len());

        for (position, child) in new.iter().enumerate() {
            let Some(child) = child else {
                children.push(None);
                continue;
            };
            let path = parent_path.child(child.key(), position, child.ty(), Some(new));

            let matched = self
                .match_keyed(&index, child)
                .or_else(|| self.match_unkeyed(&mut index, child, Some(position) == last));

            let outcome = match matched {
                Some(previous) => {
                    index.used.insert(previous);
                    self.reconcile(container, Some(previous), Some(child), &path)
                        .map_err(|error| (error, Some(previous)))
                }
                None => self
                    .mount(container, child, &path, &Placement::Detached)
                    .map(Some)
                    .map_err(|error| (error, None)),
            };

            match outcome {
                Ok(id) => children.push(id),
                Err((error, failed)) => {
                    // Keep the failed instance if it is still alive, then everything not reached.
                    children.push(failed.filter(|id| self.tree.contains(*id)));
                    children.extend(
                        old.iter()
                            .flatten()
                            .filter(|id| !index.used.contains(*id) && self.tree.contains(**id))
                            .map(|id| Some(*id)),
                    );
                    debug!(children = children.len(), "keeping partially reconciled children");
                    self.order_children(container, &children, tail);
                    self.set_children(owner, children);
                    return Err(error);
                }
            }
        }

        for id in old.iter().flatten() {
            if !index.used.contains(id) && self.tree.contains(*id) {
                self.unmount(*id);
            }
        }

        self.order_children(container, &children, tail);
        self.set_children(owner, children);
        Ok(())
    }

    fn index_children(&self, old: &[Option<InstanceId>]) -> OldChildren {
        let mut keyed = HashMap::new();
        let mut unkeyed = Vec::new();
        for id in old.iter().flatten() {
            let Some(instance) = self.tree.get(*id) else {
                continue;
            };
            match instance.key() {
                Some(key) => {
                    if keyed.insert(key.clone(), *id).is_some() {
                        debug!(%key, "duplicate key among siblings");
                    }
                }
                None => unkeyed.push(*id),
            }
        }
        OldChildren {
            keyed,
            unkeyed,
            used: HashSet::new(),
            cursor: 0,
        }
    }

    fn match_keyed(&self, index: &OldChildren, child: &Element) -> Option<InstanceId> {
        let key = child.key()?;
        let id = *index.keyed.get(key)?;
        let compatible = !index.used.contains(&id)
            && self
                .tree
                .get(id)
                .is_some_and(|instance| instance.element().ty() == child.ty());
        compatible.then_some(id)
    }

    fn match_unkeyed(
        &self,
        index: &mut OldChildren,
        child: &Element,
        trailing: bool,
    ) -> Option<InstanceId> {
        let fits = |id: &InstanceId| {
            !index.used.contains(id)
                && self
                    .tree
                    .get(*id)
                    .is_some_and(|instance| instance.element().ty() == child.ty())
        };

        if let Some(offset) = index.unkeyed[index.cursor..].iter().position(fits) {
            let found = index.cursor + offset;
            index.cursor = found + 1;
            return Some(index.unkeyed[found]);
        }

        if trailing {
            let found = index.unkeyed[..index.cursor].iter().rposition(fits)?;
            trace!(tag = child.ty().tag(), "trailing child matched behind the cursor");
            return Some(index.unkeyed[found]);
        }
        None
    }

    /// Places every child's nodes in order, touching only the ones out of place.
    fn order_children(
        &mut self,
        container: &H::Node,
        children: &[Option<InstanceId>],
        tail: Option<H::Node>,
    ) {
        let mut anchor = tail;
        for id in children.iter().rev().flatten() {
            let nodes = self.tree.collect_owned_nodes(*id);
            let Some(first) = nodes.first().cloned() else {
                continue;
            };
            if !self.in_place(container, &nodes, anchor.as_ref()) {
                trace!(nodes = nodes.len(), "moving child");
                for node in &nodes {
                    self.host.move_before(container, node, anchor.as_ref());
                }
            }
            anchor = Some(first);
        }
    }

    fn in_place(&self, container: &H::Node, nodes: &[H::Node], anchor: Option<&H::Node>) -> bool {
        let attached = nodes
            .iter()
            .all(|node| self.host.parent_node(node).as_ref() == Some(container));
        let contiguous = nodes
            .windows(2)
            .all(|pair| self.host.next_sibling(&pair[0]).as_ref() == Some(&pair[1]));
        let followed = nodes
            .last()
            .is_some_and(|node| self.host.next_sibling(node).as_ref() == anchor);
        attached && contiguous && followed
    }
}
