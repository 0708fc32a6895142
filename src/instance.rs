//! The persistent record of what was last rendered.
//!
//! Instances live in an arena and refer to each other through [`InstanceId`] handles. A parent
//! owns its children exclusively: removing a subtree frees every descendant slot. Handles are
//! generational, so a handle to an unmounted instance never aliases a newer one that reused
//! its slot.

use ripple_core::{Element, Key, Path};

/// Handle to an [`Instance`] inside an [`InstanceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    /// Returns the slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the generation of the slot at the time this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Kind-specific state of an instance.
#[derive(Debug)]
pub enum InstanceKind<N> {
    /// A text leaf owning one renderer text node.
    Text {
        /// The renderer node.
        node: N,
    },
    /// A host element owning one renderer node and its child instances.
    Host {
        /// The renderer node.
        node: N,
        /// Child instances, `None` marking holes.
        children: Vec<Option<InstanceId>>,
    },
    /// A fragment, whose children render straight into the fragment's container.
    Fragment {
        /// Child instances, `None` marking holes.
        children: Vec<Option<InstanceId>>,
    },
    /// A component and the instance of whatever it rendered.
    Component {
        /// The rendered child, `None` when the component rendered nothing.
        child: Option<InstanceId>,
    },
}

/// What was last rendered at one tree position.
#[derive(Debug)]
pub struct Instance<N> {
    pub(crate) kind: InstanceKind<N>,
    pub(crate) element: Element,
    pub(crate) path: Path,
}

impl<N> Instance<N> {
    pub(crate) const fn new(kind: InstanceKind<N>, element: Element, path: Path) -> Self {
        Self {
            kind,
            element,
            path,
        }
    }

    /// Returns the kind-specific state.
    #[must_use]
    pub const fn kind(&self) -> &InstanceKind<N> {
        &self.kind
    }

    /// Returns the element this instance currently reflects.
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// Returns the identity key of the current element.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.element.key()
    }

    /// Returns the structural path.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the renderer node this instance created itself, if any.
    #[must_use]
    pub const fn node(&self) -> Option<&N> {
        match &self.kind {
            InstanceKind::Text { node } | InstanceKind::Host { node, .. } => Some(node),
            InstanceKind::Fragment { .. } | InstanceKind::Component { .. } => None,
        }
    }

    /// Returns the child positions of a host element or fragment.
    #[must_use]
    pub fn children(&self) -> &[Option<InstanceId>] {
        match &self.kind {
            InstanceKind::Host { children, .. } | InstanceKind::Fragment { children } => children,
            InstanceKind::Text { .. } | InstanceKind::Component { .. } => &[],
        }
    }

    /// Returns the rendered child of a component.
    #[must_use]
    pub const fn child_instance(&self) -> Option<InstanceId> {
        match &self.kind {
            InstanceKind::Component { child } => *child,
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot<N> {
    generation: u32,
    instance: Option<Instance<N>>,
}

/// Arena owning every live instance of a root.
#[derive(Debug)]
pub struct InstanceTree<N> {
    slots: Vec<Slot<N>>,
    free: Vec<u32>,
    len: usize,
}

impl<N> Default for InstanceTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> InstanceTree<N> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores an instance and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots are needed.
    pub fn insert(&mut self, instance: Instance<N>) -> InstanceId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(instance);
            return InstanceId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("instance arena exceeded u32 slots");
        self.slots.push(Slot {
            generation: 0,
            instance: Some(instance),
        });
        InstanceId {
            index,
            generation: 0,
        }
    }

    /// Returns the instance behind `id`, if it is still alive.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&Instance<N>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance<N>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    /// Returns `true` while `id` refers to a live instance.
    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of live instances.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no instance is alive.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the child positions of a host element or fragment.
    #[must_use]
    pub fn children(&self, id: InstanceId) -> &[Option<InstanceId>] {
        self.get(id).map_or(&[], Instance::children)
    }

    /// Returns the rendered child of a component.
    #[must_use]
    pub fn child_instance(&self, id: InstanceId) -> Option<InstanceId> {
        self.get(id).and_then(Instance::child_instance)
    }

    /// Frees `id` and every descendant. Returns the number of freed instances.
    pub fn remove_subtree(&mut self, id: InstanceId) -> usize {
        let Some(instance) = self.take(id) else {
            return 0;
        };
        let mut freed = 1;
        match instance.kind {
            InstanceKind::Host { children, .. } | InstanceKind::Fragment { children } => {
                for child in children.into_iter().flatten() {
                    freed += self.remove_subtree(child);
                }
            }
            InstanceKind::Component { child: Some(child) } => {
                freed += self.remove_subtree(child);
            }
            InstanceKind::Component { child: None } | InstanceKind::Text { .. } => {}
        }
        freed
    }

    /// Returns the live component instance whose structural path is `path`.
    ///
    /// Paths are fixed when a component mounts, so after the trailing backward scan moves a
    /// component to a new index, a component mounted at its old position derives the same path.
    #[must_use]
    pub fn component_at(&self, path: &Path) -> Option<InstanceId> {
        self.slots.iter().zip(0_u32..).find_map(|(slot, index)| {
            let instance = slot.instance.as_ref()?;
            (matches!(instance.kind, InstanceKind::Component { .. }) && instance.path == *path)
                .then_some(InstanceId {
                    index,
                    generation: slot.generation,
                })
        })
    }

    fn take(&mut self, id: InstanceId) -> Option<Instance<N>> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)?;
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(instance)
    }
}

impl<N: Clone> InstanceTree<N> {
    /// Returns the top-level renderer nodes of `id`, in order.
    ///
    /// Text and host instances own exactly their node; fragments and components contribute the
    /// nodes of their children.
    #[must_use]
    pub fn collect_owned_nodes(&self, id: InstanceId) -> Vec<N> {
        let mut nodes = Vec::new();
        self.collect_into(id, &mut nodes);
        nodes
    }

    fn collect_into(&self, id: InstanceId, nodes: &mut Vec<N>) {
        let Some(instance) = self.get(id) else {
            return;
        };
        match &instance.kind {
            InstanceKind::Text { node } | InstanceKind::Host { node, .. } => {
                nodes.push(node.clone());
            }
            InstanceKind::Fragment { children } => {
                for child in children.iter().flatten() {
                    self.collect_into(*child, nodes);
                }
            }
            InstanceKind::Component { child } => {
                if let Some(child) = child {
                    self.collect_into(*child, nodes);
                }
            }
        }
    }

    /// Returns every renderer node created by `id` and its descendants, parents first.
    #[must_use]
    pub fn collect_created_nodes(&self, id: InstanceId) -> Vec<N> {
        let mut nodes = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(instance) = self.get(id) else {
                continue;
            };
            if let Some(node) = instance.node() {
                nodes.push(node.clone());
            }
            stack.extend(instance.children().iter().rev().flatten());
            stack.extend(instance.child_instance());
        }
        nodes
    }

    /// Returns the first top-level renderer node of `id`.
    #[must_use]
    pub fn first_owned_node(&self, id: InstanceId) -> Option<N> {
        let instance = self.get(id)?;
        match &instance.kind {
            InstanceKind::Text { node } | InstanceKind::Host { node, .. } => Some(node.clone()),
            InstanceKind::Fragment { children } => self.first_node_of(children),
            InstanceKind::Component { child } => child.and_then(|child| self.first_owned_node(child)),
        }
    }

    /// Returns the first renderer node among a list of child positions.
    #[must_use]
    pub fn first_node_of(&self, children: &[Option<InstanceId>]) -> Option<N> {
        children
            .iter()
            .flatten()
            .find_map(|child| self.first_owned_node(*child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::text;

    fn leaf(tree: &mut InstanceTree<u32>, node: u32) -> InstanceId {
        tree.insert(Instance::new(
            InstanceKind::Text { node },
            text("x"),
            Path::root("root"),
        ))
    }

    fn fragment(tree: &mut InstanceTree<u32>, children: Vec<Option<InstanceId>>) -> InstanceId {
        tree.insert(Instance::new(
            InstanceKind::Fragment { children },
            ripple_core::fragment().build(),
            Path::root("root"),
        ))
    }

    #[test]
    fn stale_handles_do_not_alias_reused_slots() {
        let mut tree = InstanceTree::new();
        let first = leaf(&mut tree, 1);
        tree.remove_subtree(first);
        let second = leaf(&mut tree, 2);

        assert_eq!(first.index(), second.index());
        assert!(tree.get(first).is_none());
        assert!(tree.get(second).is_some());
    }

    #[test]
    fn owned_nodes_walk_through_fragments_and_holes() {
        let mut tree = InstanceTree::new();
        let a = leaf(&mut tree, 1);
        let b = leaf(&mut tree, 2);
        let inner = fragment(&mut tree, vec![None, Some(b)]);
        let empty = fragment(&mut tree, vec![None]);
        let outer = fragment(&mut tree, vec![Some(empty), Some(a), Some(inner)]);

        assert_eq!(tree.collect_owned_nodes(outer), vec![1, 2]);
        assert_eq!(tree.first_owned_node(outer), Some(1));
        assert_eq!(tree.first_owned_node(empty), None);
    }

    #[test]
    fn owned_nodes_follow_component_child() {
        let mut tree = InstanceTree::new();
        let a = leaf(&mut tree, 7);
        let component = tree.insert(Instance::new(
            InstanceKind::Component { child: Some(a) },
            text("x"),
            Path::root("root"),
        ));
        let empty = tree.insert(Instance::new(
            InstanceKind::Component { child: None },
            text("x"),
            Path::root("root"),
        ));
        assert_eq!(tree.collect_owned_nodes(component), vec![7]);
        assert!(tree.collect_owned_nodes(empty).is_empty());
    }

    #[test]
    fn created_nodes_include_nested_hosts() {
        let mut tree = InstanceTree::new();
        let inner = leaf(&mut tree, 2);
        let host = tree.insert(Instance::new(
            InstanceKind::Host {
                node: 1,
                children: vec![Some(inner)],
            },
            ripple_core::h("p").build(),
            Path::root("root"),
        ));
        let tail = leaf(&mut tree, 3);
        let outer = fragment(&mut tree, vec![Some(host), None, Some(tail)]);

        assert_eq!(tree.collect_owned_nodes(outer), vec![1, 3]);
        assert_eq!(tree.collect_created_nodes(outer), vec![1, 2, 3]);
    }

    #[test]
    fn component_at_finds_live_components_only() {
        let mut tree = InstanceTree::new();
        let path = Path::root("root").join(ripple_core::Segment::Index(0));
        let component = tree.insert(Instance::new(
            InstanceKind::Component { child: None },
            text("x"),
            path.clone(),
        ));
        let _text = tree.insert(Instance::new(
            InstanceKind::Text { node: 1 },
            text("x"),
            Path::root("root"),
        ));

        assert_eq!(tree.component_at(&path), Some(component));
        assert_eq!(tree.component_at(&Path::root("root")), None);
        tree.remove_subtree(component);
        assert_eq!(tree.component_at(&path), None);
    }

    #[test]
    fn remove_subtree_frees_descendants() {
        let mut tree = InstanceTree::new();
        let a = leaf(&mut tree, 1);
        let b = leaf(&mut tree, 2);
        let root = fragment(&mut tree, vec![Some(a), None, Some(b)]);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.remove_subtree(root), 3);
        assert!(tree.is_empty());
        assert!(!tree.contains(a));
    }
}
