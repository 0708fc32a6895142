//! Arena of host nodes.

use std::collections::BTreeMap;

use ripple_core::{AttrValue, EventHandler, Style};

/// Identifier for a node stored inside the [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new [`NodeId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name.
    Element(String),
    /// A text node and its content.
    Text(String),
}

#[derive(Debug)]
pub(crate) struct NodeEntry {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: BTreeMap<String, AttrValue>,
    pub(crate) style: Style,
    pub(crate) listeners: Vec<(String, EventHandler)>,
}

impl NodeEntry {
    const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }
}

/// Arena storing every node ever created.
///
/// Detached nodes stay addressable until they are released. Ids are never reused, so a
/// recorded [`crate::Mutation`] always names the node it touched; the cost is one empty slot per
/// released node, which is fine for tests and headless snapshots but not for hosts that run
/// indefinitely.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Option<NodeEntry>>,
    live: usize,
}

impl NodeArena {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(NodeEntry::new(kind)));
        self.live += 1;
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Drops the entry of `id`, unlinking it from its parent. Returns `false` if it was already
    /// released.
    pub(crate) fn release(&mut self, id: NodeId) -> bool {
        let Some(entry) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.live -= 1;
        if let Some(parent) = entry.parent
            && let Some(parent) = self.get_mut(parent)
        {
            parent.children.retain(|child| *child != id);
        }
        true
    }

    /// Returns the children of `id`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |entry| entry.children.as_slice())
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|entry| entry.parent)
    }

    /// Unlinks `node` from `parent`. Returns `false` if it was not a child of `parent`.
    pub(crate) fn detach(&mut self, parent: NodeId, node: NodeId) -> bool {
        let Some(entry) = self.get_mut(parent) else {
            return false;
        };
        let Some(position) = entry.children.iter().position(|child| *child == node) else {
            return false;
        };
        entry.children.remove(position);
        if let Some(child) = self.get_mut(node) {
            child.parent = None;
        }
        true
    }

    /// Links `node` into `parent` before `anchor`, detaching it from its current parent first.
    /// A missing anchor appends.
    pub(crate) fn attach(&mut self, parent: NodeId, node: NodeId, anchor: Option<NodeId>) {
        if let Some(previous) = self.parent(node) {
            self.detach(previous, node);
        }
        let Some(entry) = self.get_mut(parent) else {
            return;
        };
        let position = anchor
            .and_then(|anchor| entry.children.iter().position(|child| *child == anchor))
            .unwrap_or(entry.children.len());
        entry.children.insert(position, node);
        if let Some(child) = self.get_mut(node) {
            child.parent = Some(parent);
        }
    }

    /// Returns the node following `id` in its parent.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|child| *child == id)?;
        siblings.get(position + 1).copied()
    }

    /// Returns the total number of nodes ever created.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when no node was created yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes not yet released.
    #[must_use]
    pub const fn live_len(&self) -> usize {
        self.live
    }

    /// Returns `true` while `id` has not been released.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }
}
