//! [`HostRenderer`] implementation over a [`NodeArena`].

use ripple_core::{AttrValue, Event, EventHandler, HostRenderer, Style};

use crate::tree::{NodeArena, NodeId, NodeKind};

/// A renderer-side change, as recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A text node was created.
    CreateText {
        /// The new node.
        node: NodeId,
    },
    /// An element node was created.
    CreateElement {
        /// The new node.
        node: NodeId,
        /// Its tag.
        tag: String,
    },
    /// Text content changed.
    SetText {
        /// The text node.
        node: NodeId,
        /// The new content.
        value: String,
    },
    /// An attribute was set.
    SetAttribute {
        /// The element.
        node: NodeId,
        /// Host-side attribute name.
        name: String,
    },
    /// An attribute was removed.
    RemoveAttribute {
        /// The element.
        node: NodeId,
        /// Host-side attribute name.
        name: String,
    },
    /// A style declaration was set.
    SetStyle {
        /// The element.
        node: NodeId,
        /// Style property.
        property: String,
    },
    /// A style declaration was removed.
    RemoveStyle {
        /// The element.
        node: NodeId,
        /// Style property.
        property: String,
    },
    /// A listener was attached.
    AddListener {
        /// The element.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A listener was detached.
    RemoveListener {
        /// The element.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A detached node was inserted.
    Insert {
        /// The container.
        parent: NodeId,
        /// The inserted node.
        node: NodeId,
        /// The node it was inserted before, `None` for append.
        anchor: Option<NodeId>,
    },
    /// An attached node was relocated within its container.
    Move {
        /// The container.
        parent: NodeId,
        /// The moved node.
        node: NodeId,
        /// The node it now precedes, `None` for the end.
        anchor: Option<NodeId>,
    },
    /// A node was removed from its container.
    Remove {
        /// The container.
        parent: NodeId,
        /// The removed node.
        node: NodeId,
    },
    /// A node was released and its id retired.
    Discard {
        /// The released node.
        node: NodeId,
    },
}

impl Mutation {
    /// Returns `true` for node creation.
    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::CreateText { .. } | Self::CreateElement { .. })
    }

    /// Returns `true` for relocations.
    #[must_use]
    pub const fn is_move(&self) -> bool {
        matches!(self, Self::Move { .. })
    }

    /// Returns `true` for attribute, style, listener and text changes.
    #[must_use]
    pub const fn is_content(&self) -> bool {
        matches!(
            self,
            Self::SetText { .. }
                | Self::SetAttribute { .. }
                | Self::RemoveAttribute { .. }
                | Self::SetStyle { .. }
                | Self::RemoveStyle { .. }
                | Self::AddListener { .. }
                | Self::RemoveListener { .. }
        )
    }
}

/// Headless renderer that keeps its nodes in memory and logs every mutation.
///
/// Meant for tests and headless snapshots: released nodes leave an empty slot behind, see
/// [`NodeArena`].
#[derive(Debug, Default)]
pub struct MemoryHost {
    arena: NodeArena,
    log: Vec<Mutation>,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            log: Vec::new(),
        }
    }

    /// Creates a detached container element without recording it.
    pub fn container(&mut self, tag: &str) -> NodeId {
        self.arena.push(NodeKind::Element(tag.into()))
    }

    /// Returns the mutations recorded so far.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Drains the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Returns the underlying arena.
    #[must_use]
    pub const fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Returns the children of `node`.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.arena.children(node)
    }

    /// Returns what `node` is.
    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.arena.get(node).map(|entry| &entry.kind)
    }

    /// Returns the content of a text node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(value) => Some(value),
            NodeKind::Element(_) => None,
        }
    }

    /// Returns the tag of an element node.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns an attribute of `node` by host-side name.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&AttrValue> {
        self.arena.get(node)?.attributes.get(name)
    }

    /// Returns the inline style of `node`.
    #[must_use]
    pub fn style(&self, node: NodeId) -> Option<&Style> {
        self.arena.get(node).map(|entry| &entry.style)
    }

    /// Returns how many listeners for `event` are attached to `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.arena.get(node).map_or(0, |entry| {
            entry
                .listeners
                .iter()
                .filter(|(name, _)| name == event)
                .count()
        })
    }

    /// Concatenates the text below `node`, in document order.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        match self.kind(node) {
            Some(NodeKind::Text(value)) => value.clone(),
            Some(NodeKind::Element(_)) => self
                .children(node)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
            None => String::new(),
        }
    }

    /// Calls every listener for `event` on `node`. Returns how many ran.
    pub fn dispatch_event(&self, node: NodeId, event: &Event) -> usize {
        let handlers: Vec<EventHandler> = self.arena.get(node).map_or_else(Vec::new, |entry| {
            entry
                .listeners
                .iter()
                .filter(|(name, _)| name == event.kind())
                .map(|(_, handler)| handler.clone())
                .collect()
        });
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    fn record(&mut self, mutation: Mutation) {
        tracing::trace!(?mutation, "host mutation");
        self.log.push(mutation);
    }
}

impl HostRenderer for MemoryHost {
    type Node = NodeId;

    fn create_text_node(&mut self, value: &str) -> NodeId {
        let node = self.arena.push(NodeKind::Text(value.into()));
        self.record(Mutation::CreateText { node });
        node
    }

    fn create_element_node(&mut self, tag: &str) -> NodeId {
        let node = self.arena.push(NodeKind::Element(tag.into()));
        self.record(Mutation::CreateElement {
            node,
            tag: tag.into(),
        });
        node
    }

    fn set_text(&mut self, node: &NodeId, value: &str) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.kind = NodeKind::Text(value.into());
        }
        self.record(Mutation::SetText {
            node: *node,
            value: value.into(),
        });
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &AttrValue) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.attributes.insert(name.into(), value.clone());
        }
        self.record(Mutation::SetAttribute {
            node: *node,
            name: name.into(),
        });
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.attributes.remove(name);
        }
        self.record(Mutation::RemoveAttribute {
            node: *node,
            name: name.into(),
        });
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.style.insert(property.into(), value.into());
        }
        self.record(Mutation::SetStyle {
            node: *node,
            property: property.into(),
        });
    }

    fn remove_style_property(&mut self, node: &NodeId, property: &str) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.style.remove(property);
        }
        self.record(Mutation::RemoveStyle {
            node: *node,
            property: property.into(),
        });
    }

    fn add_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry.listeners.push((event.into(), handler.clone()));
        }
        self.record(Mutation::AddListener {
            node: *node,
            event: event.into(),
        });
    }

    fn remove_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) {
        if let Some(entry) = self.arena.get_mut(*node) {
            entry
                .listeners
                .retain(|(name, existing)| !(name == event && existing.same(handler)));
        }
        self.record(Mutation::RemoveListener {
            node: *node,
            event: event.into(),
        });
    }

    fn insert_before(&mut self, container: &NodeId, node: &NodeId, anchor: Option<&NodeId>) {
        self.arena.attach(*container, *node, anchor.copied());
        self.record(Mutation::Insert {
            parent: *container,
            node: *node,
            anchor: anchor.copied(),
        });
    }

    fn remove_child(&mut self, container: &NodeId, node: &NodeId) {
        if self.arena.detach(*container, *node) {
            self.record(Mutation::Remove {
                parent: *container,
                node: *node,
            });
        } else {
            tracing::warn!(?container, ?node, "remove_child on a node outside its container");
        }
    }

    fn discard_node(&mut self, node: &NodeId) {
        if self.arena.release(*node) {
            self.record(Mutation::Discard { node: *node });
        }
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.parent(*node)
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.next_sibling(*node)
    }

    fn first_child(&self, container: &NodeId) -> Option<NodeId> {
        self.arena.children(*container).first().copied()
    }

    fn move_before(&mut self, container: &NodeId, node: &NodeId, anchor: Option<&NodeId>) {
        if self.arena.parent(*node) != Some(*container) {
            self.insert_before(container, node, anchor);
            return;
        }
        self.arena.attach(*container, *node, anchor.copied());
        self.record(Mutation::Move {
            parent: *container,
            node: *node,
            anchor: anchor.copied(),
        });
    }
}
