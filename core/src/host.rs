//! The capability set a renderer exposes to the reconciler.
//!
//! A host implements a handful of node primitives. The attribute algorithms
//! ([`HostRenderer::set_all_attributes`] and [`HostRenderer::apply_attribute_delta`]) are
//! provided on top of those primitives so that every host translates names, styles and event
//! handlers the same way; a host may still override them.

use std::fmt::Debug;

use crate::{
    attr::{AttrTarget, AttrValue, EventHandler, Style, classify, host_name},
    element::Props,
};

/// Node-level primitives of a renderer.
pub trait HostRenderer {
    /// Handle to a renderer-native node. Cloning a handle never clones the node.
    type Node: Clone + PartialEq + Debug;

    /// Creates a detached text node.
    fn create_text_node(&mut self, value: &str) -> Self::Node;

    /// Creates a detached element node.
    fn create_element_node(&mut self, tag: &str) -> Self::Node;

    /// Replaces the content of a text node.
    fn set_text(&mut self, node: &Self::Node, value: &str);

    /// Sets a plain attribute under its host-side name.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &AttrValue);

    /// Removes a plain attribute.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Sets one inline style declaration.
    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str);

    /// Removes one inline style declaration.
    fn remove_style_property(&mut self, node: &Self::Node, property: &str);

    /// Attaches a listener for `event`.
    fn add_event_listener(&mut self, node: &Self::Node, event: &str, handler: &EventHandler);

    /// Detaches a previously attached listener.
    fn remove_event_listener(&mut self, node: &Self::Node, event: &str, handler: &EventHandler);

    /// Inserts `node` into `container` before `anchor`, or at the end when `anchor` is `None`.
    fn insert_before(
        &mut self,
        container: &Self::Node,
        node: &Self::Node,
        anchor: Option<&Self::Node>,
    );

    /// Removes `node` from `container`.
    fn remove_child(&mut self, container: &Self::Node, node: &Self::Node);

    /// Releases a node that will never be referenced again.
    ///
    /// Called for every node of an unmounted subtree and for nodes whose mount was abandoned.
    /// Hosts whose nodes are reclaimed automatically can ignore it.
    fn discard_node(&mut self, _node: &Self::Node) {}

    /// Returns the container currently holding `node`.
    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Returns the node right after `node` in its container.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Returns the first node inside `container`.
    fn first_child(&self, container: &Self::Node) -> Option<Self::Node>;

    /// Appends `node` at the end of `container`.
    fn append_child(&mut self, container: &Self::Node, node: &Self::Node) {
        self.insert_before(container, node, None);
    }

    /// Relocates an attached node in front of `anchor`.
    fn move_before(
        &mut self,
        container: &Self::Node,
        node: &Self::Node,
        anchor: Option<&Self::Node>,
    ) {
        if self.parent_node(node).as_ref() == Some(container) {
            self.remove_child(container, node);
        }
        self.insert_before(container, node, anchor);
    }

    /// Removes every node inside `container`.
    fn clear_children(&mut self, container: &Self::Node) {
        while let Some(child) = self.first_child(container) {
            self.remove_child(container, &child);
        }
    }

    /// Applies every attribute of `props` to a freshly created node.
    fn set_all_attributes(&mut self, node: &Self::Node, props: &Props) {
        for (name, value) in props.attrs() {
            match classify(name, value) {
                AttrTarget::Event(event) => {
                    if let Some(handler) = value.as_handler() {
                        self.add_event_listener(node, &event, handler);
                    }
                }
                AttrTarget::Style => {
                    if let Some(style) = value.as_style() {
                        for (property, value) in style {
                            self.set_style_property(node, property, value);
                        }
                    }
                }
                AttrTarget::Attribute(name) => self.set_attribute(node, name, value),
            }
        }
    }

    /// Brings a node from `old` to `new` attributes, touching only what changed.
    ///
    /// Attributes missing from `new` are removed (listeners detached, styles cleared). Changed
    /// attributes are replaced; a listener is only detached and reattached when the handler
    /// itself changed. Identical attributes are left alone.
    fn apply_attribute_delta(&mut self, node: &Self::Node, old: &Props, new: &Props) {
        for (name, previous) in old.attrs() {
            if new.get(name).is_none() {
                self.remove_attribute_value(node, name, previous);
            }
        }

        for (name, value) in new.attrs() {
            let previous = old.get(name);
            if previous == Some(value) {
                continue;
            }
            match (previous, classify(name, value)) {
                (Some(AttrValue::Style(before)), AttrTarget::Style) => {
                    if let Some(after) = value.as_style() {
                        self.apply_style_delta(node, before, after);
                    }
                }
                (previous, target) => {
                    // Plain attributes are overwritten in place; listeners and styles are undone first.
                    if let Some(previous) = previous
                        && !matches!(
                            (classify(name, previous), &target),
                            (AttrTarget::Attribute(_), AttrTarget::Attribute(_))
                        )
                    {
                        self.remove_attribute_value(node, name, previous);
                    }
                    match target {
                        AttrTarget::Event(event) => {
                            if let Some(handler) = value.as_handler() {
                                self.add_event_listener(node, &event, handler);
                            }
                        }
                        AttrTarget::Style => {
                            if let Some(style) = value.as_style() {
                                for (property, value) in style {
                                    self.set_style_property(node, property, value);
                                }
                            }
                        }
                        AttrTarget::Attribute(name) => self.set_attribute(node, name, value),
                    }
                }
            }
        }
    }

    /// Undoes whatever applying `value` under `name` did.
    fn remove_attribute_value(&mut self, node: &Self::Node, name: &str, value: &AttrValue) {
        match classify(name, value) {
            AttrTarget::Event(event) => {
                if let Some(handler) = value.as_handler() {
                    self.remove_event_listener(node, &event, handler);
                }
            }
            AttrTarget::Style => {
                if let Some(style) = value.as_style() {
                    for property in style.keys() {
                        self.remove_style_property(node, property);
                    }
                }
            }
            AttrTarget::Attribute(_) => self.remove_attribute(node, host_name(name)),
        }
    }

    /// Removes vanished style declarations and sets changed ones.
    fn apply_style_delta(&mut self, node: &Self::Node, before: &Style, after: &Style) {
        for property in before.keys() {
            if !after.contains_key(property) {
                self.remove_style_property(node, property);
            }
        }
        for (property, value) in after {
            if before.get(property) != Some(value) {
                self.set_style_property(node, property, value);
            }
        }
    }
}
