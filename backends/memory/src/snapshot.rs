//! Serialises a [`MemoryHost`] subtree for assertions and debugging.

use std::fmt::{self, Display};

use ripple_core::AttrValue;
use serde_json::{Map, Value, json};

use crate::{MemoryHost, NodeId, NodeKind};

/// Markup view of one subtree.
struct Markup<'a> {
    host: &'a MemoryHost,
    node: NodeId,
}

impl Display for Markup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(entry) = self.host.arena().get(self.node) else {
            return Ok(());
        };
        match &entry.kind {
            NodeKind::Text(value) => f.write_str(value),
            NodeKind::Element(tag) => {
                write!(f, "<{tag}")?;
                for (name, value) in &entry.attributes {
                    if let Some(text) = value.to_text() {
                        write!(f, " {name}=\"{text}\"")?;
                    }
                }
                if !entry.style.is_empty() {
                    f.write_str(" style=\"")?;
                    for (index, (property, value)) in entry.style.iter().enumerate() {
                        if index > 0 {
                            f.write_str("; ")?;
                        }
                        write!(f, "{property}: {value}")?;
                    }
                    f.write_str("\"")?;
                }
                f.write_str(">")?;
                for child in &entry.children {
                    Markup {
                        host: self.host,
                        node: *child,
                    }
                    .fmt(f)?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}

impl MemoryHost {
    /// Renders the subtree under `node` as markup.
    ///
    /// Attributes print in name order, followed by the inline style. Listeners are omitted.
    /// A released node renders as the empty string.
    #[must_use]
    pub fn to_markup(&self, node: NodeId) -> String {
        Markup { host: self, node }.to_string()
    }

    /// Renders the subtree under `node` as JSON.
    #[must_use]
    pub fn to_json(&self, node: NodeId) -> Value {
        let Some(entry) = self.arena().get(node) else {
            return Value::Null;
        };
        match &entry.kind {
            NodeKind::Text(value) => json!({ "text": value }),
            NodeKind::Element(tag) => {
                let attributes: Map<String, Value> = entry
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), attr_to_json(value)))
                    .collect();
                let children: Vec<Value> = entry
                    .children
                    .iter()
                    .map(|child| self.to_json(*child))
                    .collect();
                json!({
                    "tag": tag,
                    "attributes": attributes,
                    "style": entry.style,
                    "children": children,
                })
            }
        }
    }
}

fn attr_to_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::Str(value) => Value::from(value.as_str()),
        AttrValue::Number(value) => Value::from(*value),
        AttrValue::Bool(value) => Value::from(*value),
        AttrValue::Handler(_) => Value::from("[handler]"),
        AttrValue::Style(style) => json!(style),
    }
}
