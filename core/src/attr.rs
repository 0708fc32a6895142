//! Attribute values carried by canonical elements.
//!
//! Attributes are plain data with one exception: event handlers, which compare by identity.
//! Two handler values are equal only when they point at the same closure, so the host adapter
//! can tell a re-render that passes the same handler apart from one that passes a fresh closure.

use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    rc::Rc,
};

use serde_json::Value;

/// Inline style declarations, keyed by property name.
pub type Style = BTreeMap<String, String>;

/// An event delivered to a handler by the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: String,
    detail: Value,
}

impl Event {
    /// Creates an event of the given kind with an arbitrary payload.
    pub fn new(kind: impl Into<String>, detail: Value) -> Self {
        Self {
            kind: kind.into(),
            detail,
        }
    }

    /// Returns the lower-cased event name, e.g. `click`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the payload attached by whoever dispatched the event.
    #[must_use]
    pub const fn detail(&self) -> &Value {
        &self.detail
    }
}

/// A shared event callback.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    /// Wraps a closure as an event handler.
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    /// Invokes the handler.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` when both handlers share the same closure.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Textual value.
    Str(String),
    /// Numeric value.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
    /// Event listener, attached through the host's listener primitives.
    Handler(EventHandler),
    /// Nested style mapping.
    Style(Style),
}

impl AttrValue {
    /// Returns the handler when this value is one.
    #[must_use]
    pub const fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Returns the style mapping when this value is one.
    #[must_use]
    pub const fn as_style(&self) -> Option<&Style> {
        match self {
            Self::Style(style) => Some(style),
            _ => None,
        }
    }

    /// Renders scalar values the way a host would print them.
    ///
    /// Integral numbers drop their fractional part, so `1.0` prints as `1`.
    /// Handlers and styles have no textual form and yield `None`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Str(value) => Some(value.clone()),
            Self::Number(value) => Some(format_number(*value)),
            Self::Bool(value) => Some(value.to_string()),
            Self::Handler(_) | Self::Style(_) => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EventHandler> for AttrValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

impl From<Style> for AttrValue {
    fn from(value: Style) -> Self {
        Self::Style(value)
    }
}

/// How a host should treat an attribute, after name translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrTarget<'a> {
    /// Listener for the given lower-cased event name.
    Event(String),
    /// The nested `style` mapping.
    Style,
    /// A plain attribute under its host-side name.
    Attribute(&'a str),
}

/// Classifies an attribute by name and value.
///
/// `on<Name>` only counts as an event when the value is a handler; `className` and `htmlFor`
/// map to `class` and `for`.
#[must_use]
pub fn classify<'a>(name: &'a str, value: &AttrValue) -> AttrTarget<'a> {
    if let Some(event) = name.strip_prefix("on")
        && !event.is_empty()
        && matches!(value, AttrValue::Handler(_))
    {
        return AttrTarget::Event(event.to_lowercase());
    }
    if name == "style" && matches!(value, AttrValue::Style(_)) {
        return AttrTarget::Style;
    }
    AttrTarget::Attribute(host_name(name))
}

/// Translates a JSX-style attribute name into the host attribute name.
#[must_use]
pub fn host_name(name: &str) -> &str {
    match name {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_compare_by_identity() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn classify_translates_names() {
        let text = AttrValue::from("x");
        assert_eq!(classify("className", &text), AttrTarget::Attribute("class"));
        assert_eq!(classify("htmlFor", &text), AttrTarget::Attribute("for"));
        assert_eq!(classify("id", &text), AttrTarget::Attribute("id"));
    }

    #[test]
    fn classify_requires_handler_for_events() {
        let handler = AttrValue::Handler(EventHandler::new(|_| {}));
        assert_eq!(
            classify("onClick", &handler),
            AttrTarget::Event("click".into())
        );
        assert_eq!(
            classify("onClick", &AttrValue::from("x")),
            AttrTarget::Attribute("onClick")
        );
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(AttrValue::Number(1.0).to_text().as_deref(), Some("1"));
        assert_eq!(AttrValue::Number(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(AttrValue::Style(Style::new()).to_text(), None);
    }
}
