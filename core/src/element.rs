//! Canonical elements and the normalisation of raw tree descriptions.
//!
//! An [`Element`] is an immutable description of one node: its [`ElementType`], an optional
//! identity [`Key`] and its [`Props`]. Elements are reference counted, so cloning one is cheap and
//! a reconciler can hold on to the last rendered description without copying subtrees.
//!
//! Callers rarely build elements field by field. [`build`] is the tree-description constructor,
//! [`normalize`] turns heterogeneous [`RawNode`] input into elements, and [`ElementBuilder`]
//! offers the same rules through a fluent API.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Debug, Display},
    rc::Rc,
};

use serde_json::Value;

use crate::{
    attr::{AttrValue, Event, EventHandler, format_number},
    hooks::Scope,
};

/// Name of the attribute holding a text node's content.
pub const NODE_VALUE: &str = "nodeValue";

/// Name of the raw attribute that is lifted into the element's [`Key`].
pub const KEY_ATTR: &str = "key";

/// Explicit identity supplied by the caller to keep a child stable across reorders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    /// Borrows the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

macro_rules! impl_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Self(value.to_string().into())
                }
            }
        )*
    };
}

impl_key_from_int!(i32, i64, u32, u64, usize);

type RenderFn = dyn Fn(&Props, &mut Scope<'_>) -> anyhow::Result<Option<Element>>;

/// A function component.
///
/// Two components are the same type only when they share the same underlying closure, so a
/// component should be created once and cloned wherever it is used.
#[derive(Clone)]
pub struct Component {
    name: Cow<'static, str>,
    render: Rc<RenderFn>,
}

impl Component {
    /// Wraps a render function.
    ///
    /// The function may return anything convertible into a [`RawNode`]; the result is
    /// normalised, so returning `()` or `None` renders nothing.
    pub fn new<F, R>(name: impl Into<Cow<'static, str>>, render: F) -> Self
    where
        F: Fn(&Props, &mut Scope<'_>) -> anyhow::Result<R> + 'static,
        R: Into<RawNode>,
    {
        Self {
            name: name.into(),
            render: Rc::new(move |props, scope| {
                render(props, scope).map(|node| normalize(node.into()))
            }),
        }
    }

    /// Returns the display name used in structural paths and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the component with its props.
    ///
    /// # Errors
    ///
    /// Returns whatever error the component function produced.
    pub fn invoke(&self, props: &Props, scope: &mut Scope<'_>) -> anyhow::Result<Option<Element>> {
        (self.render)(props, scope)
    }

    /// Starts an element that renders this component.
    #[must_use]
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Component(self.clone()))
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// The kind of a canonical element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// A text leaf whose content lives in the `nodeValue` attribute.
    Text,
    /// A transparent grouping of children rendered straight into the parent container.
    Fragment,
    /// A renderer-native element, identified by its tag name.
    Host(String),
    /// A function component.
    Component(Component),
}

impl ElementType {
    /// Returns a short name for paths and diagnostics.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Text => "#text",
            Self::Fragment => "#fragment",
            Self::Host(tag) => tag,
            Self::Component(component) => component.name(),
        }
    }
}

/// Attributes plus the ordered children of an element.
///
/// A `None` child is a hole: a position that rendered nothing but still occupies an index.
#[derive(Debug, Clone, Default)]
pub struct Props {
    attrs: BTreeMap<String, AttrValue>,
    children: Vec<Option<Element>>,
}

impl Props {
    /// Creates empty props.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Looks up a textual attribute.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(AttrValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Iterates over every attribute except children, in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the ordered children, holes included.
    #[must_use]
    pub fn children(&self) -> &[Option<Element>] {
        &self.children
    }

    /// Sets an attribute, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.attrs.insert(name.into(), value.into())
    }

    /// Appends a child position.
    pub fn push_child(&mut self, child: Option<Element>) {
        self.children.push(child);
    }

    /// Returns `true` when no attribute besides children is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

#[derive(Debug)]
struct ElementData {
    ty: ElementType,
    key: Option<Key>,
    props: Props,
}

/// An immutable, cheaply clonable canonical node.
#[derive(Debug, Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    /// Creates an element from its parts.
    #[must_use]
    pub fn new(ty: ElementType, key: Option<Key>, props: Props) -> Self {
        Self(Rc::new(ElementData { ty, key, props }))
    }

    /// Creates a text element.
    pub fn text(value: impl Into<String>) -> Self {
        let mut props = Props::new();
        props.insert(NODE_VALUE, AttrValue::Str(value.into()));
        Self::new(ElementType::Text, None, props)
    }

    /// Creates a fragment holding the given children.
    #[must_use]
    pub fn fragment(children: Vec<Option<Self>>) -> Self {
        let props = Props {
            attrs: BTreeMap::new(),
            children,
        };
        Self::new(ElementType::Fragment, None, props)
    }

    /// Returns the element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.0.ty
    }

    /// Returns the identity key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.0.key.as_ref()
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.0.props
    }

    /// Returns the children, holes included.
    #[must_use]
    pub fn children(&self) -> &[Option<Self>] {
        self.0.props.children()
    }

    /// Returns the content of a text element.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match self.0.ty {
            ElementType::Text => Some(self.0.props.get_str(NODE_VALUE).unwrap_or_default()),
            _ => None,
        }
    }

    /// Returns `true` when both handles point at the same description.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` when `other` has the same type and key, i.e. can be updated in place.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.ty() == other.ty() && self.key() == other.key()
    }
}

/// Raw tree-description input, before normalisation.
#[derive(Debug, Clone)]
pub enum RawNode {
    /// `null`, `undefined` or a boolean: renders nothing.
    Empty,
    /// A string rendered as text.
    Text(String),
    /// A number rendered as text.
    Number(f64),
    /// An already canonical element.
    Element(Element),
    /// A nested sequence, flattened when used as children.
    List(Vec<RawNode>),
    /// Loosely typed input.
    Json(Value),
}

impl From<()> for RawNode {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<bool> for RawNode {
    fn from(_: bool) -> Self {
        Self::Empty
    }
}

impl From<&str> for RawNode {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for RawNode {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawNode {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RawNode {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Element> for RawNode {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<ElementBuilder> for RawNode {
    fn from(value: ElementBuilder) -> Self {
        Self::Element(value.build())
    }
}

impl From<Value> for RawNode {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for RawNode {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for RawNode {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Normalises raw input into a canonical element.
///
/// Empty values render nothing, strings and numbers become text elements and elements pass
/// through untouched. Anything else is malformed and also renders nothing.
#[must_use]
pub fn normalize(node: RawNode) -> Option<Element> {
    match node {
        RawNode::Empty => None,
        RawNode::Text(value) => Some(Element::text(value)),
        RawNode::Number(value) => Some(Element::text(format_number(value))),
        RawNode::Element(element) => Some(element),
        RawNode::List(items) => {
            tracing::debug!(len = items.len(), "malformed node: sequence where one node was expected");
            None
        }
        RawNode::Json(value) => normalize_json(value),
    }
}

fn normalize_json(value: Value) -> Option<Element> {
    match value {
        Value::Null | Value::Bool(_) => None,
        Value::String(value) => Some(Element::text(value)),
        Value::Number(value) => Some(Element::text(value.to_string())),
        Value::Array(_) | Value::Object(_) => {
            tracing::debug!("malformed node: unsupported JSON shape");
            None
        }
    }
}

/// Flattens nested sequences and normalises each entry, dropping everything that renders nothing.
fn flatten_into(node: RawNode, out: &mut Vec<Option<Element>>) {
    match node {
        RawNode::List(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        RawNode::Json(Value::Array(items)) => {
            for item in items {
                flatten_into(RawNode::Json(item), out);
            }
        }
        other => {
            if let Some(element) = normalize(other) {
                out.push(Some(element));
            }
        }
    }
}

fn key_from(value: &AttrValue) -> Option<Key> {
    value.to_text().map(Key::from)
}

/// The tree-description constructor.
///
/// A missing `ty` yields an empty fragment so call sites never have to guard against an absent
/// component. A `key` attribute is lifted into the element's identity and removed from its
/// attributes. Children are flattened arbitrarily deep and empty entries are dropped.
pub fn build(
    ty: Option<ElementType>,
    attrs: impl IntoIterator<Item = (String, AttrValue)>,
    children: impl IntoIterator<Item = RawNode>,
) -> Element {
    let Some(ty) = ty else {
        return Element::fragment(Vec::new());
    };

    let mut props = Props::new();
    let mut key = None;
    for (name, value) in attrs {
        if name == KEY_ATTR {
            key = key_from(&value);
        } else {
            props.attrs.insert(name, value);
        }
    }
    for child in children {
        flatten_into(child, &mut props.children);
    }
    Element::new(ty, key, props)
}

/// Fluent construction of elements, following the same rules as [`build`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ElementBuilder {
    ty: ElementType,
    key: Option<Key>,
    props: Props,
}

impl ElementBuilder {
    /// Starts an element of the given type.
    pub const fn new(ty: ElementType) -> Self {
        Self {
            ty,
            key: None,
            props: Props::new(),
        }
    }

    /// Sets the identity key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets an attribute. The `key` attribute sets the identity key instead.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == KEY_ATTR {
            self.key = key_from(&value);
        } else {
            self.props.attrs.insert(name, value);
        }
        self
    }

    /// Attaches an event handler under `name`, e.g. `onClick`.
    pub fn on(self, name: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.attr(name, EventHandler::new(handler))
    }

    /// Sets one inline style declaration.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .props
            .attrs
            .entry("style".into())
            .or_insert_with(|| AttrValue::Style(BTreeMap::new()));
        if let AttrValue::Style(style) = entry {
            style.insert(property.into(), value.into());
        } else {
            *entry = AttrValue::Style(BTreeMap::from([(property.into(), value.into())]));
        }
        self
    }

    /// Appends children, flattening lists and dropping empty entries.
    pub fn child(mut self, child: impl Into<RawNode>) -> Self {
        flatten_into(child.into(), &mut self.props.children);
        self
    }

    /// Appends a positional slot that keeps its index even when it renders nothing.
    pub fn slot(mut self, child: Option<impl Into<RawNode>>) -> Self {
        let element = child.and_then(|child| normalize(child.into()));
        self.props.children.push(element);
        self
    }

    /// Finishes the element.
    #[must_use]
    pub fn build(self) -> Element {
        Element::new(self.ty, self.key, self.props)
    }
}

impl From<ElementBuilder> for Element {
    fn from(value: ElementBuilder) -> Self {
        value.build()
    }
}

/// Starts a host element with the given tag.
pub fn h(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder::new(ElementType::Host(tag.into()))
}

/// Starts a fragment.
pub const fn fragment() -> ElementBuilder {
    ElementBuilder::new(ElementType::Fragment)
}

/// Creates a text element.
pub fn text(value: impl Into<String>) -> Element {
    Element::text(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host(tag: &str) -> Option<ElementType> {
        Some(ElementType::Host(tag.into()))
    }

    #[test]
    fn normalize_empty_values() {
        assert!(normalize(RawNode::from(())).is_none());
        assert!(normalize(RawNode::from(true)).is_none());
        assert!(normalize(RawNode::from(None::<&str>)).is_none());
        assert!(normalize(RawNode::Json(json!(null))).is_none());
    }

    #[test]
    fn normalize_scalars_to_text() {
        let node = normalize(RawNode::from("hello")).unwrap();
        assert_eq!(node.ty(), &ElementType::Text);
        assert_eq!(node.text_value(), Some("hello"));

        let node = normalize(RawNode::from(42)).unwrap();
        assert_eq!(node.text_value(), Some("42"));

        let node = normalize(RawNode::Json(json!(7))).unwrap();
        assert_eq!(node.text_value(), Some("7"));
    }

    #[test]
    fn normalize_passes_elements_through() {
        let element = fragment().child("a").build();
        let normalized = normalize(RawNode::from(element.clone())).unwrap();
        assert!(normalized.ptr_eq(&element));
    }

    #[test]
    fn normalize_rejects_malformed_input() {
        assert!(normalize(RawNode::Json(json!({ "type": "div" }))).is_none());
        assert!(normalize(RawNode::from(vec!["a", "b"])).is_none());
    }

    #[test]
    fn build_flattens_and_drops_empty_children() {
        let element = build(
            host("ul"),
            [],
            [
                RawNode::from("a"),
                RawNode::from(vec![
                    RawNode::from("b"),
                    RawNode::List(vec![RawNode::from("c"), RawNode::Empty]),
                ]),
                RawNode::from(false),
                RawNode::Json(json!(["d", null])),
            ],
        );
        let texts: Vec<_> = element
            .children()
            .iter()
            .map(|child| child.as_ref().and_then(Element::text_value).unwrap())
            .collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
    }

    #[test]
    fn build_lifts_key_out_of_attributes() {
        let element = build(
            host("li"),
            [
                ("key".into(), AttrValue::from(3)),
                ("id".into(), AttrValue::from("x")),
            ],
            [],
        );
        assert_eq!(element.key().map(Key::as_str), Some("3"));
        assert!(element.props().get("key").is_none());
        assert_eq!(element.props().get_str("id"), Some("x"));
    }

    #[test]
    fn build_without_type_is_an_empty_fragment() {
        let element = build(None, [], [RawNode::from("ignored")]);
        assert_eq!(element.ty(), &ElementType::Fragment);
        assert!(element.children().is_empty());
    }

    #[test]
    fn builder_slot_keeps_holes() {
        let element = h("div")
            .child("a")
            .slot(None::<Element>)
            .child("b")
            .build();
        assert_eq!(element.children().len(), 3);
        assert!(element.children()[1].is_none());
    }

    #[test]
    fn builder_merges_style_declarations() {
        let element = h("div").style("color", "red").style("margin", "0").build();
        let style = element.props().get("style").and_then(AttrValue::as_style).unwrap();
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn components_compare_by_closure() {
        let a = Component::new("A", |_, _| Ok(()));
        let b = Component::new("A", |_, _| Ok(()));
        assert_eq!(ElementType::Component(a.clone()), ElementType::Component(a));
        assert_ne!(
            ElementType::Component(b.clone()),
            ElementType::Component(Component::new("A", |_, _| Ok(())))
        );
    }
}
