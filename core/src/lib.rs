//! Core types shared by the ripple reconciler and its renderers.
//!
//! - [`element`]: canonical elements, raw input and the tree-description constructor.
//! - [`path`]: structural paths used as stable keys for component state.
//! - [`host`]: the primitives a renderer exposes, plus the shared attribute algorithms.
//! - [`hooks`]: the hook-store boundary components use to keep state between renders.

#![allow(clippy::module_name_repetitions)]

pub mod attr;
pub mod element;
pub mod hooks;
pub mod host;
pub mod path;

pub use attr::{AttrValue, Event, EventHandler, Style};
pub use element::{
    Component, Element, ElementBuilder, ElementType, Key, Props, RawNode, build, fragment, h,
    normalize, text,
};
pub use hooks::{HookContext, HookStore, Scope};
pub use host::HostRenderer;
pub use path::{Path, Segment};
