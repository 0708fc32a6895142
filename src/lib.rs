#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

mod config;
mod diff;
mod error;
pub mod instance;
pub mod logging;
mod reconciler;
mod root;
#[cfg(test)]
mod testing;

pub use config::{RootBuilder, RootConfig};
pub use error::RenderError;
pub use instance::{Instance, InstanceId, InstanceKind, InstanceTree};
pub use logging::install_tracing;
pub use reconciler::Reconciler;
pub use root::{Root, RootId};

#[doc(inline)]
pub use ripple_core::{
    AttrValue, Component, Element, ElementBuilder, ElementType, Event, EventHandler, HookContext,
    HookStore, HostRenderer, Key, Path, Props, RawNode, Scope, Segment, Style, build, fragment, h,
    normalize, text,
};
