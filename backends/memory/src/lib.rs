//! Headless host renderer for ripple.
//!
//! [`MemoryHost`] keeps renderer nodes in an arena addressed by [`NodeId`] and records every
//! mutation it performs. Tests use the log to check exactly which changes a reconciliation pass
//! made; headless callers use [`MemoryHost::to_markup`] and [`MemoryHost::to_json`] to inspect
//! the result.

#![deny(missing_debug_implementations)]

mod host;
mod snapshot;
pub mod tree;

pub use host::{MemoryHost, Mutation};
pub use tree::{NodeArena, NodeId, NodeKind};
