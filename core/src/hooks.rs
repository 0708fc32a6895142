//! The boundary between the reconciler and per-component state.
//!
//! The reconciler brackets every component invocation with [`HookStore::enter_component`] and
//! [`HookStore::exit_component`]. Inside the bracket the component talks to the store through a
//! [`Scope`], which hands out state slots in call order. The store owns every slot and is keyed
//! by structural [`Path`]; nothing in the reconciler ever clears it.

use std::{
    any::Any,
    collections::BTreeMap,
    fmt::{self, Debug},
};

use crate::path::Path;

/// A single state slot. `None` until the owning hook first runs.
pub type Slot = Option<Box<dyn Any>>;

/// Storage for component state, keyed by structural path.
pub trait HookStore {
    /// Marks the component at `path` as active and rewinds its hook cursor.
    fn enter_component(&mut self, path: &Path);

    /// Leaves the most recently entered component.
    fn exit_component(&mut self);

    /// Returns the path of the active component, if any.
    fn current(&self) -> Option<&Path>;

    /// Returns the next slot of the active component and advances its cursor.
    fn next_slot(&mut self) -> &mut Slot;

    /// Drops every slot, cursor and active marker.
    fn clear(&mut self);
}

/// The view a running component has of the hook store.
pub struct Scope<'a> {
    path: &'a Path,
    store: &'a mut dyn HookStore,
}

impl<'a> Scope<'a> {
    /// Creates a scope for the component at `path`.
    pub fn new(path: &'a Path, store: &'a mut dyn HookStore) -> Self {
        Self { path, store }
    }

    /// Returns the structural path of the running component.
    #[must_use]
    pub const fn path(&self) -> &Path {
        self.path
    }

    /// Returns the state stored at the current hook position, initialising it on first use.
    ///
    /// If the slot holds a value of another type (hooks were called in a different order than
    /// last time) it is reinitialised.
    ///
    /// # Panics
    ///
    /// Panics if the slot does not hold a `T` right after being filled with one, which would
    /// mean the store handed out a different slot than it filled.
    pub fn state<T: 'static>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        let slot = self.store.next_slot();
        let value = match slot.take() {
            Some(value) if value.is::<T>() => value,
            previous => {
                if previous.is_some() {
                    tracing::warn!(path = %self.path, "hook slot changed type; reinitialising");
                }
                Box::new(init())
            }
        };
        slot.insert(value)
            .downcast_mut::<T>()
            .expect("slot should hold the value that was just stored")
    }
}

impl Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("path", &self.path).finish()
    }
}

/// The default [`HookStore`]: state slots and a cursor per path.
#[derive(Default)]
pub struct HookContext {
    state: BTreeMap<Path, Vec<Slot>>,
    cursor: BTreeMap<Path, usize>,
    stack: Vec<Path>,
    detached: Slot,
}

impl HookContext {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: BTreeMap::new(),
            cursor: BTreeMap::new(),
            stack: Vec::new(),
            detached: None,
        }
    }

    /// Returns how many slots the component at `path` has used.
    #[must_use]
    pub fn slot_count(&self, path: &Path) -> usize {
        self.state.get(path).map_or(0, Vec::len)
    }

    /// Returns `true` when state exists for `path`.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.state.contains_key(path)
    }

    /// Iterates over every path that owns state.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.state.keys()
    }
}

impl Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("paths", &self.state.len())
            .field("active", &self.stack.last())
            .finish_non_exhaustive()
    }
}

impl HookStore for HookContext {
    fn enter_component(&mut self, path: &Path) {
        self.cursor.insert(path.clone(), 0);
        self.stack.push(path.clone());
    }

    fn exit_component(&mut self) {
        self.stack.pop();
    }

    fn current(&self) -> Option<&Path> {
        self.stack.last()
    }

    fn next_slot(&mut self) -> &mut Slot {
        let Some(path) = self.stack.last() else {
            tracing::warn!("hook used outside of a component");
            self.detached = None;
            return &mut self.detached;
        };

        let cursor = self.cursor.entry(path.clone()).or_default();
        let index = *cursor;
        *cursor += 1;

        let slots = self.state.entry(path.clone()).or_default();
        if slots.len() <= index {
            slots.resize_with(index + 1, || None);
        }
        &mut slots[index]
    }

    fn clear(&mut self) {
        self.state.clear();
        self.cursor.clear();
        self.stack.clear();
        self.detached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Segment;

    fn path(index: usize) -> Path {
        Path::root("root").join(Segment::Index(index))
    }

    #[test]
    fn state_persists_across_entries() {
        let mut store = HookContext::new();
        let p = path(0);

        for expected in 1..=3 {
            store.enter_component(&p);
            let mut scope = Scope::new(&p, &mut store);
            let count = scope.state(|| 0_u32);
            *count += 1;
            assert_eq!(*count, expected);
            store.exit_component();
        }
        assert_eq!(store.slot_count(&p), 1);
    }

    #[test]
    fn slots_are_handed_out_in_call_order() {
        let mut store = HookContext::new();
        let p = path(0);
        store.enter_component(&p);
        {
            let mut scope = Scope::new(&p, &mut store);
            *scope.state(|| 1_i32) += 10;
            scope.state(|| "second");
        }
        store.exit_component();

        store.enter_component(&p);
        let mut scope = Scope::new(&p, &mut store);
        assert_eq!(*scope.state(|| 0_i32), 11);
        assert_eq!(*scope.state(|| "other"), "second");
    }

    #[test]
    fn mismatched_type_reinitialises() {
        let mut store = HookContext::new();
        let p = path(1);
        store.enter_component(&p);
        Scope::new(&p, &mut store).state(|| 5_u8);
        store.exit_component();

        store.enter_component(&p);
        let mut scope = Scope::new(&p, &mut store);
        assert_eq!(scope.state(|| String::from("x")).as_str(), "x");
    }

    #[test]
    fn nested_components_track_the_innermost() {
        let mut store = HookContext::new();
        store.enter_component(&path(0));
        store.enter_component(&path(1));
        assert_eq!(store.current(), Some(&path(1)));
        store.exit_component();
        assert_eq!(store.current(), Some(&path(0)));
        store.exit_component();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn clear_drops_all_state() {
        let mut store = HookContext::new();
        let p = path(0);
        store.enter_component(&p);
        Scope::new(&p, &mut store).state(|| 1_u8);
        store.clear();
        assert!(!store.contains(&p));
        assert_eq!(store.current(), None);
    }
}
