//! The public entry point: one render root bound to a container.

use std::fmt::{self, Debug, Display};

use ripple_core::{Element, HookContext, HookStore, HostRenderer, Path};
use tracing::{debug, error, info_span};
use uuid::Uuid;

use crate::{
    RenderError,
    config::{RootBuilder, RootConfig},
    instance::{InstanceId, InstanceTree},
    reconciler::Reconciler,
};

/// Unique identifier of a [`Root`], attached to its tracing spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(Uuid);

impl RootId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A render root.
///
/// Owns the host renderer, the hook store and the instance tree of one mounted application.
/// [`Root::setup`] binds it to a container, after which [`Root::render`] re-renders the stored
/// element and [`Root::update`] renders a new one.
pub struct Root<H: HostRenderer, S: HookStore = HookContext> {
    id: RootId,
    config: RootConfig,
    host: H,
    hooks: S,
    tree: InstanceTree<H::Node>,
    container: Option<H::Node>,
    element: Option<Element>,
    instance: Option<InstanceId>,
}

impl<H: HostRenderer, S: HookStore> Debug for Root<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("container", &self.container)
            .field("instance", &self.instance)
            .field("instances", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl<H: HostRenderer> Root<H> {
    /// Creates a root with the default configuration and hook store.
    pub fn new(host: H) -> Self {
        RootBuilder::new().build(host)
    }
}

impl<H: HostRenderer, S: HookStore> Root<H, S> {
    pub(crate) fn from_parts(host: H, hooks: S, config: RootConfig) -> Self {
        Self {
            id: RootId::new(),
            config,
            host,
            hooks,
            tree: InstanceTree::new(),
            container: None,
            element: None,
            instance: None,
        }
    }

    /// Mounts `element` into `container`, replacing whatever this root rendered before.
    ///
    /// Any previous tree is unmounted and all hook state is dropped first. With
    /// [`RootConfig::clear_container`] set, the container is emptied too.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidContainer`] if `container` is `None`.
    /// - [`RenderError::NullRoot`] if `element` is `None`.
    /// - [`RenderError::ComponentInvocation`] if a component fails during the initial render.
    pub fn setup(
        &mut self,
        element: Option<Element>,
        container: Option<H::Node>,
    ) -> Result<(), RenderError> {
        let container = container.ok_or(RenderError::InvalidContainer)?;
        let element = element.ok_or(RenderError::NullRoot)?;

        self.teardown();
        if self.config.clear_container {
            self.host.clear_children(&container);
        }
        debug!(root = %self.id, ?container, "setup");

        self.container = Some(container);
        self.element = Some(element);
        self.render()
    }

    /// Re-renders the current element against the previous tree.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidContainer`] before [`Root::setup`] succeeded, or
    /// [`RenderError::ComponentInvocation`] if a component fails.
    pub fn render(&mut self) -> Result<(), RenderError> {
        let container = self
            .container
            .clone()
            .ok_or(RenderError::InvalidContainer)?;
        let element = self.element.clone().ok_or(RenderError::NullRoot)?;

        let span = info_span!("render", root = %self.id);
        let _enter = span.enter();

        let path = Path::root(self.config.path_label.as_str());
        let result = Reconciler::new(&mut self.host, &mut self.tree, &mut self.hooks).reconcile(
            &container,
            self.instance,
            Some(&element),
            &path,
        );

        match result {
            Ok(instance) => {
                self.instance = instance;
                debug!(instances = self.tree.len(), "render complete");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "render aborted");
                Err(err)
            }
        }
    }

    /// Replaces the root element and re-renders.
    ///
    /// # Errors
    ///
    /// Same as [`Root::render`].
    pub fn update(&mut self, element: Element) -> Result<(), RenderError> {
        self.element = Some(element);
        self.render()
    }

    /// Removes everything this root rendered and drops all hook state.
    pub fn unmount(&mut self) {
        self.teardown();
        self.container = None;
        self.element = None;
    }

    fn teardown(&mut self) {
        if let (Some(container), Some(instance)) = (self.container.clone(), self.instance.take())
        {
            let path = Path::root(self.config.path_label.as_str());
            let result = Reconciler::new(&mut self.host, &mut self.tree, &mut self.hooks)
                .reconcile(&container, Some(instance), None, &path);
            if let Err(err) = result {
                error!(root = %self.id, error = %err, "unmount failed");
            }
        }
        self.tree = InstanceTree::new();
        self.hooks.clear();
    }

    /// Returns the identifier of this root.
    #[must_use]
    pub const fn id(&self) -> RootId {
        self.id
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RootConfig {
        &self.config
    }

    /// Returns the host renderer.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host renderer mutably, e.g. to create a container.
    #[must_use]
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the hook store.
    #[must_use]
    pub const fn hooks(&self) -> &S {
        &self.hooks
    }

    /// Returns the instance tree.
    #[must_use]
    pub const fn tree(&self) -> &InstanceTree<H::Node> {
        &self.tree
    }

    /// Returns the instance at the root position.
    #[must_use]
    pub const fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// Returns the container this root is mounted into.
    #[must_use]
    pub const fn container(&self) -> Option<&H::Node> {
        self.container.as_ref()
    }

    /// Returns the element last passed to [`Root::setup`] or [`Root::update`].
    #[must_use]
    pub const fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::{Component, Event, h};
    use ripple_memory::MemoryHost;
    use serde_json::json;
    use std::{cell::Cell, rc::Rc};

    fn mounted(element: Element) -> (Root<MemoryHost>, ripple_memory::NodeId) {
        let mut root = Root::new(MemoryHost::new());
        let container = root.host_mut().container("main");
        root.setup(Some(element), Some(container)).unwrap();
        (root, container)
    }

    #[test]
    fn setup_rejects_missing_container() {
        let mut root = Root::new(MemoryHost::new());
        let error = root.setup(Some(h("div").build()), None).unwrap_err();
        assert!(matches!(error, RenderError::InvalidContainer));
    }

    #[test]
    fn setup_rejects_null_root() {
        let mut root = Root::new(MemoryHost::new());
        let container = root.host_mut().container("main");
        let error = root.setup(None, Some(container)).unwrap_err();
        assert!(matches!(error, RenderError::NullRoot));
    }

    #[test]
    fn render_before_setup_fails() {
        let mut root = Root::new(MemoryHost::new());
        assert!(matches!(root.render(), Err(RenderError::InvalidContainer)));
    }

    #[test]
    fn setup_clears_existing_content() {
        let mut root = Root::new(MemoryHost::new());
        let container = root.host_mut().container("main");
        let stale = root.host_mut().create_text_node("stale");
        root.host_mut().append_child(&container, &stale);

        root.setup(Some(h("p").child("fresh").build()), Some(container))
            .unwrap();

        assert_eq!(root.host().to_markup(container), "<main><p>fresh</p></main>");
    }

    #[test]
    fn setup_can_keep_existing_content() {
        let mut root = RootBuilder::new()
            .clear_container(false)
            .build(MemoryHost::new());
        let container = root.host_mut().container("main");
        let kept = root.host_mut().create_text_node("kept");
        root.host_mut().append_child(&container, &kept);

        root.setup(Some(h("p").build()), Some(container)).unwrap();

        assert_eq!(root.host().to_markup(container), "<main>kept<p></p></main>");
    }

    #[test]
    fn update_reuses_root_instance() {
        let (mut root, container) = mounted(h("p").child("one").build());
        let instance = root.instance();
        root.host_mut().take_mutations();

        root.update(h("p").child("two").build()).unwrap();

        assert_eq!(root.instance(), instance);
        assert_eq!(root.host().to_markup(container), "<main><p>two</p></main>");
        assert_eq!(root.host().mutations().len(), 1);
    }

    #[test]
    fn state_survives_re_renders_but_not_setup() {
        let counter = Component::new("Counter", |_, scope| {
            let count = scope.state(|| 0_i32);
            *count += 1;
            Ok(h("b").child(*count))
        });
        let (mut root, container) = mounted(counter.element().build());

        root.render().unwrap();
        root.render().unwrap();
        assert_eq!(root.host().to_markup(container), "<main><b>3</b></main>");

        root.setup(Some(counter.element().build()), Some(container))
            .unwrap();
        assert_eq!(root.host().to_markup(container), "<main><b>1</b></main>");
    }

    #[test]
    fn event_handlers_reach_listeners() {
        let clicks = Rc::new(Cell::new(0));
        let button = {
            let clicks = clicks.clone();
            h("button")
                .on("onClick", move |event: &Event| {
                    clicks.set(clicks.get() + event.detail()["count"].as_i64().unwrap_or(1));
                })
                .child("press")
                .build()
        };
        let (root, container) = mounted(button);
        let node = root.host().children(container)[0];

        let reached = root
            .host()
            .dispatch_event(node, &Event::new("click", json!({ "count": 2 })));

        assert_eq!(reached, 1);
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn errors_surface_and_root_recovers() {
        let fail = Rc::new(Cell::new(false));
        let widget = {
            let fail = fail.clone();
            Component::new("Widget", move |_, _| {
                if fail.get() {
                    anyhow::bail!("widget failed");
                }
                Ok(h("span").child("ok"))
            })
        };
        let (mut root, container) = mounted(h("div").child(widget.element()).build());

        fail.set(true);
        let error = root.render().unwrap_err();
        assert_eq!(error.to_string(), "widget failed");
        assert_eq!(
            root.host().to_markup(container),
            "<main><div><span>ok</span></div></main>"
        );

        fail.set(false);
        root.render().unwrap();
        assert_eq!(
            root.host().to_markup(container),
            "<main><div><span>ok</span></div></main>"
        );
    }

    #[test]
    fn unmount_empties_container_and_state() {
        let stateful = Component::new("Stateful", |_, scope| {
            scope.state(|| 1_u8);
            Ok(h("i"))
        });
        let (mut root, container) = mounted(h("div").child(stateful.element()).build());
        assert!(root.hooks().paths().next().is_some());

        root.unmount();

        assert!(root.host().children(container).is_empty());
        assert!(root.tree().is_empty());
        assert!(root.hooks().paths().next().is_none());
        assert!(root.instance().is_none());
        assert!(matches!(root.render(), Err(RenderError::InvalidContainer)));
    }

    #[test]
    fn roots_have_distinct_ids() {
        let a = Root::new(MemoryHost::new());
        let b = Root::new(MemoryHost::new());
        assert_ne!(a.id(), b.id());
    }
}
