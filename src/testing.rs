//! Shared fixture for reconciler tests.

use ripple_core::{Element, HookContext, Path};
use ripple_memory::{MemoryHost, NodeId};

use crate::{InstanceId, InstanceTree, Reconciler, RenderError};

/// A memory host with one container and the state a reconciler needs.
pub struct Harness {
    pub host: MemoryHost,
    pub tree: InstanceTree<NodeId>,
    pub hooks: HookContext,
    pub container: NodeId,
}

impl Harness {
    pub fn new() -> Self {
        let mut host = MemoryHost::new();
        let container = host.container("root");
        Self {
            host,
            tree: InstanceTree::new(),
            hooks: HookContext::new(),
            container,
        }
    }

    pub fn reconcile(
        &mut self,
        previous: Option<InstanceId>,
        element: Option<&Element>,
    ) -> Result<Option<InstanceId>, RenderError> {
        Reconciler::new(&mut self.host, &mut self.tree, &mut self.hooks).reconcile(
            &self.container,
            previous,
            element,
            &Path::root("root"),
        )
    }

    pub fn node_of(&self, id: InstanceId) -> NodeId {
        self.tree
            .get(id)
            .and_then(|instance| instance.node().copied())
            .expect("instance should own a node")
    }

    pub fn markup(&self) -> String {
        self.host.to_markup(self.container)
    }
}
