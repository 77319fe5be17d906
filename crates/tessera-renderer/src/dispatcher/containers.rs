//! Container membership.

use tessera_common::WidgetHandle;
use tessera_protocol::{Reply, RpcError};
use tracing::debug;

use super::Dispatcher;
use crate::registry::RegistryError;

impl Dispatcher {
    /// Append `child` to `container`, moving it out of any previous parent.
    pub(super) fn container_add(
        &self,
        container_id: &WidgetHandle,
        child_id: &WidgetHandle,
    ) -> Result<Reply, RpcError> {
        let container = self.registry.container(container_id)?;
        let child = self.registry.widget(child_id)?;
        if self.registry.is_ancestor(child_id, container_id) {
            return Err(RegistryError::Cycle {
                container: container_id.clone(),
                child: child_id.clone(),
            }
            .into());
        }
        let previous = self
            .registry
            .parent_of(child_id)
            .filter(|p| p != container_id)
            .and_then(|p| self.registry.widget(&p).ok())
            .map(|p| p.native);

        let child_native = child.native.clone();
        let parent_native = container.native.clone();
        self.on_ui(move || {
            if let Some(previous) = previous {
                previous.remove_child(&child_native)?;
            }
            parent_native.add_child(child_native)
        })?;
        self.registry.link(container_id, child_id)?;
        debug!(container_id = %container_id, child_id = %child_id, "child added");
        Ok(Reply::Ack)
    }

    /// Detach every child and tear each subtree down.
    pub(super) fn container_remove_all(&self, container_id: &WidgetHandle) -> Result<Reply, RpcError> {
        let released = self.registry.teardown_children(container_id)?;
        let container = self.registry.container(container_id)?;
        let removed = released.len();
        self.on_ui(move || container.native.clear_children())?;
        self.release(released);
        debug!(container_id = %container_id, removed, "container cleared");
        Ok(Reply::Ack)
    }

    pub(super) fn container_refresh(&self, container_id: &WidgetHandle) -> Result<Reply, RpcError> {
        let container = self.registry.container(container_id)?;
        self.on_ui(move || container.native.refresh())?;
        Ok(Reply::Ack)
    }
}
