//! Subtree removal.
//!
//! Children are torn down before their parent, and every handle is purged
//! from every secondary index before it is retired. A handle that is not
//! live is skipped, which makes repeated removal a no-op.

use tessera_common::WidgetHandle;
use tracing::debug;

use super::types::{Released, RegistryState, TeardownPlan};

impl RegistryState {
    /// Remove `handle` and its descendants, returning the native work left
    /// to do on the UI thread.
    pub(super) fn teardown(&mut self, handle: &WidgetHandle) -> TeardownPlan {
        let Some(root) = self.widgets.get(handle) else {
            return TeardownPlan::default();
        };
        let root_native = root.native.clone();

        let detach_from = self
            .parents
            .get(handle)
            .and_then(|p| self.widgets.get(p))
            .map(|p| p.native.clone());

        let cleared_windows = self
            .window_content
            .iter()
            .filter(|(_, content)| *content == handle)
            .filter_map(|(id, _)| self.windows.get(id))
            .map(|w| w.native.clone())
            .collect();

        let mut released = Vec::new();
        self.teardown_into(handle, &mut released);
        debug!(widget_id = %handle, removed = released.len(), "subtree torn down");

        TeardownPlan {
            detach_from,
            root: Some(root_native),
            cleared_windows,
            released,
        }
    }

    fn teardown_into(&mut self, handle: &WidgetHandle, out: &mut Vec<Released>) {
        let children = self.children.remove(handle).unwrap_or_default();
        for child in &children {
            self.teardown_into(child, out);
        }
        self.purge(handle);
        if let Some(record) = self.widgets.remove(handle) {
            out.push(Released {
                handle: handle.clone(),
                native: record.native,
            });
            self.retired.insert(handle.clone());
        }
    }

    /// Drop `handle` from every secondary index.
    fn purge(&mut self, handle: &WidgetHandle) {
        if let Some(parent) = self.parents.remove(handle) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|h| h != handle);
            }
        }
        self.children.remove(handle);
        if let Some(custom_id) = self.custom_ids_by_widget.remove(handle) {
            if self.custom_ids.get(&custom_id) == Some(handle) {
                self.custom_ids.remove(&custom_id);
            }
        }
        self.callbacks.remove(handle);
        self.metadata.remove(handle);
        self.window_content.retain(|_, content| content != handle);
    }

    /// Whether `handle` still appears anywhere in the registry.
    pub(super) fn is_referenced(&self, handle: &WidgetHandle) -> bool {
        self.widgets.contains_key(handle)
            || self.parents.contains_key(handle)
            || self.parents.values().any(|p| p == handle)
            || self.children.contains_key(handle)
            || self.children.values().any(|c| c.contains(handle))
            || self.custom_ids.values().any(|h| h == handle)
            || self.custom_ids_by_widget.contains_key(handle)
            || self.callbacks.contains_key(handle)
            || self.metadata.contains_key(handle)
            || self.window_content.values().any(|h| h == handle)
    }
}
