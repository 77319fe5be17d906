//! Widget registry: one owning arena of live widgets and windows plus the
//! secondary indices that point into it.
//!
//! All state, including the resource cache, sits behind a single
//! `RwLock`. Lookups take the read lock and clone out what they need;
//! bookkeeping takes the write lock briefly and never calls into the
//! native engine.

mod resources;
mod teardown;
mod types;

#[cfg(test)]
mod tests;

pub use resources::ResourceCache;
pub use types::{
    ContentSwap, Released, TeardownPlan, WidgetMetadata, WidgetRef, WindowRef,
};

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tessera_common::{CallbackId, WidgetHandle, WidgetKind, WindowId};

use crate::toolkit::{NativeRef, NativeWindow};
use types::{RegistryState, WidgetRecord, WindowRecord};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Widget not found: {0}")]
    WidgetNotFound(WidgetHandle),

    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),

    #[error("Custom id not found: {0}")]
    CustomIdNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("{handle} is a {kind}, not a container")]
    NotAContainer {
        handle: WidgetHandle,
        kind: WidgetKind,
    },

    #[error("handle {0} is already live")]
    HandleInUse(WidgetHandle),

    #[error("handle {0} was retired and cannot be reused")]
    HandleRetired(WidgetHandle),

    #[error("window {0} already exists")]
    WindowExists(WindowId),

    #[error("adding {child} to {container} would create a cycle")]
    Cycle {
        container: WidgetHandle,
        child: WidgetHandle,
    },
}

#[derive(Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lookups (read lock)
    // =========================================================================

    /// Fails if `handle` is live or was ever used before.
    pub fn ensure_fresh(&self, handle: &WidgetHandle) -> Result<(), RegistryError> {
        let state = self.read();
        if state.widgets.contains_key(handle) {
            return Err(RegistryError::HandleInUse(handle.clone()));
        }
        if state.retired.contains(handle) {
            return Err(RegistryError::HandleRetired(handle.clone()));
        }
        Ok(())
    }

    pub fn widget(&self, handle: &WidgetHandle) -> Result<WidgetRef, RegistryError> {
        let state = self.read();
        let record = state
            .widgets
            .get(handle)
            .ok_or_else(|| RegistryError::WidgetNotFound(handle.clone()))?;
        Ok(WidgetRef {
            handle: handle.clone(),
            kind: record.kind,
            native: record.native.clone(),
            callback: state.callbacks.get(handle).cloned(),
        })
    }

    pub fn container(&self, handle: &WidgetHandle) -> Result<WidgetRef, RegistryError> {
        let widget = self.widget(handle)?;
        if !widget.kind.is_container() {
            return Err(RegistryError::NotAContainer {
                handle: handle.clone(),
                kind: widget.kind,
            });
        }
        Ok(widget)
    }

    pub fn window(&self, id: &WindowId) -> Result<WindowRef, RegistryError> {
        let state = self.read();
        let record = state
            .windows
            .get(id)
            .ok_or_else(|| RegistryError::WindowNotFound(id.clone()))?;
        Ok(WindowRef {
            id: id.clone(),
            native: record.native.clone(),
            fixed_size: record.fixed_size,
            content: state.window_content.get(id).cloned(),
        })
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.read().windows.keys().cloned().collect()
    }

    pub fn parent_of(&self, handle: &WidgetHandle) -> Option<WidgetHandle> {
        self.read().parents.get(handle).cloned()
    }

    pub fn children_of(&self, handle: &WidgetHandle) -> Vec<WidgetHandle> {
        self.read().children.get(handle).cloned().unwrap_or_default()
    }

    pub fn custom_id_of(&self, handle: &WidgetHandle) -> Option<String> {
        self.read().custom_ids_by_widget.get(handle).cloned()
    }

    pub fn find_by_custom_id(&self, custom_id: &str) -> Option<WidgetHandle> {
        self.read().custom_ids.get(custom_id).cloned()
    }

    pub fn metadata(&self, handle: &WidgetHandle) -> Option<WidgetMetadata> {
        self.read().metadata.get(handle).cloned()
    }

    /// Every live widget in creation order.
    pub fn widgets_in_order(&self) -> Vec<WidgetRef> {
        let state = self.read();
        let mut all: Vec<(u64, WidgetRef)> = state
            .widgets
            .iter()
            .map(|(handle, record)| {
                let seq = state.metadata.get(handle).map(|m| m.seq).unwrap_or(0);
                (
                    seq,
                    WidgetRef {
                        handle: handle.clone(),
                        kind: record.kind,
                        native: record.native.clone(),
                        callback: state.callbacks.get(handle).cloned(),
                    },
                )
            })
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, w)| w).collect()
    }

    pub fn resolve_resource(&self, name: &str) -> Result<Arc<Vec<u8>>, RegistryError> {
        self.read()
            .resources
            .resolve(name)
            .ok_or_else(|| RegistryError::ResourceNotFound(name.to_string()))
    }

    pub fn resource_count(&self) -> usize {
        self.read().resources.len()
    }

    pub fn live_widget_count(&self) -> usize {
        self.read().widgets.len()
    }

    pub fn is_retired(&self, handle: &WidgetHandle) -> bool {
        self.read().retired.contains(handle)
    }

    /// Whether `handle` appears in the arena or any secondary index.
    pub fn is_referenced(&self, handle: &WidgetHandle) -> bool {
        self.read().is_referenced(handle)
    }

    /// Whether `ancestor` is `handle` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: &WidgetHandle, handle: &WidgetHandle) -> bool {
        let state = self.read();
        let mut cursor = Some(handle);
        while let Some(h) = cursor {
            if h == ancestor {
                return true;
            }
            cursor = state.parents.get(h);
        }
        false
    }

    // =========================================================================
    // Bookkeeping (write lock)
    // =========================================================================

    pub fn insert_widget(
        &self,
        handle: WidgetHandle,
        kind: WidgetKind,
        native: NativeRef,
        callback: Option<CallbackId>,
        resource: Option<String>,
    ) -> Result<(), RegistryError> {
        let mut state = self.write();
        if state.widgets.contains_key(&handle) {
            return Err(RegistryError::HandleInUse(handle));
        }
        if state.retired.contains(&handle) {
            return Err(RegistryError::HandleRetired(handle));
        }
        state.next_seq += 1;
        let seq = state.next_seq;
        state
            .metadata
            .insert(handle.clone(), WidgetMetadata { seq, resource });
        if let Some(cb) = callback {
            state.callbacks.insert(handle.clone(), cb);
        }
        state.widgets.insert(handle, WidgetRecord { kind, native });
        Ok(())
    }

    pub fn insert_window(
        &self,
        id: WindowId,
        native: Arc<dyn NativeWindow>,
        fixed_size: bool,
    ) -> Result<(), RegistryError> {
        let mut state = self.write();
        if state.windows.contains_key(&id) {
            return Err(RegistryError::WindowExists(id));
        }
        state.windows.insert(id, WindowRecord { native, fixed_size });
        Ok(())
    }

    /// Record `child` under `container`, moving it out of any previous
    /// parent or window.
    pub fn link(&self, container: &WidgetHandle, child: &WidgetHandle) -> Result<(), RegistryError> {
        let mut state = self.write();
        for h in [container, child] {
            if !state.widgets.contains_key(h) {
                return Err(RegistryError::WidgetNotFound(h.clone()));
            }
        }
        if let Some(old) = state.parents.insert(child.clone(), container.clone()) {
            if let Some(siblings) = state.children.get_mut(&old) {
                siblings.retain(|h| h != child);
            }
        }
        state.window_content.retain(|_, content| content != child);
        let siblings = state.children.entry(container.clone()).or_default();
        if !siblings.contains(child) {
            siblings.push(child.clone());
        }
        Ok(())
    }

    /// Tear down `handle` and its descendants. Unknown handles yield an
    /// empty plan.
    pub fn teardown(&self, handle: &WidgetHandle) -> TeardownPlan {
        self.write().teardown(handle)
    }

    /// Tear down every child of `container`, keeping the container.
    pub fn teardown_children(
        &self,
        container: &WidgetHandle,
    ) -> Result<Vec<Released>, RegistryError> {
        let mut state = self.write();
        match state.widgets.get(container) {
            None => return Err(RegistryError::WidgetNotFound(container.clone())),
            Some(record) if !record.kind.is_container() => {
                return Err(RegistryError::NotAContainer {
                    handle: container.clone(),
                    kind: record.kind,
                })
            }
            Some(_) => {}
        }
        let children = state.children.get(container).cloned().unwrap_or_default();
        let mut released = Vec::new();
        for child in &children {
            released.extend(state.teardown(child).released);
        }
        state.children.remove(container);
        Ok(released)
    }

    /// Make `widget` the root of `window`, tearing down the previous root
    /// when it differs.
    pub fn replace_content(
        &self,
        window: &WindowId,
        widget: &WidgetHandle,
    ) -> Result<ContentSwap, RegistryError> {
        let mut state = self.write();
        let window_native = state
            .windows
            .get(window)
            .map(|w| w.native.clone())
            .ok_or_else(|| RegistryError::WindowNotFound(window.clone()))?;
        let content = state
            .widgets
            .get(widget)
            .map(|w| w.native.clone())
            .ok_or_else(|| RegistryError::WidgetNotFound(widget.clone()))?;

        if state.window_content.get(window) == Some(widget) {
            return Ok(ContentSwap {
                window: window_native,
                content,
                detached_from: None,
                cleared_windows: Vec::new(),
                released: Vec::new(),
                unchanged: true,
            });
        }

        let detached_from = match state.parents.remove(widget) {
            Some(parent) => {
                if let Some(siblings) = state.children.get_mut(&parent) {
                    siblings.retain(|h| h != widget);
                }
                state.widgets.get(&parent).map(|p| p.native.clone())
            }
            None => None,
        };

        // A widget is the root of at most one window.
        let others: Vec<WindowId> = state
            .window_content
            .iter()
            .filter(|(id, content)| *id != window && *content == widget)
            .map(|(id, _)| id.clone())
            .collect();
        let mut cleared_windows = Vec::new();
        for id in others {
            state.window_content.remove(&id);
            if let Some(record) = state.windows.get(&id) {
                cleared_windows.push(record.native.clone());
            }
        }

        let old = state.window_content.insert(window.clone(), widget.clone());
        let released = match old {
            Some(old) if &old != widget => state.teardown(&old).released,
            _ => Vec::new(),
        };

        Ok(ContentSwap {
            window: window_native,
            content,
            detached_from,
            cleared_windows,
            released,
            unchanged: false,
        })
    }

    /// Bind `custom_id` to `handle`. Re-registration moves the id and a
    /// widget keeps at most one custom id.
    pub fn register_custom_id(
        &self,
        custom_id: &str,
        handle: &WidgetHandle,
    ) -> Result<(), RegistryError> {
        let mut state = self.write();
        if !state.widgets.contains_key(handle) {
            return Err(RegistryError::WidgetNotFound(handle.clone()));
        }
        if let Some(previous_owner) = state.custom_ids.insert(custom_id.to_string(), handle.clone()) {
            if &previous_owner != handle {
                state.custom_ids_by_widget.remove(&previous_owner);
            }
        }
        if let Some(old_id) = state
            .custom_ids_by_widget
            .insert(handle.clone(), custom_id.to_string())
        {
            if old_id != custom_id {
                state.custom_ids.remove(&old_id);
            }
        }
        Ok(())
    }

    pub fn set_image_resource(&self, handle: &WidgetHandle, resource: Option<String>) {
        if let Some(meta) = self.write().metadata.get_mut(handle) {
            meta.resource = resource;
        }
    }

    pub fn register_resource(&self, name: &str, data: Vec<u8>) {
        self.write().resources.register(name, data);
    }

    pub fn unregister_resource(&self, name: &str) -> bool {
        self.write().resources.unregister(name)
    }

    /// Tear down every widget. Windows stay open with no content.
    pub fn clear_all(&self) -> (Vec<Arc<dyn NativeWindow>>, Vec<Released>) {
        let mut state = self.write();
        let roots: Vec<WidgetHandle> = state
            .widgets
            .keys()
            .filter(|h| !state.parents.contains_key(*h))
            .cloned()
            .collect();
        let mut released = Vec::new();
        for root in &roots {
            released.extend(state.teardown(root).released);
        }
        state.window_content.clear();
        let windows = state.windows.values().map(|w| w.native.clone()).collect();
        (windows, released)
    }
}
