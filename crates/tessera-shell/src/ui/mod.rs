//! Widget factory used by the shell and by app builders.
//!
//! Every widget created here is recorded in the innermost capture boundary,
//! and every button's handler lands in the [`CallbackRegistry`]. Handles come
//! from one allocator, so they are unique for the life of the session.

mod callbacks;
mod tree;

pub use callbacks::{Callback, CallbackRegistry};

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tessera_client::{BridgeClient, ClientError, ImageSource};
use tessera_common::{HandleAllocator, WidgetHandle};
use tracing::debug;

use crate::capture::CaptureStack;
use crate::resources::ResourceScopes;
use crate::ShellError;
use tree::WidgetTree;

struct UiInner {
    client: BridgeClient,
    ids: HandleAllocator,
    capture: CaptureStack,
    callbacks: CallbackRegistry,
    scopes: ResourceScopes,
    tree: Mutex<WidgetTree>,
}

#[derive(Clone)]
pub struct Ui {
    inner: Arc<UiInner>,
}

impl Ui {
    pub fn new(client: BridgeClient) -> Self {
        Self {
            inner: Arc::new(UiInner {
                client,
                ids: HandleAllocator::new(),
                capture: CaptureStack::new(),
                callbacks: CallbackRegistry::new(),
                scopes: ResourceScopes::new(),
                tree: Mutex::new(WidgetTree::default()),
            }),
        }
    }

    pub fn client(&self) -> &BridgeClient {
        &self.inner.client
    }

    pub fn capture(&self) -> &CaptureStack {
        &self.inner.capture
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.inner.callbacks
    }

    pub fn scopes(&self) -> &ResourceScopes {
        &self.inner.scopes
    }

    fn tree(&self) -> MutexGuard<'_, WidgetTree> {
        self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn children(&self, container: &WidgetHandle) -> Vec<WidgetHandle> {
        self.tree().children(container)
    }

    fn created(&self, handle: WidgetHandle) -> WidgetHandle {
        self.inner.capture.record(&handle);
        handle
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub async fn label(&self, text: &str) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("label");
        self.client().create_label(&handle, text).await?;
        Ok(self.created(handle))
    }

    pub async fn button<F, Fut>(&self, text: &str, on_click: F) -> Result<WidgetHandle, ClientError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ShellError>> + Send + 'static,
    {
        let handle = self.inner.ids.widget("button");
        let callback_id = self.inner.ids.callback();
        let callback: Callback = Arc::new(move || on_click().boxed());
        self.callbacks()
            .insert(callback_id.clone(), handle.clone(), callback);
        if let Err(e) = self
            .client()
            .create_button(&handle, text, Some(&callback_id))
            .await
        {
            self.callbacks().forget_widget(&handle);
            return Err(e);
        }
        Ok(self.created(handle))
    }

    /// Image from a named resource, resolved in the current scope.
    pub async fn image(
        &self,
        resource: &str,
        size: Option<(u32, u32)>,
    ) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("image");
        let name = self.scopes().qualified(resource);
        self.client()
            .create_image(&handle, ImageSource::Resource(name), size, None)
            .await?;
        Ok(self.created(handle))
    }

    pub async fn image_bytes(
        &self,
        data: Vec<u8>,
        size: Option<(u32, u32)>,
    ) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("image");
        self.client()
            .create_image(&handle, ImageSource::Bytes(data), size, None)
            .await?;
        Ok(self.created(handle))
    }

    pub async fn vbox(&self) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("vbox");
        self.client().create_vbox(&handle).await?;
        Ok(self.created(handle))
    }

    pub async fn hbox(&self) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("hbox");
        self.client().create_hbox(&handle).await?;
        Ok(self.created(handle))
    }

    pub async fn grid(&self, columns: u32) -> Result<WidgetHandle, ClientError> {
        let handle = self.inner.ids.widget("grid");
        self.client().create_grid(&handle, columns).await?;
        Ok(self.created(handle))
    }

    // =========================================================================
    // Tree edits
    // =========================================================================

    pub async fn add(&self, container: &WidgetHandle, child: &WidgetHandle) -> Result<(), ClientError> {
        self.client().container_add(container, child).await?;
        self.tree().attach(container, child);
        self.inner.capture.adopt(child);
        Ok(())
    }

    /// Tear down every child of `container`.
    pub async fn clear(&self, container: &WidgetHandle) -> Result<(), ClientError> {
        self.client().container_remove_all(container).await?;
        let removed = self.tree().clear_children(container);
        self.forget(&removed);
        Ok(())
    }

    /// Tear down `handle` and its subtree. Unknown handles succeed.
    pub async fn destroy(&self, handle: &WidgetHandle) -> Result<(), ClientError> {
        self.client().destroy_widget(handle).await?;
        let removed = self.tree().remove_subtree(handle);
        self.forget(&removed);
        Ok(())
    }

    fn forget(&self, removed: &[WidgetHandle]) {
        let dropped = removed
            .iter()
            .filter(|h| self.callbacks().forget_widget(h))
            .count();
        if dropped > 0 {
            debug!(widgets = removed.len(), callbacks = dropped, "callbacks dropped");
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub async fn set_text(&self, handle: &WidgetHandle, text: &str) -> Result<(), ClientError> {
        self.client().set_text(handle, text).await
    }

    pub async fn text(&self, handle: &WidgetHandle) -> Result<String, ClientError> {
        self.client().get_text(handle).await
    }

    pub async fn show(&self, handle: &WidgetHandle) -> Result<(), ClientError> {
        self.client().show_widget(handle).await
    }

    pub async fn hide(&self, handle: &WidgetHandle) -> Result<(), ClientError> {
        self.client().hide_widget(handle).await
    }

    /// Register a resource in the current scope.
    pub async fn register_resource(&self, name: &str, data: Vec<u8>) -> Result<String, ClientError> {
        self.scopes().register(self.client(), name, data).await
    }
}
