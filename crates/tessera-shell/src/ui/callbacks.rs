use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tessera_common::{CallbackId, WidgetHandle};
use tracing::{debug, warn};

use crate::ShellError;

pub type Callback = Arc<dyn Fn() -> BoxFuture<'static, Result<(), ShellError>> + Send + Sync>;

#[derive(Default)]
struct Entries {
    by_id: HashMap<CallbackId, (WidgetHandle, Callback)>,
    by_widget: HashMap<WidgetHandle, CallbackId>,
}

/// Click handlers keyed by the callback id the renderer echoes back.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Mutex<Entries>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, id: CallbackId, widget: WidgetHandle, callback: Callback) {
        let mut entries = self.entries();
        entries.by_widget.insert(widget.clone(), id.clone());
        entries.by_id.insert(id, (widget, callback));
    }

    pub fn get(&self, id: &CallbackId) -> Option<Callback> {
        self.entries().by_id.get(id).map(|(_, cb)| Arc::clone(cb))
    }

    pub fn contains_widget(&self, widget: &WidgetHandle) -> bool {
        self.entries().by_widget.contains_key(widget)
    }

    pub fn forget_widget(&self, widget: &WidgetHandle) -> bool {
        let mut entries = self.entries();
        match entries.by_widget.remove(widget) {
            Some(id) => entries.by_id.remove(&id).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the callback for `id`. Returns false when nothing is registered.
    /// Errors and panics are logged; neither escapes.
    pub async fn invoke(&self, id: &CallbackId) -> bool {
        let Some(callback) = self.get(id) else {
            debug!(callback_id = %id, "no callback registered");
            return false;
        };
        match AssertUnwindSafe(callback()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(callback_id = %id, error = %e, "callback failed"),
            Err(_) => warn!(callback_id = %id, "callback panicked"),
        }
        true
    }
}
