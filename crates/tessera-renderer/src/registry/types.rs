//! Registry records and the lock-protected state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tessera_common::{CallbackId, WidgetHandle, WidgetKind, WindowId};

use super::resources::ResourceCache;
use crate::toolkit::{NativeRef, NativeWindow};

/// One live widget. The registry holds the only long-lived reference to
/// the native object.
pub struct WidgetRecord {
    pub kind: WidgetKind,
    pub native: NativeRef,
}

pub struct WindowRecord {
    pub native: Arc<dyn NativeWindow>,
    pub fixed_size: bool,
}

/// Per-widget bookkeeping that is not part of the native object.
#[derive(Debug, Clone, Default)]
pub struct WidgetMetadata {
    /// Creation order, used to keep lookup results stable.
    pub seq: u64,
    /// Resource an image widget was built from.
    pub resource: Option<String>,
}

/// Resolved view of a widget, cloned out from under the read lock.
#[derive(Clone)]
pub struct WidgetRef {
    pub handle: WidgetHandle,
    pub kind: WidgetKind,
    pub native: NativeRef,
    pub callback: Option<CallbackId>,
}

#[derive(Clone)]
pub struct WindowRef {
    pub id: WindowId,
    pub native: Arc<dyn NativeWindow>,
    pub fixed_size: bool,
    pub content: Option<WidgetHandle>,
}

/// A native object whose handle has been purged and which still has to be
/// released on the UI thread.
pub struct Released {
    pub handle: WidgetHandle,
    pub native: NativeRef,
}

/// Native work left over after a subtree was removed from every index.
#[derive(Default)]
pub struct TeardownPlan {
    /// Former native parent of the subtree root.
    pub detach_from: Option<NativeRef>,
    pub root: Option<NativeRef>,
    /// Windows whose content was the subtree root.
    pub cleared_windows: Vec<Arc<dyn NativeWindow>>,
    /// Children first, root last.
    pub released: Vec<Released>,
}

impl TeardownPlan {
    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}

/// Outcome of replacing a window's root widget.
pub struct ContentSwap {
    pub window: Arc<dyn NativeWindow>,
    pub content: NativeRef,
    /// Native container the new content was pulled out of, if any.
    pub detached_from: Option<NativeRef>,
    /// Other windows that showed the widget and now show nothing.
    pub cleared_windows: Vec<Arc<dyn NativeWindow>>,
    /// Old content subtree, empty when the content did not change.
    pub released: Vec<Released>,
    pub unchanged: bool,
}

#[derive(Default)]
pub struct RegistryState {
    pub(super) widgets: HashMap<WidgetHandle, WidgetRecord>,
    pub(super) windows: HashMap<WindowId, WindowRecord>,
    pub(super) window_content: HashMap<WindowId, WidgetHandle>,
    /// child -> parent
    pub(super) parents: HashMap<WidgetHandle, WidgetHandle>,
    /// parent -> children, in insertion order
    pub(super) children: HashMap<WidgetHandle, Vec<WidgetHandle>>,
    pub(super) custom_ids: HashMap<String, WidgetHandle>,
    pub(super) custom_ids_by_widget: HashMap<WidgetHandle, String>,
    pub(super) callbacks: HashMap<WidgetHandle, CallbackId>,
    pub(super) metadata: HashMap<WidgetHandle, WidgetMetadata>,
    pub(super) retired: HashSet<WidgetHandle>,
    pub(super) resources: ResourceCache,
    pub(super) next_seq: u64,
}
