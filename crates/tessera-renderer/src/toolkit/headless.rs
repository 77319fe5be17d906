//! Retained-mode in-memory toolkit.
//!
//! Keeps every property a real engine would (visibility, enabled state,
//! text, image bytes, child lists, window geometry) without drawing
//! anything. Used by the renderer binary when no native engine is linked
//! and by every test in the workspace.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tessera_common::WidgetKind;

use super::{NativeRef, NativeWidget, NativeWindow, Toolkit, ToolkitError, WidgetParams, WindowParams};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct Stats {
    created: AtomicUsize,
    released: AtomicUsize,
}

// =============================================================================
// Toolkit
// =============================================================================

#[derive(Debug, Default, Clone)]
pub struct HeadlessToolkit {
    stats: Arc<Stats>,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widgets created and not yet released.
    pub fn live_widgets(&self) -> usize {
        let created = self.stats.created.load(Ordering::SeqCst);
        let released = self.stats.released.load(Ordering::SeqCst);
        created.saturating_sub(released)
    }
}

impl Toolkit for HeadlessToolkit {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_widget(
        &self,
        kind: WidgetKind,
        params: &WidgetParams,
    ) -> Result<NativeRef, ToolkitError> {
        if kind == WidgetKind::Grid && params.columns == Some(0) {
            return Err(ToolkitError::Native("grid needs at least one column".into()));
        }
        if params.image.as_ref().is_some_and(|data| data.is_empty()) {
            return Err(ToolkitError::InvalidImage("empty image data".into()));
        }
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(HeadlessWidget {
            kind,
            stats: Arc::clone(&self.stats),
            state: Mutex::new(WidgetState {
                visible: true,
                enabled: true,
                text: params.text.clone().unwrap_or_default(),
                image: params.image.clone(),
                children: Vec::new(),
                released: false,
            }),
        }))
    }

    fn create_window(
        &self,
        params: &WindowParams,
    ) -> Result<Arc<dyn NativeWindow>, ToolkitError> {
        Ok(Arc::new(HeadlessWindow {
            fixed_size: params.fixed_size,
            state: Mutex::new(WindowState {
                title: params.title.clone(),
                width: params.width,
                height: params.height,
                content: None,
                shown: false,
            }),
        }))
    }
}

// =============================================================================
// Widgets
// =============================================================================

struct WidgetState {
    visible: bool,
    enabled: bool,
    text: String,
    image: Option<Arc<Vec<u8>>>,
    children: Vec<NativeRef>,
    released: bool,
}

pub struct HeadlessWidget {
    kind: WidgetKind,
    stats: Arc<Stats>,
    state: Mutex<WidgetState>,
}

impl HeadlessWidget {
    fn live_state(&self) -> Result<MutexGuard<'_, WidgetState>, ToolkitError> {
        let state = lock(&self.state);
        if state.released {
            return Err(ToolkitError::Released);
        }
        Ok(state)
    }

    fn require_container(&self, operation: &'static str) -> Result<(), ToolkitError> {
        if self.kind.is_container() {
            Ok(())
        } else {
            Err(ToolkitError::Unsupported {
                kind: self.kind,
                operation,
            })
        }
    }
}

impl NativeWidget for HeadlessWidget {
    fn kind(&self) -> WidgetKind {
        self.kind
    }

    fn set_visible(&self, visible: bool) {
        lock(&self.state).visible = visible;
    }

    fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    fn set_enabled(&self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    fn set_text(&self, text: &str) -> Result<(), ToolkitError> {
        if !matches!(self.kind, WidgetKind::Label | WidgetKind::Button) {
            return Err(ToolkitError::Unsupported {
                kind: self.kind,
                operation: "text",
            });
        }
        self.live_state()?.text = text.to_string();
        Ok(())
    }

    fn text(&self) -> Result<String, ToolkitError> {
        if !matches!(self.kind, WidgetKind::Label | WidgetKind::Button) {
            return Err(ToolkitError::Unsupported {
                kind: self.kind,
                operation: "text",
            });
        }
        Ok(self.live_state()?.text.clone())
    }

    fn set_image(&self, data: Arc<Vec<u8>>) -> Result<(), ToolkitError> {
        if self.kind != WidgetKind::Image {
            return Err(ToolkitError::Unsupported {
                kind: self.kind,
                operation: "image",
            });
        }
        if data.is_empty() {
            return Err(ToolkitError::InvalidImage("empty image data".into()));
        }
        self.live_state()?.image = Some(data);
        Ok(())
    }

    fn add_child(&self, child: NativeRef) -> Result<(), ToolkitError> {
        self.require_container("children")?;
        let mut state = self.live_state()?;
        if !state.children.iter().any(|c| Arc::ptr_eq(c, &child)) {
            state.children.push(child);
        }
        Ok(())
    }

    fn remove_child(&self, child: &NativeRef) -> Result<(), ToolkitError> {
        self.require_container("children")?;
        self.live_state()?
            .children
            .retain(|c| !Arc::ptr_eq(c, child));
        Ok(())
    }

    fn clear_children(&self) -> Result<(), ToolkitError> {
        self.require_container("children")?;
        self.live_state()?.children.clear();
        Ok(())
    }

    fn child_count(&self) -> usize {
        lock(&self.state).children.len()
    }

    fn refresh(&self) -> Result<(), ToolkitError> {
        self.require_container("refresh")?;
        self.live_state().map(|_| ())
    }

    fn tap(&self) -> Result<bool, ToolkitError> {
        let state = self.live_state()?;
        Ok(state.enabled && state.visible)
    }

    fn release(&self) -> Result<(), ToolkitError> {
        let mut state = lock(&self.state);
        if state.released {
            return Err(ToolkitError::Released);
        }
        state.released = true;
        state.children.clear();
        state.image = None;
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Windows
// =============================================================================

struct WindowState {
    title: String,
    width: u32,
    height: u32,
    content: Option<NativeRef>,
    shown: bool,
}

pub struct HeadlessWindow {
    fixed_size: bool,
    state: Mutex<WindowState>,
}

impl NativeWindow for HeadlessWindow {
    fn set_title(&self, title: &str) {
        lock(&self.state).title = title.to_string();
    }

    fn title(&self) -> String {
        lock(&self.state).title.clone()
    }

    fn size(&self) -> (u32, u32) {
        let state = lock(&self.state);
        (state.width, state.height)
    }

    fn resize(&self, width: u32, height: u32) {
        if self.fixed_size {
            return;
        }
        let mut state = lock(&self.state);
        state.width = width;
        state.height = height;
    }

    fn set_content(&self, content: Option<NativeRef>) {
        lock(&self.state).content = content;
    }

    fn content(&self) -> Option<NativeRef> {
        lock(&self.state).content.clone()
    }

    fn show(&self) {
        lock(&self.state).shown = true;
    }

    fn is_shown(&self) -> bool {
        lock(&self.state).shown
    }

    fn close(&self) {
        let mut state = lock(&self.state);
        state.shown = false;
        state.content = None;
    }
}
