//! Navigation stack over persistent frames.
//!
//! Every frame owns one container that lives as long as the frame does.
//! Navigating only toggles which container is shown, so a handler never
//! destroys the widget tree it was fired from. Frames that do go away are
//! queued and destroyed by [`Navigator::flush_teardown`], which the event
//! pump calls after the current handler has returned.

mod stack;
mod types;

pub use stack::FrameStack;
pub use types::{FrameContent, FrameId, FrameInfo, FrameKind, FrameSpec, Layout};

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use tessera_client::ClientError;
use tessera_common::{WidgetHandle, WindowId};
use tessera_config::LauncherConfig;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ui::Ui;
use crate::{BuildError, NavigationError};
use types::Frame;

struct NavState {
    frames: HashMap<FrameId, Frame>,
    stack: FrameStack,
    next_id: u64,
    layout: Layout,
}

impl NavState {
    fn frame(&self, id: FrameId) -> Result<&Frame, NavigationError> {
        self.frames.get(&id).ok_or(NavigationError::UnknownFrame(id))
    }

    fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame, NavigationError> {
        self.frames
            .get_mut(&id)
            .ok_or(NavigationError::UnknownFrame(id))
    }
}

pub struct Navigator {
    ui: Ui,
    window: WindowId,
    config: LauncherConfig,
    /// Window content: the notice slot followed by every frame root.
    stage: WidgetHandle,
    notice: WidgetHandle,
    notice_panel: StdMutex<Option<WidgetHandle>>,
    state: Mutex<NavState>,
    teardown: StdMutex<Vec<WidgetHandle>>,
    me: Weak<Navigator>,
}

fn lock<T>(m: &StdMutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Navigator {
    /// Install the stage as `window`'s content, with an empty home frame
    /// shown on it.
    pub async fn create(
        ui: Ui,
        window: WindowId,
        config: LauncherConfig,
    ) -> Result<Arc<Self>, NavigationError> {
        let layout = Layout::from_config(&config);
        let stage = ui.vbox().await?;
        let notice = ui.vbox().await?;
        ui.add(&stage, &notice).await?;
        ui.hide(&notice).await?;

        let home_root = ui.vbox().await?;
        let home_content = ui.vbox().await?;
        let home_keyboard = ui.vbox().await?;
        ui.hide(&home_keyboard).await?;
        ui.add(&home_root, &home_content).await?;
        ui.add(&home_root, &home_keyboard).await?;
        ui.add(&stage, &home_root).await?;
        ui.client().set_content(&window, &stage).await?;

        let home = Frame {
            info: FrameInfo {
                id: FrameId::HOME,
                kind: FrameKind::Home,
                title: String::new(),
                root: home_root,
                header: None,
                content: home_content,
                keyboard: home_keyboard,
                built: true,
            },
            scope: None,
            content: None,
            stale: false,
        };
        let mut frames = HashMap::new();
        frames.insert(FrameId::HOME, home);

        info!(window_id = %window, "navigation stage installed");
        Ok(Arc::new_cyclic(|me| Self {
            ui,
            window,
            config,
            stage,
            notice,
            notice_panel: StdMutex::new(None),
            state: Mutex::new(NavState {
                frames,
                stack: FrameStack::new(FrameId::HOME),
                next_id: 1,
                layout,
            }),
            teardown: StdMutex::new(Vec::new()),
            me: me.clone(),
        }))
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn window(&self) -> &WindowId {
        &self.window
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn stage(&self) -> &WidgetHandle {
        &self.stage
    }

    pub fn notice(&self) -> &WidgetHandle {
        &self.notice
    }

    pub async fn depth(&self) -> usize {
        self.state.lock().await.stack.depth()
    }

    pub async fn top(&self) -> FrameId {
        self.state.lock().await.stack.top()
    }

    pub async fn stack(&self) -> Vec<FrameId> {
        self.state.lock().await.stack.ids().to_vec()
    }

    pub async fn layout(&self) -> Layout {
        self.state.lock().await.layout
    }

    pub async fn frame(&self, id: FrameId) -> Option<FrameInfo> {
        self.state.lock().await.frames.get(&id).map(|f| f.info.clone())
    }

    pub async fn frame_count(&self) -> usize {
        self.state.lock().await.frames.len()
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Give the home frame its content and build it now.
    pub async fn install_home(&self, content: Arc<dyn FrameContent>) -> Result<(), NavigationError> {
        let mut state = self.state.lock().await;
        let layout = state.layout;
        let home = state.frame_mut(FrameId::HOME)?;
        self.ui.clear(&home.info.content).await?;
        content.build(&self.ui, &home.info.content, &layout).await?;
        home.content = Some(content);
        home.stale = false;
        Ok(())
    }

    /// Create a hidden frame: root container, Back/Home header and an empty
    /// content container. Content is built on first push.
    pub async fn add_frame(&self, spec: FrameSpec) -> Result<FrameId, NavigationError> {
        let id = {
            let mut state = self.state.lock().await;
            let id = FrameId(state.next_id);
            state.next_id += 1;
            id
        };

        let root = self.ui.vbox().await?;
        self.ui.hide(&root).await?;
        let header = self.header(&spec.title).await?;
        let content = self.ui.vbox().await?;
        let keyboard = self.ui.vbox().await?;
        self.ui.hide(&keyboard).await?;
        self.ui.add(&root, &header).await?;
        self.ui.add(&root, &content).await?;
        self.ui.add(&root, &keyboard).await?;
        self.ui.add(&self.stage, &root).await?;

        let frame = Frame {
            info: FrameInfo {
                id,
                kind: spec.kind,
                title: spec.title,
                root,
                header: Some(header),
                content,
                keyboard,
                built: spec.content.is_none(),
            },
            scope: spec.scope,
            content: spec.content,
            stale: false,
        };
        debug!(frame = %id, kind = ?frame.info.kind, "frame added");
        self.state.lock().await.frames.insert(id, frame);
        Ok(id)
    }

    /// Back and Home buttons. Created once per frame and never rebuilt.
    async fn header(&self, title: &str) -> Result<WidgetHandle, ClientError> {
        let bar = self.ui.hbox().await?;
        let me = self.me.clone();
        let back = self
            .ui
            .button("Back", move || {
                let me = me.clone();
                async move {
                    if let Some(nav) = me.upgrade() {
                        nav.pop().await?;
                    }
                    Ok(())
                }
            })
            .await?;
        let me = self.me.clone();
        let home = self
            .ui
            .button("Home", move || {
                let me = me.clone();
                async move {
                    if let Some(nav) = me.upgrade() {
                        nav.pop_to_root().await?;
                    }
                    Ok(())
                }
            })
            .await?;
        let label = self.ui.label(title).await?;
        self.ui.add(&bar, &back).await?;
        self.ui.add(&bar, &home).await?;
        self.ui.add(&bar, &label).await?;
        Ok(bar)
    }

    async fn build(&self, frame: &mut Frame, layout: &Layout) -> Result<(), BuildError> {
        if let Some(content) = frame.content.clone() {
            let _scope = frame
                .scope
                .as_deref()
                .map(|scope| self.ui.scopes().enter(scope, layout.scale));
            if !frame.info.built {
                if let Err(e) = content.build(&self.ui, &frame.info.content, layout).await {
                    // Leave the container empty for the next attempt.
                    if let Err(clear) = self.ui.clear(&frame.info.content).await {
                        warn!(frame = %frame.info.id, error = %clear, "could not clear partial build");
                    }
                    return Err(e);
                }
            } else if frame.stale {
                content.relayout(&self.ui, &frame.info.content, layout).await?;
            }
        }
        frame.info.built = true;
        frame.stale = false;
        Ok(())
    }

    /// Bring the current top into view, building or relaying it out first.
    async fn reveal_top(&self, state: &mut NavState) -> Result<(), NavigationError> {
        let layout = state.layout;
        let top = state.stack.top();
        let frame = state.frame_mut(top)?;
        self.build(frame, &layout).await?;
        self.ui.show(&frame.info.root).await?;
        Ok(())
    }

    async fn hide_top(&self, state: &NavState) -> Result<(), NavigationError> {
        let frame = state.frame(state.stack.top())?;
        self.ui.hide(&frame.info.root).await?;
        Ok(())
    }

    // =========================================================================
    // Stack transitions
    // =========================================================================

    /// Build `id` if needed, hide the current top and show `id` above it.
    pub async fn push(&self, id: FrameId) -> Result<(), NavigationError> {
        let mut state = self.state.lock().await;
        state.frame(id)?;
        if state.stack.contains(id) {
            return Err(NavigationError::AlreadyOnStack(id));
        }
        let layout = state.layout;
        // Build before hiding anything so a failed build leaves the view as it was.
        self.build(state.frame_mut(id)?, &layout).await?;
        self.hide_top(&state).await?;
        state.stack.push(id);
        self.reveal_top(&mut state).await?;
        info!(frame = %id, depth = state.stack.depth(), "frame pushed");
        Ok(())
    }

    pub async fn pop(&self) -> Result<FrameId, NavigationError> {
        let mut state = self.state.lock().await;
        if state.stack.depth() == 1 {
            return Err(NavigationError::AtRoot);
        }
        self.hide_top(&state).await?;
        let popped = state.stack.pop().ok_or(NavigationError::AtRoot)?;
        self.reveal_top(&mut state).await?;
        info!(frame = %popped, depth = state.stack.depth(), "frame popped");
        Ok(popped)
    }

    /// Pop until the frame at `index` is on top.
    pub async fn pop_to(&self, index: usize) -> Result<Vec<FrameId>, NavigationError> {
        let mut state = self.state.lock().await;
        let depth = state.stack.depth();
        if index >= depth {
            return Err(NavigationError::IndexOutOfRange { index, depth });
        }
        if index + 1 == depth {
            return Ok(Vec::new());
        }
        self.hide_top(&state).await?;
        let popped = state.stack.truncate_to(index);
        self.reveal_top(&mut state).await?;
        info!(popped = popped.len(), depth = state.stack.depth(), "popped to index");
        Ok(popped)
    }

    pub async fn pop_to_root(&self) -> Result<Vec<FrameId>, NavigationError> {
        self.pop_to(0).await
    }

    /// Forget `id` and queue its widgets for destruction. If it was on
    /// top, the frame below is shown.
    pub async fn remove_frame(&self, id: FrameId) -> Result<(), NavigationError> {
        if id == FrameId::HOME {
            return Err(NavigationError::HomeFrame);
        }
        let mut state = self.state.lock().await;
        state.frame(id)?;
        if state.stack.top() == id {
            self.hide_top(&state).await?;
            state.stack.remove(id);
            self.reveal_top(&mut state).await?;
        } else {
            state.stack.remove(id);
        }
        if let Some(frame) = state.frames.remove(&id) {
            self.defer_destroy(frame.info.root);
        }
        info!(frame = %id, "frame removed");
        Ok(())
    }

    /// Apply a new window size. Only the visible frame rebuilds now; hidden
    /// frames rebuild when they next come into view. Returns false if the
    /// layout did not change.
    pub async fn relayout(&self, width: u32, height: u32) -> Result<bool, NavigationError> {
        let mut state = self.state.lock().await;
        let layout = Layout::compute(&self.config, width, height);
        if layout == state.layout {
            return Ok(false);
        }
        state.layout = layout;
        let top = state.stack.top();
        for (id, frame) in state.frames.iter_mut() {
            if *id != top && frame.content.is_some() && frame.info.built {
                frame.stale = true;
            }
        }
        let frame = state.frame_mut(top)?;
        if let Some(content) = frame.content.clone() {
            let _scope = frame
                .scope
                .as_deref()
                .map(|scope| self.ui.scopes().enter(scope, layout.scale));
            content.relayout(&self.ui, &frame.info.content, &layout).await?;
        }
        info!(width, height, columns = layout.columns, "relayout");
        Ok(true)
    }

    /// Toggle the keyboard slot of a frame.
    pub async fn set_keyboard_visible(&self, id: FrameId, visible: bool) -> Result<(), NavigationError> {
        let keyboard = self.state.lock().await.frame(id)?.info.keyboard.clone();
        if visible {
            self.ui.show(&keyboard).await?;
        } else {
            self.ui.hide(&keyboard).await?;
        }
        debug!(frame = %id, visible, "keyboard slot toggled");
        Ok(())
    }

    // =========================================================================
    // Deferred teardown
    // =========================================================================

    pub fn defer_destroy(&self, handle: WidgetHandle) {
        lock(&self.teardown).push(handle);
    }

    pub fn pending_teardown(&self) -> usize {
        lock(&self.teardown).len()
    }

    /// Destroy everything queued so far. Failures are logged and the rest
    /// of the queue still runs.
    pub async fn flush_teardown(&self) -> usize {
        let queued = std::mem::take(&mut *lock(&self.teardown));
        let mut destroyed = 0;
        for handle in queued {
            match self.ui.destroy(&handle).await {
                Ok(()) => destroyed += 1,
                Err(e) => warn!(widget_id = %handle, error = %e, "deferred teardown failed"),
            }
        }
        if destroyed > 0 {
            debug!(destroyed, "deferred teardown flushed");
        }
        destroyed
    }

    // =========================================================================
    // Notice slot
    // =========================================================================

    /// Show a message panel with a Close button above the frames. Replaces
    /// any panel already showing.
    pub async fn show_notice(&self, title: &str, message: &str) -> Result<WidgetHandle, ClientError> {
        if let Some(old) = lock(&self.notice_panel).take() {
            self.defer_destroy(old);
        }
        let panel = self.ui.vbox().await?;
        let heading = self.ui.label(title).await?;
        let body = self.ui.label(message).await?;
        let me = self.me.clone();
        let close = self
            .ui
            .button("Close", move || {
                let me = me.clone();
                async move {
                    if let Some(nav) = me.upgrade() {
                        nav.dismiss_notice().await?;
                    }
                    Ok(())
                }
            })
            .await?;
        self.ui.add(&panel, &heading).await?;
        self.ui.add(&panel, &body).await?;
        self.ui.add(&panel, &close).await?;
        self.ui.add(&self.notice, &panel).await?;
        self.ui.show(&self.notice).await?;
        *lock(&self.notice_panel) = Some(panel.clone());
        Ok(panel)
    }

    /// Hide the notice slot and queue its panel for teardown.
    pub async fn dismiss_notice(&self) -> Result<(), ClientError> {
        let panel = lock(&self.notice_panel).take();
        if let Some(panel) = panel {
            self.ui.hide(&self.notice).await?;
            self.defer_destroy(panel);
        }
        Ok(())
    }

    pub fn notice_panel(&self) -> Option<WidgetHandle> {
        lock(&self.notice_panel).clone()
    }
}
