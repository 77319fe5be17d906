use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tessera_common::{Orientation, Size, WidgetHandle};
use tessera_config::LauncherConfig;

use crate::ui::Ui;
use crate::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) u64);

impl FrameId {
    pub const HOME: FrameId = FrameId(0);
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Home,
    Folder,
    App,
}

/// Window geometry and the grid shape derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pub columns: u32,
    pub rows: u32,
    /// Short side relative to the configured window's short side.
    pub scale: f32,
}

impl Layout {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::compute(config, config.width, config.height)
    }

    pub fn compute(config: &LauncherConfig, width: u32, height: u32) -> Self {
        let orientation = Size::new(width as f32, height as f32).orientation();
        let columns = match orientation {
            Orientation::Portrait => config.portrait_columns,
            Orientation::Landscape => config.landscape_columns,
        };
        let base = config.width.min(config.height).max(1) as f32;
        Self {
            width,
            height,
            orientation,
            columns,
            rows: config.rows_per_page,
            scale: width.min(height) as f32 / base,
        }
    }

    pub fn page_size(&self) -> usize {
        (self.columns.max(1) * self.rows.max(1)) as usize
    }
}

/// The inside of a frame's content container.
///
/// `build` runs once per frame. `relayout` rebuilds inner sub-content after
/// a geometry change; it must leave alone any widget whose handler could
/// be the one running.
#[async_trait]
pub trait FrameContent: Send + Sync {
    async fn build(&self, ui: &Ui, content: &WidgetHandle, layout: &Layout) -> Result<(), BuildError>;

    async fn relayout(
        &self,
        _ui: &Ui,
        _content: &WidgetHandle,
        _layout: &Layout,
    ) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Parameters for a new frame.
pub struct FrameSpec {
    pub kind: FrameKind,
    pub title: String,
    /// Resource scope the content is built under.
    pub scope: Option<String>,
    pub content: Option<Arc<dyn FrameContent>>,
}

impl FrameSpec {
    pub fn new(kind: FrameKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            scope: None,
            content: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_content(mut self, content: Arc<dyn FrameContent>) -> Self {
        self.content = Some(content);
        self
    }
}

/// Snapshot of one frame's handles.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub id: FrameId,
    pub kind: FrameKind,
    pub title: String,
    /// Persistent container toggled by navigation.
    pub root: WidgetHandle,
    /// Back/Home bar; absent on the home frame.
    pub header: Option<WidgetHandle>,
    pub content: WidgetHandle,
    /// Slot below the content for an on-screen keyboard. Hidden until asked for.
    pub keyboard: WidgetHandle,
    pub built: bool,
}

pub(crate) struct Frame {
    pub info: FrameInfo,
    pub scope: Option<String>,
    pub content: Option<Arc<dyn FrameContent>>,
    /// Layout changed while hidden.
    pub stale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_follows_orientation() {
        let config = LauncherConfig::default();
        let portrait = Layout::from_config(&config);
        assert_eq!(portrait.orientation, Orientation::Portrait);
        assert_eq!(portrait.columns, 4);
        assert_eq!(portrait.page_size(), 20);
        assert_eq!(portrait.scale, 1.0);

        let landscape = Layout::compute(&config, 1920, 1080);
        assert_eq!(landscape.columns, 6);
        assert_eq!(landscape.page_size(), 30);
        assert_eq!(landscape.scale, 2.0);
    }
}
