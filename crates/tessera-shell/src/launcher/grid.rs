//! Paged icon grids for the home frame and folder frames.
//!
//! The pager row (Prev, page label, Next) is built once. Paging and
//! relayout only replace the grid inside the page holder, which never
//! contains the pager buttons.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tessera_common::WidgetHandle;
use tracing::debug;

use super::{AppMeta, Launcher};
use crate::navigation::{FrameContent, Layout};
use crate::ui::Ui;
use crate::BuildError;

/// One tile on a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEntry {
    App(AppMeta),
    Folder { name: String, apps: Vec<AppMeta> },
}

impl GridEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::App(meta) => &meta.name,
            Self::Folder { name, .. } => name,
        }
    }

    /// Custom id registered on the tile's button.
    pub fn tile_id(&self) -> String {
        match self {
            Self::App(meta) => format!("app:{}", meta.name),
            Self::Folder { name, .. } => format!("folder:{name}"),
        }
    }
}

/// Home entries: uncategorized apps first, then one folder per category.
pub fn home_entries(apps: Vec<AppMeta>) -> Vec<GridEntry> {
    let mut entries = Vec::new();
    let mut folders: BTreeMap<String, Vec<AppMeta>> = BTreeMap::new();
    for app in apps {
        match app.category.clone() {
            Some(category) => folders.entry(category).or_default().push(app),
            None => entries.push(GridEntry::App(app)),
        }
    }
    entries.extend(
        folders
            .into_iter()
            .map(|(name, apps)| GridEntry::Folder { name, apps }),
    );
    entries
}

#[derive(Default)]
struct GridState {
    page: usize,
    layout: Option<Layout>,
    holder: Option<WidgetHandle>,
    page_label: Option<WidgetHandle>,
}

pub struct AppGrid {
    entries: Vec<GridEntry>,
    launcher: Weak<Launcher>,
    state: Mutex<GridState>,
    me: Weak<AppGrid>,
}

impl AppGrid {
    pub fn new(entries: Vec<GridEntry>, launcher: Weak<Launcher>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            entries,
            launcher,
            state: Mutex::new(GridState::default()),
            me: me.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    pub fn page(&self) -> usize {
        self.state().page
    }

    pub fn page_count(&self, layout: &Layout) -> usize {
        self.entries.len().div_ceil(layout.page_size()).max(1)
    }

    /// Move by `delta` pages, clamped, and redraw.
    pub async fn turn(&self, ui: &Ui, delta: isize) -> Result<(), BuildError> {
        let Some(layout) = self.state().layout else {
            return Ok(());
        };
        let last = self.page_count(&layout) - 1;
        {
            let mut state = self.state();
            let next = state.page.saturating_add_signed(delta).min(last);
            if next == state.page {
                return Ok(());
            }
            state.page = next;
        }
        self.render(ui, &layout).await
    }

    async fn render(&self, ui: &Ui, layout: &Layout) -> Result<(), BuildError> {
        let (holder, label, page) = {
            let mut state = self.state();
            state.layout = Some(*layout);
            state.page = state.page.min(self.page_count(layout) - 1);
            (state.holder.clone(), state.page_label.clone(), state.page)
        };
        let Some(holder) = holder else {
            return Ok(());
        };
        ui.clear(&holder).await?;
        let grid = ui.grid(layout.columns).await?;
        let size = layout.page_size();
        for entry in self.entries.iter().skip(page * size).take(size) {
            let tile = self.tile(ui, entry).await?;
            ui.add(&grid, &tile).await?;
        }
        ui.add(&holder, &grid).await?;
        if let Some(label) = label {
            let text = format!("{} / {}", page + 1, self.page_count(layout));
            ui.set_text(&label, &text).await?;
        }
        debug!(page, columns = layout.columns, "grid rendered");
        Ok(())
    }

    async fn tile(&self, ui: &Ui, entry: &GridEntry) -> Result<WidgetHandle, BuildError> {
        let tile = ui.vbox().await?;
        if let GridEntry::App(AppMeta { icon: Some(icon), .. }) = entry {
            let image = ui.image(icon, None).await?;
            ui.add(&tile, &image).await?;
        }
        let launcher = self.launcher.clone();
        let target = entry.clone();
        let button = ui
            .button(entry.name(), move || {
                let launcher = launcher.clone();
                let target = target.clone();
                async move {
                    let Some(launcher) = launcher.upgrade() else {
                        return Ok(());
                    };
                    match target {
                        GridEntry::App(meta) => {
                            launcher.launch(&meta).await?;
                        }
                        GridEntry::Folder { name, apps } => {
                            launcher.open_folder(&name, apps).await?;
                        }
                    }
                    Ok(())
                }
            })
            .await?;
        ui.client()
            .register_custom_id(&entry.tile_id(), &button)
            .await?;
        ui.add(&tile, &button).await?;
        Ok(tile)
    }

    async fn pager_button(&self, ui: &Ui, text: &str, delta: isize) -> Result<WidgetHandle, BuildError> {
        let me = self.me.clone();
        let ui_for_click = ui.clone();
        Ok(ui
            .button(text, move || {
                let me = me.clone();
                let ui = ui_for_click.clone();
                async move {
                    if let Some(grid) = me.upgrade() {
                        grid.turn(&ui, delta).await?;
                    }
                    Ok(())
                }
            })
            .await?)
    }
}

#[async_trait]
impl FrameContent for AppGrid {
    async fn build(&self, ui: &Ui, content: &WidgetHandle, layout: &Layout) -> Result<(), BuildError> {
        let holder = ui.vbox().await?;
        let pager = ui.hbox().await?;
        let prev = self.pager_button(ui, "Prev", -1).await?;
        let label = ui.label("").await?;
        let next = self.pager_button(ui, "Next", 1).await?;
        ui.add(&pager, &prev).await?;
        ui.add(&pager, &label).await?;
        ui.add(&pager, &next).await?;
        ui.add(content, &holder).await?;
        ui.add(content, &pager).await?;
        {
            let mut state = self.state();
            state.holder = Some(holder);
            state.page_label = Some(label);
        }
        self.render(ui, layout).await
    }

    async fn relayout(&self, ui: &Ui, _content: &WidgetHandle, layout: &Layout) -> Result<(), BuildError> {
        self.render(ui, layout).await
    }
}

/// Content of an app frame: the roots its builder created.
pub(crate) struct CapturedContent {
    pub roots: Vec<WidgetHandle>,
}

#[async_trait]
impl FrameContent for CapturedContent {
    async fn build(&self, ui: &Ui, content: &WidgetHandle, _layout: &Layout) -> Result<(), BuildError> {
        for root in &self.roots {
            ui.add(content, root).await?;
        }
        Ok(())
    }
}
