//! App lifecycle: launch, switch, quit.
//!
//! A launch runs the app's builder inside a fresh resource scope and a
//! capture boundary. On success the captured roots become the content of a
//! new app frame. On failure (error or panic) everything the builder made
//! is destroyed, its resources are dropped, and an error panel is shown in
//! the notice slot; the navigation stack is left as it was.

mod builders;
mod catalog;
mod grid;
mod instance;

pub use builders::{
    builder, AppHandle, BuildContext, Builder, BuilderArg, BuilderArgs, BuilderSource,
    CachedBuilders, Services, StaticBuilders,
};
pub use catalog::{AppCatalog, AppMeta, StaticCatalog};
pub use grid::{home_entries, AppGrid, GridEntry};
pub use instance::{InstanceId, InstanceInfo, InstanceState};

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use futures_util::FutureExt;
use tessera_common::WidgetHandle;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::navigation::{FrameId, FrameKind, FrameSpec, Layout, Navigator};
use crate::ui::Ui;
use crate::{BuildError, LaunchError};
use grid::CapturedContent;
use instance::Instance;

/// Result of a launch request.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    Launched(InstanceId),
    /// Single-instance app already running; its frame was brought forward.
    Switched(InstanceId),
    /// The builder failed; an error panel is showing.
    Failed { app: String, message: String },
}

#[derive(Default)]
struct Registry {
    instances: BTreeMap<InstanceId, Instance>,
    /// Launch count per app slug; numbers scopes `slug-N`.
    launches: HashMap<String, u32>,
    next_id: u64,
}

pub struct Launcher {
    ui: Ui,
    nav: Arc<Navigator>,
    catalog: Arc<dyn AppCatalog>,
    builders: Arc<dyn BuilderSource>,
    services: Services,
    registry: StdMutex<Registry>,
    folders: Mutex<HashMap<String, FrameId>>,
    me: Weak<Launcher>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Launcher {
    pub fn new(
        nav: Arc<Navigator>,
        catalog: Arc<dyn AppCatalog>,
        builders: Arc<dyn BuilderSource>,
        services: Services,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            ui: nav.ui().clone(),
            nav,
            catalog,
            builders,
            services,
            registry: StdMutex::new(Registry::default()),
            folders: Mutex::new(HashMap::new()),
            me: me.clone(),
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.nav
    }

    pub fn list_apps(&self) -> Vec<AppMeta> {
        self.catalog.list_apps()
    }

    /// Grid content for the home frame.
    pub fn home_content(&self) -> Arc<AppGrid> {
        AppGrid::new(home_entries(self.list_apps()), self.me.clone())
    }

    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.registry().instances.values().map(Instance::info).collect()
    }

    pub fn instance(&self, id: InstanceId) -> Option<InstanceInfo> {
        self.registry().instances.get(&id).map(Instance::info)
    }

    pub fn running_count(&self) -> usize {
        self.registry().instances.len()
    }

    /// Widgets the instance's builder created.
    pub fn captured(&self, id: InstanceId) -> Vec<WidgetHandle> {
        self.registry()
            .instances
            .get(&id)
            .map(|i| i.captured.clone())
            .unwrap_or_default()
    }

    pub async fn launch_by_name(&self, name: &str) -> Result<LaunchOutcome, LaunchError> {
        let meta = self
            .catalog
            .find(name)
            .ok_or_else(|| LaunchError::UnknownApp(name.to_string()))?;
        self.launch(&meta).await
    }

    pub async fn launch(&self, meta: &AppMeta) -> Result<LaunchOutcome, LaunchError> {
        if !meta.multi_instance {
            let existing = self
                .registry()
                .instances
                .values()
                .find(|i| i.meta.name == meta.name)
                .map(|i| i.id);
            if let Some(id) = existing {
                self.switch_to(id).await?;
                return Ok(LaunchOutcome::Switched(id));
            }
        }

        let (id, scope) = self.allocate(meta);
        info!(app = %meta.name, instance = %id, scope = %scope, "launching app");

        let Some(builder) = self.builders.resolve(meta) else {
            self.registry().instances.remove(&id);
            let err = LaunchError::NoBuilder(meta.name.clone());
            return self.report_failure(meta, err.to_string()).await;
        };

        let layout = self.nav.layout().await;
        let ctx = BuildContext {
            ui: self.ui.clone(),
            args: self.arguments(meta, id, &scope, &layout),
        };

        let (outcome, captured) = {
            let _scope = self.ui.scopes().enter(scope.clone(), layout.scale);
            let boundary = self.ui.capture().begin();
            let outcome = AssertUnwindSafe(builder(ctx)).catch_unwind().await;
            (outcome, boundary.finish())
        };

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(BuildError::Panicked(panic_message(&*payload))),
        };
        if let Some(error) = error {
            warn!(app = %meta.name, instance = %id, error = %error, "app builder failed");
            self.discard(id, &scope, &captured.created).await;
            return self.report_failure(meta, error.to_string()).await;
        }

        if let Some(instance) = self.registry().instances.get_mut(&id) {
            instance.transition(InstanceState::Built);
            instance.captured = captured.created.clone();
        }

        let spec = FrameSpec::new(FrameKind::App, meta.name.clone())
            .with_scope(scope.clone())
            .with_content(Arc::new(CapturedContent {
                roots: captured.roots,
            }));
        let frame = match self.nav.add_frame(spec).await {
            Ok(frame) => frame,
            Err(e) => {
                self.discard(id, &scope, &captured.created).await;
                return Err(e.into());
            }
        };
        if let Some(instance) = self.registry().instances.get_mut(&id) {
            instance.frame = Some(frame);
        }
        if let Err(e) = self.nav.push(frame).await {
            self.nav.remove_frame(frame).await.ok();
            self.discard(id, &scope, &captured.created).await;
            return Err(e.into());
        }
        self.sync_visibility().await;
        info!(app = %meta.name, instance = %id, frame = %frame, "app launched");
        Ok(LaunchOutcome::Launched(id))
    }

    fn allocate(&self, meta: &AppMeta) -> (InstanceId, String) {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = InstanceId(registry.next_id);
        let slug = meta.slug();
        let n = registry.launches.entry(slug.clone()).or_insert(0);
        *n += 1;
        let scope = format!("{slug}-{n}");
        registry
            .instances
            .insert(id, Instance::new(id, meta.clone(), scope.clone()));
        (id, scope)
    }

    /// Assemble builder arguments from the fixed name table.
    fn arguments(&self, meta: &AppMeta, id: InstanceId, scope: &str, layout: &Layout) -> BuilderArgs {
        let mut args = BuilderArgs::default();
        for name in &meta.arg_names {
            let arg = match name.as_str() {
                "app" => BuilderArg::App(AppHandle {
                    id,
                    name: meta.name.clone(),
                    scope: scope.to_string(),
                    launcher: self.me.clone(),
                }),
                "resources" => BuilderArg::Resources(scope.to_string()),
                "width" => BuilderArg::Width(layout.width),
                "height" => BuilderArg::Height(layout.height),
                "scale" => BuilderArg::Scale(layout.scale),
                other => match self.services.get(other) {
                    Some(service) => BuilderArg::Service(service),
                    None => {
                        warn!(app = %meta.name, arg = other, "unknown builder argument");
                        BuilderArg::Undefined
                    }
                },
            };
            args.push(name.clone(), arg);
        }
        args
    }

    /// Destroy what a failed launch created and forget the instance.
    async fn discard(&self, id: InstanceId, scope: &str, created: &[WidgetHandle]) {
        for handle in created {
            if let Err(e) = self.ui.destroy(handle).await {
                warn!(widget_id = %handle, error = %e, "failed to discard widget");
            }
        }
        if let Err(e) = self.ui.scopes().release(self.ui.client(), scope).await {
            warn!(scope, error = %e, "failed to release scope resources");
        }
        if let Some(mut instance) = self.registry().instances.remove(&id) {
            instance.transition(InstanceState::Quit);
        }
    }

    async fn report_failure(&self, meta: &AppMeta, message: String) -> Result<LaunchOutcome, LaunchError> {
        let title = format!("{} failed to start", meta.name);
        self.nav.show_notice(&title, &message).await?;
        Ok(LaunchOutcome::Failed {
            app: meta.name.clone(),
            message,
        })
    }

    /// Bring a running instance's frame to the top.
    pub async fn switch_to(&self, id: InstanceId) -> Result<(), LaunchError> {
        let frame = self
            .registry()
            .instances
            .get(&id)
            .and_then(|i| i.frame)
            .ok_or(LaunchError::UnknownInstance(id))?;
        let stack = self.nav.stack().await;
        match stack.iter().position(|f| *f == frame) {
            Some(index) => {
                self.nav.pop_to(index).await?;
            }
            None => self.nav.push(frame).await?,
        }
        self.sync_visibility().await;
        info!(instance = %id, frame = %frame, "switched to instance");
        Ok(())
    }

    /// Stop an instance: its frame is queued for teardown, its resources
    /// are released and navigation returns home.
    pub async fn quit(&self, id: InstanceId) -> Result<(), LaunchError> {
        let mut instance = self
            .registry()
            .instances
            .remove(&id)
            .ok_or(LaunchError::UnknownInstance(id))?;
        instance.transition(InstanceState::Quit);
        if let Some(frame) = instance.frame {
            self.nav.remove_frame(frame).await?;
        }
        self.ui
            .scopes()
            .release(self.ui.client(), &instance.scope)
            .await?;
        self.nav.pop_to_root().await?;
        self.sync_visibility().await;
        info!(app = %instance.meta.name, instance = %id, "app quit");
        Ok(())
    }

    /// Open the folder frame for `name`, creating it on first use.
    pub async fn open_folder(&self, name: &str, apps: Vec<AppMeta>) -> Result<FrameId, LaunchError> {
        let mut folders = self.folders.lock().await;
        let frame = match folders.get(name) {
            Some(frame) => *frame,
            None => {
                let entries = apps.into_iter().map(GridEntry::App).collect();
                let content = AppGrid::new(entries, self.me.clone());
                let frame = self
                    .nav
                    .add_frame(FrameSpec::new(FrameKind::Folder, name).with_content(content))
                    .await?;
                folders.insert(name.to_string(), frame);
                frame
            }
        };
        drop(folders);
        let stack = self.nav.stack().await;
        match stack.iter().position(|f| *f == frame) {
            Some(index) => {
                self.nav.pop_to(index).await?;
            }
            None => self.nav.push(frame).await?,
        }
        self.sync_visibility().await;
        Ok(frame)
    }

    /// Mark the instance whose frame is on top Visible and the rest Hidden.
    pub async fn sync_visibility(&self) {
        let top = self.nav.top().await;
        for instance in self.registry().instances.values_mut() {
            let Some(frame) = instance.frame else {
                continue;
            };
            let next = if frame == top {
                InstanceState::Visible
            } else {
                InstanceState::Hidden
            };
            instance.transition(next);
        }
    }
}
