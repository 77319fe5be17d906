//! App builders and the arguments they are handed.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::{AppMeta, InstanceId, Launcher};
use crate::ui::Ui;
use crate::{BuildError, LaunchError};

pub type Builder = Arc<dyn Fn(BuildContext) -> BoxFuture<'static, Result<(), BuildError>> + Send + Sync>;

/// Wrap an async closure as a [`Builder`].
pub fn builder<F, Fut>(f: F) -> Builder
where
    F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BuildError>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// What a builder receives: the widget factory plus its named arguments.
pub struct BuildContext {
    pub ui: Ui,
    pub args: BuilderArgs,
}

/// Handle an app uses to act on its own instance.
#[derive(Clone)]
pub struct AppHandle {
    pub id: InstanceId,
    pub name: String,
    pub scope: String,
    pub(crate) launcher: Weak<Launcher>,
}

impl AppHandle {
    /// Quit this instance. Its widgets are destroyed after the current
    /// event handler returns.
    pub async fn quit(&self) -> Result<(), LaunchError> {
        match self.launcher.upgrade() {
            Some(launcher) => launcher.quit(self.id).await,
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
pub enum BuilderArg {
    App(AppHandle),
    /// Resource scope of the instance.
    Resources(String),
    Width(u32),
    Height(u32),
    Scale(f32),
    Service(Arc<dyn Any + Send + Sync>),
    /// Name not known to the launcher.
    Undefined,
}

#[derive(Clone, Default)]
pub struct BuilderArgs {
    args: Vec<(String, BuilderArg)>,
}

impl BuilderArgs {
    pub(crate) fn push(&mut self, name: impl Into<String>, arg: BuilderArg) {
        self.args.push((name.into(), arg));
    }

    pub fn get(&self, name: &str) -> Option<&BuilderArg> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn app(&self) -> Result<&AppHandle, BuildError> {
        self.args
            .iter()
            .find_map(|(_, a)| match a {
                BuilderArg::App(handle) => Some(handle),
                _ => None,
            })
            .ok_or_else(|| BuildError::MissingArg("app".into()))
    }

    pub fn width(&self) -> Option<u32> {
        match self.get("width") {
            Some(BuilderArg::Width(w)) => Some(*w),
            _ => None,
        }
    }

    pub fn height(&self) -> Option<u32> {
        match self.get("height") {
            Some(BuilderArg::Height(h)) => Some(*h),
            _ => None,
        }
    }

    pub fn scale(&self) -> Option<f32> {
        match self.get("scale") {
            Some(BuilderArg::Scale(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn resources(&self) -> Option<&str> {
        match self.get("resources") {
            Some(BuilderArg::Resources(scope)) => Some(scope),
            _ => None,
        }
    }

    /// Injected service `name`, if present and of type `T`.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        match self.get(name) {
            Some(BuilderArg::Service(svc)) => Arc::clone(svc).downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// Named services injected into builders that ask for them.
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: T) -> Self {
        self.entries.insert(name.into(), Arc::new(service));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(name).cloned()
    }
}

// =============================================================================
// Builder sources
// =============================================================================

/// Resolves an app's builder.
pub trait BuilderSource: Send + Sync {
    fn resolve(&self, meta: &AppMeta) -> Option<Builder>;
}

/// Builders bundled into the binary, keyed by [`AppMeta::builder`].
#[derive(Clone, Default)]
pub struct StaticBuilders {
    builders: HashMap<String, Builder>,
}

impl StaticBuilders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, builder: Builder) -> Self {
        self.builders.insert(key.into(), builder);
        self
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl BuilderSource for StaticBuilders {
    fn resolve(&self, meta: &AppMeta) -> Option<Builder> {
        self.builders.get(&meta.builder).cloned()
    }
}

type Loader = dyn Fn(&AppMeta) -> Option<Builder> + Send + Sync;

/// Loads builders on demand and keeps them. Apps the loader cannot
/// produce fall back to the bundled set.
pub struct CachedBuilders {
    loader: Box<Loader>,
    cache: Mutex<HashMap<String, Builder>>,
    fallback: StaticBuilders,
    loads: AtomicUsize,
}

impl CachedBuilders {
    pub fn new<L>(loader: L, fallback: StaticBuilders) -> Self
    where
        L: Fn(&AppMeta) -> Option<Builder> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cache: Mutex::new(HashMap::new()),
            fallback,
            loads: AtomicUsize::new(0),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Builder>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Times the loader has been consulted.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Drop the cached builder so the next launch reloads it.
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache().remove(key).is_some()
    }
}

impl BuilderSource for CachedBuilders {
    fn resolve(&self, meta: &AppMeta) -> Option<Builder> {
        if let Some(cached) = self.cache().get(&meta.builder) {
            return Some(Arc::clone(cached));
        }
        self.loads.fetch_add(1, Ordering::Relaxed);
        match (self.loader)(meta) {
            Some(loaded) => {
                self.cache()
                    .insert(meta.builder.clone(), Arc::clone(&loaded));
                Some(loaded)
            }
            None => self.fallback.resolve(meta),
        }
    }
}
