//! Launcher shell on top of the bridge client: scoped resources, widget
//! capture, persistent navigation frames, and the app lifecycle.

pub mod capture;
pub mod error;
pub mod launcher;
pub mod navigation;
pub mod resources;
pub mod shell;
pub mod ui;

pub use capture::{CaptureBoundary, CaptureStack, Captured};
pub use error::{BuildError, LaunchError, NavigationError, ShellError};
pub use launcher::{
    builder, AppCatalog, AppGrid, AppHandle, AppMeta, BuildContext, Builder, BuilderArg,
    BuilderArgs, BuilderSource, CachedBuilders, GridEntry, InstanceId, InstanceInfo,
    InstanceState, LaunchOutcome, Launcher, Services, StaticBuilders, StaticCatalog,
};
pub use navigation::{
    FrameContent, FrameId, FrameInfo, FrameKind, FrameSpec, FrameStack, Layout, Navigator,
};
pub use resources::{ResourceScopes, ScopeGuard, ScopeState};
pub use shell::Shell;
pub use ui::{Callback, CallbackRegistry, Ui};
