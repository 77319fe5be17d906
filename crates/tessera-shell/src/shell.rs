//! The launcher window and its event pump.

use std::sync::Arc;

use tessera_client::BridgeClient;
use tessera_common::{WidgetHandle, WindowId};
use tessera_config::LauncherConfig;
use tessera_protocol::BridgeEvent;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::launcher::{AppCatalog, BuilderSource, Launcher, Services};
use crate::navigation::Navigator;
use crate::ui::Ui;
use crate::ShellError;

pub const MAIN_WINDOW: &str = "main";

pub struct Shell {
    ui: Ui,
    nav: Arc<Navigator>,
    launcher: Arc<Launcher>,
}

impl Shell {
    /// Create and show the launcher window with the home grid on it.
    pub async fn start(
        client: BridgeClient,
        config: LauncherConfig,
        catalog: Arc<dyn AppCatalog>,
        builders: Arc<dyn BuilderSource>,
        services: Services,
    ) -> Result<Self, ShellError> {
        let window = WindowId::new(MAIN_WINDOW);
        client
            .create_window(
                &window,
                &config.title,
                config.width,
                config.height,
                config.fixed_size,
            )
            .await?;
        let ui = Ui::new(client);
        let nav = Navigator::create(ui.clone(), window.clone(), config).await?;
        let launcher = Launcher::new(Arc::clone(&nav), catalog, builders, services);
        nav.install_home(launcher.home_content()).await?;
        ui.client().show_window(&window).await?;
        info!(window_id = %window, apps = launcher.list_apps().len(), "shell started");
        Ok(Self { ui, nav, launcher })
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.nav
    }

    pub fn launcher(&self) -> &Arc<Launcher> {
        &self.launcher
    }

    pub fn window(&self) -> &WindowId {
        self.nav.window()
    }

    /// Handle one pushed event. Deferred teardown runs after the handler
    /// has returned. Returns false once the window is closed.
    pub async fn handle_event(&self, event: BridgeEvent) -> Result<bool, ShellError> {
        let keep_running = match event {
            BridgeEvent::Callback {
                callback_id,
                widget_id,
            } => {
                debug!(callback_id = %callback_id, widget_id = %widget_id, "callback event");
                self.ui.callbacks().invoke(&callback_id).await;
                true
            }
            BridgeEvent::WindowResized {
                window_id,
                width,
                height,
            } => {
                if &window_id == self.window() {
                    self.nav.relayout(width, height).await?;
                }
                true
            }
            BridgeEvent::WindowClosed { window_id } => &window_id != self.window(),
        };
        self.nav.flush_teardown().await;
        self.launcher.sync_visibility().await;
        Ok(keep_running)
    }

    /// Pump events until the window closes or the transport goes away.
    pub async fn run(&self) -> Result<(), ShellError> {
        let mut events = self.ui.client().events();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if !self.handle_event(event).await? {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event pump lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("shell stopped");
        Ok(())
    }

    /// Automation hook: click `widget` and handle the events that have
    /// arrived by the time the click is acknowledged.
    pub async fn tap(&self, widget: &WidgetHandle) -> Result<(), ShellError> {
        let mut events = self.ui.client().events();
        self.ui.client().click_widget(widget).await?;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    self.handle_event(event).await?;
                }
                Err(TryRecvError::Lagged(missed)) => warn!(missed, "tap lagged"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{builder, AppMeta, StaticBuilders, StaticCatalog};
    use crate::navigation::{FrameId, FrameKind, FrameSpec};
    use crate::BuildError;
    use tessera_client::LocalTransport;
    use tessera_protocol::SelectorType;
    use tessera_renderer::Dispatcher;

    fn counter_app() -> StaticBuilders {
        StaticBuilders::new().with(
            "Counter",
            builder(|ctx| async move {
                let column = ctx.ui.vbox().await?;
                let display = ctx.ui.label("0").await?;
                ctx.ui
                    .client()
                    .register_custom_id("counter:display", &display)
                    .await?;
                let ui = ctx.ui.clone();
                let target = display.clone();
                let bump = ctx
                    .ui
                    .button("+1", move || {
                        let ui = ui.clone();
                        let target = target.clone();
                        async move {
                            let current: u32 = ui.text(&target).await?.parse().map_err(|_| {
                                BuildError::failed("display is not a number")
                            })?;
                            ui.set_text(&target, &(current + 1).to_string()).await?;
                            Ok(())
                        }
                    })
                    .await?;
                ctx.ui
                    .client()
                    .register_custom_id("counter:bump", &bump)
                    .await?;
                ctx.ui.add(&column, &display).await?;
                ctx.ui.add(&column, &bump).await?;
                Ok(())
            }),
        )
    }

    async fn start(config: LauncherConfig) -> (Shell, Arc<Dispatcher>) {
        let transport = LocalTransport::headless().unwrap();
        let dispatcher = Arc::clone(transport.dispatcher());
        let catalog = StaticCatalog::new(vec![
            AppMeta::new("Counter"),
            AppMeta::new("Notes").multi_instance(),
        ]);
        let shell = Shell::start(
            BridgeClient::new(Arc::new(transport)),
            config,
            Arc::new(catalog),
            Arc::new(counter_app()),
            Services::new(),
        )
        .await
        .unwrap();
        (shell, dispatcher)
    }

    async fn find(shell: &Shell, id: &str) -> WidgetHandle {
        shell
            .ui()
            .client()
            .find_widget(id, SelectorType::Id)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    #[tokio::test]
    async fn start_shows_window_with_home_grid() {
        let (shell, dispatcher) = start(LauncherConfig::default()).await;
        let window = dispatcher.registry().window(shell.window()).unwrap();
        assert!(window.native.is_shown());
        assert_eq!(window.native.title(), "Tessera");
        assert_eq!(shell.navigator().top().await, FrameId::HOME);
        find(&shell, "app:Counter").await;
        find(&shell, "app:Notes").await;
    }

    #[tokio::test]
    async fn counter_state_survives_navigation() {
        let (shell, _d) = start(LauncherConfig::default()).await;
        shell.tap(&find(&shell, "app:Counter").await).await.unwrap();
        let bump = find(&shell, "counter:bump").await;
        shell.tap(&bump).await.unwrap();
        shell.tap(&bump).await.unwrap();
        let display = find(&shell, "counter:display").await;
        assert_eq!(shell.ui().text(&display).await.unwrap(), "2");

        // Open another frame on top, then come back.
        let frame = shell
            .navigator()
            .add_frame(FrameSpec::new(FrameKind::Folder, "Elsewhere"))
            .await
            .unwrap();
        shell.navigator().push(frame).await.unwrap();
        assert_eq!(shell.navigator().depth().await, 3);
        shell.navigator().pop().await.unwrap();

        assert_eq!(find(&shell, "counter:display").await, display);
        assert_eq!(shell.ui().text(&display).await.unwrap(), "2");
    }

    #[tokio::test]
    async fn resize_event_relayouts_the_grid() {
        let (shell, _d) = start(LauncherConfig::default()).await;
        let keep = shell
            .handle_event(BridgeEvent::WindowResized {
                window_id: shell.window().clone(),
                width: 1280,
                height: 720,
            })
            .await
            .unwrap();
        assert!(keep);
        let layout = shell.navigator().layout().await;
        assert_eq!(layout.columns, 6);
        // Tiles were re-created under the same custom ids.
        find(&shell, "app:Counter").await;
    }

    #[tokio::test]
    async fn fixed_size_window_ignores_resize() {
        let config = LauncherConfig {
            fixed_size: true,
            ..Default::default()
        };
        let (shell, _d) = start(config).await;
        let client = shell.ui().client();
        client.resize_window(shell.window(), 1024, 768).await.unwrap();
        assert_eq!(client.window_size(shell.window()).await.unwrap(), (540, 960));
    }

    #[tokio::test]
    async fn window_closed_stops_the_pump() {
        let (shell, _d) = start(LauncherConfig::default()).await;
        let other = shell
            .handle_event(BridgeEvent::WindowClosed {
                window_id: WindowId::new("popup"),
            })
            .await
            .unwrap();
        assert!(other);
        let ours = shell
            .handle_event(BridgeEvent::WindowClosed {
                window_id: shell.window().clone(),
            })
            .await
            .unwrap();
        assert!(!ours);
    }
}
