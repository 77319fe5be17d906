use super::*;
use tessera_common::{WidgetHandle, WindowId};
use tessera_protocol::{ErrorCode, SelectorType};

use crate::toolkit::NativeWindow;

const TOKEN: &str = "test-token";

fn dispatcher() -> Dispatcher {
    Dispatcher::headless(TOKEN).unwrap()
}

fn call(d: &Dispatcher, op: Operation) -> Result<Reply, RpcError> {
    d.handle(Request {
        id: 1,
        authorization: TOKEN.into(),
        op,
    })
    .into_result()
}

fn label(d: &Dispatcher, id: &str, text: &str) -> WidgetHandle {
    call(
        d,
        Operation::CreateLabel {
            widget_id: id.into(),
            text: text.into(),
        },
    )
    .unwrap();
    WidgetHandle::new(id)
}

fn vbox(d: &Dispatcher, id: &str) -> WidgetHandle {
    call(d, Operation::CreateVBox { widget_id: id.into() }).unwrap();
    WidgetHandle::new(id)
}

fn add(d: &Dispatcher, container: &WidgetHandle, child: &WidgetHandle) {
    call(
        d,
        Operation::ContainerAdd {
            container_id: container.clone(),
            child_id: child.clone(),
        },
    )
    .unwrap();
}

fn window(d: &Dispatcher, id: &str, fixed_size: bool) -> WindowId {
    call(
        d,
        Operation::CreateWindow {
            window_id: id.into(),
            title: "Tessera".into(),
            width: 540,
            height: 960,
            fixed_size,
        },
    )
    .unwrap();
    WindowId::new(id)
}

fn text_of(d: &Dispatcher, h: &WidgetHandle) -> String {
    match call(d, Operation::GetText { widget_id: h.clone() }).unwrap() {
        Reply::Text { text } => text,
        other => panic!("unexpected reply {other:?}"),
    }
}

// =============================================================================
// Authorization
// =============================================================================

#[test]
fn wrong_token_is_rejected_before_mutation() {
    let d = dispatcher();
    let resp = d.handle(Request {
        id: 9,
        authorization: "nope".into(),
        op: Operation::CreateLabel {
            widget_id: "label_1".into(),
            text: "x".into(),
        },
    });
    assert_eq!(resp.id, 9);
    assert_eq!(resp.into_result().unwrap_err().code, ErrorCode::Unauthorized);
    assert_eq!(d.registry().live_widget_count(), 0);
}

#[test]
fn missing_token_is_rejected() {
    let d = dispatcher();
    let resp = d.handle(Request {
        id: 1,
        authorization: String::new(),
        op: Operation::Quit,
    });
    assert!(!resp.success);
    assert!(!*d.quit_signal().borrow());
}

#[test]
fn token_comparison() {
    assert!(token_matches("abc", "abc"));
    assert!(!token_matches("abd", "abc"));
    assert!(!token_matches("ab", "abc"));
    assert!(!token_matches("", ""));
}

// =============================================================================
// Construction and containers
// =============================================================================

#[test]
fn create_with_live_or_retired_id_is_invalid() {
    let d = dispatcher();
    let h = label(&d, "label_1", "a");
    let err = call(
        &d,
        Operation::CreateLabel {
            widget_id: h.clone(),
            text: "b".into(),
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRequest);

    call(&d, Operation::DestroyWidget { widget_id: h.clone() }).unwrap();
    let err = call(
        &d,
        Operation::CreateLabel {
            widget_id: h,
            text: "c".into(),
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRequest);
}

#[test]
fn adding_to_a_leaf_is_not_a_container() {
    let d = dispatcher();
    let a = label(&d, "label_1", "a");
    let b = label(&d, "label_2", "b");
    let err = call(
        &d,
        Operation::ContainerAdd {
            container_id: a,
            child_id: b,
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAContainer);
}

#[test]
fn cycles_are_refused() {
    let d = dispatcher();
    let outer = vbox(&d, "vbox_1");
    let inner = vbox(&d, "vbox_2");
    add(&d, &outer, &inner);
    let err = call(
        &d,
        Operation::ContainerAdd {
            container_id: inner,
            child_id: outer,
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRequest);
}

#[test]
fn unknown_handles_are_not_found() {
    let d = dispatcher();
    let err = call(&d, Operation::ShowWidget { widget_id: "ghost".into() }).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn remove_all_tears_down_children() {
    let d = dispatcher();
    let root = vbox(&d, "vbox_1");
    let row = vbox(&d, "vbox_2");
    let a = label(&d, "label_3", "a");
    add(&d, &root, &row);
    add(&d, &row, &a);
    call(
        &d,
        Operation::RegisterCustomId {
            custom_id: "display".into(),
            widget_id: a.clone(),
        },
    )
    .unwrap();

    call(&d, Operation::ContainerRemoveAll { container_id: root.clone() }).unwrap();

    assert_eq!(d.registry().live_widget_count(), 1);
    assert!(!d.registry().is_referenced(&a));
    assert!(!d.registry().is_referenced(&row));
    assert!(d.registry().find_by_custom_id("display").is_none());
    call(&d, Operation::ContainerRefresh { container_id: root }).unwrap();
}

#[test]
fn destroy_is_idempotent() {
    let d = dispatcher();
    let root = vbox(&d, "vbox_1");
    let a = label(&d, "label_2", "a");
    add(&d, &root, &a);

    call(&d, Operation::DestroyWidget { widget_id: a.clone() }).unwrap();
    call(&d, Operation::DestroyWidget { widget_id: a.clone() }).unwrap();
    call(&d, Operation::DestroyWidget { widget_id: "never_existed".into() }).unwrap();

    assert!(!d.registry().is_referenced(&a));
    assert!(d.registry().children_of(&root).is_empty());
}

// =============================================================================
// Windows
// =============================================================================

#[test]
fn set_content_reports_missing_window_and_widget() {
    let d = dispatcher();
    let win = window(&d, "main", false);
    let root = vbox(&d, "vbox_1");

    let err = call(
        &d,
        Operation::SetContent {
            window_id: "other".into(),
            widget_id: root,
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.starts_with("Window not found"));

    let err = call(
        &d,
        Operation::SetContent {
            window_id: win,
            widget_id: "ghost".into(),
        },
    )
    .unwrap_err();
    assert!(err.message.starts_with("Widget not found"));
}

#[test]
fn swapping_content_releases_the_old_tree() {
    let d = dispatcher();
    let win = window(&d, "main", false);
    let first = vbox(&d, "vbox_1");
    let inner = label(&d, "label_2", "x");
    add(&d, &first, &inner);
    let second = vbox(&d, "vbox_3");

    for root in [&first, &first, &second] {
        call(
            &d,
            Operation::SetContent {
                window_id: win.clone(),
                widget_id: root.clone(),
            },
        )
        .unwrap();
    }
    assert!(d.registry().is_retired(&first));
    assert!(d.registry().is_retired(&inner));
    assert_eq!(d.registry().live_widget_count(), 1);
}

#[test]
fn moving_content_between_windows_keeps_it_alive() {
    let d = dispatcher();
    let first = window(&d, "w1", false);
    let second = window(&d, "w2", false);
    let shared = vbox(&d, "vbox_1");
    let replacement = vbox(&d, "vbox_2");

    for (win, root) in [(&first, &shared), (&second, &shared), (&first, &replacement)] {
        call(
            &d,
            Operation::SetContent {
                window_id: win.clone(),
                widget_id: root.clone(),
            },
        )
        .unwrap();
    }

    assert!(d.registry().widget(&shared).is_ok());
    assert_eq!(d.registry().window(&second).unwrap().content, Some(shared.clone()));
    assert_eq!(d.registry().window(&first).unwrap().content, Some(replacement));
    assert!(d.registry().window(&second).unwrap().native.content().is_some());
}

#[test]
fn stealing_content_clears_the_previous_window() {
    let d = dispatcher();
    let first = window(&d, "w1", false);
    let second = window(&d, "w2", false);
    let shared = vbox(&d, "vbox_1");

    for win in [&first, &second] {
        call(
            &d,
            Operation::SetContent {
                window_id: win.clone(),
                widget_id: shared.clone(),
            },
        )
        .unwrap();
    }

    let w1 = d.registry().window(&first).unwrap();
    assert_eq!(w1.content, None);
    assert!(w1.native.content().is_none());
    assert_eq!(d.registry().window(&second).unwrap().content, Some(shared));
}

#[test]
fn fixed_size_window_keeps_dimensions() {
    let d = dispatcher();
    let win = window(&d, "main", true);
    call(
        &d,
        Operation::ResizeWindow {
            window_id: win.clone(),
            width: 960,
            height: 540,
        },
    )
    .unwrap();
    assert_eq!(
        call(&d, Operation::GetWindowSize { window_id: win }).unwrap(),
        Reply::WindowSize {
            width: 540,
            height: 960
        }
    );
}

#[tokio::test]
async fn resize_pushes_event() {
    let d = dispatcher();
    let mut events = d.subscribe_events();
    let win = window(&d, "main", false);
    call(
        &d,
        Operation::ResizeWindow {
            window_id: win.clone(),
            width: 960,
            height: 540,
        },
    )
    .unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        BridgeEvent::WindowResized {
            window_id: win,
            width: 960,
            height: 540
        }
    );
}

// =============================================================================
// Content, clicks, lookup
// =============================================================================

#[test]
fn text_and_state_round_trip() {
    let d = dispatcher();
    let l = label(&d, "label_1", "0");
    call(
        &d,
        Operation::SetText {
            widget_id: l.clone(),
            text: "42".into(),
        },
    )
    .unwrap();
    assert_eq!(text_of(&d, &l), "42");

    call(&d, Operation::DisableWidget { widget_id: l.clone() }).unwrap();
    assert_eq!(
        call(&d, Operation::IsEnabled { widget_id: l.clone() }).unwrap(),
        Reply::Enabled { enabled: false }
    );
    call(&d, Operation::HideWidget { widget_id: l.clone() }).unwrap();
    assert_eq!(
        call(&d, Operation::IsVisible { widget_id: l }).unwrap(),
        Reply::Visible { visible: false }
    );
}

#[test]
fn text_on_container_is_unsupported() {
    let d = dispatcher();
    let b = vbox(&d, "vbox_1");
    let err = call(
        &d,
        Operation::SetText {
            widget_id: b,
            text: "x".into(),
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unsupported);
}

#[test]
fn images_resolve_scoped_resources() {
    let d = dispatcher();
    call(
        &d,
        Operation::RegisterResource {
            name: "icon".into(),
            data: vec![1],
        },
    )
    .unwrap();
    call(
        &d,
        Operation::CreateImage {
            widget_id: "image_1".into(),
            resource: Some("notes-1:icon".into()),
            data: None,
            width: Some(48),
            height: Some(48),
            callback_id: None,
        },
    )
    .unwrap();
    let meta = d.registry().metadata(&"image_1".into()).unwrap();
    assert_eq!(meta.resource.as_deref(), Some("notes-1:icon"));

    let err = call(
        &d,
        Operation::UpdateImage {
            widget_id: "image_1".into(),
            resource: Some("missing".into()),
            data: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    call(&d, Operation::UnregisterResource { name: "icon".into() }).unwrap();
    assert_eq!(d.registry().resource_count(), 0);
}

#[tokio::test]
async fn click_pushes_callback_event_only_when_enabled() {
    let d = dispatcher();
    let mut events = d.subscribe_events();
    call(
        &d,
        Operation::CreateButton {
            widget_id: "button_1".into(),
            text: "=".into(),
            callback_id: Some("cb_2".into()),
        },
    )
    .unwrap();

    call(&d, Operation::ClickWidget { widget_id: "button_1".into() }).unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        BridgeEvent::Callback {
            callback_id: "cb_2".into(),
            widget_id: "button_1".into()
        }
    );

    call(&d, Operation::DisableWidget { widget_id: "button_1".into() }).unwrap();
    call(&d, Operation::ClickWidget { widget_id: "button_1".into() }).unwrap();
    assert!(events.try_recv().is_err());
}

#[test]
fn find_widget_selectors() {
    let d = dispatcher();
    let hidden = label(&d, "label_1", "Calculator");
    let shown = label(&d, "label_2", "Calculator Pro");
    call(&d, Operation::HideWidget { widget_id: hidden.clone() }).unwrap();
    call(
        &d,
        Operation::RegisterCustomId {
            custom_id: "title".into(),
            widget_id: hidden.clone(),
        },
    )
    .unwrap();

    let find = |selector: &str, selector_type| match call(
        &d,
        Operation::FindWidget {
            selector: selector.into(),
            selector_type,
        },
    )
    .unwrap()
    {
        Reply::WidgetIds { widget_ids } => widget_ids,
        other => panic!("unexpected {other:?}"),
    };

    assert_eq!(find("Calc", SelectorType::Text), vec![shown.clone(), hidden.clone()]);
    assert_eq!(find("Calculator", SelectorType::ExactText), vec![hidden.clone()]);
    assert_eq!(find("title", SelectorType::Id), vec![hidden.clone()]);
    assert_eq!(find("label_2", SelectorType::Id), vec![shown.clone()]);
    assert_eq!(find("label", SelectorType::Type).len(), 2);
    assert!(find("nothing", SelectorType::Id).is_empty());
    assert!(call(
        &d,
        Operation::FindWidget {
            selector: "slider".into(),
            selector_type: SelectorType::Type
        }
    )
    .is_err());
}

#[test]
fn clear_all_and_quit() {
    let d = dispatcher();
    let win = window(&d, "main", false);
    let root = vbox(&d, "vbox_1");
    add(&d, &root, &label(&d, "label_2", "x"));
    call(
        &d,
        Operation::SetContent {
            window_id: win,
            widget_id: root,
        },
    )
    .unwrap();

    call(&d, Operation::ClearAll).unwrap();
    assert_eq!(d.registry().live_widget_count(), 0);

    let quit = d.quit_signal();
    call(&d, Operation::Quit).unwrap();
    assert!(*quit.borrow());
}

#[test]
fn quit_closes_every_window() {
    let d = dispatcher();
    let win = window(&d, "main", false);
    call(&d, Operation::ShowWindow { window_id: win.clone() }).unwrap();
    let native = d.registry().window(&win).unwrap().native;
    assert!(native.is_shown());

    call(&d, Operation::Quit).unwrap();
    assert!(!native.is_shown());
    assert!(native.content().is_none());
}

// =============================================================================
// Best-effort release
// =============================================================================

mod failing_release {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::toolkit::{NativeRef, NativeWidget, WidgetParams, WindowParams};

    /// Headless widgets whose release fails when their text is `stuck`.
    struct StickyToolkit {
        inner: HeadlessToolkit,
        attempts: Arc<AtomicUsize>,
    }

    struct Sticky {
        inner: NativeRef,
        stuck: bool,
        attempts: Arc<AtomicUsize>,
    }

    impl NativeWidget for Sticky {
        fn kind(&self) -> WidgetKind {
            self.inner.kind()
        }
        fn set_visible(&self, visible: bool) {
            self.inner.set_visible(visible)
        }
        fn is_visible(&self) -> bool {
            self.inner.is_visible()
        }
        fn set_enabled(&self, enabled: bool) {
            self.inner.set_enabled(enabled)
        }
        fn is_enabled(&self) -> bool {
            self.inner.is_enabled()
        }
        fn set_text(&self, text: &str) -> Result<(), ToolkitError> {
            self.inner.set_text(text)
        }
        fn text(&self) -> Result<String, ToolkitError> {
            self.inner.text()
        }
        fn set_image(&self, data: Arc<Vec<u8>>) -> Result<(), ToolkitError> {
            self.inner.set_image(data)
        }
        fn add_child(&self, child: NativeRef) -> Result<(), ToolkitError> {
            self.inner.add_child(child)
        }
        fn remove_child(&self, child: &NativeRef) -> Result<(), ToolkitError> {
            self.inner.remove_child(child)
        }
        fn clear_children(&self) -> Result<(), ToolkitError> {
            self.inner.clear_children()
        }
        fn child_count(&self) -> usize {
            self.inner.child_count()
        }
        fn refresh(&self) -> Result<(), ToolkitError> {
            self.inner.refresh()
        }
        fn tap(&self) -> Result<bool, ToolkitError> {
            self.inner.tap()
        }
        fn release(&self) -> Result<(), ToolkitError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.stuck {
                return Err(ToolkitError::Native("handle leaked by engine".into()));
            }
            self.inner.release()
        }
    }

    impl Toolkit for StickyToolkit {
        fn name(&self) -> &'static str {
            "sticky"
        }

        fn create_widget(
            &self,
            kind: WidgetKind,
            params: &WidgetParams,
        ) -> Result<NativeRef, ToolkitError> {
            Ok(Arc::new(Sticky {
                inner: self.inner.create_widget(kind, params)?,
                stuck: params.text.as_deref() == Some("stuck"),
                attempts: Arc::clone(&self.attempts),
            }))
        }

        fn create_window(
            &self,
            params: &WindowParams,
        ) -> Result<Arc<dyn NativeWindow>, ToolkitError> {
            self.inner.create_window(params)
        }
    }

    #[test]
    fn failed_release_does_not_stop_the_rest() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let toolkit = StickyToolkit {
            inner: HeadlessToolkit::new(),
            attempts: Arc::clone(&attempts),
        };
        let d = Dispatcher::new(TOKEN, Arc::new(toolkit)).unwrap();

        let root = vbox(&d, "vbox_1");
        let first = label(&d, "label_2", "a");
        let stuck = label(&d, "label_3", "stuck");
        let last = label(&d, "label_4", "c");
        for child in [&first, &stuck, &last] {
            add(&d, &root, child);
        }
        call(
            &d,
            Operation::RegisterCustomId {
                custom_id: "jammed".into(),
                widget_id: stuck.clone(),
            },
        )
        .unwrap();

        call(&d, Operation::DestroyWidget { widget_id: root.clone() }).unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        for handle in [&root, &first, &stuck, &last] {
            assert!(!d.registry().is_referenced(handle), "{handle} still indexed");
            assert!(d.registry().is_retired(handle));
        }
        assert!(d.registry().find_by_custom_id("jammed").is_none());
        assert_eq!(d.registry().live_widget_count(), 0);
    }
}
