use super::*;
use crate::toolkit::{HeadlessToolkit, Toolkit, WidgetParams, WindowParams};

fn add(reg: &Registry, tk: &HeadlessToolkit, handle: &str, kind: WidgetKind) -> WidgetHandle {
    let native = tk.create_widget(kind, &WidgetParams::default()).unwrap();
    let h = WidgetHandle::new(handle);
    reg.insert_widget(h.clone(), kind, native, None, None).unwrap();
    h
}

fn add_window(reg: &Registry, tk: &HeadlessToolkit, id: &str) -> WindowId {
    let native = tk
        .create_window(&WindowParams {
            title: id.into(),
            width: 540,
            height: 960,
            fixed_size: false,
        })
        .unwrap();
    let id = WindowId::new(id);
    reg.insert_window(id.clone(), native, false).unwrap();
    id
}

/// root(vbox) -> [row(hbox) -> [a, b], c]
fn tree(reg: &Registry, tk: &HeadlessToolkit) -> [WidgetHandle; 5] {
    let root = add(reg, tk, "vbox_1", WidgetKind::VBox);
    let row = add(reg, tk, "hbox_2", WidgetKind::HBox);
    let a = add(reg, tk, "label_3", WidgetKind::Label);
    let b = add(reg, tk, "button_4", WidgetKind::Button);
    let c = add(reg, tk, "label_5", WidgetKind::Label);
    reg.link(&root, &row).unwrap();
    reg.link(&row, &a).unwrap();
    reg.link(&row, &b).unwrap();
    reg.link(&root, &c).unwrap();
    [root, row, a, b, c]
}

#[test]
fn teardown_removes_children_before_parent() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let [root, row, a, b, c] = tree(&reg, &tk);

    let plan = reg.teardown(&root);
    let order: Vec<&str> = plan.released.iter().map(|r| r.handle.as_str()).collect();
    assert_eq!(order, vec!["label_3", "button_4", "hbox_2", "label_5", "vbox_1"]);
    assert!(plan.detach_from.is_none());

    for h in [&root, &row, &a, &b, &c] {
        assert!(!reg.is_referenced(h), "{h} still referenced");
        assert!(reg.is_retired(h));
    }
    assert_eq!(reg.live_widget_count(), 0);
}

#[test]
fn teardown_of_inner_node_detaches_from_parent() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let [root, row, a, _b, c] = tree(&reg, &tk);

    let plan = reg.teardown(&row);
    assert!(plan.detach_from.is_some());
    assert_eq!(plan.released.len(), 3);
    assert_eq!(reg.children_of(&root), vec![c]);
    assert!(reg.parent_of(&a).is_none());
}

#[test]
fn repeated_teardown_is_a_noop() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let [root, ..] = tree(&reg, &tk);

    assert_eq!(reg.teardown(&root).released.len(), 5);
    let second = reg.teardown(&root);
    assert!(second.is_empty());
    assert!(second.root.is_none());
    assert!(!reg.is_referenced(&root));
}

#[test]
fn teardown_purges_custom_ids_and_callbacks() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let native = tk.create_widget(WidgetKind::Button, &WidgetParams::default()).unwrap();
    let button = WidgetHandle::new("button_1");
    reg.insert_widget(
        button.clone(),
        WidgetKind::Button,
        native,
        Some(CallbackId::new("cb_1")),
        None,
    )
    .unwrap();
    reg.register_custom_id("ok", &button).unwrap();
    assert_eq!(reg.widget(&button).unwrap().callback, Some(CallbackId::new("cb_1")));

    reg.teardown(&button);
    assert!(reg.find_by_custom_id("ok").is_none());
    assert!(!reg.is_referenced(&button));
}

#[test]
fn retired_and_live_handles_cannot_be_reused() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let h = add(&reg, &tk, "label_1", WidgetKind::Label);
    assert_eq!(reg.ensure_fresh(&h), Err(RegistryError::HandleInUse(h.clone())));

    reg.teardown(&h);
    assert_eq!(reg.ensure_fresh(&h), Err(RegistryError::HandleRetired(h.clone())));
    let native = tk.create_widget(WidgetKind::Label, &WidgetParams::default()).unwrap();
    assert!(reg
        .insert_widget(h.clone(), WidgetKind::Label, native, None, None)
        .is_err());
}

#[test]
fn link_moves_child_between_parents() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let left = add(&reg, &tk, "vbox_1", WidgetKind::VBox);
    let right = add(&reg, &tk, "vbox_2", WidgetKind::VBox);
    let child = add(&reg, &tk, "label_3", WidgetKind::Label);

    reg.link(&left, &child).unwrap();
    reg.link(&right, &child).unwrap();
    assert!(reg.children_of(&left).is_empty());
    assert_eq!(reg.children_of(&right), vec![child.clone()]);
    assert_eq!(reg.parent_of(&child), Some(right));
}

#[test]
fn container_lookup_rejects_leaves() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let label = add(&reg, &tk, "label_1", WidgetKind::Label);
    assert!(matches!(
        reg.container(&label),
        Err(RegistryError::NotAContainer { .. })
    ));
    assert!(matches!(
        reg.teardown_children(&label),
        Err(RegistryError::NotAContainer { .. })
    ));
}

#[test]
fn teardown_children_keeps_container() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let [root, row, ..] = tree(&reg, &tk);

    let released = reg.teardown_children(&root).unwrap();
    assert_eq!(released.len(), 4);
    assert!(reg.children_of(&root).is_empty());
    assert!(reg.widget(&root).is_ok());
    assert!(!reg.is_referenced(&row));
}

#[test]
fn replacing_content_tears_down_old_root_only() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let win = add_window(&reg, &tk, "main");
    let first = add(&reg, &tk, "vbox_1", WidgetKind::VBox);
    let second = add(&reg, &tk, "vbox_2", WidgetKind::VBox);
    let bystander = add(&reg, &tk, "label_3", WidgetKind::Label);

    let swap = reg.replace_content(&win, &first).unwrap();
    assert!(swap.released.is_empty());

    let same = reg.replace_content(&win, &first).unwrap();
    assert!(same.unchanged);
    assert!(reg.widget(&first).is_ok());

    let swap = reg.replace_content(&win, &second).unwrap();
    assert_eq!(swap.released.len(), 1);
    assert!(reg.is_retired(&first));
    assert!(reg.widget(&bystander).is_ok());
    assert_eq!(reg.window(&win).unwrap().content, Some(second));
}

#[test]
fn replacing_content_with_descendant_keeps_descendant() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let win = add_window(&reg, &tk, "main");
    let [root, row, a, b, c] = tree(&reg, &tk);
    reg.replace_content(&win, &root).unwrap();

    let swap = reg.replace_content(&win, &row).unwrap();
    assert!(swap.detached_from.is_some());
    assert_eq!(swap.released.len(), 2);
    assert!(reg.is_retired(&root) && reg.is_retired(&c));
    assert_eq!(reg.children_of(&row), vec![a, b]);
    assert!(reg.parent_of(&row).is_none());
}

#[test]
fn missing_window_and_widget_are_not_found() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let win = add_window(&reg, &tk, "main");
    let w = add(&reg, &tk, "vbox_1", WidgetKind::VBox);

    let err = reg.replace_content(&WindowId::new("nope"), &w).err().unwrap();
    assert!(err.to_string().starts_with("Window not found"));
    let err = reg.replace_content(&win, &WidgetHandle::new("ghost")).err().unwrap();
    assert!(err.to_string().starts_with("Widget not found"));
}

#[test]
fn custom_id_reregistration_moves_the_id() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let a = add(&reg, &tk, "label_1", WidgetKind::Label);
    let b = add(&reg, &tk, "label_2", WidgetKind::Label);

    reg.register_custom_id("display", &a).unwrap();
    reg.register_custom_id("display", &b).unwrap();
    assert_eq!(reg.find_by_custom_id("display"), Some(b.clone()));
    assert!(reg.custom_id_of(&a).is_none());

    reg.register_custom_id("result", &b).unwrap();
    assert!(reg.find_by_custom_id("display").is_none());
    assert_eq!(reg.custom_id_of(&b).as_deref(), Some("result"));
}

#[test]
fn clear_all_retires_everything_but_keeps_windows() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let win = add_window(&reg, &tk, "main");
    let [root, ..] = tree(&reg, &tk);
    let loose = add(&reg, &tk, "label_9", WidgetKind::Label);
    reg.replace_content(&win, &root).unwrap();

    let (windows, released) = reg.clear_all();
    assert_eq!(windows.len(), 1);
    assert_eq!(released.len(), 6);
    assert_eq!(reg.live_widget_count(), 0);
    assert!(reg.is_retired(&loose));
    assert!(reg.window(&win).unwrap().content.is_none());
}

#[test]
fn ancestor_walk() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    let [root, row, a, _, c] = tree(&reg, &tk);
    assert!(reg.is_ancestor(&root, &a));
    assert!(reg.is_ancestor(&row, &row));
    assert!(!reg.is_ancestor(&row, &c));
}

#[test]
fn widgets_in_order_follows_creation() {
    let reg = Registry::new();
    let tk = HeadlessToolkit::new();
    tree(&reg, &tk);
    let order: Vec<String> = reg
        .widgets_in_order()
        .into_iter()
        .map(|w| w.handle.to_string())
        .collect();
    assert_eq!(order, vec!["vbox_1", "hbox_2", "label_3", "button_4", "label_5"]);
}
