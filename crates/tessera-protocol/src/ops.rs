//! The closed set of bridge operations.
//!
//! Every variant serializes as `{"op": "<snake_case_name>", ...fields}`.
//! Adding a variant forces every dispatcher `match` to handle it.

use serde::{Deserialize, Serialize};
use tessera_common::{CallbackId, WidgetHandle, WidgetKind, WindowId};

/// How `FindWidget` interprets its selector string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorType {
    /// Custom id first, then raw handle.
    Id,
    /// Substring of the widget's text.
    Text,
    /// Whole widget text.
    ExactText,
    /// Widget kind (`label`, `button`, ...).
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    // -- windows --
    CreateWindow {
        window_id: WindowId,
        title: String,
        width: u32,
        height: u32,
        #[serde(default)]
        fixed_size: bool,
    },
    ShowWindow {
        window_id: WindowId,
    },
    ResizeWindow {
        window_id: WindowId,
        width: u32,
        height: u32,
    },
    SetWindowTitle {
        window_id: WindowId,
        title: String,
    },
    GetWindowSize {
        window_id: WindowId,
    },
    SetContent {
        window_id: WindowId,
        widget_id: WidgetHandle,
    },

    // -- construction --
    CreateImage {
        widget_id: WidgetHandle,
        /// Resource name, resolved with scope fallback on the renderer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
        /// Inline image bytes, used when no resource is named.
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "crate::bytes::option"
        )]
        data: Option<Vec<u8>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
    },
    CreateLabel {
        widget_id: WidgetHandle,
        text: String,
    },
    CreateButton {
        widget_id: WidgetHandle,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
    },
    #[serde(rename = "create_vbox")]
    CreateVBox {
        widget_id: WidgetHandle,
    },
    #[serde(rename = "create_hbox")]
    CreateHBox {
        widget_id: WidgetHandle,
    },
    CreateGrid {
        widget_id: WidgetHandle,
        columns: u32,
    },

    // -- containers --
    ContainerAdd {
        container_id: WidgetHandle,
        child_id: WidgetHandle,
    },
    ContainerRemoveAll {
        container_id: WidgetHandle,
    },
    ContainerRefresh {
        container_id: WidgetHandle,
    },

    // -- widget state --
    ShowWidget {
        widget_id: WidgetHandle,
    },
    HideWidget {
        widget_id: WidgetHandle,
    },
    EnableWidget {
        widget_id: WidgetHandle,
    },
    DisableWidget {
        widget_id: WidgetHandle,
    },
    IsEnabled {
        widget_id: WidgetHandle,
    },
    IsVisible {
        widget_id: WidgetHandle,
    },
    DestroyWidget {
        widget_id: WidgetHandle,
    },

    // -- resources and content --
    RegisterResource {
        name: String,
        #[serde(with = "crate::bytes")]
        data: Vec<u8>,
    },
    UnregisterResource {
        name: String,
    },
    UpdateImage {
        widget_id: WidgetHandle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "crate::bytes::option"
        )]
        data: Option<Vec<u8>>,
    },
    SetText {
        widget_id: WidgetHandle,
        text: String,
    },
    GetText {
        widget_id: WidgetHandle,
    },

    // -- automation and lookup --
    ClickWidget {
        widget_id: WidgetHandle,
    },
    RegisterCustomId {
        custom_id: String,
        widget_id: WidgetHandle,
    },
    FindWidget {
        selector: String,
        #[serde(rename = "type")]
        selector_type: SelectorType,
    },
    ClearAll,
    Quit,
}

impl Operation {
    /// The wire name of this operation, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateWindow { .. } => "create_window",
            Self::ShowWindow { .. } => "show_window",
            Self::ResizeWindow { .. } => "resize_window",
            Self::SetWindowTitle { .. } => "set_window_title",
            Self::GetWindowSize { .. } => "get_window_size",
            Self::SetContent { .. } => "set_content",
            Self::CreateImage { .. } => "create_image",
            Self::CreateLabel { .. } => "create_label",
            Self::CreateButton { .. } => "create_button",
            Self::CreateVBox { .. } => "create_vbox",
            Self::CreateHBox { .. } => "create_hbox",
            Self::CreateGrid { .. } => "create_grid",
            Self::ContainerAdd { .. } => "container_add",
            Self::ContainerRemoveAll { .. } => "container_remove_all",
            Self::ContainerRefresh { .. } => "container_refresh",
            Self::ShowWidget { .. } => "show_widget",
            Self::HideWidget { .. } => "hide_widget",
            Self::EnableWidget { .. } => "enable_widget",
            Self::DisableWidget { .. } => "disable_widget",
            Self::IsEnabled { .. } => "is_enabled",
            Self::IsVisible { .. } => "is_visible",
            Self::DestroyWidget { .. } => "destroy_widget",
            Self::RegisterResource { .. } => "register_resource",
            Self::UnregisterResource { .. } => "unregister_resource",
            Self::UpdateImage { .. } => "update_image",
            Self::SetText { .. } => "set_text",
            Self::GetText { .. } => "get_text",
            Self::ClickWidget { .. } => "click_widget",
            Self::RegisterCustomId { .. } => "register_custom_id",
            Self::FindWidget { .. } => "find_widget",
            Self::ClearAll => "clear_all",
            Self::Quit => "quit",
        }
    }

    /// The widget kind a construction op creates, if it is one.
    pub fn created_kind(&self) -> Option<WidgetKind> {
        match self {
            Self::CreateImage { .. } => Some(WidgetKind::Image),
            Self::CreateLabel { .. } => Some(WidgetKind::Label),
            Self::CreateButton { .. } => Some(WidgetKind::Button),
            Self::CreateVBox { .. } => Some(WidgetKind::VBox),
            Self::CreateHBox { .. } => Some(WidgetKind::HBox),
            Self::CreateGrid { .. } => Some(WidgetKind::Grid),
            _ => None,
        }
    }
}
