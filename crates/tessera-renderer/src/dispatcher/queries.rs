//! Read-only queries.

use tessera_common::{WidgetHandle, WidgetKind};
use tessera_protocol::{Reply, RpcError, SelectorType};

use super::Dispatcher;

impl Dispatcher {
    pub(super) fn is_enabled(&self, handle: &WidgetHandle) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        let enabled = self.on_ui(move || Ok(widget.native.is_enabled()))?;
        Ok(Reply::Enabled { enabled })
    }

    pub(super) fn is_visible(&self, handle: &WidgetHandle) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        let visible = self.on_ui(move || Ok(widget.native.is_visible()))?;
        Ok(Reply::Visible { visible })
    }

    pub(super) fn get_text(&self, handle: &WidgetHandle) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        let text = self.on_ui(move || widget.native.text())?;
        Ok(Reply::Text { text })
    }

    /// Matches in creation order, visible widgets before hidden ones.
    pub(super) fn find_widget(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Reply, RpcError> {
        if selector_type == SelectorType::Id {
            let hit = self.registry.find_by_custom_id(selector).or_else(|| {
                let raw = WidgetHandle::new(selector);
                self.registry.widget(&raw).ok().map(|w| w.handle)
            });
            return Ok(Reply::WidgetIds {
                widget_ids: hit.into_iter().collect(),
            });
        }

        let wanted_kind = match selector_type {
            SelectorType::Type => Some(WidgetKind::parse(selector).ok_or_else(|| {
                RpcError::invalid_request(format!("unknown widget type: {selector}"))
            })?),
            _ => None,
        };

        let candidates = self.registry.widgets_in_order();
        let selector = selector.to_string();
        let (visible, hidden) = self.on_ui(move || {
            let mut visible = Vec::new();
            let mut hidden = Vec::new();
            for w in candidates {
                let matched = match selector_type {
                    SelectorType::Type => Some(w.kind) == wanted_kind,
                    SelectorType::Text => w
                        .native
                        .text()
                        .map(|t| t.contains(&selector))
                        .unwrap_or(false),
                    SelectorType::ExactText => {
                        w.native.text().map(|t| t == selector).unwrap_or(false)
                    }
                    SelectorType::Id => false,
                };
                if !matched {
                    continue;
                }
                if w.native.is_visible() {
                    visible.push(w.handle);
                } else {
                    hidden.push(w.handle);
                }
            }
            Ok((visible, hidden))
        })?;

        let mut widget_ids = visible;
        widget_ids.extend(hidden);
        Ok(Reply::WidgetIds { widget_ids })
    }
}
