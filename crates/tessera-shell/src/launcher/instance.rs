use std::fmt;

use tessera_common::WidgetHandle;
use tracing::warn;

use super::AppMeta;
use crate::navigation::FrameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Lifecycle of one running app.
///
/// ```text
/// Loading -> Built -> Visible <-> Hidden
///    \         \         \          \
///     `---------`---------`----------`--> Quit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Loading,
    Built,
    Visible,
    Hidden,
    Quit,
}

impl InstanceState {
    pub fn can_become(self, next: InstanceState) -> bool {
        use InstanceState::*;
        matches!(
            (self, next),
            (Loading, Built)
                | (Built, Visible)
                | (Built, Hidden)
                | (Visible, Hidden)
                | (Hidden, Visible)
                | (Loading | Built | Visible | Hidden, Quit)
        )
    }
}

/// Snapshot of a running instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub app: String,
    pub scope: String,
    pub frame: Option<FrameId>,
    pub state: InstanceState,
}

pub(crate) struct Instance {
    pub id: InstanceId,
    pub meta: AppMeta,
    pub scope: String,
    pub frame: Option<FrameId>,
    pub state: InstanceState,
    pub captured: Vec<WidgetHandle>,
}

impl Instance {
    pub fn new(id: InstanceId, meta: AppMeta, scope: String) -> Self {
        Self {
            id,
            meta,
            scope,
            frame: None,
            state: InstanceState::Loading,
            captured: Vec::new(),
        }
    }

    /// Apply `next` if the state machine allows it.
    pub fn transition(&mut self, next: InstanceState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_become(next) {
            warn!(instance = %self.id, from = ?self.state, to = ?next, "invalid instance transition");
            return false;
        }
        self.state = next;
        true
    }

    pub fn info(&self) -> InstanceInfo {
        InstanceInfo {
            id: self.id,
            app: self.meta.name.clone(),
            scope: self.scope.clone(),
            frame: self.frame,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_the_lifecycle() {
        let mut instance = Instance::new(InstanceId(1), AppMeta::new("Notes"), "notes-1".into());
        assert!(!instance.transition(InstanceState::Visible));
        assert!(instance.transition(InstanceState::Built));
        assert!(instance.transition(InstanceState::Visible));
        assert!(instance.transition(InstanceState::Hidden));
        assert!(instance.transition(InstanceState::Visible));
        assert!(instance.transition(InstanceState::Quit));
        assert!(!instance.transition(InstanceState::Visible));
        assert_eq!(instance.state, InstanceState::Quit);
    }

    #[test]
    fn quit_is_reachable_from_loading() {
        assert!(InstanceState::Loading.can_become(InstanceState::Quit));
        assert!(!InstanceState::Quit.can_become(InstanceState::Loading));
    }
}
