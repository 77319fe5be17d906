use std::collections::HashMap;

use tessera_common::WidgetHandle;

/// Shell-side mirror of the parent/children edges created through [`Ui`].
/// Used to find the callbacks to drop when a subtree goes away.
///
/// [`Ui`]: super::Ui
#[derive(Debug, Default)]
pub(crate) struct WidgetTree {
    parent: HashMap<WidgetHandle, WidgetHandle>,
    children: HashMap<WidgetHandle, Vec<WidgetHandle>>,
}

impl WidgetTree {
    pub fn attach(&mut self, container: &WidgetHandle, child: &WidgetHandle) {
        self.detach(child);
        self.parent.insert(child.clone(), container.clone());
        self.children
            .entry(container.clone())
            .or_default()
            .push(child.clone());
    }

    fn detach(&mut self, child: &WidgetHandle) {
        if let Some(old) = self.parent.remove(child) {
            if let Some(siblings) = self.children.get_mut(&old) {
                siblings.retain(|c| c != child);
            }
        }
    }

    pub fn children(&self, container: &WidgetHandle) -> Vec<WidgetHandle> {
        self.children.get(container).cloned().unwrap_or_default()
    }

    /// Drop `root` and its descendants. Returns every handle removed,
    /// `root` included.
    pub fn remove_subtree(&mut self, root: &WidgetHandle) -> Vec<WidgetHandle> {
        self.detach(root);
        let mut removed = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(handle) = pending.pop() {
            if let Some(children) = self.children.remove(&handle) {
                for child in children {
                    self.parent.remove(&child);
                    pending.push(child);
                }
            }
            removed.push(handle);
        }
        removed
    }

    /// Drop every descendant of `container`, keeping `container` itself.
    pub fn clear_children(&mut self, container: &WidgetHandle) -> Vec<WidgetHandle> {
        let mut removed = Vec::new();
        for child in self.children(container) {
            removed.extend(self.remove_subtree(&child));
        }
        removed
    }
}
